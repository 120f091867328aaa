use std::path::PathBuf;
use std::sync::Arc;

use crate::buffer::PixelBuffer;

/// Request for the loader to decode the slide at `index`.
#[derive(Debug)]
pub struct LoadSlide {
    pub index: usize,
    pub path: PathBuf,
}

/// A decoded pristine buffer ready to be installed into the show.
#[derive(Debug)]
pub struct SlideLoaded {
    pub index: usize,
    pub buffer: Arc<PixelBuffer>,
}

/// The slide at `index` could not be decoded.
#[derive(Debug)]
pub struct InvalidSlide {
    pub index: usize,
    pub path: PathBuf,
}

/// Navigation commands consumed by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideCommand {
    Next,
    Prev,
}
