//! Display boundary: the viewer hands each frame's buffer to a sink. Scaling
//! and windowing stay on the far side of this trait.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::buffer::PixelBuffer;

/// One frame as seen by the display stage.
#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    /// The current slide has no pixels yet; show a neutral placeholder.
    Placeholder,
    /// The working buffer for this frame.
    Image(&'a PixelBuffer),
}

pub trait FrameSink: Send {
    fn present(&mut self, frame: Frame<'_>) -> Result<()>;
}

/// Writes numbered PNGs into a directory, one per frame. Placeholders become
/// solid background-colored frames so the sequence stays continuous.
pub struct PngSequenceSink {
    dir: PathBuf,
    next_index: u64,
    background: [u8; 3],
}

const PLACEHOLDER_SIZE: (u32, u32) = (640, 360);

impl PngSequenceSink {
    pub fn new(dir: PathBuf, background: [u8; 3]) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating frame directory {}", dir.display()))?;
        Ok(Self {
            dir,
            next_index: 0,
            background,
        })
    }

    fn write(&mut self, buffer: &PixelBuffer) -> Result<()> {
        let path = self.dir.join(format!("frame-{:05}.png", self.next_index));
        let image = buffer
            .to_image()
            .context("frame buffer has inconsistent dimensions")?;
        image
            .save(&path)
            .with_context(|| format!("writing frame to {}", path.display()))?;
        debug!(frame = self.next_index, "wrote frame");
        self.next_index += 1;
        Ok(())
    }
}

impl FrameSink for PngSequenceSink {
    fn present(&mut self, frame: Frame<'_>) -> Result<()> {
        match frame {
            Frame::Image(buffer) => self.write(buffer),
            Frame::Placeholder => {
                let (w, h) = PLACEHOLDER_SIZE;
                let placeholder = PixelBuffer::filled(w, h, self.background);
                self.write(&placeholder)
            }
        }
    }
}

/// Counts frames and discards pixels. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct NullSink {
    pub frames: u64,
    pub placeholders: u64,
}

impl FrameSink for NullSink {
    fn present(&mut self, frame: Frame<'_>) -> Result<()> {
        match frame {
            Frame::Image(_) => self.frames += 1,
            Frame::Placeholder => self.placeholders += 1,
        }
        Ok(())
    }
}
