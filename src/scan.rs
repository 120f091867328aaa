//! Directory scanning for the ordered slide sequence.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Error;

const SUPPORTED_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Return `true` if `path` has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTS.iter().any(|e| *e == ext)
        })
}

/// Collect the slide images directly inside `dir`, sorted by filename so
/// numbered sequences (`image01.jpg`, `image02.jpg`, ...) display in order.
///
/// # Errors
/// Returns [`Error::BadDir`] if `dir` is missing or not a directory, and
/// [`Error::EmptyScan`] if no supported images are found.
pub fn scan_slides(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    if !dir.is_dir() {
        return Err(Error::BadDir(dir.to_string_lossy().into_owned()));
    }

    let mut slides: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .flatten()
        .filter(|entry| entry.path().is_file() && is_supported_image(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    slides.sort();

    if slides.is_empty() {
        return Err(Error::EmptyScan);
    }
    Ok(slides)
}
