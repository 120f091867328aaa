use std::path::PathBuf;

use thiserror::Error;

/// Library error type for slideshow setup and resource loading.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured slides directory is invalid or unreadable.
    #[error("invalid slides directory: {0}")]
    BadDir(String),

    /// The scan completed but found no images.
    #[error("no images found in slides directory")]
    EmptyScan,

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),

    /// A slide image failed to decode.
    #[error("failed to decode slide {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
