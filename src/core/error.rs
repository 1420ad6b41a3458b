//! Error types for the fur generation pipeline

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing base mesh buffer: {0}")]
    MissingBuffer(&'static str),

    #[error("texture readback failed: {0}")]
    TextureRead(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
