use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Setup error: {0}")]
    Setup(String),

    #[error("Frame {path}: {reason}")]
    Frame { path: PathBuf, reason: String },

    #[error("Region ({x},{y} {width}x{height}) does not intersect image ({img_width}x{img_height})")]
    EmptyRegion {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },

    #[error("Shift ({dx:.2},{dy:.2}) exceeds maximum allowed movement {maxmove:.2}")]
    ShiftRejected { dx: f64, dy: f64, maxmove: f64 },

    #[error("Unknown PSF model: {0}")]
    UnknownPsf(String),

    #[error("Star matching needs at least {needed} stars, got {got}")]
    TooFewStars { needed: usize, got: usize },

    #[error("Empty frame sequence")]
    EmptySequence,
}

pub type Result<T> = std::result::Result<T, StackError>;
