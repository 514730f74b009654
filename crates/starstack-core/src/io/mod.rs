//! Frame I/O seam.
//!
//! The pipeline only ever talks to the [`FrameLoader`] and [`FrameWriter`]
//! traits; the bundled implementations decode/encode ordinary image files
//! through the `image` crate. Anything fancier (camera containers, FITS) is
//! a different implementor's problem.

mod image_io;

pub use image_io::{ImageFileLoader, ImageFileWriter};

use std::path::Path;

use crate::buffer::PixelBuffer;
use crate::error::Result;

/// Decodes a path into zero or more frames.
pub trait FrameLoader {
    fn load(&self, path: &Path) -> Result<Vec<PixelBuffer>>;
}

/// Persists one frame to a path.
pub trait FrameWriter {
    fn write(&self, path: &Path, buffer: &PixelBuffer) -> Result<()>;
}
