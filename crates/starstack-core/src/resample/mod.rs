//! Geometric resampling primitives: sub-pixel shift, resize, rotation.
//!
//! These are the warp operations the registration and stacking code builds
//! on. All of them read from an immutable source and write a fresh output,
//! so a buffer is never resampled over itself.

mod resize;
mod rotate;
mod shift;

pub use resize::{resize, ResizeMode};
pub use rotate::{rotate, rotate90ccw, rotate90cw};
pub use shift::{bilinear_sample, shift};

use crate::buffer::{PixelBuffer, Rect};

/// Extract a sub-region. `None` if the rect does not lie fully inside the
/// buffer; callers clip with [`Rect::overlap`] first.
pub fn crop(buffer: &PixelBuffer, rect: Rect) -> Option<PixelBuffer> {
    let clipped = rect.overlap(buffer.width(), buffer.height())?;
    if clipped != rect {
        return None;
    }
    let (x, y) = (rect.x as usize, rect.y as usize);
    let planes = buffer
        .planes()
        .map(|p| {
            p.slice(ndarray::s![y..y + rect.height, x..x + rect.width])
                .to_owned()
        })
        .collect();
    Some(PixelBuffer::from_planes(planes))
}

/// Center-place into a `width`x`height` canvas, independently per axis:
/// a larger source axis is center-cropped, a smaller one zero-padded. Used
/// after rotation with `crop = true`, where the bounding box of a non-square
/// buffer can be smaller than the original on one axis (40x20 at 90° has a
/// 20x40 footprint).
pub fn center_place(buffer: &PixelBuffer, width: usize, height: usize) -> PixelBuffer {
    let (bw, bh) = (buffer.width(), buffer.height());
    let copy_w = bw.min(width);
    let copy_h = bh.min(height);
    let (sx, sy) = ((bw - copy_w) / 2, (bh - copy_h) / 2);
    let (dx, dy) = ((width - copy_w) / 2, (height - copy_h) / 2);

    let planes = buffer
        .planes()
        .map(|src| {
            let mut dst = ndarray::Array2::<f32>::zeros((height, width));
            dst.slice_mut(ndarray::s![dy..dy + copy_h, dx..dx + copy_w])
                .assign(&src.slice(ndarray::s![sy..sy + copy_h, sx..sx + copy_w]));
            dst
        })
        .collect();
    PixelBuffer::from_planes(planes)
}
