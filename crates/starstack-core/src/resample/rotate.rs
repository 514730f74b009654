use ndarray::Array2;

use crate::buffer::PixelBuffer;
use crate::consts::{EPSILON, ROTATION_EPSILON_DEG};

use super::center_place;

/// Rotate about the image center by `angle_deg` (counter-clockwise positive).
///
/// Forward-mapped bilinear splat: each source pixel deposits its value into
/// the four destination neighbors of its rotated position, weighted by the
/// fractional coordinates. Splat weights are accumulated per destination
/// pixel and the result normalized where coverage is non-zero, so overlapping
/// deposits do not over-brighten and uncovered pixels stay zero.
///
/// The output is sized to the bounding box of the rotated footprint; with
/// `crop` the result is center-placed back into an input-sized canvas,
/// cropped or zero-padded per axis (a non-square buffer near 90° has a
/// footprint narrower than the input on one axis).
pub fn rotate(buffer: &PixelBuffer, angle_deg: f64, crop: bool) -> PixelBuffer {
    let normalized = angle_deg.rem_euclid(360.0);
    let near_zero = normalized.min(360.0 - normalized) <= ROTATION_EPSILON_DEG;
    if near_zero {
        return buffer.clone();
    }

    let (w, h) = (buffer.width(), buffer.height());
    let theta = angle_deg.to_radians();
    let (sin, cos) = theta.sin_cos();

    // Bounding box of the four rotated corners.
    let new_w = (w as f64 * cos.abs() + h as f64 * sin.abs()).ceil() as usize;
    let new_h = (w as f64 * sin.abs() + h as f64 * cos.abs()).ceil() as usize;

    let cx = (w as f64 - 1.0) / 2.0;
    let cy = (h as f64 - 1.0) / 2.0;
    let ncx = (new_w as f64 - 1.0) / 2.0;
    let ncy = (new_h as f64 - 1.0) / 2.0;

    let mut weights = Array2::<f32>::zeros((new_h, new_w));
    let mut acc: Vec<Array2<f32>> = (0..buffer.depth())
        .map(|_| Array2::zeros((new_h, new_w)))
        .collect();

    for row in 0..h {
        let ry = row as f64 - cy;
        for col in 0..w {
            let rx = col as f64 - cx;
            let dx = rx * cos - ry * sin + ncx;
            let dy = rx * sin + ry * cos + ncy;

            let x0 = dx.floor() as i64;
            let y0 = dy.floor() as i64;
            let fx = (dx - x0 as f64) as f32;
            let fy = (dy - y0 as f64) as f32;

            let taps = [
                (y0, x0, (1.0 - fx) * (1.0 - fy)),
                (y0, x0 + 1, fx * (1.0 - fy)),
                (y0 + 1, x0, (1.0 - fx) * fy),
                (y0 + 1, x0 + 1, fx * fy),
            ];

            for (ty, tx, weight) in taps {
                if ty < 0 || tx < 0 || ty >= new_h as i64 || tx >= new_w as i64 {
                    continue;
                }
                let (ty, tx) = (ty as usize, tx as usize);
                weights[[ty, tx]] += weight;
                for (channel, plane) in buffer.planes().enumerate() {
                    acc[channel][[ty, tx]] += plane[[row, col]] * weight;
                }
            }
        }
    }

    for plane in &mut acc {
        for (v, &w) in plane.iter_mut().zip(weights.iter()) {
            if w > EPSILON {
                *v /= w;
            } else {
                *v = 0.0;
            }
        }
    }

    let rotated = PixelBuffer::from_planes(acc);
    if crop {
        center_place(&rotated, w, h)
    } else {
        rotated
    }
}

/// Exact 90° clockwise rotation (lossless, no interpolation).
pub fn rotate90cw(buffer: &PixelBuffer) -> PixelBuffer {
    let (w, h) = (buffer.width(), buffer.height());
    let planes = buffer
        .planes()
        .map(|src| {
            let mut dst = Array2::<f32>::zeros((w, h));
            for row in 0..h {
                for col in 0..w {
                    dst[[col, h - 1 - row]] = src[[row, col]];
                }
            }
            dst
        })
        .collect();
    PixelBuffer::from_planes(planes)
}

/// Exact 90° counter-clockwise rotation (lossless, no interpolation).
pub fn rotate90ccw(buffer: &PixelBuffer) -> PixelBuffer {
    let (w, h) = (buffer.width(), buffer.height());
    let planes = buffer
        .planes()
        .map(|src| {
            let mut dst = Array2::<f32>::zeros((w, h));
            for row in 0..h {
                for col in 0..w {
                    dst[[w - 1 - col, row]] = src[[row, col]];
                }
            }
            dst
        })
        .collect();
    PixelBuffer::from_planes(planes)
}
