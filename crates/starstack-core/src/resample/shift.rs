use ndarray::Array2;
use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Bilinear sample at fractional coordinates. Out-of-bounds neighbors
/// contribute zero.
pub fn bilinear_sample(data: &Array2<f32>, y: f64, x: f64) -> f32 {
    let (h, w) = data.dim();

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let sample = |r: i64, c: i64| -> f32 {
        if r >= 0 && r < h as i64 && c >= 0 && c < w as i64 {
            data[[r as usize, c as usize]]
        } else {
            0.0
        }
    };

    let v00 = sample(y0, x0);
    let v10 = sample(y0, x1);
    let v01 = sample(y1, x0);
    let v11 = sample(y1, x1);

    v00 * (1.0 - fx) * (1.0 - fy)
        + v10 * fx * (1.0 - fy)
        + v01 * (1.0 - fx) * fy
        + v11 * fx * fy
}

/// Sub-pixel bilinear translation.
///
/// Destination pixel (x, y) is sampled from source (x + dx, y + dy);
/// destination pixels whose source falls outside the buffer are cleared.
pub fn shift(buffer: &PixelBuffer, dx: f64, dy: f64) -> PixelBuffer {
    let (w, h) = (buffer.width(), buffer.height());

    let planes = buffer
        .planes()
        .map(|src| {
            let mut dst = Array2::<f32>::zeros((h, w));
            if h * w >= PARALLEL_PIXEL_THRESHOLD {
                let rows: Vec<Vec<f32>> = (0..h)
                    .into_par_iter()
                    .map(|row| {
                        let src_y = row as f64 + dy;
                        (0..w)
                            .map(|col| bilinear_sample(src, src_y, col as f64 + dx))
                            .collect()
                    })
                    .collect();
                for (row, row_data) in rows.into_iter().enumerate() {
                    for (col, val) in row_data.into_iter().enumerate() {
                        dst[[row, col]] = val;
                    }
                }
            } else {
                for row in 0..h {
                    let src_y = row as f64 + dy;
                    for col in 0..w {
                        dst[[row, col]] = bilinear_sample(src, src_y, col as f64 + dx);
                    }
                }
            }
            dst
        })
        .collect();

    PixelBuffer::from_planes(planes)
}
