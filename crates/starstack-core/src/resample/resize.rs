use ndarray::Array2;

use crate::buffer::PixelBuffer;

/// Interpolation used for the growing direction of a resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ResizeMode {
    /// Leave growing axes untouched.
    None,
    /// Round to the nearest source index (clamped).
    Nearest,
    /// Four-neighbor weighted average, zero-extended past the final
    /// row/column.
    Bilinear,
}

/// Resize by independent per-axis factors.
///
/// Shrinking (factor < 1) always uses area-weighted accumulation: each source
/// pixel distributes its value into the destination pixels it overlaps,
/// proportionally to the fractional overlap, which conserves the pixel sum.
/// Shrinking happens before growing when the axes disagree, so a grow never
/// interpolates data that is about to be discarded.
pub fn resize(buffer: &PixelBuffer, factor_x: f64, factor_y: f64, mode: ResizeMode) -> PixelBuffer {
    let planes = buffer
        .planes()
        .map(|plane| {
            let mut out = plane.clone();
            if factor_x < 1.0 {
                out = shrink_cols(&out, factor_x);
            }
            if factor_y < 1.0 {
                out = shrink_rows(&out, factor_y);
            }
            if factor_x > 1.0 && mode != ResizeMode::None {
                out = grow_cols(&out, factor_x, mode);
            }
            if factor_y > 1.0 && mode != ResizeMode::None {
                out = grow_rows(&out, factor_y, mode);
            }
            out
        })
        .collect();
    PixelBuffer::from_planes(planes)
}

// Ceil, so the final partially-covered destination pixel still exists and
// the area accumulation loses no mass at the edge.
fn shrunk_len(len: usize, factor: f64) -> usize {
    ((len as f64 * factor).ceil() as usize).max(1)
}

fn grown_len(len: usize, factor: f64) -> usize {
    ((len as f64 * factor).round() as usize).max(len)
}

/// Area-weighted shrink along the column (x) axis.
///
/// Source pixel c maps to the destination interval [c*f, (c+1)*f); its full
/// value is split over the covered destination pixels by fractional overlap
/// (weights overlap/f sum to 1 per source pixel).
fn shrink_cols(plane: &Array2<f32>, factor: f64) -> Array2<f32> {
    let (h, w) = plane.dim();
    let new_w = shrunk_len(w, factor);
    let mut out = Array2::<f32>::zeros((h, new_w));

    for row in 0..h {
        for col in 0..w {
            let v = plane[[row, col]];
            let start = col as f64 * factor;
            let end = start + factor;
            let mut d = start.floor() as usize;
            while (d as f64) < end && d < new_w {
                let seg = end.min(d as f64 + 1.0) - start.max(d as f64);
                if seg > 0.0 {
                    out[[row, d]] += v * (seg / factor) as f32;
                }
                d += 1;
            }
        }
    }
    out
}

/// Area-weighted shrink along the row (y) axis.
fn shrink_rows(plane: &Array2<f32>, factor: f64) -> Array2<f32> {
    let (h, w) = plane.dim();
    let new_h = shrunk_len(h, factor);
    let mut out = Array2::<f32>::zeros((new_h, w));

    for row in 0..h {
        let start = row as f64 * factor;
        let end = start + factor;
        let mut d = start.floor() as usize;
        while (d as f64) < end && d < new_h {
            let seg = end.min(d as f64 + 1.0) - start.max(d as f64);
            if seg > 0.0 {
                let weight = (seg / factor) as f32;
                for col in 0..w {
                    out[[d, col]] += plane[[row, col]] * weight;
                }
            }
            d += 1;
        }
    }
    out
}

fn grow_cols(plane: &Array2<f32>, factor: f64, mode: ResizeMode) -> Array2<f32> {
    let (h, w) = plane.dim();
    let new_w = grown_len(w, factor);
    let mut out = Array2::<f32>::zeros((h, new_w));

    for row in 0..h {
        for col in 0..new_w {
            let src = col as f64 / factor;
            out[[row, col]] = match mode {
                ResizeMode::Nearest => {
                    let c = (src.round() as usize).min(w - 1);
                    plane[[row, c]]
                }
                _ => {
                    let c0 = src.floor() as usize;
                    let f = (src - c0 as f64) as f32;
                    let v0 = plane[[row, c0.min(w - 1)]];
                    // Zero-extended past the final column.
                    let v1 = if c0 + 1 < w { plane[[row, c0 + 1]] } else { 0.0 };
                    v0 * (1.0 - f) + v1 * f
                }
            };
        }
    }
    out
}

fn grow_rows(plane: &Array2<f32>, factor: f64, mode: ResizeMode) -> Array2<f32> {
    let (h, w) = plane.dim();
    let new_h = grown_len(h, factor);
    let mut out = Array2::<f32>::zeros((new_h, w));

    for row in 0..new_h {
        let src = row as f64 / factor;
        match mode {
            ResizeMode::Nearest => {
                let r = (src.round() as usize).min(h - 1);
                for col in 0..w {
                    out[[row, col]] = plane[[r, col]];
                }
            }
            _ => {
                let r0 = src.floor() as usize;
                let f = (src - r0 as f64) as f32;
                let r0c = r0.min(h - 1);
                for col in 0..w {
                    let v0 = plane[[r0c, col]];
                    let v1 = if r0 + 1 < h { plane[[r0 + 1, col]] } else { 0.0 };
                    out[[row, col]] = v0 * (1.0 - f) + v1 * f;
                }
            }
        }
    }
    out
}
