use ndarray::Array2;
use starstack_core::buffer::PixelBuffer;

/// Gaussian blob on a zero background.
pub fn gaussian_blob(
    width: usize,
    height: usize,
    cx: f64,
    cy: f64,
    sigma: f64,
    amplitude: f32,
) -> Array2<f32> {
    let mut data = Array2::<f32>::zeros((height, width));
    let s2 = 2.0 * sigma * sigma;
    for row in 0..height {
        for col in 0..width {
            let dx = col as f64 - cx;
            let dy = row as f64 - cy;
            data[[row, col]] += amplitude * (-(dx * dx + dy * dy) / s2).exp() as f32;
        }
    }
    data
}

/// Mono buffer with a single Gaussian blob.
pub fn blob_buffer(
    width: usize,
    height: usize,
    cx: f64,
    cy: f64,
    sigma: f64,
    amplitude: f32,
) -> PixelBuffer {
    PixelBuffer::from_plane(gaussian_blob(width, height, cx, cy, sigma, amplitude))
}

/// Mono buffer with Gaussian stars at the given positions over a flat
/// background level.
pub fn starfield(
    width: usize,
    height: usize,
    stars: &[(f64, f64)],
    sigma: f64,
    amplitude: f32,
    background: f32,
) -> PixelBuffer {
    let mut data = Array2::<f32>::from_elem((height, width), background);
    for &(cx, cy) in stars {
        data += &gaussian_blob(width, height, cx, cy, sigma, amplitude);
    }
    PixelBuffer::from_plane(data)
}

/// Largest absolute per-pixel difference between two mono buffers.
pub fn max_abs_diff(a: &PixelBuffer, b: &PixelBuffer) -> f32 {
    a.plane(0)
        .iter()
        .zip(b.plane(0).iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f32, f32::max)
}

/// Sum of all samples in all planes.
pub fn total_intensity(buffer: &PixelBuffer) -> f64 {
    buffer
        .planes()
        .map(|p| p.iter().map(|&v| v as f64).sum::<f64>())
        .sum()
}
