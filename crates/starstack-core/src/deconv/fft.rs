//! Run-scoped FFT workspace.
//!
//! Plans and scratch are allocated once at the padded size for a
//! deconvolution run and released by `Drop` on every exit path, including
//! cancellation — the plans are the expensive resource, re-planning per
//! iteration would dominate the loop.

use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

pub struct FftWorkspace {
    width: usize,
    height: usize,
    fft_row: Arc<dyn Fft<f64>>,
    fft_col: Arc<dyn Fft<f64>>,
    ifft_row: Arc<dyn Fft<f64>>,
    ifft_col: Arc<dyn Fft<f64>>,
    row_scratch: Vec<Complex<f64>>,
    col_scratch: Vec<Complex<f64>>,
}

impl FftWorkspace {
    pub fn new(width: usize, height: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            width,
            height,
            fft_row: planner.plan_fft_forward(width),
            fft_col: planner.plan_fft_forward(height),
            ifft_row: planner.plan_fft_inverse(width),
            ifft_col: planner.plan_fft_inverse(height),
            row_scratch: vec![Complex::new(0.0, 0.0); width],
            col_scratch: vec![Complex::new(0.0, 0.0); height],
        }
    }

    /// Forward 2D FFT: row-wise, then column-wise.
    pub fn fft2d(&mut self, data: &Array2<f32>) -> Array2<Complex<f64>> {
        let (h, w) = data.dim();
        debug_assert_eq!((w, h), (self.width, self.height));

        let mut result = data.mapv(|v| Complex::new(v as f64, 0.0));

        for row in 0..h {
            for col in 0..w {
                self.row_scratch[col] = result[[row, col]];
            }
            self.fft_row.process(&mut self.row_scratch);
            for col in 0..w {
                result[[row, col]] = self.row_scratch[col];
            }
        }

        for col in 0..w {
            for row in 0..h {
                self.col_scratch[row] = result[[row, col]];
            }
            self.fft_col.process(&mut self.col_scratch);
            for row in 0..h {
                result[[row, col]] = self.col_scratch[row];
            }
        }

        result
    }

    /// Inverse 2D FFT, returning the normalized real part.
    pub fn ifft2d(&mut self, data: &Array2<Complex<f64>>) -> Array2<f64> {
        let (h, w) = data.dim();
        debug_assert_eq!((w, h), (self.width, self.height));

        let mut work = data.clone();

        for col in 0..w {
            for row in 0..h {
                self.col_scratch[row] = work[[row, col]];
            }
            self.ifft_col.process(&mut self.col_scratch);
            for row in 0..h {
                work[[row, col]] = self.col_scratch[row];
            }
        }

        for row in 0..h {
            for col in 0..w {
                self.row_scratch[col] = work[[row, col]];
            }
            self.ifft_row.process(&mut self.row_scratch);
            for col in 0..w {
                work[[row, col]] = self.row_scratch[col];
            }
        }

        let scale = 1.0 / (h * w) as f64;
        work.mapv(|v| v.re * scale)
    }

    /// Convolution in the frequency domain: IFFT(FFT(data) · kernel_fft).
    pub fn convolve(
        &mut self,
        data: &Array2<f32>,
        kernel_fft: &Array2<Complex<f64>>,
    ) -> Array2<f64> {
        let mut spectrum = self.fft2d(data);
        spectrum.zip_mut_with(kernel_fft, |a, b| *a *= b);
        self.ifft2d(&spectrum)
    }
}
