//! Point-spread-function models.
//!
//! A model is immutable once its parameters are set and can render a
//! normalized kernel at any size. Kernels are laid out FFT-style (peak at
//! (0,0) with wrap-around) so frequency-domain convolution introduces no
//! spatial shift.

use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::{Result, StackError};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PsfModel {
    /// Elliptical Gaussian blur.
    Gaussian { sigma_x: f64, sigma_y: f64 },
    /// Long-exposure atmospheric seeing (Kolmogorov turbulence),
    /// parameterized by the seeing FWHM in pixels.
    Kolmogorov { seeing: f64 },
    /// Diffraction-limited Airy pattern; `radius` is the first dark ring in
    /// pixels.
    Airy { radius: f64 },
}

impl PsfModel {
    /// Resolve a PSF by name and parameter vector (the provider interface).
    pub fn resolve(name: &str, params: &[f64]) -> Result<PsfModel> {
        let param = |i: usize, default: f64| params.get(i).copied().unwrap_or(default);
        match name {
            "gaussian" => Ok(PsfModel::Gaussian {
                sigma_x: param(0, 2.0),
                sigma_y: param(1, param(0, 2.0)),
            }),
            "kolmogorov" => Ok(PsfModel::Kolmogorov {
                seeing: param(0, 3.0),
            }),
            "airy" => Ok(PsfModel::Airy {
                radius: param(0, 3.0),
            }),
            other => Err(StackError::UnknownPsf(other.to_string())),
        }
    }

    /// Render the kernel at the given size, wrap-around layout, sum = 1.
    pub fn render(&self, width: usize, height: usize) -> Array2<f32> {
        match self {
            PsfModel::Gaussian { sigma_x, sigma_y } => {
                render_gaussian(*sigma_x, *sigma_y, height, width)
            }
            PsfModel::Kolmogorov { seeing } => render_kolmogorov(*seeing, height, width),
            PsfModel::Airy { radius } => render_airy(*radius, height, width),
        }
    }

    /// A delta kernel: deconvolving with it is a no-op.
    pub fn is_delta(&self) -> bool {
        matches!(self, PsfModel::Gaussian { sigma_x, sigma_y } if *sigma_x == 0.0 && *sigma_y == 0.0)
    }
}

/// Signed wrap coordinate: rows/cols past the midpoint count as negative.
fn wrap_coord(i: usize, n: usize) -> f64 {
    if i <= n / 2 {
        i as f64
    } else {
        i as f64 - n as f64
    }
}

fn normalize(psf: &mut Array2<f32>, sum: f64) {
    if sum > 0.0 {
        let inv = 1.0 / sum as f32;
        psf.mapv_inplace(|v| v * inv);
    }
}

fn render_gaussian(sigma_x: f64, sigma_y: f64, h: usize, w: usize) -> Array2<f32> {
    let mut psf = Array2::<f32>::zeros((h, w));
    if sigma_x <= 0.0 || sigma_y <= 0.0 {
        // Degenerate sigma renders a delta.
        psf[[0, 0]] = 1.0;
        return psf;
    }
    let sx2 = 2.0 * sigma_x * sigma_x;
    let sy2 = 2.0 * sigma_y * sigma_y;
    let mut sum = 0.0f64;

    for row in 0..h {
        let y = wrap_coord(row, h);
        for col in 0..w {
            let x = wrap_coord(col, w);
            let val = (-(x * x / sx2 + y * y / sy2)).exp();
            psf[[row, col]] = val as f32;
            sum += val;
        }
    }
    normalize(&mut psf, sum);
    psf
}

/// Kolmogorov PSF via its OTF: exp(-3.44 (f/f0)^(5/3)), f0 = 0.98 / seeing.
fn render_kolmogorov(seeing: f64, h: usize, w: usize) -> Array2<f32> {
    let f0 = 0.98 / seeing;
    let mut otf = Array2::<Complex<f64>>::zeros((h, w));

    for row in 0..h {
        let fy = wrap_coord(row, h) / h as f64;
        for col in 0..w {
            let fx = wrap_coord(col, w) / w as f64;
            let f = (fx * fx + fy * fy).sqrt();
            let val = (-3.44 * (f / f0).powf(5.0 / 3.0)).exp();
            otf[[row, col]] = Complex::new(val, 0.0);
        }
    }

    let spatial = ifft2d_once(&otf);

    let mut psf = Array2::<f32>::zeros((h, w));
    let mut sum = 0.0f64;
    for row in 0..h {
        for col in 0..w {
            let val = spatial[[row, col]].max(0.0);
            psf[[row, col]] = val as f32;
            sum += val;
        }
    }
    normalize(&mut psf, sum);
    psf
}

/// Airy PSF: (2 J1(pi r / R) / (pi r / R))^2.
fn render_airy(radius: f64, h: usize, w: usize) -> Array2<f32> {
    let mut psf = Array2::<f32>::zeros((h, w));
    let mut sum = 0.0f64;

    for row in 0..h {
        let y = wrap_coord(row, h);
        for col in 0..w {
            let x = wrap_coord(col, w);
            let r = (x * x + y * y).sqrt();
            let val = if r < 1e-12 {
                1.0 // lim (2*J1(x)/x)^2 as x→0 = 1
            } else {
                let arg = std::f64::consts::PI * r / radius;
                let jinc = 2.0 * bessel_j1(arg) / arg;
                jinc * jinc
            };
            psf[[row, col]] = val as f32;
            sum += val;
        }
    }
    normalize(&mut psf, sum);
    psf
}

/// Bessel J1, Abramowitz & Stegun rational polynomial approximation.
pub fn bessel_j1(x: f64) -> f64 {
    let ax = x.abs();

    if ax < 8.0 {
        let y = x * x;
        let r1 = x
            * (72362614232.0
                + y * (-7895059235.0
                    + y * (242396853.1
                        + y * (-2972611.439 + y * (15704.48260 + y * (-30.16036606))))));
        let r2 = 144725228442.0
            + y * (2300535178.0 + y * (18583304.74 + y * (99447.43394 + y * (376.9991397 + y))));
        r1 / r2
    } else {
        let z = 8.0 / ax;
        let y = z * z;
        let xx = ax - 2.356194491; // ax - 3*PI/4
        let p0 = 1.0
            + y * (0.183105e-2
                + y * (-0.3516396496e-4 + y * (0.2457520174e-5 + y * (-0.240337019e-6))));
        let q0 = 0.04687499995
            + y * (-0.2002690873e-3
                + y * (0.8449199096e-5 + y * (-0.88228987e-6 + y * (0.105787412e-6))));
        let ans = (0.636619772 / ax).sqrt() * (xx.cos() * p0 - z * xx.sin() * q0);
        if x < 0.0 {
            -ans
        } else {
            ans
        }
    }
}

/// One-shot inverse 2D FFT for kernel rendering (the run-scoped workspace in
/// `deconv::fft` handles the iteration loop).
fn ifft2d_once(data: &Array2<Complex<f64>>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();

    for col in 0..w {
        let mut col_data: Vec<Complex<f64>> = (0..h).map(|r| work[[r, col]]).collect();
        ifft_col.process(&mut col_data);
        for row in 0..h {
            work[[row, col]] = col_data[row];
        }
    }

    for row in 0..h {
        let mut row_data: Vec<Complex<f64>> = (0..w).map(|c| work[[row, c]]).collect();
        ifft_row.process(&mut row_data);
        for col in 0..w {
            work[[row, col]] = row_data[col];
        }
    }

    let scale = 1.0 / (h * w) as f64;
    work.mapv(|v| v.re * scale)
}
