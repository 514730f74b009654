//! Iterative FFT-based image restoration (van Cittert / Lucy-Richardson).
//!
//! Both variants share the same machinery: the observed image is padded, a
//! PSF kernel is rendered at the padded size, and each iteration convolves
//! the current estimate with the PSF in the frequency domain, derives a
//! residual, damps it with a relaxation function, and folds it back into the
//! estimate. The residual's standard deviation is reported per iteration as
//! a convergence signal; there is no automatic early stop.

pub mod fft;
pub mod psf;

pub use psf::PsfModel;

use ndarray::{s, Array2};
use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::consts::RATIO_EPSILON;
use crate::error::Result;
use crate::progress::{ProcessStage, ProgressReporter};

use fft::FftWorkspace;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DeconvMethod {
    /// Additive update: o += relax(observed − o ⊗ h).
    VanCittert,
    /// Multiplicative update: o *= 1 + relax(observed / (o ⊗ h) − 1).
    LucyRichardson,
}

/// Per-iteration damping of the computed correction.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Relaxation {
    /// Multiply the residual by a constant in (0, 1].
    Constant(f64),
    /// Per-pixel weight sin(π/2 · t)^power, t = position of the current
    /// estimate between the observation's global min and max.
    Sine { power: f64 },
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DeconvConfig {
    pub method: DeconvMethod,
    pub iterations: usize,
    pub relaxation: Relaxation,
    /// Clamp the estimate to the observation's [min, max] after every
    /// iteration to suppress overshoot and ringing ("cut image").
    pub clamp_to_input: bool,
    /// Nominal PSF extent in pixels; the image is padded by this much per
    /// axis (rounded to even) before the FFTs.
    pub kernel_size: usize,
    pub psf: PsfModel,
}

impl Default for DeconvConfig {
    fn default() -> Self {
        Self {
            method: DeconvMethod::VanCittert,
            iterations: 10,
            relaxation: Relaxation::Constant(1.0),
            clamp_to_input: true,
            kernel_size: 32,
            psf: PsfModel::Gaussian {
                sigma_x: 2.0,
                sigma_y: 2.0,
            },
        }
    }
}

fn even(n: usize) -> usize {
    n + (n & 1)
}

/// Restore a single buffer given its PSF.
///
/// Cancellation between iterations keeps the best-so-far estimate; the FFT
/// workspace is dropped on every exit path.
pub fn deconvolve(
    observed: &PixelBuffer,
    config: &DeconvConfig,
    reporter: &dyn ProgressReporter,
) -> Result<PixelBuffer> {
    let (w, h) = (observed.width(), observed.height());
    let pw = even(w + config.kernel_size);
    let ph = even(h + config.kernel_size);

    let mut workspace = FftWorkspace::new(pw, ph);

    // Forward FFT of the kernel, once per run.
    let kernel = config.psf.render(pw, ph);
    let kernel_fft = workspace.fft2d(&kernel);

    let (obs_min, obs_max) = observed.min_max();

    // Observed image and initial estimate, zero-padded bottom/right.
    let padded: Vec<Array2<f32>> = observed
        .planes()
        .map(|plane| {
            let mut p = Array2::<f32>::zeros((ph, pw));
            p.slice_mut(s![0..h, 0..w]).assign(plane);
            p
        })
        .collect();
    let mut estimates = padded.clone();

    reporter.begin_stage(ProcessStage::Deconvolving, Some(config.iterations));

    for iter in 0..config.iterations {
        if reporter.is_cancelled() {
            debug!("deconvolution cancelled at iteration {iter}, keeping current estimate");
            break;
        }

        let mut res_sum = 0.0f64;
        let mut res_sum_sq = 0.0f64;

        for (estimate, observed) in estimates.iter_mut().zip(&padded) {
            let convolved = workspace.convolve(estimate, &kernel_fft);

            for row in 0..ph {
                for col in 0..pw {
                    let o = observed[[row, col]] as f64;
                    let c = convolved[[row, col]];
                    let e = estimate[[row, col]] as f64;

                    let residual = match config.method {
                        DeconvMethod::VanCittert => o - c,
                        DeconvMethod::LucyRichardson => o / (c + RATIO_EPSILON) - 1.0,
                    };
                    let relaxed = residual * relax_weight(&config.relaxation, e, obs_min, obs_max);

                    let mut updated = match config.method {
                        DeconvMethod::VanCittert => e + relaxed,
                        DeconvMethod::LucyRichardson => e * (1.0 + relaxed),
                    };
                    if config.clamp_to_input {
                        updated = updated.clamp(obs_min as f64, obs_max as f64);
                    }
                    estimate[[row, col]] = updated as f32;

                    if row < h && col < w {
                        res_sum += residual;
                        res_sum_sq += residual * residual;
                    }
                }
            }
        }

        let n = (w * h * estimates.len()) as f64;
        let mean = res_sum / n;
        let sigma = (res_sum_sq / n - mean * mean).max(0.0).sqrt();
        let line = format!("iteration {}: residual \u{3c3} {:.6}", iter + 1, sigma);
        debug!("{line}");
        reporter.message(&line);
        reporter.advance(iter + 1);
    }

    reporter.finish_stage();

    let planes = estimates
        .into_iter()
        .map(|p| p.slice(s![0..h, 0..w]).to_owned())
        .collect();
    Ok(PixelBuffer::from_planes(planes))
}

fn relax_weight(relaxation: &Relaxation, estimate: f64, min: f32, max: f32) -> f64 {
    match relaxation {
        Relaxation::Constant(f) => *f,
        Relaxation::Sine { power } => {
            let range = (max - min) as f64;
            if range <= 0.0 {
                return 1.0;
            }
            let t = ((estimate - min as f64) / range).clamp(0.0, 1.0);
            (std::f64::consts::FRAC_PI_2 * t)
                .sin()
                .powf(*power)
                .clamp(0.0, 1.0)
        }
    }
}
