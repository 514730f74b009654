//! Normalized cross-correlation template matching.
//!
//! A rectangular patch is extracted once from a reference frame and then
//! located in each subsequent frame by scanning candidate offsets and scoring
//! them with normalized cross-correlation. The template statistics (mean,
//! sigma) are precomputed at extraction time; only the search-window sums are
//! recomputed per candidate.

use ndarray::Array2;
use rayon::prelude::*;
use tracing::warn;

use crate::buffer::{PixelBuffer, Rect};
use crate::consts::{DEFAULT_MATCH_RANGE, DEFAULT_TEMPLATE_SIZE};
use crate::error::{Result, StackError};
use crate::resample::{resize, ResizeMode};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TemplateConfig {
    /// Search range in pixels around the tracked template position
    /// (ignored when `match_full` is set).
    pub match_range: usize,
    /// Scan the whole frame instead of a window around the tracked position.
    pub match_full: bool,
    /// Stride of the coarse scan; > 1 adds a stride-1 refinement pass
    /// within ±2 strides of the coarse best.
    pub first_pass_delta: usize,
    /// Only every n-th pixel pair contributes to the correlation sums.
    pub subsample: usize,
    /// Supersampling factor; > 1 upsamples reference and search frames
    /// bilinearly for sub-integer-pixel match precision.
    pub scale_factor: usize,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            match_range: DEFAULT_MATCH_RANGE,
            match_full: false,
            first_pass_delta: 1,
            subsample: 1,
            scale_factor: 1,
        }
    }
}

/// Best match position and displacement, in original-image units.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchResult {
    /// Matched template center in the search frame.
    pub x: f64,
    pub y: f64,
    /// Displacement of the match relative to the template's original
    /// position in the reference frame.
    pub dx: f64,
    pub dy: f64,
    /// Peak normalized cross-correlation score (1.0 = perfect).
    pub score: f64,
}

pub struct TemplateMatcher {
    config: TemplateConfig,
    /// Template samples (absolute intensity), at scale-factor resolution.
    template: Array2<f64>,
    mean_r: f64,
    sigma_r: f64,
    /// Template region in the (scaled) reference frame.
    origin: Rect,
    /// Cumulative AOI shift (scaled integer pixels), applied against the
    /// original region so repeated calls with the same external estimate
    /// are idempotent.
    aoi_shift: (i64, i64),
}

impl TemplateMatcher {
    /// Extract the template region from a reference frame.
    ///
    /// An empty `roi` defaults to a centered square of 100 px or half the
    /// image, whichever is smaller. A partially out-of-bounds `roi` is
    /// clipped with a warning; a fully outside one is an error.
    pub fn set_template(config: TemplateConfig, reference: &PixelBuffer, roi: Rect) -> Result<Self> {
        assert!(config.scale_factor >= 1, "scale_factor must be at least 1");
        assert!(config.subsample >= 1, "subsample must be at least 1");
        assert!(config.first_pass_delta >= 1, "first_pass_delta must be at least 1");

        let scale = config.scale_factor;
        let intensity = scaled_intensity(reference, scale);
        let (h, w) = intensity.dim();

        let roi = if roi.is_empty() {
            let side = DEFAULT_TEMPLATE_SIZE
                .min(reference.width() / 2)
                .min(reference.height() / 2);
            Rect::centered(reference.width(), reference.height(), side, side)
        } else {
            roi
        };
        let roi = Rect::new(
            roi.x * scale as i64,
            roi.y * scale as i64,
            roi.width * scale,
            roi.height * scale,
        );

        let clipped = roi.overlap(w, h).ok_or(StackError::EmptyRegion {
            x: roi.x,
            y: roi.y,
            width: roi.width,
            height: roi.height,
            img_width: w,
            img_height: h,
        })?;
        if clipped != roi {
            warn!(
                "template region clipped to {}x{} at ({},{})",
                clipped.width, clipped.height, clipped.x, clipped.y
            );
        }

        let (x0, y0) = (clipped.x as usize, clipped.y as usize);
        let mut template = Array2::<f64>::zeros((clipped.height, clipped.width));
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for row in 0..clipped.height {
            for col in 0..clipped.width {
                let v = intensity[[y0 + row, x0 + col]] as f64;
                template[[row, col]] = v;
                sum += v;
                sum_sq += v * v;
            }
        }
        let n = (clipped.width * clipped.height) as f64;
        let mean_r = sum / n;
        let sigma_r = (sum_sq - sum * mean_r).max(0.0).sqrt();

        Ok(Self {
            config,
            template,
            mean_r,
            sigma_r,
            origin: clipped,
            aoi_shift: (0, 0),
        })
    }

    /// Track cumulative frame drift without re-extracting the template.
    ///
    /// The shift is absolute against the *original* template region, rounded
    /// to integer pixels at the current scale factor, so calling twice with
    /// the same estimate leaves the tracked position unchanged.
    pub fn shift_aoi(&mut self, dx: f64, dy: f64) {
        let scale = self.config.scale_factor as f64;
        self.aoi_shift = ((dx * scale).round() as i64, (dy * scale).round() as i64);
    }

    fn template_size(&self) -> (usize, usize) {
        (self.template.ncols(), self.template.nrows())
    }

    /// Locate the template in a search frame.
    pub fn compute_match(&self, search: &PixelBuffer) -> Result<MatchResult> {
        let scale = self.config.scale_factor;
        let intensity = scaled_intensity(search, scale);
        let (img_h, img_w) = intensity.dim();
        let (tw, th) = self.template_size();

        // Search window: full frame, or the tracked template position padded
        // by match_range on every side.
        let window = if self.config.match_full {
            Rect::new(0, 0, img_w, img_h)
        } else {
            let range = (self.config.match_range * scale) as i64;
            Rect::new(
                self.origin.x + self.aoi_shift.0 - range,
                self.origin.y + self.aoi_shift.1 - range,
                tw + 2 * range as usize,
                th + 2 * range as usize,
            )
        };
        let window = window.overlap(img_w, img_h).ok_or(StackError::EmptyRegion {
            x: window.x,
            y: window.y,
            width: window.width,
            height: window.height,
            img_width: img_w,
            img_height: img_h,
        })?;
        if window.width < tw || window.height < th {
            return Err(StackError::EmptyRegion {
                x: window.x,
                y: window.y,
                width: window.width,
                height: window.height,
                img_width: img_w,
                img_height: img_h,
            });
        }

        let max_r = window.height - th;
        let max_s = window.width - tw;
        let delta = self.config.first_pass_delta;

        let coarse = self.scan(&intensity, &window, 0, max_r, 0, max_s, delta);

        let (best_r, best_s, best_score) = if delta > 1 {
            let r0 = coarse.0.saturating_sub(2 * delta);
            let r1 = (coarse.0 + 2 * delta).min(max_r);
            let s0 = coarse.1.saturating_sub(2 * delta);
            let s1 = (coarse.1 + 2 * delta).min(max_s);
            self.scan(&intensity, &window, r0, r1, s0, s1, 1)
        } else {
            coarse
        };

        // Matched center in scaled search-frame coordinates.
        let x = window.x + best_s as i64 + (tw / 2) as i64;
        let y = window.y + best_r as i64 + (th / 2) as i64;
        let dx = x - (self.origin.x + (tw / 2) as i64);
        let dy = y - (self.origin.y + (th / 2) as i64);

        let inv = 1.0 / scale as f64;
        Ok(MatchResult {
            x: x as f64 * inv,
            y: y as f64 * inv,
            dx: dx as f64 * inv,
            dy: dy as f64 * inv,
            score: best_score,
        })
    }

    /// Grid scan over candidate top-left offsets (row, col) within the
    /// window, returning the best (row, col, score).
    fn scan(
        &self,
        intensity: &Array2<f32>,
        window: &Rect,
        r0: usize,
        r1: usize,
        s0: usize,
        s1: usize,
        stride: usize,
    ) -> (usize, usize, f64) {
        let rows: Vec<usize> = (r0..=r1).step_by(stride).collect();
        rows.par_iter()
            .map(|&r| {
                let mut best = (r, s0, f64::NEG_INFINITY);
                let mut s = s0;
                while s <= s1 {
                    let score = self.score_at(intensity, window, r, s);
                    if score > best.2 {
                        best = (r, s, score);
                    }
                    s += stride;
                }
                best
            })
            .reduce(
                || (r0, s0, f64::NEG_INFINITY),
                |a, b| if b.2 > a.2 { b } else { a },
            )
    }

    /// Normalized cross-correlation of the template against the window at
    /// candidate top-left offset (r, s).
    fn score_at(&self, intensity: &Array2<f32>, window: &Rect, r: usize, s: usize) -> f64 {
        let (tw, th) = self.template_size();
        let sub = self.config.subsample;
        let base_y = window.y as usize + r;
        let base_x = window.x as usize + s;

        let mut sum_i = 0.0f64;
        let mut sum_i2 = 0.0f64;
        let mut cov_ir = 0.0f64;
        let mut n = 0.0f64;

        let mut ty = 0;
        while ty < th {
            let mut tx = 0;
            while tx < tw {
                let i = intensity[[base_y + ty, base_x + tx]] as f64;
                let t = self.template[[ty, tx]];
                sum_i += i;
                sum_i2 += i * i;
                cov_ir += i * t;
                n += 1.0;
                tx += sub;
            }
            ty += sub;
        }

        let mean_i = sum_i / n;
        let sigma_i = (sum_i2 - sum_i * mean_i).max(0.0).sqrt();
        if sigma_i < 1e-9 || self.sigma_r < 1e-9 {
            // Flat region, no usable correlation.
            return 0.0;
        }
        (cov_ir - sum_i * self.mean_r) / (sigma_i * self.sigma_r)
    }
}

/// Per-pixel channel sum, upsampled bilinearly when `scale > 1`.
fn scaled_intensity(buffer: &PixelBuffer, scale: usize) -> Array2<f32> {
    if scale > 1 {
        let f = scale as f64;
        resize(buffer, f, f, ResizeMode::Bilinear).intensity()
    } else {
        buffer.intensity()
    }
}
