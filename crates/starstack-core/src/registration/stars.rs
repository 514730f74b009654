//! Star detection and rigid rotation/shift estimation.
//!
//! Seed positions (manual picks or a prior frame's star list) are refined to
//! sub-pixel centroids frame by frame. Two refined lists with matching seed
//! order then yield a rotation estimate (from consecutive-pair direction
//! vectors) and a translation estimate (from per-index displacements).

use ndarray::Array2;

use crate::buffer::PixelBuffer;
use crate::consts::{CENTROID_CONVERGENCE_PX, FWHM_PER_SIGMA};
use crate::error::{Result, StackError};

/// Sub-pixel star centroid with shape measurements.
#[derive(Clone, Copy, Debug, Default)]
pub struct Star {
    pub x: f64,
    pub y: f64,
    /// Mean full width at half maximum across both axes.
    pub fwhm: f64,
    pub xwidth: f64,
    pub ywidth: f64,
}

/// Ordered star sequence; index i corresponds to seed i across frames.
pub type StarList = Vec<Star>;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StarMatchConfig {
    /// Side length of the window searched for the brightest pixel around
    /// each seed.
    pub searchbox: usize,
    /// Side length of the centroid refinement window around the peak.
    pub starbox: usize,
    /// Centroid refinement iteration cap.
    pub maxiter: usize,
    /// Frames whose estimated shift exceeds this (pixels, either axis) are
    /// rejected.
    pub maxmove: f64,
    /// Estimate and apply rotation before the shift estimate.
    pub rotate: bool,
    /// Secondary gate: skip a rotation whose magnitude is below half its own
    /// standard deviation. Off by default; the primary rule is to apply any
    /// rotation above the 0.001° epsilon.
    pub angle_sigma_gate: bool,
}

impl Default for StarMatchConfig {
    fn default() -> Self {
        Self {
            searchbox: 20,
            starbox: 10,
            maxiter: 10,
            maxmove: 50.0,
            rotate: false,
            angle_sigma_gate: false,
        }
    }
}

/// Rotation estimate in degrees with its sample standard deviation.
#[derive(Clone, Copy, Debug, Default)]
pub struct AngleEstimate {
    pub degrees: f64,
    pub sigma: f64,
}

/// Per-axis translation estimate with sample standard deviations.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShiftEstimate {
    pub dx: f64,
    pub dy: f64,
    pub sigma_x: f64,
    pub sigma_y: f64,
}

/// Refine one seed position to a sub-pixel centroid.
///
/// The brightest pixel inside the `searchbox` window around the seed anchors
/// an iterative moment centroid over the `starbox` window, bounded by
/// `maxiter` iterations. A seed in a flat region degrades to the seed
/// position with zero widths; it never aborts the other seeds.
pub fn refine_star(buffer: &PixelBuffer, seed: (f64, f64), config: &StarMatchConfig) -> Star {
    let intensity = buffer.intensity();
    refine_star_intensity(&intensity, seed, config)
}

/// Refine every seed, preserving order.
pub fn refine_stars(
    buffer: &PixelBuffer,
    seeds: &[(f64, f64)],
    config: &StarMatchConfig,
) -> StarList {
    let intensity = buffer.intensity();
    seeds
        .iter()
        .map(|&seed| refine_star_intensity(&intensity, seed, config))
        .collect()
}

fn refine_star_intensity(
    intensity: &Array2<f32>,
    seed: (f64, f64),
    config: &StarMatchConfig,
) -> Star {
    let (h, w) = intensity.dim();

    // Brightest pixel within the search box, clipped to bounds.
    let (sx0, sx1) = window_bounds(seed.0, config.searchbox, w);
    let (sy0, sy1) = window_bounds(seed.1, config.searchbox, h);
    let mut peak = (seed.0.round() as usize, seed.1.round() as usize);
    let mut peak_val = f32::NEG_INFINITY;
    for row in sy0..sy1 {
        for col in sx0..sx1 {
            if intensity[[row, col]] > peak_val {
                peak_val = intensity[[row, col]];
                peak = (col, row);
            }
        }
    }

    // Iterative moment centroid around the peak.
    let mut cx = peak.0 as f64;
    let mut cy = peak.1 as f64;
    let mut sigma_x = 0.0f64;
    let mut sigma_y = 0.0f64;

    for _ in 0..config.maxiter.max(1) {
        let (x0, x1) = window_bounds(cx, config.starbox, w);
        let (y0, y1) = window_bounds(cy, config.starbox, h);
        if x0 >= x1 || y0 >= y1 {
            break;
        }

        // Local background: the window minimum. Moments are taken over the
        // background-subtracted values so nearby sky gradient does not pull
        // the centroid.
        let mut bg = f32::INFINITY;
        for row in y0..y1 {
            for col in x0..x1 {
                bg = bg.min(intensity[[row, col]]);
            }
        }

        let mut m = 0.0f64;
        let mut mx = 0.0f64;
        let mut my = 0.0f64;
        let mut mxx = 0.0f64;
        let mut myy = 0.0f64;
        for row in y0..y1 {
            for col in x0..x1 {
                let v = (intensity[[row, col]] - bg) as f64;
                m += v;
                mx += col as f64 * v;
                my += row as f64 * v;
            }
        }
        if m <= 0.0 {
            // Flat window: keep the current position.
            break;
        }
        let nx = mx / m;
        let ny = my / m;
        for row in y0..y1 {
            for col in x0..x1 {
                let v = (intensity[[row, col]] - bg) as f64;
                mxx += (col as f64 - nx) * (col as f64 - nx) * v;
                myy += (row as f64 - ny) * (row as f64 - ny) * v;
            }
        }
        sigma_x = (mxx / m).max(0.0).sqrt();
        sigma_y = (myy / m).max(0.0).sqrt();

        let moved = ((nx - cx).powi(2) + (ny - cy).powi(2)).sqrt();
        cx = nx;
        cy = ny;
        if moved < CENTROID_CONVERGENCE_PX {
            break;
        }
    }

    let xwidth = FWHM_PER_SIGMA * sigma_x;
    let ywidth = FWHM_PER_SIGMA * sigma_y;
    Star {
        x: cx,
        y: cy,
        fwhm: 0.5 * (xwidth + ywidth),
        xwidth,
        ywidth,
    }
}

fn window_bounds(center: f64, size: usize, limit: usize) -> (usize, usize) {
    let half = (size / 2) as i64;
    let c = center.round() as i64;
    let lo = (c - half).clamp(0, limit as i64) as usize;
    let hi = (c + half + 1).clamp(0, limit as i64) as usize;
    (lo, hi)
}

/// Mean rotation between two ordered star lists, from the angles of
/// consecutive-pair direction vectors.
///
/// Requires at least two stars. With exactly two (a single pair) the
/// standard deviation is reported as zero.
pub fn rotation_between(reference: &StarList, current: &StarList) -> Result<AngleEstimate> {
    let n = reference.len().min(current.len());
    if n < 2 {
        return Err(StackError::TooFewStars { needed: 2, got: n });
    }

    let mut diffs = Vec::with_capacity(n - 1);
    for i in 0..n - 1 {
        let a = pair_angle(&reference[i], &reference[i + 1]);
        let b = pair_angle(&current[i], &current[i + 1]);
        // Wrap the difference into (-pi, pi] so 359° vs 1° reads as 2°.
        let mut d = b - a;
        if d > std::f64::consts::PI {
            d -= std::f64::consts::TAU;
        } else if d <= -std::f64::consts::PI {
            d += std::f64::consts::TAU;
        }
        diffs.push(d.to_degrees());
    }

    let (mean, sigma) = mean_sigma(&diffs);
    Ok(AngleEstimate {
        degrees: mean,
        sigma,
    })
}

/// Mean per-axis displacement current[i] − reference[i].
pub fn shift_between(reference: &StarList, current: &StarList) -> Result<ShiftEstimate> {
    let n = reference.len().min(current.len());
    if n == 0 {
        return Err(StackError::TooFewStars { needed: 1, got: 0 });
    }

    let dxs: Vec<f64> = (0..n).map(|i| current[i].x - reference[i].x).collect();
    let dys: Vec<f64> = (0..n).map(|i| current[i].y - reference[i].y).collect();
    let (dx, sigma_x) = mean_sigma(&dxs);
    let (dy, sigma_y) = mean_sigma(&dys);
    Ok(ShiftEstimate {
        dx,
        dy,
        sigma_x,
        sigma_y,
    })
}

/// Rotate star positions analytically about (cx, cy), matching the pixel
/// rotation's counter-clockwise-positive convention.
pub fn rotate_list(list: &StarList, angle_deg: f64, cx: f64, cy: f64) -> StarList {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    list.iter()
        .map(|star| {
            let rx = star.x - cx;
            let ry = star.y - cy;
            Star {
                x: rx * cos - ry * sin + cx,
                y: rx * sin + ry * cos + cy,
                ..*star
            }
        })
        .collect()
}

/// Direction angle of the vector a→b, normalized to [0, 2pi).
fn pair_angle(a: &Star, b: &Star) -> f64 {
    (b.y - a.y).atan2(b.x - a.x).rem_euclid(std::f64::consts::TAU)
}

/// Mean and sample standard deviation; sigma is zero for fewer than two
/// values.
fn mean_sigma(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}
