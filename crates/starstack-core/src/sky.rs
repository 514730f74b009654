//! Sky-background estimation for pre-stack subtraction.
//!
//! A uniform background level left in each frame would drift from frame to
//! frame and dominate an un-normalized sum, so the stacker can subtract a
//! robust estimate before accumulating. The estimate is the mean of the
//! lower-intensity band of the histogram; the bright tail (stars, planet
//! disk) is excluded by a percentile cut.

use crate::buffer::PixelBuffer;
use crate::consts::{SKY_HISTOGRAM_BINS, SKY_PERCENTILE};

/// Estimate the sky background level of a frame.
///
/// Builds an intensity histogram over the frame's [min, max] range and
/// returns the mean of all samples at or below the 75th-percentile cut.
pub fn sky_level(buffer: &PixelBuffer) -> f32 {
    let (min, max) = buffer.min_max();
    let range = max - min;
    if range <= 0.0 {
        // Flat frame: the background is the frame.
        return min;
    }

    let scale = (SKY_HISTOGRAM_BINS - 1) as f32 / range;
    let mut counts = vec![0u64; SKY_HISTOGRAM_BINS];
    let mut total = 0u64;
    for plane in buffer.planes() {
        for &v in plane.iter() {
            let bin = ((v - min) * scale) as usize;
            counts[bin.min(SKY_HISTOGRAM_BINS - 1)] += 1;
        }
        total += plane.len() as u64;
    }

    // Find the bin below which SKY_PERCENTILE of all samples fall.
    let cutoff_count = (total as f64 * SKY_PERCENTILE) as u64;
    let mut seen = 0u64;
    let mut cut_bin = SKY_HISTOGRAM_BINS - 1;
    for (bin, &count) in counts.iter().enumerate() {
        seen += count;
        if seen >= cutoff_count {
            cut_bin = bin;
            break;
        }
    }
    let cut_value = min + (cut_bin as f32 + 1.0) / scale;

    // Mean of the band at or below the cut.
    let mut sum = 0.0f64;
    let mut n = 0u64;
    for plane in buffer.planes() {
        for &v in plane.iter() {
            if v <= cut_value {
                sum += v as f64;
                n += 1;
            }
        }
    }
    if n == 0 {
        min
    } else {
        (sum / n as f64) as f32
    }
}

/// Subtract the estimated sky level from every sample in place.
///
/// Values are not clamped at zero; the stacked result is un-normalized by
/// contract and output encoding clamps on write.
pub fn subtract_sky(buffer: &mut PixelBuffer) -> f32 {
    let level = sky_level(buffer);
    *buffer -= level;
    level
}
