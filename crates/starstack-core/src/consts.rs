/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;

/// Default edge length of the template region when no ROI is given.
pub const DEFAULT_TEMPLATE_SIZE: usize = 100;

/// Default search range (pixels) around the tracked template position.
pub const DEFAULT_MATCH_RANGE: usize = 10;

/// Rotations below this magnitude (degrees) are treated as zero.
pub const ROTATION_EPSILON_DEG: f64 = 0.001;

/// Centroid refinement stops once the center moves less than this (pixels).
pub const CENTROID_CONVERGENCE_PX: f64 = 0.01;

/// Conversion from a Gaussian sigma to full width at half maximum.
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045;

/// Fraction of the intensity histogram treated as background for the
/// sky-level estimate; samples above this percentile (stars) are excluded.
pub const SKY_PERCENTILE: f64 = 0.75;

/// Number of bins in the sky-level intensity histogram.
pub const SKY_HISTOGRAM_BINS: usize = 65_536;

/// Guard added to the denominator of the Lucy-Richardson ratio.
pub const RATIO_EPSILON: f64 = 1e-10;
