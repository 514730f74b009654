//! Multi-frame additive stacking with optional alignment.
//!
//! Frames are processed strictly sequentially: template matching tracks a
//! drifting window and star matching carries a rolling star list, so each
//! frame depends on state left behind by the previous ones. The accumulator
//! is an un-normalized sum; averaging is an explicit, separate step.

pub mod aligner;

use std::path::Path;

use tracing::{info, warn};

use crate::buffer::{PixelBuffer, Rect};
use crate::consts::ROTATION_EPSILON_DEG;
use crate::error::{Result, StackError};
use crate::io::FrameLoader;
use crate::progress::{ProcessStage, ProgressReporter};
use crate::registration::{
    refine_stars, rotate_list, rotation_between, shift_between, StarList, StarMatchConfig,
    TemplateConfig, TemplateMatcher,
};
use crate::resample::{rotate, shift};
use crate::sky::subtract_sky;

/// How each frame is registered to the reference before accumulation.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum AlignMode {
    /// Add frames as-is.
    None,
    /// Normalized cross-correlation against a template from the first frame.
    Template {
        /// Template region; empty selects a centered default.
        roi: Rect,
        config: TemplateConfig,
    },
    /// Star-list rotation/shift estimation anchored to the first frame.
    Stars {
        /// Approximate star positions, refined against the first frame.
        seeds: Vec<(f64, f64)>,
        config: StarMatchConfig,
    },
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StackConfig {
    /// Subtract the histogram sky estimate from each frame before adding.
    pub subtract_sky: bool,
    pub align: AlignMode,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            subtract_sky: false,
            align: AlignMode::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackState {
    Idle,
    Prepared,
    Accumulating,
    Done,
    Failed,
}

enum AlignState {
    None,
    Template(TemplateMatcher),
    Stars {
        config: StarMatchConfig,
        /// First-frame star list; shift estimation is anchored here so
        /// per-frame error does not compound.
        reference: StarList,
        /// Star positions as found in the last accepted frame; seeds the
        /// next frame's refinement.
        rolling: StarList,
    },
}

/// Finished (or cancelled-partial) stack.
pub struct StackResult {
    /// Un-normalized pixel sum of all accepted frames.
    pub buffer: PixelBuffer,
    pub frames_stacked: usize,
    /// One human-readable line per applied transform, for audit history.
    pub history: Vec<String>,
}

impl StackResult {
    /// Average of the accepted frames (the separate, explicit
    /// normalization step).
    pub fn normalized(&self) -> PixelBuffer {
        let mut out = self.buffer.clone();
        out /= self.frames_stacked as f32;
        out
    }
}

pub struct Stacker {
    config: StackConfig,
    state: StackState,
    align: AlignState,
    accumulator: Option<PixelBuffer>,
    frames_stacked: usize,
    history: Vec<String>,
}

impl Stacker {
    pub fn new(config: StackConfig) -> Self {
        Self {
            config,
            state: StackState::Idle,
            align: AlignState::None,
            accumulator: None,
            frames_stacked: 0,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> StackState {
        self.state
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Load the first frame as the accumulator base and set up the
    /// configured alignment. Any failure here is fatal: the stacker moves to
    /// `Failed` and nothing has been accumulated.
    pub fn prepare(&mut self, frame: PixelBuffer) -> Result<()> {
        assert_eq!(self.state, StackState::Idle, "prepare called twice");
        match self.prepare_inner(frame) {
            Ok(()) => {
                self.state = StackState::Prepared;
                Ok(())
            }
            Err(e) => {
                self.state = StackState::Failed;
                self.accumulator = None;
                Err(e)
            }
        }
    }

    fn prepare_inner(&mut self, mut frame: PixelBuffer) -> Result<()> {
        if self.config.subtract_sky {
            let level = subtract_sky(&mut frame);
            info!(level, "subtracted sky background from reference frame");
        }

        self.align = match &self.config.align {
            AlignMode::None => AlignState::None,
            AlignMode::Template { roi, config } => {
                let matcher = TemplateMatcher::set_template(config.clone(), &frame, *roi)?;
                AlignState::Template(matcher)
            }
            AlignMode::Stars { seeds, config } => {
                if seeds.is_empty() {
                    return Err(StackError::Setup(
                        "star-match stacking requires a non-empty seed list".into(),
                    ));
                }
                // Refined twice: once as the fixed reference, once as the
                // rolling list the per-frame refinement will track.
                let reference = refine_stars(&frame, seeds, config);
                let rolling = refine_stars(&frame, seeds, config);
                AlignState::Stars {
                    config: config.clone(),
                    reference,
                    rolling,
                }
            }
        };

        self.history.push("reference frame loaded".to_string());
        self.accumulator = Some(frame);
        self.frames_stacked = 1;
        Ok(())
    }

    /// Align and add one subsequent frame.
    ///
    /// A returned error is a per-frame failure: the accumulator and rolling
    /// state are untouched and the caller may continue with the next frame.
    pub fn accumulate(&mut self, mut frame: PixelBuffer, label: &str) -> Result<()> {
        assert!(
            matches!(self.state, StackState::Prepared | StackState::Accumulating),
            "accumulate before prepare"
        );
        self.state = StackState::Accumulating;

        if self.config.subtract_sky {
            subtract_sky(&mut frame);
        }

        let accumulator = self.accumulator.as_ref().expect("prepared");
        if !frame.is_compatible_with(accumulator) {
            return Err(StackError::Frame {
                path: label.into(),
                reason: format!(
                    "frame is {}x{}x{}, stack is {}x{}x{}",
                    frame.width(),
                    frame.height(),
                    frame.depth(),
                    accumulator.width(),
                    accumulator.height(),
                    accumulator.depth()
                ),
            });
        }

        let (aligned, summary) = match &mut self.align {
            AlignState::None => (frame, format!("{label}: added without alignment")),
            AlignState::Template(matcher) => {
                let m = matcher.compute_match(&frame)?;
                // shift() samples the source at (+dx, +dy), which moves the
                // drifted content back onto the reference position.
                let aligned = shift(&frame, m.dx, m.dy);
                matcher.shift_aoi(m.dx, m.dy);
                let summary = format!(
                    "{label}: template match at ({:.1},{:.1}), score {:.3}, shift ({:+.2},{:+.2})",
                    m.x, m.y, m.score, -m.dx, -m.dy
                );
                (aligned, summary)
            }
            AlignState::Stars {
                config,
                reference,
                rolling,
            } => {
                let seeds: Vec<(f64, f64)> = rolling.iter().map(|s| (s.x, s.y)).collect();
                let refined = refine_stars(&frame, &seeds, config);

                let mut current = refined.clone();
                let mut working = frame;
                let mut rotation_note = String::new();

                if config.rotate {
                    let est = rotation_between(reference, &current)?;
                    let gated = config.angle_sigma_gate
                        && est.sigma > 0.0
                        && est.degrees.abs() < est.sigma / 2.0;
                    if est.degrees.abs() > ROTATION_EPSILON_DEG && !gated {
                        let cx = (working.width() as f64 - 1.0) / 2.0;
                        let cy = (working.height() as f64 - 1.0) / 2.0;
                        working = rotate(&working, -est.degrees, true);
                        current = rotate_list(&current, -est.degrees, cx, cy);
                        rotation_note = format!(
                            ", rotation {:+.3}\u{b0} (\u{3c3} {:.3}\u{b0})",
                            -est.degrees, est.sigma
                        );
                    } else if gated {
                        rotation_note = format!(
                            ", rotation {:+.3}\u{b0} below \u{3c3}/2 gate, skipped",
                            est.degrees
                        );
                    }
                }

                // Anchored to the first frame's list, not the previous
                // frame's, so drift correction does not compound error.
                let est = shift_between(reference, &current)?;
                if est.dx.abs() > config.maxmove || est.dy.abs() > config.maxmove {
                    return Err(StackError::ShiftRejected {
                        dx: est.dx,
                        dy: est.dy,
                        maxmove: config.maxmove,
                    });
                }

                let aligned = shift(&working, est.dx, est.dy);
                // Rolling list holds raw-frame positions for the next seed.
                *rolling = refined;
                let summary = format!(
                    "{label}: star match shift ({:+.2},{:+.2}) (\u{3c3} {:.2},{:.2}){rotation_note}",
                    -est.dx, -est.dy, est.sigma_x, est.sigma_y
                );
                (aligned, summary)
            }
        };

        *self.accumulator.as_mut().expect("prepared") += &aligned;
        self.frames_stacked += 1;
        info!("{summary}");
        self.history.push(summary);
        Ok(())
    }

    /// Take the accumulated result. Valid after `prepare` succeeded, even if
    /// accumulation was cancelled partway.
    pub fn finish(mut self) -> Result<StackResult> {
        let buffer = self.accumulator.take().ok_or(StackError::EmptySequence)?;
        self.state = StackState::Done;
        Ok(StackResult {
            buffer,
            frames_stacked: self.frames_stacked,
            history: self.history,
        })
    }
}

/// Stack a file sequence: the first path is the fatal-on-failure reference,
/// later frames are skipped (with a warning) on read, match, or rejection
/// failures. Cancellation keeps whatever has been summed so far.
pub fn stack_files<L: FrameLoader>(
    loader: &L,
    paths: &[impl AsRef<Path>],
    config: StackConfig,
    reporter: &dyn ProgressReporter,
) -> Result<StackResult> {
    if paths.is_empty() {
        return Err(StackError::EmptySequence);
    }

    reporter.begin_stage(ProcessStage::Stacking, Some(paths.len()));

    let mut stacker = Stacker::new(config);
    let first = paths[0].as_ref();
    let mut frames = loader.load(first)?;
    if frames.is_empty() {
        return Err(StackError::Setup(format!(
            "no decodable frame in {}",
            first.display()
        )));
    }
    let mut rest = frames.drain(..);
    stacker.prepare(rest.next().expect("non-empty"))?;
    for frame in rest {
        accumulate_logged(&mut stacker, frame, first);
    }
    reporter.advance(1);

    for (done, path) in paths[1..].iter().enumerate() {
        if reporter.is_cancelled() {
            warn!("stacking cancelled, keeping partial sum");
            break;
        }
        let path = path.as_ref();
        match loader.load(path) {
            Ok(frames) => {
                for frame in frames {
                    accumulate_logged(&mut stacker, frame, path);
                }
            }
            Err(e) => warn!("skipping {}: {e}", path.display()),
        }
        if let Some(line) = stacker.history().last() {
            reporter.message(line);
        }
        reporter.advance(done + 2);
    }

    reporter.finish_stage();
    stacker.finish()
}

fn accumulate_logged(stacker: &mut Stacker, frame: PixelBuffer, path: &Path) {
    if let Err(e) = stacker.accumulate(frame, &path.display().to_string()) {
        warn!("skipping {}: {e}", path.display());
    }
}
