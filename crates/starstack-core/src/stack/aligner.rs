//! Align-and-resave: the stacker's simpler sibling.
//!
//! The first frame defines the template and is saved unchanged; every later
//! frame is matched, shifted into registration, and written to its own
//! output file. No accumulation happens.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::buffer::{PixelBuffer, Rect};
use crate::error::{Result, StackError};
use crate::io::{FrameLoader, FrameWriter};
use crate::progress::{ProcessStage, ProgressReporter};
use crate::registration::{TemplateConfig, TemplateMatcher};
use crate::resample::shift;

/// Naming rule for the per-input output files.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct OutputNaming {
    /// Prepended to the file stem.
    pub prefix: String,
    /// Appended to the file stem with an underscore.
    pub suffix: String,
}

impl Default for OutputNaming {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: "aligned".to_string(),
        }
    }
}

impl OutputNaming {
    /// `dir/name.ext` becomes `dir/{prefix}name_{suffix}.ext`.
    pub fn derive(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("frame");
        let ext = input.extension().and_then(|e| e.to_str()).unwrap_or("tiff");
        let name = if self.suffix.is_empty() {
            format!("{}{stem}.{ext}", self.prefix)
        } else {
            format!("{}{stem}_{}.{ext}", self.prefix, self.suffix)
        };
        input.with_file_name(name)
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct AlignConfig {
    /// Template region in the first frame; empty selects a centered default.
    pub roi: Rect,
    pub template: TemplateConfig,
    pub naming: OutputNaming,
}

/// Realign a file sequence against the first frame's template, writing one
/// output file per input. Failures on the first frame are fatal; later
/// frames are skipped with a warning, and a failed write is itself only a
/// warning so the batch keeps going.
pub fn align_files<L: FrameLoader, W: FrameWriter>(
    loader: &L,
    writer: &W,
    paths: &[impl AsRef<Path>],
    config: &AlignConfig,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<PathBuf>> {
    if paths.is_empty() {
        return Err(StackError::EmptySequence);
    }

    reporter.begin_stage(ProcessStage::Aligning, Some(paths.len()));

    let first_path = paths[0].as_ref();
    let first = single_frame(loader, first_path)?;
    let mut matcher =
        TemplateMatcher::set_template(config.template.clone(), &first, config.roi)?;

    let mut written = Vec::with_capacity(paths.len());
    let out = config.naming.derive(first_path);
    write_warned(writer, &out, &first, &mut written);
    reporter.advance(1);

    for (done, path) in paths[1..].iter().enumerate() {
        if reporter.is_cancelled() {
            warn!("alignment cancelled after {} files", written.len());
            break;
        }
        let path = path.as_ref();
        match align_one(loader, path, &mut matcher) {
            Ok(aligned) => {
                let out = config.naming.derive(path);
                write_warned(writer, &out, &aligned, &mut written);
            }
            Err(e) => warn!("skipping {}: {e}", path.display()),
        }
        reporter.advance(done + 2);
    }

    reporter.finish_stage();
    Ok(written)
}

fn align_one<L: FrameLoader>(
    loader: &L,
    path: &Path,
    matcher: &mut TemplateMatcher,
) -> Result<PixelBuffer> {
    let frame = single_frame(loader, path)?;
    let m = matcher.compute_match(&frame)?;
    let aligned = shift(&frame, m.dx, m.dy);
    matcher.shift_aoi(m.dx, m.dy);
    info!(
        "{}: template match score {:.3}, shift ({:+.2},{:+.2})",
        path.display(),
        m.score,
        -m.dx,
        -m.dy
    );
    Ok(aligned)
}

fn single_frame<L: FrameLoader>(loader: &L, path: &Path) -> Result<PixelBuffer> {
    loader
        .load(path)?
        .into_iter()
        .next()
        .ok_or_else(|| StackError::Frame {
            path: path.to_path_buf(),
            reason: "no decodable frame".into(),
        })
}

fn write_warned<W: FrameWriter>(
    writer: &W,
    path: &Path,
    buffer: &PixelBuffer,
    written: &mut Vec<PathBuf>,
) {
    match writer.write(path, buffer) {
        Ok(()) => written.push(path.to_path_buf()),
        Err(e) => warn!("failed to write {}: {e}", path.display()),
    }
}
