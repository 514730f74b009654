use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use starstack_core::buffer::Rect;
use starstack_core::io::{FrameWriter, ImageFileLoader, ImageFileWriter};
use starstack_core::progress::{ProcessStage, ProgressReporter};
use starstack_core::registration::{StarMatchConfig, TemplateConfig};
use starstack_core::stack::{stack_files, AlignMode, StackConfig};

use crate::progress::BarReporter;
use crate::summary;

#[derive(Clone, ValueEnum)]
pub enum AlignModeArg {
    None,
    Template,
    Stars,
}

#[derive(Args)]
pub struct StackArgs {
    /// Input frames, in sequence order
    pub files: Vec<PathBuf>,

    /// Read the full stacking configuration from a TOML file
    /// (overrides the individual flags below)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Subtract the estimated sky background from each frame
    #[arg(long)]
    pub sky: bool,

    /// Alignment mode
    #[arg(long, value_enum, default_value = "none")]
    pub align: AlignModeArg,

    /// Template region as x,y,width,height (template mode; omit for a
    /// centered default)
    #[arg(long, value_name = "X,Y,W,H")]
    pub roi: Option<String>,

    /// Search range around the tracked template position
    #[arg(long, default_value = "10")]
    pub match_range: usize,

    /// Scan the whole frame instead of a window
    #[arg(long)]
    pub match_full: bool,

    /// Coarse scan stride (adds a stride-1 refinement pass when > 1)
    #[arg(long, default_value = "1")]
    pub first_pass_delta: usize,

    /// Correlation subsampling stride
    #[arg(long, default_value = "1")]
    pub subsample: usize,

    /// Supersampling factor for sub-pixel template precision
    #[arg(long, default_value = "1")]
    pub scale: usize,

    /// Seed star position as x,y (star mode; repeatable)
    #[arg(long = "seed", value_name = "X,Y")]
    pub seeds: Vec<String>,

    /// Peak search window size (star mode)
    #[arg(long, default_value = "20")]
    pub searchbox: usize,

    /// Centroid refinement window size (star mode)
    #[arg(long, default_value = "10")]
    pub starbox: usize,

    /// Centroid iteration cap (star mode)
    #[arg(long, default_value = "10")]
    pub maxiter: usize,

    /// Reject frames whose shift exceeds this on either axis (star mode)
    #[arg(long, default_value = "50")]
    pub maxmove: f64,

    /// Estimate and apply rotation before the shift (star mode)
    #[arg(long)]
    pub rotate: bool,

    /// Divide the sum by the number of stacked frames
    #[arg(long)]
    pub average: bool,

    /// Output file path
    #[arg(short, long, default_value = "stacked.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &StackArgs) -> Result<()> {
    if args.files.is_empty() {
        bail!("no input files");
    }

    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => build_config(args)?,
    };

    summary::print_stack_summary(&config, args.files.len());

    let reporter = BarReporter::new();
    let result = stack_files(&ImageFileLoader, &args.files, config, &reporter)?;

    println!(
        "Stacked {} of {} frames",
        result.frames_stacked,
        args.files.len()
    );
    for line in &result.history {
        tracing::debug!("{line}");
    }

    let output = if args.average {
        result.normalized()
    } else {
        result.buffer
    };
    reporter.begin_stage(ProcessStage::Writing, None);
    ImageFileWriter.write(&args.output, &output)?;
    reporter.finish_stage();
    println!("Saved to {}", args.output.display());
    Ok(())
}

fn build_config(args: &StackArgs) -> Result<StackConfig> {
    if args.scale == 0 || args.subsample == 0 || args.first_pass_delta == 0 {
        bail!("--scale, --subsample and --first-pass-delta must be at least 1");
    }
    let align = match args.align {
        AlignModeArg::None => AlignMode::None,
        AlignModeArg::Template => AlignMode::Template {
            roi: match &args.roi {
                Some(spec) => parse_roi(spec)?,
                None => Rect::empty(),
            },
            config: TemplateConfig {
                match_range: args.match_range,
                match_full: args.match_full,
                first_pass_delta: args.first_pass_delta,
                subsample: args.subsample,
                scale_factor: args.scale,
            },
        },
        AlignModeArg::Stars => AlignMode::Stars {
            seeds: args
                .seeds
                .iter()
                .map(|s| parse_point(s))
                .collect::<Result<_>>()?,
            config: StarMatchConfig {
                searchbox: args.searchbox,
                starbox: args.starbox,
                maxiter: args.maxiter,
                maxmove: args.maxmove,
                rotate: args.rotate,
                ..Default::default()
            },
        },
    };
    Ok(StackConfig {
        subtract_sky: args.sky,
        align,
    })
}

fn parse_roi(spec: &str) -> Result<Rect> {
    let parts: Vec<&str> = spec.split(',').collect();
    if parts.len() != 4 {
        bail!("expected --roi as x,y,width,height, got `{spec}`");
    }
    Ok(Rect::new(
        parts[0].trim().parse()?,
        parts[1].trim().parse()?,
        parts[2].trim().parse()?,
        parts[3].trim().parse()?,
    ))
}

pub(super) fn parse_point(spec: &str) -> Result<(f64, f64)> {
    let (x, y) = spec
        .split_once(',')
        .with_context(|| format!("expected a point as x,y, got `{spec}`"))?;
    Ok((x.trim().parse()?, y.trim().parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> StackArgs {
        StackArgs {
            files: Vec::new(),
            config: None,
            sky: false,
            align: AlignModeArg::Template,
            roi: None,
            match_range: 10,
            match_full: false,
            first_pass_delta: 1,
            subsample: 1,
            scale: 1,
            seeds: Vec::new(),
            searchbox: 20,
            starbox: 10,
            maxiter: 10,
            maxmove: 50.0,
            rotate: false,
            average: false,
            output: PathBuf::from("stacked.tiff"),
        }
    }

    #[test]
    fn zero_strides_are_usage_errors_not_panics() {
        for field in ["scale", "subsample", "first_pass_delta"] {
            let mut args = base_args();
            match field {
                "scale" => args.scale = 0,
                "subsample" => args.subsample = 0,
                _ => args.first_pass_delta = 0,
            }
            let err = build_config(&args).unwrap_err();
            assert!(err.to_string().contains("at least 1"), "{field}: {err}");
        }
    }

    #[test]
    fn valid_args_build_a_template_config() {
        assert!(build_config(&base_args()).is_ok());
    }
}
