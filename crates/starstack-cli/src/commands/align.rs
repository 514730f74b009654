use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use starstack_core::buffer::Rect;
use starstack_core::io::{ImageFileLoader, ImageFileWriter};
use starstack_core::registration::TemplateConfig;
use starstack_core::stack::aligner::{align_files, AlignConfig, OutputNaming};

use crate::progress::BarReporter;

#[derive(Args)]
pub struct AlignArgs {
    /// Input frames, in sequence order
    pub files: Vec<PathBuf>,

    /// Template region as x,y,width,height (omit for a centered default)
    #[arg(long, value_name = "X,Y,W,H")]
    pub roi: Option<String>,

    /// Search range around the tracked template position
    #[arg(long, default_value = "10")]
    pub match_range: usize,

    /// Scan the whole frame instead of a window
    #[arg(long)]
    pub match_full: bool,

    /// Supersampling factor for sub-pixel precision
    #[arg(long, default_value = "1")]
    pub scale: usize,

    /// Output file name prefix
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Output file name suffix
    #[arg(long, default_value = "aligned")]
    pub suffix: String,
}

pub fn run(args: &AlignArgs) -> Result<()> {
    if args.files.is_empty() {
        bail!("no input files");
    }
    if args.scale == 0 {
        bail!("--scale must be at least 1");
    }

    let roi = match &args.roi {
        Some(spec) => {
            let parts: Vec<&str> = spec.split(',').collect();
            if parts.len() != 4 {
                bail!("expected --roi as x,y,width,height, got `{spec}`");
            }
            Rect::new(
                parts[0].trim().parse()?,
                parts[1].trim().parse()?,
                parts[2].trim().parse()?,
                parts[3].trim().parse()?,
            )
        }
        None => Rect::empty(),
    };

    let config = AlignConfig {
        roi,
        template: TemplateConfig {
            match_range: args.match_range,
            match_full: args.match_full,
            scale_factor: args.scale,
            ..Default::default()
        },
        naming: OutputNaming {
            prefix: args.prefix.clone(),
            suffix: args.suffix.clone(),
        },
    };

    let reporter = BarReporter::new();
    let written = align_files(
        &ImageFileLoader,
        &ImageFileWriter,
        &args.files,
        &config,
        &reporter,
    )?;

    println!("Wrote {} of {} files", written.len(), args.files.len());
    Ok(())
}
