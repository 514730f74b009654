use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use starstack_core::deconv::{deconvolve, DeconvConfig, DeconvMethod, PsfModel, Relaxation};
use starstack_core::io::{FrameLoader, FrameWriter, ImageFileLoader, ImageFileWriter};
use starstack_core::progress::{ProcessStage, ProgressReporter};

use crate::progress::BarReporter;

#[derive(Clone, ValueEnum)]
pub enum MethodArg {
    VanCittert,
    LucyRichardson,
}

#[derive(Args)]
pub struct DeconvArgs {
    /// Input image
    pub file: PathBuf,

    /// Restoration algorithm
    #[arg(long, value_enum, default_value = "van-cittert")]
    pub method: MethodArg,

    /// Iteration count
    #[arg(long, default_value = "10")]
    pub iterations: usize,

    /// PSF model name (gaussian, kolmogorov, airy)
    #[arg(long, default_value = "gaussian")]
    pub psf: String,

    /// PSF parameters (model-dependent, e.g. sigma for gaussian)
    #[arg(long = "psf-param", value_name = "VALUE")]
    pub psf_params: Vec<f64>,

    /// Constant relaxation factor in (0, 1]
    #[arg(long, default_value = "1.0", conflicts_with = "sine_power")]
    pub relax: f64,

    /// Use intensity-dependent sine relaxation with this exponent
    #[arg(long)]
    pub sine_power: Option<f64>,

    /// Do not clamp the estimate to the input range each iteration
    #[arg(long)]
    pub no_clamp: bool,

    /// PSF extent / padding per axis in pixels
    #[arg(long, default_value = "32")]
    pub kernel_size: usize,

    /// Output file path
    #[arg(short, long, default_value = "deconvolved.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &DeconvArgs) -> Result<()> {
    if args.iterations == 0 {
        bail!("iteration count must be at least 1");
    }

    let config = DeconvConfig {
        method: match args.method {
            MethodArg::VanCittert => DeconvMethod::VanCittert,
            MethodArg::LucyRichardson => DeconvMethod::LucyRichardson,
        },
        iterations: args.iterations,
        relaxation: match args.sine_power {
            Some(power) => Relaxation::Sine { power },
            None => Relaxation::Constant(args.relax),
        },
        clamp_to_input: !args.no_clamp,
        kernel_size: args.kernel_size,
        psf: PsfModel::resolve(&args.psf, &args.psf_params)?,
    };

    let frame = ImageFileLoader
        .load(&args.file)?
        .into_iter()
        .next()
        .with_context(|| format!("no decodable frame in {}", args.file.display()))?;

    let reporter = BarReporter::new();
    let restored = deconvolve(&frame, &config, &reporter)?;

    reporter.begin_stage(ProcessStage::Writing, None);
    ImageFileWriter.write(&args.output, &restored)?;
    reporter.finish_stage();
    println!("Saved to {}", args.output.display());
    Ok(())
}
