mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "starstack", about = "Astrophotography registration and stacking tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show image file metadata
    Info(commands::info::InfoArgs),
    /// Register and sum a frame sequence
    Stack(commands::stack::StackArgs),
    /// Realign frames against the first one, writing one file per input
    Align(commands::align::AlignArgs),
    /// Iterative deconvolution of a single image
    Deconv(commands::deconv::DeconvArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Stack(args) => commands::stack::run(args),
        Commands::Align(args) => commands::align::run(args),
        Commands::Deconv(args) => commands::deconv::run(args),
    }
}
