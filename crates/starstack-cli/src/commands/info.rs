use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use starstack_core::io::{FrameLoader, ImageFileLoader};

#[derive(Args)]
pub struct InfoArgs {
    /// Input files
    pub files: Vec<PathBuf>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    for path in &args.files {
        match ImageFileLoader.load(path) {
            Ok(frames) => {
                for frame in &frames {
                    let (min, max) = frame.min_max();
                    println!(
                        "{}: {}x{}x{}, range [{:.4}, {:.4}]",
                        path.display(),
                        frame.width(),
                        frame.height(),
                        frame.depth(),
                        min,
                        max
                    );
                }
            }
            Err(e) => println!("{}: {e}", path.display()),
        }
    }
    Ok(())
}
