use anyhow::Result;
use clap::Parser;
use softmax_bench::generator::{self, GeneratorConfig, VectorSize};
use softmax_bench::logging::init_logging;
use std::path::PathBuf;

/// Generate a binary vector file of uniform f32 values in [-10, 10).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of values to generate
    #[arg(long, allow_negative_numbers = true)]
    size: i64,

    /// Destination file, defaults to `data/vector_{size}.bin`
    #[arg(long)]
    output: Option<PathBuf>,

    /// Seed for reproducible vectors
    #[arg(long)]
    seed: Option<u64>,

    /// Log level when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_json);

    let size = VectorSize::try_from(args.size)?;
    let mut config = GeneratorConfig::new(size);
    if let Some(output) = args.output {
        config.output = output;
    }
    config.seed = args.seed;

    generator::generate(&config)?;
    Ok(())
}
