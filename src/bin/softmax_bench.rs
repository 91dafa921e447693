use anyhow::Result;
use clap::Parser;
use softmax_bench::cpu::f32::Kernel;
use softmax_bench::harness::{self, DeviceKind, HarnessConfig, OutputFormat};
use softmax_bench::logging::init_logging;
use std::path::PathBuf;

/// Benchmark the stabilized softmax on a vector file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the binary vector file
    #[arg(long)]
    input: PathBuf,

    /// Where to run the kernel
    #[arg(long, value_enum, default_value_t = DeviceKind::Cpu)]
    device: DeviceKind,

    /// Cpu kernel
    #[arg(long, value_enum, default_value_t = Kernel::Naive)]
    kernel: Kernel,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

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

    let config = HarnessConfig {
        input: args.input,
        device: args.device,
        kernel: args.kernel,
        format: args.format,
    };
    let report = harness::run_config(&config)?;
    println!("{}", report.render(config.format)?);
    Ok(())
}
