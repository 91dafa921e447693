//! The benchmark protocol, strictly sequential:
//!
//! 1. load the vector file
//! 2. place it on the device
//! 3. run the kernel once and synchronize (warm-up, absorbs lazy compilation, allocation...)
//! 4. run the kernel once more between two timestamps, synchronizing before the second one
//! 5. report
//!
//! Any error aborts the run, there is no retry and no partial report.

use crate::cpu::f32::{Cpu, Kernel};
use crate::traits::Device;
use crate::vector_file;
use crate::BenchError;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Number of output values kept in the report.
pub const HEAD_LEN: usize = 5;

/// Where the kernel is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DeviceKind {
    /// In process, see [Cpu]
    #[default]
    Cpu,
    /// Nvidia GPU, needs the `cuda` feature.
    Cuda,
}

/// How the report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human readable lines
    #[default]
    Text,
    /// A single JSON object
    Json,
}

/// Everything needed for one benchmark run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// The vector file
    pub input: PathBuf,
    /// Where to run
    pub device: DeviceKind,
    /// Which cpu kernel to use, ignored on other devices.
    pub kernel: Kernel,
    /// Report format
    pub format: OutputFormat,
}

/// Output of the timed run.
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    /// The softmax of the input, same length
    pub output: Vec<f32>,
    /// Duration of the warm-up run
    pub warmup: Duration,
    /// Duration of the timed run
    pub elapsed: Duration,
}

impl BenchmarkResult {
    /// Timed run duration in fractional milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1e3
    }
}

/// What gets shown to the operator at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    /// The vector file
    pub input: PathBuf,
    /// Name of the device the kernel ran on
    pub device: String,
    /// Number of values in the vector
    pub len: usize,
    /// The warm-up run completed (always true in a report)
    pub warmup_completed: bool,
    /// Warm-up duration, informative only
    pub warmup_ms: f64,
    /// Timed run duration
    pub elapsed_ms: f64,
    /// The first [HEAD_LEN] output values
    pub head: Vec<f32>,
}

impl BenchmarkReport {
    /// Builds the report of `result` for the vector read from `input`.
    pub fn new(input: &Path, device: String, result: &BenchmarkResult) -> Self {
        Self {
            input: input.to_path_buf(),
            device,
            len: result.output.len(),
            warmup_completed: true,
            warmup_ms: result.warmup.as_secs_f64() * 1e3,
            elapsed_ms: result.elapsed_ms(),
            head: result.output.iter().take(HEAD_LEN).copied().collect(),
        }
    }

    /// Renders the report in `format`.
    pub fn render(&self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Text => Ok(self.to_string()),
            OutputFormat::Json => serde_json::to_string(self),
        }
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Loaded vector of size {} from {}",
            self.len,
            self.input.display()
        )?;
        writeln!(f, "Warm-up run completed")?;
        writeln!(
            f,
            "{} softmax execution time: {:.4} ms",
            self.device, self.elapsed_ms
        )?;
        write!(f, "First {} results: {:?}", self.head.len(), self.head)
    }
}

/// Loads the vector file, see [vector_file::read_vector].
pub fn load(input: &Path) -> Result<Vec<f32>, BenchError> {
    let data = vector_file::read_vector(input)?;
    info!(len = data.len(), input = %input.display(), "Loaded vector");
    Ok(data)
}

fn run_once<D: Device>(device: &D, x: &D::Buffer) -> Result<(D::Buffer, Duration), BenchError> {
    let start = Instant::now();
    let out = device.softmax(x)?;
    device.synchronize()?;
    Ok((out, start.elapsed()))
}

/// Runs the transfer, warm-up and timed steps on already loaded `data`.
pub fn benchmark<D: Device>(device: &D, data: &[f32]) -> Result<BenchmarkResult, BenchError> {
    let x = device.place(data)?;
    device.synchronize()?;
    debug!(device = %device.name(), "Transferred vector");

    info!("Performing warm-up run...");
    let (_, warmup) = run_once(device, &x)?;
    debug!(warmup_ms = warmup.as_secs_f64() * 1e3, "Warm-up done");

    info!("Performing timed run...");
    let (out, elapsed) = run_once(device, &x)?;
    let output = device.to_host(&out)?;

    Ok(BenchmarkResult {
        output,
        warmup,
        elapsed,
    })
}

/// The whole protocol on `device` for the vector file at `input`.
pub fn run<D: Device>(device: &D, input: &Path) -> Result<BenchmarkReport, BenchError> {
    let data = load(input)?;
    let result = benchmark(device, &data)?;
    let report = BenchmarkReport::new(input, device.name(), &result);
    info!(elapsed_ms = report.elapsed_ms, "Timed run done");
    Ok(report)
}

/// Picks the device from `config` and runs the protocol.
pub fn run_config(config: &HarnessConfig) -> Result<BenchmarkReport, BenchError> {
    match config.device {
        DeviceKind::Cpu => run(&Cpu::new(config.kernel), &config.input),
        #[cfg(feature = "cuda")]
        DeviceKind::Cuda => run(&crate::gpu::f32::Cuda::new(0)?, &config.input),
        #[cfg(not(feature = "cuda"))]
        DeviceKind::Cuda => Err(BenchError::Compute {
            device: "cuda".to_string(),
            message: "this binary was built without the `cuda` feature".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{self, GeneratorConfig, VectorSize};
    use crate::tests::assert_close;
    use std::cell::Cell;

    fn config(input: PathBuf, kernel: Kernel) -> HarnessConfig {
        HarnessConfig {
            input,
            device: DeviceKind::Cpu,
            kernel,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data").join("vector_1000.bin");
        generator::generate(&GeneratorConfig {
            size: VectorSize::new(1000).unwrap(),
            output: input.clone(),
            seed: None,
        })
        .unwrap();

        for kernel in Kernel::ALL {
            let data = load(&input).unwrap();
            let result = benchmark(&Cpu::new(kernel), &data).unwrap();
            assert_eq!(result.output.len(), 1000);
            let sum: f64 = result.output.iter().map(|&x| x as f64).sum();
            assert!((sum - 1.0).abs() <= 1e-5, "{kernel}: sum {sum}");
            assert!(result.output.iter().all(|&x| x > 0.0 && x < 1.0));
            let ms = result.elapsed_ms();
            assert!(ms.is_finite() && ms >= 0.0);

            let report = run_config(&config(input.clone(), kernel)).unwrap();
            assert_eq!(report.len, 1000);
            assert_eq!(report.head.len(), HEAD_LEN);
            assert!(report.warmup_completed);
            assert!(report.elapsed_ms.is_finite() && report.elapsed_ms >= 0.0);
        }
    }

    #[test]
    fn short_vector_head() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("v.bin");
        vector_file::write_vector(&input, &[3.0, 1.0]).unwrap();
        let report = run(&Cpu::default(), &input).unwrap();
        assert_eq!(report.len, 2);
        assert_eq!(report.head.len(), 2);

        vector_file::write_vector(&input, &[42.0]).unwrap();
        let report = run(&Cpu::default(), &input).unwrap();
        assert_eq!(report.head, [1.0]);
    }

    #[test]
    fn load_errors_abort_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.bin");
        assert!(matches!(
            run(&Cpu::default(), &missing),
            Err(BenchError::NotFound { .. })
        ));

        let odd = dir.path().join("odd.bin");
        std::fs::write(&odd, [1u8, 2, 3, 4, 5, 6]).unwrap();
        assert!(matches!(
            run(&Cpu::default(), &odd),
            Err(BenchError::Format { byte_length: 6, .. })
        ));
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn cuda_without_feature() {
        let mut config = config(PathBuf::from("unused.bin"), Kernel::Naive);
        config.device = DeviceKind::Cuda;
        assert!(matches!(
            run_config(&config),
            Err(BenchError::Compute { .. })
        ));
    }

    /// Records the order of the calls made by the harness.
    #[derive(Default)]
    struct Recorder {
        calls: Cell<Vec<&'static str>>,
        fail_softmax: bool,
    }

    impl Recorder {
        fn push(&self, call: &'static str) {
            let mut calls = self.calls.take();
            calls.push(call);
            self.calls.set(calls);
        }
    }

    impl Device for Recorder {
        type Buffer = Vec<f32>;

        fn name(&self) -> String {
            "recorder".to_string()
        }

        fn place(&self, data: &[f32]) -> Result<Vec<f32>, BenchError> {
            self.push("place");
            Ok(data.to_vec())
        }

        fn softmax(&self, x: &Vec<f32>) -> Result<Vec<f32>, BenchError> {
            self.push("softmax");
            if self.fail_softmax {
                return Err(BenchError::Compute {
                    device: self.name(),
                    message: "out of memory".to_string(),
                });
            }
            let mut out = x.clone();
            Kernel::Naive.apply(&mut out);
            Ok(out)
        }

        fn synchronize(&self) -> Result<(), BenchError> {
            self.push("synchronize");
            Ok(())
        }

        fn to_host(&self, x: &Vec<f32>) -> Result<Vec<f32>, BenchError> {
            self.push("to_host");
            Ok(x.clone())
        }
    }

    #[test]
    fn protocol_order() {
        let device = Recorder::default();
        let result = benchmark(&device, &[1.0, 2.0]).unwrap();
        assert_eq!(
            device.calls.take(),
            [
                "place",
                "synchronize",
                "softmax",
                "synchronize",
                "softmax",
                "synchronize",
                "to_host"
            ]
        );

        let mut reference = vec![1.0, 2.0];
        Kernel::Naive.apply(&mut reference);
        assert_close(&result.output, &reference, 0.0, 0.0);
    }

    #[test]
    fn compute_errors_are_not_retried() {
        let device = Recorder {
            fail_softmax: true,
            ..Default::default()
        };
        assert!(matches!(
            benchmark(&device, &[1.0]),
            Err(BenchError::Compute { .. })
        ));
        assert_eq!(device.calls.take(), ["place", "synchronize", "softmax"]);
    }

    #[test]
    fn text_report_order() {
        let report = BenchmarkReport {
            input: PathBuf::from("data/vector_3.bin"),
            device: "cpu/naive".to_string(),
            len: 3,
            warmup_completed: true,
            warmup_ms: 1.0,
            elapsed_ms: 0.25,
            head: vec![0.25, 0.5, 0.25],
        };
        let text = report.render(OutputFormat::Text).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "Loaded vector of size 3 from data/vector_3.bin",
                "Warm-up run completed",
                "cpu/naive softmax execution time: 0.2500 ms",
                "First 3 results: [0.25, 0.5, 0.25]",
            ]
        );

        let json: serde_json::Value =
            serde_json::from_str(&report.render(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["len"], 3);
        assert_eq!(json["elapsed_ms"], 0.25);
        assert_eq!(json["warmup_completed"], true);
        assert_eq!(json["head"][1], 0.5);
    }
}
