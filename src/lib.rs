#![deny(missing_docs)]
//! # What is softmax-bench ?
//!
//! A tiny pair of tools to compare softmax implementations across runtimes:
//!
//! - `generate_data` writes a vector of uniform `f32` values in `[-10.0, 10.0)` to a
//!   flat little-endian file (no header, `4 * n` bytes).
//! - `softmax_bench` reads such a file, places it on a device, runs the stabilized
//!   softmax once to warm up and once timed, and reports the timing.
//!
//! Since the file format has no header, any other program (python, C++, ...) can
//! read and write the same vectors and compare against this harness.
//!
//! ```bash
//! cargo run --release --bin generate_data -- --size 65536
//! cargo run --release --bin softmax_bench -- --input data/vector_65536.bin --kernel chunked
//!
//! # CUDA
//! cargo run --release --features cuda --bin softmax_bench -- --input data/vector_65536.bin --device cuda
//! ```
//!
//! # The architecture of this library:
//!
//! - [vector_file] is the on disk interchange format.
//! - [generator] creates the random vectors.
//! - [cpu] contains the tensor struct and the various softmax kernels.
//! - `gpu` (feature `cuda`) contains the same for CUDA devices.
//! - [traits] Contains the [traits::Device] glue that allows [harness] to be written
//!   independently of where the computation actually runs.
//! - [harness] runs the load, transfer, warm-up, timed run protocol.
//!
//! Every kernel subtracts the maximum before exponentiating, so inputs as large as
//! `1e30` still produce finite probabilities.

use std::path::PathBuf;
use thiserror::Error;

/// The various CPU implementations
pub mod cpu;

/// The CUDA implementations
#[cfg(feature = "cuda")]
pub mod gpu;

/// Random vector generation
pub mod generator;

/// The benchmark protocol
pub mod harness;

/// Tracing subscriber setup for the binaries
pub mod logging;

/// The traits for generic implementations
pub mod traits;

/// Reading and writing vector files
pub mod vector_file;

/// Potential errors when using the library
#[derive(Debug, Error)]
pub enum BenchError {
    /// A user supplied argument is out of its valid domain.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// The argument name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The input vector file does not exist.
    #[error("vector file not found: {path}")]
    NotFound {
        /// The path that was looked up
        path: PathBuf,
    },

    /// The file cannot be split into `f32` values.
    #[error("malformed vector file {path}: expected a non-zero multiple of 4 bytes, got {byte_length}")]
    Format {
        /// The offending file
        path: PathBuf,
        /// Its actual length
        byte_length: u64,
    },

    /// Underlying read or write failure.
    #[error("i/o error on {path}")]
    Io {
        /// The file being accessed
        path: PathBuf,
        /// The original error
        #[source]
        source: std::io::Error,
    },

    /// The compute device could not run or synchronize the kernel.
    #[error("compute error on {device}: {message}")]
    Compute {
        /// The device name
        device: String,
        /// What went wrong
        message: String,
    },

    /// The arguments to the tensor creation are invalid, the shape doesn't match
    /// the size of the buffer.
    #[error("buffer of size {buffer_size} does not match shape {shape:?}")]
    InvalidBuffer {
        /// The size of the buffer sent
        buffer_size: usize,
        /// The shape of the tensor to create
        shape: Vec<usize>,
    },

    /// The tensor given has insufficient rank (rank 2 means a tensor that has a shape of length 2)
    #[error("tensor rank is too small, expected at least {minimum_rank}")]
    InsufficientRank {
        /// The minimum rank that we expect
        minimum_rank: usize,
    },
}

impl BenchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
