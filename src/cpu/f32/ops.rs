use crate::cpu::f32::tensor::Tensor;
use crate::BenchError;
use rayon::prelude::*;
use std::fmt;

/// Number of lanes processed together by [softmax_chunked] and
/// [softmax_parallel_chunked].
pub const LANES: usize = 8;

/// The softmax implementations available on cpu.
///
/// Every variant subtracts the maximum before exponentiating, they only
/// differ in how the reductions and the exponential are computed. The
/// exponentials are stored as `f32` but always summed in `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Kernel {
    /// Straightforward iterator version.
    #[default]
    Naive,
    /// Explicit loops, normalizes with a reciprocal multiply.
    Handcoded,
    /// `LANES` wide chunks with a polynomial exp.
    Chunked,
    /// Multi-threaded with rayon.
    Parallel,
    /// Multi-threaded over `LANES` wide chunks with a polynomial exp.
    ParallelChunked,
}

impl Kernel {
    /// All kernels, mostly useful for tests and benches.
    pub const ALL: [Kernel; 5] = [
        Kernel::Naive,
        Kernel::Handcoded,
        Kernel::Chunked,
        Kernel::Parallel,
        Kernel::ParallelChunked,
    ];

    /// Runs the kernel on `x` in place.
    pub fn apply(self, x: &mut [f32]) {
        match self {
            Kernel::Naive => softmax_naive(x),
            Kernel::Handcoded => softmax_handcoded(x),
            Kernel::Chunked => softmax_chunked(x),
            Kernel::Parallel => softmax_parallel(x),
            Kernel::ParallelChunked => softmax_parallel_chunked(x),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kernel::Naive => "naive",
            Kernel::Handcoded => "handcoded",
            Kernel::Chunked => "chunked",
            Kernel::Parallel => "parallel",
            Kernel::ParallelChunked => "parallel-chunked",
        };
        f.write_str(name)
    }
}

/// Softmax on the last dimension for tensor `x`, a rank 1 tensor is reduced as
/// a whole.
pub fn softmax(x: &mut Tensor, kernel: Kernel) -> Result<(), BenchError> {
    let dim = x.shape().len();
    if dim < 1 {
        return Err(BenchError::InsufficientRank { minimum_rank: 1 });
    }
    let n = x.shape()[dim - 1];
    if n == 0 {
        return Ok(());
    }
    x.data_mut()
        .chunks_mut(n)
        .for_each(|chunk| kernel.apply(chunk));
    Ok(())
}

/// x = exp(x - max(x)) / sum(exp(x - max(x)))
pub fn softmax_naive(x: &mut [f32]) {
    if x.is_empty() {
        return;
    }
    let max = x.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f64;
    for v in x.iter_mut() {
        *v = (*v - max).exp();
        sum += *v as f64;
    }
    let sum = sum as f32;
    x.iter_mut().for_each(|v| *v /= sum);
}

/// Same as [softmax_naive] with explicit loops and a single division.
pub fn softmax_handcoded(x: &mut [f32]) {
    if x.is_empty() {
        return;
    }
    let mut max = x[0];
    for &v in &x[1..] {
        if v > max {
            max = v;
        }
    }

    let mut sum = 0.0f64;
    for v in x.iter_mut() {
        let e = (*v - max).exp();
        *v = e;
        sum += e as f64;
    }

    if sum > 0.0 {
        let recip = (1.0 / sum) as f32;
        for v in x.iter_mut() {
            *v *= recip;
        }
    }
}

/// Works on `LANES` values at a time so the compiler can vectorize the loops,
/// using [exp_approx] on full chunks and the exact exponential on the tail.
pub fn softmax_chunked(x: &mut [f32]) {
    if x.is_empty() {
        return;
    }
    let max = x.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let mut sum = 0.0f64;
    let mut chunks = x.chunks_exact_mut(LANES);
    for chunk in &mut chunks {
        let mut lanes = [0.0f64; LANES];
        for (lane, v) in lanes.iter_mut().zip(chunk.iter_mut()) {
            *v = exp_approx(*v - max);
            *lane = *v as f64;
        }
        sum += lanes.iter().sum::<f64>();
    }
    for v in chunks.into_remainder() {
        *v = (*v - max).exp();
        sum += *v as f64;
    }

    if sum > 0.0 {
        let recip = (1.0 / sum) as f32;
        x.chunks_mut(LANES)
            .for_each(|chunk| chunk.iter_mut().for_each(|v| *v *= recip));
    }
}

/// Multi-threaded softmax, the three reductions are each split across the
/// rayon thread pool. Summation order is not deterministic.
pub fn softmax_parallel(x: &mut [f32]) {
    if x.is_empty() {
        return;
    }
    let max = x
        .par_iter()
        .copied()
        .reduce(|| f32::NEG_INFINITY, f32::max);
    let sum: f64 = x
        .par_iter_mut()
        .map(|v| {
            *v = (*v - max).exp();
            *v as f64
        })
        .sum();
    if sum > 0.0 {
        let recip = (1.0 / sum) as f32;
        x.par_iter_mut().for_each(|v| *v *= recip);
    }
}

/// [softmax_chunked] spread over the rayon thread pool, one task per chunk.
/// Only the last chunk can be shorter than `LANES`, it gets the exact exponential.
pub fn softmax_parallel_chunked(x: &mut [f32]) {
    if x.is_empty() {
        return;
    }
    let max = x
        .par_iter()
        .copied()
        .reduce(|| f32::NEG_INFINITY, f32::max);
    let sum: f64 = x
        .par_chunks_mut(LANES)
        .map(|chunk| {
            if chunk.len() == LANES {
                chunk.iter_mut().for_each(|v| *v = exp_approx(*v - max));
            } else {
                chunk.iter_mut().for_each(|v| *v = (*v - max).exp());
            }
            chunk.iter().map(|&v| v as f64).sum::<f64>()
        })
        .sum();
    if sum > 0.0 {
        let recip = (1.0 / sum) as f32;
        x.par_chunks_mut(LANES)
            .for_each(|chunk| chunk.iter_mut().for_each(|v| *v *= recip));
    }
}

// Range where 2^n stays a normal f32 once the exponent is rounded.
const EXP_HI: f32 = 88.3;
const EXP_LO: f32 = -87.3;

/// Cephes style `exp` for f32: splits `x = n * ln(2) + r` with `|r| <= ln(2) / 2`,
/// evaluates a degree 5 polynomial for `exp(r)` and scales by `2^n` through the
/// exponent bits. Inputs are clamped to `[-87.3, 88.3]`.
#[inline]
pub fn exp_approx(x: f32) -> f32 {
    const P0: f32 = 1.987_569_1e-4;
    const P1: f32 = 1.398_199_9e-3;
    const P2: f32 = 8.333_452e-3;
    const P3: f32 = 4.166_579_6e-2;
    const P4: f32 = 1.666_666_5e-1;
    const P5: f32 = 5.000_000_1e-1;
    // ln(2) split in two so that `fx * LN2_HI` is exact.
    const LN2_HI: f32 = 0.693_359_375;
    const LN2_LO: f32 = -2.121_944_4e-4;

    let x = x.clamp(EXP_LO, EXP_HI);
    let fx = (x * std::f32::consts::LOG2_E).round();
    let r = x - fx * LN2_HI - fx * LN2_LO;
    let z = r * r;

    let mut y = P0;
    y = y * r + P1;
    y = y * r + P2;
    y = y * r + P3;
    y = y * r + P4;
    y = y * r + P5;
    y = y * z + r + 1.0;

    let pow2n = f32::from_bits(((fx as i32 + 127) as u32) << 23);
    y * pow2n
}
