use crate::vector_file;
use crate::BenchError;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Inclusive lower bound of the generated values.
pub const LOW: f32 = -10.0;
/// Exclusive upper bound of the generated values.
pub const HIGH: f32 = 10.0;

/// Number of elements of a generated vector, always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VectorSize(NonZeroUsize);

impl VectorSize {
    /// Fails with [BenchError::InvalidArgument] when `size` is zero or when its
    /// byte length does not fit in a `usize`.
    pub fn new(size: usize) -> Result<Self, BenchError> {
        let nonzero = NonZeroUsize::new(size)
            .ok_or_else(|| invalid_size(size, "is not a positive integer"))?;
        size.checked_mul(vector_file::VALUE_SIZE)
            .ok_or_else(|| invalid_size(size, "does not fit in memory"))?;
        Ok(Self(nonzero))
    }

    /// The number of elements
    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Length of the matching vector file, `4 * size`. Cannot overflow, see
    /// [VectorSize::new].
    pub fn byte_length(self) -> u64 {
        (self.get() * vector_file::VALUE_SIZE) as u64
    }
}

impl TryFrom<i64> for VectorSize {
    type Error = BenchError;

    fn try_from(size: i64) -> Result<Self, Self::Error> {
        let size =
            usize::try_from(size).map_err(|_| invalid_size(size, "is not a positive integer"))?;
        Self::new(size)
    }
}

fn invalid_size(size: impl std::fmt::Display, reason: &str) -> BenchError {
    BenchError::InvalidArgument {
        name: "size",
        reason: format!("{size} {reason}"),
    }
}

/// Everything needed to produce one vector file.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of values
    pub size: VectorSize,
    /// Destination file
    pub output: PathBuf,
    /// Fixes the random stream, fresh entropy is used otherwise.
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    /// Config writing to [default_output] with an unpinned seed.
    pub fn new(size: VectorSize) -> Self {
        Self {
            size,
            output: default_output(size),
            seed: None,
        }
    }
}

/// `data/vector_{size}.bin`, the layout the benchmark suite expects.
pub fn default_output(size: VectorSize) -> PathBuf {
    Path::new("data").join(format!("vector_{}.bin", size.get()))
}

/// Draws `size` independent values uniformly from `[LOW, HIGH)`.
pub fn uniform_vector<R: Rng + ?Sized>(size: VectorSize, rng: &mut R) -> Vec<f32> {
    let between = Uniform::new(LOW, HIGH);
    between.sample_iter(rng).take(size.get()).collect()
}

/// Generates the vector described by `config` and writes it to disk.
pub fn generate(config: &GeneratorConfig) -> Result<(), BenchError> {
    info!(
        size = config.size.get(),
        output = %config.output.display(),
        "Generating data"
    );
    let values = match config.seed {
        Some(seed) => uniform_vector(config.size, &mut StdRng::seed_from_u64(seed)),
        None => uniform_vector(config.size, &mut rand::thread_rng()),
    };
    vector_file::write_vector(&config.output, &values)
}
