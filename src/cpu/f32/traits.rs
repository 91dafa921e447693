use super::ops::{self, Kernel};
use super::tensor::Tensor;
use crate::traits::Device;
use crate::BenchError;

/// The host itself used as a compute device. Kernels run synchronously so
/// [Device::synchronize] has nothing to wait for.
///
/// [Device::softmax] writes into a fresh buffer, so a timed run includes
/// allocating and copying the `n` input values before the in-place kernel runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cpu {
    kernel: Kernel,
}

impl Cpu {
    /// A cpu device running `kernel`
    pub fn new(kernel: Kernel) -> Self {
        Self { kernel }
    }

    /// The kernel used by [Device::softmax]
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }
}

impl Device for Cpu {
    type Buffer = Tensor<'static>;

    fn name(&self) -> String {
        format!("cpu/{}", self.kernel)
    }

    fn place(&self, data: &[f32]) -> Result<Self::Buffer, BenchError> {
        Ok(Tensor::vector(data))
    }

    fn softmax(&self, x: &Self::Buffer) -> Result<Self::Buffer, BenchError> {
        let mut out = x.clone();
        ops::softmax(&mut out, self.kernel)?;
        Ok(out)
    }

    fn synchronize(&self) -> Result<(), BenchError> {
        Ok(())
    }

    fn to_host(&self, x: &Self::Buffer) -> Result<Vec<f32>, BenchError> {
        Ok(x.data().to_vec())
    }
}
