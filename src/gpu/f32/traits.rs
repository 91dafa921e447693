use super::ops;
use super::tensor::Tensor;
use crate::traits::Device;
use crate::BenchError;
use cudarc::driver::CudaDevice;
use std::sync::Arc;

/// A CUDA device. Kernels are launched asynchronously on the device stream,
/// [Device::synchronize] waits for them.
#[derive(Clone)]
pub struct Cuda {
    device: Arc<CudaDevice>,
    ordinal: usize,
}

impl Cuda {
    /// Opens the device `ordinal`
    pub fn new(ordinal: usize) -> Result<Self, BenchError> {
        let device = CudaDevice::new(ordinal)?;
        Ok(Self { device, ordinal })
    }
}

impl Device for Cuda {
    type Buffer = Tensor;

    fn name(&self) -> String {
        format!("cuda:{}", self.ordinal)
    }

    fn place(&self, data: &[f32]) -> Result<Self::Buffer, BenchError> {
        Tensor::from_cpu(data, vec![data.len()], &self.device)
    }

    fn softmax(&self, x: &Self::Buffer) -> Result<Self::Buffer, BenchError> {
        let mut out = Tensor::zeros(x.shape().to_vec(), &self.device)?;
        ops::softmax(x, &mut out)?;
        Ok(out)
    }

    fn synchronize(&self) -> Result<(), BenchError> {
        self.device.synchronize()?;
        Ok(())
    }

    fn to_host(&self, x: &Self::Buffer) -> Result<Vec<f32>, BenchError> {
        x.cpu_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::f32::{Cpu, Kernel};
    use crate::harness::benchmark;
    use crate::tests::{assert_close, random_vector};

    #[test]
    fn matches_cpu() {
        let data = random_vector(10_000, 1);
        let gpu = benchmark(&Cuda::new(0).unwrap(), &data).unwrap();
        let cpu = benchmark(&Cpu::new(Kernel::Naive), &data).unwrap();
        assert_close(&gpu.output, &cpu.output, 2e-5, 2e-5);
    }
}
