use crate::BenchError;
use cudarc::driver::{CudaDevice, CudaSlice};
use std::sync::Arc;

/// Tensor living on a CUDA device
#[derive(Clone)]
pub struct Tensor {
    shape: Vec<usize>,
    device: Arc<CudaDevice>,
    data: CudaSlice<f32>,
}

impl Tensor {
    /// The shape of the tensor
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The [CudaSlice] holding the data
    pub fn data(&self) -> &CudaSlice<f32> {
        &self.data
    }

    /// A mutable borrow of [CudaSlice] holding the data
    pub fn data_mut(&mut self) -> &mut CudaSlice<f32> {
        &mut self.data
    }

    /// The device holding the data
    pub fn cuda(&self) -> Arc<CudaDevice> {
        self.device.clone()
    }

    /// Creates a new nulled tensor with given shape
    pub fn zeros(shape: Vec<usize>, device: &Arc<CudaDevice>) -> Result<Self, BenchError> {
        let nelement: usize = shape.iter().product();
        let data: CudaSlice<f32> = device.alloc_zeros(nelement)?;
        Ok(Self {
            shape,
            data,
            device: device.clone(),
        })
    }

    /// Creates a tensor from a cpu slice.
    pub fn from_cpu(
        data: &[f32],
        shape: Vec<usize>,
        device: &Arc<CudaDevice>,
    ) -> Result<Self, BenchError> {
        if data.len() != shape.iter().product::<usize>() {
            return Err(BenchError::InvalidBuffer {
                buffer_size: data.len(),
                shape,
            });
        }
        let data = device.htod_sync_copy(data)?;
        Ok(Self {
            device: device.clone(),
            data,
            shape,
        })
    }

    /// Returns a cpu vec containing copied data from the device.
    pub fn cpu_data(&self) -> Result<Vec<f32>, BenchError> {
        let cpu_data = self.device.dtoh_sync_copy(&self.data)?;
        Ok(cpu_data)
    }
}
