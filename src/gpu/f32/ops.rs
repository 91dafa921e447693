use crate::gpu::f32::Tensor;
use crate::BenchError;
use cudarc::driver::{DriverError, LaunchAsync, LaunchConfig};
use cudarc::nvrtc::Ptx;

/// Threads of the single block running [softmax], must match `BLOCK_SIZE` in
/// `softmax.cu`.
pub const BLOCK_SIZE: u32 = 1024;

impl From<DriverError> for BenchError {
    fn from(err: DriverError) -> Self {
        Self::Compute {
            device: "cuda".to_string(),
            message: err.to_string(),
        }
    }
}

const SOFTMAX_PTX: &str = include_str!(concat!(env!("OUT_DIR"), "/softmax.ptx"));

/// Enqueues the softmax of the whole tensor `x` into `out`. The PTX module is
/// loaded on first use, so the first call pays for it.
///
/// The launch is asynchronous, synchronize the device before reading `out`.
pub fn softmax(x: &Tensor, out: &mut Tensor) -> Result<(), BenchError> {
    if x.shape() != out.shape() {
        return Err(BenchError::InvalidBuffer {
            buffer_size: out.shape().iter().product(),
            shape: x.shape().to_vec(),
        });
    }
    let numel: usize = x.shape().iter().product();
    if numel == 0 {
        return Ok(());
    }

    let dev = x.cuda();
    let module_name = "softmax_f32";
    if !dev.has_func(module_name, module_name) {
        dev.load_ptx(Ptx::from_src(SOFTMAX_PTX), module_name, &[module_name])?;
    }
    let fwd_fn = dev
        .get_func(module_name, module_name)
        .ok_or_else(|| BenchError::Compute {
            device: "cuda".to_string(),
            message: format!("function {module_name} missing from the PTX module"),
        })?;
    let cfg = LaunchConfig {
        grid_dim: (1, 1, 1),
        block_dim: (BLOCK_SIZE, 1, 1),
        shared_mem_bytes: 0,
    };
    let params = (numel, x.data(), out.data_mut());
    unsafe { fwd_fn.launch(cfg, params) }?;
    Ok(())
}
