/// f32 tensors and kernels on CUDA devices
pub mod f32;
