/// The various ops
mod ops;
/// The Tensor struct
mod tensor;

/// The Device trait implementation
mod traits;

pub use ops::*;
pub use tensor::Tensor;
pub use traits::Cuda;
