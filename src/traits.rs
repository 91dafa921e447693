use crate::BenchError;

/// A compute context able to hold a vector and run the softmax kernel on it.
///
/// Kernels may be dispatched asynchronously, so callers that want to read or
/// time a result must call [Device::synchronize] first.
pub trait Device {
    /// Device resident vector
    type Buffer;

    /// Human readable name, used in logs and reports.
    fn name(&self) -> String;

    /// Copies `data` into the device.
    fn place(&self, data: &[f32]) -> Result<Self::Buffer, BenchError>;

    /// Enqueues the softmax of `x`, returning a new buffer.
    fn softmax(&self, x: &Self::Buffer) -> Result<Self::Buffer, BenchError>;

    /// Blocks until every enqueued kernel has completed.
    fn synchronize(&self) -> Result<(), BenchError>;

    /// Copies a buffer back to host memory.
    fn to_host(&self, x: &Self::Buffer) -> Result<Vec<f32>, BenchError>;
}
