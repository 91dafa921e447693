use crate::BenchError;
use std::borrow::Cow;

/// Tensor, can own, or borrow the underlying tensor
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<'data> {
    shape: Vec<usize>,
    data: Cow<'data, [f32]>,
}

impl<'data> Tensor<'data> {
    /// The shape of the tensor
    /// ```
    /// use softmax_bench::cpu::f32::Tensor;
    ///
    /// let tensor = Tensor::zeros(vec![2, 2]);
    /// assert_eq!(tensor.shape(), vec![2, 2]);
    /// ```
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// A slice to the underlying tensor data
    pub fn data(&self) -> &[f32] {
        self.data.as_ref()
    }

    /// A mutable slice to the underlying tensor data, copies borrowed data first.
    pub fn data_mut(&mut self) -> &mut [f32] {
        self.data.to_mut()
    }

    /// Consumes the tensor and returns an owned buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data.into_owned()
    }

    /// Creates a new nulled tensor with given shape
    pub fn zeros(shape: Vec<usize>) -> Self {
        let nelement: usize = shape.iter().product();
        let data = Cow::Owned(vec![0.0; nelement]);
        Self { shape, data }
    }

    /// Creates a new borrowed tensor with given shape. Can fail if data doesn't match the shape
    /// ```
    /// use softmax_bench::cpu::f32::Tensor;
    ///
    /// let data = [1.0, 2.0, 3.0, 4.0];
    /// let tensor = Tensor::borrowed(&data, vec![2, 2]).unwrap();
    /// ```
    pub fn borrowed(data: &'data [f32], shape: Vec<usize>) -> Result<Self, BenchError> {
        let cow: Cow<'data, [f32]> = data.into();
        Self::new(cow, shape)
    }

    /// Creates a new tensor with given shape. Can fail if data doesn't match the shape
    /// ```
    /// use softmax_bench::cpu::f32::Tensor;
    ///
    /// let data = vec![1.0, 2.0, 3.0, 4.0];
    /// let tensor = Tensor::new(data, vec![2, 2]).unwrap();
    /// ```
    pub fn new<T>(data: T, shape: Vec<usize>) -> Result<Self, BenchError>
    where
        T: Into<Cow<'data, [f32]>>,
    {
        let data = data.into();
        if data.len() != shape.iter().product::<usize>() {
            return Err(BenchError::InvalidBuffer {
                buffer_size: data.len(),
                shape,
            });
        }
        Ok(Self { shape, data })
    }

    /// Rank 1 tensor owning a copy of `data`.
    pub fn vector(data: &[f32]) -> Tensor<'static> {
        Tensor {
            shape: vec![data.len()],
            data: Cow::Owned(data.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_buffer() {
        let err = Tensor::new(vec![1.0, 2.0, 3.0], vec![2, 2]).unwrap_err();
        assert!(matches!(
            err,
            BenchError::InvalidBuffer { buffer_size: 3, .. }
        ));
    }

    #[test]
    fn borrowed_copies_on_write() {
        let data = [1.0, 2.0];
        let mut tensor = Tensor::borrowed(&data, vec![2]).unwrap();
        tensor.data_mut()[0] = 5.0;
        assert_eq!(tensor.data(), [5.0, 2.0]);
        assert_eq!(data, [1.0, 2.0]);
    }

    #[test]
    fn vector_shape() {
        let tensor = Tensor::vector(&[0.5; 7]);
        assert_eq!(tensor.shape(), [7]);
        assert_eq!(tensor.into_data(), vec![0.5; 7]);
    }
}
