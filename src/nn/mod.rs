//! Feed-forward network building blocks: dense layers, activations, batch
//! normalization, dropout, and the sequential container.

mod activation;
mod batchnorm;
mod dense;
mod dropout;
mod network;

pub use activation::{sigmoid, LeakyRelu, Relu, Sigmoid};
pub use batchnorm::BatchNorm;
pub use dense::{Dense, Init};
pub use dropout::Dropout;
pub use network::Network;

use ndarray::Array2;

/// Whether a forward pass uses batch statistics and stochastic layers
/// (`Train`) or running estimates and identity passes (`Eval`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

/// A learnable parameter with its accumulated gradient.
///
/// All parameters are stored two-dimensional; vectors (biases, batch-norm
/// gains) use shape `(1, n)` so the optimizer handles a single layout.
#[derive(Debug, Clone)]
pub struct Param {
    pub data: Array2<f32>,
    pub grad: Array2<f32>,
}

impl Param {
    /// Wrap initial values with a zeroed gradient.
    pub fn new(data: Array2<f32>) -> Self {
        let grad = Array2::zeros(data.raw_dim());
        Self { data, grad }
    }

    /// Reset the accumulated gradient to zero.
    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }
}

/// A network layer: batch-major forward and backward passes plus access to
/// learnable parameters.
///
/// `backward` consumes the cache left by the most recent `forward` call and
/// accumulates parameter gradients; it must be preceded by a forward pass
/// in `Train` mode on the same batch.
pub trait Layer {
    /// Compute the layer output for a `(batch, features)` input.
    fn forward(&mut self, input: &Array2<f32>, mode: Mode) -> crate::Result<Array2<f32>>;

    /// Propagate the output gradient, returning the input gradient.
    fn backward(&mut self, grad_output: &Array2<f32>) -> crate::Result<Array2<f32>>;

    /// Learnable parameters, empty for stateless layers.
    fn parameters(&mut self) -> Vec<&mut Param> {
        Vec::new()
    }
}
