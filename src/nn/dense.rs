use super::{Layer, Mode, Param};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Normal, Uniform};

/// Weight initialization scheme for a dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init {
    /// Samples from N(0, 2 / (fan_in + fan_out)).
    GlorotNormal,
    /// Samples uniformly from ±sqrt(6 / (fan_in + fan_out)).
    GlorotUniform,
}

/// Fully-connected layer: `y = x W + b`.
///
/// Weights have shape `(inputs, outputs)`, the bias `(1, outputs)`.
///
/// # Example
/// ```
/// use avmatch::nn::{Dense, Init, Layer, Mode};
/// use ndarray::Array2;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let mut layer = Dense::new(4, 3, Init::GlorotUniform, &mut rng).unwrap();
/// let x = Array2::<f32>::ones((2, 4));
/// let y = layer.forward(&x, Mode::Train).unwrap();
/// assert_eq!(y.shape(), &[2, 3]);
/// ```
#[derive(Debug)]
pub struct Dense {
    weights: Param,
    bias: Param,
    input: Option<Array2<f32>>,
}

impl Dense {
    /// Create a layer with freshly initialized weights and zero bias.
    ///
    /// # Arguments
    /// * `n_in` - Input feature count
    /// * `n_out` - Output feature count
    /// * `init` - Weight initialization scheme
    /// * `rng` - Seeded source for the initial weights
    ///
    /// # Errors
    /// Returns `InvalidSize` when either dimension is zero.
    pub fn new(
        n_in: usize,
        n_out: usize,
        init: Init,
        rng: &mut StdRng,
    ) -> crate::Result<Self> {
        if n_in == 0 {
            return Err(crate::Error::InvalidSize {
                name: "n_in",
                value: n_in,
                reason: "dense layer needs at least one input",
            });
        }
        if n_out == 0 {
            return Err(crate::Error::InvalidSize {
                name: "n_out",
                value: n_out,
                reason: "dense layer needs at least one output",
            });
        }

        let fan_sum = (n_in + n_out) as f32;
        let weights = match init {
            Init::GlorotNormal => {
                let std = (2.0 / fan_sum).sqrt();
                let normal = Normal::new(0.0f32, std).map_err(|e| {
                    crate::Error::InvalidParameter {
                        name: "init",
                        value: std.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Array2::from_shape_fn((n_in, n_out), |_| rng.sample(normal))
            }
            Init::GlorotUniform => {
                let limit = (6.0 / fan_sum).sqrt();
                let uniform = Uniform::new(-limit, limit);
                Array2::from_shape_fn((n_in, n_out), |_| rng.sample(uniform))
            }
        };

        Ok(Self {
            weights: Param::new(weights),
            bias: Param::new(Array2::zeros((1, n_out))),
            input: None,
        })
    }

    /// Input feature count.
    pub fn n_in(&self) -> usize {
        self.weights.data.nrows()
    }

    /// Output feature count.
    pub fn n_out(&self) -> usize {
        self.weights.data.ncols()
    }
}

impl Layer for Dense {
    fn forward(&mut self, input: &Array2<f32>, _mode: Mode) -> crate::Result<Array2<f32>> {
        if input.ncols() != self.n_in() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{} input features", self.n_in()),
                got: format!("{} input features", input.ncols()),
            });
        }
        let output = input.dot(&self.weights.data) + &self.bias.data;
        self.input = Some(input.clone());
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Array2<f32>) -> crate::Result<Array2<f32>> {
        let input = self
            .input
            .take()
            .ok_or(crate::Error::BackwardBeforeForward("dense"))?;
        if grad_output.nrows() != input.nrows() || grad_output.ncols() != self.n_out() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("({}, {}) gradient", input.nrows(), self.n_out()),
                got: format!("({}, {}) gradient", grad_output.nrows(), grad_output.ncols()),
            });
        }

        self.weights.grad += &input.t().dot(grad_output);
        self.bias.grad += &grad_output
            .sum_axis(Axis(0))
            .insert_axis(Axis(0));

        Ok(grad_output.dot(&self.weights.data.t()))
    }

    fn parameters(&mut self) -> Vec<&mut Param> {
        vec![&mut self.weights, &mut self.bias]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn layer(n_in: usize, n_out: usize) -> Dense {
        let mut rng = StdRng::seed_from_u64(42);
        Dense::new(n_in, n_out, Init::GlorotUniform, &mut rng).unwrap()
    }

    #[test]
    fn forward_applies_affine_map() {
        let mut dense = layer(2, 2);
        dense.weights.data = ndarray::array![[1.0f32, 2.0], [3.0, 4.0]];
        dense.bias.data = ndarray::array![[0.5f32, -0.5]];

        let x = ndarray::array![[1.0f32, 1.0], [2.0, 0.0]];
        let y = dense.forward(&x, Mode::Train).unwrap();
        assert_eq!(y, ndarray::array![[4.5f32, 5.5], [2.5, 3.5]]);
    }

    #[test]
    fn backward_matches_finite_differences() {
        let mut dense = layer(3, 2);
        let x = ndarray::array![[0.3f32, -0.2, 0.8], [1.1, 0.4, -0.6]];

        // Loss = sum of outputs, so grad_output is all ones.
        let ones = Array2::<f32>::ones((2, 2));
        dense.forward(&x, Mode::Train).unwrap();
        dense.backward(&ones).unwrap();
        let analytic = dense.weights.grad.clone();

        let eps = 1e-3f32;
        for i in 0..3 {
            for j in 0..2 {
                let original = dense.weights.data[(i, j)];
                dense.weights.data[(i, j)] = original + eps;
                let plus: f32 = dense.forward(&x, Mode::Train).unwrap().sum();
                dense.weights.data[(i, j)] = original - eps;
                let minus: f32 = dense.forward(&x, Mode::Train).unwrap().sum();
                dense.weights.data[(i, j)] = original;

                let numeric = (plus - minus) / (2.0 * eps);
                assert!(
                    (numeric - analytic[(i, j)]).abs() < 1e-2,
                    "weight ({}, {}): numeric {} vs analytic {}",
                    i,
                    j,
                    numeric,
                    analytic[(i, j)]
                );
            }
        }
    }

    #[test]
    fn backward_requires_forward() {
        let mut dense = layer(2, 2);
        let grad = Array2::<f32>::ones((1, 2));
        assert!(matches!(
            dense.backward(&grad),
            Err(crate::Error::BackwardBeforeForward(_))
        ));
    }

    #[test]
    fn rejects_zero_dimensions() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Dense::new(0, 2, Init::GlorotNormal, &mut rng).is_err());
        assert!(Dense::new(2, 0, Init::GlorotNormal, &mut rng).is_err());
    }

    #[test]
    fn forward_rejects_width_mismatch() {
        let mut dense = layer(3, 2);
        let x = Array2::<f32>::zeros((2, 4));
        assert!(matches!(
            dense.forward(&x, Mode::Train),
            Err(crate::Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn glorot_uniform_respects_limit() {
        let mut rng = StdRng::seed_from_u64(7);
        let dense = Dense::new(50, 50, Init::GlorotUniform, &mut rng).unwrap();
        let limit = (6.0f32 / 100.0).sqrt();
        for &w in dense.weights.data.iter() {
            assert!(w.abs() <= limit);
        }
    }
}
