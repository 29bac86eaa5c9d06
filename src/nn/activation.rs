use super::{Layer, Mode};
use ndarray::Array2;

/// Numerically stable logistic function.
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Leaky rectifier: `x` for positive inputs, `alpha * x` otherwise.
#[derive(Debug, Clone)]
pub struct LeakyRelu {
    alpha: f32,
    input: Option<Array2<f32>>,
}

impl LeakyRelu {
    /// Create a leaky rectifier with the given negative-side slope.
    pub fn new(alpha: f32) -> Self {
        Self { alpha, input: None }
    }

    /// The negative-side slope.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Layer for LeakyRelu {
    fn forward(&mut self, input: &Array2<f32>, _mode: Mode) -> crate::Result<Array2<f32>> {
        let alpha = self.alpha;
        let output = input.mapv(|v| if v > 0.0 { v } else { alpha * v });
        self.input = Some(input.clone());
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Array2<f32>) -> crate::Result<Array2<f32>> {
        let input = self
            .input
            .take()
            .ok_or(crate::Error::BackwardBeforeForward("leaky_relu"))?;
        if grad_output.raw_dim() != input.raw_dim() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{:?} gradient", input.shape()),
                got: format!("{:?} gradient", grad_output.shape()),
            });
        }
        let alpha = self.alpha;
        let slope = input.mapv(|v| if v > 0.0 { 1.0 } else { alpha });
        Ok(grad_output * &slope)
    }
}

/// Rectified linear unit.
#[derive(Debug, Clone)]
pub struct Relu {
    input: Option<Array2<f32>>,
}

impl Relu {
    pub fn new() -> Self {
        Self { input: None }
    }
}

impl Default for Relu {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for Relu {
    fn forward(&mut self, input: &Array2<f32>, _mode: Mode) -> crate::Result<Array2<f32>> {
        let output = input.mapv(|v| v.max(0.0));
        self.input = Some(input.clone());
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Array2<f32>) -> crate::Result<Array2<f32>> {
        let input = self
            .input
            .take()
            .ok_or(crate::Error::BackwardBeforeForward("relu"))?;
        if grad_output.raw_dim() != input.raw_dim() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{:?} gradient", input.shape()),
                got: format!("{:?} gradient", grad_output.shape()),
            });
        }
        let mask = input.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
        Ok(grad_output * &mask)
    }
}

/// Element-wise logistic activation.
#[derive(Debug, Clone)]
pub struct Sigmoid {
    output: Option<Array2<f32>>,
}

impl Sigmoid {
    pub fn new() -> Self {
        Self { output: None }
    }
}

impl Default for Sigmoid {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for Sigmoid {
    fn forward(&mut self, input: &Array2<f32>, _mode: Mode) -> crate::Result<Array2<f32>> {
        let output = input.mapv(sigmoid);
        self.output = Some(output.clone());
        Ok(output)
    }

    fn backward(&mut self, grad_output: &Array2<f32>) -> crate::Result<Array2<f32>> {
        let output = self
            .output
            .take()
            .ok_or(crate::Error::BackwardBeforeForward("sigmoid"))?;
        if grad_output.raw_dim() != output.raw_dim() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{:?} gradient", output.shape()),
                got: format!("{:?} gradient", grad_output.shape()),
            });
        }
        let slope = output.mapv(|y| y * (1.0 - y));
        Ok(grad_output * &slope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn sigmoid_known_values() {
        assert_abs_diff_eq!(sigmoid(0.0), 0.5);
        assert_abs_diff_eq!(sigmoid(2.0), 0.880797, epsilon = 1e-5);
        assert_abs_diff_eq!(sigmoid(-2.0), 0.119203, epsilon = 1e-5);
        // Extremes saturate without producing NaN.
        assert!(sigmoid(100.0) <= 1.0);
        assert!(sigmoid(-100.0) >= 0.0);
    }

    #[test]
    fn leaky_relu_forward_and_backward() {
        let mut layer = LeakyRelu::new(0.3);
        let x = array![[2.0f32, -2.0], [0.0, 1.0]];
        let y = layer.forward(&x, Mode::Train).unwrap();
        assert_abs_diff_eq!(y[(0, 0)], 2.0);
        assert_abs_diff_eq!(y[(0, 1)], -0.6, epsilon = 1e-6);

        let grad = layer.backward(&Array2::<f32>::ones((2, 2))).unwrap();
        assert_abs_diff_eq!(grad[(0, 0)], 1.0);
        assert_abs_diff_eq!(grad[(0, 1)], 0.3);
        // Zero input falls on the negative-side slope.
        assert_abs_diff_eq!(grad[(1, 0)], 0.3);
    }

    #[test]
    fn relu_zeroes_negative_gradient() {
        let mut layer = Relu::new();
        let x = array![[1.5f32, -1.5]];
        let y = layer.forward(&x, Mode::Train).unwrap();
        assert_abs_diff_eq!(y[(0, 1)], 0.0);

        let grad = layer.backward(&array![[2.0f32, 2.0]]).unwrap();
        assert_abs_diff_eq!(grad[(0, 0)], 2.0);
        assert_abs_diff_eq!(grad[(0, 1)], 0.0);
    }

    #[test]
    fn sigmoid_layer_gradient_peaks_at_origin() {
        let mut layer = Sigmoid::new();
        let x = array![[0.0f32, 4.0]];
        layer.forward(&x, Mode::Train).unwrap();
        let grad = layer.backward(&array![[1.0f32, 1.0]]).unwrap();
        assert_abs_diff_eq!(grad[(0, 0)], 0.25);
        assert!(grad[(0, 1)] < 0.25);
    }

    #[test]
    fn backward_requires_forward() {
        let mut layer = Relu::new();
        assert!(layer.backward(&Array2::<f32>::ones((1, 1))).is_err());
    }
}
