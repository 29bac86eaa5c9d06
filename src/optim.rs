use crate::nn::Param;
use ndarray::Array2;

/// Adam optimizer with bias-corrected first and second moment estimates.
///
/// Moment state is shaped lazily from the parameter list on the first call
/// to [`Adam::step`]; subsequent calls must pass the same parameters in the
/// same order.
///
/// # Example
/// ```
/// use avmatch::nn::Param;
/// use avmatch::optim::Adam;
/// use ndarray::array;
///
/// let mut p = Param::new(array![[1.0f32]]);
/// p.grad = array![[2.0f32]];
/// let mut adam = Adam::new(0.1).unwrap();
/// adam.step(&mut [&mut p]).unwrap();
/// assert!(p.data[(0, 0)] < 1.0);
/// ```
#[derive(Debug)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    step_count: i32,
    m: Vec<Array2<f32>>,
    v: Vec<Array2<f32>>,
}

impl Adam {
    /// Create an optimizer with the given learning rate and the usual
    /// moment defaults (0.9, 0.999, epsilon 1e-7).
    ///
    /// # Errors
    /// Returns `InvalidParameter` when the learning rate is not a positive
    /// finite number.
    pub fn new(learning_rate: f32) -> crate::Result<Self> {
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(crate::Error::InvalidParameter {
                name: "learning_rate",
                value: learning_rate.to_string(),
                reason: "must be positive and finite".to_string(),
            });
        }
        Ok(Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            step_count: 0,
            m: Vec::new(),
            v: Vec::new(),
        })
    }

    /// Override the moment decay rates.
    pub fn with_betas(mut self, beta1: f32, beta2: f32) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    /// Override the denominator epsilon.
    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Apply one update from the accumulated gradients.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` when the parameter list does not match the
    /// one the moment state was built from.
    pub fn step(&mut self, params: &mut [&mut Param]) -> crate::Result<()> {
        if self.m.is_empty() {
            self.m = params
                .iter()
                .map(|p| Array2::zeros(p.data.raw_dim()))
                .collect();
            self.v = self.m.clone();
        }
        if params.len() != self.m.len() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{} parameters", self.m.len()),
                got: format!("{} parameters", params.len()),
            });
        }

        self.step_count += 1;
        let bias1 = 1.0 - self.beta1.powi(self.step_count);
        let bias2 = 1.0 - self.beta2.powi(self.step_count);

        for (i, param) in params.iter_mut().enumerate() {
            if param.data.raw_dim() != self.m[i].raw_dim() {
                return Err(crate::Error::ShapeMismatch {
                    expected: format!("{:?} parameter", self.m[i].shape()),
                    got: format!("{:?} parameter", param.data.shape()),
                });
            }

            self.m[i] = &self.m[i] * self.beta1 + &param.grad * (1.0 - self.beta1);
            self.v[i] =
                &self.v[i] * self.beta2 + param.grad.mapv(|g| g * g) * (1.0 - self.beta2);

            let m_hat = &self.m[i] / bias1;
            let v_hat = &self.v[i] / bias2;
            let update = m_hat * self.learning_rate / (v_hat.mapv(f32::sqrt) + self.eps);
            param.data -= &update;
        }
        Ok(())
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> i32 {
        self.step_count
    }
}
