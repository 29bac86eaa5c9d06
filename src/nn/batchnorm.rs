use super::{Layer, Mode, Param};
use ndarray::{Array1, Array2, Axis};

/// Batch normalization over the feature axis.
///
/// In `Train` mode activations are normalized with the statistics of the
/// current batch and the running estimates are updated; in `Eval` mode the
/// running estimates are used. Gain (`gamma`) and shift (`beta`) are
/// learnable. Defaults follow the common momentum 0.99 / epsilon 1e-3
/// setup.
#[derive(Debug)]
pub struct BatchNorm {
    gamma: Param,
    beta: Param,
    running_mean: Array1<f32>,
    running_var: Array1<f32>,
    momentum: f32,
    eps: f32,
    cache: Option<Cache>,
}

#[derive(Debug)]
struct Cache {
    x_hat: Array2<f32>,
    std: Array1<f32>,
}

impl BatchNorm {
    /// Create a batch-normalization layer for `n_features` columns.
    ///
    /// # Errors
    /// Returns `InvalidSize` when `n_features` is zero.
    pub fn new(n_features: usize) -> crate::Result<Self> {
        if n_features == 0 {
            return Err(crate::Error::InvalidSize {
                name: "n_features",
                value: n_features,
                reason: "batch norm needs at least one feature",
            });
        }
        Ok(Self {
            gamma: Param::new(Array2::ones((1, n_features))),
            beta: Param::new(Array2::zeros((1, n_features))),
            running_mean: Array1::zeros(n_features),
            running_var: Array1::ones(n_features),
            momentum: 0.99,
            eps: 1e-3,
            cache: None,
        })
    }

    /// Set the running-statistics momentum.
    pub fn with_momentum(mut self, momentum: f32) -> Self {
        self.momentum = momentum;
        self
    }

    /// Set the variance epsilon.
    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    /// Number of normalized features.
    pub fn n_features(&self) -> usize {
        self.running_mean.len()
    }

    fn check_width(&self, input: &Array2<f32>) -> crate::Result<()> {
        if input.ncols() != self.n_features() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{} features", self.n_features()),
                got: format!("{} features", input.ncols()),
            });
        }
        Ok(())
    }
}

impl Layer for BatchNorm {
    fn forward(&mut self, input: &Array2<f32>, mode: Mode) -> crate::Result<Array2<f32>> {
        self.check_width(input)?;
        let n = input.nrows();
        if n == 0 {
            return Err(crate::Error::EmptyInput("batch norm input"));
        }

        match mode {
            Mode::Train => {
                let mean = input.sum_axis(Axis(0)) / n as f32;
                let centered = input - &mean;
                let var = centered.mapv(|v| v * v).sum_axis(Axis(0)) / n as f32;
                let std = (&var + self.eps).mapv(f32::sqrt);
                let x_hat = &centered / &std;
                let output = &x_hat * &self.gamma.data + &self.beta.data;

                self.running_mean =
                    &self.running_mean * self.momentum + &(&mean * (1.0 - self.momentum));
                self.running_var =
                    &self.running_var * self.momentum + &(&var * (1.0 - self.momentum));
                self.cache = Some(Cache { x_hat, std });
                Ok(output)
            }
            Mode::Eval => {
                let std = (&self.running_var + self.eps).mapv(f32::sqrt);
                let x_hat = (input - &self.running_mean) / &std;
                Ok(&x_hat * &self.gamma.data + &self.beta.data)
            }
        }
    }

    fn backward(&mut self, grad_output: &Array2<f32>) -> crate::Result<Array2<f32>> {
        let Cache { x_hat, std } = self
            .cache
            .take()
            .ok_or(crate::Error::BackwardBeforeForward("batch_norm"))?;
        if grad_output.raw_dim() != x_hat.raw_dim() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{:?} gradient", x_hat.shape()),
                got: format!("{:?} gradient", grad_output.shape()),
            });
        }
        let n = x_hat.nrows() as f32;

        self.gamma.grad += &(grad_output * &x_hat)
            .sum_axis(Axis(0))
            .insert_axis(Axis(0));
        self.beta.grad += &grad_output.sum_axis(Axis(0)).insert_axis(Axis(0));

        let d_xhat = grad_output * &self.gamma.data;
        let sum_d = d_xhat.sum_axis(Axis(0));
        let sum_dx = (&d_xhat * &x_hat).sum_axis(Axis(0));

        let grad_input = (&d_xhat * n - &sum_d - &x_hat * &sum_dx) / &(&std * n);
        Ok(grad_input)
    }

    fn parameters(&mut self) -> Vec<&mut Param> {
        vec![&mut self.gamma, &mut self.beta]
    }
}
