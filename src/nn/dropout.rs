use super::{Layer, Mode};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Inverted dropout: in `Train` mode each activation is dropped with
/// probability `rate` and the survivors are scaled by `1 / (1 - rate)`, so
/// `Eval` mode is a plain identity pass.
#[derive(Debug)]
pub struct Dropout {
    rate: f32,
    rng: StdRng,
    mask: Option<Array2<f32>>,
}

impl Dropout {
    /// Create a dropout layer.
    ///
    /// # Arguments
    /// * `rate` - Drop probability, in `[0, 1)`
    /// * `seed` - Seed for the drop mask stream
    ///
    /// # Errors
    /// Returns `InvalidParameter` when `rate` is outside `[0, 1)`.
    pub fn new(rate: f32, seed: u64) -> crate::Result<Self> {
        if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
            return Err(crate::Error::InvalidParameter {
                name: "rate",
                value: rate.to_string(),
                reason: "drop probability must lie in [0, 1)".to_string(),
            });
        }
        Ok(Self {
            rate,
            rng: StdRng::seed_from_u64(seed),
            mask: None,
        })
    }

    /// The drop probability.
    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl Layer for Dropout {
    fn forward(&mut self, input: &Array2<f32>, mode: Mode) -> crate::Result<Array2<f32>> {
        match mode {
            Mode::Eval => {
                self.mask = None;
                Ok(input.clone())
            }
            Mode::Train => {
                let keep_scale = 1.0 / (1.0 - self.rate);
                let rate = self.rate;
                let rng = &mut self.rng;
                let mask = Array2::from_shape_fn(input.raw_dim(), |_| {
                    if rng.gen::<f32>() < rate {
                        0.0
                    } else {
                        keep_scale
                    }
                });
                let output = input * &mask;
                self.mask = Some(mask);
                Ok(output)
            }
        }
    }

    fn backward(&mut self, grad_output: &Array2<f32>) -> crate::Result<Array2<f32>> {
        let mask = self
            .mask
            .take()
            .ok_or(crate::Error::BackwardBeforeForward("dropout"))?;
        if grad_output.raw_dim() != mask.raw_dim() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{:?} gradient", mask.shape()),
                got: format!("{:?} gradient", grad_output.shape()),
            });
        }
        Ok(grad_output * &mask)
    }
}
