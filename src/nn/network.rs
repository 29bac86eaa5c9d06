use super::{sigmoid, Layer, Mode, Param};
use crate::metrics::argmax_rows;
use ndarray::Array2;

/// A sequential stack of layers.
///
/// The final layer is expected to produce logits; [`Network::predict_proba`]
/// applies the logistic function and [`Network::predict`] takes the most
/// probable class per row.
///
/// # Example
/// ```
/// use avmatch::nn::{Dense, Init, LeakyRelu, Mode, Network};
/// use ndarray::Array2;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let mut net = Network::new()
///     .add(Dense::new(4, 8, Init::GlorotNormal, &mut rng).unwrap())
///     .add(LeakyRelu::new(0.01))
///     .add(Dense::new(8, 2, Init::GlorotUniform, &mut rng).unwrap());
///
/// let x = Array2::<f32>::zeros((3, 4));
/// let logits = net.forward(&x, Mode::Eval).unwrap();
/// assert_eq!(logits.shape(), &[3, 2]);
/// ```
#[derive(Default)]
pub struct Network {
    layers: Vec<Box<dyn Layer>>,
}

impl Network {
    /// Create an empty network.
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append a layer, builder style.
    pub fn add<L: Layer + 'static>(mut self, layer: L) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Number of layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Whether the network has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run the input through every layer in order.
    pub fn forward(&mut self, input: &Array2<f32>, mode: Mode) -> crate::Result<Array2<f32>> {
        let mut activation = input.clone();
        for layer in &mut self.layers {
            activation = layer.forward(&activation, mode)?;
        }
        Ok(activation)
    }

    /// Propagate the output gradient back through every layer, accumulating
    /// parameter gradients; returns the gradient at the input.
    pub fn backward(&mut self, grad_output: &Array2<f32>) -> crate::Result<Array2<f32>> {
        let mut grad = grad_output.clone();
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad)?;
        }
        Ok(grad)
    }

    /// All learnable parameters, in layer order.
    pub fn parameters(&mut self) -> Vec<&mut Param> {
        self.layers
            .iter_mut()
            .flat_map(|layer| layer.parameters())
            .collect()
    }

    /// Reset every accumulated gradient to zero.
    pub fn zero_grad(&mut self) {
        for param in self.parameters() {
            param.zero_grad();
        }
    }

    /// Total number of learnable scalar values.
    pub fn num_parameters(&mut self) -> usize {
        self.parameters().iter().map(|p| p.data.len()).sum()
    }

    /// Class probabilities: a forward pass in `Eval` mode with the logistic
    /// function applied element-wise.
    pub fn predict_proba(&mut self, input: &Array2<f32>) -> crate::Result<Array2<f32>> {
        let logits = self.forward(input, Mode::Eval)?;
        Ok(logits.mapv(sigmoid))
    }

    /// Most probable class index per row.
    pub fn predict(&mut self, input: &Array2<f32>) -> crate::Result<Vec<usize>> {
        let proba = self.predict_proba(input)?;
        Ok(argmax_rows(&proba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{Dense, Init, LeakyRelu};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_net() -> Network {
        let mut rng = StdRng::seed_from_u64(3);
        Network::new()
            .add(Dense::new(3, 5, Init::GlorotNormal, &mut rng).unwrap())
            .add(LeakyRelu::new(0.01))
            .add(Dense::new(5, 2, Init::GlorotUniform, &mut rng).unwrap())
    }

    #[test]
    fn forward_threads_through_layers() {
        let mut net = small_net();
        let x = Array2::<f32>::ones((4, 3));
        let out = net.forward(&x, Mode::Eval).unwrap();
        assert_eq!(out.shape(), &[4, 2]);
    }

    #[test]
    fn empty_network_is_identity() {
        let mut net = Network::new();
        let x = ndarray::array![[1.0f32, 2.0]];
        let out = net.forward(&x, Mode::Eval).unwrap();
        assert_eq!(out, x);
    }

    #[test]
    fn parameter_count_matches_layout() {
        let mut net = small_net();
        // (3*5 + 5) + (5*2 + 2)
        assert_eq!(net.num_parameters(), 32);
        assert_eq!(net.parameters().len(), 4);
    }

    #[test]
    fn backward_accumulates_then_zeroes() {
        let mut net = small_net();
        let x = Array2::<f32>::ones((2, 3));
        net.forward(&x, Mode::Train).unwrap();
        net.backward(&Array2::<f32>::ones((2, 2))).unwrap();

        let had_nonzero = net
            .parameters()
            .iter()
            .any(|p| p.grad.iter().any(|&g| g != 0.0));
        assert!(had_nonzero);

        net.zero_grad();
        for p in net.parameters() {
            assert!(p.grad.iter().all(|&g| g == 0.0));
        }
    }

    #[test]
    fn probabilities_lie_in_unit_interval() {
        let mut net = small_net();
        let x = Array2::<f32>::from_elem((3, 3), 0.5);
        let proba = net.predict_proba(&x).unwrap();
        for &p in proba.iter() {
            assert!((0.0..=1.0).contains(&p));
        }
        let classes = net.predict(&x).unwrap();
        assert_eq!(classes.len(), 3);
        assert!(classes.iter().all(|&c| c < 2));
    }
}
