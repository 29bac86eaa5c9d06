use crate::loss::bce_with_logits;
use crate::metrics::{accuracy, argmax_rows};
use crate::nn::{Mode, Network};
use crate::optim::Adam;
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;

/// Configuration for the mini-batch training loop.
///
/// # Example
/// ```
/// use avmatch::train::TrainConfig;
///
/// let config = TrainConfig::new()
///     .with_epochs(200)
///     .with_batch_size(60)
///     .with_patience(Some(100))
///     .with_checkpoint("best_model.json");
/// assert_eq!(config.epochs, 200);
/// ```
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Maximum number of passes over the training set.
    pub epochs: usize,
    /// Samples per gradient update.
    pub batch_size: usize,
    /// Adam learning rate.
    pub learning_rate: f32,
    /// Seed for batch shuffling.
    pub seed: u64,
    /// Stop after this many epochs without validation-loss improvement.
    pub patience: Option<usize>,
    /// Write the best-so-far parameters here whenever validation loss
    /// improves.
    pub checkpoint: Option<PathBuf>,
}

impl TrainConfig {
    /// Create a configuration with the pipeline defaults.
    pub fn new() -> Self {
        Self {
            epochs: 200,
            batch_size: 60,
            learning_rate: 1e-3,
            seed: 0,
            patience: Some(100),
            checkpoint: None,
        }
    }

    /// Set the epoch budget.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the mini-batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the Adam learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set or disable early stopping.
    pub fn with_patience(mut self, patience: Option<usize>) -> Self {
        self.patience = patience;
        self
    }

    /// Set the best-model checkpoint path.
    pub fn with_checkpoint<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.checkpoint = Some(path.into());
        self
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-epoch training record.
#[derive(Debug, Clone, Default)]
pub struct History {
    pub train_loss: Vec<f32>,
    pub train_accuracy: Vec<f32>,
    pub val_loss: Vec<f32>,
    pub val_accuracy: Vec<f32>,
    /// Epoch with the lowest validation loss.
    pub best_epoch: usize,
    /// The lowest validation loss observed.
    pub best_val_loss: f32,
}

impl History {
    /// Number of epochs actually run (early stopping may end the loop
    /// before the configured budget).
    pub fn epochs_run(&self) -> usize {
        self.val_loss.len()
    }
}

/// Loss and accuracy of a network on a labeled set, in `Eval` mode.
///
/// # Errors
/// Propagates forward-pass and loss errors.
pub fn evaluate(
    network: &mut Network,
    features: &Array2<f32>,
    targets: &Array2<f32>,
) -> crate::Result<(f32, f32)> {
    let logits = network.forward(features, Mode::Eval)?;
    let (loss, _) = bce_with_logits(&logits, targets)?;
    // The logistic function is monotone, so logits order classes the same
    // way probabilities do.
    let predicted = argmax_rows(&logits);
    let actual = argmax_rows(targets);
    let acc = accuracy(&predicted, &actual)?;
    Ok((loss, acc))
}

/// Train a network with Adam on mini-batches, recording per-epoch loss and
/// accuracy for both splits.
///
/// Validation loss drives early stopping and best-model checkpointing.
///
/// # Errors
/// Returns `ShapeMismatch`/`EmptyInput` on inconsistent inputs and
/// propagates layer, optimizer, and checkpoint errors.
pub fn fit(
    network: &mut Network,
    x_train: &Array2<f32>,
    y_train: &Array2<f32>,
    x_val: &Array2<f32>,
    y_val: &Array2<f32>,
    config: &TrainConfig,
) -> crate::Result<History> {
    let n = x_train.nrows();
    if n == 0 || x_val.nrows() == 0 {
        return Err(crate::Error::EmptyInput("training data"));
    }
    if y_train.nrows() != n || y_val.nrows() != x_val.nrows() {
        return Err(crate::Error::ShapeMismatch {
            expected: format!("{} train / {} val targets", n, x_val.nrows()),
            got: format!("{} train / {} val targets", y_train.nrows(), y_val.nrows()),
        });
    }
    if config.batch_size == 0 {
        return Err(crate::Error::InvalidSize {
            name: "batch_size",
            value: 0,
            reason: "mini-batches need at least one sample",
        });
    }
    if config.epochs == 0 {
        return Err(crate::Error::InvalidSize {
            name: "epochs",
            value: 0,
            reason: "training needs at least one epoch",
        });
    }

    let mut optimizer = Adam::new(config.learning_rate)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut indices: Vec<usize> = (0..n).collect();

    let mut history = History {
        best_val_loss: f32::INFINITY,
        ..History::default()
    };
    let mut stale_epochs = 0usize;

    for epoch in 0..config.epochs {
        indices.shuffle(&mut rng);
        for chunk in indices.chunks(config.batch_size) {
            let x_batch = x_train.select(Axis(0), chunk);
            let y_batch = y_train.select(Axis(0), chunk);

            let logits = network.forward(&x_batch, Mode::Train)?;
            let (_, grad) = bce_with_logits(&logits, &y_batch)?;
            network.zero_grad();
            network.backward(&grad)?;
            optimizer.step(&mut network.parameters())?;
        }

        let (train_loss, train_acc) = evaluate(network, x_train, y_train)?;
        let (val_loss, val_acc) = evaluate(network, x_val, y_val)?;
        history.train_loss.push(train_loss);
        history.train_accuracy.push(train_acc);
        history.val_loss.push(val_loss);
        history.val_accuracy.push(val_acc);

        log::debug!(
            "epoch {}: loss {:.4}, accuracy {:.4}, val_loss {:.4}, val_accuracy {:.4}",
            epoch,
            train_loss,
            train_acc,
            val_loss,
            val_acc
        );

        if val_loss < history.best_val_loss {
            history.best_val_loss = val_loss;
            history.best_epoch = epoch;
            stale_epochs = 0;
            if let Some(path) = &config.checkpoint {
                crate::checkpoint::save(network, path)?;
            }
        } else {
            stale_epochs += 1;
            if let Some(patience) = config.patience {
                if stale_epochs >= patience {
                    log::debug!("early stopping at epoch {}", epoch);
                    break;
                }
            }
        }
    }

    Ok(history)
}
