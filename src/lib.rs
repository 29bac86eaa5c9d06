//! Audio-visual digit match classification.
//!
//! Avmatch trains a binary classifier that predicts whether a spoken-digit
//! recording and a handwritten-digit image represent the same digit. It
//! covers the full pipeline: loading paired `.npy` arrays, feature
//! engineering (PCA on pixels, per-channel summary statistics on audio
//! frames, standardization), a feed-forward network with batch
//! normalization and dropout, mini-batch training with early stopping and
//! best-model checkpointing, and validation metrics.
//!
//! # Quick Start
//!
//! ```rust
//! use avmatch::features::{FeaturePipeline, PcaConfig};
//! use ndarray::Array2;
//!
//! // Ten image/audio pairs: 6-pixel images, 2-channel audio frames.
//! let images = Array2::from_shape_fn((10, 6), |(i, j)| ((i + 2 * j) % 5) as f32 / 4.0);
//! let audio: Vec<Array2<f32>> = (0..10)
//!     .map(|i| Array2::from_elem((5, 2), i as f32 * 0.1))
//!     .collect();
//!
//! // 3 principal components + 4 statistics x 2 channels = 11 features.
//! let (pipeline, features) =
//!     FeaturePipeline::fit(&images, &audio, &PcaConfig::new(3)).unwrap();
//! assert_eq!(features.shape(), &[10, 11]);
//! assert_eq!(pipeline.n_features(), 11);
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`dataset`] | `.npy` loading, pairing validation, pixel scaling |
//! | [`features`] | PCA, audio summary statistics, standardization, pipeline |
//! | [`split`] | Seeded train/validation splitting |
//! | [`nn`] | Dense layers, activations, batch norm, dropout, network |
//! | [`optim`] | Adam optimizer |
//! | [`loss`] | One-hot encoding, binary cross-entropy with logits |
//! | [`train`] | Mini-batch fit loop, history, early stopping |
//! | [`checkpoint`] | Parameter snapshots as JSON |
//! | [`metrics`] | Accuracy, confusion matrix, precision/recall |
//! | [`plot`] | Accuracy/loss curve rendering (feature `plot`) |
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`], which is an alias for
//! `std::result::Result<T, Error>`. The [`Error`] enum covers invalid
//! parameters, empty inputs, shape mismatches, non-finite data, and I/O
//! failures.
//!
//! # Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `plot` | PNG rendering of training curves via plotters |

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, Result};

pub mod checkpoint;
pub mod dataset;
pub mod features;
pub mod loss;
pub mod metrics;
pub mod nn;
pub mod optim;
pub mod split;
pub mod train;

#[cfg(feature = "plot")]
pub mod plot;
