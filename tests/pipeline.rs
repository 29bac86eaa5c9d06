//! End-to-end pipeline test on synthetic paired data: feature engineering,
//! splitting, training, and evaluation.

use avmatch::features::{FeaturePipeline, PcaConfig};
use avmatch::loss::one_hot;
use avmatch::metrics::{confusion_matrix, precision, recall};
use avmatch::nn::{BatchNorm, Dense, Dropout, Init, LeakyRelu, Network};
use avmatch::split::train_validation_split;
use avmatch::train::{evaluate, fit, TrainConfig};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Synthetic paired data where matching pairs are separable: for a match,
/// both the image block and the audio level carry the same offset.
fn synthetic_pairs(n: usize) -> (Array2<f32>, Vec<Array2<f32>>, Array1<bool>) {
    let labels = Array1::from_shape_fn(n, |i| i % 3 == 0);

    let images = Array2::from_shape_fn((n, 12), |(i, j)| {
        let base = ((i * 5 + j * 11) % 7) as f32 * 0.1;
        if labels[i] {
            base + 1.5
        } else {
            base
        }
    });

    let audio: Vec<Array2<f32>> = (0..n)
        .map(|i| {
            let frames = 4 + i % 3;
            Array2::from_shape_fn((frames, 3), |(t, c)| {
                let base = ((i + t * 2 + c) % 5) as f32 * 0.2;
                if labels[i] {
                    base - 1.0
                } else {
                    base
                }
            })
        })
        .collect();

    (images, audio, labels)
}

#[test]
fn features_split_train_evaluate() {
    let (images, audio, labels) = synthetic_pairs(60);

    let (pipeline, features) =
        FeaturePipeline::fit(&images, &audio, &PcaConfig::new(4).with_seed(811)).unwrap();
    // 4 PCA dims + 4 stats x 3 channels
    assert_eq!(features.shape(), &[60, 16]);

    let split = train_validation_split(&features, &labels, 0.2, 811).unwrap();
    assert_eq!(split.x_val.nrows(), 12);
    assert_eq!(split.x_train.nrows(), 48);

    let y_train = one_hot(&split.y_train);
    let y_val = one_hot(&split.y_val);

    let mut rng = StdRng::seed_from_u64(0);
    let mut network = Network::new()
        .add(Dense::new(16, 16, Init::GlorotNormal, &mut rng).unwrap())
        .add(LeakyRelu::new(0.01))
        .add(BatchNorm::new(16).unwrap())
        .add(Dropout::new(0.1, 1).unwrap())
        .add(Dense::new(16, 2, Init::GlorotUniform, &mut rng).unwrap());

    let config = TrainConfig::new()
        .with_epochs(120)
        .with_batch_size(12)
        .with_learning_rate(0.01)
        .with_patience(None);
    let history = fit(
        &mut network,
        &split.x_train,
        &y_train,
        &split.x_val,
        &y_val,
        &config,
    )
    .unwrap();

    assert_eq!(history.epochs_run(), 120);
    assert!(history.train_loss.iter().all(|l| l.is_finite()));
    assert!(history.val_loss.iter().all(|l| l.is_finite()));

    // The classes are well separated, so training must beat chance by a
    // wide margin.
    let first_loss = history.train_loss[0];
    let last_loss = *history.train_loss.last().unwrap();
    assert!(
        last_loss < first_loss,
        "train loss should fall: {} -> {}",
        first_loss,
        last_loss
    );
    let (val_loss, val_accuracy) = evaluate(&mut network, &split.x_val, &y_val).unwrap();
    assert!(val_loss.is_finite());
    assert!(
        val_accuracy > 0.7,
        "validation accuracy {} on separable data",
        val_accuracy
    );
}

#[test]
fn fitted_pipeline_scores_fresh_pairs() {
    let (images, audio, _) = synthetic_pairs(40);
    let (pipeline, _) =
        FeaturePipeline::fit(&images, &audio, &PcaConfig::new(3).with_seed(0)).unwrap();

    // "Test" inputs reuse the generator with a different size; the fitted
    // transform must accept them and produce the fitted width.
    let (test_images, test_audio, _) = synthetic_pairs(15);
    let transformed = pipeline.transform(&test_images, &test_audio).unwrap();
    assert_eq!(transformed.shape(), &[15, pipeline.n_features()]);
    assert!(transformed.iter().all(|v| v.is_finite()));
}

#[test]
fn metrics_agree_with_predictions() {
    let (images, audio, labels) = synthetic_pairs(45);
    let (_, features) =
        FeaturePipeline::fit(&images, &audio, &PcaConfig::new(3).with_seed(1)).unwrap();

    let mut rng = StdRng::seed_from_u64(5);
    let mut network = Network::new()
        .add(Dense::new(features.ncols(), 8, Init::GlorotNormal, &mut rng).unwrap())
        .add(LeakyRelu::new(0.01))
        .add(Dense::new(8, 2, Init::GlorotUniform, &mut rng).unwrap());

    let targets = one_hot(&labels);
    let config = TrainConfig::new()
        .with_epochs(80)
        .with_batch_size(9)
        .with_learning_rate(0.01)
        .with_patience(None);
    fit(&mut network, &features, &targets, &features, &targets, &config).unwrap();

    let predicted = network.predict(&features).unwrap();
    let actual: Vec<usize> = labels.iter().map(|&m| usize::from(m)).collect();
    let cm = confusion_matrix(&actual, &predicted, 2).unwrap();

    // The confusion matrix totals the sample count, and both derived
    // scores stay inside [0, 1].
    let total: usize = cm.iter().sum();
    assert_eq!(total, 45);
    for class in 0..2 {
        let p = precision(&cm, class).unwrap();
        let r = recall(&cm, class).unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert!((0.0..=1.0).contains(&r));
    }
}
