//! End-to-end match classifier training.
//!
//! Expects `spoken_train.npy`, `written_train.npy`, and `match_train.npy`
//! in the working directory; `spoken_test.npy`/`written_test.npy` are
//! scored when present. Writes `best_model.json`, `accuracy.png`, and
//! `loss.png`.

use avmatch::dataset::{MatchDataset, TestInputs};
use avmatch::features::{FeaturePipeline, PcaConfig};
use avmatch::loss::one_hot;
use avmatch::metrics::{class_counts, confusion_matrix, precision, recall};
use avmatch::nn::{BatchNorm, Dense, Dropout, Init, LeakyRelu, Network, Relu};
use avmatch::plot::plot_history;
use avmatch::split::train_validation_split;
use avmatch::train::{evaluate, fit, TrainConfig};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

const PCA_COMPONENTS: usize = 50;
const SPLIT_SEED: u64 = 811;
const NETWORK_SEED: u64 = 0;

fn main() {
    env_logger::init();
    info!("Match Classifier Training");

    // Load the paired training arrays.
    let dataset = MatchDataset::load_dir(".").unwrap();
    info!("Loaded {} paired samples", dataset.len());
    info!(
        "  - audio: {} sequences x {} channels",
        dataset.audio.len(),
        dataset.audio[0].ncols()
    );
    info!("  - images: {:?}", dataset.images.shape());

    let (negatives, positives) = class_counts(&dataset.labels);
    info!(
        "Class distribution: {} matches, {} non-matches",
        positives, negatives
    );

    // Feature engineering: PCA on pixels, summary statistics on audio,
    // standardized together.
    let pca_config = PcaConfig::new(PCA_COMPONENTS).with_seed(SPLIT_SEED);
    let (pipeline, features) =
        FeaturePipeline::fit(&dataset.images, &dataset.audio, &pca_config).unwrap();

    let captured = pipeline
        .pca()
        .cumulative_explained_variance()
        .last()
        .copied()
        .unwrap();
    info!(
        "PCA: {} components capture {:.4} of pixel variance",
        PCA_COMPONENTS, captured
    );
    info!("Combined feature matrix: {:?}", features.shape());

    // 90/10 split, then one-hot targets.
    let split = train_validation_split(&features, &dataset.labels, 0.1, SPLIT_SEED).unwrap();
    let y_train = one_hot(&split.y_train);
    let y_val = one_hot(&split.y_val);
    info!(
        "Split: {} train / {} validation",
        split.x_train.nrows(),
        split.x_val.nrows()
    );

    // The reference architecture: four hidden blocks with batch norm and
    // dropout, logits for two classes.
    let n_features = pipeline.n_features();
    let mut rng = StdRng::seed_from_u64(NETWORK_SEED);
    let mut network = Network::new()
        .add(Dense::new(n_features, 500, Init::GlorotNormal, &mut rng).unwrap())
        .add(LeakyRelu::new(0.3))
        .add(BatchNorm::new(500).unwrap())
        .add(Dropout::new(0.2, 1).unwrap())
        .add(Dense::new(500, 400, Init::GlorotUniform, &mut rng).unwrap())
        .add(LeakyRelu::new(0.01))
        .add(BatchNorm::new(400).unwrap())
        .add(Dropout::new(0.2, 2).unwrap())
        .add(Dense::new(400, 300, Init::GlorotUniform, &mut rng).unwrap())
        .add(LeakyRelu::new(0.01))
        .add(BatchNorm::new(300).unwrap())
        .add(Dropout::new(0.1, 3).unwrap())
        .add(Dense::new(300, 200, Init::GlorotNormal, &mut rng).unwrap())
        .add(Relu::new())
        .add(BatchNorm::new(200).unwrap())
        .add(Dropout::new(0.1, 4).unwrap())
        .add(Dense::new(200, 2, Init::GlorotUniform, &mut rng).unwrap());
    info!("Network: {} learnable values", network.num_parameters());

    let config = TrainConfig::new()
        .with_epochs(200)
        .with_batch_size(60)
        .with_learning_rate(1e-3)
        .with_patience(Some(100))
        .with_checkpoint("best_model.json")
        .with_seed(NETWORK_SEED);
    let history = fit(
        &mut network,
        &split.x_train,
        &y_train,
        &split.x_val,
        &y_val,
        &config,
    )
    .unwrap();
    info!(
        "Trained for {} epochs, best epoch {}",
        history.epochs_run(),
        history.best_epoch
    );

    // Validation performance.
    let (val_loss, val_accuracy) = evaluate(&mut network, &split.x_val, &y_val).unwrap();
    info!("Validation loss: {:.4}", val_loss);
    info!("Validation accuracy: {:.4}", val_accuracy);

    plot_history(&history, "accuracy.png", "loss.png").unwrap();
    info!("Curves written to accuracy.png and loss.png");

    // Confusion matrix and per-class precision/recall on the validation
    // split; the match class is rare, so accuracy alone overstates.
    let predicted = network.predict(&split.x_val).unwrap();
    let actual: Vec<usize> = split.y_val.iter().map(|&m| usize::from(m)).collect();
    let cm = confusion_matrix(&actual, &predicted, 2).unwrap();
    info!("Confusion matrix (rows = actual, cols = predicted):");
    info!("  [{:5} {:5}]", cm[(0, 0)], cm[(0, 1)]);
    info!("  [{:5} {:5}]", cm[(1, 0)], cm[(1, 1)]);
    for class in 0..2 {
        info!(
            "Class {}: precision {:.4}, recall {:.4}",
            class,
            precision(&cm, class).unwrap(),
            recall(&cm, class).unwrap()
        );
    }

    // Score the unlabeled test pairs with the fitted pipeline when present.
    match TestInputs::load_dir(".") {
        Ok(test) => {
            let test_features = pipeline.transform(&test.images, &test.audio).unwrap();
            let test_predicted = network.predict(&test_features).unwrap();
            let matches = test_predicted.iter().filter(|&&c| c == 1).count();
            info!(
                "Test pairs: {} of {} predicted as matches",
                matches,
                test_predicted.len()
            );
        }
        Err(e) => info!("Skipping test pairs: {}", e),
    }
}
