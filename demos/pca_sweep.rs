//! PCA component-count sweep.
//!
//! Reports how much pixel variance each candidate component count keeps,
//! the experiment behind the pipeline's choice of 50 components.

use avmatch::dataset::MatchDataset;
use avmatch::features::PcaConfig;
use log::info;

fn main() {
    env_logger::init();
    info!("PCA Component Sweep");

    let dataset = MatchDataset::load_dir(".").unwrap();
    info!("Pixel matrix: {:?}", dataset.images.shape());

    for n_components in [5, 10, 15, 20, 25, 30, 35, 40, 50, 60, 70, 80] {
        let pca = PcaConfig::new(n_components)
            .with_seed(811)
            .fit(&dataset.images)
            .unwrap();
        let variance = pca.cumulative_explained_variance().last().copied().unwrap();
        info!(
            "For {} components variance is equal to {:.4}",
            n_components, variance
        );
    }

    // The full cumulative curve for the largest candidate, at a stride.
    let pca = PcaConfig::new(80)
        .with_seed(811)
        .fit(&dataset.images)
        .unwrap();
    for (i, v) in pca
        .cumulative_explained_variance()
        .iter()
        .enumerate()
        .step_by(10)
    {
        info!("  cumulative variance after {} components: {:.4}", i + 1, v);
    }
}
