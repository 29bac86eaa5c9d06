//! Feature engineering: PCA on pixels, summary statistics on audio frames,
//! standardization, and the combined fit/transform pipeline.

mod pca;
mod scale;
mod summary;

pub use pca::{Pca, PcaConfig};
pub use scale::StandardScaler;
pub use summary::{summarize, summarize_batch, SummaryStat, DEFAULT_STATS};

use ndarray::{Array2, Axis};

/// Concatenate two feature matrices column-wise.
///
/// # Errors
/// Returns `ShapeMismatch` when the row counts differ.
pub fn hstack(left: &Array2<f32>, right: &Array2<f32>) -> crate::Result<Array2<f32>> {
    if left.nrows() != right.nrows() {
        return Err(crate::Error::ShapeMismatch {
            expected: format!("{} rows", left.nrows()),
            got: format!("{} rows", right.nrows()),
        });
    }
    ndarray::concatenate(Axis(1), &[left.view(), right.view()]).map_err(|e| {
        crate::Error::ShapeMismatch {
            expected: "concatenable feature blocks".to_string(),
            got: e.to_string(),
        }
    })
}

/// The full feature transform: PCA-reduced pixels and summarized audio
/// frames, concatenated and standardized.
///
/// Fit once on training pairs; the fitted pipeline applies the identical
/// transform to validation or test pairs.
///
/// # Example
/// ```
/// use avmatch::features::{FeaturePipeline, PcaConfig};
/// use ndarray::Array2;
///
/// let images = Array2::from_shape_fn((10, 6), |(i, j)| ((i + 1) * (j + 1)) as f32 % 5.0);
/// let audio: Vec<Array2<f32>> = (0..10)
///     .map(|i| Array2::from_elem((4, 2), i as f32))
///     .collect();
///
/// let (pipeline, features) = FeaturePipeline::fit(&images, &audio, &PcaConfig::new(3)).unwrap();
/// assert_eq!(features.shape(), &[10, 3 + 4 * 2]);
/// let again = pipeline.transform(&images, &audio).unwrap();
/// assert_eq!(again.shape(), features.shape());
/// ```
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    pca: Pca,
    scaler: StandardScaler,
    stats: Vec<SummaryStat>,
}

impl FeaturePipeline {
    /// Fit the pipeline on training pairs and return the transformed
    /// training features.
    ///
    /// # Arguments
    /// * `images` - Pixel matrix, one sample per row, values in `[0, 1]`
    /// * `audio` - Per-sample frame sequences
    /// * `pca_config` - PCA solver configuration
    ///
    /// # Errors
    /// Propagates PCA, summary, and scaler errors; returns `ShapeMismatch`
    /// when image and audio sample counts differ.
    pub fn fit(
        images: &Array2<f32>,
        audio: &[Array2<f32>],
        pca_config: &PcaConfig,
    ) -> crate::Result<(Self, Array2<f32>)> {
        if images.nrows() != audio.len() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{} image rows", audio.len()),
                got: format!("{} image rows", images.nrows()),
            });
        }

        let pca = pca_config.fit(images)?;
        let projected = pca.transform(images)?;
        let summarized = summarize_batch(audio, &DEFAULT_STATS)?;
        let combined = hstack(&projected, &summarized)?;
        let (scaler, transformed) = StandardScaler::fit_transform(&combined)?;

        Ok((
            Self {
                pca,
                scaler,
                stats: DEFAULT_STATS.to_vec(),
            },
            transformed,
        ))
    }

    /// Apply the fitted transform to new pairs.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` when sample counts or feature widths differ
    /// from the fit data.
    pub fn transform(
        &self,
        images: &Array2<f32>,
        audio: &[Array2<f32>],
    ) -> crate::Result<Array2<f32>> {
        if images.nrows() != audio.len() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{} image rows", audio.len()),
                got: format!("{} image rows", images.nrows()),
            });
        }
        let projected = self.pca.transform(images)?;
        let summarized = summarize_batch(audio, &self.stats)?;
        let combined = hstack(&projected, &summarized)?;
        self.scaler.transform(&combined)
    }

    /// The fitted PCA model.
    pub fn pca(&self) -> &Pca {
        &self.pca
    }

    /// The fitted standardizer.
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Width of the combined feature vector.
    pub fn n_features(&self) -> usize {
        self.scaler.mean().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn hstack_concatenates_columns() {
        let a = array![[1.0f32, 2.0], [3.0, 4.0]];
        let b = array![[5.0f32], [6.0]];
        let out = hstack(&a, &b).unwrap();
        assert_eq!(out.shape(), &[2, 3]);
        assert_eq!(out[(0, 2)], 5.0);
        assert_eq!(out[(1, 0)], 3.0);
    }

    #[test]
    fn hstack_rejects_row_mismatch() {
        let a = Array2::<f32>::zeros((2, 2));
        let b = Array2::<f32>::zeros((3, 1));
        assert!(matches!(
            hstack(&a, &b),
            Err(crate::Error::ShapeMismatch { .. })
        ));
    }

    fn toy_pairs(n: usize) -> (Array2<f32>, Vec<Array2<f32>>) {
        let images = Array2::from_shape_fn((n, 5), |(i, j)| ((i * 3 + j * 7) % 11) as f32);
        let audio = (0..n)
            .map(|i| Array2::from_shape_fn((3 + i % 2, 2), |(t, c)| (i + t + c) as f32))
            .collect();
        (images, audio)
    }

    #[test]
    fn pipeline_width_is_pca_plus_summaries() {
        let (images, audio) = toy_pairs(8);
        let (pipeline, features) =
            FeaturePipeline::fit(&images, &audio, &PcaConfig::new(2)).unwrap();
        // 2 PCA dims + 4 stats x 2 channels
        assert_eq!(pipeline.n_features(), 10);
        assert_eq!(features.shape(), &[8, 10]);
    }

    #[test]
    fn transform_matches_fit_transform_on_train() {
        let (images, audio) = toy_pairs(8);
        let (pipeline, features) =
            FeaturePipeline::fit(&images, &audio, &PcaConfig::new(2)).unwrap();
        let again = pipeline.transform(&images, &audio).unwrap();
        for (a, b) in features.iter().zip(again.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn fit_rejects_count_mismatch() {
        let (images, mut audio) = toy_pairs(8);
        audio.pop();
        assert!(matches!(
            FeaturePipeline::fit(&images, &audio, &PcaConfig::new(2)),
            Err(crate::Error::ShapeMismatch { .. })
        ));
    }
}
