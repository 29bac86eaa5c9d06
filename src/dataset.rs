use ndarray::{Array1, Array2, Array3};
use ndarray_npy::read_npy;
use std::path::Path;

/// File name of the training audio features array.
pub const SPOKEN_TRAIN: &str = "spoken_train.npy";
/// File name of the test audio features array.
pub const SPOKEN_TEST: &str = "spoken_test.npy";
/// File name of the training image pixels array.
pub const WRITTEN_TRAIN: &str = "written_train.npy";
/// File name of the test image pixels array.
pub const WRITTEN_TEST: &str = "written_test.npy";
/// File name of the training match labels array.
pub const MATCH_TRAIN: &str = "match_train.npy";

/// Labeled training data: paired audio sequences, image pixels, and match labels.
///
/// Each audio sample is a `(frames, channels)` matrix of precomputed frame
/// features (13 channels for the spoken-digit data). Image samples are
/// flattened pixel vectors scaled to `[0, 1]`. `labels[i]` is `true` when
/// `audio[i]` and the image in row `i` represent the same digit.
#[derive(Debug, Clone)]
pub struct MatchDataset {
    /// Per-sample audio frame sequences, `(frames_i, channels)` each.
    pub audio: Vec<Array2<f32>>,
    /// Image pixel matrix, `(samples, pixels)`, values in `[0, 1]`.
    pub images: Array2<f32>,
    /// Match indicator per sample.
    pub labels: Array1<bool>,
}

/// Unlabeled test data: paired audio sequences and image pixels.
#[derive(Debug, Clone)]
pub struct TestInputs {
    /// Per-sample audio frame sequences.
    pub audio: Vec<Array2<f32>>,
    /// Image pixel matrix, values in `[0, 1]`.
    pub images: Array2<f32>,
}

impl MatchDataset {
    /// Load `spoken_train.npy`, `written_train.npy`, and `match_train.npy`
    /// from a directory and validate that the arrays pair up.
    ///
    /// # Errors
    /// Returns an error if a file is missing or unreadable, if the sample
    /// counts disagree, or if any array contains non-finite values.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> crate::Result<Self> {
        let dir = dir.as_ref();
        let audio = load_sequences(&dir.join(SPOKEN_TRAIN))?;
        let images = load_pixels(&dir.join(WRITTEN_TRAIN))?;
        let labels = load_labels(&dir.join(MATCH_TRAIN))?;

        let dataset = Self {
            audio,
            images,
            labels,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Number of paired samples.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the dataset holds no samples.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Check pairing and content invariants.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the audio, image, and label sample counts
    /// disagree or the audio channel count is inconsistent, `EmptyInput` on
    /// an empty dataset, and `NonFinite` on NaN/Inf values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.labels.is_empty() {
            return Err(crate::Error::EmptyInput("dataset"));
        }
        let n = self.labels.len();
        if self.audio.len() != n || self.images.nrows() != n {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{} paired samples", n),
                got: format!(
                    "{} audio, {} images, {} labels",
                    self.audio.len(),
                    self.images.nrows(),
                    n
                ),
            });
        }
        validate_sequences(&self.audio)?;
        if self.images.iter().any(|v| !v.is_finite()) {
            return Err(crate::Error::NonFinite("image pixels"));
        }
        Ok(())
    }
}

impl TestInputs {
    /// Load `spoken_test.npy` and `written_test.npy` from a directory.
    ///
    /// # Errors
    /// Returns an error if a file is missing or unreadable, or if the audio
    /// and image sample counts disagree.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> crate::Result<Self> {
        let dir = dir.as_ref();
        let audio = load_sequences(&dir.join(SPOKEN_TEST))?;
        let images = load_pixels(&dir.join(WRITTEN_TEST))?;

        if audio.len() != images.nrows() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{} audio samples", images.nrows()),
                got: format!("{} audio samples", audio.len()),
            });
        }
        validate_sequences(&audio)?;
        Ok(Self { audio, images })
    }

    /// Number of paired samples.
    pub fn len(&self) -> usize {
        self.images.nrows()
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.images.nrows() == 0
    }
}

/// Scale raw pixel values to `[0, 1]` by dividing by 255.
///
/// [`MatchDataset::load_dir`] already applies this when the file stores
/// integer pixels; use this for float arrays that hold raw 0..=255 values.
pub fn normalize_pixels(pixels: &Array2<f32>) -> Array2<f32> {
    pixels.mapv(|v| v / 255.0)
}

/// Load a pixel matrix, scaling integer storage to `[0, 1]`.
///
/// Tries `u8` first (the canonical storage for digit images), then falls
/// back to `f32` and `f64`, which are taken as already scaled.
fn load_pixels(path: &Path) -> crate::Result<Array2<f32>> {
    if let Ok(a) = read_npy::<_, Array2<u8>>(path) {
        return Ok(a.mapv(|v| f32::from(v) / 255.0));
    }
    match read_npy::<_, Array2<f32>>(path) {
        Ok(a) => Ok(a),
        Err(first) => match read_npy::<_, Array2<f64>>(path) {
            Ok(a) => Ok(a.mapv(|v| v as f32)),
            Err(_) => Err(first.into()),
        },
    }
}

/// Load a `(samples, frames, channels)` array and unpack it into per-sample
/// frame matrices.
fn load_sequences(path: &Path) -> crate::Result<Vec<Array2<f32>>> {
    let cube: Array3<f32> = match read_npy::<_, Array3<f32>>(path) {
        Ok(a) => a,
        Err(first) => match read_npy::<_, Array3<f64>>(path) {
            Ok(a) => a.mapv(|v| v as f32),
            Err(_) => return Err(first.into()),
        },
    };
    Ok(cube.outer_iter().map(|sample| sample.to_owned()).collect())
}

/// Load a boolean label vector, with a `u8` fallback (`0` = false).
fn load_labels(path: &Path) -> crate::Result<Array1<bool>> {
    match read_npy::<_, Array1<bool>>(path) {
        Ok(a) => Ok(a),
        Err(first) => match read_npy::<_, Array1<u8>>(path) {
            Ok(a) => Ok(a.mapv(|v| v != 0)),
            Err(_) => Err(first.into()),
        },
    }
}

/// Check that every sequence has the same channel count, at least one
/// frame, and finite values.
fn validate_sequences(sequences: &[Array2<f32>]) -> crate::Result<()> {
    let channels = match sequences.first() {
        Some(s) => s.ncols(),
        None => return Ok(()),
    };
    for seq in sequences {
        if seq.nrows() == 0 {
            return Err(crate::Error::EmptyInput("audio frame sequence"));
        }
        if seq.ncols() != channels {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{} audio channels", channels),
                got: format!("{} audio channels", seq.ncols()),
            });
        }
        if seq.iter().any(|v| !v.is_finite()) {
            return Err(crate::Error::NonFinite("audio frames"));
        }
    }
    Ok(())
}
