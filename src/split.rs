use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A train/validation partition of paired features and labels.
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f32>,
    pub x_val: Array2<f32>,
    pub y_train: Array1<bool>,
    pub y_val: Array1<bool>,
}

/// Split paired features and labels into train and validation sets.
///
/// Indices are shuffled with a seeded RNG, then the first
/// `ceil(n * val_fraction)` samples become the validation set.
///
/// # Arguments
/// * `features` - Feature matrix, one sample per row
/// * `labels` - Match labels, one per row
/// * `val_fraction` - Fraction of samples held out, in `(0, 1)`
/// * `seed` - Shuffle seed
///
/// # Errors
/// Returns `ShapeMismatch` when features and labels disagree on length,
/// `EmptyInput` on an empty input, and `InvalidParameter` when the fraction
/// leaves either side empty.
///
/// # Example
/// ```
/// use avmatch::split::train_validation_split;
/// use ndarray::{Array1, Array2};
///
/// let x = Array2::from_shape_fn((20, 3), |(i, j)| (i + j) as f32);
/// let y = Array1::from_shape_fn(20, |i| i % 2 == 0);
/// let split = train_validation_split(&x, &y, 0.1, 811).unwrap();
/// assert_eq!(split.x_val.nrows(), 2);
/// assert_eq!(split.x_train.nrows(), 18);
/// ```
pub fn train_validation_split(
    features: &Array2<f32>,
    labels: &Array1<bool>,
    val_fraction: f32,
    seed: u64,
) -> crate::Result<Split> {
    let n = features.nrows();
    if n == 0 {
        return Err(crate::Error::EmptyInput("split data"));
    }
    if labels.len() != n {
        return Err(crate::Error::ShapeMismatch {
            expected: format!("{} labels", n),
            got: format!("{} labels", labels.len()),
        });
    }
    if !(0.0..=1.0).contains(&val_fraction) || !val_fraction.is_finite() {
        return Err(crate::Error::InvalidParameter {
            name: "val_fraction",
            value: val_fraction.to_string(),
            reason: "must lie in (0, 1)".to_string(),
        });
    }

    let n_val = (n as f32 * val_fraction).ceil() as usize;
    if n_val == 0 || n_val >= n {
        return Err(crate::Error::InvalidParameter {
            name: "val_fraction",
            value: val_fraction.to_string(),
            reason: format!("leaves an empty side for {} samples", n),
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (val_idx, train_idx) = indices.split_at(n_val);

    Ok(Split {
        x_train: features.select(Axis(0), train_idx),
        x_val: features.select(Axis(0), val_idx),
        y_train: labels.select(Axis(0), train_idx),
        y_val: labels.select(Axis(0), val_idx),
    })
}
