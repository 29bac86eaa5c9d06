use crate::nn::sigmoid;
use ndarray::{Array1, Array2};

/// One-hot encode boolean match labels into two classes.
///
/// Class 0 is "no match", class 1 is "match", so `false` maps to `[1, 0]`
/// and `true` to `[0, 1]`.
///
/// # Example
/// ```
/// use avmatch::loss::one_hot;
/// use ndarray::array;
///
/// let y = one_hot(&array![true, false]);
/// assert_eq!(y, array![[0.0f32, 1.0], [1.0, 0.0]]);
/// ```
pub fn one_hot(labels: &Array1<bool>) -> Array2<f32> {
    let mut out = Array2::<f32>::zeros((labels.len(), 2));
    for (i, &label) in labels.iter().enumerate() {
        out[(i, usize::from(label))] = 1.0;
    }
    out
}

/// Binary cross-entropy over logits, mean-reduced.
///
/// The sigmoid is fused into the loss: per element the stable form
/// `max(z, 0) - z y + ln(1 + e^-|z|)` is averaged, and the returned
/// gradient with respect to the logits is `(sigmoid(z) - y) / count`.
///
/// # Arguments
/// * `logits` - Raw network outputs, `(batch, classes)`
/// * `targets` - One-hot targets of the same shape
///
/// # Returns
/// The scalar loss and the logit gradient.
///
/// # Errors
/// Returns `ShapeMismatch` when the shapes differ and `EmptyInput` on an
/// empty batch.
pub fn bce_with_logits(
    logits: &Array2<f32>,
    targets: &Array2<f32>,
) -> crate::Result<(f32, Array2<f32>)> {
    if logits.raw_dim() != targets.raw_dim() {
        return Err(crate::Error::ShapeMismatch {
            expected: format!("{:?} targets", logits.shape()),
            got: format!("{:?} targets", targets.shape()),
        });
    }
    let count = logits.len();
    if count == 0 {
        return Err(crate::Error::EmptyInput("loss batch"));
    }

    let mut total = 0.0f32;
    for (&z, &y) in logits.iter().zip(targets.iter()) {
        total += z.max(0.0) - z * y + (-z.abs()).exp().ln_1p();
    }
    let loss = total / count as f32;

    let scale = 1.0 / count as f32;
    let mut grad = Array2::<f32>::zeros(logits.raw_dim());
    for ((g, &z), &y) in grad.iter_mut().zip(logits.iter()).zip(targets.iter()) {
        *g = (sigmoid(z) - y) * scale;
    }

    Ok((loss, grad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn one_hot_maps_classes() {
        let y = one_hot(&array![false, true, true]);
        assert_eq!(y.shape(), &[3, 2]);
        assert_eq!(y[(0, 0)], 1.0);
        assert_eq!(y[(0, 1)], 0.0);
        assert_eq!(y[(1, 1)], 1.0);
        assert_eq!(y[(2, 1)], 1.0);
    }

    #[test]
    fn loss_at_zero_logit_is_ln_two() {
        let (loss, grad) = bce_with_logits(&array![[0.0f32]], &array![[1.0f32]]).unwrap();
        assert_abs_diff_eq!(loss, std::f32::consts::LN_2, epsilon = 1e-6);
        assert_abs_diff_eq!(grad[(0, 0)], -0.5, epsilon = 1e-6);
    }

    #[test]
    fn confident_correct_prediction_costs_little() {
        let (loss, _) = bce_with_logits(&array![[10.0f32, -10.0]], &array![[1.0f32, 0.0]]).unwrap();
        assert!(loss < 1e-3);

        let (wrong, _) =
            bce_with_logits(&array![[-10.0f32, 10.0]], &array![[1.0f32, 0.0]]).unwrap();
        assert!(wrong > 5.0);
    }

    #[test]
    fn stable_form_matches_direct_formula() {
        let z = array![[0.7f32, -1.3], [2.1, 0.0]];
        let y = array![[1.0f32, 0.0], [0.0, 1.0]];
        let (loss, _) = bce_with_logits(&z, &y).unwrap();

        let mut direct = 0.0f32;
        for (&zi, &yi) in z.iter().zip(y.iter()) {
            let p = 1.0 / (1.0 + (-zi).exp());
            direct += -(yi * p.ln() + (1.0 - yi) * (1.0 - p).ln());
        }
        direct /= 4.0;
        assert_abs_diff_eq!(loss, direct, epsilon = 1e-5);
    }

    #[test]
    fn gradient_points_toward_targets() {
        let z = array![[0.0f32, 0.0]];
        let y = array![[1.0f32, 0.0]];
        let (_, grad) = bce_with_logits(&z, &y).unwrap();
        // Raising the matched logit lowers the loss, so its gradient is
        // negative; the unmatched logit's is positive.
        assert!(grad[(0, 0)] < 0.0);
        assert!(grad[(0, 1)] > 0.0);
    }

    #[test]
    fn rejects_shape_mismatch_and_empty() {
        let z = Array2::<f32>::zeros((2, 2));
        let y = Array2::<f32>::zeros((2, 3));
        assert!(bce_with_logits(&z, &y).is_err());

        let empty = Array2::<f32>::zeros((0, 2));
        assert!(bce_with_logits(&empty, &empty).is_err());
    }
}
