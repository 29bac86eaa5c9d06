use ndarray::{Array1, Array2};

/// Index of the largest value per row, first index on ties.
pub fn argmax_rows(scores: &Array2<f32>) -> Vec<usize> {
    scores
        .outer_iter()
        .map(|row| {
            let mut best = 0usize;
            let mut best_value = f32::NEG_INFINITY;
            for (i, &v) in row.iter().enumerate() {
                if v > best_value {
                    best = i;
                    best_value = v;
                }
            }
            best
        })
        .collect()
}

/// Fraction of predictions that equal the true class.
///
/// # Errors
/// Returns `ShapeMismatch` on length disagreement and `EmptyInput` when
/// there are no samples.
pub fn accuracy(predicted: &[usize], actual: &[usize]) -> crate::Result<f32> {
    if predicted.len() != actual.len() {
        return Err(crate::Error::ShapeMismatch {
            expected: format!("{} predictions", actual.len()),
            got: format!("{} predictions", predicted.len()),
        });
    }
    if actual.is_empty() {
        return Err(crate::Error::EmptyInput("accuracy samples"));
    }
    let correct = predicted
        .iter()
        .zip(actual.iter())
        .filter(|(p, a)| p == a)
        .count();
    Ok(correct as f32 / actual.len() as f32)
}

/// Confusion matrix with true classes on rows and predicted classes on
/// columns.
///
/// # Errors
/// Returns `ShapeMismatch` on length disagreement, `EmptyInput` with no
/// samples, and `InvalidParameter` when a class index falls outside
/// `0..n_classes`.
pub fn confusion_matrix(
    actual: &[usize],
    predicted: &[usize],
    n_classes: usize,
) -> crate::Result<Array2<usize>> {
    if predicted.len() != actual.len() {
        return Err(crate::Error::ShapeMismatch {
            expected: format!("{} predictions", actual.len()),
            got: format!("{} predictions", predicted.len()),
        });
    }
    if actual.is_empty() {
        return Err(crate::Error::EmptyInput("confusion matrix samples"));
    }

    let mut matrix = Array2::<usize>::zeros((n_classes, n_classes));
    for (&a, &p) in actual.iter().zip(predicted.iter()) {
        if a >= n_classes || p >= n_classes {
            return Err(crate::Error::InvalidParameter {
                name: "class",
                value: a.max(p).to_string(),
                reason: format!("class index outside 0..{}", n_classes),
            });
        }
        matrix[(a, p)] += 1;
    }
    Ok(matrix)
}

/// Precision for one class: true positives over predicted positives.
/// Zero when the class was never predicted.
///
/// # Errors
/// Returns `InvalidParameter` when `class` is outside the matrix.
pub fn precision(matrix: &Array2<usize>, class: usize) -> crate::Result<f32> {
    check_class(matrix, class)?;
    let predicted_positives: usize = matrix.column(class).sum();
    if predicted_positives == 0 {
        return Ok(0.0);
    }
    Ok(matrix[(class, class)] as f32 / predicted_positives as f32)
}

/// Recall for one class: true positives over actual positives.
/// Zero when the class never occurs.
///
/// # Errors
/// Returns `InvalidParameter` when `class` is outside the matrix.
pub fn recall(matrix: &Array2<usize>, class: usize) -> crate::Result<f32> {
    check_class(matrix, class)?;
    let actual_positives: usize = matrix.row(class).sum();
    if actual_positives == 0 {
        return Ok(0.0);
    }
    Ok(matrix[(class, class)] as f32 / actual_positives as f32)
}

/// Count of negative and positive labels, for the imbalance report.
pub fn class_counts(labels: &Array1<bool>) -> (usize, usize) {
    let positives = labels.iter().filter(|&&l| l).count();
    (labels.len() - positives, positives)
}

fn check_class(matrix: &Array2<usize>, class: usize) -> crate::Result<()> {
    if class >= matrix.nrows() || matrix.nrows() != matrix.ncols() {
        return Err(crate::Error::InvalidParameter {
            name: "class",
            value: class.to_string(),
            reason: format!("outside a {}x{} confusion matrix", matrix.nrows(), matrix.ncols()),
        });
    }
    Ok(())
}
