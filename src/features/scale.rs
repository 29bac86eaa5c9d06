use ndarray::{Array1, Array2, Axis};

/// Column-wise standardization to zero mean and unit variance.
///
/// Fitted on training data and reused for validation/test data so that all
/// splits see the identical transform. Columns with zero variance are left
/// unscaled (scale 1.0) rather than dividing by zero.
///
/// # Example
/// ```
/// use avmatch::features::StandardScaler;
/// use ndarray::array;
///
/// let x = array![[1.0f32, 10.0], [3.0, 10.0], [5.0, 10.0]];
/// let (scaler, z) = StandardScaler::fit_transform(&x).unwrap();
/// assert!(z.column(0).sum().abs() < 1e-5);
/// let more = scaler.transform(&array![[3.0f32, 10.0]]).unwrap();
/// assert!(more[(0, 0)].abs() < 1e-5);
/// ```
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f32>,
    scale: Array1<f32>,
}

impl StandardScaler {
    /// Compute per-column mean and standard deviation (ddof = 0).
    ///
    /// # Errors
    /// Returns `EmptyInput` when `x` has no rows or columns, and
    /// `NonFinite` on NaN/Inf values.
    pub fn fit(x: &Array2<f32>) -> crate::Result<Self> {
        let (n, d) = (x.nrows(), x.ncols());
        if n == 0 || d == 0 {
            return Err(crate::Error::EmptyInput("scaler data"));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(crate::Error::NonFinite("scaler data"));
        }

        let mean = x.sum_axis(Axis(0)) / n as f32;
        let centered = x - &mean;
        let var = centered.mapv(|v| v * v).sum_axis(Axis(0)) / n as f32;
        let scale = var.mapv(|v| {
            let s = v.sqrt();
            if s > 0.0 {
                s
            } else {
                1.0
            }
        });

        Ok(Self { mean, scale })
    }

    /// Standardize columns with the fitted statistics.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the column count differs from the fit data.
    pub fn transform(&self, x: &Array2<f32>) -> crate::Result<Array2<f32>> {
        if x.ncols() != self.mean.len() {
            return Err(crate::Error::ShapeMismatch {
                expected: format!("{} features", self.mean.len()),
                got: format!("{} features", x.ncols()),
            });
        }
        Ok((x - &self.mean) / &self.scale)
    }

    /// Fit on `x` and return both the scaler and the standardized data.
    pub fn fit_transform(x: &Array2<f32>) -> crate::Result<(Self, Array2<f32>)> {
        let scaler = Self::fit(x)?;
        let transformed = scaler.transform(x)?;
        Ok((scaler, transformed))
    }

    /// Per-column means.
    pub fn mean(&self) -> &Array1<f32> {
        &self.mean
    }

    /// Per-column scales (standard deviations, 1.0 for constant columns).
    pub fn scale(&self) -> &Array1<f32> {
        &self.scale
    }
}
