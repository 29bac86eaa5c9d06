use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Configuration for PCA fitting.
///
/// This struct provides a builder pattern for configuring the solver
/// instead of using many positional arguments.
///
/// # Example
/// ```
/// use avmatch::features::PcaConfig;
///
/// let config = PcaConfig::new(50)
///     .with_max_iter(500)
///     .with_seed(811);
/// ```
#[derive(Debug, Clone)]
pub struct PcaConfig {
    /// Number of principal components to extract.
    pub n_components: usize,
    /// Maximum power iterations per component.
    pub max_iter: usize,
    /// Relative eigenvalue convergence tolerance.
    pub tol: f32,
    /// Seed for the iteration start vectors.
    pub seed: u64,
}

impl PcaConfig {
    /// Create a configuration with solver defaults.
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            max_iter: 1000,
            tol: 1e-7,
            seed: 0,
        }
    }

    /// Set the maximum power iterations per component.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Set the start-vector seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit a PCA model with this configuration.
    ///
    /// # Errors
    /// See [`Pca::fit`].
    pub fn fit(&self, x: &Array2<f32>) -> crate::Result<Pca> {
        Pca::fit_with(x, self)
    }
}

/// Principal Component Analysis model.
///
/// Fitting extracts the leading eigenpairs of the sample covariance matrix
/// by power iteration with deflation, so the model needs only the number of
/// components actually requested. Projections are mean-centered before
/// being mapped onto the components.
///
/// # Example
/// ```
/// use avmatch::features::Pca;
/// use ndarray::Array2;
///
/// let x = Array2::from_shape_fn((20, 4), |(i, j)| (i * (j + 1)) as f32);
/// let pca = Pca::fit(&x, 2).unwrap();
/// let projected = pca.transform(&x).unwrap();
/// assert_eq!(projected.shape(), &[20, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct Pca {
    mean: Array1<f32>,
    /// Principal axes, one row per component.
    components: Array2<f32>,
    /// Covariance eigenvalue per component.
    explained_variance: Vec<f32>,
    /// Trace of the covariance matrix.
    total_variance: f32,
}

impl Pca {
    /// Fit a PCA model with default solver settings.
    ///
    /// # Arguments
    /// * `x` - Data matrix, one sample per row
    /// * `n_components` - Number of components to extract
    ///
    /// # Errors
    /// Returns an error if `x` is empty or contains non-finite values, or
    /// if `n_components` is zero or exceeds `min(samples, features)`.
    pub fn fit(x: &Array2<f32>, n_components: usize) -> crate::Result<Self> {
        Self::fit_with(x, &PcaConfig::new(n_components))
    }

    /// Fit a PCA model with an explicit configuration.
    pub fn fit_with(x: &Array2<f32>, config: &PcaConfig) -> crate::Result<Self> {
        let (n, d) = (x.nrows(), x.ncols());
        if n == 0 || d == 0 {
            return Err(crate::Error::EmptyInput("pca data"));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(crate::Error::NonFinite("pca data"));
        }
        let k = config.n_components;
        if k == 0 || k > n.min(d) {
            return Err(crate::Error::InvalidParameter {
                name: "n_components",
                value: k.to_string(),
                reason: format!("must be in 1..={} for a {}x{} matrix", n.min(d), n, d),
            });
        }

        let mean = x.sum_axis(Axis(0)) / n as f32;
        let centered = x - &mean;
        let mut cov = centered.t().dot(&centered) / n as f32;
        let total_variance = (0..d).map(|i| cov[(i, i)]).sum::<f32>();

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut found: Vec<Array1<f32>> = Vec::with_capacity(k);
        let mut explained_variance = Vec::with_capacity(k);

        for _ in 0..k {
            let (v, lambda) =
                leading_eigenpair(&cov, &found, &mut rng, config.max_iter, config.tol);
            // Deflate before searching for the next component.
            let v_col = v.clone().insert_axis(Axis(1));
            let outer = v_col.dot(&v_col.t());
            cov -= &(outer * lambda);
            explained_variance.push(lambda.max(0.0));
            found.push(v);
        }

        let mut components = Array2::<f32>::zeros((k, d));
        for (row, v) in found.iter().enumerate() {
            components.row_mut(row).assign(v);
        }

        Ok(Self {
            mean,
            components,
            explained_variance,
            total_variance,
        })
    }

    /// Project data onto the principal components.
    ///
    /// # Arguments
    /// * `x` - Data matrix with the same feature count the model was fit on
    ///
    /// # Returns
    /// Projected matrix of shape `(samples, n_components)`
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
        let centered = x - &self.mean;
        Ok(centered.dot(&self.components.t()))
    }

    /// Number of extracted components.
    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    /// Principal axes, one row per component.
    pub fn components(&self) -> &Array2<f32> {
        &self.components
    }

    /// Per-sample mean the model centers with.
    pub fn mean(&self) -> &Array1<f32> {
        &self.mean
    }

    /// Fraction of total variance captured by each component, in extraction
    /// order (descending variance).
    pub fn explained_variance_ratio(&self) -> Vec<f32> {
        if self.total_variance <= 0.0 {
            return vec![0.0; self.explained_variance.len()];
        }
        self.explained_variance
            .iter()
            .map(|ev| ev / self.total_variance)
            .collect()
    }

    /// Running total of [`Self::explained_variance_ratio`].
    pub fn cumulative_explained_variance(&self) -> Vec<f32> {
        let mut total = 0.0;
        self.explained_variance_ratio()
            .into_iter()
            .map(|r| {
                total += r;
                total
            })
            .collect()
    }
}

/// Power iteration for the leading eigenpair of a symmetric PSD matrix,
/// kept orthogonal to the already-extracted directions.
fn leading_eigenpair(
    cov: &Array2<f32>,
    found: &[Array1<f32>],
    rng: &mut StdRng,
    max_iter: usize,
    tol: f32,
) -> (Array1<f32>, f32) {
    let d = cov.nrows();
    let mut v = Array1::from_shape_fn(d, |_| rng.sample::<f32, _>(StandardNormal));
    orthogonalize(&mut v, found);
    if !renormalize(&mut v) {
        // Degenerate start vector: fall back to a basis direction.
        v.fill(0.0);
        v[0] = 1.0;
        orthogonalize(&mut v, found);
        renormalize(&mut v);
    }

    let mut lambda = 0.0f32;
    for _ in 0..max_iter {
        let mut w = cov.dot(&v);
        orthogonalize(&mut w, found);
        let norm = w.dot(&w).sqrt();
        if norm <= 1e-12 {
            // Remaining spectrum is numerically zero.
            return (v, 0.0);
        }
        v = w / norm;
        let change = (norm - lambda).abs();
        lambda = norm;
        if change <= tol * lambda.max(1.0) {
            break;
        }
    }

    let rayleigh = v.dot(&cov.dot(&v));
    (v, rayleigh)
}

/// Remove the projections of `v` onto every vector in `basis`.
fn orthogonalize(v: &mut Array1<f32>, basis: &[Array1<f32>]) {
    for b in basis {
        let proj = v.dot(b);
        *v -= &(b * proj);
    }
}

/// Scale `v` to unit norm; returns false when the norm is numerically zero.
fn renormalize(v: &mut Array1<f32>) -> bool {
    let norm = v.dot(v).sqrt();
    if norm <= 1e-12 {
        return false;
    }
    *v /= norm;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn line_data() -> Array2<f32> {
        // Points exactly on the line y = 2x: all variance along (1, 2).
        Array2::from_shape_fn((12, 2), |(i, j)| {
            let t = i as f32 - 5.5;
            if j == 0 {
                t
            } else {
                2.0 * t
            }
        })
    }

    #[test]
    fn first_component_captures_line() {
        let x = line_data();
        let pca = Pca::fit(&x, 2).unwrap();

        let ratio = pca.explained_variance_ratio();
        assert_abs_diff_eq!(ratio[0], 1.0, epsilon = 1e-4);
        assert!(ratio[1].abs() < 1e-4);

        // Component direction is (1, 2) / sqrt(5), up to sign.
        let c = pca.components().row(0);
        let expected = (1.0f32 / 5.0f32.sqrt(), 2.0 / 5.0f32.sqrt());
        assert_abs_diff_eq!(c[0].abs(), expected.0, epsilon = 1e-3);
        assert_abs_diff_eq!(c[1].abs(), expected.1, epsilon = 1e-3);
    }

    #[test]
    fn ratios_descend_and_bound() {
        let x = Array2::from_shape_fn((30, 5), |(i, j)| {
            ((i * 7 + j * 3) % 13) as f32 + (j as f32) * (i as f32) * 0.1
        });
        let pca = Pca::fit(&x, 4).unwrap();
        let ratio = pca.explained_variance_ratio();
        for pair in ratio.windows(2) {
            assert!(pair[0] >= pair[1] - 1e-3);
        }
        let total: f32 = ratio.iter().sum();
        assert!(total <= 1.0 + 1e-4);

        let cumulative = pca.cumulative_explained_variance();
        assert_abs_diff_eq!(cumulative[3], total, epsilon = 1e-6);
    }

    #[test]
    fn transform_shape_and_centering() {
        let x = line_data();
        let pca = Pca::fit(&x, 1).unwrap();
        let projected = pca.transform(&x).unwrap();
        assert_eq!(projected.shape(), &[12, 1]);

        // The mean point projects to the origin.
        let mean_row = pca.mean().clone().insert_axis(ndarray::Axis(0));
        let at_mean = pca.transform(&mean_row).unwrap();
        assert!(at_mean[(0, 0)].abs() < 1e-4);
    }

    #[test]
    fn rejects_bad_component_counts() {
        let x = Array2::<f32>::zeros((4, 3));
        assert!(Pca::fit(&x, 0).is_err());
        assert!(Pca::fit(&x, 4).is_err());
        assert!(Pca::fit(&x, 3).is_ok());
    }

    #[test]
    fn rejects_empty_and_nonfinite() {
        let empty = Array2::<f32>::zeros((0, 3));
        assert!(Pca::fit(&empty, 1).is_err());

        let mut x = Array2::<f32>::ones((4, 3));
        x[(2, 1)] = f32::INFINITY;
        assert!(matches!(Pca::fit(&x, 2), Err(crate::Error::NonFinite(_))));
    }

    #[test]
    fn transform_rejects_width_mismatch() {
        let x = array![[1.0f32, 2.0], [3.0, 4.0], [5.0, 7.0]];
        let pca = Pca::fit(&x, 1).unwrap();
        let wrong = Array2::<f32>::zeros((2, 3));
        assert!(matches!(
            pca.transform(&wrong),
            Err(crate::Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn components_are_orthonormal() {
        let x = Array2::from_shape_fn((25, 6), |(i, j)| ((i + 1) * (j + 2)) as f32 % 9.0);
        let pca = Pca::fit(&x, 3).unwrap();
        let c = pca.components();
        for i in 0..3 {
            let norm = c.row(i).dot(&c.row(i));
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-3);
            for j in 0..i {
                assert!(c.row(i).dot(&c.row(j)).abs() < 1e-3);
            }
        }
    }
}
