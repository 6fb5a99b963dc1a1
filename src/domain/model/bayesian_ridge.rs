//! Bayesian ridge regression
//!
//! Evidence maximisation over the noise precision `alpha` and weight
//! precision `lambda`, with gamma hyperpriors on both. The data is centered
//! so the intercept is recovered from the offsets after fitting.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::DomainError;

const JACOBI_MAX_SWEEPS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianRidgeConfig {
    pub max_iter: usize,
    pub tol: f64,
    pub alpha_1: f64,
    pub alpha_2: f64,
    pub lambda_1: f64,
    pub lambda_2: f64,
}

impl Default for BayesianRidgeConfig {
    fn default() -> Self {
        Self {
            max_iter: 300,
            tol: 1e-3,
            alpha_1: 1e-6,
            alpha_2: 1e-6,
            lambda_1: 1e-6,
            lambda_2: 1e-6,
        }
    }
}

impl BayesianRidgeConfig {
    fn validate(&self) -> Result<(), DomainError> {
        if self.max_iter == 0 {
            return Err(DomainError::configuration("max_iter must be at least 1"));
        }

        for (name, value) in [
            ("tol", self.tol),
            ("alpha_1", self.alpha_1),
            ("alpha_2", self.alpha_2),
            ("lambda_1", self.lambda_1),
            ("lambda_2", self.lambda_2),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::configuration(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// A fitted Bayesian ridge model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianRidge {
    config: BayesianRidgeConfig,
    coef: Vec<f64>,
    intercept: f64,
    alpha: f64,
    lambda: f64,
    n_iter: usize,
}

impl BayesianRidge {
    pub fn fit(
        config: &BayesianRidgeConfig,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<Self, DomainError> {
        config.validate()?;

        let (n_samples, n_features) = x.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(DomainError::training(format!(
                "Cannot fit on a {}x{} matrix",
                n_samples, n_features
            )));
        }

        if y.len() != n_samples {
            return Err(DomainError::training(format!(
                "Design matrix has {} rows but target has {}",
                n_samples,
                y.len()
            )));
        }

        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(DomainError::training("Training data contains non-finite values"));
        }

        let x_offset = x
            .mean_axis(Axis(0))
            .ok_or_else(|| DomainError::training("Cannot center an empty matrix"))?;
        let y_offset = y.sum() / n_samples as f64;
        let xc = &x - &x_offset;
        let yc = y.mapv(|v| v - y_offset);

        let xty = xc.t().dot(&yc);
        let (eigen_vals, eigen_vecs) = symmetric_eigen(&xc.t().dot(&xc));
        let n = n_samples as f64;

        let mut alpha = 1.0 / (yc.mapv(|v| v * v).sum() / n + f64::EPSILON);
        let mut lambda = 1.0;
        let mut coef_old: Option<Array1<f64>> = None;
        let mut n_iter = 0;

        for iter in 0..config.max_iter {
            n_iter = iter + 1;
            let coef = solve_coef(&eigen_vals, &eigen_vecs, &xty, lambda / alpha);
            let residual = &yc - &xc.dot(&coef);
            let rmse = residual.mapv(|v| v * v).sum();

            let gamma: f64 = eigen_vals
                .iter()
                .map(|e| alpha * e / (lambda + alpha * e))
                .sum();
            lambda = (gamma + 2.0 * config.lambda_1)
                / (coef.mapv(|c| c * c).sum() + 2.0 * config.lambda_2);
            alpha = (n - gamma + 2.0 * config.alpha_1) / (rmse + 2.0 * config.alpha_2);

            if !alpha.is_finite() || !lambda.is_finite() {
                return Err(DomainError::training(
                    "Bayesian ridge precision estimates diverged",
                ));
            }

            if let Some(old) = &coef_old {
                let change: f64 = (old - &coef).mapv(f64::abs).sum();
                if change < config.tol {
                    debug!(iterations = n_iter, "Bayesian ridge converged");
                    break;
                }
            }
            coef_old = Some(coef);
        }

        let coef = solve_coef(&eigen_vals, &eigen_vecs, &xty, lambda / alpha);
        let intercept = y_offset - x_offset.dot(&coef);

        Ok(Self {
            config: config.clone(),
            coef: coef.to_vec(),
            intercept,
            alpha,
            lambda,
            n_iter,
        })
    }

    pub fn n_features(&self) -> usize {
        self.coef.len()
    }

    pub fn coef(&self) -> &[f64] {
        &self.coef
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn config(&self) -> &BayesianRidgeConfig {
        &self.config
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, DomainError> {
        if x.ncols() != self.coef.len() {
            return Err(DomainError::schema(format!(
                "Model expects {} features, got {}",
                self.coef.len(),
                x.ncols()
            )));
        }

        let coef = ArrayView1::from(&self.coef[..]);
        Ok(x.dot(&coef) + self.intercept)
    }
}

/// `V diag(1 / (e + ridge)) Vᵀ Xᵀy`
fn solve_coef(
    eigen_vals: &Array1<f64>,
    eigen_vecs: &Array2<f64>,
    xty: &Array1<f64>,
    ridge: f64,
) -> Array1<f64> {
    let projected = eigen_vecs.t().dot(xty);
    let scaled = Array1::from_iter(
        projected
            .iter()
            .zip(eigen_vals.iter())
            .map(|(p, e)| p / (e + ridge)),
    );
    eigen_vecs.dot(&scaled)
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix
///
/// Returns the eigenvalues and a matrix whose columns are the matching
/// eigenvectors. Eigenvalues are clamped at zero.
fn symmetric_eigen(matrix: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(n);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[[i, j]] * a[[i, j]])
            .sum();
        let scale: f64 = a.iter().map(|x| x * x).sum();
        if off <= f64::EPSILON * f64::EPSILON * scale.max(f64::MIN_POSITIVE) {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }

                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    let values = Array1::from_iter((0..n).map(|i| a[[i, i]].max(0.0)));
    (values, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_eigen_reconstructs_matrix() {
        let m = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]];
        let (values, vectors) = symmetric_eigen(&m);
        let rebuilt = vectors.dot(&Array2::from_diag(&values)).dot(&vectors.t());

        for (a, b) in m.iter().zip(rebuilt.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_recovers_linear_relationship() {
        let x = Array2::from_shape_fn((50, 2), |(i, j)| {
            if j == 0 {
                i as f64
            } else {
                ((i * 7) % 11) as f64
            }
        });
        let y = Array1::from_iter(x.rows().into_iter().map(|r| 3.0 * r[0] - 2.0 * r[1] + 5.0));

        let model = BayesianRidge::fit(&BayesianRidgeConfig::default(), x.view(), y.view()).unwrap();
        assert!((model.coef()[0] - 3.0).abs() < 1e-3);
        assert!((model.coef()[1] + 2.0).abs() < 1e-3);
        assert!((model.intercept() - 5.0).abs() < 1e-2);

        let predicted = model.predict(x.view()).unwrap();
        for (p, t) in predicted.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-2);
        }
    }

    #[test]
    fn test_predict_checks_width() {
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 5.0]];
        let y = array![1.0, 2.0, 3.0];
        let model = BayesianRidge::fit(&BayesianRidgeConfig::default(), x.view(), y.view()).unwrap();

        let err = model.predict(array![[1.0]].view()).unwrap_err();
        assert_eq!(err.kind(), crate::domain::ErrorKind::Schema);
    }

    #[test]
    fn test_rejects_mismatched_target() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0];
        let err = BayesianRidge::fit(&BayesianRidgeConfig::default(), x.view(), y.view()).unwrap_err();
        assert_eq!(err.kind(), crate::domain::ErrorKind::TrainingFailure);
    }

    #[test]
    fn test_constant_feature_is_stable() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0], [4.0, 7.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let model = BayesianRidge::fit(&BayesianRidgeConfig::default(), x.view(), y.view()).unwrap();
        assert!(model.coef().iter().all(|c| c.is_finite()));
        assert!(model.coef()[1].abs() < 1e-9);
    }
}
