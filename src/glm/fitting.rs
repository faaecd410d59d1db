//! GLM fitting using Iteratively Reweighted Least Squares (IRLS)

use ndarray::{Array2, ArrayView1};

use super::negative_binomial::{nb_mean, nb_weight, MAX_BETA, MIN_MU};

/// Configurable parameters for GLM fitting.
#[derive(Debug, Clone)]
pub struct GlmFitParams {
    /// Maximum IRLS iterations
    pub maxit: usize,
    /// Convergence tolerance on the largest coefficient change
    pub beta_tol: f64,
}

impl Default for GlmFitParams {
    fn default() -> Self {
        Self {
            maxit: 100,
            beta_tol: 1e-8,
        }
    }
}

/// Result of fitting a single gene.
///
/// Coefficients and standard errors are on the natural-log scale. When
/// `converged` is false the values are the last iterate and callers should
/// treat the gene's test result as undefined.
#[derive(Debug, Clone)]
pub struct GlmFitResult {
    pub coefficients: Vec<f64>,
    pub standard_errors: Vec<f64>,
    pub converged: bool,
}

/// Fit the negative binomial regression for one gene.
///
/// Mean model: log(mu_ij) = log(size_factor_j) + X_j . beta, with the
/// dispersion alpha held fixed. Coefficients start from OLS on shifted log
/// normalized counts and are refined by IRLS until the largest coefficient
/// change falls below `beta_tol` or `maxit` is reached. Standard errors come
/// from the inverse of the final information matrix X' W X.
pub fn fit_single_gene(
    counts: ArrayView1<f64>,
    design: &Array2<f64>,
    size_factors: ArrayView1<f64>,
    alpha: f64,
    params: &GlmFitParams,
) -> GlmFitResult {
    let n_samples = counts.len();
    let n_coefs = design.ncols();

    // Initialize coefficients with OLS on log(normalized count + 0.1)
    let log_counts: Vec<f64> = counts
        .iter()
        .zip(size_factors.iter())
        .map(|(&c, &s)| {
            let norm_ct = if s > 0.0 { c / s } else { 0.0 };
            (norm_ct + 0.1).ln()
        })
        .collect();

    let mut xtx = vec![0.0; n_coefs * n_coefs];
    let mut xty = vec![0.0; n_coefs];
    for i in 0..n_samples {
        for j in 0..n_coefs {
            for k in 0..n_coefs {
                xtx[j * n_coefs + k] += design[[i, j]] * design[[i, k]];
            }
            xty[j] += design[[i, j]] * log_counts[i];
        }
    }
    let mut beta = solve_symmetric_system(&xtx, &xty, n_coefs);

    if beta.iter().any(|&b| !b.is_finite()) {
        let mean_count: f64 = counts
            .iter()
            .zip(size_factors.iter())
            .map(|(&c, &s)| if s > 0.0 { c / s } else { 0.0 })
            .sum::<f64>()
            / n_samples as f64;
        beta = vec![0.0; n_coefs];
        beta[0] = (mean_count.max(0.1)).ln();
    }

    let mut converged = false;

    let mut weights = vec![0.0; n_samples];
    let mut working_response = vec![0.0; n_samples];

    for _ in 0..params.maxit {
        // Weights and working response from the current beta
        for i in 0..n_samples {
            let eta: f64 = (0..n_coefs).map(|j| design[[i, j]] * beta[j]).sum();
            let mu = nb_mean(eta, size_factors[i]).max(MIN_MU);
            weights[i] = nb_weight(mu, alpha);
            working_response[i] = (mu / size_factors[i]).ln() + (counts[i] - mu) / mu;
        }

        let previous = beta;
        beta = weighted_least_squares(design, &weights, &working_response);

        if beta.iter().any(|&b| !b.is_finite() || b.abs() > MAX_BETA) {
            break;
        }

        let delta = beta
            .iter()
            .zip(previous.iter())
            .map(|(new, old)| (new - old).abs())
            .fold(0.0_f64, f64::max);

        if delta < params.beta_tol {
            converged = true;
            break;
        }
    }

    // Standard errors from the information matrix at the final beta
    for i in 0..n_samples {
        let eta: f64 = (0..n_coefs).map(|j| design[[i, j]] * beta[j]).sum();
        let mu = nb_mean(eta, size_factors[i]).max(MIN_MU);
        weights[i] = nb_weight(mu, alpha);
    }
    let standard_errors = calculate_standard_errors(design, &weights);

    GlmFitResult {
        coefficients: beta,
        standard_errors,
        converged,
    }
}

/// One WLS step: solve (X'WX) beta = X'Wz
fn weighted_least_squares(design: &Array2<f64>, weights: &[f64], response: &[f64]) -> Vec<f64> {
    let n_coefs = design.ncols();

    let mut xtwx = vec![0.0; n_coefs * n_coefs];
    let mut xtwz = vec![0.0; n_coefs];
    for i in 0..design.nrows() {
        let w = weights[i];
        for j in 0..n_coefs {
            for k in 0..n_coefs {
                xtwx[j * n_coefs + k] += w * design[[i, j]] * design[[i, k]];
            }
            xtwz[j] += w * design[[i, j]] * response[i];
        }
    }

    solve_symmetric_system(&xtwx, &xtwz, n_coefs)
}

/// Cholesky solve for a symmetric positive definite system
fn solve_symmetric_system(a: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut l = vec![0.0; n * n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                // If the matrix is not positive definite, add a small epsilon to the
                // diagonal to maintain numerical stability
                if sum <= 0.0 {
                    sum = 1e-12;
                }
                l[i * n + j] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i * n + j] * y[j];
        }
        y[i] = sum / l[i * n + i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j * n + i] * x[j];
        }
        x[i] = sum / l[i * n + i];
    }
    x
}

/// Standard errors: sqrt of the diagonal of (X'WX)^-1
fn calculate_standard_errors(design: &Array2<f64>, weights: &[f64]) -> Vec<f64> {
    let n_samples = design.nrows();
    let n_coefs = design.ncols();

    let mut xtwx = vec![0.0; n_coefs * n_coefs];
    for i in 0..n_samples {
        let w = weights[i];
        for j in 0..n_coefs {
            for k in 0..n_coefs {
                xtwx[j * n_coefs + k] += w * design[[i, j]] * design[[i, k]];
            }
        }
    }

    let inv = invert_symmetric_matrix(&xtwx, n_coefs);

    (0..n_coefs)
        .map(|j| {
            let v = inv[j * n_coefs + j];
            if v > 0.0 {
                v.sqrt()
            } else {
                f64::NAN
            }
        })
        .collect()
}

fn invert_symmetric_matrix(a: &[f64], n: usize) -> Vec<f64> {
    let mut result = vec![0.0; n * n];
    for i in 0..n {
        let mut e = vec![0.0; n];
        e[i] = 1.0;
        let col = solve_symmetric_system(a, &e, n);
        for j in 0..n {
            result[j * n + i] = col[j];
        }
    }
    result
}
