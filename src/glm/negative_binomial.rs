//! Negative binomial distribution utilities

/// Minimum mu value during GLM fitting, applied before weight calculation
pub const MIN_MU: f64 = 0.5;

/// Maximum absolute value for a fitted coefficient. Iteration stops and the
/// gene is flagged as non-converged if any |beta| exceeds this.
pub const MAX_BETA: f64 = 30.0;

/// Maximum eta value to prevent overflow (exp(700) is near 1e304)
pub const MAX_ETA: f64 = 700.0;

/// Mean of the negative binomial model at linear predictor eta:
/// mu = size_factor * exp(eta)
pub fn nb_mean(eta: f64, size_factor: f64) -> f64 {
    let eta_clamped = eta.clamp(-MAX_ETA, MAX_ETA);
    size_factor * eta_clamped.exp()
}

/// IRLS weight for an observation with mean mu and dispersion alpha:
/// W = mu / (1 + alpha * mu)
///
/// mu should already have the minimum applied.
pub fn nb_weight(mu: f64, alpha: f64) -> f64 {
    mu / (1.0 + alpha * mu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nb_mean() {
        let mu = nb_mean(2.0, 1.0);
        assert!((mu - 2.0_f64.exp()).abs() < 1e-10);
    }

    #[test]
    fn test_nb_mean_overflow_clamped() {
        let mu = nb_mean(1000.0, 1.0);
        assert!(mu.is_finite());
    }

    #[test]
    fn test_nb_weight() {
        let w = nb_weight(10.0, 0.1);
        assert!((w - 10.0 / 2.0).abs() < 1e-10);
    }
}
