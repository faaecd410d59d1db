//! P-value calculation from test statistics

use statrs::distribution::{ContinuousCDF, Normal};

/// Two-sided p-value for a standard-normal test statistic:
/// p = 2 * (1 - Phi(|z|))
pub fn calculate_pvalue(z: f64) -> f64 {
    if !z.is_finite() {
        return f64::NAN;
    }

    let normal = Normal::new(0.0, 1.0).unwrap();
    2.0 * normal.cdf(-z.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pvalue_symmetric() {
        let p1 = calculate_pvalue(2.0);
        let p2 = calculate_pvalue(-2.0);
        assert!((p1 - p2).abs() < 1e-10);
    }

    #[test]
    fn test_pvalue_range() {
        for z in [-3.0, -1.0, 0.0, 1.0, 3.0] {
            let p = calculate_pvalue(z);
            assert!(p >= 0.0 && p <= 1.0);
        }
    }

    #[test]
    fn test_pvalue_zero() {
        let p = calculate_pvalue(0.0);
        assert!((p - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_pvalue_known_quantile() {
        let p = calculate_pvalue(1.959964);
        assert!((p - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_pvalue_nan_statistic() {
        assert!(calculate_pvalue(f64::NAN).is_nan());
        assert!(calculate_pvalue(f64::INFINITY).is_nan());
    }
}
