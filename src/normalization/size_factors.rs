//! Size factor estimation using the median of ratios method

use ndarray::{Array1, ArrayView2, Axis};

use crate::error::{Result, StatsError};

/// Estimate size factors using the median of ratios method.
///
/// Accounts for both sequencing depth and RNA composition bias, and is
/// robust to a minority of strongly differential genes where a total-count
/// normalization is not.
pub fn estimate_size_factors(counts: ArrayView2<f64>) -> Result<Array1<f64>> {
    let (n_genes, n_samples) = counts.dim();

    if n_genes == 0 || n_samples == 0 {
        return Err(StatsError::EmptyData {
            reason: "Count matrix is empty".to_string(),
        });
    }

    // Step 1: geometric mean for each gene with no zero counts
    let mut geo_means = Vec::with_capacity(n_genes);
    let mut usable_genes = Vec::new();

    for (i, row) in counts.axis_iter(Axis(0)).enumerate() {
        if row.iter().all(|&x| x > 0.0) {
            let log_sum: f64 = row.iter().map(|&x| x.ln()).sum();
            let geo_mean = (log_sum / n_samples as f64).exp();
            if geo_mean > 0.0 {
                geo_means.push(geo_mean);
                usable_genes.push(i);
            }
        }
    }

    if usable_genes.is_empty() {
        return Err(StatsError::SizeFactorFailed {
            reason: "No genes with all non-zero counts found".to_string(),
        });
    }

    // Step 2: for each sample, the median of count/geo_mean ratios
    let mut size_factors = Array1::zeros(n_samples);

    for j in 0..n_samples {
        let mut ratios: Vec<f64> = usable_genes
            .iter()
            .zip(geo_means.iter())
            .map(|(&i, &geo_mean)| counts[[i, j]] / geo_mean)
            .collect();

        ratios.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median = if ratios.len() % 2 == 0 {
            (ratios[ratios.len() / 2 - 1] + ratios[ratios.len() / 2]) / 2.0
        } else {
            ratios[ratios.len() / 2]
        };

        size_factors[j] = median;
    }

    if size_factors.iter().any(|&x| x <= 0.0 || !x.is_finite()) {
        return Err(StatsError::SizeFactorFailed {
            reason: "Invalid size factors computed".to_string(),
        });
    }

    Ok(size_factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_size_factor_estimation() {
        let counts = array![
            [100.0, 200.0, 80.0, 160.0],
            [500.0, 1000.0, 400.0, 800.0],
            [50.0, 100.0, 40.0, 80.0],
            [200.0, 400.0, 160.0, 320.0]
        ];

        let sf = estimate_size_factors(counts.view()).unwrap();
        assert_eq!(sf.len(), 4);
        assert!(sf.iter().all(|&x| x > 0.0));

        // s2 has 2x the depth of s1, s4 has 2x the depth of s3
        let ratio = sf[1] / sf[0];
        assert!((ratio - 2.0).abs() < 0.1);
    }

    #[test]
    fn test_geometric_mean_near_one() {
        let counts = array![
            [100.0, 110.0, 95.0, 105.0],
            [520.0, 480.0, 510.0, 490.0],
            [48.0, 52.0, 50.0, 51.0]
        ];

        let sf = estimate_size_factors(counts.view()).unwrap();
        let log_mean: f64 = sf.iter().map(|&x| x.ln()).sum::<f64>() / sf.len() as f64;
        assert!(log_mean.exp() > 0.9 && log_mean.exp() < 1.1);
    }

    #[test]
    fn test_genes_with_zeros_excluded() {
        // Only the first gene is usable; its counts determine the factors.
        let counts = array![[10.0, 20.0, 10.0, 20.0], [0.0, 50.0, 0.0, 50.0]];

        let sf = estimate_size_factors(counts.view()).unwrap();
        assert!((sf[1] / sf[0] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_no_usable_genes_fails() {
        let counts = array![[0.0, 10.0], [10.0, 0.0]];
        assert!(estimate_size_factors(counts.view()).is_err());
    }
}
