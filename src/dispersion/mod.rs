//! Dispersion estimation for negative binomial models
//!
//! Gene-wise method of moments on normalized counts, pooled across the two
//! condition groups. No cross-gene shrinkage or trend fitting is applied;
//! with only a few samples per group there is not enough replication to fit
//! a stable trend.

use ndarray::{Array1, ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::data::{Condition, SampleDesign};
use crate::error::{Result, StatsError};

/// Configurable parameters for dispersion estimation.
#[derive(Debug, Clone)]
pub struct DispersionParams {
    /// Minimum dispersion value, applied after the moment estimate
    pub min_disp: f64,
}

impl Default for DispersionParams {
    fn default() -> Self {
        Self { min_disp: 1e-8 }
    }
}

/// Estimate per-gene dispersions from size-factor-normalized counts.
///
/// For each gene the sample mean and unbiased variance are computed within
/// each condition group, then pooled: the mean weighted by group size, the
/// variance by degrees of freedom, so a real condition effect does not
/// inflate the estimate. The moment estimator is
/// `(pooled_var - pooled_mean) / pooled_mean^2`, clamped to be non-negative
/// and floored at `min_disp`. Genes whose pooled mean is zero get `NaN` and
/// are excluded from downstream testing.
pub fn estimate_dispersions(
    normalized: ArrayView2<f64>,
    design: &SampleDesign,
    params: &DispersionParams,
) -> Result<Array1<f64>> {
    let (n_genes, n_samples) = normalized.dim();

    if n_samples != design.n_samples() {
        return Err(StatsError::DimensionMismatch {
            expected: format!("{} samples in design", n_samples),
            got: format!("{}", design.n_samples()),
        });
    }

    let groups = [
        design.group_indices(Condition::Control),
        design.group_indices(Condition::Treated),
    ];

    let dispersions: Vec<f64> = (0..n_genes)
        .into_par_iter()
        .map(|i| pooled_moments_estimate(normalized.row(i), &groups, params.min_disp))
        .collect();

    Ok(Array1::from_vec(dispersions))
}

/// Method-of-moments dispersion for one gene, pooled over condition groups.
fn pooled_moments_estimate(
    row: ArrayView1<f64>,
    groups: &[Vec<usize>; 2],
    min_disp: f64,
) -> f64 {
    let n_total: usize = groups.iter().map(|g| g.len()).sum();

    let mut weighted_mean = 0.0;
    let mut var_sum = 0.0;
    let mut df = 0.0;

    for indices in groups {
        let n = indices.len() as f64;
        let mean = indices.iter().map(|&j| row[j]).sum::<f64>() / n;
        let var = if n > 1.0 {
            indices.iter().map(|&j| (row[j] - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        weighted_mean += mean * n;
        var_sum += var * (n - 1.0);
        df += n - 1.0;
    }

    let pooled_mean = weighted_mean / n_total as f64;
    if pooled_mean <= 0.0 {
        return f64::NAN;
    }

    let pooled_var = var_sum / df;
    let disp = (pooled_var - pooled_mean) / (pooled_mean * pooled_mean);
    disp.max(0.0).max(min_disp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn design4() -> SampleDesign {
        SampleDesign::from_sample_count(4).unwrap()
    }

    #[test]
    fn test_overdispersed_gene() {
        // control: mean 10, var 50; treated: mean 20, var 200
        // pooled mean 15, pooled var 125 -> disp = (125 - 15) / 225
        let normalized = array![[5.0, 15.0, 10.0, 30.0]];
        let disp =
            estimate_dispersions(normalized.view(), &design4(), &DispersionParams::default())
                .unwrap();
        assert!((disp[0] - 110.0 / 225.0).abs() < 1e-12);
    }

    #[test]
    fn test_underdispersed_gene_hits_floor() {
        // within-group variance below the mean clamps to the floor
        let normalized = array![[9.0, 11.0, 19.0, 21.0]];
        let disp =
            estimate_dispersions(normalized.view(), &design4(), &DispersionParams::default())
                .unwrap();
        assert_eq!(disp[0], 1e-8);
    }

    #[test]
    fn test_condition_effect_does_not_inflate() {
        // strong shift between groups but no within-group variance
        let normalized = array![[10.0, 10.0, 100.0, 100.0]];
        let disp =
            estimate_dispersions(normalized.view(), &design4(), &DispersionParams::default())
                .unwrap();
        assert_eq!(disp[0], 1e-8);
    }

    #[test]
    fn test_all_zero_gene_undefined() {
        let normalized = array![[0.0, 0.0, 0.0, 0.0], [5.0, 6.0, 7.0, 8.0]];
        let disp =
            estimate_dispersions(normalized.view(), &design4(), &DispersionParams::default())
                .unwrap();
        assert!(disp[0].is_nan());
        assert!(disp[1].is_finite());
    }

    #[test]
    fn test_length_matches_genes() {
        let normalized = array![
            [1.0, 2.0, 3.0, 4.0],
            [4.0, 3.0, 2.0, 1.0],
            [2.0, 2.0, 2.0, 2.0]
        ];
        let disp =
            estimate_dispersions(normalized.view(), &design4(), &DispersionParams::default())
                .unwrap();
        assert_eq!(disp.len(), 3);
    }
}
