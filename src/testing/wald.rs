//! Wald test for differential expression

use ndarray::{ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;

use super::fdr::benjamini_hochberg;
use super::pvalue::calculate_pvalue;
use crate::data::{CountMatrix, SampleDesign};
use crate::error::{Result, StatsError};
use crate::glm::{fit_single_gene, GlmFitParams};
use crate::io::DeResults;

/// Per-gene test outcome before p-value adjustment.
struct GeneTest {
    log2_fold_change: f64,
    lfc_se: f64,
    stat: f64,
    pvalue: f64,
}

impl GeneTest {
    /// Undefined outcome for genes that cannot be tested. baseMean stays
    /// defined; everything model-derived is NaN, never zero.
    fn undefined() -> Self {
        GeneTest {
            log2_fold_change: f64::NAN,
            lfc_se: f64::NAN,
            stat: f64::NAN,
            pvalue: f64::NAN,
        }
    }
}

/// Test every gene for differential expression between the two conditions.
///
/// Fits the negative binomial regression per gene with the dispersion held
/// fixed, then forms the Wald statistic z = beta / SE(beta) and a two-sided
/// normal p-value. `log2_fold_changes` are beta / ln(2); `lfc_se` is kept on
/// the natural-log scale so z can be reconstructed from the reported values.
/// Genes with an undefined dispersion, a zero base mean, or a non-convergent
/// fit get NaN statistics and are excluded from the BH correction. Fits run
/// in parallel and never abort their siblings.
pub fn wald_test(
    matrix: &CountMatrix,
    normalized: ArrayView2<f64>,
    design: &SampleDesign,
    size_factors: ArrayView1<f64>,
    dispersions: ArrayView1<f64>,
    params: &GlmFitParams,
) -> Result<DeResults> {
    let n_genes = matrix.n_genes();
    let n_samples = matrix.n_samples();

    if design.n_samples() != n_samples {
        return Err(StatsError::DimensionMismatch {
            expected: format!("{} samples", n_samples),
            got: format!("{} in design", design.n_samples()),
        });
    }
    if size_factors.len() != n_samples {
        return Err(StatsError::DimensionMismatch {
            expected: format!("{} size factors", n_samples),
            got: format!("{}", size_factors.len()),
        });
    }
    if dispersions.len() != n_genes {
        return Err(StatsError::DimensionMismatch {
            expected: format!("{} dispersions", n_genes),
            got: format!("{}", dispersions.len()),
        });
    }

    // Mean of normalized counts per gene
    let base_means: Vec<f64> = normalized
        .axis_iter(Axis(0))
        .map(|row| row.sum() / n_samples as f64)
        .collect();

    let model_matrix = design.model_matrix();
    let counts = matrix.counts();

    let tests: Vec<GeneTest> = (0..n_genes)
        .into_par_iter()
        .map(|i| {
            let alpha = dispersions[i];
            if base_means[i] == 0.0 || !alpha.is_finite() {
                return GeneTest::undefined();
            }

            let fit = fit_single_gene(counts.row(i), &model_matrix, size_factors, alpha, params);
            if !fit.converged {
                return GeneTest::undefined();
            }

            let beta = fit.coefficients[1];
            let se = fit.standard_errors[1];
            if !(se > 0.0 && se.is_finite()) {
                return GeneTest::undefined();
            }

            let stat = beta / se;
            GeneTest {
                log2_fold_change: beta / std::f64::consts::LN_2,
                lfc_se: se,
                stat,
                pvalue: calculate_pvalue(stat),
            }
        })
        .collect();

    let pvalues: Vec<f64> = tests.iter().map(|t| t.pvalue).collect();
    let padj = benjamini_hochberg(&pvalues);

    Ok(DeResults {
        gene_ids: matrix.gene_ids().to_vec(),
        base_means,
        log2_fold_changes: tests.iter().map(|t| t.log2_fold_change).collect(),
        lfc_se: tests.iter().map(|t| t.lfc_se).collect(),
        stat: tests.iter().map(|t| t.stat).collect(),
        pvalues,
        padj,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispersion::{estimate_dispersions, DispersionParams};
    use crate::normalization::estimate_size_factors;
    use ndarray::array;

    fn run_small_pipeline() -> DeResults {
        let matrix = CountMatrix::new(
            array![
                [5.0, 6.0, 95.0, 100.0],
                [50.0, 52.0, 48.0, 51.0],
                [0.0, 0.0, 0.0, 0.0],
                [20.0, 22.0, 19.0, 21.0]
            ],
            vec![
                "up".to_string(),
                "flat".to_string(),
                "silent".to_string(),
                "stable".to_string(),
            ],
            vec![
                "c1".to_string(),
                "c2".to_string(),
                "t1".to_string(),
                "t2".to_string(),
            ],
        )
        .unwrap();
        let design = SampleDesign::from_sample_count(4).unwrap();
        let size_factors = estimate_size_factors(matrix.counts()).unwrap();
        let normalized = matrix
            .normalized_counts(size_factors.view())
            .unwrap();
        let dispersions = estimate_dispersions(
            normalized.view(),
            &design,
            &DispersionParams::default(),
        )
        .unwrap();

        wald_test(
            &matrix,
            normalized.view(),
            &design,
            size_factors.view(),
            dispersions.view(),
            &GlmFitParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_strong_gene_detected() {
        let results = run_small_pipeline();
        assert!(results.log2_fold_changes[0] > 3.0);
        assert!(results.pvalues[0] < 0.01);
        // flat genes stay near zero fold change
        assert!(results.log2_fold_changes[1].abs() < 0.5);
    }

    #[test]
    fn test_all_zero_gene_is_undefined() {
        let results = run_small_pipeline();
        assert_eq!(results.base_means[2], 0.0);
        assert!(results.log2_fold_changes[2].is_nan());
        assert!(results.lfc_se[2].is_nan());
        assert!(results.pvalues[2].is_nan());
        assert!(results.padj[2].is_nan());
    }

    #[test]
    fn test_lfc_se_never_negative() {
        let results = run_small_pipeline();
        for &se in &results.lfc_se {
            assert!(se.is_nan() || se >= 0.0);
        }
    }

    #[test]
    fn test_statistic_reproduces_pvalue() {
        // z rebuilt from the reported effect size and standard error gives
        // back the reported p-value
        let results = run_small_pipeline();
        for i in 0..results.gene_ids.len() {
            let p = results.pvalues[i];
            if !p.is_finite() {
                continue;
            }
            let z = results.log2_fold_changes[i] * std::f64::consts::LN_2 / results.lfc_se[i];
            assert!((z - results.stat[i]).abs() < 1e-10);
            assert!((calculate_pvalue(z) - p).abs() < 1e-10);
        }
    }

    #[test]
    fn test_base_means_use_normalization() {
        let results = run_small_pipeline();
        for &bm in &results.base_means {
            assert!(bm.is_finite());
            assert!(bm >= 0.0);
        }
    }
}
