//! Hypergeometric over-representation testing of functional categories

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{DiscreteCDF, Hypergeometric};

use crate::error::{Result, StatsError};
use crate::testing::benjamini_hochberg;

/// A functional category with its member identifiers
#[derive(Debug, Clone)]
pub struct Category {
    pub id: String,
    pub description: String,
    pub members: Vec<String>,
}

/// Parameters for enrichment testing.
///
/// Both cutoffs apply to the BH-adjusted p-value and both must pass for a
/// category to be retained.
#[derive(Debug, Clone)]
pub struct EnrichmentParams {
    pub pvalue_cutoff: f64,
    pub qvalue_cutoff: f64,
}

impl Default for EnrichmentParams {
    fn default() -> Self {
        Self {
            pvalue_cutoff: 0.05,
            qvalue_cutoff: 0.2,
        }
    }
}

/// One retained category after testing and correction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentRow {
    pub category_id: String,
    pub description: String,
    /// Overlap between the sample set and the category (k)
    pub overlap: usize,
    /// Category size (K)
    pub category_size: usize,
    /// Sample set size (n)
    pub sample_size: usize,
    /// Background universe size (N)
    pub universe_size: usize,
    /// (k / n) / (K / N)
    pub fold_enrichment: f64,
    pub pvalue: f64,
    pub padj: f64,
    /// Overlapping gene identifiers, sorted
    pub genes: Vec<String>,
}

/// Outcome of the enrichment stage
#[derive(Debug, Clone)]
pub struct EnrichmentResults {
    /// Retained categories, sorted by ascending padj, ties by descending
    /// overlap
    pub rows: Vec<EnrichmentRow>,
    /// Number of categories with at least one overlapping member
    pub n_tested: usize,
    pub sample_size: usize,
    pub universe_size: usize,
}

impl EnrichmentResults {
    /// True when no category survived testing and filtering
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct TestedCategory {
    category_idx: usize,
    overlap: usize,
    category_size: usize,
    pvalue: f64,
    genes: Vec<String>,
}

/// Test every category for over-representation in the mapped gene set.
///
/// For a category with K members of which k overlap an n-gene sample drawn
/// from an N-gene universe, the p-value is P(X >= k) under the
/// hypergeometric distribution, the upper tail at k - 1. Categories with no
/// overlap are not tested. Raw p-values are BH-adjusted across the tested
/// categories only, and retained rows must pass both adjusted cutoffs. An
/// empty result is a valid outcome, not an error.
pub fn test_enrichment(
    sample: &[String],
    universe_size: usize,
    categories: &[Category],
    params: &EnrichmentParams,
) -> Result<EnrichmentResults> {
    let sample_set: HashSet<&str> = sample.iter().map(|s| s.as_str()).collect();
    let n = sample_set.len();

    if n == 0 {
        return Err(StatsError::EmptyData {
            reason: "Sample gene set is empty".to_string(),
        });
    }
    if n > universe_size {
        return Err(StatsError::InvalidInput {
            reason: format!(
                "Sample size {} exceeds universe size {}",
                n, universe_size
            ),
        });
    }

    let tested: Vec<TestedCategory> = categories
        .par_iter()
        .enumerate()
        .map(|(idx, category)| -> Result<Option<TestedCategory>> {
            let members: HashSet<&str> = category.members.iter().map(|m| m.as_str()).collect();
            let category_size = members.len();

            if category_size > universe_size {
                return Err(StatsError::InvalidInput {
                    reason: format!(
                        "Category '{}' has {} members but the universe holds {}",
                        category.id, category_size, universe_size
                    ),
                });
            }

            let mut genes: Vec<String> = members
                .iter()
                .filter(|m| sample_set.contains(**m))
                .map(|m| m.to_string())
                .collect();
            genes.sort();

            let overlap = genes.len();
            if overlap == 0 {
                return Ok(None);
            }

            let hyper = Hypergeometric::new(
                universe_size as u64,
                category_size as u64,
                n as u64,
            )
            .map_err(|e| StatsError::InvalidInput {
                reason: format!("Hypergeometric parameters for '{}': {}", category.id, e),
            })?;

            // Upper tail including the observed overlap
            let pvalue = hyper.sf(overlap as u64 - 1);

            Ok(Some(TestedCategory {
                category_idx: idx,
                overlap,
                category_size,
                pvalue,
                genes,
            }))
        })
        .collect::<Result<Vec<Option<TestedCategory>>>>()?
        .into_iter()
        .flatten()
        .collect();

    let n_tested = tested.len();

    let pvalues: Vec<f64> = tested.iter().map(|t| t.pvalue).collect();
    let padj = benjamini_hochberg(&pvalues);

    let mut rows: Vec<EnrichmentRow> = tested
        .into_iter()
        .zip(padj.into_iter())
        .filter(|(_, adj)| *adj < params.pvalue_cutoff && *adj < params.qvalue_cutoff)
        .map(|(t, adj)| {
            let category = &categories[t.category_idx];
            let fold_enrichment = (t.overlap as f64 / n as f64)
                / (t.category_size as f64 / universe_size as f64);
            EnrichmentRow {
                category_id: category.id.clone(),
                description: category.description.clone(),
                overlap: t.overlap,
                category_size: t.category_size,
                sample_size: n,
                universe_size,
                fold_enrichment,
                pvalue: t.pvalue,
                padj: adj,
                genes: t.genes,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.padj
            .total_cmp(&b.padj)
            .then(b.overlap.cmp(&a.overlap))
            .then(a.category_id.cmp(&b.category_id))
    });

    Ok(EnrichmentResults {
        rows,
        n_tested,
        sample_size: n,
        universe_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn category(id: &str, members: &[&str]) -> Category {
        Category {
            id: id.to_string(),
            description: format!("{} description", id),
            members: ids(members),
        }
    }

    #[test]
    fn test_fully_contained_category_pvalue() {
        // N=10, K=5, n=5, k=5: p = 1 / C(10,5) = 1/252
        let sample = ids(&["a", "b", "c", "d", "e"]);
        let cats = vec![category("CAT:1", &["a", "b", "c", "d", "e"])];
        let params = EnrichmentParams {
            pvalue_cutoff: 1.1,
            qvalue_cutoff: 1.1,
        };
        let results = test_enrichment(&sample, 10, &cats, &params).unwrap();
        assert_eq!(results.rows.len(), 1);
        assert!((results.rows[0].pvalue - 1.0 / 252.0).abs() < 1e-12);
        assert_eq!(results.rows[0].overlap, 5);
        assert_eq!(results.rows[0].category_size, 5);
    }

    #[test]
    fn test_pvalue_monotone_in_overlap() {
        // same K and n, fewer overlapping members, larger p-value
        let sample = ids(&["a", "b", "c", "d", "e"]);
        let full = vec![category("FULL", &["a", "b", "c", "d", "e"])];
        let partial = vec![category("PART", &["a", "b", "c", "x", "y"])];
        let params = EnrichmentParams {
            pvalue_cutoff: 1.1,
            qvalue_cutoff: 1.1,
        };
        let p_full = test_enrichment(&sample, 10, &full, &params).unwrap().rows[0].pvalue;
        let p_part = test_enrichment(&sample, 10, &partial, &params).unwrap().rows[0].pvalue;
        assert!(p_full <= p_part);
        // N=10, K=5, n=5, k=3: p = 126/252 = 0.5
        assert!((p_part - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_overlap_not_tested() {
        let sample = ids(&["a", "b"]);
        let cats = vec![
            category("HIT", &["a", "z"]),
            category("MISS", &["x", "y", "z"]),
        ];
        let params = EnrichmentParams {
            pvalue_cutoff: 1.1,
            qvalue_cutoff: 1.1,
        };
        let results = test_enrichment(&sample, 20, &cats, &params).unwrap();
        assert_eq!(results.n_tested, 1);
        assert_eq!(results.rows.len(), 1);
        assert_eq!(results.rows[0].category_id, "HIT");
    }

    #[test]
    fn test_cutoffs_drop_weak_categories() {
        let sample = ids(&["a", "b", "c", "d", "e"]);
        // k=3 of K=5 in N=10 gives p=0.5, never below the default cutoffs
        let cats = vec![category("WEAK", &["a", "b", "c", "x", "y"])];
        let results =
            test_enrichment(&sample, 10, &cats, &EnrichmentParams::default()).unwrap();
        assert_eq!(results.n_tested, 1);
        assert!(results.is_empty());
    }

    #[test]
    fn test_rows_sorted_by_padj_then_overlap() {
        let sample = ids(&["a", "b", "c", "d", "e", "f"]);
        let cats = vec![
            category("SMALL", &["a", "b"]),
            category("BIG", &["a", "b", "c", "d", "e", "f"]),
            category("MID", &["a", "b", "c", "g"]),
        ];
        let params = EnrichmentParams {
            pvalue_cutoff: 1.1,
            qvalue_cutoff: 1.1,
        };
        let results = test_enrichment(&sample, 40, &cats, &params).unwrap();
        assert_eq!(results.rows.len(), 3);
        for pair in results.rows.windows(2) {
            assert!(
                pair[0].padj < pair[1].padj
                    || (pair[0].padj == pair[1].padj && pair[0].overlap >= pair[1].overlap)
            );
        }
    }

    #[test]
    fn test_overlap_invariant() {
        let sample = ids(&["a", "b", "c"]);
        let cats = vec![category("C1", &["a", "b", "x", "y"]), category("C2", &["c"])];
        let params = EnrichmentParams {
            pvalue_cutoff: 1.1,
            qvalue_cutoff: 1.1,
        };
        let results = test_enrichment(&sample, 15, &cats, &params).unwrap();
        for row in &results.rows {
            assert!(row.overlap <= row.category_size.min(row.sample_size));
            assert!(row.category_size.min(row.sample_size) <= row.universe_size);
        }
    }

    #[test]
    fn test_duplicate_members_counted_once() {
        let sample = ids(&["a", "b"]);
        let cats = vec![category("DUP", &["a", "a", "b"])];
        let params = EnrichmentParams {
            pvalue_cutoff: 1.1,
            qvalue_cutoff: 1.1,
        };
        let results = test_enrichment(&sample, 10, &cats, &params).unwrap();
        assert_eq!(results.rows[0].overlap, 2);
        assert_eq!(results.rows[0].category_size, 2);
    }

    #[test]
    fn test_sample_larger_than_universe_rejected() {
        let sample = ids(&["a", "b", "c"]);
        let cats = vec![category("C", &["a"])];
        assert!(test_enrichment(&sample, 2, &cats, &EnrichmentParams::default()).is_err());
    }

    #[test]
    fn test_category_larger_than_universe_rejected() {
        let sample = ids(&["a"]);
        let cats = vec![category("C", &["a", "b", "c", "d"])];
        assert!(test_enrichment(&sample, 3, &cats, &EnrichmentParams::default()).is_err());
    }

    #[test]
    fn test_empty_sample_rejected() {
        let cats = vec![category("C", &["a"])];
        assert!(test_enrichment(&[], 10, &cats, &EnrichmentParams::default()).is_err());
    }
}
