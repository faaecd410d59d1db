//! Differential expression and pathway enrichment for rare-disease
//! multi-omics count data
//!
//! The crate covers the two computational stages of the analysis pipeline:
//! negative binomial differential expression testing on an RNA-seq count
//! matrix, and hypergeometric over-representation testing of the resulting
//! significant gene set against a functional category database.
//!
//! # Example
//!
//! ```ignore
//! use rdmr_stats::prelude::*;
//!
//! // Expression stage
//! let matrix = read_count_matrix("counts.tsv")?;
//! let de = rdmr_stats::run_differential_expression(
//!     &matrix,
//!     &DispersionParams::default(),
//!     &GlmFitParams::default(),
//! )?;
//! write_de_results("de_results.tsv", &de)?;
//!
//! // Enrichment stage
//! let symbol_map = read_symbol_map("symbols.json")?;
//! let categories = read_category_db("categories.json")?;
//! let outcome = rdmr_stats::run_enrichment(
//!     &de,
//!     &symbol_map,
//!     &categories,
//!     0.05,
//!     1.0,
//!     &EnrichmentParams::default(),
//! )?;
//! if let Some(enriched) = &outcome.results {
//!     write_enrichment_results("enrichment.tsv", enriched)?;
//! }
//! ```

pub mod cli;
pub mod data;
pub mod dispersion;
pub mod enrichment;
pub mod error;
pub mod glm;
pub mod io;
pub mod normalization;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::data::{Condition, CountMatrix, SampleDesign};
    pub use crate::dispersion::{estimate_dispersions, DispersionParams};
    pub use crate::enrichment::{
        map_symbols, test_enrichment, Category, EnrichmentParams, EnrichmentResults,
        EnrichmentRow, MappedGenes,
    };
    pub use crate::error::{Result, StageStatus, StatsError};
    pub use crate::glm::{fit_single_gene, GlmFitParams, GlmFitResult};
    pub use crate::io::{
        read_category_db, read_count_matrix, read_de_results, read_symbol_map, write_de_results,
        write_enrichment_results, DeResults, DeSummary,
    };
    pub use crate::normalization::estimate_size_factors;
    pub use crate::testing::{benjamini_hochberg, calculate_pvalue, wald_test};
}

use std::collections::{HashMap, HashSet};

use log::info;

use prelude::*;

/// Result of the enrichment stage
///
/// `results` is present exactly when the stage completed; a skipped stage
/// carries the reason in `status` instead.
#[derive(Debug)]
pub struct EnrichmentOutcome {
    pub status: StageStatus,
    pub results: Option<EnrichmentResults>,
}

impl EnrichmentOutcome {
    fn completed(results: EnrichmentResults) -> Self {
        EnrichmentOutcome {
            status: StageStatus::Completed,
            results: Some(results),
        }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        EnrichmentOutcome {
            status: StageStatus::skipped(reason),
            results: None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.status.is_skipped()
    }
}

/// Run the expression stage: size factors, dispersions, Wald tests
///
/// Samples are assigned to conditions positionally, first half control and
/// second half treated. Genes that cannot be tested come back with NaN
/// statistics rather than being dropped from the table.
pub fn run_differential_expression(
    matrix: &CountMatrix,
    disp_params: &DispersionParams,
    glm_params: &GlmFitParams,
) -> Result<DeResults> {
    let design = SampleDesign::from_sample_count(matrix.n_samples())?;
    info!(
        "Design: {} control vs {} treated samples",
        design.n_control(),
        design.n_treated()
    );

    info!("Estimating size factors");
    let size_factors = estimate_size_factors(matrix.counts())?;

    let normalized = matrix.normalized_counts(size_factors.view())?;

    info!("Estimating per-gene dispersions");
    let dispersions = estimate_dispersions(normalized.view(), &design, disp_params)?;

    info!("Fitting negative binomial models for {} genes", matrix.n_genes());
    wald_test(
        matrix,
        normalized.view(),
        &design,
        size_factors.view(),
        dispersions.view(),
        glm_params,
    )
}

/// Run the enrichment stage on a differential expression table
///
/// Filters the table at `alpha` / `min_lfc`, maps the significant symbols to
/// stable identifiers, and tests every category with a non-empty overlap.
/// The background universe is the union of all category members and all
/// identifiers the table's genes map to. Empty intermediate sets are
/// reported as a skipped stage, not an error.
pub fn run_enrichment(
    results: &DeResults,
    symbol_map: &HashMap<String, Vec<String>>,
    categories: &[Category],
    alpha: f64,
    min_lfc: f64,
    params: &EnrichmentParams,
) -> Result<EnrichmentOutcome> {
    let significant = results.significant_genes(alpha, min_lfc);
    if significant.is_empty() {
        return Ok(EnrichmentOutcome::skipped(format!(
            "No significant genes at padj < {} and |log2FC| > {}",
            alpha, min_lfc
        )));
    }
    info!(
        "{} of {} genes significant at padj < {} and |log2FC| > {}",
        significant.len(),
        results.n_genes(),
        alpha,
        min_lfc
    );

    let mapped = map_symbols(&significant, symbol_map);
    if !mapped.any_mapped() {
        return Ok(EnrichmentOutcome::skipped(format!(
            "None of the {} significant gene symbols mapped to identifiers",
            significant.len()
        )));
    }

    let mut universe: HashSet<&str> = HashSet::new();
    for gene in &results.gene_ids {
        if let Some(ids) = symbol_map.get(gene) {
            universe.extend(ids.iter().map(String::as_str));
        }
    }
    for category in categories {
        universe.extend(category.members.iter().map(String::as_str));
    }
    info!(
        "Testing {} categories against {} mapped genes in a universe of {}",
        categories.len(),
        mapped.n_mapped(),
        universe.len()
    );

    let enriched = test_enrichment(&mapped.identifiers, universe.len(), categories, params)?;
    if enriched.n_tested == 0 {
        return Ok(EnrichmentOutcome::skipped(
            "No category overlapped the mapped gene set",
        ));
    }
    if enriched.rows.is_empty() {
        return Ok(EnrichmentOutcome::skipped(format!(
            "No enriched terms at padj < {} and q < {}",
            params.pvalue_cutoff, params.qvalue_cutoff
        )));
    }

    info!(
        "{} of {} tested categories enriched",
        enriched.rows.len(),
        enriched.n_tested
    );
    Ok(EnrichmentOutcome::completed(enriched))
}
