//! Differential expression results structure

use serde::{Deserialize, Serialize};

/// Per-gene results of the differential expression stage.
///
/// Parallel vectors, one entry per gene, in count-matrix row order. NaN
/// marks an undefined value: a gene that could not be tested keeps NaN in
/// every model-derived field and is excluded from the adjusted p-values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeResults {
    /// Gene identifiers
    pub gene_ids: Vec<String>,
    /// Mean of size-factor-normalized counts across all samples
    pub base_means: Vec<f64>,
    /// Effect size, treated vs control, base-2 logarithm
    pub log2_fold_changes: Vec<f64>,
    /// Standard error of the fitted coefficient (natural-log scale)
    pub lfc_se: Vec<f64>,
    /// Wald z-statistic
    pub stat: Vec<f64>,
    /// Raw two-sided p-values
    pub pvalues: Vec<f64>,
    /// BH-adjusted p-values
    pub padj: Vec<f64>,
}

impl DeResults {
    /// Number of genes
    pub fn n_genes(&self) -> usize {
        self.gene_ids.len()
    }

    /// Genes with defined padj below `alpha` and |log2 fold change| above
    /// `min_lfc`. Genes are unique rows, so the result is already a set.
    pub fn significant_genes(&self, alpha: f64, min_lfc: f64) -> Vec<&str> {
        self.gene_ids
            .iter()
            .zip(self.padj.iter().zip(self.log2_fold_changes.iter()))
            .filter(|(_, (&p, &lfc))| p.is_finite() && p < alpha && lfc.abs() > min_lfc)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Significant genes with a positive fold change
    pub fn upregulated_genes(&self, alpha: f64, min_lfc: f64) -> Vec<&str> {
        self.gene_ids
            .iter()
            .zip(self.padj.iter().zip(self.log2_fold_changes.iter()))
            .filter(|(_, (&p, &lfc))| p.is_finite() && p < alpha && lfc > min_lfc)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Significant genes with a negative fold change
    pub fn downregulated_genes(&self, alpha: f64, min_lfc: f64) -> Vec<&str> {
        self.gene_ids
            .iter()
            .zip(self.padj.iter().zip(self.log2_fold_changes.iter()))
            .filter(|(_, (&p, &lfc))| p.is_finite() && p < alpha && lfc < -min_lfc)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Row indices ordered by ascending padj, undefined values last.
    /// Ties keep count-matrix row order.
    pub fn order_by_padj(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.n_genes()).collect();
        order.sort_by(|&a, &b| {
            let pa = self.padj[a];
            let pb = self.padj[b];
            match (pa.is_nan(), pb.is_nan()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Greater,
                (false, true) => std::cmp::Ordering::Less,
                (false, false) => pa.partial_cmp(&pb).unwrap(),
            }
        });
        order
    }

    /// Summary statistics at the given thresholds
    pub fn summary(&self, alpha: f64, min_lfc: f64) -> DeSummary {
        DeSummary {
            total_genes: self.n_genes(),
            genes_tested: self.pvalues.iter().filter(|p| p.is_finite()).count(),
            significant: self.significant_genes(alpha, min_lfc).len(),
            upregulated: self.upregulated_genes(alpha, min_lfc).len(),
            downregulated: self.downregulated_genes(alpha, min_lfc).len(),
            alpha,
            min_lfc,
        }
    }
}

/// Summary of a differential expression run
#[derive(Debug, Clone)]
pub struct DeSummary {
    pub total_genes: usize,
    pub genes_tested: usize,
    pub significant: usize,
    pub upregulated: usize,
    pub downregulated: usize,
    pub alpha: f64,
    pub min_lfc: f64,
}

impl std::fmt::Display for DeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Differential Expression Summary")?;
        writeln!(f, "===============================")?;
        writeln!(f, "Total genes: {}", self.total_genes)?;
        writeln!(f, "Genes tested: {}", self.genes_tested)?;
        writeln!(
            f,
            "Significant (padj < {}, |log2FC| > {}): {}",
            self.alpha, self.min_lfc, self.significant
        )?;
        writeln!(f, "  Up-regulated: {}", self.upregulated)?;
        writeln!(f, "  Down-regulated: {}", self.downregulated)?;
        Ok(())
    }
}
