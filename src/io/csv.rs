//! Reading and writing of count matrices and result tables

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use ndarray::Array2;

use crate::data::CountMatrix;
use crate::enrichment::EnrichmentResults;
use crate::error::{Result, StatsError};

use super::results::DeResults;

const RESULTS_COLUMNS: [&str; 6] = [
    "gene",
    "baseMean",
    "log2FoldChange",
    "lfcSE",
    "pvalue",
    "padj",
];

const ENRICHMENT_COLUMNS: [&str; 9] = [
    "category_id",
    "description",
    "k",
    "K",
    "n",
    "N",
    "pvalue",
    "padj",
    "genes",
];

/// Strip surrounding quotes from a string
fn strip_quotes(s: &str) -> String {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')) {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Undefined values are written as `NA`; everything else uses the shortest
/// representation that parses back to the same f64.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NA".to_string()
    } else {
        format!("{}", value)
    }
}

fn format_pvalue(value: f64) -> String {
    if value.is_nan() {
        "NA".to_string()
    } else {
        format!("{:e}", value)
    }
}

fn parse_count(field: &str) -> Result<f64> {
    let val = strip_quotes(field);
    let parsed = val
        .parse::<f64>()
        .map_err(|_| StatsError::InvalidCountMatrix {
            reason: format!("Invalid count value: {}", val),
        })?;
    if !parsed.is_finite() || parsed < 0.0 || parsed.fract() != 0.0 {
        return Err(StatsError::InvalidCountMatrix {
            reason: format!("Counts must be non-negative integers, got: {}", val),
        });
    }
    Ok(parsed)
}

fn parse_result_value(field: &str) -> Result<f64> {
    let val = strip_quotes(field);
    if val == "NA" {
        return Ok(f64::NAN);
    }
    val.parse::<f64>().map_err(|_| StatsError::InvalidInput {
        reason: format!("Invalid numeric value: {}", val),
    })
}

/// Read a count matrix from a tab- or comma-separated file
/// Expected format: first column is gene IDs, first row is sample IDs
pub fn read_count_matrix<P: AsRef<Path>>(path: P) -> Result<CountMatrix> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    // Read header
    let header_line = lines.next().ok_or_else(|| StatsError::EmptyData {
        reason: "Empty counts file".to_string(),
    })??;

    // Detect delimiter
    let delimiter = if header_line.contains('\t') { '\t' } else { ',' };

    let header: Vec<&str> = header_line.split(delimiter).collect();
    let sample_ids: Vec<String> = header[1..].iter().map(|s| strip_quotes(s)).collect();
    let n_samples = sample_ids.len();

    if n_samples < 4 {
        return Err(StatsError::InvalidCountMatrix {
            reason: format!(
                "At least 4 sample columns are required, found {}",
                n_samples
            ),
        });
    }

    let mut gene_ids: Vec<String> = Vec::new();
    let mut counts_data: Vec<Vec<f64>> = Vec::new();

    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() != n_samples + 1 {
            return Err(StatsError::InvalidCountMatrix {
                reason: format!(
                    "Row has {} columns, expected {}",
                    fields.len(),
                    n_samples + 1
                ),
            });
        }

        gene_ids.push(strip_quotes(fields[0]));

        let row_counts: Result<Vec<f64>> = fields[1..].iter().map(|s| parse_count(s)).collect();
        counts_data.push(row_counts?);
    }

    if gene_ids.is_empty() {
        return Err(StatsError::EmptyData {
            reason: "No genes found in count matrix".to_string(),
        });
    }

    let n_genes = gene_ids.len();
    let mut counts = Array2::zeros((n_genes, n_samples));

    for (i, row) in counts_data.iter().enumerate() {
        for (j, &val) in row.iter().enumerate() {
            counts[[i, j]] = val;
        }
    }

    CountMatrix::new(counts, gene_ids, sample_ids)
}

/// Write differential expression results to a tab-separated file
///
/// Rows are ordered by ascending adjusted p-value with undefined rows last.
pub fn write_de_results<P: AsRef<Path>>(path: P, results: &DeResults) -> Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "{}", RESULTS_COLUMNS.join("\t"))?;

    for i in results.order_by_padj() {
        writeln!(
            file,
            "{}\t{}\t{}\t{}\t{}\t{}",
            results.gene_ids[i],
            format_value(results.base_means[i]),
            format_value(results.log2_fold_changes[i]),
            format_value(results.lfc_se[i]),
            format_pvalue(results.pvalues[i]),
            format_pvalue(results.padj[i]),
        )?;
    }

    Ok(())
}

/// Read a differential expression result table written by [`write_de_results`]
///
/// Row order is preserved. The Wald statistic is not part of the file schema,
/// so `stat` comes back as NaN for every gene.
pub fn read_de_results<P: AsRef<Path>>(path: P) -> Result<DeResults> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header_line = lines.next().ok_or_else(|| StatsError::EmptyData {
        reason: "Empty results file".to_string(),
    })??;

    let header: Vec<&str> = header_line.trim_end().split('\t').collect();
    if header != RESULTS_COLUMNS {
        return Err(StatsError::InvalidInput {
            reason: format!("Unexpected results header: {}", header_line),
        });
    }

    let mut results = DeResults {
        gene_ids: Vec::new(),
        base_means: Vec::new(),
        log2_fold_changes: Vec::new(),
        lfc_se: Vec::new(),
        stat: Vec::new(),
        pvalues: Vec::new(),
        padj: Vec::new(),
    };

    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != RESULTS_COLUMNS.len() {
            return Err(StatsError::InvalidInput {
                reason: format!(
                    "Row has {} columns, expected {}",
                    fields.len(),
                    RESULTS_COLUMNS.len()
                ),
            });
        }

        results.gene_ids.push(strip_quotes(fields[0]));
        results.base_means.push(parse_result_value(fields[1])?);
        results.log2_fold_changes.push(parse_result_value(fields[2])?);
        results.lfc_se.push(parse_result_value(fields[3])?);
        results.stat.push(f64::NAN);
        results.pvalues.push(parse_result_value(fields[4])?);
        results.padj.push(parse_result_value(fields[5])?);
    }

    if results.gene_ids.is_empty() {
        return Err(StatsError::EmptyData {
            reason: "No genes found in results file".to_string(),
        });
    }

    Ok(results)
}

/// Write enriched categories to a tab-separated file
///
/// Rows keep the order established by the enrichment test. Callers are
/// expected to skip the write when the stage produced no retained rows.
pub fn write_enrichment_results<P: AsRef<Path>>(path: P, results: &EnrichmentResults) -> Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "{}", ENRICHMENT_COLUMNS.join("\t"))?;

    for row in &results.rows {
        writeln!(
            file,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.category_id,
            row.description,
            row.overlap,
            row.category_size,
            row.sample_size,
            row.universe_size,
            format_pvalue(row.pvalue),
            format_pvalue(row.padj),
            row.genes.join(","),
        )?;
    }

    Ok(())
}
