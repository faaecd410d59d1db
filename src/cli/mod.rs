//! Command-line interface for rdmr_stats

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rdmr_stats")]
#[command(version)]
#[command(about = "Differential expression and pathway enrichment for rare-disease multi-omics data")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run differential expression and pathway enrichment
    #[command(
        about = "Run differential expression and pathway enrichment",
        long_about = "Run differential expression and pathway enrichment\n\n\
            Performs the complete pipeline: size factor estimation, per-gene dispersion\n\
            estimation, negative binomial Wald tests with BH correction, then maps the\n\
            significant genes to stable identifiers and tests functional categories for\n\
            over-representation with a hypergeometric test.\n\n\
            The enrichment stage runs only when both --symbol-map and --categories are\n\
            given. An empty significant set skips enrichment without failing the run.",
        after_long_help = "\
Examples:
  # Expression stage only
  rdmr_stats run -c counts.tsv -o de_results.tsv

  # Both stages
  rdmr_stats run -c counts.tsv -o de_results.tsv \\
    --symbol-map symbols.json --categories categories.json \\
    --enrichment-output enrichment.tsv

  # Stricter significance filter
  rdmr_stats run -c counts.tsv --alpha 0.01 --lfc 1.5 \\
    --symbol-map symbols.json --categories categories.json"
    )]
    Run {
        /// Path to count matrix file
        #[arg(short, long,
            long_help = "Path to the count matrix file.\n\
                Format: first column = gene IDs, remaining columns = raw counts per sample.\n\
                Cells must be non-negative integers; at least 4 sample columns.\n\
                The first half of the samples is taken as control, the second as treated.\n\
                Supports both CSV (comma) and TSV (tab) delimiters (auto-detected).")]
        counts: String,

        /// Output file for the differential expression table [default: de_results.tsv]
        #[arg(short, long, default_value = "de_results.tsv")]
        output: String,

        /// Path to symbol-to-identifier mapping JSON file
        #[arg(long, value_name = "FILE",
            long_help = "Path to the symbol-to-identifier mapping JSON file.\n\
                Format: {\"SYMBOL\": [\"identifier\", ...], ...}.\n\
                Required together with --categories to run the enrichment stage.")]
        symbol_map: Option<String>,

        /// Path to category database JSON file
        #[arg(long, value_name = "FILE",
            long_help = "Path to the category database JSON file.\n\
                Format: {\"CAT:0001\": {\"description\": \"...\", \"members\": [...]}, ...}.\n\
                Required together with --symbol-map to run the enrichment stage.")]
        categories: Option<String>,

        /// Output file for the enrichment table [default: enrichment_results.tsv]
        #[arg(long, default_value = "enrichment_results.tsv")]
        enrichment_output: String,

        /// Adjusted p-value threshold [default: 0.05]
        #[arg(short, long, default_value = "0.05",
            long_help = "Adjusted p-value threshold.\n\
                Genes need padj below this to count as significant, and enriched\n\
                categories need padj below it to be retained.")]
        alpha: f64,

        /// Absolute log2 fold change threshold [default: 1.0]
        #[arg(long, default_value = "1.0",
            long_help = "Absolute log2 fold change threshold.\n\
                Genes need |log2FC| strictly above this to count as significant.")]
        lfc: f64,

        /// Enrichment q-value threshold [default: 0.2]
        #[arg(long, default_value = "0.2",
            long_help = "Independent q-value threshold for enriched categories.\n\
                Retained categories must pass both this and --alpha.")]
        qvalue: f64,

        /// Minimum dispersion value [default: 1e-8]
        #[arg(long, default_value = "1e-8")]
        min_disp: f64,

        /// Maximum IRLS iterations for GLM fitting [default: 100]
        #[arg(long, default_value = "100")]
        maxit: usize,

        /// Coefficient convergence tolerance for GLM fitting [default: 1e-8]
        #[arg(long, default_value = "1e-8")]
        beta_tol: f64,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,
    },

    /// Run the differential expression stage only
    #[command(
        long_about = "Run the differential expression stage only.\n\n\
            Estimates size factors and per-gene dispersions, fits a negative binomial\n\
            GLM per gene, and writes a table of Wald test results with BH-adjusted\n\
            p-values, sorted by ascending padj.",
        after_long_help = "\
Examples:
  rdmr_stats diffexp -c counts.tsv -o de_results.tsv
  rdmr_stats diffexp -c counts.tsv -o de_results.tsv --alpha 0.01 --lfc 1.5"
    )]
    Diffexp {
        /// Path to count matrix file
        #[arg(short, long,
            long_help = "Path to the count matrix file.\n\
                Format: first column = gene IDs, remaining columns = raw counts per sample.\n\
                Cells must be non-negative integers; at least 4 sample columns.\n\
                Supports both CSV (comma) and TSV (tab) delimiters (auto-detected).")]
        counts: String,

        /// Output file path [default: de_results.tsv]
        #[arg(short, long, default_value = "de_results.tsv")]
        output: String,

        /// Adjusted p-value threshold for the printed summary [default: 0.05]
        #[arg(short, long, default_value = "0.05")]
        alpha: f64,

        /// Absolute log2 fold change threshold for the printed summary [default: 1.0]
        #[arg(long, default_value = "1.0")]
        lfc: f64,

        /// Minimum dispersion value [default: 1e-8]
        #[arg(long, default_value = "1e-8")]
        min_disp: f64,

        /// Maximum IRLS iterations for GLM fitting [default: 100]
        #[arg(long, default_value = "100")]
        maxit: usize,

        /// Coefficient convergence tolerance for GLM fitting [default: 1e-8]
        #[arg(long, default_value = "1e-8")]
        beta_tol: f64,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,
    },

    /// Run pathway enrichment on an existing results table
    #[command(
        long_about = "Run pathway enrichment on an existing results table.\n\n\
            Reads a differential expression table written by `run` or `diffexp`,\n\
            filters it at --alpha / --lfc, maps the significant gene symbols to\n\
            stable identifiers, and tests each category with a non-empty overlap\n\
            for over-representation. When nothing survives the filters the stage\n\
            reports a skip and exits cleanly without writing a file.",
        after_long_help = "\
Examples:
  rdmr_stats enrich -r de_results.tsv --symbol-map symbols.json \\
    --categories categories.json -o enrichment.tsv

  # Looser retention cutoffs
  rdmr_stats enrich -r de_results.tsv --symbol-map symbols.json \\
    --categories categories.json --alpha 0.1 --qvalue 0.25"
    )]
    Enrich {
        /// Path to a differential expression results table
        #[arg(short, long,
            long_help = "Path to a differential expression results table.\n\
                Must carry the schema written by `run`/`diffexp`:\n\
                gene, baseMean, log2FoldChange, lfcSE, pvalue, padj.")]
        results: String,

        /// Path to symbol-to-identifier mapping JSON file
        #[arg(long, value_name = "FILE")]
        symbol_map: String,

        /// Path to category database JSON file
        #[arg(long, value_name = "FILE")]
        categories: String,

        /// Output file path [default: enrichment_results.tsv]
        #[arg(short, long, default_value = "enrichment_results.tsv")]
        output: String,

        /// Adjusted p-value threshold [default: 0.05]
        #[arg(short, long, default_value = "0.05")]
        alpha: f64,

        /// Absolute log2 fold change threshold [default: 1.0]
        #[arg(long, default_value = "1.0")]
        lfc: f64,

        /// Enrichment q-value threshold [default: 0.2]
        #[arg(long, default_value = "0.2")]
        qvalue: f64,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,
    },
}
