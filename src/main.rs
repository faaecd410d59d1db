//! rdmr_stats command-line interface

use std::collections::HashMap;

use clap::Parser;
use log::{info, warn, LevelFilter};

use rdmr_stats::cli::{Cli, Commands};
use rdmr_stats::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Find the first non-flag argument (potential subcommand)
    let first_positional = args.iter().skip(1).find(|a| !a.starts_with('-'));
    let subcommands = ["run", "diffexp", "enrich", "help"];
    let has_subcommand = first_positional.map_or(false, |a| subcommands.contains(&a.as_str()));

    if !has_subcommand {
        // No subcommand, handle top-level help/version manually
        if args.len() == 1 {
            print_no_args();
            return;
        }
        if args.iter().any(|a| a == "--help") {
            print_long_help();
            return;
        }
        if args.iter().any(|a| a == "-h") {
            print_short_help();
            return;
        }
        if args.iter().any(|a| a == "-V" || a == "--version") {
            println!("rdmr_stats {}", VERSION);
            return;
        }
        // Unknown flags without subcommand, show the hint instead
        print_no_args();
        return;
    }

    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            counts,
            output,
            symbol_map,
            categories,
            enrichment_output,
            alpha,
            lfc,
            qvalue,
            min_disp,
            maxit,
            beta_tol,
            threads,
        }) => run_pipeline(
            &counts,
            &output,
            symbol_map.as_deref(),
            categories.as_deref(),
            &enrichment_output,
            alpha,
            lfc,
            qvalue,
            min_disp,
            maxit,
            beta_tol,
            threads,
        ),
        Some(Commands::Diffexp {
            counts,
            output,
            alpha,
            lfc,
            min_disp,
            maxit,
            beta_tol,
            threads,
        }) => run_diffexp(&counts, &output, alpha, lfc, min_disp, maxit, beta_tol, threads),
        Some(Commands::Enrich {
            results,
            symbol_map,
            categories,
            output,
            alpha,
            lfc,
            qvalue,
            threads,
        }) => run_enrich(
            &results,
            &symbol_map,
            &categories,
            &output,
            alpha,
            lfc,
            qvalue,
            threads,
        ),
        None => {
            // Should not reach here (handled above), but just in case
            print_no_args();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Custom help output
// ---------------------------------------------------------------------------

fn print_no_args() {
    println!("rdmr_stats v{}", VERSION);
    println!("Run `rdmr_stats -h` for usage or `rdmr_stats --help` for detailed information.");
}

fn print_short_help() {
    println!("rdmr_stats v{}", VERSION);
    println!();
    println!("Usage: rdmr_stats <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  run      Run differential expression and pathway enrichment");
    println!("  diffexp  Run the differential expression stage only");
    println!("  enrich   Run pathway enrichment on an existing results table");
    println!();
    println!("Run `rdmr_stats <COMMAND> -h` for command-specific options.");
}

fn print_long_help() {
    println!("rdmr_stats v{}", VERSION);
    println!("Differential expression and pathway enrichment for rare-disease multi-omics data");
    println!();
    println!("Usage: rdmr_stats <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  run      Run differential expression and pathway enrichment");
    println!("             - median-of-ratios size factors");
    println!("             - per-gene negative binomial Wald tests");
    println!("             - Benjamini-Hochberg adjusted p-values");
    println!("             - hypergeometric category over-representation");
    println!("  diffexp  Run the differential expression stage only");
    println!("  enrich   Run pathway enrichment on an existing results table");
    println!();
    println!("Global Options:");
    println!("  -v, --verbose    Enable verbose output");
    println!("  -h               Print short help");
    println!("      --help       Print detailed help");
    println!("  -V, --version    Print version");
    println!();
    println!("Examples:");
    println!("  rdmr_stats run -c counts.tsv -o de_results.tsv \\");
    println!("    --symbol-map symbols.json --categories categories.json");
    println!();
    println!("  rdmr_stats diffexp -c counts.tsv -o de_results.tsv --alpha 0.01");
    println!();
    println!("  rdmr_stats enrich -r de_results.tsv --symbol-map symbols.json \\");
    println!("    --categories categories.json -o enrichment.tsv");
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn configure_threads(threads: usize) {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }
}

fn load_counts(path: &str) -> Result<CountMatrix> {
    info!("Loading count matrix from: {}", path);
    let matrix = read_count_matrix(path)?;
    info!("  {} genes, {} samples", matrix.n_genes(), matrix.n_samples());
    Ok(matrix)
}

fn load_annotations(
    symbol_map_path: &str,
    categories_path: &str,
) -> Result<(HashMap<String, Vec<String>>, Vec<Category>)> {
    info!("Loading symbol map from: {}", symbol_map_path);
    let symbol_map = read_symbol_map(symbol_map_path)?;
    info!("Loading category database from: {}", categories_path);
    let categories = read_category_db(categories_path)?;
    info!("  {} symbols, {} categories", symbol_map.len(), categories.len());
    Ok((symbol_map, categories))
}

fn diffexp_stage(
    counts_path: &str,
    output_path: &str,
    alpha: f64,
    lfc: f64,
    min_disp: f64,
    maxit: usize,
    beta_tol: f64,
) -> Result<DeResults> {
    let matrix = load_counts(counts_path)?;

    let disp_params = DispersionParams { min_disp };
    let glm_params = GlmFitParams { maxit, beta_tol };
    let results = rdmr_stats::run_differential_expression(&matrix, &disp_params, &glm_params)?;

    info!("Writing results to: {}", output_path);
    write_de_results(output_path, &results)?;

    let summary = results.summary(alpha, lfc);
    println!("\n{}", summary);

    Ok(results)
}

fn enrichment_stage(
    results: &DeResults,
    symbol_map: &HashMap<String, Vec<String>>,
    categories: &[Category],
    output_path: &str,
    alpha: f64,
    lfc: f64,
    qvalue: f64,
) -> Result<()> {
    let params = EnrichmentParams {
        pvalue_cutoff: alpha,
        qvalue_cutoff: qvalue,
    };
    let outcome = rdmr_stats::run_enrichment(results, symbol_map, categories, alpha, lfc, &params)?;

    match &outcome.results {
        Some(enriched) => {
            info!("Writing enrichment results to: {}", output_path);
            write_enrichment_results(output_path, enriched)?;

            println!(
                "\nEnriched categories ({} of {} tested, universe size {}):",
                enriched.rows.len(),
                enriched.n_tested,
                enriched.universe_size
            );
            for row in enriched.rows.iter().take(10) {
                println!(
                    "  {}  {}  k={}/{}  fold={:.2}  padj={:.3e}",
                    row.category_id,
                    row.description,
                    row.overlap,
                    row.category_size,
                    row.fold_enrichment,
                    row.padj
                );
            }
        }
        None => {
            warn!("Enrichment {}", outcome.status);
        }
    }

    Ok(())
}

fn run_pipeline(
    counts_path: &str,
    output_path: &str,
    symbol_map_path: Option<&str>,
    categories_path: Option<&str>,
    enrichment_output: &str,
    alpha: f64,
    lfc: f64,
    qvalue: f64,
    min_disp: f64,
    maxit: usize,
    beta_tol: f64,
    threads: usize,
) -> Result<()> {
    configure_threads(threads);

    let results = diffexp_stage(
        counts_path,
        output_path,
        alpha,
        lfc,
        min_disp,
        maxit,
        beta_tol,
    )?;

    let (symbol_map_path, categories_path) = match (symbol_map_path, categories_path) {
        (Some(s), Some(c)) => (s, c),
        (None, None) => {
            info!("No annotation files given, skipping enrichment");
            return Ok(());
        }
        _ => {
            return Err(StatsError::InvalidInput {
                reason: "Enrichment needs both --symbol-map and --categories".to_string(),
            })
        }
    };

    // The expression table is already written, so unusable annotation files
    // degrade to a skipped enrichment stage instead of failing the run.
    let (symbol_map, categories) = match load_annotations(symbol_map_path, categories_path) {
        Ok(pair) => pair,
        Err(e) => {
            warn!("Enrichment skipped, annotation files unusable: {}", e);
            return Ok(());
        }
    };

    enrichment_stage(
        &results,
        &symbol_map,
        &categories,
        enrichment_output,
        alpha,
        lfc,
        qvalue,
    )
}

fn run_diffexp(
    counts_path: &str,
    output_path: &str,
    alpha: f64,
    lfc: f64,
    min_disp: f64,
    maxit: usize,
    beta_tol: f64,
    threads: usize,
) -> Result<()> {
    configure_threads(threads);
    diffexp_stage(
        counts_path,
        output_path,
        alpha,
        lfc,
        min_disp,
        maxit,
        beta_tol,
    )?;
    Ok(())
}

fn run_enrich(
    results_path: &str,
    symbol_map_path: &str,
    categories_path: &str,
    output_path: &str,
    alpha: f64,
    lfc: f64,
    qvalue: f64,
    threads: usize,
) -> Result<()> {
    configure_threads(threads);

    info!("Loading differential expression results from: {}", results_path);
    let results = read_de_results(results_path)?;
    info!("  {} genes", results.n_genes());

    let (symbol_map, categories) = load_annotations(symbol_map_path, categories_path)?;

    enrichment_stage(
        &results,
        &symbol_map,
        &categories,
        output_path,
        alpha,
        lfc,
        qvalue,
    )
}
