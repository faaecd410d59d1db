//! Functional category enrichment for significant gene sets

mod hypergeom;
mod mapper;

pub use hypergeom::{
    test_enrichment, Category, EnrichmentParams, EnrichmentResults, EnrichmentRow,
};
pub use mapper::{map_symbols, MappedGenes};
