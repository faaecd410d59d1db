//! Input/Output operations for the analysis pipeline

mod annotations;
mod csv;
mod results;

pub use self::csv::{
    read_count_matrix, read_de_results, write_de_results, write_enrichment_results,
};
pub use annotations::{read_category_db, read_symbol_map};
pub use results::{DeResults, DeSummary};
