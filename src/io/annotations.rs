//! Readers for gene annotation files used by the enrichment stage

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::enrichment::Category;
use crate::error::{Result, StatsError};

#[derive(Debug, Deserialize)]
struct CategoryRecord {
    description: String,
    members: Vec<String>,
}

/// Read a symbol-to-identifier mapping from a JSON file
///
/// Expected format: an object keyed by gene symbol, each value a list of
/// stable identifiers, e.g. `{"HEXA": ["ENSG00000213614"]}`. A symbol may
/// map to more than one identifier.
pub fn read_symbol_map<P: AsRef<Path>>(path: P) -> Result<HashMap<String, Vec<String>>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let table: HashMap<String, Vec<String>> = serde_json::from_reader(reader)?;

    if table.is_empty() {
        return Err(StatsError::EmptyData {
            reason: "Symbol mapping table contains no entries".to_string(),
        });
    }

    Ok(table)
}

/// Read a category database from a JSON file
///
/// Expected format: an object keyed by category id, each value holding a
/// `description` string and a `members` identifier list. Categories come
/// back sorted by id so downstream output is deterministic.
pub fn read_category_db<P: AsRef<Path>>(path: P) -> Result<Vec<Category>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let records: HashMap<String, CategoryRecord> = serde_json::from_reader(reader)?;

    if records.is_empty() {
        return Err(StatsError::EmptyData {
            reason: "Category database contains no entries".to_string(),
        });
    }

    let mut categories: Vec<Category> = records
        .into_iter()
        .map(|(id, record)| Category {
            id,
            description: record.description,
            members: record.members,
        })
        .collect();
    categories.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(categories)
}
