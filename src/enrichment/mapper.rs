//! Gene symbol translation into the category database namespace

use std::collections::{HashMap, HashSet};

/// Result of mapping gene symbols to database identifiers.
///
/// "No genes mapped" is observable via `any_mapped`, distinct from a partial
/// mapping; callers decide whether enrichment is still meaningful.
#[derive(Debug, Clone)]
pub struct MappedGenes {
    /// Deduplicated identifiers, in first-seen order
    pub identifiers: Vec<String>,
    /// Input symbols with no known identifier
    pub unmapped: Vec<String>,
}

impl MappedGenes {
    pub fn any_mapped(&self) -> bool {
        !self.identifiers.is_empty()
    }

    pub fn n_mapped(&self) -> usize {
        self.identifiers.len()
    }
}

/// Translate gene symbols through a symbol -> identifiers table.
///
/// Unknown symbols are dropped and recorded as unmapped. A symbol with
/// several target identifiers contributes all of them; identifiers shared
/// by several symbols are counted once.
pub fn map_symbols(symbols: &[&str], table: &HashMap<String, Vec<String>>) -> MappedGenes {
    let mut seen = HashSet::new();
    let mut identifiers = Vec::new();
    let mut unmapped = Vec::new();

    for &symbol in symbols {
        match table.get(symbol) {
            Some(ids) if !ids.is_empty() => {
                for id in ids {
                    if seen.insert(id.clone()) {
                        identifiers.push(id.clone());
                    }
                }
            }
            _ => unmapped.push(symbol.to_string()),
        }
    }

    if !unmapped.is_empty() {
        log::warn!(
            "{} of {} gene symbols had no identifier mapping",
            unmapped.len(),
            symbols.len()
        );
    }

    MappedGenes {
        identifiers,
        unmapped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_table() -> HashMap<String, Vec<String>> {
        let mut table = HashMap::new();
        table.insert("TP53".to_string(), vec!["ENSG0000141510".to_string()]);
        table.insert(
            "DUX4".to_string(),
            vec!["ENSG0000260596".to_string(), "ENSG0000258389".to_string()],
        );
        table.insert("SHARED".to_string(), vec!["ENSG0000141510".to_string()]);
        table.insert("EMPTY".to_string(), vec![]);
        table
    }

    #[test]
    fn test_basic_mapping() {
        let mapped = map_symbols(&["TP53"], &example_table());
        assert_eq!(mapped.identifiers, vec!["ENSG0000141510"]);
        assert!(mapped.unmapped.is_empty());
        assert!(mapped.any_mapped());
    }

    #[test]
    fn test_one_to_many_symbol() {
        let mapped = map_symbols(&["DUX4"], &example_table());
        assert_eq!(mapped.n_mapped(), 2);
    }

    #[test]
    fn test_shared_identifier_counted_once() {
        let mapped = map_symbols(&["TP53", "SHARED"], &example_table());
        assert_eq!(mapped.identifiers, vec!["ENSG0000141510"]);
    }

    #[test]
    fn test_unknown_symbol_recorded() {
        let mapped = map_symbols(&["TP53", "NOSUCHGENE"], &example_table());
        assert_eq!(mapped.n_mapped(), 1);
        assert_eq!(mapped.unmapped, vec!["NOSUCHGENE"]);
    }

    #[test]
    fn test_empty_mapping_entry_is_unmapped() {
        let mapped = map_symbols(&["EMPTY"], &example_table());
        assert!(!mapped.any_mapped());
        assert_eq!(mapped.unmapped, vec!["EMPTY"]);
    }

    #[test]
    fn test_nothing_mapped() {
        let mapped = map_symbols(&["A", "B"], &HashMap::new());
        assert!(!mapped.any_mapped());
        assert_eq!(mapped.unmapped.len(), 2);
    }
}
