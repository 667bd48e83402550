//! Inventory of every known class and method.
//!
//! Built from the analyzer's method listing (one signature per line). The
//! inventory defines the key domain of metadata and flow-map artifacts.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::errors::{CallmapError, CallmapResult};
use crate::indexer::signature::{parse_signature, utf8_lines};
use crate::models::method_key;

#[derive(Debug, Clone, Default)]
pub struct SymbolInventory {
    pub classes: BTreeSet<String>,
    pub methods: BTreeSet<String>,
    pub method_to_class: HashMap<String, String>,
    pub class_to_methods: BTreeMap<String, BTreeSet<String>>,
    pub skipped_lines: usize,
}

impl SymbolInventory {
    pub fn insert(&mut self, class_name: &str, method_name: &str) {
        let method_id = method_key(class_name, method_name);
        self.classes.insert(class_name.to_string());
        self.method_to_class
            .entry(method_id.clone())
            .or_insert_with(|| class_name.to_string());
        self.class_to_methods
            .entry(class_name.to_string())
            .or_default()
            .insert(method_id.clone());
        self.methods.insert(method_id);
    }

    /// Method identifiers owned by `class_name`, sorted.
    pub fn methods_of(&self, class_name: &str) -> Option<&BTreeSet<String>> {
        self.class_to_methods.get(class_name)
    }

    pub fn class_of(&self, method_id: &str) -> Option<&str> {
        self.method_to_class.get(method_id).map(String::as_str)
    }
}

/// Build an inventory from listing text. Unparseable lines are counted and
/// skipped.
pub fn parse_inventory(text: &str) -> SymbolInventory {
    parse_inventory_lines(text.lines())
}

fn parse_inventory_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> SymbolInventory {
    let mut inventory = SymbolInventory::default();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        match parse_signature(line) {
            Some(sig) => inventory.insert(&sig.class_name, &sig.method_name),
            None => {
                debug!(line, "skipping unparseable method listing line");
                inventory.skipped_lines += 1;
            }
        }
    }
    inventory
}

/// Read and parse the method listing at `path`. Lines that are not valid
/// UTF-8 are counted as skipped.
pub fn load_inventory(path: &Path) -> CallmapResult<SymbolInventory> {
    if !path.is_file() {
        return Err(CallmapError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)?;
    let (lines, invalid) = utf8_lines(&bytes);
    if invalid > 0 {
        warn!(path = %path.display(), invalid, "skipping listing lines that are not UTF-8");
    }
    let mut inventory = parse_inventory_lines(lines);
    inventory.skipped_lines += invalid;
    info!(
        classes = inventory.classes.len(),
        methods = inventory.methods.len(),
        skipped = inventory.skipped_lines,
        "loaded method inventory"
    );
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "<com.a.B: void foo()>\n\
                           <com.a.B: int bar(int)>\n\
                           \n\
                           garbage line\n\
                           <com.a.C: java.lang.String baz()>\n\
                           <com.a.B: void foo()>\n";

    #[test]
    fn test_parse_inventory_collects_classes_and_methods() {
        let inv = parse_inventory(LISTING);
        assert_eq!(
            inv.classes.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["com.a.B", "com.a.C"]
        );
        assert_eq!(inv.methods.len(), 3);
        assert_eq!(inv.skipped_lines, 1);
    }

    #[test]
    fn test_class_method_relations() {
        let inv = parse_inventory(LISTING);
        let methods = inv.methods_of("com.a.B").unwrap();
        assert!(methods.contains("com.a.B.foo"));
        assert!(methods.contains("com.a.B.bar"));
        assert_eq!(inv.class_of("com.a.C.baz"), Some("com.a.C"));
        assert_eq!(inv.class_of("com.a.Z.nope"), None);
    }

    #[test]
    fn test_load_inventory_skips_non_utf8_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_methods.txt");
        std::fs::write(
            &path,
            b"<com.a.B: void foo()>\n<com.a.\xE9: void bad()>\n<com.a.C: int bar(int)>\n",
        )
        .unwrap();

        let inv = load_inventory(&path).unwrap();
        assert_eq!(inv.methods.len(), 2);
        assert!(inv.methods.contains("com.a.B.foo"));
        assert!(inv.methods.contains("com.a.C.bar"));
        assert_eq!(inv.skipped_lines, 1);
    }

    #[test]
    fn test_load_inventory_missing_file_is_structural() {
        let err = load_inventory(Path::new("/nonexistent/all_methods.txt")).unwrap_err();
        assert!(matches!(err, CallmapError::MissingInput { .. }));
    }
}
