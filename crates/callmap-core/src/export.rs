//! Flow-map projection and JSON artifact persistence.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::errors::{CallmapError, CallmapResult};
use crate::indexer::callgraph::{AdjacencyMap, CallGraph};
use crate::indexer::inventory::SymbolInventory;
use crate::models::{CallEdge, FlowMap};

pub const EDGE_LIST_FILE: &str = "callgraph.json";
pub const CLASS_METADATA_FILE: &str = "class_metadata.json";
pub const METHOD_METADATA_FILE: &str = "method_metadata.json";
pub const CLASS_FLOW_MAP_FILE: &str = "class_flow_map.json";
pub const METHOD_FLOW_MAP_FILE: &str = "method_flow_map.json";
pub const ENRICHMENT_REPORT_FILE: &str = "enrichment_report.json";

// ---------------------------------------------------------------------------
// Flow maps
// ---------------------------------------------------------------------------

/// Project `forward` onto exactly the identifiers in `known`.
///
/// Identifiers with no outgoing edges map to an empty list; forward entries
/// for identifiers outside `known` are not emitted.
pub fn flow_map(known: &BTreeSet<String>, forward: &AdjacencyMap) -> FlowMap {
    known
        .iter()
        .map(|id| {
            let targets = forward
                .get(id)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default();
            (id.clone(), targets)
        })
        .collect()
}

/// Class and method flow maps over the inventory's key domain.
pub fn flow_maps(inventory: &SymbolInventory, graph: &CallGraph) -> (FlowMap, FlowMap) {
    (
        flow_map(&inventory.classes, &graph.class_forward),
        flow_map(&inventory.methods, &graph.method_forward),
    )
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Pretty-print `value` as JSON to `dir/name`, creating `dir` if needed.
pub fn write_artifact<T: Serialize + ?Sized>(
    dir: &Path,
    name: &str,
    value: &T,
) -> CallmapResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(&path, text)?;
    info!(path = %path.display(), "wrote artifact");
    Ok(path)
}

pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> CallmapResult<T> {
    if !path.is_file() {
        return Err(CallmapError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn load_edge_list(path: &Path) -> CallmapResult<Vec<CallEdge>> {
    read_artifact(path)
}
