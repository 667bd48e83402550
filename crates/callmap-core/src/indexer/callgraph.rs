//! Call graph construction from the analyzer dump.
//!
//! Each dump line has the shape `<sig> --> <sig>`. Lines are parsed into
//! method-level [`CallEdge`]s, then folded into four adjacency sets (class
//! and method granularity, forward and reverse).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::errors::{CallmapError, CallmapResult};
use crate::indexer::signature::{parse_signature, strip_brackets, utf8_lines};
use crate::models::{CallEdge, SymbolRef};

/// Directional marker between caller and callee in a dump line.
pub const CALL_MARKER: &str = "-->";

/// Identifier -> set of identifiers one edge away.
pub type AdjacencyMap = BTreeMap<String, BTreeSet<String>>;

// ---------------------------------------------------------------------------
// Dump parsing
// ---------------------------------------------------------------------------

/// Edges extracted from a dump, with line accounting.
#[derive(Debug, Clone, Default)]
pub struct ParsedDump {
    /// Distinct edges in first-seen order.
    pub edges: Vec<CallEdge>,
    pub lines_seen: usize,
    /// Lines with a marker whose endpoints failed to parse, plus lines that
    /// are not valid UTF-8.
    pub skipped: usize,
    /// Lines without a marker.
    pub unmarked: usize,
}

/// Parse a single dump line. Returns `None` when the marker is missing or
/// either endpoint does not match the signature grammar.
pub fn parse_dump_line(line: &str) -> Option<CallEdge> {
    let (left, right) = line.split_once(CALL_MARKER)?;
    let source = parse_signature(strip_brackets(left))?;
    let target = parse_signature(strip_brackets(right))?;
    Some(CallEdge {
        source: SymbolRef::new(source.class_name, source.method_name),
        target: SymbolRef::new(target.class_name, target.method_name),
    })
}

pub fn parse_dump(text: &str) -> ParsedDump {
    parse_dump_lines(text.lines())
}

fn parse_dump_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> ParsedDump {
    let mut parsed = ParsedDump::default();
    let mut seen: HashSet<CallEdge> = HashSet::new();

    for line in lines {
        parsed.lines_seen += 1;
        if !line.contains(CALL_MARKER) {
            parsed.unmarked += 1;
            continue;
        }
        match parse_dump_line(line) {
            Some(edge) => {
                if seen.insert(edge.clone()) {
                    parsed.edges.push(edge);
                }
            }
            None => {
                debug!(line, "skipping unparseable call edge");
                parsed.skipped += 1;
            }
        }
    }

    parsed
}

/// Read and parse the dump at `path`. A missing dump aborts the run; lines
/// that are not valid UTF-8 are counted as skipped.
pub fn load_dump(path: &Path) -> CallmapResult<ParsedDump> {
    if !path.is_file() {
        return Err(CallmapError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)?;
    let (lines, invalid) = utf8_lines(&bytes);
    if invalid > 0 {
        warn!(path = %path.display(), invalid, "skipping dump lines that are not UTF-8");
    }
    let mut parsed = parse_dump_lines(lines);
    parsed.lines_seen += invalid;
    parsed.skipped += invalid;
    info!(
        lines = parsed.lines_seen,
        edges = parsed.edges.len(),
        skipped = parsed.skipped,
        unmarked = parsed.unmarked,
        "parsed call graph dump"
    );
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Bidirectional adjacency at class and method granularity.
///
/// For every inserted edge `a -> b`, `b` is in `forward[a]` and `a` is in
/// `reverse[b]` at both granularities. Insertion is additive and idempotent.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    pub class_forward: AdjacencyMap,
    pub class_reverse: AdjacencyMap,
    pub method_forward: AdjacencyMap,
    pub method_reverse: AdjacencyMap,
    /// First-seen owning class of each method identifier.
    pub method_to_class: HashMap<String, String>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a CallEdge>) -> Self {
        let mut graph = Self::new();
        let mut skipped = 0usize;
        for edge in edges {
            if !graph.insert_edge(edge) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            debug!(skipped, "ignored incomplete edge records");
        }
        graph
    }

    /// Insert one edge. Returns `false` (and changes nothing) when either
    /// endpoint is incomplete.
    pub fn insert_edge(&mut self, edge: &CallEdge) -> bool {
        if !edge.source.is_complete() || !edge.target.is_complete() {
            return false;
        }
        let source_class = &edge.source.class;
        let target_class = &edge.target.class;
        let source_method = edge.source.method_id();
        let target_method = edge.target.method_id();

        self.method_to_class
            .entry(source_method.clone())
            .or_insert_with(|| source_class.clone());
        self.method_to_class
            .entry(target_method.clone())
            .or_insert_with(|| target_class.clone());

        link(
            &mut self.class_forward,
            &mut self.class_reverse,
            source_class,
            target_class,
        );
        link(
            &mut self.method_forward,
            &mut self.method_reverse,
            &source_method,
            &target_method,
        );
        true
    }

    pub fn class_callees(&self, class_name: &str) -> Option<&BTreeSet<String>> {
        self.class_forward.get(class_name)
    }

    pub fn method_callers(&self, method_id: &str) -> Option<&BTreeSet<String>> {
        self.method_reverse.get(method_id)
    }

    pub fn method_edge_count(&self) -> usize {
        self.method_forward.values().map(BTreeSet::len).sum()
    }
}

fn link(forward: &mut AdjacencyMap, reverse: &mut AdjacencyMap, from: &str, to: &str) {
    forward
        .entry(from.to_string())
        .or_default()
        .insert(to.to_string());
    reverse
        .entry(to.to_string())
        .or_default()
        .insert(from.to_string());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "<com.a.B: void foo()> --> <com.a.C: int bar(int)>";

    fn edge(sc: &str, sm: &str, tc: &str, tm: &str) -> CallEdge {
        CallEdge {
            source: SymbolRef::new(sc, sm),
            target: SymbolRef::new(tc, tm),
        }
    }

    #[test]
    fn test_parse_dump_line() {
        assert_eq!(
            parse_dump_line(LINE),
            Some(edge("com.a.B", "foo", "com.a.C", "bar"))
        );
    }

    #[test]
    fn test_parse_dump_line_rejects_bad_endpoint() {
        assert_eq!(parse_dump_line("<com.a.B: void foo()> --> <garbage>"), None);
        assert_eq!(parse_dump_line("<com.a.B: void foo()>"), None);
    }

    #[test]
    fn test_parse_dump_counts_and_dedupes() {
        let text = format!(
            "Call graph for 3 entry points\n{LINE}\n{LINE}\n<x> --> <y>\n\
             <com.a.C: int bar(int)> --> <com.a.D: void qux(java.util.Map<K,V>)>\n"
        );
        let parsed = parse_dump(&text);
        assert_eq!(parsed.lines_seen, 5);
        assert_eq!(parsed.unmarked, 1);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.edges.len(), 2);
        assert_eq!(parsed.edges[1].target, SymbolRef::new("com.a.D", "qux"));
    }

    #[test]
    fn test_load_dump_skips_non_utf8_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sootup_output.txt");
        let mut bytes = b"Call graph:\n".to_vec();
        bytes.extend_from_slice(LINE.as_bytes());
        bytes.extend_from_slice(b"\n<com.a.\xE9: void x()> --> <com.a.C: int bar(int)>\n");
        std::fs::write(&path, bytes).unwrap();

        let parsed = load_dump(&path).unwrap();
        assert_eq!(parsed.edges, vec![edge("com.a.B", "foo", "com.a.C", "bar")]);
        assert_eq!(parsed.lines_seen, 3);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.unmarked, 1);
    }

    #[test]
    fn test_graph_records_both_granularities() {
        let parsed = parse_dump(LINE);
        let graph = CallGraph::from_edges(&parsed.edges);

        assert!(graph.class_forward["com.a.B"].contains("com.a.C"));
        assert!(graph.class_reverse["com.a.C"].contains("com.a.B"));
        assert!(graph.method_forward["com.a.B.foo"].contains("com.a.C.bar"));
        assert!(graph.method_reverse["com.a.C.bar"].contains("com.a.B.foo"));
        assert!(!graph.method_reverse.contains_key("com.a.B.foo"));
        assert_eq!(graph.method_to_class["com.a.B.foo"], "com.a.B");
        assert_eq!(graph.method_to_class["com.a.C.bar"], "com.a.C");
    }

    #[test]
    fn test_duplicate_insertion_is_idempotent() {
        let e = edge("com.a.B", "foo", "com.a.C", "bar");
        let mut graph = CallGraph::new();
        assert!(graph.insert_edge(&e));
        let before = graph.method_forward.clone();
        assert!(graph.insert_edge(&e));
        assert_eq!(graph.method_forward, before);
        assert_eq!(graph.method_edge_count(), 1);
        assert_eq!(graph.class_callees("com.a.B").unwrap().len(), 1);
    }

    #[test]
    fn test_incomplete_edge_is_skipped() {
        let mut graph = CallGraph::new();
        assert!(!graph.insert_edge(&edge("com.a.B", "", "com.a.C", "bar")));
        assert!(graph.class_forward.is_empty());
        assert!(graph.method_to_class.is_empty());
    }

    #[test]
    fn test_forward_reverse_consistency() {
        let edges = vec![
            edge("A", "a", "B", "b"),
            edge("A", "a", "C", "c"),
            edge("B", "b", "C", "c"),
            edge("C", "c", "A", "a"),
            edge("A", "x", "A", "a"),
        ];
        let graph = CallGraph::from_edges(&edges);
        for (from, targets) in &graph.method_forward {
            for to in targets {
                assert!(graph.method_reverse[to].contains(from));
            }
        }
        for (from, targets) in &graph.class_forward {
            for to in targets {
                assert!(graph.class_reverse[to].contains(from));
            }
        }
        assert!(graph.class_forward["A"].contains("A"));
        assert_eq!(graph.method_callers("A.a").unwrap().len(), 2);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let edges = vec![
            edge("A", "a", "B", "b"),
            edge("B", "b", "C", "c"),
            edge("A", "a", "C", "c"),
        ];
        let forward = CallGraph::from_edges(&edges);
        let backward = CallGraph::from_edges(edges.iter().rev());
        assert_eq!(forward.method_forward, backward.method_forward);
        assert_eq!(forward.class_reverse, backward.class_reverse);
    }
}
