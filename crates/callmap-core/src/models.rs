//! Shared typed models used across ingestion, enrichment, and export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifier conventions
// ---------------------------------------------------------------------------

/// Separator between a class identifier and a method name in method keys.
pub const METHOD_SEPARATOR: char = '.';

/// Code placeholder for methods without a row in the source table.
pub const NO_CODE_PARSED: &str = "no code parsed";

/// Documentation placeholder for symbols whose generation was given up.
pub const FAILED_TO_GENERATE: &str = "failed to generate";

/// Build the method identifier `<class>.<method>`.
pub fn method_key(class_name: &str, method_name: &str) -> String {
    format!("{class_name}{METHOD_SEPARATOR}{method_name}")
}

/// Last path segment of a fully qualified identifier (`com.a.B` -> `B`).
pub fn bare_name(identifier: &str) -> &str {
    identifier
        .rsplit(METHOD_SEPARATOR)
        .next()
        .unwrap_or(identifier)
}

/// Identifier -> generated documentation text.
pub type DocumentationMap = BTreeMap<String, String>;

/// Identifier -> directly reachable identifiers.
pub type FlowMap = BTreeMap<String, Vec<String>>;

// ---------------------------------------------------------------------------
// Edge records
// ---------------------------------------------------------------------------

/// One endpoint of a call edge, as stored in the edge-list artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRef {
    pub class: String,
    pub method: String,
}

impl SymbolRef {
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Method identifier for this endpoint.
    pub fn method_id(&self) -> String {
        method_key(&self.class, &self.method)
    }

    pub fn is_complete(&self) -> bool {
        !self.class.is_empty() && !self.method.is_empty()
    }
}

/// A directed call edge between two methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallEdge {
    pub source: SymbolRef,
    pub target: SymbolRef,
}

// ---------------------------------------------------------------------------
// Metadata records
// ---------------------------------------------------------------------------

/// Per-class output record. `code` is `None` when the source table has no
/// row for the class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetadata {
    pub docstring: String,
    pub code: Option<String>,
}

/// Per-method output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMetadata {
    pub code: String,
    pub docstring: String,
}
