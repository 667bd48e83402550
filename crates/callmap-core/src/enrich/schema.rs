//! Per-request response schema and reply validation.
//!
//! Each generation request declares the exact set of symbols it expects
//! back: the class key plus every method key in the batch, each an optional
//! text field. Replies are decoded as JSON and checked against that set.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::errors::{CallmapError, CallmapResult};

const SCHEMA_TITLE: &str = "Documentation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    OptionalText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSchema {
    class_key: String,
    fields: IndexMap<String, FieldType>,
}

/// Decoded reply: every schema field that came back with text.
pub type SymbolDocs = IndexMap<String, String>;

impl ResponseSchema {
    /// Fields are `{class_key} ∪ methods`, class first, in batch order.
    pub fn for_batch(class_key: &str, methods: &[String]) -> Self {
        let mut fields = IndexMap::with_capacity(methods.len() + 1);
        fields.insert(class_key.to_string(), FieldType::OptionalText);
        for method in methods {
            fields.insert(method.clone(), FieldType::OptionalText);
        }
        Self {
            class_key: class_key.to_string(),
            fields,
        }
    }

    pub fn class_key(&self) -> &str {
        &self.class_key
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON-schema object suitable for structured-output endpoints.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for (name, field_type) in &self.fields {
            let property = match field_type {
                FieldType::OptionalText => json!({
                    "anyOf": [{ "type": "string" }, { "type": "null" }],
                    "default": null,
                    "title": name,
                }),
            };
            properties.insert(name.clone(), property);
        }
        json!({
            "title": SCHEMA_TITLE,
            "type": "object",
            "properties": properties,
        })
    }

    /// Decode a reply body into symbol docs.
    ///
    /// Keys outside the schema are dropped. Non-text values, a non-object
    /// body, or a method field that is absent or null are violations. The
    /// class key may be absent here; callers enforce it per class.
    pub fn validate(&self, reply: &str) -> CallmapResult<SymbolDocs> {
        let value: Value = serde_json::from_str(reply.trim())?;
        let Value::Object(object) = value else {
            return Err(CallmapError::SchemaViolation(
                "reply is not a JSON object".to_string(),
            ));
        };

        let mut decoded: HashMap<String, String> = HashMap::with_capacity(object.len());
        for (key, value) in object {
            if !self.fields.contains_key(&key) {
                debug!(key = %key, "dropping field outside response schema");
                continue;
            }
            match value {
                Value::String(text) => {
                    decoded.insert(key, text);
                }
                Value::Null => {}
                other => {
                    return Err(CallmapError::SchemaViolation(format!(
                        "field {key} is not text: {other}"
                    )));
                }
            }
        }

        let mut docs = SymbolDocs::with_capacity(decoded.len());
        for name in self.field_names() {
            match decoded.remove(name) {
                Some(text) => {
                    docs.insert(name.to_string(), text);
                }
                None if name == self.class_key => {}
                None => {
                    return Err(CallmapError::SchemaViolation(format!(
                        "no documentation for {name}"
                    )));
                }
            }
        }
        Ok(docs)
    }
}
