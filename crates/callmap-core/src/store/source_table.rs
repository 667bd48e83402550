//! Read-only lookup index over the source-code store.
//!
//! Built once per run and passed by reference. Lookups return zero or one
//! row: when the table holds several rows for a key, the first in table
//! order wins and the duplicates are reported as a data-quality anomaly.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info, warn};

use crate::errors::{CallmapError, CallmapResult};
use crate::store::schema::has_table;

#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    classes: HashMap<String, String>,
    /// Keyed by (method name, bare class name).
    methods: HashMap<(String, String), String>,
    duplicate_classes: usize,
    duplicate_methods: usize,
}

impl SourceIndex {
    /// Open the store at `path` read-only and index it. The store is never
    /// created implicitly; a missing file aborts the run.
    pub fn open(path: &Path) -> CallmapResult<Self> {
        if !path.is_file() {
            return Err(CallmapError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let index = Self::from_connection(&conn)?;
        info!(
            path = %path.display(),
            classes = index.classes.len(),
            methods = index.methods.len(),
            "indexed source store"
        );
        Ok(index)
    }

    pub fn from_connection(conn: &Connection) -> CallmapResult<Self> {
        for table in ["class_data", "method_data"] {
            if !has_table(conn, table)? {
                return Err(CallmapError::Config(format!(
                    "source store is missing table {table}"
                )));
            }
        }

        let mut index = Self::default();

        let mut stmt =
            conn.prepare("SELECT class_name, source_code FROM class_data ORDER BY rowid;")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            ))
        })?;
        for row in rows {
            let (class_name, code) = row?;
            index.insert_class(class_name, code);
        }

        let mut stmt = conn
            .prepare("SELECT name, class_name, source_code FROM method_data ORDER BY rowid;")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            ))
        })?;
        for row in rows {
            let (method_name, class_name, code) = row?;
            index.insert_method(method_name, class_name, code);
        }

        if index.duplicate_classes > 0 || index.duplicate_methods > 0 {
            warn!(
                duplicate_classes = index.duplicate_classes,
                duplicate_methods = index.duplicate_methods,
                "source store has duplicate keys; keeping first row of each"
            );
        }
        Ok(index)
    }

    pub fn insert_class(&mut self, class_name: String, code: String) {
        if self.classes.contains_key(&class_name) {
            debug!(class = %class_name, "duplicate class row ignored");
            self.duplicate_classes += 1;
            return;
        }
        self.classes.insert(class_name, code);
    }

    pub fn insert_method(&mut self, method_name: String, class_name: String, code: String) {
        let key = (method_name, class_name);
        if self.methods.contains_key(&key) {
            debug!(method = %key.0, class = %key.1, "duplicate method row ignored");
            self.duplicate_methods += 1;
            return;
        }
        self.methods.insert(key, code);
    }

    /// Source of the class whose bare name is `class_name`.
    pub fn class_source(&self, class_name: &str) -> Option<&str> {
        self.classes.get(class_name).map(String::as_str)
    }

    /// Source of `method_name` in the class whose bare name is `class_name`.
    pub fn method_source(&self, method_name: &str, class_name: &str) -> Option<&str> {
        self.methods
            .get(&(method_name.to_string(), class_name.to_string()))
            .map(String::as_str)
    }

    pub fn duplicate_counts(&self) -> (usize, usize) {
        (self.duplicate_classes, self.duplicate_methods)
    }
}
