//! SQLite schema for the source-code store.
//!
//! Column names follow the extraction tool that fills the store:
//! `class_data(class_name, source_code)` and
//! `method_data(name, class_name, source_code)`. Keys are not unique; the
//! lookup index resolves duplicates.

use rusqlite::Connection;

use crate::errors::CallmapResult;

pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS class_data (
        class_name TEXT NOT NULL,
        source_code TEXT
    );",
    "CREATE TABLE IF NOT EXISTS method_data (
        name TEXT NOT NULL,
        class_name TEXT NOT NULL,
        source_code TEXT
    );",
    "CREATE INDEX IF NOT EXISTS idx_class_data_name ON class_data(class_name);",
    "CREATE INDEX IF NOT EXISTS idx_method_data_key ON method_data(name, class_name);",
];

/// Create the store tables. Safe to replay on an initialised database.
pub fn init_schema(conn: &Connection) -> CallmapResult<()> {
    for stmt in SCHEMA_STATEMENTS {
        conn.execute_batch(stmt)?;
    }
    Ok(())
}

pub fn has_table(conn: &Connection, table: &str) -> CallmapResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_both_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        assert!(has_table(&conn, "class_data").unwrap());
        assert!(has_table(&conn, "method_data").unwrap());
        assert!(!has_table(&conn, "symbols").unwrap());
    }

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO class_data(class_name, source_code) VALUES ('B', 'class B {}');",
            [],
        )
        .unwrap();
        init_schema(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM class_data;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
