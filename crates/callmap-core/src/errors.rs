//! Error types for the callmap core library.

use std::path::PathBuf;

/// Top-level error enum for the callmap core library.
///
/// Line-level parse failures and source-table misses are not errors: the
/// parser returns `None` and the assembler substitutes sentinels.
#[derive(Debug, thiserror::Error)]
pub enum CallmapError {
    #[error("Required input missing: {}", path.display())]
    MissingInput { path: PathBuf },

    /// Unreadable or invalid configuration, including TOML decode errors.
    #[error("Config error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CallmapError {
    /// Whether the error aborts the whole run rather than a single attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CallmapError::MissingInput { .. } | CallmapError::Config(_)
        )
    }
}

pub type CallmapResult<T> = Result<T, CallmapError>;
