//! Run configuration and the guardrails applied to it.
//!
//! Every field has a default, so an absent or partial TOML file is valid.
//! Values are clamped to the guard constants after loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{CallmapError, CallmapResult};

// Guards
pub const SMALL_CLASS_THRESHOLD: usize = 5;
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const FALLBACK_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 256;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const MAX_ATTEMPTS_CAP: u32 = 10;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const MAX_WORKERS: usize = 64;

pub fn clamp_usize(value: usize, minimum: usize, maximum: usize) -> usize {
    value.max(minimum).min(maximum)
}

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Connection settings for the text-generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub api_base: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout_secs: 120,
            temperature: 0.1,
        }
    }
}

/// Batching and retry knobs for the enrichment stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub batch_size: usize,
    pub small_class_threshold: usize,
    pub fallback_batch_size: usize,
    pub workers: usize,
    pub primary_retry: RetryPolicy,
    pub fallback_retry: RetryPolicy,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            small_class_threshold: SMALL_CLASS_THRESHOLD,
            fallback_batch_size: FALLBACK_BATCH_SIZE,
            workers: 1,
            primary_retry: RetryPolicy::default(),
            fallback_retry: RetryPolicy::default(),
        }
    }
}

/// Input and output locations for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Raw `<sig> --> <sig>` dump from the static analyzer.
    pub callgraph_dump: PathBuf,
    /// Listing of every known method signature.
    pub method_listing: PathBuf,
    /// SQLite source-code store.
    pub source_store: PathBuf,
    /// Previously written edge list; used instead of the dump when set.
    pub edge_list: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            callgraph_dump: PathBuf::from("helper_data/sootup_output.txt"),
            method_listing: PathBuf::from("helper_data/all_methods.txt"),
            source_store: PathBuf::from("helper_data/source.db"),
            edge_list: None,
            output_dir: PathBuf::from("output_data"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub enrichment: EnrichmentConfig,
    pub generator: GeneratorConfig,
}

impl PipelineConfig {
    /// Load from a TOML file. A missing file is a config error, not a default.
    pub fn from_file(path: &Path) -> CallmapResult<Self> {
        if !path.exists() {
            return Err(CallmapError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> CallmapResult<Self> {
        let config: PipelineConfig =
            toml::from_str(text).map_err(|e| CallmapError::Config(e.to_string()))?;
        Ok(config.clamped())
    }

    /// Apply guard bounds to every tunable.
    pub fn clamped(mut self) -> Self {
        let e = &mut self.enrichment;
        e.batch_size = clamp_usize(e.batch_size, 1, MAX_BATCH_SIZE);
        e.fallback_batch_size = clamp_usize(e.fallback_batch_size, 1, MAX_BATCH_SIZE);
        e.workers = clamp_usize(e.workers, 1, MAX_WORKERS);
        for policy in [&mut e.primary_retry, &mut e.fallback_retry] {
            policy.max_attempts = policy.max_attempts.clamp(1, MAX_ATTEMPTS_CAP);
        }
        self
    }
}
