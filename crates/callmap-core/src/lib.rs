//! Callmap core library: call-graph ingestion, documentation enrichment,
//! and metadata / flow-map export for object-oriented codebases.
//!
//! A run reads three inputs (the analyzer's call-graph dump, the listing of
//! every known method signature, and a SQLite source-code store), builds
//! class- and method-level adjacency, asks a text-generation endpoint for
//! JavaDoc per class in bounded batches, and writes keyed JSON artifacts.

pub mod config;
pub mod enrich;
pub mod errors;
pub mod export;
pub mod indexer;
pub mod metadata;
pub mod models;
pub mod store;

pub use config::PipelineConfig;
pub use errors::{CallmapError, CallmapResult};
pub use indexer::pipeline::{run_callgraph_stage, run_flow_stage, run_pipeline, RunStats};
