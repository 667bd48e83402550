//! End-to-end run orchestration.
//!
//! All required inputs are loaded before any generation request is made, so
//! a missing artifact aborts the run without partial output. Artifacts are
//! written once, at the end of their stage.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::enrich::generator::DocGenerator;
use crate::enrich::orchestrator::{EnrichmentReport, Orchestrator};
use crate::enrich::retry::Sleeper;
use crate::errors::CallmapResult;
use crate::export::{
    flow_maps, load_edge_list, write_artifact, CLASS_FLOW_MAP_FILE, CLASS_METADATA_FILE,
    EDGE_LIST_FILE, ENRICHMENT_REPORT_FILE, METHOD_FLOW_MAP_FILE, METHOD_METADATA_FILE,
};
use crate::indexer::callgraph::{load_dump, CallGraph};
use crate::indexer::inventory::load_inventory;
use crate::metadata::assemble_metadata;
use crate::models::CallEdge;
use crate::store::source_table::SourceIndex;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub edges: usize,
    pub skipped_lines: usize,
    pub classes: usize,
    pub methods: usize,
    pub documented_classes: usize,
    pub failed_classes: usize,
    pub given_up_classes: usize,
    pub elapsed_ms: u64,
}

/// Edges for the run: the configured edge list when set, else the raw dump.
/// Returns the edges and the number of dump lines skipped.
fn load_edges(config: &PipelineConfig) -> CallmapResult<(Vec<CallEdge>, usize)> {
    match &config.paths.edge_list {
        Some(path) => {
            let edges = load_edge_list(path)?;
            info!(path = %path.display(), edges = edges.len(), "loaded edge list");
            Ok((edges, 0))
        }
        None => {
            let parsed = load_dump(&config.paths.callgraph_dump)?;
            Ok((parsed.edges, parsed.skipped))
        }
    }
}

/// Parse the raw dump and write the edge list artifact.
pub fn run_callgraph_stage(config: &PipelineConfig) -> CallmapResult<RunStats> {
    let started = Instant::now();
    let parsed = load_dump(&config.paths.callgraph_dump)?;
    write_artifact(&config.paths.output_dir, EDGE_LIST_FILE, &parsed.edges)?;
    Ok(RunStats {
        edges: parsed.edges.len(),
        skipped_lines: parsed.skipped,
        elapsed_ms: started.elapsed().as_millis() as u64,
        ..RunStats::default()
    })
}

/// Build the graph and write only the flow maps.
pub fn run_flow_stage(config: &PipelineConfig) -> CallmapResult<RunStats> {
    let started = Instant::now();
    let inventory = load_inventory(&config.paths.method_listing)?;
    let (edges, skipped_lines) = load_edges(config)?;
    let graph = CallGraph::from_edges(&edges);

    let (class_flows, method_flows) = flow_maps(&inventory, &graph);
    write_artifact(&config.paths.output_dir, CLASS_FLOW_MAP_FILE, &class_flows)?;
    write_artifact(&config.paths.output_dir, METHOD_FLOW_MAP_FILE, &method_flows)?;

    Ok(RunStats {
        edges: edges.len(),
        skipped_lines,
        classes: inventory.classes.len(),
        methods: inventory.methods.len(),
        elapsed_ms: started.elapsed().as_millis() as u64,
        ..RunStats::default()
    })
}

/// Full run: edge list, documentation, metadata, flow maps, report.
pub fn run_pipeline(
    config: &PipelineConfig,
    generator: &dyn DocGenerator,
    sleeper: &dyn Sleeper,
) -> CallmapResult<RunStats> {
    let started = Instant::now();
    let out = &config.paths.output_dir;

    let inventory = load_inventory(&config.paths.method_listing)?;
    let sources = SourceIndex::open(&config.paths.source_store)?;
    let (edges, skipped_lines) = load_edges(config)?;
    if config.paths.edge_list.is_none() {
        write_artifact(out, EDGE_LIST_FILE, &edges)?;
    }

    let orchestrator = Orchestrator::new(
        generator,
        sleeper,
        &inventory,
        &sources,
        &config.enrichment,
    );
    let enrichment = orchestrator.run(&inventory.classes);
    report_given_up(&enrichment.report);

    let (class_metadata, method_metadata) =
        assemble_metadata(&inventory, &enrichment.docs, &sources);
    write_artifact(out, CLASS_METADATA_FILE, &class_metadata)?;
    write_artifact(out, METHOD_METADATA_FILE, &method_metadata)?;

    let graph = CallGraph::from_edges(&edges);
    let (class_flows, method_flows) = flow_maps(&inventory, &graph);
    write_artifact(out, CLASS_FLOW_MAP_FILE, &class_flows)?;
    write_artifact(out, METHOD_FLOW_MAP_FILE, &method_flows)?;
    write_artifact(out, ENRICHMENT_REPORT_FILE, &enrichment.report)?;

    let stats = RunStats {
        edges: edges.len(),
        skipped_lines,
        classes: inventory.classes.len(),
        methods: inventory.methods.len(),
        documented_classes: enrichment.docs.classes.len(),
        failed_classes: enrichment.report.failed.len(),
        given_up_classes: enrichment.report.given_up.len(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(?stats, "run complete");
    Ok(stats)
}

fn report_given_up(report: &EnrichmentReport) {
    if report.given_up.is_empty() {
        return;
    }
    warn!(
        count = report.given_up.len(),
        classes = ?report.given_up,
        "unable to fully generate documentation"
    );
}
