use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use tracing::error;
use tracing_subscriber::EnvFilter;

use callmap_core::enrich::generator::OllamaGenerator;
use callmap_core::enrich::retry::ThreadSleeper;
use callmap_core::store::schema::init_schema;
use callmap_core::{
    run_callgraph_stage, run_flow_stage, run_pipeline, CallmapError, PipelineConfig, RunStats,
};

/// Missing or invalid inputs; nothing was generated.
const EXIT_FATAL: u8 = 2;
const EXIT_FAILURE: u8 = 1;

#[derive(Parser)]
#[command(name = "callmap")]
#[command(about = "Call-graph metadata and flow-map generator", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "CALLMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for generated artifacts
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the analyzer dump into the edge list artifact
    Callgraph(InputArgs),

    /// Write class and method flow maps without generating documentation
    Flows(InputArgs),

    /// Run the full pipeline: edges, documentation, metadata, flow maps
    Run {
        #[command(flatten)]
        inputs: InputArgs,

        /// Methods per generation request for large classes
        #[arg(long)]
        batch_size: Option<usize>,

        /// Classes documented concurrently
        #[arg(short, long)]
        workers: Option<usize>,

        /// Generation endpoint base URL
        #[arg(long, env = "CALLMAP_API_BASE")]
        api_base: Option<String>,

        /// Generation model name
        #[arg(long, env = "CALLMAP_MODEL")]
        model: Option<String>,
    },

    /// Create an empty source-code store
    InitStore {
        /// Database file to create
        path: PathBuf,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Raw call-graph dump (`<sig> --> <sig>` per line)
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Listing of all known method signatures
    #[arg(long)]
    methods: Option<PathBuf>,

    /// SQLite source-code store
    #[arg(long)]
    store: Option<PathBuf>,

    /// Previously written edge list to use instead of the dump
    #[arg(long)]
    edges: Option<PathBuf>,
}

impl InputArgs {
    fn apply(self, config: &mut PipelineConfig) {
        let paths = &mut config.paths;
        if let Some(dump) = self.dump {
            paths.callgraph_dump = dump;
        }
        if let Some(methods) = self.methods {
            paths.method_listing = methods;
        }
        if let Some(store) = self.store {
            paths.source_store = store;
        }
        if self.edges.is_some() {
            paths.edge_list = self.edges;
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config.paths.output_dir = dir.clone();
    }
    Ok(config)
}

fn print_stats(stats: &RunStats) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

/// Exit status for a failed command: structural failures get their own code.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CallmapError>() {
        Some(e) if e.is_fatal() => EXIT_FATAL,
        _ => EXIT_FAILURE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code_for(&err);
            if code == EXIT_FATAL {
                error!("aborting before any generation: {err:#}");
            } else {
                error!("{err:#}");
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Callgraph(inputs) => {
            inputs.apply(&mut config);
            let stats = run_callgraph_stage(&config).context("building edge list")?;
            print_stats(&stats)?;
        }
        Commands::Flows(inputs) => {
            inputs.apply(&mut config);
            let stats = run_flow_stage(&config).context("building flow maps")?;
            print_stats(&stats)?;
        }
        Commands::Run {
            inputs,
            batch_size,
            workers,
            api_base,
            model,
        } => {
            inputs.apply(&mut config);
            if let Some(batch_size) = batch_size {
                config.enrichment.batch_size = batch_size;
            }
            if let Some(workers) = workers {
                config.enrichment.workers = workers;
            }
            if let Some(api_base) = api_base {
                config.generator.api_base = api_base;
            }
            if let Some(model) = model {
                config.generator.model = model;
            }
            let config = config.clamped();

            let generator =
                OllamaGenerator::new(&config.generator).context("creating generation client")?;
            let stats = run_pipeline(&config, &generator, &ThreadSleeper).context("pipeline run")?;
            if stats.given_up_classes > 0 {
                eprintln!(
                    "Unable to fully generate documentation for {} class(es); see {}",
                    stats.given_up_classes,
                    config
                        .paths
                        .output_dir
                        .join(callmap_core::export::ENRICHMENT_REPORT_FILE)
                        .display()
                );
            }
            print_stats(&stats)?;
        }
        Commands::InitStore { path } => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let conn = Connection::open(&path)
                .with_context(|| format!("creating store {}", path.display()))?;
            init_schema(&conn)?;
            println!("Initialised source store at {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn missing_input_exits_fatal() {
        let err = anyhow::Error::from(CallmapError::MissingInput {
            path: PathBuf::from("helper_data/all_methods.txt"),
        })
        .context("pipeline run");
        assert_eq!(exit_code_for(&err), EXIT_FATAL);
    }

    #[test]
    fn bad_config_exits_fatal() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/callmap.toml"))
            .map_err(anyhow::Error::from)
            .unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_FATAL);
    }

    #[test]
    fn other_failures_exit_one() {
        let err = anyhow::Error::from(CallmapError::Generation("timeout".into()));
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
        assert_eq!(exit_code_for(&anyhow::anyhow!("disk full")), EXIT_FAILURE);
    }
}
