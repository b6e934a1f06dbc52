//! drillhole-trace - batch borehole trajectory reconstruction
//!
//! # Usage
//!
//! ```bash
//! # Trace every hole and place its lab intervals
//! drillhole-trace run --collars collars.csv --surveys surveys.csv --labs labs.csv --out out/
//!
//! # Check a project config without running
//! drillhole-trace check-config --config drillhole_config.toml
//!
//! # Print the built-in defaults as TOML
//! drillhole-trace dump-config > drillhole_config.toml
//! ```
//!
//! # Environment Variables
//!
//! - `DRILLHOLE_CONFIG`: Path to the project config (default: ./drillhole_config.toml)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use drillhole_trace::config::{validation, ConfigProvenance, ConfigSource, ProjectConfig};
use drillhole_trace::pipeline::{BatchCoordinator, RunReport};
use drillhole_trace::storage;
use drillhole_trace::tables::{self, DrillholeDataset};
use drillhole_trace::types::{CoordinateFrame, Method};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "drillhole-trace")]
#[command(about = "Reconstruct 3D drillhole trajectories and place lab intervals on them")]
#[command(version)]
struct CliArgs {
    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Trace all holes and write trajectories, intervals, segments and a run report
    Run(RunArgs),

    /// Load and validate a project config, printing warnings and errors
    CheckConfig {
        /// Config file (default: $DRILLHOLE_CONFIG, then ./drillhole_config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the built-in default config as TOML
    DumpConfig,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Collar table (CSV)
    #[arg(long)]
    collars: PathBuf,

    /// Directional survey table (CSV)
    #[arg(long)]
    surveys: PathBuf,

    /// Lab interval table (CSV)
    #[arg(long)]
    labs: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    out: PathBuf,

    /// Config file (default: $DRILLHOLE_CONFIG, then ./drillhole_config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override trajectory.method (minimum_curvature, average_angle, radius_of_curvature)
    #[arg(long)]
    method: Option<Method>,

    /// Override trajectory.frame (projected, geographic)
    #[arg(long)]
    frame: Option<CoordinateFrame>,

    /// Override run.workers (0 = all cores)
    #[arg(long)]
    workers: Option<usize>,

    /// Do not extend holes to their deepest lab interval
    #[arg(long)]
    no_extend: bool,
}

// ============================================================================
// Configuration
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<(ProjectConfig, ConfigProvenance, ConfigSource)> {
    match path {
        Some(p) => {
            let (config, provenance) = ProjectConfig::load_from_file_with_provenance(p)
                .with_context(|| format!("Failed to load config {}", p.display()))?;
            Ok((config, provenance, ConfigSource::File(p.to_path_buf())))
        }
        None => ProjectConfig::load().context("Failed to load project config"),
    }
}

fn apply_overrides(config: &mut ProjectConfig, args: &RunArgs) -> Result<()> {
    if let Some(method) = args.method {
        config.trajectory.method = method;
    }
    if let Some(frame) = args.frame {
        config.trajectory.frame = frame;
    }
    if let Some(workers) = args.workers {
        config.run.workers = workers;
    }
    if args.no_extend {
        config.trajectory.extend_to_lab_depth = false;
    }
    config.validate().context("Invalid configuration after CLI overrides")?;
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

/// Read the tables, run the batch and write every output.
///
/// Runs on a blocking thread; `cancel` stops holes that have not started.
fn execute_run(args: &RunArgs, config: ProjectConfig, cancel: &CancellationToken) -> Result<RunReport> {
    let unit = config.units.length_unit;
    let collars = tables::read_collars(&args.collars, &config.fields, unit)
        .context("Failed to read collar table")?;
    let surveys = tables::read_surveys(&args.surveys, &config.fields, unit)
        .context("Failed to read survey table")?;
    let labs = match &args.labs {
        Some(path) => Some(
            tables::read_labs(path, &config.fields, unit).context("Failed to read lab table")?,
        ),
        None => None,
    };

    let mut skipped_rows = vec![
        ("collars".to_string(), collars.skipped),
        ("surveys".to_string(), surveys.skipped),
    ];
    let lab_rows = match labs {
        Some(load) => {
            skipped_rows.push(("labs".to_string(), load.skipped));
            load.rows
        }
        None => Vec::new(),
    };

    let dataset = DrillholeDataset::from_tables(collars.rows, surveys.rows, lab_rows);
    let batch_size = config.output.batch_size;
    let coordinator = BatchCoordinator::new(config);
    let mut output = coordinator
        .run(&dataset, cancel)
        .context("Batch run failed")?;
    output.report.input_rows_skipped.extend(skipped_rows);

    storage::write_outputs(&mut output, &args.out, batch_size)
        .with_context(|| format!("Failed to write outputs to {}", args.out.display()))?;
    storage::write_report(&output.report, &args.out).context("Failed to write run report")?;

    Ok(output.report)
}

async fn run_command(args: RunArgs) -> Result<()> {
    let (mut config, provenance, source) = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args)?;
    info!(
        project = %config.project.name,
        source = %source,
        user_keys = provenance.explicit_keys.len(),
        method = config.trajectory.method.as_str(),
        frame = config.trajectory.frame.as_str(),
        "Configuration loaded"
    );

    let token = CancellationToken::new();
    let shutdown_token = token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        warn!("Received Ctrl+C, cancelling holes not yet started");
        shutdown_token.cancel();
    });

    let report = tokio::task::spawn_blocking(move || execute_run(&args, config, &token))
        .await
        .context("Batch task panicked")??;

    println!("{report}");
    for (name, summary) in &report.outputs {
        println!("  {name}: {summary}");
    }
    if report.write_failures() > 0 {
        warn!(failed = report.write_failures(), "Some records had no geometry and were not written");
    }
    Ok(())
}

fn check_config(path: Option<&Path>) -> Result<()> {
    let (config, provenance, source) = load_config(path)?;

    // Re-read the raw TOML so typos can be listed on stdout as well as logged
    if let ConfigSource::File(file) = &source {
        let raw = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        for w in validation::validate_unknown_keys(&raw) {
            println!("warning: {w}");
        }
    }
    let (_errors, warnings) = validation::validate_physical_ranges(&config);
    for w in warnings {
        println!("warning: {w}");
    }

    let keys = provenance.sorted_keys();
    if !keys.is_empty() {
        println!("Set in file ({}):", keys.len());
        for key in keys {
            println!("  {key}");
        }
    }
    println!("Config OK ({source}), project '{}'", config.project.name);
    Ok(())
}

fn dump_config() -> Result<()> {
    let toml = ProjectConfig::default()
        .to_toml()
        .context("Failed to serialize default config")?;
    print!("{toml}");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    match args.command {
        SubCommand::Run(run) => run_command(run).await,
        SubCommand::CheckConfig { config } => check_config(config.as_deref()),
        SubCommand::DumpConfig => dump_config(),
    }
}
