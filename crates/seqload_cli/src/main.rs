//! `seqload` command-line entry point.
//!
//! Wires settings, logging, the SQLite entity store and one node type
//! configuration into a single batch run.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use seqload_core::db::open_db;
use seqload_core::{
    default_log_level, init_logging, preset, preset_names, IdTrackingTable, LoaderSettings,
    NodeTypeConfig, RecordLoader, SqliteEntityStore,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Load sequencing-file metadata into the entity store.
#[derive(Parser, Debug)]
#[command(name = "seqload", version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load one tabular data file for a node type
    Load {
        /// CSV file with one record per sequence file
        data_file: PathBuf,

        /// Built-in node type (see `seqload node-types`)
        #[arg(short = 't', long, required_unless_present = "node_config")]
        node_type: Option<String>,

        /// Node type mapping file (TOML), instead of a built-in node type
        #[arg(long, conflicts_with = "node_type")]
        node_config: Option<PathBuf>,

        /// ID-tracking file (overrides settings)
        #[arg(long)]
        tracking_file: Option<PathBuf>,

        /// Entity store database (overrides settings)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Directory for categorized output files (overrides settings)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// List built-in node types
    NodeTypes,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            log::error!("event=cli_exit module=cli status=error error={err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = LoaderSettings::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        settings.log_level = Some(level);
    }

    match cli.command {
        Commands::NodeTypes => {
            for name in preset_names() {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Load {
            data_file,
            node_type,
            node_config,
            tracking_file,
            store,
            output_dir,
        } => {
            if let Some(path) = tracking_file {
                settings.tracking_file = path;
            }
            if let Some(path) = store {
                settings.store_path = path;
            }
            if output_dir.is_some() {
                settings.output_dir = output_dir;
            }
            let config = resolve_node_type(node_type, node_config)?;
            load(&settings, &config, data_file)
        }
    }
}

fn resolve_node_type(
    node_type: Option<String>,
    node_config: Option<PathBuf>,
) -> Result<NodeTypeConfig> {
    match (node_type, node_config) {
        (_, Some(path)) => NodeTypeConfig::from_toml_file(&path)
            .with_context(|| format!("loading node type mapping {}", path.display())),
        (Some(name), None) => Ok(preset(&name)?),
        (None, None) => bail!("either --node-type or --node-config is required"),
    }
}

fn load(
    settings: &LoaderSettings,
    config: &NodeTypeConfig,
    data_file: PathBuf,
) -> Result<ExitCode> {
    let level = settings
        .log_level
        .as_deref()
        .unwrap_or_else(|| default_log_level());
    init_logging(level, settings.log_dir.as_deref()).map_err(anyhow::Error::msg)?;

    let conn = open_db(&settings.store_path)
        .with_context(|| format!("opening entity store {}", settings.store_path.display()))?;
    let mut tracking = IdTrackingTable::open(&settings.tracking_file).with_context(|| {
        format!("opening tracking file {}", settings.tracking_file.display())
    })?;

    let mut loader = RecordLoader::new(config.clone(), SqliteEntityStore::new(&conn))?;
    let report = loader
        .load_file(&data_file, &mut tracking, settings.output_dir.as_deref())
        .with_context(|| format!("loading {}", data_file.display()))?;

    let summary = report.summary;
    info!(
        "event=cli_exit module=cli status=ok node_type={} tracked={}",
        config.node_type,
        report.tracked.len()
    );
    println!(
        "{}: {} records, {} submitted ({} created, {} updated), {} invalid, {} unsaved, {} missing parent",
        config.node_type,
        summary.total(),
        summary.submitted,
        summary.created,
        summary.updated,
        summary.invalid,
        summary.unsaved,
        summary.parent_unresolved
    );

    if summary.submitted == summary.total() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}
