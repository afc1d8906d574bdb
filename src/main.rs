//! readout-consensus - replay recorded recognizer output through the engine
//!
//! Reads a JSON Lines recording of frame results, feeds it through a scan
//! session and prints the value each field converged on.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use readout_consensus::capture::load_recording;
use readout_consensus::config::{self, AppConfig};
use readout_consensus::consensus::{BestValue, ConsensusEngine};
use readout_consensus::storage::{self, ScanTemplate};
use readout_consensus::ScanSession;

/// Replay recorded OCR frames and print per-field consensus
#[derive(Parser, Debug)]
#[command(name = "readout-consensus")]
#[command(about = "Converge noisy per-frame OCR readings on one value per field")]
struct Args {
    /// JSON Lines recording, one frame result per line
    recording: Option<PathBuf>,

    /// Template file, or the name of a template in the data directory
    #[arg(short, long)]
    template: Option<String>,

    /// Configuration file (defaults to config.toml in the config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the recent history of one field
    #[arg(short, long)]
    field: Option<String>,

    /// Print per-field statistics
    #[arg(long)]
    stats: bool,

    /// Number of history entries to print with --field
    #[arg(long)]
    history: Option<usize>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_or_create_config(args.config.as_deref())?;

    if let Some(path) = &args.write_config {
        config::save_config(&config, path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let Some(recording) = &args.recording else {
        anyhow::bail!("No recording given (see --help)");
    };

    let template = args.template.as_deref().map(resolve_template).transpose()?;

    let frames = load_recording(recording)
        .with_context(|| format!("Failed to load recording {}", recording.display()))?;
    info!("Replaying {} frames from {}", frames.len(), recording.display());

    let session = ScanSession::new(config.consensus.clone())?;
    for frame in frames {
        session.submit_frame(frame);
    }
    session.flush()?;

    let show_stats = args.stats || config.report.show_stats;
    let history_depth = args.history.unwrap_or(config.report.history_depth);

    session.read(|engine| {
        match &template {
            Some(template) => print_template_report(template, engine),
            None => print_best_fields(engine),
        }

        if show_stats {
            print_stats(engine);
        }

        if let Some(field_id) = &args.field {
            print_field_history(engine, field_id, history_depth);
        }
    });

    Ok(())
}

/// Load configuration from an explicit path, the config directory, or defaults
fn load_or_create_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = config::load_config(path)?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(config_dir) = storage::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return Ok(config);
                }
                Err(e) => warn!("Ignoring invalid configuration {:?}: {}", config_path, e),
            }
        }
    }
    info!("Using default configuration");
    Ok(AppConfig::default())
}

/// Resolve a template argument as a path or a saved template name
fn resolve_template(arg: &str) -> Result<ScanTemplate> {
    let path = PathBuf::from(arg);
    if path.exists() {
        return storage::load_template(&path);
    }

    let saved = storage::get_templates_dir()?.join(format!("{}.json", arg));
    storage::load_template(&saved)
}

fn format_best(best: &BestValue) -> String {
    match &best.value {
        Some(value) => format!(
            "{} ({:.0}% of {})",
            value,
            best.majority_ratio * 100.0,
            best.total_scans
        ),
        None => "-".to_string(),
    }
}

fn print_template_report(template: &ScanTemplate, engine: &ConsensusEngine) {
    println!("{} ({})", template.name, template.id);
    for reading in template.report(engine) {
        let label = if reading.label.is_empty() {
            reading.field_id.as_str()
        } else {
            reading.label.as_str()
        };
        println!("  {:<28} [{}] {}", label, reading.kind, format_best(&reading.best));
    }
}

fn print_best_fields(engine: &ConsensusEngine) {
    let fields = engine.get_best_fields();
    if fields.is_empty() {
        println!("No field converged on a value");
        return;
    }
    for field in fields {
        println!("  {:<28} [{}] {}", field.field_id, field.kind, format_best(&field.best));
    }
}

fn print_stats(engine: &ConsensusEngine) {
    println!();
    println!("Statistics:");
    for field_id in engine.field_ids() {
        let stats = engine.get_field_stats(field_id);
        let units = engine.get_scrollbar_units(field_id);
        println!(
            "  {:<28} observations={} unique={} decimal={} most_frequent={} frames(v/c/s)={}/{}/{}",
            field_id,
            stats.total_observations,
            stats.unique_values,
            stats.with_decimal_separator,
            stats.most_frequent.as_deref().unwrap_or("-"),
            stats.kind_breakdown.value,
            stats.kind_breakdown.checkbox,
            stats.kind_breakdown.scrollbar,
        );
        if units.start.is_some() || units.end.is_some() {
            println!(
                "  {:<28} units: {} .. {}",
                "",
                units.start.unwrap_or("-"),
                units.end.unwrap_or("-")
            );
        }
    }
}

fn print_field_history(engine: &ConsensusEngine, field_id: &str, depth: usize) {
    println!();
    println!("History of {}:", field_id);
    match engine.get_filtered_value(field_id) {
        Some(value) => println!("  filtered: {}", value),
        None => println!("  no observations"),
    }
    for observed in engine.get_field_history(field_id).into_iter().take(depth) {
        println!("  {:>15}  {}", observed.timestamp, observed.value);
    }
}
