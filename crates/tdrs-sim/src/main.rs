//! Scripted runner for the TDRS social simulation.
//!
//! Embeds the engine the way a game host would: it loads authored content,
//! subscribes to every agent's notifications, plays a script of event
//! firings and ticks, and prints the final social graph as JSON.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first argument, default `tdrs-sim.yaml`)
//! 2. Initialize structured logging (tracing) on stderr
//! 3. Create the engine with the clause precondition evaluator
//! 4. Load the content file
//! 5. Subscribe the host adapter (new edges via creation hooks)
//! 6. Play the script
//! 7. Print the report on stdout

mod adapter;
mod config;
mod error;
mod report;
mod script;

use std::path::{Path, PathBuf};

use tdrs_core::SocialEngineState;
use tdrs_loader::{ClauseEvaluator, load_file};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapter::HostAdapter;
use crate::config::{LogFormat, LoggingConfig, SimulationConfig};
use crate::error::SimError;
use crate::report::Report;

const DEFAULT_CONFIG_PATH: &str = "tdrs-sim.yaml";

fn main() -> Result<(), SimError> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, found) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("tdrs-sim starting");
    if found {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }

    // 3. Create the engine.
    let mut state = SocialEngineState::with_evaluator(config.engine.clone(), ClauseEvaluator);
    info!(
        max_event_depth = config.engine.max_event_depth,
        agent_stats = config.engine.agent_stats.len(),
        relationship_stats = config.engine.relationship_stats.len(),
        "Engine created"
    );

    // 4. Load content.
    let loaded = load_file(&config.content_path, &mut state)?;
    info!(
        traits = loaded.traits,
        events = loaded.events,
        agents = loaded.agents,
        relationships = loaded.relationships,
        "Content loaded"
    );

    // 5. Subscribe the host adapter.
    let mut adapter = HostAdapter::new();
    let subscribed = adapter.sync(&mut state);
    info!(subscribed, "Host adapter attached");

    // 6. Play the script.
    let summary = script::run_script(&mut state, &config.script)?;

    // 7. Report.
    let report = Report::capture(&state, summary, adapter.counts());
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!(
        steps = summary.steps,
        fired = summary.fired,
        expirations = summary.expirations,
        "tdrs-sim shutdown complete"
    );
    Ok(())
}

/// Load the runner configuration, falling back to defaults when the file
/// does not exist. The flag reports whether the file was found.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), SimError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so stdout carries only the report.
fn init_logging(logging: &LoggingConfig) -> Result<(), SimError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| SimError::Logging {
            message: format!("invalid log level {}: {e}", logging.level),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = match logging.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| SimError::Logging {
        message: e.to_string(),
    })
}
