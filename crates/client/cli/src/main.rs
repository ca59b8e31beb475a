//! Spell progress simulator entry point.
mod config;
mod simulation;

use std::path::Path;

use anyhow::Result;
use config::SimConfig;
use simulation::Simulator;
use spell_content::{ConfigLoader, PluginConfig, WorldData, WorldLoader};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SAMPLE_CONFIG: &str = include_str!("../data/config.toml");
const SAMPLE_WORLD: &str = include_str!("../data/world.ron");

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = SimConfig::from_env();
    let _guard = setup_logging(config.log_dir.as_deref())?;

    let plugin = load_plugin_config(config.config_path.as_deref())?;
    let world = load_world(config.world_path.as_deref())?;

    Simulator::new(plugin, &world)?.run(&config).await
}

fn load_plugin_config(path: Option<&Path>) -> Result<PluginConfig> {
    match path {
        Some(path) => ConfigLoader::load_or_default(path),
        None => {
            tracing::info!("SPELL_PROGRESS_CONFIG not set, using bundled sample");
            ConfigLoader::parse(SAMPLE_CONFIG)
        }
    }
}

fn load_world(path: Option<&Path>) -> Result<WorldData> {
    match path {
        Some(path) => WorldLoader::load(path),
        None => {
            tracing::info!("SPELL_PROGRESS_WORLD not set, using bundled sample");
            WorldLoader::parse(SAMPLE_WORLD)
        }
    }
}

/// Setup logging to stderr, and to a file when a log directory is given.
///
/// The returned guard flushes the file writer when dropped.
fn setup_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::never(log_dir, "sim.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::info!("Log file: {}/sim.log", log_dir.display());
    Ok(Some(guard))
}
