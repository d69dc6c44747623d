//! AutoEngage - browser-driven social engagement engine
//!
//! Main entry point for the autoengage CLI.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use autoengage_config::{Config, ConfigLoader, LoggingConfig};
use autoengage_core::RunGate;

mod app;
mod cli;
mod commands;

use app::autoengage_dir;
use cli::Cli;

fn log_dir(logging: &LoggingConfig) -> PathBuf {
    let dir = logging.log_dir.trim();
    if dir.is_empty() {
        autoengage_dir().join("logs")
    } else {
        PathBuf::from(ConfigLoader::expand_path(dir))
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = log_dir(logging);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("autoengage")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes the file writer on exit.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true).with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Tracing needs the log directory, so a broken config is reported after
    // init with default logging.
    let loaded = ConfigLoader::load(&cli.config);
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    if let Err(e) = init_tracing(&logging) {
        eprintln!("Failed to initialize file logging: {}", e);
    }

    let config: Config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(path = %cli.config.display(), error = %e, "Cannot load configuration");
            return Err(e.into());
        }
    };

    info!(
        "Starting autoengage v{} with {}",
        env!("CARGO_PKG_VERSION"),
        cli.config.display()
    );

    let gate = RunGate::new();
    let result = commands::run(cli.command, config, &gate).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
