//! assetpipe - a front-end asset pipeline with a live-reload dev server.

mod cli;
mod config;
mod error;
mod freshness;
mod logger;
mod mime;
mod registry;
mod reload;
mod serve;
mod task;
mod watch;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};

use cli::{Cli, Commands};
use config::Config;
use registry::PathRegistry;
use reload::ReloadHub;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    serve::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    logger::set_verbose(cli.verbose);

    let config = Config::load(&cli)?;

    match cli.command {
        Some(Commands::Build { clean }) => build_once(&config, clean),
        Some(Commands::Dev { .. }) | None => run_dev(config),
    }
}

/// One-shot build: run all four tasks, then exit.
fn build_once(config: &Config, clean: bool) -> Result<()> {
    if clean && config.output_dir().exists() {
        std::fs::remove_dir_all(config.output_dir())?;
    }

    let registry = PathRegistry::new(config.source_dir())?;
    task::build_all(config, &registry)
}

/// Default command: build once, start the watcher, then serve (blocking).
///
/// The server is bound only after the initial build completes, so the first
/// response always reflects a fully built output directory.
fn run_dev(config: Config) -> Result<()> {
    let registry = PathRegistry::new(config.source_dir())?;
    task::build_all(&config, &registry)?;

    let config = Arc::new(config);
    let registry = Arc::new(registry);

    let (ws_port, hub) = if config.serve.watch {
        let (hub, ws_port) = ReloadHub::start(reload::DEFAULT_WS_PORT)?;
        watch::spawn(Arc::clone(&config), Arc::clone(&registry), Arc::clone(&hub))?;
        (Some(ws_port), Some(hub))
    } else {
        (None, None)
    };

    let server = serve::bind_server(&config)?;
    server.run(ws_port, hub)
}
