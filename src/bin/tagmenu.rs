// src/bin/tagmenu.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::sync::Arc;
use tagmenu::{
    cli::{
        Cli,
        dispatcher::{self, ReplContext},
    },
    core::{config_loader::MenuConfig, paths, session::Session},
    models::Rect,
    system::{source::FileSource, surface::TextSurface},
};

/// The main entry point of the `tagmenu` application.
/// It sets up logging, parses arguments, runs the session,
/// and performs centralized error handling.
#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    // --- Configuration: file first, then command-line overrides ---
    let config_path = paths::resolve_config_path(cli.config.as_deref())?;
    let mut config = MenuConfig::load(config_path.as_deref())?;
    if let Some(viewport) = cli.viewport {
        config.viewport.width = viewport.width;
        config.viewport.height = viewport.height;
    }
    if cli.dry_run {
        config.actions.dry_run = true;
    }
    config.validate()?;
    if cli.no_color || !config.surface.color {
        colored::control::set_override(false);
    }

    // --- Wiring ---
    let source = FileSource::new(&cli.data_dir)
        .with_context(|| format!("Cannot use '{}' as menu directory", cli.data_dir.display()))?;
    let surface = Arc::new(TextSurface::new(config.surface.metrics, true));
    let session = Session::init(
        Arc::new(source),
        config.action_sink(),
        surface.clone(),
        &config,
    )
    .await
    .context("Failed to load the root menu")?;

    let (x, y) = cli.at;
    session.open_root(Rect::point(x, y), cli.attach).await?;

    let mut ctx = ReplContext {
        session,
        surface,
        anchor: cli.at,
        attach: cli.attach,
    };
    if cli.exec.is_empty() {
        println!(
            "{}",
            "Type 'help' for the list of commands, 'quit' to leave.".dimmed()
        );
        dispatcher::run_repl(&mut ctx).await
    } else {
        dispatcher::run_script(&cli.exec, &mut ctx).await
    }
}
