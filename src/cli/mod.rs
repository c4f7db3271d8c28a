// src/cli/mod.rs

use crate::models::{AttachSpec, Size};
use clap::Parser;
use std::path::PathBuf;

pub mod args;
pub mod dispatcher;
pub mod handlers;

/// tagmenu: a data-driven cascading context menu, driven from the terminal.
///
/// Menus are read from a directory holding `root.json` and one `<id>.json` per
/// submenu. After the root menu opens, pointer events are typed as commands
/// (`hover 0 2`, `leave 0 2`, `click 1 0`, `scroll 0 down`, ...). Type `help`
/// for the full list.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Directory containing `root.json` and the submenu files.
    pub data_dir: PathBuf,

    /// Configuration file. Defaults to `$TAGMENU_CONFIG`, then the per-user config directory.
    #[arg(long, short)]
    pub config: Option<String>,

    /// Viewport size as `WIDTHxHEIGHT`, overriding the config.
    #[arg(long, value_parser = args::parse_viewport)]
    pub viewport: Option<Size>,

    /// Pointer position the root menu opens at, as `X,Y`.
    #[arg(long, value_parser = args::parse_point, default_value = "0,0")]
    pub at: (f64, f64),

    /// Preferred attach side of the root menu, as `x,y` (e.g. `right,top`).
    #[arg(long, default_value = "right,top")]
    pub attach: AttachSpec,

    /// Log navigation actions instead of running the opener command.
    #[arg(long)]
    pub dry_run: bool,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// Run these commands instead of reading them from stdin (repeatable).
    #[arg(long = "exec", short = 'e', value_name = "COMMAND")]
    pub exec: Vec<String>,
}
