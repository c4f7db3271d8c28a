// src/cli/handlers/commons.rs

// Helpers shared by the pointer handlers.

use anyhow::{Result, anyhow};
use colored::Colorize;

use crate::{cli::dispatcher::ReplContext, core::cascade::OpenOutcome, models::Rect};

/// The on-screen box of an item, used as the anchor of its submenu.
pub fn item_box(ctx: &ReplContext, level: usize, index: usize) -> Result<Rect> {
    ctx.surface
        .item_box(level, index)
        .ok_or_else(|| anyhow!("No item {} is displayed at level {}.", index, level))
}

/// Prints how a hover-triggered open ended.
pub fn report_outcome(outcome: &OpenOutcome) {
    match outcome {
        OpenOutcome::Opened(id) => println!("{} '{}'", "Opened".green(), id),
        OpenOutcome::NoSubMenu => println!("{}", "Nothing to open for the current tags.".dimmed()),
        OpenOutcome::Discarded => println!("{}", "Open discarded: the item lost its highlight.".yellow()),
        OpenOutcome::Failed(e) => eprintln!("{}: {}", "Warning".yellow().bold(), e),
    }
}
