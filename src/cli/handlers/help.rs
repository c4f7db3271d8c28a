// src/cli/handlers/help.rs

use colored::Colorize;
use std::future;

use crate::cli::dispatcher::{COMMAND_REGISTRY, Flow, HandlerFuture, ReplContext};

pub fn handle(_args: Vec<String>, _ctx: &mut ReplContext) -> HandlerFuture<'_> {
    println!("\n{}", "Commands:".yellow().bold());
    for command in COMMAND_REGISTRY {
        let aliases = if command.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", command.aliases.join(", "))
        };
        println!("  {}{}", command.usage.cyan(), aliases.dimmed());
    }
    println!(
        "\n{}",
        "Levels and indices count visible items from 0, root menu first.".dimmed()
    );
    Box::pin(future::ready(Ok(Flow::Continue)))
}

pub fn handle_quit(_args: Vec<String>, _ctx: &mut ReplContext) -> HandlerFuture<'_> {
    Box::pin(future::ready(Ok(Flow::Quit)))
}
