// src/cli/handlers/click.rs

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::cli::{
    args::ItemArgs,
    dispatcher::{Flow, HandlerFuture, ReplContext},
};

/// The handler for the `click` command. Selecting an item ends the interaction,
/// so the whole menu closes afterwards.
pub fn handle(args: Vec<String>, ctx: &mut ReplContext) -> HandlerFuture<'_> {
    Box::pin(run(args, ctx))
}

async fn run(args: Vec<String>, ctx: &mut ReplContext) -> Result<Flow> {
    let item = ItemArgs::try_parse_from(&args)?;
    let cascade = ctx.session.cascade()?;
    let label = cascade
        .items(item.level)
        .and_then(|items| items.into_iter().nth(item.index))
        .map(|i| i.label)
        .unwrap_or_default();

    let resolved = cascade.activate(item.level, item.index).await?;
    match resolved {
        Some(sub) => println!("{} '{}' (leads to '{}')", "Selected".green(), label, sub),
        None => println!("{} '{}'", "Selected".green(), label),
    }
    println!("{}", "Menu closed. Use 'open' to reopen it.".dimmed());
    Ok(Flow::Continue)
}
