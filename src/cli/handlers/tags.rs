// src/cli/handlers/tags.rs

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::collections::BTreeMap;

use crate::cli::{
    args::{TagsArgs, parse_tag},
    dispatcher::{Flow, HandlerFuture, ReplContext},
};

/// The handler for the `tags` command. Without flags it prints the tag set.
///
/// Editing tags here bypasses menu selection; open menus keep their items until
/// they are reopened.
pub fn handle(args: Vec<String>, ctx: &mut ReplContext) -> HandlerFuture<'_> {
    Box::pin(run(args, ctx))
}

async fn run(args: Vec<String>, ctx: &mut ReplContext) -> Result<Flow> {
    let tags_args = TagsArgs::try_parse_from(&args)?;
    let tags = ctx.session.tags();

    if !tags_args.set.is_empty() || !tags_args.unset.is_empty() {
        let set: BTreeMap<String, String> =
            tags_args.set.iter().map(|s| parse_tag(s)).collect();
        tags.apply(&set, &tags_args.unset);
    }

    let snapshot = tags.snapshot();
    if snapshot.is_empty() {
        println!("{}", "No tags are set.".dimmed());
    }
    for (name, value) in snapshot {
        if value.is_empty() {
            println!("  {}", name.cyan());
        } else {
            println!("  {} = {}", name.cyan(), value);
        }
    }
    Ok(Flow::Continue)
}
