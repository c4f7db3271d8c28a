// src/cli/handlers/open.rs

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::future;

use crate::{
    cli::{
        args::OpenArgs,
        dispatcher::{Flow, HandlerFuture, ReplContext},
    },
    models::Rect,
};

/// The handler for the `open` command: builds a fresh chain from the root,
/// as a right click on the page would.
pub fn handle(args: Vec<String>, ctx: &mut ReplContext) -> HandlerFuture<'_> {
    Box::pin(run(args, ctx))
}

async fn run(args: Vec<String>, ctx: &mut ReplContext) -> Result<Flow> {
    let open_args = OpenArgs::try_parse_from(&args)?;
    let (x, y) = open_args.at.unwrap_or(ctx.anchor);
    let attach = open_args.attach.unwrap_or(ctx.attach);

    ctx.session.open_root(Rect::point(x, y), attach).await?;
    Ok(Flow::Continue)
}

pub fn handle_show(_args: Vec<String>, ctx: &mut ReplContext) -> HandlerFuture<'_> {
    let rendered = ctx.surface.render();
    if rendered.is_empty() {
        println!("{}", "No menu is open.".dimmed());
    } else {
        println!("{}", rendered);
    }
    Box::pin(future::ready(Ok(Flow::Continue)))
}

pub fn handle_close(_args: Vec<String>, ctx: &mut ReplContext) -> HandlerFuture<'_> {
    ctx.session.close_all();
    Box::pin(future::ready(Ok(Flow::Continue)))
}
