// src/cli/handlers/leave.rs

use anyhow::Result;
use clap::Parser;

use crate::cli::{
    args::ItemArgs,
    dispatcher::{Flow, HandlerFuture, ReplContext},
};

pub fn handle(args: Vec<String>, ctx: &mut ReplContext) -> HandlerFuture<'_> {
    Box::pin(run(args, ctx))
}

async fn run(args: Vec<String>, ctx: &mut ReplContext) -> Result<Flow> {
    let item = ItemArgs::try_parse_from(&args)?;
    ctx.session.cascade()?.hover_leave(item.level, item.index);
    Ok(Flow::Continue)
}
