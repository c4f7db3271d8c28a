// src/cli/handlers/hover.rs

use anyhow::Result;
use clap::Parser;

use super::commons;
use crate::cli::{
    args::HoverArgs,
    dispatcher::{Flow, HandlerFuture, ReplContext},
};

/// The handler for the `hover` command.
pub fn handle(args: Vec<String>, ctx: &mut ReplContext) -> HandlerFuture<'_> {
    Box::pin(run(args, ctx))
}

async fn run(args: Vec<String>, ctx: &mut ReplContext) -> Result<Flow> {
    let hover_args = HoverArgs::try_parse_from(&args)?;
    let (level, index) = (hover_args.item.level, hover_args.item.index);

    let cascade = ctx.session.cascade()?;
    let item_box = commons::item_box(ctx, level, index)?;
    let Some(pending) = cascade.hover_enter(level, index, item_box) else {
        return Ok(Flow::Continue);
    };

    log::debug!("Opening a submenu at level {}", pending.level());
    if hover_args.no_wait {
        // The outcome still lands on the surface; only the report is skipped.
        tokio::spawn(async move {
            let outcome = pending.outcome().await;
            log::debug!("Background open finished: {:?}", outcome);
        });
    } else {
        commons::report_outcome(&pending.outcome().await);
    }
    Ok(Flow::Continue)
}
