// src/cli/handlers/scroll.rs

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::time::Duration;

use crate::{
    cli::{
        args::{ScrollArgs, WheelArgs},
        dispatcher::{Flow, HandlerFuture, ReplContext},
    },
    core::errors::MenuError,
};

/// The handler for the `scroll` command: clicks a scroll control once, or keeps
/// it hovered for `--hold-ms`.
pub fn handle(args: Vec<String>, ctx: &mut ReplContext) -> HandlerFuture<'_> {
    Box::pin(run(args, ctx))
}

async fn run(args: Vec<String>, ctx: &mut ReplContext) -> Result<Flow> {
    let scroll_args = ScrollArgs::try_parse_from(&args)?;
    let cascade = ctx.session.cascade()?;
    let level = scroll_args.level;
    let direction = scroll_args.direction.into();

    match scroll_args.hold_ms {
        Some(ms) => {
            if !cascade.scroll_hover_start(level, direction) {
                println!("{}", format!("Level {} does not scroll.", level).yellow());
                return Ok(Flow::Continue);
            }
            tokio::time::sleep(Duration::from_millis(ms)).await;
            cascade.scroll_hover_end(level);
        }
        None => {
            cascade
                .scroll_click(level, direction)
                .ok_or(MenuError::UnknownLevel(level))?;
        }
    }

    let offset = cascade
        .scroll_offset(level)
        .ok_or(MenuError::UnknownLevel(level))?;
    println!("Level {} scrolled to {}px", level, offset);
    Ok(Flow::Continue)
}

pub fn handle_wheel(args: Vec<String>, ctx: &mut ReplContext) -> HandlerFuture<'_> {
    Box::pin(wheel(args, ctx))
}

async fn wheel(args: Vec<String>, ctx: &mut ReplContext) -> Result<Flow> {
    let wheel_args = WheelArgs::try_parse_from(&args)?;
    let offset = ctx
        .session
        .cascade()?
        .scroll_wheel(wheel_args.level, wheel_args.delta)
        .ok_or(MenuError::UnknownLevel(wheel_args.level))?;
    println!("Level {} scrolled to {}px", wheel_args.level, offset);
    Ok(Flow::Continue)
}
