// src/cli/dispatcher.rs

use anyhow::{Result, anyhow};
use colored::*;
use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    cli::handlers,
    core::session::Session,
    models::AttachSpec,
    system::surface::TextSurface,
};

/// Everything a command handler can act on.
#[derive(Debug)]
pub struct ReplContext {
    pub session: Session,
    /// The surface the session renders to, kept concrete to look up item boxes.
    pub surface: Arc<TextSurface>,
    /// Where `open` places the root menu by default.
    pub anchor: (f64, f64),
    pub attach: AttachSpec,
}

/// Whether the command loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Flow>> + 'a>>;

// --- Command Definition and Registry ---

/// Defines a command, its aliases, its usage line, and its handler.
pub struct CommandDefinition {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    handler: for<'a> fn(Vec<String>, &'a mut ReplContext) -> HandlerFuture<'a>,
}

/// The single source of truth for all commands of the loop.
pub static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "hover",
        aliases: &["h", "enter"],
        usage: "hover <level> <index> [--no-wait]   pointer enters an item",
        handler: handlers::hover::handle,
    },
    CommandDefinition {
        name: "leave",
        aliases: &["l"],
        usage: "leave <level> <index>               pointer leaves an item",
        handler: handlers::leave::handle,
    },
    CommandDefinition {
        name: "click",
        aliases: &["c", "select"],
        usage: "click <level> <index>               select an item and close the menu",
        handler: handlers::click::handle,
    },
    CommandDefinition {
        name: "scroll",
        aliases: &[],
        usage: "scroll <level> <up|down> [--hold-ms N]   use a scroll control",
        handler: handlers::scroll::handle,
    },
    CommandDefinition {
        name: "wheel",
        aliases: &["w"],
        usage: "wheel <level> <delta>               scroll by a wheel delta in pixels",
        handler: handlers::scroll::handle_wheel,
    },
    CommandDefinition {
        name: "tags",
        aliases: &["t"],
        usage: "tags [--set K=V,...] [--unset K,...]  show or edit the tag set",
        handler: handlers::tags::handle,
    },
    CommandDefinition {
        name: "open",
        aliases: &["o"],
        usage: "open [--at X,Y] [--attach x,y]      (re)open the root menu",
        handler: handlers::open::handle,
    },
    CommandDefinition {
        name: "show",
        aliases: &["ls"],
        usage: "show                                print the open menus",
        handler: handlers::open::handle_show,
    },
    CommandDefinition {
        name: "close",
        aliases: &[],
        usage: "close                               close every open menu",
        handler: handlers::open::handle_close,
    },
    CommandDefinition {
        name: "help",
        aliases: &["?"],
        usage: "help                                this list",
        handler: handlers::help::handle,
    },
    CommandDefinition {
        name: "quit",
        aliases: &["q", "exit"],
        usage: "quit                                leave tagmenu",
        handler: handlers::help::handle_quit,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Parses one command line and runs its handler.
pub async fn dispatch_line(line: &str, ctx: &mut ReplContext) -> Result<Flow> {
    let words = shlex::split(line).ok_or_else(|| anyhow!("Unbalanced quotes in '{}'", line))?;
    let Some((name, args)) = words.split_first() else {
        return Ok(Flow::Continue);
    };
    log::debug!("Dispatching '{}' with {:?}", name, args);

    let command = find_command(name)
        .ok_or_else(|| anyhow!("Unknown command '{}'. Type 'help' for the list.", name))?;
    (command.handler)(args.to_vec(), ctx).await
}

/// Runs `commands` in order, stopping at the first failure.
pub async fn run_script(commands: &[String], ctx: &mut ReplContext) -> Result<()> {
    for line in commands {
        println!("{} {}", ">".dimmed(), line);
        if dispatch_line(line, ctx).await? == Flow::Quit {
            break;
        }
    }
    Ok(())
}

/// Reads commands from stdin until `quit` or end of input. A failing command is
/// reported and the loop continues.
pub async fn run_repl(ctx: &mut ReplContext) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "tagmenu>".bold());
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match dispatch_line(&line, ctx).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => eprintln!("{}: {:#}", "Error".red().bold(), e),
        }
    }
    ctx.session.close_all();
    Ok(())
}
