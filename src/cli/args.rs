// src/cli/args.rs
use crate::core::cascade::ScrollDirection;
use crate::models::{AttachSpec, Size};
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)] // Commands arrive without their own name
pub struct ItemArgs {
    /// Menu level, 0 being the root.
    pub level: usize,
    /// Position of the item among the visible items of that level.
    pub index: usize,
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
pub struct HoverArgs {
    #[command(flatten)]
    pub item: ItemArgs,

    /// Return immediately instead of waiting for the submenu to open.
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl From<Direction> for ScrollDirection {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Up => Self::Up,
            Direction::Down => Self::Down,
        }
    }
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
pub struct ScrollArgs {
    pub level: usize,
    #[arg(value_enum)]
    pub direction: Direction,

    /// Keep the scroll control hovered for this many milliseconds instead of clicking it once.
    #[arg(long)]
    pub hold_ms: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
pub struct WheelArgs {
    pub level: usize,
    /// Wheel delta in pixels; negative scrolls up.
    #[arg(allow_negative_numbers = true)]
    pub delta: f64,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
pub struct TagsArgs {
    /// Set a tag (e.g., "KEY=VALUE" or just "KEY").
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub set: Vec<String>,

    /// Remove a tag.
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub unset: Vec<String>,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true)]
pub struct OpenArgs {
    /// Pointer position as `X,Y`. Defaults to the position given at startup.
    #[arg(long, value_parser = parse_point)]
    pub at: Option<(f64, f64)>,

    /// Preferred attach side as `x,y`.
    #[arg(long)]
    pub attach: Option<AttachSpec>,
}

/// Parses `X,Y`.
pub fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x = x.trim().parse().map_err(|e| format!("bad X in '{}': {}", s, e))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y in '{}': {}", s, e))?;
    Ok((x, y))
}

/// Parses `WIDTHxHEIGHT`.
pub fn parse_viewport(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .to_ascii_lowercase()
        .split_once('x')
        .map(|(w, h)| (w.trim().to_string(), h.trim().to_string()))
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width: f64 = w.parse().map_err(|e| format!("bad width in '{}': {}", s, e))?;
    let height: f64 = h.parse().map_err(|e| format!("bad height in '{}': {}", s, e))?;
    if width <= 0.0 || height <= 0.0 {
        return Err(format!("viewport must be positive, got '{}'", s));
    }
    Ok(Size::new(width, height))
}

/// Splits `KEY=VALUE` into its parts; a bare `KEY` gets an empty value.
pub fn parse_tag(s: &str) -> (String, String) {
    match s.split_once('=') {
        Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
        None => (s.trim().to_string(), String::new()),
    }
}
