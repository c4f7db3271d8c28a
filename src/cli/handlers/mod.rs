// src/cli/handlers/mod.rs

pub mod click;
pub mod commons;
pub mod help;
pub mod hover;
pub mod leave;
pub mod open;
pub mod scroll;
pub mod tags;
