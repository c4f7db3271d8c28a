// src/core/mod.rs

pub mod cache;
pub mod cascade;
pub mod config_loader;
pub mod errors;
pub mod evaluator;
pub mod item_generator;
pub mod layout;
pub mod loading;
pub mod navigator;
pub mod paths;
pub mod prefetcher;
pub mod session;
