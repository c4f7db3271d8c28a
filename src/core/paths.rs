// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, CONFIG_ENV_VAR, CONFIG_FILENAME};
use lazy_static::lazy_static;
use std::env;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

lazy_static! {
    static ref TAGMENU_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not expand path '{template}': {reason}")]
    Expansion { template: String, reason: String },
}

/// Returns the per-user configuration directory (`~/.config/tagmenu` on Linux).
///
/// Memoized: the first call computes the path, later calls return the cached value.
/// The directory is not created; a missing config file simply means defaults.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = TAGMENU_CONFIG_DIR
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_dir = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(CONFIG_DIR_NAME);
    *cached = Some(config_dir.clone());
    Ok(config_dir)
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a user-supplied path.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Picks the configuration file to read.
///
/// Lookup order: the explicit path, then `$TAGMENU_CONFIG`, then the file in the
/// per-user config directory. Returns `None` only when no candidate exists at all,
/// i.e. nothing was given and the platform has no config directory.
pub fn resolve_config_path(explicit: Option<&str>) -> Result<Option<PathBuf>, PathError> {
    if let Some(path) = explicit {
        return expand_path(path).map(Some);
    }
    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            log::debug!("Using config path from ${}", CONFIG_ENV_VAR);
            return expand_path(&path).map(Some);
        }
    }
    match get_config_dir() {
        Ok(dir) => Ok(Some(dir.join(CONFIG_FILENAME))),
        Err(PathError::ConfigDirNotFound) => {
            log::debug!("No system config directory; using built-in defaults");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
