//! # Config Loader
//!
//! Reads `tagmenu.toml` into a [`MenuConfig`]. Every table and every field is
//! optional and falls back to the built-in constants, so an empty or missing
//! file yields the defaults.
//!
//! ```toml
//! [viewport]
//! width = 1024.0
//! height = 768.0
//!
//! [loading]
//! delay_ms = 150
//!
//! [actions]
//! opener = "firefox --new-tab {url}"
//! ```
use crate::{
    constants::{
        DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, INIT_PREFETCH_DEPTH, ITEM_PREFETCH_DEPTH,
        LOADING_DELAY_MS, SCROLL_INTERVAL_MS, SCROLL_STEP_PX,
    },
    core::cascade::CascadeSettings,
    models::Size,
    system::{
        executor::{ActionSink, CommandSink, LogSink},
        surface::TextMetrics,
    },
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid TOML in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct LoadingConfig {
    /// Milliseconds before a pending submenu shows its spinner.
    pub delay_ms: u64,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            delay_ms: LOADING_DELAY_MS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ScrollConfig {
    pub step_px: f64,
    pub interval_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            step_px: SCROLL_STEP_PX,
            interval_ms: SCROLL_INTERVAL_MS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PrefetchConfig {
    /// Depth warmed once the root has been fetched.
    pub initial_depth: u32,
    /// Depth warmed each time a menu's items are generated.
    pub item_depth: u32,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            initial_depth: INIT_PREFETCH_DEPTH,
            item_depth: ITEM_PREFETCH_DEPTH,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SurfaceConfig {
    #[serde(flatten)]
    pub metrics: TextMetrics,
    /// Colored terminal output.
    pub color: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
            color: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ActionsConfig {
    /// Command template for navigation actions, e.g. `xdg-open {url}`. The platform
    /// opener is used when unset.
    pub opener: Option<String>,
    /// Log actions instead of running anything.
    pub dry_run: bool,
}

/// The whole `tagmenu.toml` document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MenuConfig {
    pub viewport: ViewportConfig,
    pub loading: LoadingConfig,
    pub scroll: ScrollConfig,
    pub prefetch: PrefetchConfig,
    pub surface: SurfaceConfig,
    pub actions: ActionsConfig,
}

impl MenuConfig {
    /// Loads and validates the config at `path`. A missing file (or no path at all)
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            log::debug!(
                "Config file '{}' not found; using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::debug!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(is_positive(self.viewport.width) && is_positive(self.viewport.height)) {
            return Err(ConfigError::Invalid(format!(
                "viewport must be positive, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if !is_positive(self.scroll.step_px) {
            return Err(ConfigError::Invalid(format!(
                "scroll.step_px must be positive, got {}",
                self.scroll.step_px
            )));
        }
        if self.scroll.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "scroll.interval_ms must be at least 1".to_string(),
            ));
        }
        let metrics = &self.surface.metrics;
        if !(is_positive(metrics.char_width) && is_positive(metrics.line_height)) {
            return Err(ConfigError::Invalid(
                "surface.char_width and surface.line_height must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn viewport(&self) -> Size {
        Size::new(self.viewport.width, self.viewport.height)
    }

    pub fn cascade_settings(&self) -> CascadeSettings {
        CascadeSettings {
            viewport: self.viewport(),
            loading_delay: Duration::from_millis(self.loading.delay_ms),
            scroll_step: self.scroll.step_px,
            scroll_interval: Duration::from_millis(self.scroll.interval_ms),
            scroll_controls: self.surface.metrics.scroll_button,
        }
    }

    /// The sink navigation actions go to.
    pub fn action_sink(&self) -> Arc<dyn ActionSink> {
        if self.actions.dry_run {
            return Arc::new(LogSink);
        }
        match &self.actions.opener {
            Some(template) => Arc::new(CommandSink::new(template.clone())),
            None => Arc::new(CommandSink::platform_default()),
        }
    }
}

/// False for zero, negatives and NaN.
fn is_positive(value: f64) -> bool {
    value > 0.0
}
