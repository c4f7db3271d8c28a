// src/system/source.rs

use crate::{
    constants::{MENU_FILE_EXTENSION, ROOT_MENU_FILENAME},
    core::errors::MenuError,
    models::{MenuData, MenuId, RootData},
};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;

lazy_static! {
    // Menu ids double as file stems, so anything that could walk the filesystem is refused.
    static ref MENU_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Menu id pattern must be a valid regex");
}

/// Where menu definitions come from.
///
/// Implementations may be called many times for the same id, concurrently, and
/// must not corrupt shared state when they are. Schema problems should be
/// returned as a [`MenuError`] inside the `anyhow::Error` so callers can tell
/// them apart from transport failures.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches the initial tags, the root menu id and the root entries.
    async fn fetch_root(&self) -> Result<RootData>;

    /// Fetches one menu by id.
    async fn fetch_menu(&self, id: &MenuId) -> Result<MenuData>;
}

// --- FILE SOURCE ---

/// Serves menus from a directory of JSON documents:
/// `root.json` for the root fetch and `<id>.json` for every other menu.
#[derive(Debug, Clone)]
pub struct FileSource {
    root_dir: PathBuf,
}

impl FileSource {
    /// Creates a source over `dir`, which must exist.
    pub fn new(dir: &Path) -> Result<Self> {
        let root_dir = dunce::canonicalize(dir)
            .with_context(|| format!("Menu directory '{}' is not accessible", dir.display()))?;
        if !root_dir.is_dir() {
            return Err(anyhow!("'{}' is not a directory", root_dir.display()));
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn menu_path(&self, id: &MenuId) -> Result<PathBuf> {
        if !MENU_ID_RE.is_match(id.as_str()) || id.as_str().starts_with('.') {
            return Err(MenuError::DataUnavailable {
                id: id.clone(),
                reason: "menu id is not a valid file name".to_string(),
            }
            .into());
        }
        Ok(self
            .root_dir
            .join(format!("{}.{}", id.as_str(), MENU_FILE_EXTENSION)))
    }
}

#[async_trait]
impl DataSource for FileSource {
    async fn fetch_root(&self) -> Result<RootData> {
        let path = self.root_dir.join(ROOT_MENU_FILENAME);
        log::debug!("Reading root menu from '{}'", path.display());
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        Ok(RootData::from_json_str(&content)?)
    }

    async fn fetch_menu(&self, id: &MenuId) -> Result<MenuData> {
        let path = self.menu_path(id)?;
        log::debug!("Reading menu '{}' from '{}'", id, path.display());
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        Ok(MenuData::from_json_str(id, &content)?)
    }
}

// --- MEMORY SOURCE ---

#[derive(Debug, Default)]
struct MemoryState {
    menus: HashMap<MenuId, MenuData>,
    failing: HashSet<MenuId>,
    gates: HashMap<MenuId, Arc<Semaphore>>,
    queries: HashMap<MenuId, usize>,
}

/// An in-memory source for embedders and tests.
///
/// Besides serving fixed menus it can make an id fail, or hold a fetch of an id
/// until its gate is released, to drive latency-sensitive scenarios.
#[derive(Debug)]
pub struct MemorySource {
    root: RootData,
    state: Mutex<MemoryState>,
}

impl MemorySource {
    pub fn new(root: RootData) -> Self {
        Self {
            root,
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds or replaces a menu.
    pub fn insert(&self, menu: MenuData) {
        self.state().menus.insert(menu.id.clone(), menu);
    }

    pub fn with_menu(self, menu: MenuData) -> Self {
        self.insert(menu);
        self
    }

    /// Makes every fetch of `id` fail until [`MemorySource::recover`] is called.
    pub fn fail(&self, id: &MenuId) {
        self.state().failing.insert(id.clone());
    }

    pub fn recover(&self, id: &MenuId) {
        self.state().failing.remove(id);
    }

    /// Holds every fetch of `id` until the returned gate is released.
    pub fn hold(&self, id: &MenuId) -> Gate {
        let semaphore = Arc::new(Semaphore::new(0));
        self.state().gates.insert(id.clone(), semaphore.clone());
        Gate { semaphore }
    }

    /// How many times `fetch_menu` was called for `id`.
    pub fn queries(&self, id: &MenuId) -> usize {
        self.state().queries.get(id).copied().unwrap_or(0)
    }
}

/// Releases fetches held by [`MemorySource::hold`].
#[derive(Debug, Clone)]
pub struct Gate {
    semaphore: Arc<Semaphore>,
}

impl Gate {
    /// Lets held fetches proceed. The gate stays open afterwards.
    pub fn release(&self) {
        self.semaphore.add_permits(1);
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch_root(&self) -> Result<RootData> {
        Ok(self.root.clone())
    }

    async fn fetch_menu(&self, id: &MenuId) -> Result<MenuData> {
        let gate = {
            let mut state = self.state();
            *state.queries.entry(id.clone()).or_insert(0) += 1;
            state.gates.get(id).cloned()
        };

        if let Some(gate) = gate {
            // The permit is returned on drop, so one release opens the gate for good.
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| anyhow!("gate for '{}' closed: {}", id, e))?;
        }

        let state = self.state();
        if state.failing.contains(id) {
            return Err(anyhow!("source refused menu '{}'", id));
        }
        if id == &self.root.root_menu_id {
            return Ok(self.root.menu());
        }
        state
            .menus
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("menu '{}' does not exist", id))
    }
}
