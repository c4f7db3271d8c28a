// src/core/cache.rs

use crate::{
    core::errors::MenuError,
    models::{MenuData, MenuId},
    system::source::DataSource,
};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// A slot that is filled at most once with the fetched menu. A failed fill leaves it
/// empty, so the next caller retries.
type MenuPromise = Arc<OnceCell<Arc<MenuData>>>;

/// Process-lifetime memo of menu definitions, keyed by [`MenuId`].
///
/// Concurrent fetches of the same uncached id share one source query. Successful
/// results are never invalidated; failures are never stored.
pub struct MenuCache {
    source: Arc<dyn DataSource>,
    promises: Mutex<HashMap<MenuId, MenuPromise>>,
    queries: AtomicUsize,
}

impl fmt::Debug for MenuCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuCache")
            .field("cached", &self.cached_ids())
            .field("queries", &self.queries())
            .finish_non_exhaustive()
    }
}

impl MenuCache {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            promises: Mutex::new(HashMap::new()),
            queries: AtomicUsize::new(0),
        }
    }

    fn promise(&self, id: &MenuId) -> MenuPromise {
        self.promises
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.clone())
            .or_default()
            .clone()
    }

    /// Returns the menu for `id`, querying the source only on a cache miss.
    ///
    /// # Errors
    /// `DataUnavailable` when the source fails, or the schema error the source
    /// reported (e.g. `UnrecognizedConditionKind`).
    pub async fn fetch(&self, id: &MenuId) -> Result<Arc<MenuData>, MenuError> {
        let promise = self.promise(id);
        if let Some(menu) = promise.get() {
            return Ok(menu.clone());
        }

        let filled = promise
            .get_or_try_init(|| async {
                self.queries.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss for menu '{}', querying source", id);
                match self.source.fetch_menu(id).await {
                    Ok(menu) => Ok(Arc::new(menu)),
                    Err(e) => {
                        debug!("Fetch of menu '{}' failed: {:#}", id, e);
                        Err(classify(id, e))
                    }
                }
            })
            .await;

        match filled {
            Ok(menu) => Ok(menu.clone()),
            Err(e) => {
                self.forget(id, &promise);
                Err(e)
            }
        }
    }

    /// Drops the slot of a failed fetch, unless another caller has since filled
    /// or replaced it.
    fn forget(&self, id: &MenuId, promise: &MenuPromise) {
        let mut promises = self.promises.lock().unwrap_or_else(PoisonError::into_inner);
        let stale = promises
            .get(id)
            .is_some_and(|p| Arc::ptr_eq(p, promise) && !p.initialized());
        if stale {
            promises.remove(id);
        }
    }

    /// Inserts a menu delivered out of band (the root fetch carries the root menu).
    /// An already cached entry wins, since fetched content is stable per id.
    pub fn seed(&self, menu: MenuData) {
        let id = menu.id.clone();
        let promise = self.promise(&id);
        if promise.set(Arc::new(menu)).is_err() {
            debug!("Menu '{}' was already cached; seed ignored", id);
        }
    }

    pub fn is_cached(&self, id: &MenuId) -> bool {
        self.promises
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .is_some_and(|p| p.initialized())
    }

    /// Ids with a cached menu, sorted.
    pub fn cached_ids(&self) -> Vec<MenuId> {
        let mut ids: Vec<MenuId> = self
            .promises
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, p)| p.initialized())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Total number of source queries issued so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

/// Keeps schema errors reported by the source, folds everything else into `DataUnavailable`.
pub(crate) fn classify(id: &MenuId, err: anyhow::Error) -> MenuError {
    match err.downcast::<MenuError>() {
        Ok(menu_err) => menu_err,
        Err(other) => MenuError::DataUnavailable {
            id: id.clone(),
            reason: format!("{:#}", other),
        },
    }
}
