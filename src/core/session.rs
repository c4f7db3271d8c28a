// src/core/session.rs

use crate::{
    core::{
        cache::{MenuCache, classify},
        cascade::{Cascade, CascadeSettings},
        config_loader::MenuConfig,
        errors::MenuError,
        item_generator::ItemGenerator,
        navigator::Navigator,
        prefetcher::Prefetcher,
    },
    models::{AttachSpec, MenuId, Rect},
    state::TagStore,
    system::{executor::ActionSink, source::DataSource, surface::MenuSurface},
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

/// A menu session: the shared tag set and cache, plus the currently open cascade.
///
/// Everything is wired once in [`Session::init`]; each outside trigger then builds
/// a fresh cascade from the root with [`Session::open_root`].
pub struct Session {
    tags: TagStore,
    cache: Arc<MenuCache>,
    items: ItemGenerator,
    navigator: Navigator,
    surface: Arc<dyn MenuSurface>,
    settings: CascadeSettings,
    current: Mutex<Option<Cascade>>,
    warmup: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("root", self.items.root_id())
            .field("tags", &self.tags)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Fetches the root document, seeds the tag set and the cache with it, and
    /// starts warming the cache in the background.
    pub async fn init(
        source: Arc<dyn DataSource>,
        sink: Arc<dyn ActionSink>,
        surface: Arc<dyn MenuSurface>,
        config: &MenuConfig,
    ) -> Result<Self, MenuError> {
        let root = source
            .fetch_root()
            .await
            .map_err(|e| classify(&MenuId::new("root"), e))?;
        let root_id = root.root_menu_id.clone();
        log::debug!(
            "Root menu '{}' with {} initial tags",
            root_id,
            root.tags.len()
        );

        let tags = TagStore::with_tags(root.tags.clone());
        let cache = Arc::new(MenuCache::new(source));
        cache.seed(root.menu());

        let prefetcher = Prefetcher::new(cache.clone(), tags.clone());
        let warmup = prefetcher.spawn(root_id.clone(), config.prefetch.initial_depth);
        let items = ItemGenerator::new(
            cache.clone(),
            tags.clone(),
            prefetcher,
            root_id,
            config.prefetch.item_depth,
        );
        let navigator = Navigator::new(cache.clone(), tags.clone(), sink);

        Ok(Self {
            tags,
            cache,
            items,
            navigator,
            surface,
            settings: config.cascade_settings(),
            current: Mutex::new(None),
            warmup: Mutex::new(Some(warmup)),
        })
    }

    fn current(&self) -> MutexGuard<'_, Option<Cascade>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Closes any open chain and opens the root menu at `anchor`.
    pub async fn open_root(&self, anchor: Rect, attach: AttachSpec) -> Result<Cascade, MenuError> {
        self.close_all();
        let cascade = Cascade::new(
            self.items.clone(),
            self.navigator.clone(),
            self.surface.clone(),
            self.settings,
        );
        cascade.open_root(anchor, attach).await?;
        *self.current() = Some(cascade.clone());
        Ok(cascade)
    }

    /// Discards the open chain, if any.
    pub fn close_all(&self) {
        if let Some(cascade) = self.current().take() {
            cascade.close();
        }
    }

    /// The open cascade.
    pub fn cascade(&self) -> Result<Cascade, MenuError> {
        self.current().clone().ok_or(MenuError::NoOpenMenu)
    }

    /// Waits for the initial cache warm-up to settle. Later calls return at once.
    pub async fn warmed_up(&self) {
        let warmup = self
            .warmup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = warmup {
            if let Err(e) = handle.await {
                log::debug!("Initial prefetch did not complete: {}", e);
            }
        }
    }

    pub fn tags(&self) -> &TagStore {
        &self.tags
    }

    pub fn cache(&self) -> &Arc<MenuCache> {
        &self.cache
    }

    pub fn items(&self) -> &ItemGenerator {
        &self.items
    }

    pub fn root_id(&self) -> &MenuId {
        self.items.root_id()
    }
}
