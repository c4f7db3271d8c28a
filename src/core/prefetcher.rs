// src/core/prefetcher.rs

use crate::{
    core::{cache::MenuCache, evaluator::resolve_sub_menu_id},
    models::MenuId,
    state::TagStore,
};
use log::debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};

type PrefetchFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Warms the menu cache for submenus reachable from a menu.
///
/// Reachability ignores `display` and `disabled`: every entry whose reaction
/// resolves to a submenu id under the current tags is followed.
#[derive(Debug, Clone)]
pub struct Prefetcher {
    cache: Arc<MenuCache>,
    tags: TagStore,
}

impl Prefetcher {
    pub fn new(cache: Arc<MenuCache>, tags: TagStore) -> Self {
        Self { cache, tags }
    }

    /// Fetches `id`, then every submenu it leads to, recursing `depth - 1` more levels.
    ///
    /// Resolves once every triggered fetch has settled. A failing branch is logged
    /// and dropped without affecting its siblings.
    pub fn prefetch(&self, id: MenuId, depth: u32) -> PrefetchFuture {
        let this = self.clone();
        Box::pin(async move {
            let menu = match this.cache.fetch(&id).await {
                Ok(menu) => menu,
                Err(e) => {
                    debug!("Prefetch of '{}' dropped: {}", id, e);
                    return;
                }
            };
            if depth == 0 {
                return;
            }

            let children: Vec<MenuId> = {
                let tags = this.tags.read();
                menu.entries
                    .iter()
                    .filter_map(|entry| resolve_sub_menu_id(&entry.reaction, &tags))
                    .collect()
            };

            let mut branches = JoinSet::new();
            for child in children {
                // Recursing fetches the child itself first, so depth 1 only needs the fetch.
                branches.spawn(this.prefetch(child, depth - 1));
            }
            while let Some(result) = branches.join_next().await {
                if let Err(e) = result {
                    debug!("Prefetch branch under '{}' aborted: {}", id, e);
                }
            }
        })
    }

    /// Launches [`Prefetcher::prefetch`] as a detached background task.
    pub fn spawn(&self, id: MenuId, depth: u32) -> JoinHandle<()> {
        debug!("Spawning prefetch of '{}' at depth {}", id, depth);
        tokio::spawn(self.prefetch(id, depth))
    }
}
