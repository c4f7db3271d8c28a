// src/core/item_generator.rs

use crate::{
    core::{
        cache::MenuCache,
        errors::MenuError,
        evaluator::{evaluate, resolve_sub_menu_id},
        prefetcher::Prefetcher,
    },
    models::{MenuId, MenuItem},
    state::TagStore,
};
use std::sync::Arc;

/// Builds the visible item list of a menu against the live tag set.
#[derive(Debug, Clone)]
pub struct ItemGenerator {
    cache: Arc<MenuCache>,
    tags: TagStore,
    prefetcher: Prefetcher,
    root_id: MenuId,
    prefetch_depth: u32,
}

impl ItemGenerator {
    pub fn new(
        cache: Arc<MenuCache>,
        tags: TagStore,
        prefetcher: Prefetcher,
        root_id: MenuId,
        prefetch_depth: u32,
    ) -> Self {
        Self {
            cache,
            tags,
            prefetcher,
            root_id,
            prefetch_depth,
        }
    }

    pub fn root_id(&self) -> &MenuId {
        &self.root_id
    }

    /// Returns the items of `menu_id` (the root menu when `None`).
    ///
    /// Hidden entries are skipped and `display_index` only counts emitted items.
    /// A prefetch of the menu's submenus is launched in the background before
    /// returning; it is never awaited here.
    pub async fn items(&self, menu_id: Option<&MenuId>) -> Result<Vec<MenuItem>, MenuError> {
        let menu_id = menu_id.unwrap_or(&self.root_id).clone();
        let menu = self.cache.fetch(&menu_id).await?;

        let items: Vec<MenuItem> = {
            let tags = self.tags.read();
            menu.entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| evaluate(&entry.display, &tags))
                .enumerate()
                .map(|(display_index, (entry_index, entry))| MenuItem {
                    menu_id: menu_id.clone(),
                    entry_index,
                    display_index,
                    label: entry.label.clone(),
                    disabled: entry
                        .disabled
                        .as_ref()
                        .is_some_and(|cond| evaluate(cond, &tags)),
                    sub_menu_id: resolve_sub_menu_id(&entry.reaction, &tags),
                })
                .collect()
        };
        log::trace!(
            "Menu '{}': {} of {} entries visible",
            menu_id,
            items.len(),
            menu.entries.len()
        );

        self.prefetcher.spawn(menu_id, self.prefetch_depth);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConditionNode, Entry, MenuData, Reaction, RootData, Tags};
    use crate::system::source::MemorySource;
    use std::collections::BTreeMap;

    fn generator(source: Arc<MemorySource>, tags: TagStore) -> (ItemGenerator, Arc<MenuCache>) {
        let cache = Arc::new(MenuCache::new(source));
        let prefetcher = Prefetcher::new(cache.clone(), tags.clone());
        (
            ItemGenerator::new(cache.clone(), tags, prefetcher, MenuId::new("root"), 1),
            cache,
        )
    }

    fn root(entries: Vec<Entry>) -> RootData {
        RootData {
            tags: Tags::new(),
            root_menu_id: MenuId::new("root"),
            entries,
        }
    }

    #[tokio::test]
    async fn test_hidden_entries_are_skipped_and_indices_compacted() {
        // --- Setup ---
        let source = Arc::new(MemorySource::new(root(vec![
            Entry::new("hidden").display(ConditionNode::TagSet("x".into())),
            Entry::new("A"),
            Entry::new("B").disabled_when(ConditionNode::TagUnset("x".into())),
            Entry::new("C").disabled_when(ConditionNode::TagSet("x".into())),
        ])));
        let (items, _) = generator(source, TagStore::new());

        // --- Execute ---
        let list = items.items(None).await.unwrap();

        // --- Assert ---
        let summary: Vec<(&str, usize, usize, bool)> = list
            .iter()
            .map(|i| (i.label.as_str(), i.entry_index, i.display_index, i.disabled))
            .collect();
        assert_eq!(
            summary,
            vec![("A", 1, 0, false), ("B", 2, 1, true), ("C", 3, 2, false)]
        );
        assert!(list.iter().all(|i| i.menu_id == MenuId::new("root")));
    }

    #[tokio::test]
    async fn test_sub_menu_ids_follow_live_tags() {
        let reaction = Reaction {
            sub_menu: Some("room".into()),
            sub_id_postfix: Some("zone".into()),
            ..Reaction::default()
        };
        let source = Arc::new(MemorySource::new(root(vec![Entry::new("Go").reaction(reaction)])));
        let tags = TagStore::new();
        let (items, _) = generator(source, tags.clone());

        assert_eq!(items.items(None).await.unwrap()[0].sub_menu_id, None);

        tags.apply(&BTreeMap::from([("zone".to_string(), "3".to_string())]), &[]);
        assert_eq!(
            items.items(None).await.unwrap()[0].sub_menu_id,
            Some(MenuId::new("room3"))
        );
    }

    #[tokio::test]
    async fn test_items_trigger_background_prefetch() {
        let source = Arc::new(
            MemorySource::new(root(vec![Entry::new("A").reaction(Reaction {
                sub_menu: Some("m1".into()),
                ..Reaction::default()
            })]))
            .with_menu(MenuData {
                id: MenuId::new("m1"),
                entries: vec![],
            }),
        );
        let (items, cache) = generator(source.clone(), TagStore::new());

        items.items(None).await.unwrap();
        for _ in 0..50 {
            if cache.is_cached(&MenuId::new("m1")) {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(cache.is_cached(&MenuId::new("m1")));
    }

    #[tokio::test]
    async fn test_unknown_menu_is_unavailable() {
        let source = Arc::new(MemorySource::new(root(vec![])));
        let (items, _) = generator(source, TagStore::new());

        let err = items.items(Some(&MenuId::new("nowhere"))).await.unwrap_err();

        assert!(matches!(err, MenuError::DataUnavailable { .. }));
    }
}
