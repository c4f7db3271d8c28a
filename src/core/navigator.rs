// src/core/navigator.rs

use crate::{
    core::{cache::MenuCache, errors::MenuError, evaluator::resolve_sub_menu_id},
    models::{Action, MenuId},
    state::TagStore,
    system::executor::ActionSink,
};
use std::fmt;
use std::sync::Arc;

/// Applies the effects of a selected entry.
///
/// The only state it touches is the shared tag set; every call is a self-loop of
/// the single `Ready` state and nothing is reversible.
#[derive(Clone)]
pub struct Navigator {
    cache: Arc<MenuCache>,
    tags: TagStore,
    sink: Arc<dyn ActionSink>,
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl Navigator {
    pub fn new(cache: Arc<MenuCache>, tags: TagStore, sink: Arc<dyn ActionSink>) -> Self {
        Self { cache, tags, sink }
    }

    /// Selects entry `entry_index` of `menu_id`.
    ///
    /// Tags are set first and unset second, so a name in both ends up unset. A
    /// navigation action is handed to the action sink without waiting for it.
    /// Returns the submenu to open, resolved with the tags as they are after
    /// the mutation.
    ///
    /// Disabled items must be filtered out before reaching this point.
    pub async fn select(
        &self,
        menu_id: &MenuId,
        entry_index: usize,
    ) -> Result<Option<MenuId>, MenuError> {
        let menu = self.cache.fetch(menu_id).await?;
        let entry = menu
            .entries
            .get(entry_index)
            .ok_or_else(|| MenuError::EntryOutOfRange {
                menu: menu_id.clone(),
                index: entry_index,
                len: menu.entries.len(),
            })?;
        let reaction = &entry.reaction;

        self.tags.apply(&reaction.set_tags, &reaction.unset_tags);
        log::debug!(
            "Selected '{}' in '{}': set {:?}, unset {:?}",
            entry.label,
            menu_id,
            reaction.set_tags.keys().collect::<Vec<_>>(),
            reaction.unset_tags
        );

        match &reaction.act {
            Some(action @ Action::Nav { .. }) => self.dispatch(action.clone()),
            Some(Action::Unsupported) => {
                log::debug!("Entry '{}' carries an unsupported action; ignored", entry.label);
            }
            None => {}
        }

        let tags = self.tags.read();
        Ok(resolve_sub_menu_id(reaction, &tags))
    }

    fn dispatch(&self, action: Action) {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.perform(&action).await {
                log::warn!("Action {:?} failed: {:#}", action, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entry, Reaction, RootData, Tags};
    use crate::system::source::MemorySource;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<Action>>,
        notify: Notify,
    }

    #[async_trait]
    impl ActionSink for RecordingSink {
        async fn perform(&self, action: &Action) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(action.clone());
            self.notify.notify_one();
            Ok(())
        }
    }

    fn navigator(entries: Vec<Entry>, tags: TagStore) -> (Navigator, Arc<RecordingSink>) {
        let root = RootData {
            tags: Tags::new(),
            root_menu_id: MenuId::new("root"),
            entries,
        };
        let cache = Arc::new(MenuCache::new(Arc::new(MemorySource::new(root))));
        let sink = Arc::new(RecordingSink::default());
        (Navigator::new(cache, tags, sink.clone()), sink)
    }

    #[tokio::test]
    async fn test_unset_wins_over_set() {
        let tags = TagStore::new();
        let reaction = Reaction {
            set_tags: BTreeMap::from([("a".to_string(), "1".to_string())]),
            unset_tags: vec!["a".to_string()],
            ..Reaction::default()
        };
        let (nav, _) = navigator(vec![Entry::new("x").reaction(reaction)], tags.clone());

        nav.select(&MenuId::new("root"), 0).await.unwrap();

        assert!(!tags.contains("a"));
    }

    #[tokio::test]
    async fn test_sub_menu_uses_post_mutation_tags() {
        let tags = TagStore::new();
        let reaction = Reaction {
            sub_menu: Some("room".into()),
            sub_id_postfix: Some("zone".into()),
            set_tags: BTreeMap::from([("zone".to_string(), "7".to_string())]),
            ..Reaction::default()
        };
        let (nav, _) = navigator(vec![Entry::new("enter").reaction(reaction)], tags.clone());

        let sub = nav.select(&MenuId::new("root"), 0).await.unwrap();

        assert_eq!(sub, Some(MenuId::new("room7")));
        assert_eq!(tags.get("zone").as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_nav_action_is_dispatched() {
        let reaction = Reaction {
            act: Some(Action::Nav {
                url: "https://example.org".into(),
            }),
            ..Reaction::default()
        };
        let (nav, sink) = navigator(
            vec![Entry::new("site").reaction(reaction)],
            TagStore::new(),
        );

        let sub = nav.select(&MenuId::new("root"), 0).await.unwrap();
        sink.notify.notified().await;

        assert_eq!(sub, None);
        assert_eq!(
            *sink.seen.lock().unwrap(),
            vec![Action::Nav {
                url: "https://example.org".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_out_of_range_entry() {
        let (nav, _) = navigator(vec![Entry::new("only")], TagStore::new());

        let err = nav.select(&MenuId::new("root"), 3).await.unwrap_err();

        assert_eq!(
            err,
            MenuError::EntryOutOfRange {
                menu: MenuId::new("root"),
                index: 3,
                len: 1
            }
        );
    }
}
