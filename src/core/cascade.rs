// src/core/cascade.rs

use crate::{
    constants::{
        DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, LOADING_DELAY_MS, SCROLL_BUTTON_PX,
        SCROLL_INTERVAL_MS, SCROLL_STEP_PX,
    },
    core::{
        errors::MenuError,
        item_generator::ItemGenerator,
        layout::place,
        loading::{LoadingIndicator, OnLoadingChange},
        navigator::Navigator,
    },
    dev_utils::BlockTimer,
    models::{AttachSpec, MenuId, MenuItem, Placement, Rect, Size},
    system::surface::{ItemVisual, MenuSurface, MenuView},
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Tunables of a cascade, usually built from the `[viewport]`, `[loading]` and
/// `[scroll]` config tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeSettings {
    pub viewport: Size,
    pub loading_delay: Duration,
    pub scroll_step: f64,
    pub scroll_interval: Duration,
    /// Height of each scroll control; two of them eat into a scrolling menu.
    pub scroll_controls: f64,
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self {
            viewport: Size::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
            loading_delay: Duration::from_millis(LOADING_DELAY_MS),
            scroll_step: SCROLL_STEP_PX,
            scroll_interval: Duration::from_millis(SCROLL_INTERVAL_MS),
            scroll_controls: SCROLL_BUTTON_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    fn sign(self) -> f64 {
        match self {
            Self::Up => -1.0,
            Self::Down => 1.0,
        }
    }
}

/// How a submenu open requested by a hover ended.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    /// The child was attached one level below the hovered item.
    Opened(MenuId),
    /// After selection the entry no longer resolved to a submenu.
    NoSubMenu,
    /// The hovered item lost its highlight before the child was ready.
    Discarded,
    /// Resolving the child failed; the parent item is back to plain highlighted.
    Failed(MenuError),
}

/// Handle to an open request running in the background.
///
/// Dropping it does not cancel the request.
#[derive(Debug)]
pub struct PendingOpen {
    level: usize,
    handle: JoinHandle<OpenOutcome>,
}

impl PendingOpen {
    /// The level the child will occupy.
    pub fn level(&self) -> usize {
        self.level
    }

    pub async fn outcome(self) -> OpenOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::debug!("Open of level {} did not complete: {}", self.level, e);
                OpenOutcome::Discarded
            }
        }
    }
}

struct Level {
    menu_id: MenuId,
    items: Vec<MenuItem>,
    placement: Placement,
    size: Size,
    highlighted: Option<usize>,
    loading: Option<LoadingIndicator>,
    generation: u64,
    scroll_offset: f64,
    scroll_task: Option<JoinHandle<()>>,
}

impl Level {
    fn new(menu_id: MenuId, items: Vec<MenuItem>, size: Size, placement: Placement) -> Self {
        Self {
            menu_id,
            items,
            placement,
            size,
            highlighted: None,
            loading: None,
            generation: 0,
            scroll_offset: 0.0,
            scroll_task: None,
        }
    }

    fn view(&self, level: usize) -> MenuView {
        MenuView {
            level,
            menu_id: self.menu_id.clone(),
            items: self.items.clone(),
            placement: self.placement,
            size: self.size,
            highlighted: self.highlighted,
            scroll_offset: self.scroll_offset,
        }
    }

    /// Largest scroll offset: content height minus the visible list height.
    fn scroll_range(&self, controls: f64) -> f64 {
        if !self.placement.must_scroll {
            return 0.0;
        }
        let visible = self.placement.max_height - 2.0 * controls;
        (self.size.height - visible).max(0.0)
    }

    fn stop_scrolling(&mut self) {
        if let Some(task) = self.scroll_task.take() {
            task.abort();
        }
    }

    fn teardown(mut self) {
        if let Some(indicator) = self.loading.take() {
            indicator.cancel();
        }
        self.stop_scrolling();
    }
}

#[derive(Default)]
struct Chain {
    levels: Vec<Level>,
    last_generation: u64,
}

impl Chain {
    /// Generations are unique across the whole chain, so a request can never
    /// match a level that was closed and reopened in the meantime.
    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    /// Drops every level from `len` on. Returns whether anything was closed.
    fn truncate(&mut self, len: usize) -> bool {
        if self.levels.len() <= len {
            return false;
        }
        for level in self.levels.drain(len..) {
            level.teardown();
        }
        true
    }
}

struct Inner {
    chain: Mutex<Chain>,
    items: ItemGenerator,
    navigator: Navigator,
    surface: Arc<dyn MenuSurface>,
    settings: CascadeSettings,
}

/// The chain of open menus, root at level 0, at most one child per level.
///
/// Event methods are synchronous except where a fetch is involved. Submenus
/// open in background tasks whose results are applied only if the item that
/// requested them is still highlighted.
#[derive(Clone)]
pub struct Cascade {
    inner: Arc<Inner>,
}

impl fmt::Debug for Cascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cascade")
            .field("menus", &self.menu_ids())
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

impl Cascade {
    pub fn new(
        items: ItemGenerator,
        navigator: Navigator,
        surface: Arc<dyn MenuSurface>,
        settings: CascadeSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                chain: Mutex::new(Chain::default()),
                items,
                navigator,
                surface,
                settings,
            }),
        }
    }

    /// Opens the root menu at `anchor`, replacing whatever was open.
    pub async fn open_root(&self, anchor: Rect, attach: AttachSpec) -> Result<(), MenuError> {
        let inner = &self.inner;
        let items = inner.items.items(None).await?;
        let (size, placement) = inner.layout(&items, anchor, attach);
        let root = Level::new(inner.items.root_id().clone(), items, size, placement);

        let mut chain = inner.chain();
        if chain.truncate(0) {
            inner.surface.close_from(0);
        }
        inner.surface.show(0, &root.view(0));
        chain.levels.push(root);
        log::debug!("Opened root menu '{}'", inner.items.root_id());
        Ok(())
    }

    /// Pointer entered item `display_index` of `level`, whose box is `item_box`.
    ///
    /// Disabled items, unknown positions and the already highlighted item are
    /// ignored. Otherwise the highlight moves and every deeper level closes
    /// at once. Returns a handle when the item leads to a submenu and an open
    /// was started.
    pub fn hover_enter(
        &self,
        level: usize,
        display_index: usize,
        item_box: Rect,
    ) -> Option<PendingOpen> {
        let inner = &self.inner;
        let mut chain = inner.chain();
        let current = chain.levels.get(level)?;
        let item = current.items.get(display_index)?.clone();
        if item.disabled || current.highlighted == Some(display_index) {
            return None;
        }

        let generation = chain.next_generation();
        let parent = chain.levels.get_mut(level)?;
        if let Some(indicator) = parent.loading.take() {
            indicator.cancel();
        }
        if let Some(previous) = parent.highlighted.replace(display_index) {
            if let Some(previous) = parent.items.get(previous) {
                inner
                    .surface
                    .update_item(level, previous, ItemVisual::default());
            }
        }
        parent.generation = generation;
        inner.surface.update_item(
            level,
            &item,
            ItemVisual {
                highlighted: true,
                loading: false,
            },
        );
        let attach = parent.placement.attach;

        if item.sub_menu_id.is_some() {
            parent.loading = Some(LoadingIndicator::start(
                inner.settings.loading_delay,
                inner.loading_callback(level, &item),
            ));
        }
        if chain.truncate(level + 1) {
            inner.surface.close_from(level + 1);
        }
        drop(chain);

        item.sub_menu_id.as_ref()?;
        log::trace!("Opening submenu of '{}' (generation {})", item.label, generation);
        let task = inner.clone();
        let handle = tokio::spawn(async move {
            task.open_child(level, generation, item, item_box, attach)
                .await
        });
        Some(PendingOpen {
            level: level + 1,
            handle,
        })
    }

    /// Pointer left item `display_index` of `level`.
    ///
    /// An item whose child is open or still loading keeps its highlight, since
    /// the pointer is usually on its way into that child. Nothing is closed.
    pub fn hover_leave(&self, level: usize, display_index: usize) {
        let inner = &self.inner;
        let mut chain = inner.chain();
        let has_child = chain.levels.len() > level + 1;
        let Some(current) = chain.levels.get_mut(level) else {
            return;
        };
        if current.highlighted != Some(display_index) {
            return;
        }
        let loading = current
            .loading
            .as_ref()
            .is_some_and(LoadingIndicator::is_pending);
        if has_child || loading {
            return;
        }
        current.highlighted = None;
        if let Some(item) = current.items.get(display_index) {
            inner.surface.update_item(level, item, ItemVisual::default());
        }
    }

    /// Clicks item `display_index` of `level`: selects it and closes the chain.
    ///
    /// Returns the submenu the entry resolves to after its tag changes.
    pub async fn activate(
        &self,
        level: usize,
        display_index: usize,
    ) -> Result<Option<MenuId>, MenuError> {
        let item = {
            let chain = self.inner.chain();
            let current = chain
                .levels
                .get(level)
                .ok_or(MenuError::UnknownLevel(level))?;
            let item = current.items.get(display_index).ok_or_else(|| {
                MenuError::EntryOutOfRange {
                    menu: current.menu_id.clone(),
                    index: display_index,
                    len: current.items.len(),
                }
            })?;
            if item.disabled {
                return Err(MenuError::DisabledItem {
                    menu: item.menu_id.clone(),
                    index: item.entry_index,
                });
            }
            item.clone()
        };

        let resolved = self
            .inner
            .navigator
            .select(&item.menu_id, item.entry_index)
            .await?;
        self.close();
        Ok(resolved)
    }

    /// Starts nudging `level` while its scroll control is hovered. Returns
    /// `false` when the level does not scroll.
    pub fn scroll_hover_start(&self, level: usize, direction: ScrollDirection) -> bool {
        let inner = &self.inner;
        let mut chain = inner.chain();
        let Some(current) = chain.levels.get_mut(level) else {
            return false;
        };
        if !current.placement.must_scroll {
            return false;
        }
        current.stop_scrolling();

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let step = direction.sign() * inner.settings.scroll_step;
        let period = inner.settings.scroll_interval.max(Duration::from_millis(1));
        current.scroll_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if inner.scroll_by(level, step).is_none() {
                    break;
                }
            }
        }));
        true
    }

    pub fn scroll_hover_end(&self, level: usize) {
        if let Some(current) = self.inner.chain().levels.get_mut(level) {
            current.stop_scrolling();
        }
    }

    /// A single nudge, as when a scroll control is clicked. Returns the new offset.
    pub fn scroll_click(&self, level: usize, direction: ScrollDirection) -> Option<f64> {
        self.inner
            .scroll_by(level, direction.sign() * self.inner.settings.scroll_step)
    }

    /// Applies a wheel delta in pixels. Returns the new offset.
    pub fn scroll_wheel(&self, level: usize, delta: f64) -> Option<f64> {
        self.inner.scroll_by(level, delta)
    }

    /// Tears the whole chain down.
    pub fn close(&self) {
        let mut chain = self.inner.chain();
        if chain.truncate(0) {
            self.inner.surface.close_from(0);
            log::debug!("Menu chain closed");
        }
    }

    // --- Inspection ---

    pub fn depth(&self) -> usize {
        self.inner.chain().levels.len()
    }

    pub fn menu_ids(&self) -> Vec<MenuId> {
        self.inner
            .chain()
            .levels
            .iter()
            .map(|l| l.menu_id.clone())
            .collect()
    }

    pub fn items(&self, level: usize) -> Option<Vec<MenuItem>> {
        self.inner.chain().levels.get(level).map(|l| l.items.clone())
    }

    pub fn highlighted(&self, level: usize) -> Option<usize> {
        self.inner.chain().levels.get(level)?.highlighted
    }

    pub fn placement(&self, level: usize) -> Option<Placement> {
        self.inner.chain().levels.get(level).map(|l| l.placement)
    }

    pub fn scroll_offset(&self, level: usize) -> Option<f64> {
        self.inner.chain().levels.get(level).map(|l| l.scroll_offset)
    }

    /// Whether the highlighted item of `level` is showing its spinner.
    pub fn is_loading(&self, level: usize) -> bool {
        self.inner
            .chain()
            .levels
            .get(level)
            .and_then(|l| l.loading.as_ref())
            .is_some_and(LoadingIndicator::is_loading)
    }
}

impl Inner {
    fn chain(&self) -> MutexGuard<'_, Chain> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sizing pass followed by placement.
    fn layout(&self, items: &[MenuItem], anchor: Rect, attach: AttachSpec) -> (Size, Placement) {
        let size = {
            let _timer = BlockTimer::new("menu measure");
            self.surface.measure(items, attach).floor()
        };
        let placement = place(size, anchor, attach, self.settings.viewport);
        log::trace!("Placed {:?} at {:?}", size, placement);
        (size, placement)
    }

    fn loading_callback(&self, level: usize, item: &MenuItem) -> OnLoadingChange {
        let surface = self.surface.clone();
        let item = item.clone();
        Arc::new(move |loading| {
            surface.update_item(
                level,
                &item,
                ItemVisual {
                    highlighted: true,
                    loading,
                },
            )
        })
    }

    async fn resolve_child(
        &self,
        item: &MenuItem,
        anchor: Rect,
        attach: AttachSpec,
    ) -> Result<Option<Level>, MenuError> {
        let Some(menu_id) = self
            .navigator
            .select(&item.menu_id, item.entry_index)
            .await?
        else {
            return Ok(None);
        };
        let items = self.items.items(Some(&menu_id)).await?;
        let (size, placement) = self.layout(&items, anchor, attach);
        Ok(Some(Level::new(menu_id, items, size, placement)))
    }

    async fn open_child(
        &self,
        level: usize,
        generation: u64,
        item: MenuItem,
        anchor: Rect,
        attach: AttachSpec,
    ) -> OpenOutcome {
        let resolved = self.resolve_child(&item, anchor, attach).await;

        let mut chain = self.chain();
        let indicator = match chain.levels.get_mut(level) {
            Some(parent) if parent.generation == generation => parent.loading.take(),
            _ => {
                log::debug!(
                    "Discarding submenu of '{}': no longer highlighted",
                    item.label
                );
                return OpenOutcome::Discarded;
            }
        };

        match resolved {
            Ok(Some(child)) => {
                let menu_id = child.menu_id.clone();
                chain.truncate(level + 1);
                self.surface.show(level + 1, &child.view(level + 1));
                chain.levels.push(child);
                if let Some(indicator) = indicator {
                    indicator.finished();
                }
                OpenOutcome::Opened(menu_id)
            }
            Ok(None) => {
                if let Some(indicator) = indicator {
                    indicator.finished();
                }
                OpenOutcome::NoSubMenu
            }
            Err(e) => {
                log::debug!("Submenu of '{}' failed to open: {}", item.label, e);
                if let Some(indicator) = indicator {
                    indicator.cancel();
                }
                self.surface.update_item(
                    level,
                    &item,
                    ItemVisual {
                        highlighted: true,
                        loading: false,
                    },
                );
                OpenOutcome::Failed(e)
            }
        }
    }

    fn scroll_by(&self, level: usize, delta: f64) -> Option<f64> {
        let mut chain = self.chain();
        let current = chain.levels.get_mut(level)?;
        let range = current.scroll_range(self.settings.scroll_controls);
        let offset = (current.scroll_offset + delta).clamp(0.0, range);
        if offset != current.scroll_offset {
            current.scroll_offset = offset;
            self.surface.set_scroll(level, offset);
        }
        Some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{cache::MenuCache, prefetcher::Prefetcher};
    use crate::models::{ConditionNode, Entry, MenuData, Reaction, RootData, Tags};
    use crate::state::TagStore;
    use crate::system::{executor::LogSink, source::MemorySource, surface::TextSurface};
    use std::collections::BTreeMap;

    struct Fixture {
        cascade: Cascade,
        surface: Arc<TextSurface>,
        source: Arc<MemorySource>,
        tags: TagStore,
    }

    fn sub(id: &str) -> Reaction {
        Reaction {
            sub_menu: Some(id.into()),
            ..Reaction::default()
        }
    }

    fn menu(id: &str, labels: &[&str]) -> MenuData {
        MenuData {
            id: MenuId::new(id),
            entries: labels.iter().map(|l| Entry::new(*l)).collect(),
        }
    }

    fn source() -> MemorySource {
        let root = RootData {
            tags: Tags::new(),
            root_menu_id: MenuId::new("root"),
            entries: vec![
                Entry::new("Look").reaction(Reaction {
                    set_tags: BTreeMap::from([("looked".to_string(), String::new())]),
                    ..Reaction::default()
                }),
                Entry::new("Door").reaction(Reaction {
                    set_tags: BTreeMap::from([("opened".to_string(), String::new())]),
                    ..sub("door")
                }),
                Entry::new("Window").reaction(sub("window")),
                Entry::new("Vault")
                    .disabled_when(ConditionNode::TagUnset("key".into()))
                    .reaction(sub("vault")),
            ],
        };
        MemorySource::new(root)
            .with_menu(menu("door", &["Knock", "Enter"]))
            .with_menu(menu("window", &["Peek"]))
    }

    fn fixture_with(source: MemorySource, settings: CascadeSettings) -> Fixture {
        let source = Arc::new(source);
        let tags = TagStore::new();
        let cache = Arc::new(MenuCache::new(source.clone()));
        let prefetcher = Prefetcher::new(cache.clone(), tags.clone());
        let items = ItemGenerator::new(
            cache.clone(),
            tags.clone(),
            prefetcher,
            MenuId::new("root"),
            1,
        );
        let navigator = Navigator::new(cache, tags.clone(), Arc::new(LogSink));
        let surface = Arc::new(TextSurface::headless());
        let cascade = Cascade::new(items, navigator, surface.clone(), settings);
        Fixture {
            cascade,
            surface,
            source,
            tags,
        }
    }

    async fn opened(source: MemorySource) -> Fixture {
        let fx = fixture_with(source, CascadeSettings::default());
        fx.cascade
            .open_root(Rect::point(10.0, 10.0), AttachSpec::default())
            .await
            .unwrap();
        fx
    }

    fn item_box(fx: &Fixture, level: usize, index: usize) -> Rect {
        fx.surface.item_box(level, index).unwrap()
    }

    #[tokio::test]
    async fn test_open_root_shows_level_zero() {
        let fx = opened(source()).await;

        assert_eq!(fx.cascade.menu_ids(), vec![MenuId::new("root")]);
        assert_eq!(fx.surface.menu_ids(), vec![MenuId::new("root")]);
        assert_eq!(fx.cascade.items(0).unwrap().len(), 4);
        assert_eq!(fx.cascade.highlighted(0), None);
        let placement = fx.cascade.placement(0).unwrap();
        assert_eq!(placement.position.left, 10.0);
        assert_eq!(placement.position.top, 10.0);
    }

    #[tokio::test]
    async fn test_hover_opens_child_below_item() {
        // --- Setup ---
        let fx = opened(source()).await;
        let anchor = item_box(&fx, 0, 1);

        // --- Execute ---
        let pending = fx.cascade.hover_enter(0, 1, anchor).unwrap();
        let outcome = pending.outcome().await;

        // --- Assert ---
        assert_eq!(outcome, OpenOutcome::Opened(MenuId::new("door")));
        assert_eq!(
            fx.cascade.menu_ids(),
            vec![MenuId::new("root"), MenuId::new("door")]
        );
        assert!(fx.tags.contains("opened"), "hover performs the selection");
        assert_eq!(fx.cascade.highlighted(0), Some(1));
        assert!(!fx.cascade.is_loading(0));
        assert_eq!(
            fx.surface.visual(0, 1),
            Some(ItemVisual {
                highlighted: true,
                loading: false
            })
        );
        let child = fx.cascade.placement(1).unwrap();
        assert_eq!(child.position.left, anchor.right);
        assert_eq!(child.position.top, anchor.top);
    }

    #[tokio::test]
    async fn test_rehover_of_highlighted_item_is_noop() {
        let fx = opened(source()).await;
        let anchor = item_box(&fx, 0, 1);
        fx.cascade.hover_enter(0, 1, anchor).unwrap().outcome().await;

        assert!(fx.cascade.hover_enter(0, 1, anchor).is_none());
        assert_eq!(fx.cascade.depth(), 2);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        // --- Setup ---
        let fx = opened(source()).await;
        let gate = fx.source.hold(&MenuId::new("door"));

        // --- Execute ---
        let slow = fx.cascade.hover_enter(0, 1, item_box(&fx, 0, 1)).unwrap();
        let fast = fx.cascade.hover_enter(0, 2, item_box(&fx, 0, 2)).unwrap();
        assert_eq!(fast.outcome().await, OpenOutcome::Opened(MenuId::new("window")));
        gate.release();

        // --- Assert ---
        assert_eq!(slow.outcome().await, OpenOutcome::Discarded);
        assert_eq!(
            fx.cascade.menu_ids(),
            vec![MenuId::new("root"), MenuId::new("window")]
        );
        assert_eq!(fx.cascade.highlighted(0), Some(2));
        assert_eq!(fx.surface.visual(0, 1), Some(ItemVisual::default()));
    }

    #[tokio::test]
    async fn test_hovering_sibling_closes_child_immediately() {
        let fx = opened(source()).await;
        fx.cascade
            .hover_enter(0, 1, item_box(&fx, 0, 1))
            .unwrap()
            .outcome()
            .await;

        // "Look" has no submenu, so nothing new opens.
        assert!(fx.cascade.hover_enter(0, 0, item_box(&fx, 0, 0)).is_none());

        assert_eq!(fx.cascade.depth(), 1);
        assert_eq!(fx.surface.depth(), 1);
        assert_eq!(fx.cascade.highlighted(0), Some(0));
        assert!(!fx.tags.contains("looked"), "hover without submenu selects nothing");
    }

    #[tokio::test]
    async fn test_failed_open_leaves_menu_usable() {
        // --- Setup ---
        let failing = source();
        failing.fail(&MenuId::new("window"));
        let fx = opened(failing).await;

        // --- Execute ---
        let outcome = fx
            .cascade
            .hover_enter(0, 2, item_box(&fx, 0, 2))
            .unwrap()
            .outcome()
            .await;

        // --- Assert ---
        assert!(matches!(
            outcome,
            OpenOutcome::Failed(MenuError::DataUnavailable { .. })
        ));
        assert_eq!(fx.cascade.depth(), 1);
        assert!(!fx.cascade.is_loading(0));
        assert_eq!(
            fx.surface.visual(0, 2),
            Some(ItemVisual {
                highlighted: true,
                loading: false
            })
        );

        // The failure was not cached, so the next attempt reaches the source again.
        fx.source.recover(&MenuId::new("window"));
        fx.cascade.hover_enter(0, 0, item_box(&fx, 0, 0));
        let retry = fx
            .cascade
            .hover_enter(0, 2, item_box(&fx, 0, 2))
            .unwrap()
            .outcome()
            .await;
        assert_eq!(retry, OpenOutcome::Opened(MenuId::new("window")));
    }

    #[tokio::test]
    async fn test_leave_keeps_highlight_while_child_open() {
        let fx = opened(source()).await;
        fx.cascade
            .hover_enter(0, 1, item_box(&fx, 0, 1))
            .unwrap()
            .outcome()
            .await;

        fx.cascade.hover_leave(0, 1);

        assert_eq!(fx.cascade.highlighted(0), Some(1));
        assert_eq!(fx.cascade.depth(), 2);
    }

    #[tokio::test]
    async fn test_leave_without_child_unhighlights() {
        let fx = opened(source()).await;
        fx.cascade.hover_enter(0, 0, item_box(&fx, 0, 0));

        fx.cascade.hover_leave(0, 0);

        assert_eq!(fx.cascade.highlighted(0), None);
        assert_eq!(fx.surface.visual(0, 0), Some(ItemVisual::default()));
    }

    #[tokio::test]
    async fn test_leave_keeps_highlight_while_loading() {
        let fx = opened(source()).await;
        let gate = fx.source.hold(&MenuId::new("door"));
        let pending = fx.cascade.hover_enter(0, 1, item_box(&fx, 0, 1)).unwrap();
        assert!(fx.cascade.is_loading(0));

        fx.cascade.hover_leave(0, 1);
        assert_eq!(fx.cascade.highlighted(0), Some(1));

        gate.release();
        assert_eq!(pending.outcome().await, OpenOutcome::Opened(MenuId::new("door")));
    }

    #[tokio::test]
    async fn test_disabled_item_is_rejected() {
        let fx = opened(source()).await;

        assert!(fx.cascade.hover_enter(0, 3, item_box(&fx, 0, 3)).is_none());
        assert_eq!(fx.cascade.highlighted(0), None);

        let err = fx.cascade.activate(0, 3).await.unwrap_err();
        assert_eq!(
            err,
            MenuError::DisabledItem {
                menu: MenuId::new("root"),
                index: 3
            }
        );
    }

    #[tokio::test]
    async fn test_activate_selects_and_closes() {
        let fx = opened(source()).await;

        let resolved = fx.cascade.activate(0, 0).await.unwrap();

        assert_eq!(resolved, None);
        assert!(fx.tags.contains("looked"));
        assert_eq!(fx.cascade.depth(), 0);
        assert_eq!(fx.surface.depth(), 0);
    }

    #[tokio::test]
    async fn test_activate_unknown_positions() {
        let fx = opened(source()).await;

        assert_eq!(
            fx.cascade.activate(4, 0).await.unwrap_err(),
            MenuError::UnknownLevel(4)
        );
        assert!(matches!(
            fx.cascade.activate(0, 9).await.unwrap_err(),
            MenuError::EntryOutOfRange { index: 9, len: 4, .. }
        ));
    }

    fn tall_settings() -> CascadeSettings {
        CascadeSettings {
            viewport: Size::new(800.0, 100.0),
            ..CascadeSettings::default()
        }
    }

    async fn tall() -> Fixture {
        let fx = fixture_with(source(), tall_settings());
        fx.cascade
            .open_root(Rect::point(0.0, 0.0), AttachSpec::default())
            .await
            .unwrap();
        fx
    }

    #[tokio::test]
    async fn test_scroll_offsets_are_clamped() {
        // 4 items * 32px = 128px of content, 100 - 2 * 20 = 60px visible.
        let fx = tall().await;
        assert!(fx.cascade.placement(0).unwrap().must_scroll);

        assert_eq!(fx.cascade.scroll_wheel(0, 500.0), Some(68.0));
        assert_eq!(fx.cascade.scroll_click(0, ScrollDirection::Up), Some(62.0));
        assert_eq!(fx.cascade.scroll_wheel(0, -1000.0), Some(0.0));
        assert_eq!(fx.surface.scroll_offset(0), Some(0.0));
        assert_eq!(fx.cascade.scroll_wheel(3, 10.0), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_hover_nudges_until_end() {
        let fx = tall().await;

        assert!(fx.cascade.scroll_hover_start(0, ScrollDirection::Down));
        tokio::time::sleep(Duration::from_millis(25)).await;
        fx.cascade.scroll_hover_end(0);
        let reached = fx.cascade.scroll_offset(0).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(reached > 0.0);
        assert_eq!(fx.cascade.scroll_offset(0), Some(reached));
        assert_eq!(fx.cascade.highlighted(0), None, "scrolling never highlights");
    }

    #[tokio::test]
    async fn test_scroll_hover_ignored_when_menu_fits() {
        let fx = opened(source()).await;

        assert!(!fx.cascade.scroll_hover_start(0, ScrollDirection::Down));
        assert_eq!(fx.cascade.scroll_wheel(0, 40.0), Some(0.0));
    }

    #[tokio::test]
    async fn test_close_tears_down_everything() {
        let fx = opened(source()).await;
        let gate = fx.source.hold(&MenuId::new("door"));
        let pending = fx.cascade.hover_enter(0, 1, item_box(&fx, 0, 1)).unwrap();

        fx.cascade.close();
        gate.release();

        assert_eq!(pending.outcome().await, OpenOutcome::Discarded);
        assert_eq!(fx.cascade.depth(), 0);
        assert_eq!(fx.surface.depth(), 0);
    }
}
