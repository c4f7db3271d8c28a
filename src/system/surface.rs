// src/system/surface.rs

use crate::{
    constants::{
        CHAR_WIDTH_PX, EDGE_SPACER_PX, ITEM_PADDING_PX, LINE_HEIGHT_PX, SCROLL_BUTTON_PX,
    },
    models::{AttachSpec, AttachX, MenuId, MenuItem, Placement, Rect, Size},
};
use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Everything a surface needs to draw one level of the cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuView {
    pub level: usize,
    pub menu_id: MenuId,
    pub items: Vec<MenuItem>,
    pub placement: Placement,
    /// The natural size reported by the measuring pass.
    pub size: Size,
    pub highlighted: Option<usize>,
    pub scroll_offset: f64,
}

impl MenuView {
    /// Arrows are drawn on the side a child menu opens towards, and only when
    /// at least one item can open one.
    pub fn show_arrows(&self) -> bool {
        self.items.iter().any(|item| item.sub_menu_id.is_some())
    }
}

/// In-place visual state of one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemVisual {
    pub highlighted: bool,
    pub loading: bool,
}

/// The rendering side of the cascade.
///
/// Calls arrive while the cascade holds its own lock, so implementations must
/// never call back into the cascade.
pub trait MenuSurface: Send + Sync {
    /// The sizing pass: the natural size of `items` laid out for `attach`.
    /// Nothing is displayed.
    fn measure(&self, items: &[MenuItem], attach: AttachSpec) -> Size;
    /// Displays `view` as `level`, replacing that level and anything deeper.
    fn show(&self, level: usize, view: &MenuView);
    fn update_item(&self, level: usize, item: &MenuItem, visual: ItemVisual);
    /// Removes `level` and every deeper level.
    fn close_from(&self, level: usize);
    fn set_scroll(&self, level: usize, offset: f64);
}

/// Character-cell metrics of the text surface. Read from the `[surface]` table.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct TextMetrics {
    pub char_width: f64,
    pub line_height: f64,
    pub item_padding: f64,
    pub edge_spacer: f64,
    pub scroll_button: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: CHAR_WIDTH_PX,
            line_height: LINE_HEIGHT_PX,
            item_padding: ITEM_PADDING_PX,
            edge_spacer: EDGE_SPACER_PX,
            scroll_button: SCROLL_BUTTON_PX,
        }
    }
}

#[derive(Debug, Clone)]
struct Frame {
    view: MenuView,
    visuals: BTreeMap<usize, ItemVisual>,
}

impl Frame {
    fn visual(&self, display_index: usize) -> ItemVisual {
        self.visuals
            .get(&display_index)
            .copied()
            .unwrap_or(ItemVisual {
                highlighted: self.view.highlighted == Some(display_index),
                loading: false,
            })
    }
}

/// A headless surface that lays menus out on a character grid.
///
/// It mirrors every displayed level so callers can ask where an item sits, and
/// optionally echoes each change to stdout.
#[derive(Debug)]
pub struct TextSurface {
    metrics: TextMetrics,
    echo: bool,
    frames: Mutex<Vec<Frame>>,
}

impl TextSurface {
    pub fn new(metrics: TextMetrics, echo: bool) -> Self {
        Self {
            metrics,
            echo,
            frames: Mutex::new(Vec::new()),
        }
    }

    /// A surface that only records, with default metrics.
    pub fn headless() -> Self {
        Self::new(TextMetrics::default(), false)
    }

    fn frames(&self) -> MutexGuard<'_, Vec<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of levels currently displayed.
    pub fn depth(&self) -> usize {
        self.frames().len()
    }

    /// Menu ids of the displayed levels, root first.
    pub fn menu_ids(&self) -> Vec<MenuId> {
        self.frames().iter().map(|f| f.view.menu_id.clone()).collect()
    }

    pub fn visual(&self, level: usize, display_index: usize) -> Option<ItemVisual> {
        let frames = self.frames();
        let frame = frames.get(level)?;
        (display_index < frame.view.items.len()).then(|| frame.visual(display_index))
    }

    pub fn scroll_offset(&self, level: usize) -> Option<f64> {
        self.frames().get(level).map(|f| f.view.scroll_offset)
    }

    /// The box an item occupies on screen, accounting for scrolling. This is the
    /// anchor its child menu is placed against.
    pub fn item_box(&self, level: usize, display_index: usize) -> Option<Rect> {
        let frames = self.frames();
        let view = &frames.get(level)?.view;
        if display_index >= view.items.len() {
            return None;
        }
        let placement = &view.placement;
        let width = view.size.width.min(placement.max_width);
        let mut top = placement.position.top - view.scroll_offset
            + display_index as f64 * self.metrics.line_height;
        if placement.must_scroll {
            top += self.metrics.scroll_button;
        }
        Some(Rect::new(
            placement.position.left,
            placement.position.left + width,
            top,
            top + self.metrics.line_height,
        ))
    }

    /// Renders every displayed level as text.
    pub fn render(&self) -> String {
        self.frames()
            .iter()
            .map(render_frame)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn echo_level(&self, frames: &[Frame], level: usize) {
        if self.echo {
            if let Some(frame) = frames.get(level) {
                println!("{}", render_frame(frame));
            }
        }
    }
}

impl MenuSurface for TextSurface {
    fn measure(&self, items: &[MenuItem], _attach: AttachSpec) -> Size {
        let widest = items
            .iter()
            .map(|item| item.label.chars().count())
            .max()
            .unwrap_or(0);
        let mut width = widest as f64 * self.metrics.char_width + 2.0 * self.metrics.item_padding;
        if items.iter().any(|item| item.sub_menu_id.is_some()) {
            width += self.metrics.edge_spacer;
        }
        let height = items.len() as f64 * self.metrics.line_height;
        Size::new(width, height).floor()
    }

    fn show(&self, level: usize, view: &MenuView) {
        let mut frames = self.frames();
        if level > frames.len() {
            log::warn!(
                "Showing level {} while only {} levels are displayed",
                level,
                frames.len()
            );
        }
        frames.truncate(level);
        frames.push(Frame {
            view: view.clone(),
            visuals: BTreeMap::new(),
        });
        let shown = frames.len() - 1;
        self.echo_level(&frames, shown);
    }

    fn update_item(&self, level: usize, item: &MenuItem, visual: ItemVisual) {
        let mut frames = self.frames();
        let Some(frame) = frames.get_mut(level) else {
            return;
        };
        frame.visuals.insert(item.display_index, visual);
        self.echo_level(&frames, level);
    }

    fn close_from(&self, level: usize) {
        let mut frames = self.frames();
        if level < frames.len() {
            frames.truncate(level);
            if self.echo {
                println!("{}", format!("[closed levels >= {}]", level).dimmed());
            }
        }
    }

    fn set_scroll(&self, level: usize, offset: f64) {
        let mut frames = self.frames();
        if let Some(frame) = frames.get_mut(level) {
            frame.view.scroll_offset = offset;
        }
        self.echo_level(&frames, level);
    }
}

fn render_frame(frame: &Frame) -> String {
    let view = &frame.view;
    let placement = &view.placement;
    let mut out = format!(
        "{} '{}' at ({}, {}) {}x{} {}/{}",
        format!("[{}]", view.level).cyan().bold(),
        view.menu_id,
        placement.position.left,
        placement.position.top,
        view.size.width.min(placement.max_width),
        view.size.height.min(placement.max_height),
        placement.attach.x,
        placement.attach.y,
    );
    if placement.must_scroll {
        out.push_str(&format!(" scroll {}", view.scroll_offset).yellow().to_string());
    }

    let arrows = view.show_arrows();
    for item in &view.items {
        let visual = frame.visual(item.display_index);
        let edge = if visual.loading {
            "…"
        } else if item.sub_menu_id.is_some() {
            match placement.attach.x {
                AttachX::Left => "◂",
                AttachX::Right => "▸",
            }
        } else {
            " "
        };
        let label = if item.disabled {
            item.label.dimmed()
        } else if visual.highlighted {
            item.label.reversed()
        } else {
            item.label.normal()
        };
        let line = match (arrows, placement.attach.x) {
            (false, _) => format!("  {:>2} {}", item.display_index, label),
            (true, AttachX::Left) => format!("  {:>2} {} {}", item.display_index, edge, label),
            (true, AttachX::Right) => format!("  {:>2} {} {}", item.display_index, label, edge),
        };
        out.push('\n');
        out.push_str(&line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttachY, Position};

    fn item(display_index: usize, label: &str, sub: Option<&str>) -> MenuItem {
        MenuItem {
            menu_id: MenuId::new("m"),
            entry_index: display_index,
            display_index,
            label: label.to_string(),
            disabled: false,
            sub_menu_id: sub.map(MenuId::new),
        }
    }

    fn view(level: usize, items: Vec<MenuItem>, must_scroll: bool) -> MenuView {
        MenuView {
            level,
            menu_id: MenuId::new(format!("level{}", level)),
            items,
            placement: Placement {
                position: Position {
                    left: 100.0,
                    top: 50.0,
                },
                max_width: 300.0,
                max_height: 64.0,
                attach: AttachSpec::new(AttachX::Right, AttachY::Top),
                must_scroll,
            },
            size: Size::new(120.0, 96.0),
            highlighted: None,
            scroll_offset: 0.0,
        }
    }

    #[test]
    fn test_measure_uses_widest_label_and_edge_spacer() {
        let surface = TextSurface::headless();
        let items = vec![item(0, "Look", None), item(1, "Go north", Some("n"))];

        let size = surface.measure(&items, AttachSpec::default());

        // 8 chars * 8px + 2 * 20px padding + 15px spacer, 2 lines of 32px.
        assert_eq!(size, Size::new(119.0, 64.0));
    }

    #[test]
    fn test_show_replaces_deeper_levels() {
        let surface = TextSurface::headless();
        surface.show(0, &view(0, vec![item(0, "a", None)], false));
        surface.show(1, &view(1, vec![item(0, "b", None)], false));
        surface.show(2, &view(2, vec![item(0, "c", None)], false));

        surface.show(1, &view(1, vec![item(0, "d", None)], false));

        assert_eq!(
            surface.menu_ids(),
            vec![MenuId::new("level0"), MenuId::new("level1")]
        );
        surface.close_from(1);
        assert_eq!(surface.depth(), 1);
    }

    #[test]
    fn test_item_box_accounts_for_scroll_controls() {
        let surface = TextSurface::headless();
        surface.show(
            0,
            &view(0, vec![item(0, "a", None), item(1, "b", None), item(2, "c", None)], true),
        );
        surface.set_scroll(0, 10.0);

        let rect = surface.item_box(0, 1).unwrap();

        // top = 50 - 10 + 32 + 20 (scroll button)
        assert_eq!(rect, Rect::new(100.0, 220.0, 92.0, 124.0));
        assert!(surface.item_box(0, 3).is_none());
    }

    #[test]
    fn test_update_item_tracks_visual_state() {
        let surface = TextSurface::headless();
        let items = vec![item(0, "a", Some("x")), item(1, "b", None)];
        surface.show(0, &view(0, items.clone(), false));

        surface.update_item(
            0,
            &items[0],
            ItemVisual {
                highlighted: true,
                loading: true,
            },
        );

        assert_eq!(
            surface.visual(0, 0),
            Some(ItemVisual {
                highlighted: true,
                loading: true
            })
        );
        assert_eq!(surface.visual(0, 1), Some(ItemVisual::default()));
        assert!(surface.render().contains("level0"));
    }
}
