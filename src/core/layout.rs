// src/core/layout.rs

use crate::models::{AttachSpec, AttachX, AttachY, Placement, Position, Rect, Size};

/// Places a measured menu next to its anchor box inside the viewport.
///
/// Horizontally the preferred side flips only when it underflows and the other
/// side has strictly more room. Vertically there is no room comparison: the menu
/// is shifted back inside the viewport on hard overflow and the attach flips to
/// record that. `must_scroll` is set when the menu is taller than the height left
/// below its final top edge.
pub fn place(candidate: Size, anchor: Rect, preferred: AttachSpec, viewport: Size) -> Placement {
    let mut attach = preferred;

    // --- Horizontal ---
    let left_under_hang = anchor.left - candidate.width;
    let right_over_hang = anchor.right + candidate.width - viewport.width;

    match preferred.x {
        AttachX::Left if left_under_hang < 0.0 && right_over_hang < -left_under_hang => {
            attach.x = AttachX::Right;
        }
        AttachX::Right if right_over_hang > 0.0 && -left_under_hang < right_over_hang => {
            attach.x = AttachX::Left;
        }
        _ => {}
    }

    let (left, max_width) = match attach.x {
        AttachX::Left => {
            let left = left_under_hang.max(0.0);
            (left, anchor.left - left)
        }
        AttachX::Right => (anchor.right, viewport.width - anchor.right),
    };

    // --- Vertical ---
    let top = match preferred.y {
        AttachY::Bottom => {
            let top = anchor.bottom - candidate.height;
            if top < 0.0 {
                attach.y = AttachY::Top;
                0.0
            } else {
                top
            }
        }
        AttachY::Top => {
            let over_hang = anchor.top + candidate.height - viewport.height;
            if over_hang > 0.0 {
                attach.y = AttachY::Bottom;
                (anchor.top - over_hang).max(0.0)
            } else {
                anchor.top
            }
        }
    };
    let max_height = viewport.height - top;

    Placement {
        position: Position { left, top },
        max_width,
        max_height,
        attach,
        must_scroll: candidate.height > max_height,
    }
}
