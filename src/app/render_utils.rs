use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use crate::graph::LinkKind;

use super::transform::ViewTransform;

pub(super) const NODE_FILL: Color32 = Color32::from_rgb(30, 41, 59);
pub(super) const LABEL_COLOR: Color32 = Color32::WHITE;
pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

const ROOT_OUTLINE: Color32 = Color32::from_rgb(168, 85, 247);
const FIRST_HOP_OUTLINE: Color32 = Color32::from_rgb(59, 130, 246);
const DEEP_OUTLINE: Color32 = Color32::from_rgb(100, 116, 139);
const MUTUAL_LINK: Color32 = Color32::from_rgb(34, 197, 94);
const FOLLOWER_LINK: Color32 = Color32::from_rgb(71, 85, 105);

pub(super) fn level_color(level: u8) -> Color32 {
    match level {
        0 => ROOT_OUTLINE,
        1 => FIRST_HOP_OUTLINE,
        _ => DEEP_OUTLINE,
    }
}

/// Link stroke at scale `k`; widths are model units like everything else.
pub(super) fn link_stroke(kind: LinkKind, k: f32) -> Stroke {
    match kind {
        LinkKind::Mutual => Stroke::new(3.0 * k, MUTUAL_LINK),
        LinkKind::Follower => Stroke::new(1.0 * k, FOLLOWER_LINK),
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: &ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(2, 6, 23));

    let step = (56.0 * transform.k.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + transform.offset;
    let grid = Stroke::new(1.0, Color32::from_rgba_unmultiplied(51, 65, 85, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], grid);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], grid);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn outline_depends_on_level() {
        assert_eq!(level_color(0), ROOT_OUTLINE);
        assert_eq!(level_color(1), FIRST_HOP_OUTLINE);
        assert_eq!(level_color(2), DEEP_OUTLINE);
        assert_eq!(level_color(3), DEEP_OUTLINE);
    }

    #[test]
    fn culling_keeps_partially_visible_shapes() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(-10.0, 50.0), 15.0));
        assert!(!circle_visible(rect, pos2(-20.0, 50.0), 15.0));
        assert!(segment_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!segment_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, -10.0), 2.0));
    }
}
