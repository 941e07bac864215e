use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, StrokeKind, Vec2};

use super::gestures::ViewTransform;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Dark or light text, whichever reads better on `background`.
pub(super) fn label_color(background: Color32) -> Color32 {
    let luma = 0.299 * background.r() as f32 + 0.587 * background.g() as f32 + 0.114 * background.b() as f32;
    if luma > 150.0 {
        Color32::from_gray(20)
    } else {
        Color32::from_gray(238)
    }
}

pub(super) fn screen_radius(radius: f32, zoom: f32) -> f32 {
    (radius * zoom).max(2.0)
}

/// Canvas fill, a grid that follows pan and zoom, and the outline of the
/// area the layout keeps nodes inside.
pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: &ViewTransform, world_size: Vec2) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * transform.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + transform.pan;
    let grid = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

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

    if !transform.is_identity() {
        let frame = Rect::from_min_max(
            transform.world_to_screen(rect.min, Vec2::ZERO),
            transform.world_to_screen(rect.min, world_size),
        );
        painter.rect_stroke(
            frame,
            0.0,
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(110, 130, 150, 90)),
            StrokeKind::Inside,
        );
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Bounding-box test only.
pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
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
    fn label_color_contrasts_with_fill() {
        assert_eq!(label_color(Color32::from_rgb(250, 240, 200)), Color32::from_gray(20));
        assert_eq!(label_color(Color32::from_rgb(30, 40, 60)), Color32::from_gray(238));
    }

    #[test]
    fn visibility_checks() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(-5.0, 50.0), 10.0));
        assert!(!circle_visible(rect, pos2(-20.0, 50.0), 10.0));
        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 1.0));
        assert!(!edge_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, -5.0), 1.0));
    }

    #[test]
    fn blending_and_opacity() {
        let mixed = blend_color(Color32::BLACK, Color32::WHITE, 0.5);
        assert_eq!(mixed.r(), 127);
        assert_eq!(with_opacity(Color32::RED, 0.0).a(), 0);
        assert!(screen_radius(1.0, 0.2) >= 2.0);
    }
}
