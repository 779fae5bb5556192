//! Fit-to-viewport geometry for a zoomable item.
//!
//! Everything here is pure and cheap enough to run on every layout pass.

use egui::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::ZoomConfig;

/// How the image is sized inside the viewport before any zoom is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContentMode {
    /// Scale proportionally until one axis touches the viewport edge.
    #[default]
    AspectFit,
    /// Stretch to the viewport on both axes.
    ScaleToFill,
}

/// Symmetric content insets applied by the viewport to center its content.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl Insets {
    pub const ZERO: Self = Self {
        top: 0.0,
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
    };

    pub fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self {
            top: vertical,
            left: horizontal,
            bottom: vertical,
            right: horizontal,
        }
    }

    /// Top-left offset the insets introduce.
    pub fn left_top(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }
}

fn is_degenerate(size: Vec2) -> bool {
    !(size.x > 0.0 && size.y > 0.0) || !size.is_finite()
}

/// Size the image occupies at zoom scale 1.
///
/// Without an image (or with a degenerate one) the viewport size is returned
/// so the placeholder fills the item.
pub fn fitted_size(viewport: Vec2, image: Option<Vec2>, mode: ContentMode) -> Vec2 {
    let image = match image {
        Some(size) if mode == ContentMode::AspectFit && !is_degenerate(size) => size,
        _ => return viewport,
    };
    if is_degenerate(viewport) {
        return viewport;
    }

    let image_ratio = image.x / image.y;
    let viewport_ratio = viewport.x / viewport.y;

    if image_ratio > viewport_ratio {
        Vec2::new(viewport.x, viewport.x / image.x * image.y)
    } else {
        Vec2::new(viewport.y / image.y * image.x, viewport.y)
    }
}

/// Insets that center `content` inside `viewport`; never negative.
pub fn centering_inset(viewport: Vec2, content: Vec2) -> Insets {
    let horizontal = ((viewport.x - content.x) / 2.0).max(0.0);
    let vertical = ((viewport.y - content.y) / 2.0).max(0.0);
    Insets::symmetric(horizontal, vertical)
}

pub fn maximum_zoom_scale(config: &ZoomConfig) -> f32 {
    config.maximum_scale
}

/// True only when the content covers the viewport on both axes.
pub fn is_fully_filling(content: Vec2, viewport: Vec2) -> bool {
    content.x >= viewport.x && content.y >= viewport.y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-3 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn wide_image_in_tall_viewport() {
        let fitted = fitted_size(
            Vec2::new(300.0, 600.0),
            Some(Vec2::new(600.0, 300.0)),
            ContentMode::AspectFit,
        );
        assert_eq!(fitted, Vec2::new(300.0, 150.0));

        let inset = centering_inset(Vec2::new(300.0, 600.0), fitted);
        assert_eq!(inset, Insets::symmetric(0.0, 225.0));
    }

    #[test]
    fn tall_image_in_wide_viewport() {
        let fitted = fitted_size(
            Vec2::new(800.0, 400.0),
            Some(Vec2::new(100.0, 400.0)),
            ContentMode::AspectFit,
        );
        assert_eq!(fitted, Vec2::new(100.0, 400.0));
        assert_eq!(
            centering_inset(Vec2::new(800.0, 400.0), fitted),
            Insets::symmetric(350.0, 0.0)
        );
    }

    #[test]
    fn placeholder_uses_viewport() {
        let viewport = Vec2::new(320.0, 480.0);
        assert_eq!(fitted_size(viewport, None, ContentMode::AspectFit), viewport);
        assert_eq!(
            fitted_size(viewport, Some(Vec2::ZERO), ContentMode::AspectFit),
            viewport
        );
        assert_eq!(
            fitted_size(viewport, Some(Vec2::new(10.0, 20.0)), ContentMode::ScaleToFill),
            viewport
        );
    }

    #[test]
    fn aspect_fit_bounds_and_ratio() {
        let viewports = [
            Vec2::new(300.0, 600.0),
            Vec2::new(1920.0, 1080.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(375.0, 812.0),
        ];
        let images = [
            Vec2::new(600.0, 300.0),
            Vec2::new(4000.0, 3000.0),
            Vec2::new(3.0, 7000.0),
            Vec2::new(512.0, 512.0),
            Vec2::new(10.0, 5.0),
        ];

        for viewport in viewports {
            for image in images {
                let fitted = fitted_size(viewport, Some(image), ContentMode::AspectFit);
                assert!(fitted.x <= viewport.x + 1e-3, "{fitted:?} in {viewport:?}");
                assert!(fitted.y <= viewport.y + 1e-3, "{fitted:?} in {viewport:?}");
                assert!(close(fitted.x / fitted.y, image.x / image.y));
                // One axis always touches the viewport edge
                assert!(close(fitted.x, viewport.x) || close(fitted.y, viewport.y));
            }
        }
    }

    #[test]
    fn inset_never_negative() {
        let inset = centering_inset(Vec2::new(100.0, 100.0), Vec2::new(250.0, 40.0));
        assert_eq!(inset.left, 0.0);
        assert_eq!(inset.right, 0.0);
        assert_eq!(inset.top, 30.0);
        assert_eq!(inset.top, inset.bottom);
    }

    #[test]
    fn filling_requires_both_axes() {
        let viewport = Vec2::new(300.0, 600.0);
        assert!(is_fully_filling(Vec2::new(300.0, 600.0), viewport));
        assert!(is_fully_filling(Vec2::new(600.0, 1200.0), viewport));
        assert!(!is_fully_filling(Vec2::new(600.0, 300.0), viewport));
        assert!(!is_fully_filling(Vec2::new(100.0, 900.0), viewport));
    }

    #[test]
    fn maximum_scale_passes_through() {
        let config = ZoomConfig {
            maximum_scale: 3.5,
            ..ZoomConfig::default()
        };
        assert_eq!(maximum_zoom_scale(&config), 3.5);
    }
}
