//! Scrollable, zoomable container the item lays its content out in.
//!
//! [`Viewport`] is what the item needs from a platform scroll view.
//! [`ScrollViewport`] is the headless implementation used by the egui view
//! and by tests.

use egui::{Pos2, Rect, Vec2};

use crate::geometry::Insets;
use crate::settings::{ItemSettings, MINIMUM_SCALE};

/// Zoom levels closer than this are considered equal.
pub const ZOOM_EPSILON: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    DoubleTap,
    SingleTap,
    LongPress,
}

impl Gesture {
    fn index(self) -> usize {
        match self {
            Gesture::DoubleTap => 0,
            Gesture::SingleTap => 1,
            Gesture::LongPress => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureBinding {
    pub attached: bool,
    pub enabled: bool,
}

impl GestureBinding {
    pub fn is_active(&self) -> bool {
        self.attached && self.enabled
    }
}

pub trait Viewport {
    fn frame(&self) -> Rect;
    fn set_frame(&mut self, frame: Rect);

    fn content_size(&self) -> Vec2;
    fn set_content_size(&mut self, size: Vec2);

    fn content_insets(&self) -> Insets;
    fn set_content_insets(&mut self, insets: Insets);

    /// Scale currently shown, which may lag the target while animating.
    fn zoom_scale(&self) -> f32;
    /// Scale the viewport is settling on.
    fn target_zoom_scale(&self) -> f32;
    fn set_zoom_scale(&mut self, scale: f32, animated: bool);
    fn zoom_bounds(&self) -> (f32, f32);
    fn set_zoom_bounds(&mut self, minimum: f32, maximum: f32);

    /// Returns true once after each change of the shown zoom scale.
    fn take_zoom_changed(&mut self) -> bool;

    /// Screen rect of the zoomed content view.
    fn content_rect(&self) -> Rect;

    /// Drags the content; the offset moves against the finger.
    fn pan(&mut self, _delta: Vec2) {}

    /// Scrolls so `point`, in unzoomed content coordinates, sits under `focus`
    /// as far as the scrollable range allows.
    fn scroll_point_to(&mut self, _point: Vec2, _focus: Pos2) {}

    /// Advances an animated zoom. Returns whether the shown scale changed.
    fn tick(&mut self, _dt: f32) -> bool {
        false
    }

    fn attach_gesture(&mut self, gesture: Gesture);
    fn gesture(&self, gesture: Gesture) -> GestureBinding;
    fn set_gesture_enabled(&mut self, gesture: Gesture, enabled: bool);
}

#[derive(Debug, Clone)]
pub struct ScrollViewport {
    frame: Rect,
    content_size: Vec2,
    insets: Insets,
    offset: Vec2,

    zoom: f32,
    target_zoom: f32,
    minimum_zoom: f32,
    maximum_zoom: f32,
    zoom_changed: bool,

    smooth_zoom: bool,
    zoom_animation_speed: f32,

    gestures: [GestureBinding; 3],
}

impl ScrollViewport {
    pub fn new(size: Vec2) -> Self {
        Self {
            frame: Rect::from_min_size(Pos2::ZERO, size),
            content_size: size,
            insets: Insets::ZERO,
            offset: Vec2::ZERO,
            zoom: MINIMUM_SCALE,
            target_zoom: MINIMUM_SCALE,
            minimum_zoom: MINIMUM_SCALE,
            maximum_zoom: MINIMUM_SCALE,
            zoom_changed: false,
            smooth_zoom: true,
            zoom_animation_speed: 8.0,
            gestures: [GestureBinding::default(); 3],
        }
    }

    pub fn with_settings(size: Vec2, settings: &ItemSettings) -> Self {
        Self {
            smooth_zoom: settings.smooth_zoom,
            zoom_animation_speed: settings.zoom_animation_speed,
            ..Self::new(size)
        }
    }

    pub fn content_offset(&self) -> Vec2 {
        self.offset
    }

    pub fn is_animating(&self) -> bool {
        (self.zoom - self.target_zoom).abs() > 0.0
    }

    /// Largest content offset on each axis.
    pub fn max_offset(&self) -> Vec2 {
        let scaled = self.content_size * self.zoom;
        let extent = Vec2::new(
            scaled.x + self.insets.left + self.insets.right,
            scaled.y + self.insets.top + self.insets.bottom,
        );
        (extent - self.frame.size()).max(Vec2::ZERO)
    }

    fn clamp_scale(&self, scale: f32) -> f32 {
        if scale.is_finite() {
            scale.clamp(self.minimum_zoom, self.maximum_zoom)
        } else {
            self.minimum_zoom
        }
    }

    fn clamp_offset(&mut self) {
        self.offset = self.offset.clamp(Vec2::ZERO, self.max_offset());
    }

    fn show_zoom(&mut self, scale: f32) {
        if self.zoom != scale {
            self.zoom = scale;
            self.zoom_changed = true;
        }
        self.clamp_offset();
    }
}

impl Viewport for ScrollViewport {
    fn frame(&self) -> Rect {
        self.frame
    }

    fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
        self.clamp_offset();
    }

    fn content_size(&self) -> Vec2 {
        self.content_size
    }

    fn set_content_size(&mut self, size: Vec2) {
        self.content_size = size;
        self.clamp_offset();
    }

    fn content_insets(&self) -> Insets {
        self.insets
    }

    fn set_content_insets(&mut self, insets: Insets) {
        self.insets = insets;
        self.clamp_offset();
    }

    fn zoom_scale(&self) -> f32 {
        self.zoom
    }

    fn target_zoom_scale(&self) -> f32 {
        self.target_zoom
    }

    fn set_zoom_scale(&mut self, scale: f32, animated: bool) {
        let scale = self.clamp_scale(scale);
        self.target_zoom = scale;
        if !animated || !self.smooth_zoom {
            self.show_zoom(scale);
        }
    }

    fn zoom_bounds(&self) -> (f32, f32) {
        (self.minimum_zoom, self.maximum_zoom)
    }

    fn set_zoom_bounds(&mut self, minimum: f32, maximum: f32) {
        self.minimum_zoom = minimum;
        self.maximum_zoom = maximum.max(minimum);
        self.target_zoom = self.clamp_scale(self.target_zoom);
        let shown = self.clamp_scale(self.zoom);
        self.show_zoom(shown);
    }

    fn take_zoom_changed(&mut self) -> bool {
        std::mem::take(&mut self.zoom_changed)
    }

    fn content_rect(&self) -> Rect {
        Rect::from_min_size(
            self.frame.min + self.insets.left_top() - self.offset,
            self.content_size * self.zoom,
        )
    }

    fn pan(&mut self, delta: Vec2) {
        self.offset -= delta;
        self.clamp_offset();
    }

    fn scroll_point_to(&mut self, point: Vec2, focus: Pos2) {
        self.offset = (self.frame.min + self.insets.left_top() + point * self.zoom) - focus;
        self.clamp_offset();
    }

    fn tick(&mut self, dt: f32) -> bool {
        if !self.is_animating() {
            return false;
        }
        let diff = self.target_zoom - self.zoom;
        if diff.abs() > ZOOM_EPSILON {
            self.zoom += diff * (self.zoom_animation_speed * dt).clamp(0.0, 1.0);
        } else {
            self.zoom = self.target_zoom;
        }
        self.zoom_changed = true;
        self.clamp_offset();
        true
    }

    fn attach_gesture(&mut self, gesture: Gesture) {
        let binding = &mut self.gestures[gesture.index()];
        if !binding.attached {
            binding.attached = true;
            binding.enabled = true;
        }
    }

    fn gesture(&self, gesture: Gesture) -> GestureBinding {
        self.gestures[gesture.index()]
    }

    fn set_gesture_enabled(&mut self, gesture: Gesture, enabled: bool) {
        self.gestures[gesture.index()].enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> ScrollViewport {
        let mut vp = ScrollViewport::new(Vec2::new(300.0, 600.0));
        vp.set_zoom_bounds(1.0, 2.0);
        vp
    }

    #[test]
    fn zoom_is_clamped_to_bounds() {
        let mut vp = viewport();
        vp.set_zoom_scale(5.0, false);
        assert_eq!(vp.zoom_scale(), 2.0);
        vp.set_zoom_scale(0.1, false);
        assert_eq!(vp.zoom_scale(), 1.0);
        vp.set_zoom_scale(f32::NAN, false);
        assert_eq!(vp.zoom_scale(), 1.0);
    }

    #[test]
    fn animated_zoom_settles_on_target() {
        let mut vp = viewport();
        vp.set_zoom_scale(2.0, true);
        assert_eq!(vp.zoom_scale(), 1.0);
        assert_eq!(vp.target_zoom_scale(), 2.0);
        assert!(!vp.take_zoom_changed());

        let mut steps = 0;
        while vp.tick(1.0 / 60.0) {
            steps += 1;
            assert!(steps < 1000, "animation never settled");
        }
        assert_eq!(vp.zoom_scale(), 2.0);
        assert!(vp.take_zoom_changed());
        assert!(!vp.take_zoom_changed());
    }

    #[test]
    fn instant_zoom_without_smoothing() {
        let mut settings = ItemSettings::default();
        settings.smooth_zoom = false;
        let mut vp = ScrollViewport::with_settings(Vec2::new(100.0, 100.0), &settings);
        vp.set_zoom_bounds(1.0, 3.0);
        vp.set_zoom_scale(3.0, true);
        assert_eq!(vp.zoom_scale(), 3.0);
        assert!(!vp.tick(0.016));
    }

    #[test]
    fn pan_stays_within_scrollable_range() {
        let mut vp = viewport();
        vp.set_content_size(Vec2::new(300.0, 600.0));
        vp.set_zoom_scale(2.0, false);
        assert_eq!(vp.max_offset(), Vec2::new(300.0, 600.0));

        vp.pan(Vec2::new(-100.0, -50.0));
        assert_eq!(vp.content_offset(), Vec2::new(100.0, 50.0));
        vp.pan(Vec2::new(-1000.0, 1000.0));
        assert_eq!(vp.content_offset(), Vec2::new(300.0, 0.0));

        // Zooming back out leaves nothing to scroll
        vp.set_zoom_scale(1.0, false);
        assert_eq!(vp.content_offset(), Vec2::ZERO);
    }

    #[test]
    fn scroll_point_to_keeps_center() {
        let mut vp = viewport();
        vp.set_content_size(Vec2::new(300.0, 600.0));
        vp.set_zoom_scale(2.0, false);
        vp.scroll_point_to(Vec2::new(150.0, 300.0), Pos2::new(150.0, 300.0));
        assert_eq!(vp.content_offset(), Vec2::new(150.0, 300.0));
        assert_eq!(vp.content_rect().center(), Pos2::new(150.0, 300.0));
    }

    #[test]
    fn scroll_point_to_respects_insets_and_range() {
        let mut vp = viewport();
        vp.set_content_size(Vec2::new(300.0, 150.0));
        vp.set_content_insets(Insets::symmetric(0.0, 225.0));
        // Nothing to scroll vertically; horizontally the range is empty too
        vp.scroll_point_to(Vec2::new(10.0, 10.0), Pos2::new(0.0, 0.0));
        assert_eq!(vp.content_offset(), Vec2::ZERO);

        vp.set_zoom_scale(2.0, false);
        vp.set_content_insets(Insets::symmetric(0.0, 150.0));
        vp.scroll_point_to(Vec2::new(100.0, 75.0), Pos2::new(50.0, 300.0));
        assert_eq!(vp.content_offset(), Vec2::new(150.0, 0.0));
    }

    #[test]
    fn gestures_attach_once_and_toggle() {
        let mut vp = viewport();
        assert!(!vp.gesture(Gesture::LongPress).is_active());
        vp.attach_gesture(Gesture::LongPress);
        vp.set_gesture_enabled(Gesture::LongPress, false);
        vp.attach_gesture(Gesture::LongPress);
        assert!(vp.gesture(Gesture::LongPress).attached);
        assert!(!vp.gesture(Gesture::LongPress).enabled);
    }
}
