use egui::{self, Color32, ColorImage, CornerRadius, Rect, Sense, TextureHandle, Vec2};
use std::sync::Arc;

use crate::indicator::SpinnerIndicator;
use crate::item::ZoomableImageItem;
use crate::lifecycle::LoadState;

/// Paints a [`ZoomableImageItem`] and feeds it egui input.
pub struct ItemView {
    texture: Option<(usize, TextureHandle)>,
    long_press_secs: f64,
    press_started: Option<f64>,
    long_press_fired: bool,
    status: Option<String>,
}

impl ItemView {
    pub fn new(long_press_secs: f32) -> Self {
        Self {
            texture: None,
            long_press_secs: long_press_secs as f64,
            press_started: None,
            long_press_fired: false,
            status: None,
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn show(&mut self, ui: &mut egui::Ui, item: &mut ZoomableImageItem) {
        let available = ui.available_size();
        let (rect, response) = ui.allocate_exact_size(available, Sense::click_and_drag());

        item.layout(rect);
        self.handle_input(ui, &response, item);

        let dt = ui.input(|i| i.stable_dt);
        if item.tick(dt) {
            ui.ctx().request_repaint();
        }

        self.sync_texture(ui.ctx(), item);
        let painter = ui.painter_at(rect);

        if let Some((_, tex)) = &self.texture {
            painter.image(
                tex.id(),
                item.content_rect(),
                Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE.gamma_multiply(item.content_opacity()),
            );
        }

        if let Some(indicator) = item.indicator().filter(|i| i.is_visible()) {
            let time = ui.input(|i| i.time);
            painter.text(
                indicator.center(),
                egui::Align2::CENTER_CENTER,
                SpinnerIndicator::frame_glyph(time),
                egui::FontId::proportional(28.0),
                Color32::from_rgb(220, 220, 220),
            );
            ui.ctx().request_repaint();
        }

        if item.load_state() == LoadState::Failed {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Failed to load image\nTap to retry",
                egui::FontId::proportional(18.0),
                Color32::from_rgb(255, 100, 100),
            );
        }

        if let Some(status) = &self.status {
            let status_rect = Rect::from_min_size(
                rect.left_bottom() + Vec2::new(10.0, -40.0),
                Vec2::new(rect.width().min(420.0) - 20.0, 30.0),
            );
            painter.rect_filled(
                status_rect,
                CornerRadius::same(6),
                Color32::from_rgba_unmultiplied(0, 0, 0, 180),
            );
            painter.text(
                status_rect.center(),
                egui::Align2::CENTER_CENTER,
                status,
                egui::FontId::proportional(12.0),
                Color32::from_rgb(200, 200, 200),
            );
        }
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        item: &mut ZoomableImageItem,
    ) {
        if response.double_clicked() {
            item.double_tap();
        } else if response.clicked() {
            item.single_tap();
        }

        if response.dragged() {
            item.pan(response.drag_delta());
        }

        // Pinch, or ctrl + scroll
        if response.hovered() {
            let zoom_delta = ui.input(|i| i.zoom_delta());
            if zoom_delta != 1.0 {
                let focus = response.hover_pos().unwrap_or(response.rect.center());
                item.pinch(zoom_delta, focus);
            }
        }

        let now = ui.input(|i| i.time);
        if response.is_pointer_button_down_on() && response.drag_delta() == Vec2::ZERO {
            let started = *self.press_started.get_or_insert(now);
            if !self.long_press_fired && now - started >= self.long_press_secs {
                self.long_press_fired = true;
                if item.long_press() {
                    self.set_status("Saving image...");
                }
            }
            ui.ctx().request_repaint();
        } else {
            self.press_started = None;
            self.long_press_fired = false;
        }
    }

    /// Re-uploads the texture when the displayed image changes.
    fn sync_texture(&mut self, ctx: &egui::Context, item: &ZoomableImageItem) {
        let Some(image) = item.image() else {
            self.texture = None;
            return;
        };
        let key = Arc::as_ptr(image) as usize;
        if matches!(&self.texture, Some((current, _)) if *current == key) {
            return;
        }

        let size = [image.width() as usize, image.height() as usize];
        let rgba = image.to_rgba8();
        let pixels = rgba.as_flat_samples();
        let texture = ctx.load_texture(
            format!("slideshow_item_{}", key),
            ColorImage::from_rgba_unmultiplied(size, pixels.as_slice()),
            egui::TextureOptions::LINEAR,
        );
        self.texture = Some((key, texture));
    }
}
