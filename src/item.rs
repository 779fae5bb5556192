//! A single zoomable slideshow item.
//!
//! Ties the fit-to-viewport geometry and the load lifecycle to a
//! [`Viewport`]. Everything here runs on the UI thread; async results are
//! only picked up in [`ZoomableImageItem::poll`].

use egui::{Pos2, Rect, Vec2};
use image::DynamicImage;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use crate::errors::ItemError;
use crate::export::{ExportCompletion, ExportOutcome, ImageExporter};
use crate::geometry::{self, ContentMode, Insets};
use crate::indicator::ActivityIndicator;
use crate::lifecycle::{LoadEvent, LoadLifecycle, LoadState};
use crate::settings::{ItemSettings, ZoomConfig};
use crate::source::{InputSource, LoadTarget};
use crate::viewport::{Gesture, ScrollViewport, Viewport, ZOOM_EPSILON};

/// How long the save acknowledgment takes to fade out, in seconds.
const EXPORT_FLASH_SECS: f32 = 0.5;

/// Viewport hooks the item answers, in the manner of a scroll view delegate.
pub trait ZoomDelegate {
    /// The view that zooms, or `None` when zooming is disabled.
    fn zoom_target(&self) -> Option<LoadTarget>;
    /// Called after every change of the shown zoom scale.
    fn on_zoom_changed(&mut self);
}

/// Which gestures currently respond, derived from the load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureState {
    pub double_tap: bool,
    pub retry: bool,
}

impl GestureState {
    fn for_state(state: LoadState) -> Self {
        let failed = state == LoadState::Failed;
        Self {
            double_tap: !failed,
            retry: failed,
        }
    }
}

#[derive(Debug)]
pub enum ItemEvent {
    Load(LoadEvent),
    Export(ExportOutcome),
}

pub struct ZoomableImageItem<V: Viewport = ScrollViewport> {
    lifecycle: LoadLifecycle,
    config: ZoomConfig,
    content_mode: ContentMode,
    viewport: V,

    /// Content size at zoom scale 1
    fitted_size: Vec2,
    last_frame: Rect,

    exporter: Option<Arc<dyn ImageExporter>>,
    export_tx: Sender<ExportOutcome>,
    export_rx: Receiver<ExportOutcome>,
    repaint: Option<egui::Context>,
    flash: f32,
}

impl ZoomableImageItem<ScrollViewport> {
    pub fn new(
        source: Arc<dyn InputSource>,
        settings: &ItemSettings,
        viewport_size: Vec2,
        indicator: Option<Box<dyn ActivityIndicator>>,
    ) -> Self {
        let viewport = ScrollViewport::with_settings(viewport_size, settings);
        Self::with_viewport(source, settings, viewport, indicator)
    }
}

impl<V: Viewport> ZoomableImageItem<V> {
    pub fn with_viewport(
        source: Arc<dyn InputSource>,
        settings: &ItemSettings,
        viewport: V,
        indicator: Option<Box<dyn ActivityIndicator>>,
    ) -> Self {
        let config = settings.zoom.sanitized();
        let (export_tx, export_rx) = channel();
        let mut item = Self {
            lifecycle: LoadLifecycle::new(source, indicator),
            config,
            content_mode: settings.content_mode,
            fitted_size: viewport.frame().size(),
            viewport,
            last_frame: Rect::ZERO,
            exporter: None,
            export_tx,
            export_rx,
            repaint: None,
            flash: 0.0,
        };

        item.viewport
            .set_zoom_bounds(config.minimum_scale, geometry::maximum_zoom_scale(&config));
        item.viewport.attach_gesture(Gesture::DoubleTap);
        item.viewport.attach_gesture(Gesture::SingleTap);
        item.apply_centering();
        item.sync_gestures();
        item
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn ImageExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Async completions will request a repaint of `ctx`.
    pub fn set_repaint_context(&mut self, ctx: egui::Context) {
        self.lifecycle.set_repaint_context(ctx.clone());
        self.repaint = Some(ctx);
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    pub fn load_state(&self) -> LoadState {
        self.lifecycle.state()
    }

    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        self.lifecycle.image()
    }

    pub fn indicator(&self) -> Option<&dyn ActivityIndicator> {
        self.lifecycle.indicator()
    }

    pub fn fitted_size(&self) -> Vec2 {
        self.fitted_size
    }

    pub fn content_rect(&self) -> Rect {
        self.viewport.content_rect()
    }

    /// Opacity multiplier for the save acknowledgment (1 = fully visible).
    pub fn content_opacity(&self) -> f32 {
        1.0 - self.flash
    }

    pub fn gestures(&self) -> GestureState {
        GestureState::for_state(self.lifecycle.state())
    }

    pub fn is_zoomed(&self) -> bool {
        let (minimum, _) = self.viewport.zoom_bounds();
        (self.viewport.target_zoom_scale() - minimum).abs() > ZOOM_EPSILON
    }

    // Load lifecycle

    pub fn load_image(&mut self) -> bool {
        let started = self.lifecycle.request_load();
        self.sync_gestures();
        started
    }

    pub fn release_image(&mut self) {
        self.lifecycle.release();
        self.relayout();
    }

    pub fn cancel_pending_load(&self) {
        self.lifecycle.cancel_pending_load();
    }

    /// Applies async results. Call once per frame on the UI thread.
    pub fn poll(&mut self) -> Vec<ItemEvent> {
        let mut events: Vec<ItemEvent> = self
            .lifecycle
            .poll()
            .into_iter()
            .map(ItemEvent::Load)
            .collect();
        if !events.is_empty() {
            self.sync_gestures();
            self.relayout();
        }

        while let Ok(outcome) = self.export_rx.try_recv() {
            match &outcome {
                ExportOutcome::Saved(path) => {
                    log::info!("Saved image to {}", path.display());
                    self.flash = 1.0;
                }
                ExportOutcome::Failed(e) => e.log(),
            }
            events.push(ItemEvent::Export(outcome));
        }
        events
    }

    // Gestures

    /// Toggles between the minimum and maximum zoom scale, animated.
    pub fn double_tap(&mut self) -> bool {
        if !self.gestures().double_tap {
            return false;
        }
        let (minimum, maximum) = self.viewport.zoom_bounds();
        let scale = if self.is_zoomed() { minimum } else { maximum };
        self.set_zoom(scale, true)
    }

    /// Retries a failed load; ignored otherwise.
    pub fn single_tap(&mut self) -> bool {
        if !self.gestures().retry {
            return false;
        }
        let started = self.lifecycle.retry();
        self.sync_gestures();
        started
    }

    /// Hands the displayed image to the exporter.
    pub fn long_press(&mut self) -> bool {
        if !self.viewport.gesture(Gesture::LongPress).is_active() {
            return false;
        }
        let (Some(exporter), Some(image)) = (self.exporter.as_ref(), self.lifecycle.image())
        else {
            return false;
        };
        let completion = ExportCompletion::new(self.export_tx.clone(), self.repaint.clone());
        exporter.persist(Arc::clone(image), completion);
        true
    }

    /// Pinch zoom by `factor` around `focus`.
    pub fn pinch(&mut self, factor: f32, focus: Pos2) -> bool {
        if self.zoom_target().is_none() || !(factor > 0.0) {
            return false;
        }
        let zoom = self.viewport.zoom_scale();
        let anchor = (focus - self.viewport.content_rect().min) / zoom;
        self.viewport.set_zoom_scale(zoom * factor, false);
        // Re-centering moves the insets, so anchor the focus afterwards
        self.dispatch_zoom_changed();
        self.viewport.scroll_point_to(anchor, focus);
        true
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.viewport.pan(delta);
    }

    pub fn zoom_out(&mut self) {
        let (minimum, _) = self.viewport.zoom_bounds();
        self.set_zoom(minimum, false);
    }

    /// Advances animations. Returns whether another frame is needed.
    pub fn tick(&mut self, dt: f32) -> bool {
        let zooming = self.viewport.tick(dt);
        self.dispatch_zoom_changed();

        if self.flash > 0.0 {
            self.flash = (self.flash - dt / EXPORT_FLASH_SECS).max(0.0);
        }
        zooming || self.flash > 0.0
    }

    // Layout

    /// Reacts to a size or bounds change of the viewport.
    pub fn layout(&mut self, frame: Rect) {
        let _span = tracing::trace_span!("layout", w = frame.width(), h = frame.height()).entered();
        self.viewport.set_frame(frame);
        let viewport_size = frame.size();

        if !self.config.zoom_enabled {
            self.fitted_size = viewport_size;
        } else if !self.is_zoomed() {
            let image_size = self
                .lifecycle
                .image()
                .map(|image| Vec2::new(image.width() as f32, image.height() as f32));
            self.fitted_size = geometry::fitted_size(viewport_size, image_size, self.content_mode);
        }

        if geometry::is_fully_filling(self.scaled_content_size(), viewport_size) {
            self.viewport.set_content_insets(Insets::ZERO);
        } else {
            self.viewport.attach_gesture(Gesture::LongPress);
            self.apply_centering();
        }

        self.viewport.set_content_size(self.fitted_size);
        let center = self.viewport.content_rect().center();
        if let Some(indicator) = self.lifecycle.indicator_mut() {
            indicator.set_center(center);
        }

        if self.last_frame != frame && self.config.zoom_in_initially {
            let (_, maximum) = self.viewport.zoom_bounds();
            self.set_zoom(maximum, false);
        }

        self.last_frame = frame;
        self.viewport.set_zoom_bounds(
            self.config.minimum_scale,
            geometry::maximum_zoom_scale(&self.config),
        );
        self.dispatch_zoom_changed();
    }

    fn relayout(&mut self) {
        let frame = self.viewport.frame();
        self.layout(frame);
    }

    fn scaled_content_size(&self) -> Vec2 {
        self.fitted_size * self.viewport.zoom_scale()
    }

    fn apply_centering(&mut self) {
        let insets = geometry::centering_inset(self.viewport.frame().size(), self.scaled_content_size());
        self.viewport.set_content_insets(insets);
    }

    fn set_zoom(&mut self, scale: f32, animated: bool) -> bool {
        if self.zoom_target().is_none() {
            return false;
        }
        self.viewport.set_zoom_scale(scale, animated);
        self.dispatch_zoom_changed();
        true
    }

    fn dispatch_zoom_changed(&mut self) {
        if self.viewport.take_zoom_changed() {
            self.on_zoom_changed();
        }
    }

    fn sync_gestures(&mut self) {
        let gestures = self.gestures();
        self.viewport
            .set_gesture_enabled(Gesture::DoubleTap, gestures.double_tap);
        self.viewport
            .set_gesture_enabled(Gesture::SingleTap, gestures.retry);
    }
}

impl<V: Viewport> ZoomDelegate for ZoomableImageItem<V> {
    fn zoom_target(&self) -> Option<LoadTarget> {
        self.config.zoom_enabled.then(|| self.lifecycle.target())
    }

    fn on_zoom_changed(&mut self) {
        self.apply_centering();
    }
}

impl<V: Viewport> std::fmt::Debug for ZoomableImageItem<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoomableImageItem")
            .field("target", &self.lifecycle.target())
            .field("state", &self.lifecycle.state())
            .field("fitted_size", &self.fitted_size)
            .field("zoom", &self.viewport.zoom_scale())
            .finish()
    }
}

/// Failures worth showing to the user, if any.
pub fn failure_of(event: &ItemEvent) -> Option<&ItemError> {
    match event {
        ItemEvent::Load(LoadEvent::Failed(e)) => Some(e),
        ItemEvent::Export(ExportOutcome::Failed(e)) => Some(e),
        _ => None,
    }
}
