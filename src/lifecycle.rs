//! Load / release / retry state machine for a single item's image.

use image::DynamicImage;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use crate::errors::ItemError;
use crate::indicator::ActivityIndicator;
use crate::source::{InputSource, LoadCompletion, LoadMessage, LoadOutcome, LoadTarget};

/// Upper bound on completions applied per poll, mirroring per-frame message limits.
const MAX_MESSAGES_PER_POLL: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// What happened when a completion was applied.
#[derive(Debug)]
pub enum LoadEvent {
    Loaded,
    Failed(ItemError),
    /// A release was requested mid-flight; the result was dropped.
    Discarded(ItemError),
}

pub struct LoadLifecycle {
    source: Arc<dyn InputSource>,
    target: LoadTarget,
    state: LoadState,
    release_requested: bool,
    generation: u64,
    image: Option<Arc<DynamicImage>>,
    indicator: Option<Box<dyn ActivityIndicator>>,

    tx: Sender<LoadMessage>,
    rx: Receiver<LoadMessage>,
    repaint: Option<egui::Context>,
}

impl LoadLifecycle {
    pub fn new(source: Arc<dyn InputSource>, indicator: Option<Box<dyn ActivityIndicator>>) -> Self {
        let (tx, rx) = channel();
        Self {
            source,
            target: LoadTarget::next(),
            state: LoadState::Idle,
            release_requested: false,
            generation: 0,
            image: None,
            indicator,
            tx,
            rx,
            repaint: None,
        }
    }

    /// Completions will wake this context after posting their result.
    pub fn set_repaint_context(&mut self, ctx: egui::Context) {
        self.repaint = Some(ctx);
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn target(&self) -> LoadTarget {
        self.target
    }

    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        self.image.as_ref()
    }

    pub fn is_release_requested(&self) -> bool {
        self.release_requested
    }

    pub fn retry_enabled(&self) -> bool {
        self.state == LoadState::Failed
    }

    pub fn indicator(&self) -> Option<&dyn ActivityIndicator> {
        self.indicator.as_deref()
    }

    pub fn indicator_mut(&mut self) -> Option<&mut (dyn ActivityIndicator + 'static)> {
        self.indicator.as_deref_mut()
    }

    /// Starts a load unless an image is displayed or one is already in flight.
    ///
    /// Returns whether the source was asked to load.
    pub fn request_load(&mut self) -> bool {
        if self.image.is_some() || self.state == LoadState::Loading {
            return false;
        }

        self.release_requested = false;
        self.generation += 1;
        self.transition(LoadState::Loading);
        if let Some(indicator) = self.indicator.as_mut() {
            indicator.show();
        }

        let completion = LoadCompletion::new(
            self.target,
            self.generation,
            self.tx.clone(),
            self.repaint.clone(),
        );
        self.source.load(self.target, completion);
        true
    }

    /// Drops the displayed image and makes any in-flight result stale.
    pub fn release(&mut self) {
        self.release_requested = true;
        self.cancel_pending_load();
        self.image = None;
        log::debug!("{} released (state {:?})", self.target, self.state);
    }

    /// Forwards cancellation to the source without touching the release flag.
    pub fn cancel_pending_load(&self) {
        self.source.cancel_load(self.target);
    }

    /// Re-attempts a failed load. No-op unless the last load failed.
    pub fn retry(&mut self) -> bool {
        if !self.retry_enabled() {
            log::debug!("{} retry ignored in state {:?}", self.target, self.state);
            return false;
        }
        self.request_load()
    }

    /// Applies completions posted since the last call. Must run on the UI thread.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        for _ in 0..MAX_MESSAGES_PER_POLL {
            match self.rx.try_recv() {
                Ok(msg) => {
                    if let Some(event) = self.apply(msg) {
                        events.push(event);
                    }
                }
                Err(_) => break,
            }
        }
        events
    }

    fn apply(&mut self, msg: LoadMessage) -> Option<LoadEvent> {
        if msg.target != self.target
            || msg.generation != self.generation
            || self.state != LoadState::Loading
        {
            log::trace!(
                "{} ignoring completion for generation {} (current {}, {:?})",
                self.target,
                msg.generation,
                self.generation,
                self.state
            );
            return None;
        }

        if let Some(indicator) = self.indicator.as_mut() {
            indicator.hide();
        }

        // A released slot never resolves to Failed, whatever the source reported
        let (event, next) = if self.release_requested {
            self.image = None;
            let discard = ItemError::CancelledDiscard { target: self.target };
            discard.log();
            (LoadEvent::Discarded(discard), LoadState::Loaded)
        } else {
            match msg.outcome {
                LoadOutcome::Image(image) => {
                    self.image = Some(image);
                    (LoadEvent::Loaded, LoadState::Loaded)
                }
                LoadOutcome::Empty(message) => (self.load_failed(message), LoadState::Failed),
                LoadOutcome::Cancelled => {
                    (self.load_failed("load cancelled".to_string()), LoadState::Failed)
                }
            }
        };

        // The slot is no longer in flight, whether or not the result was kept
        self.transition(next);
        Some(event)
    }

    fn load_failed(&mut self, message: String) -> LoadEvent {
        self.image = None;
        let error = ItemError::LoadFailed {
            target: self.target,
            message,
        };
        error.log();
        LoadEvent::Failed(error)
    }

    fn transition(&mut self, next: LoadState) {
        tracing::debug!(target_id = self.target.id(), from = ?self.state, to = ?next, "load state");
        self.state = next;
    }
}

impl Drop for LoadLifecycle {
    fn drop(&mut self) {
        if self.state == LoadState::Loading {
            self.cancel_pending_load();
        }
    }
}
