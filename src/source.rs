//! Image sources feeding a slideshow item.
//!
//! A source is shared and never mutated by the item. It receives a
//! [`LoadCompletion`] which may be invoked from any thread; the completion
//! only posts a message, and the owning item applies it on the UI thread.

use image::DynamicImage;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;

/// Identity of the slot an image is loaded into. Stable for the item's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTarget(u64);

static NEXT_TARGET: AtomicU64 = AtomicU64::new(1);

impl LoadTarget {
    pub fn next() -> Self {
        Self(NEXT_TARGET.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item #{}", self.0)
    }
}

/// What a source produced for one load.
#[derive(Debug)]
pub(crate) enum LoadOutcome {
    Image(Arc<DynamicImage>),
    /// No image; carries the reason.
    Empty(String),
    /// The source honoured a `cancel_load` and produced nothing.
    Cancelled,
}

/// Outcome of one load, as posted back to the owning item.
pub(crate) struct LoadMessage {
    pub target: LoadTarget,
    pub generation: u64,
    pub outcome: LoadOutcome,
}

/// One-shot completion handed to [`InputSource::load`].
///
/// Holds no reference to the item itself: if the item is gone by the time
/// the load finishes, the message is simply not delivered. Dropping a
/// completion without calling it reports an empty result, so the item never
/// stays stuck in the loading state.
pub struct LoadCompletion {
    target: LoadTarget,
    generation: u64,
    tx: Option<Sender<LoadMessage>>,
    repaint: Option<egui::Context>,
}

impl LoadCompletion {
    pub(crate) fn new(
        target: LoadTarget,
        generation: u64,
        tx: Sender<LoadMessage>,
        repaint: Option<egui::Context>,
    ) -> Self {
        Self {
            target,
            generation,
            tx: Some(tx),
            repaint,
        }
    }

    pub fn target(&self) -> LoadTarget {
        self.target
    }

    /// Delivers the image, or `None` when the source produced nothing.
    pub fn complete(mut self, image: Option<Arc<DynamicImage>>) {
        let outcome = match image {
            Some(image) => LoadOutcome::Image(image),
            None => LoadOutcome::Empty("source returned no image".to_string()),
        };
        self.post(outcome);
    }

    pub fn succeed(mut self, image: DynamicImage) {
        self.post(LoadOutcome::Image(Arc::new(image)));
    }

    pub fn fail(mut self, message: impl Into<String>) {
        self.post(LoadOutcome::Empty(message.into()));
    }

    /// Reports that the load stopped because it was cancelled.
    pub fn cancelled(mut self) {
        self.post(LoadOutcome::Cancelled);
    }

    fn post(&mut self, outcome: LoadOutcome) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let message = LoadMessage {
            target: self.target,
            generation: self.generation,
            outcome,
        };
        if tx.send(message).is_err() {
            log::trace!("{} was dropped before its load finished", self.target);
            return;
        }
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }
}

impl Drop for LoadCompletion {
    fn drop(&mut self) {
        if self.tx.is_some() {
            self.post(LoadOutcome::Empty("load abandoned by source".to_string()));
        }
    }
}

/// Something that can produce an image asynchronously.
pub trait InputSource: Send + Sync {
    /// Starts loading for `target`; `completion` must eventually be called or dropped.
    fn load(&self, target: LoadTarget, completion: LoadCompletion);

    /// Best-effort cancellation. Sources without cancellation keep the default no-op.
    fn cancel_load(&self, _target: LoadTarget) {}
}

/// An already-decoded image. Completes synchronously inside `load`.
pub struct MemorySource {
    image: Option<Arc<DynamicImage>>,
}

impl MemorySource {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Some(Arc::new(image)),
        }
    }

    /// A source that always yields an empty result.
    pub fn empty() -> Self {
        Self { image: None }
    }
}

impl InputSource for MemorySource {
    fn load(&self, _target: LoadTarget, completion: LoadCompletion) {
        completion.complete(self.image.clone());
    }
}

/// Decodes an image file on a background thread.
///
/// Tracks loads in flight so `cancel_load` can mark them; the mark is
/// checked before decoding and again before posting, and the entry is gone
/// once the loader thread finishes.
pub struct FileSource {
    path: PathBuf,
    in_flight: Arc<Mutex<HashMap<LoadTarget, bool>>>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn is_cancelled(in_flight: &Mutex<HashMap<LoadTarget, bool>>, target: LoadTarget) -> bool {
        in_flight
            .lock()
            .map(|loads| loads.get(&target).copied().unwrap_or(false))
            .unwrap_or(false)
    }

    /// Forgets `target`, returning whether it was cancelled meanwhile.
    fn finish(in_flight: &Mutex<HashMap<LoadTarget, bool>>, target: LoadTarget) -> bool {
        in_flight
            .lock()
            .map(|mut loads| loads.remove(&target).unwrap_or(false))
            .unwrap_or(false)
    }

    fn decode(
        path: &Path,
        target: LoadTarget,
        in_flight: &Mutex<HashMap<LoadTarget, bool>>,
        completion: LoadCompletion,
    ) {
        if Self::is_cancelled(in_flight, target) {
            Self::finish(in_flight, target);
            completion.cancelled();
            return;
        }

        let decoded = {
            let _span = tracing::debug_span!("decode", path = %path.display()).entered();
            image::open(path)
        };

        if Self::finish(in_flight, target) {
            log::debug!("{} cancelled during decode of {}", target, path.display());
            completion.cancelled();
            return;
        }
        match decoded {
            Ok(image) => completion.succeed(image),
            Err(e) => completion.fail(format!("{}: {}", path.display(), e)),
        }
    }

    #[cfg(test)]
    fn in_flight_count(&self) -> usize {
        self.in_flight.lock().map(|loads| loads.len()).unwrap_or(0)
    }
}

impl InputSource for FileSource {
    fn load(&self, target: LoadTarget, completion: LoadCompletion) {
        if let Ok(mut loads) = self.in_flight.lock() {
            loads.insert(target, false);
        }

        let path = self.path.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let spawned = thread::Builder::new()
            .name(format!("image-loader-{}", target.id()))
            .spawn(move || Self::decode(&path, target, &in_flight, completion));

        // The completion moved into the closure is dropped with it, which reports failure
        if let Err(e) = spawned {
            Self::finish(&self.in_flight, target);
            log::error!("Failed to spawn loader thread for {}: {}", target, e);
        }
    }

    fn cancel_load(&self, target: LoadTarget) {
        // Only loads still in flight are marked
        if let Ok(mut loads) = self.in_flight.lock() {
            if let Some(cancelled) = loads.get_mut(&target) {
                *cancelled = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    #[test]
    fn targets_are_unique() {
        let a = LoadTarget::next();
        let b = LoadTarget::next();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("item #"));
    }

    #[test]
    fn dropped_completion_reports_failure() {
        let (tx, rx) = channel();
        let target = LoadTarget::next();
        drop(LoadCompletion::new(target, 7, tx, None));

        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.target, target);
        assert_eq!(msg.generation, 7);
        assert!(matches!(msg.outcome, LoadOutcome::Empty(_)));
    }

    #[test]
    fn completion_is_delivered_once() {
        let (tx, rx) = channel();
        let completion = LoadCompletion::new(LoadTarget::next(), 1, tx, None);
        completion.succeed(DynamicImage::new_rgba8(2, 2));

        assert!(matches!(rx.try_recv().unwrap().outcome, LoadOutcome::Image(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn completion_after_receiver_dropped_is_silent() {
        let (tx, rx) = channel();
        drop(rx);
        LoadCompletion::new(LoadTarget::next(), 1, tx, None).succeed(DynamicImage::new_rgba8(1, 1));
    }

    #[test]
    fn file_source_decodes_on_background_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        DynamicImage::new_rgba8(6, 4).save(&path).unwrap();

        let (tx, rx) = channel();
        let source = FileSource::new(&path);
        source.load(LoadTarget::next(), LoadCompletion::new(LoadTarget::next(), 1, tx, None));

        let msg = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        match msg.outcome {
            LoadOutcome::Image(image) => assert_eq!((image.width(), image.height()), (6, 4)),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(source.in_flight_count(), 0);
    }

    #[test]
    fn cancelled_file_load_never_posts_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        DynamicImage::new_rgba8(6, 4).save(&path).unwrap();

        let source = FileSource::new(&path);
        let target = LoadTarget::next();
        let (tx, rx) = channel();
        source.in_flight.lock().unwrap().insert(target, false);
        source.cancel_load(target);

        // Run the loader body on this thread so the cancel is known to come first
        FileSource::decode(
            &path,
            target,
            &source.in_flight,
            LoadCompletion::new(target, 1, tx, None),
        );

        let msg = rx.try_recv().unwrap();
        assert!(matches!(msg.outcome, LoadOutcome::Cancelled));
        assert_eq!(source.in_flight_count(), 0);
    }

    #[test]
    fn cancel_after_finish_leaves_no_mark() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        DynamicImage::new_rgba8(2, 2).save(&path).unwrap();

        let source = FileSource::new(&path);
        let target = LoadTarget::next();
        let (tx, rx) = channel();
        source.load(target, LoadCompletion::new(target, 1, tx, None));
        rx.recv_timeout(Duration::from_secs(10)).unwrap();

        source.cancel_load(target);
        source.cancel_load(LoadTarget::next());
        assert_eq!(source.in_flight_count(), 0);
    }

    #[test]
    fn file_source_missing_file_fails() {
        let (tx, rx) = channel();
        let source = FileSource::new("/nonexistent/slideshow/image.png");
        source.load(LoadTarget::next(), LoadCompletion::new(LoadTarget::next(), 1, tx, None));

        let msg = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(msg.outcome, LoadOutcome::Empty(_)));
    }
}
