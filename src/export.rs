//! Long-press "save this image" affordance.
//!
//! The item only hands the displayed image to an [`ImageExporter`] and
//! listens for the outcome; where and how the image is persisted is up to
//! the exporter.

use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::{ItemError, Result};

#[derive(Debug)]
pub enum ExportOutcome {
    Saved(PathBuf),
    Failed(ItemError),
}

/// One-shot channel back to the item that requested the export.
pub struct ExportCompletion {
    tx: Sender<ExportOutcome>,
    repaint: Option<egui::Context>,
}

impl ExportCompletion {
    pub(crate) fn new(tx: Sender<ExportOutcome>, repaint: Option<egui::Context>) -> Self {
        Self { tx, repaint }
    }

    pub fn complete(self, outcome: ExportOutcome) {
        if self.tx.send(outcome).is_ok() {
            if let Some(ctx) = &self.repaint {
                ctx.request_repaint();
            }
        }
    }

    pub fn complete_with(self, result: Result<PathBuf>) {
        self.complete(match result {
            Ok(path) => ExportOutcome::Saved(path),
            Err(e) => ExportOutcome::Failed(e),
        });
    }
}

pub trait ImageExporter: Send + Sync {
    fn persist(&self, image: Arc<DynamicImage>, completion: ExportCompletion);
}

/// Writes PNG files into a directory on a background thread.
pub struct DirectoryExporter {
    dir: PathBuf,
    counter: AtomicU64,
}

impl DirectoryExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Exporter for the user's picture directory, if there is one.
    pub fn pictures() -> Option<Self> {
        directories::UserDirs::new()
            .and_then(|dirs| dirs.picture_dir().map(|p| p.join("Slideshow")))
            .map(Self::new)
    }

    fn next_path(&self) -> PathBuf {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!("slideshow_{}_{:03}.png", secs, n))
    }

    fn write(image: &DynamicImage, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ItemError::ExportFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| ItemError::ExportFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}

impl ImageExporter for DirectoryExporter {
    fn persist(&self, image: Arc<DynamicImage>, completion: ExportCompletion) {
        let path = self.next_path();
        let spawned = thread::Builder::new()
            .name("image-export".to_string())
            .spawn(move || {
                let result = Self::write(&image, &path).map(|_| path);
                completion.complete_with(result);
            });
        if let Err(e) = spawned {
            log::error!("Failed to spawn export thread: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    #[test]
    fn directory_exporter_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = DirectoryExporter::new(dir.path().join("out"));
        let (tx, rx) = channel();

        exporter.persist(
            Arc::new(DynamicImage::new_rgb8(3, 5)),
            ExportCompletion::new(tx, None),
        );

        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            ExportOutcome::Saved(path) => {
                assert!(path.starts_with(dir.path()));
                let saved = image::open(&path).unwrap();
                assert_eq!((saved.width(), saved.height()), (3, 5));
            }
            ExportOutcome::Failed(e) => panic!("export failed: {e}"),
        }
    }

    #[test]
    fn unwritable_directory_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let exporter = DirectoryExporter::new(blocker.join("out"));
        let (tx, rx) = channel();
        exporter.persist(
            Arc::new(DynamicImage::new_rgb8(1, 1)),
            ExportCompletion::new(tx, None),
        );

        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            ExportOutcome::Failed(e) => assert_eq!(e.error_code(), "EXPORT_FAILED"),
            ExportOutcome::Saved(path) => panic!("unexpectedly saved to {}", path.display()),
        }
    }
}
