use std::path::PathBuf;
use thiserror::Error;

use crate::source::LoadTarget;

#[derive(Error, Debug)]
pub enum ItemError {
    /// The source produced no image, or an error while producing it.
    #[error("Failed to load image for {target}: {message}")]
    LoadFailed { target: LoadTarget, message: String },

    /// A result that arrived after a release request and was dropped.
    #[error("Discarded stale image for {target}")]
    CancelledDiscard { target: LoadTarget },

    #[error("Failed to save image to '{path}': {message}")]
    ExportFailed { path: PathBuf, message: String },

    #[error("Settings error: {message}")]
    Settings { message: String },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ItemError>;

impl ItemError {
    /// Returns true if the user can sensibly retry the operation
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ItemError::LoadFailed { .. } | ItemError::ExportFailed { .. } | ItemError::Io { .. }
        )
    }

    /// A discard is expected release handling, never a failure to surface.
    pub fn is_failure(&self) -> bool {
        !matches!(self, ItemError::CancelledDiscard { .. })
    }

    pub fn user_message(&self) -> String {
        let suggestion = match self {
            ItemError::LoadFailed { .. } => "Tap the image to try again.",
            ItemError::ExportFailed { .. } => "Check that the export folder exists and is writable.",
            ItemError::Settings { .. } | ItemError::Json { .. } => {
                "Settings were reset to their defaults."
            }
            ItemError::Io { .. } => "Check disk space and permissions.",
            ItemError::CancelledDiscard { .. } => return String::new(),
        };

        format!("{}\n\n{}", self, suggestion)
    }

    /// Returns an error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ItemError::LoadFailed { .. } => "LOAD_FAILED",
            ItemError::CancelledDiscard { .. } => "CANCELLED_DISCARD",
            ItemError::ExportFailed { .. } => "EXPORT_FAILED",
            ItemError::Settings { .. } => "SETTINGS_ERROR",
            ItemError::Io { .. } => "IO_ERROR",
            ItemError::Json { .. } => "JSON_ERROR",
        }
    }

    /// Logs the error at a level matching its severity
    pub fn log(&self) {
        match self {
            ItemError::CancelledDiscard { .. } => log::debug!("{}", self),
            _ => log::warn!("[{}] {}", self.error_code(), self),
        }
    }
}
