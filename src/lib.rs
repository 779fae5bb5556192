//! Zoomable, pannable slideshow item with an asynchronous image load lifecycle.

pub mod errors;
pub mod export;
pub mod geometry;
pub mod indicator;
pub mod item;
pub mod lifecycle;
pub mod logging;
pub mod settings;
pub mod source;
pub mod ui;
pub mod viewport;


pub use errors::{ItemError, Result};
pub use item::{ItemEvent, ZoomDelegate, ZoomableImageItem};
pub use lifecycle::LoadState;
pub use settings::{ItemSettings, ZoomConfig};
pub use source::{FileSource, InputSource, LoadCompletion, LoadTarget, MemorySource};
