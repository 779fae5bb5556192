use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{ItemError, Result};
use crate::geometry::ContentMode;

/// Smallest zoom scale; the fitted, unzoomed state.
pub const MINIMUM_SCALE: f32 = 1.0;
pub const DEFAULT_MAXIMUM_SCALE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub zoom_enabled: bool,
    /// Zoom to the maximum scale whenever the item's frame changes
    pub zoom_in_initially: bool,
    pub maximum_scale: f32,
    #[serde(skip, default = "minimum_scale")]
    pub minimum_scale: f32,
}

fn minimum_scale() -> f32 {
    MINIMUM_SCALE
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            zoom_enabled: true,
            zoom_in_initially: false,
            maximum_scale: DEFAULT_MAXIMUM_SCALE,
            minimum_scale: MINIMUM_SCALE,
        }
    }
}

impl ZoomConfig {
    pub fn new(zoom_enabled: bool, maximum_scale: f32) -> Self {
        Self {
            zoom_enabled,
            maximum_scale,
            ..Self::default()
        }
        .sanitized()
    }

    pub fn with_zoom_in_initially(mut self, zoom_in_initially: bool) -> Self {
        self.zoom_in_initially = zoom_in_initially;
        self
    }

    /// Keeps the maximum scale finite and never below the minimum.
    pub fn sanitized(mut self) -> Self {
        self.minimum_scale = MINIMUM_SCALE;
        if !self.maximum_scale.is_finite() || self.maximum_scale < self.minimum_scale {
            log::warn!(
                "Invalid maximum zoom scale {}, clamping to {}",
                self.maximum_scale,
                self.minimum_scale
            );
            self.maximum_scale = self.minimum_scale;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSettings {
    pub zoom: ZoomConfig,
    pub content_mode: ContentMode,

    // Zoom behavior
    pub smooth_zoom: bool,
    pub zoom_animation_speed: f32,

    // Gestures
    pub long_press_secs: f32,

    pub show_activity_indicator: bool,
    /// Where the long-press save action writes images
    pub export_dir: Option<PathBuf>,
}

impl Default for ItemSettings {
    fn default() -> Self {
        Self {
            zoom: ZoomConfig::default(),
            content_mode: ContentMode::AspectFit,
            smooth_zoom: true,
            zoom_animation_speed: 8.0,
            long_press_secs: 0.5,
            show_activity_indicator: true,
            export_dir: None,
        }
    }
}

impl ItemSettings {
    fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "rview", "SlideshowItem")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads the user's settings, falling back to defaults on any problem.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Err(e) = self.save_to(&path) {
            log::warn!("Failed to save settings: {}", e);
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&content)?;
        settings.zoom = settings.zoom.sanitized();
        if !(settings.zoom_animation_speed > 0.0) {
            return Err(ItemError::Settings {
                message: format!(
                    "zoom_animation_speed must be positive, got {}",
                    settings.zoom_animation_speed
                ),
            });
        }
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
