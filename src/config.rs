//! Persisted browser settings.
//!
//! One flat, serde-friendly struct holding every knob of the signal browser
//! that survives a restart. Missing fields fall back to their defaults, so
//! files written by older versions keep loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::browser::signal_item::ScaleMode;
use crate::data::buffer::{WholeBufferMode, DEFAULT_WINDOW_BLOCKS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    // ── Buffer ───────────────────────────────────────────────────────────────
    /// Release decoded data of removed channels instead of keeping it.
    pub release_buffer: bool,
    pub whole_buffer: WholeBufferMode,
    pub init_downsampling: bool,
    pub init_min_max_search: bool,
    /// Display range used for channels without a searched min/max.
    pub default_range: [f32; 2],
    pub window_blocks: usize,

    // ── Layout ───────────────────────────────────────────────────────────────
    pub pixel_per_sec: f64,
    pub signal_height: i32,
    pub signal_spacing: i32,
    pub preferred_x_grid_pixel_interval: i32,
    pub preferred_y_grid_pixel_interval: i32,
    pub show_x_grid: bool,
    pub show_y_grid: bool,
    pub show_channel_labels: bool,
    pub show_x_scales: bool,
    pub show_y_scales: bool,
    pub auto_zoom: ScaleMode,

    // ── Events ───────────────────────────────────────────────────────────────
    pub all_event_types_selected: bool,
    pub shown_event_types: Vec<u16>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            release_buffer: false,
            whole_buffer: WholeBufferMode::Windowed,
            init_downsampling: true,
            init_min_max_search: true,
            default_range: [-100.0, 100.0],
            window_blocks: DEFAULT_WINDOW_BLOCKS,

            pixel_per_sec: 100.0,
            signal_height: 75,
            signal_spacing: 0,
            preferred_x_grid_pixel_interval: 100,
            preferred_y_grid_pixel_interval: 25,
            show_x_grid: true,
            show_y_grid: true,
            show_channel_labels: true,
            show_x_scales: true,
            show_y_scales: true,
            auto_zoom: ScaleMode::MinToMax,

            all_event_types_selected: true,
            shown_event_types: Vec::new(),
        }
    }
}

impl BrowserSettings {
    /// Replace values a layout pass cannot work with by their defaults.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        if !(self.pixel_per_sec > 0.0 && self.pixel_per_sec.is_finite()) {
            self.pixel_per_sec = d.pixel_per_sec;
        }
        if self.signal_height <= 0 {
            self.signal_height = d.signal_height;
        }
        if self.signal_spacing < 0 {
            self.signal_spacing = d.signal_spacing;
        }
        if self.preferred_x_grid_pixel_interval <= 0 {
            self.preferred_x_grid_pixel_interval = d.preferred_x_grid_pixel_interval;
        }
        if self.preferred_y_grid_pixel_interval <= 0 {
            self.preferred_y_grid_pixel_interval = d.preferred_y_grid_pixel_interval;
        }
        if self.window_blocks == 0 {
            self.window_blocks = d.window_blocks;
        }
        self
    }
}

// ---------- Public API ----------

/// Serialize settings as pretty JSON.
pub fn settings_to_json(settings: &BrowserSettings) -> Result<String, String> {
    serde_json::to_string_pretty(settings).map_err(|e| e.to_string())
}

/// Deserialize settings from JSON.
pub fn settings_from_json(json: &str) -> Result<BrowserSettings, String> {
    serde_json::from_str(json).map_err(|e| e.to_string())
}

pub fn settings_to_yaml(settings: &BrowserSettings) -> Result<String, String> {
    serde_yaml::to_string(settings).map_err(|e| format!("Serialization error: {}", e))
}

pub fn settings_from_yaml(yaml: &str) -> Result<BrowserSettings, String> {
    serde_yaml::from_str(yaml).map_err(|e| format!("Deserialization error: {}", e))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("yaml") | Some("yml")
    )
}

/// Save settings; `.yaml`/`.yml` paths are written as YAML, everything else as JSON.
pub fn save_settings_to_path(settings: &BrowserSettings, path: &Path) -> Result<(), String> {
    let txt = if is_yaml(path) {
        settings_to_yaml(settings)?
    } else {
        settings_to_json(settings)?
    };
    std::fs::write(path, txt).map_err(|e| format!("Failed to write file {:?}: {}", path, e))
}

/// Load settings written by [`save_settings_to_path`].
pub fn load_settings_from_path(path: &Path) -> Result<BrowserSettings, String> {
    let txt = std::fs::read_to_string(path).map_err(|e| format!("Failed to read file {:?}: {}", path, e))?;
    let settings = if is_yaml(path) {
        settings_from_yaml(&txt)?
    } else {
        settings_from_json(&txt)?
    };
    Ok(settings.sanitized())
}
