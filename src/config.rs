//! Application configuration.
//!
//! The configuration is loaded from a JSON file
//! (`$XDG_CONFIG_HOME/launchgrid/config.json` for the binary).  Every section
//! and every field is optional; missing values fall back to the compiled-in
//! defaults and unknown keys are ignored.
//!
//! # Example
//!
//! ```json
//! {
//!   "grid": {
//!     "base_cols": 10,
//!     "base_rows": 4,
//!     "slot_size": 120.0,
//!     "gap": 12.0,
//!     "min_cols": 3
//!   },
//!   "drag": { "long_press_ms": 200, "drag_threshold_px": 5.0 },
//!   "timing": { "resize_debounce_ms": 50, "settle_ms": 100, "save_debounce_ms": 300 }
//! }
//! ```

use crate::drag::DragConfig;
use crate::layout::{LayoutParams, DEFAULT_REFERENCE_COLS, DEFAULT_SCAN_ROWS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Grid geometry.
    #[serde(default)]
    pub grid: GridConfig,

    /// Pointer gesture recognition.
    #[serde(default)]
    pub drag: DragConfig,

    /// Debounce and settle delays.
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Grid geometry.  Pixel values are floating point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Reference column count anchors are expressed in.  Also the column
    /// count of a full-size viewport.
    pub base_cols: u32,
    /// Minimum number of rows shown.
    pub base_rows: u32,
    /// Side length of one cell in pixels.
    pub slot_size: f64,
    /// Gap between cells in pixels.
    pub gap: f64,
    /// Fewest columns shown, however narrow the viewport.
    pub min_cols: u32,
    /// Most columns shown.  Values above `base_cols` are clamped to it.
    pub max_cols: u32,
    /// Horizontal space taken by the surrounding chrome.
    pub horizontal_padding: f64,
    /// Vertical space taken by the surrounding chrome.
    pub vertical_padding: f64,
    /// Rows searched for a free rectangle before an item is left unplaced.
    pub scan_rows: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            base_cols: DEFAULT_REFERENCE_COLS,
            base_rows: 4,
            slot_size: 120.0,
            gap: 12.0,
            min_cols: 3,
            max_cols: DEFAULT_REFERENCE_COLS,
            horizontal_padding: 80.0,
            vertical_padding: 0.0,
            scan_rows: DEFAULT_SCAN_ROWS,
        }
    }
}

impl GridConfig {
    /// Upper column bound actually used: anchors cannot encode columns past
    /// the reference grid.
    pub fn effective_max_cols(&self) -> u32 {
        self.max_cols.min(self.base_cols).max(1)
    }

    /// Lower column bound actually used.
    pub fn effective_min_cols(&self) -> u32 {
        self.min_cols.clamp(1, self.effective_max_cols())
    }

    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            reference_cols: self.base_cols.max(1),
            scan_rows: self.scan_rows,
        }
    }
}

/// Debounce and settle delays, all in **milliseconds**.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Quiet period after the last resize before columns are recomputed.
    pub resize_debounce_ms: u64,
    /// Delay after mount before the layout is considered stable and the
    /// initial snapshot is handed to the store.
    pub settle_ms: u64,
    /// Quiet period after the last manual change before it is saved.
    pub save_debounce_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 50,
            settle_ms: 100,
            save_debounce_ms: 300,
        }
    }
}

impl TimingConfig {
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
