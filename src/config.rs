use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::drivers::PlotStyle;
use crate::types::Hand;
use crate::waveform::WindowConfig;

/// Runtime settings. Every field has a default, so a config file only
/// needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_root: PathBuf,
    pub data_interval_ms: u64,
    pub button_trigger: u8,
    /// Only button presses from this glove toggle recording.
    pub trigger_hand: Hand,
    pub debounce_ms: u64,
    /// Wait after the stop command so in-flight frames still land.
    pub settle_ms: u64,
    pub connect_attempts: u32,
    pub connect_backoff_ms: u64,
    pub channel_capacity: usize,
    pub window: WindowConfig,
    pub plot_width: u32,
    pub plot_height: u32,
    pub auto_plot: bool,
    pub live_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            data_interval_ms: 15,
            button_trigger: 64,
            trigger_hand: Hand::Right,
            debounce_ms: 1000,
            settle_ms: 500,
            connect_attempts: 3,
            connect_backoff_ms: 2000,
            channel_capacity: 256,
            window: WindowConfig::default(),
            plot_width: 1400,
            plot_height: 1000,
            auto_plot: true,
            live_dir: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    /// Defaults when no file is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn data_interval(&self) -> Duration {
        Duration::from_millis(self.data_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn connect_backoff(&self) -> Duration {
        Duration::from_millis(self.connect_backoff_ms)
    }

    pub fn plot_style(&self) -> PlotStyle {
        PlotStyle::with_size(self.plot_width, self.plot_height)
    }
}
