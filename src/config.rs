// Stream configuration
//
// All structs load from JSON with per-field defaults, so a config file only
// needs the keys it wants to change. CLI flags are layered on top by the
// binary.

use crate::error::{WindowError, WindowResult};
use crate::selector::FeatureSelector;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SHIFT: usize = 1;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;
pub const DEFAULT_N_INSTANCES: usize = 1000;

/// Where target-window values are taken from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetSource {
    /// The target selector is applied to the observation's own features
    #[default]
    Features,
    /// The target selector is applied to the observation's label
    Label,
}

/// Sliding-window shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Steps in each input window
    pub past_history: usize,

    /// Steps in each target window
    pub forecasting_horizon: usize,

    /// Extra observations consumed after the first input window completes
    /// before the target window starts filling
    pub shift: usize,

    /// Columns kept in input windows
    #[serde(alias = "input_idx")]
    pub input: FeatureSelector,

    /// Columns kept in target windows
    #[serde(alias = "target_idx")]
    pub target: FeatureSelector,

    pub target_source: TargetSource,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            past_history: 1,
            forecasting_horizon: 1,
            shift: DEFAULT_SHIFT,
            input: FeatureSelector::All,
            target: FeatureSelector::All,
            target_source: TargetSource::Features,
        }
    }
}

impl WindowConfig {
    pub fn new(past_history: usize, forecasting_horizon: usize) -> Self {
        Self {
            past_history,
            forecasting_horizon,
            ..Self::default()
        }
    }

    pub fn with_shift(mut self, shift: usize) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_input(mut self, selector: FeatureSelector) -> Self {
        self.input = selector;
        self
    }

    pub fn with_target(mut self, selector: FeatureSelector) -> Self {
        self.target = selector;
        self
    }

    pub fn with_target_source(mut self, source: TargetSource) -> Self {
        self.target_source = source;
        self
    }

    /// Reject window capacities of zero
    pub fn validate(&self) -> WindowResult<()> {
        if self.past_history == 0 {
            return Err(WindowError::InvalidConfig(
                "past_history must be a positive integer".to_string(),
            ));
        }
        if self.forecasting_horizon == 0 {
            return Err(WindowError::InvalidConfig(
                "forecasting_horizon must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    /// Observation count at which the target window starts filling.
    ///
    /// Saturates, so a shift too large to reach simply never fills a target.
    pub fn target_start(&self) -> usize {
        self.past_history.saturating_add(self.shift)
    }
}

/// Timing of the pull loop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PacingConfig {
    /// Minimum milliseconds between two emitted observations (0 disables pacing)
    #[serde(alias = "stream_period")]
    pub stream_period_ms: u64,

    /// Milliseconds without a new observation before the stream is stalled
    #[serde(alias = "timeout")]
    pub timeout_ms: u64,

    /// Back-off between polls of a source that has nothing ready
    pub poll_interval_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            stream_period_ms: 0,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl PacingConfig {
    pub fn stream_period(&self) -> Duration {
        Duration::from_millis(self.stream_period_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Complete configuration of one window stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    #[serde(flatten)]
    pub window: WindowConfig,

    #[serde(flatten)]
    pub pacing: PacingConfig,

    /// Cap on items pulled from a bounded stream source
    pub n_instances: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            pacing: PacingConfig::default(),
            n_instances: DEFAULT_N_INSTANCES,
        }
    }
}

impl From<WindowConfig> for StreamConfig {
    fn from(window: WindowConfig) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }
}

impl StreamConfig {
    /// Load a config file; keys missing from the file keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> WindowResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: StreamConfig = serde_json::from_str(&content)?;
        log::debug!("Loaded stream config from {}", path.display());
        Ok(config)
    }

    /// Load from the default location if a file exists there
    pub fn load_default() -> WindowResult<Option<Self>> {
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(path).map(Some),
            _ => Ok(None),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> WindowResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// `<config dir>/stream-window/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("stream-window").join("config.json"))
}
