//! Configuration module for gesture-rs
//!
//! This module handles the deployment configuration of the interpreter:
//! - Frame protocol of the glove (channel count, delimiter, noise markers)
//! - Preprocessing strategy matching the deployed model
//! - The built-in centroid model and its label set
//! - Confidence gate and smoothing window parameters
//! - Acquisition worker and logging settings
//!
//! # Config Location
//!
//! The default config file lives in the platform-appropriate config directory
//! under `gesture-rs/config.toml`:
//! - **Linux**: `~/.config/gesture-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/gesture-rs/config.toml`
//! - **Windows**: `%APPDATA%\gesture-rs\config.toml`
//!
//! # Example
//!
//! ```ignore
//! use gesture_rs::config::AppConfig;
//!
//! let config = AppConfig::load_or_default("glove.toml");
//! config.validate()?;
//! config.save("glove.toml")?;
//! ```

use crate::error::{GestureError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "gesture-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Channel count of the observed glove protocol (5 flex + 3 inertial)
pub const DEFAULT_CHANNEL_COUNT: usize = 8;

/// Default confidence threshold
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// Default smoothing window length in frames
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Default minimum votes for a stable label
pub const DEFAULT_MIN_SUPPORT: usize = 3;

/// Banner text the glove firmware prints while booting
pub const DEFAULT_NOISE_MARKER: &str = "Initializing";

// ==================== Config Directory ====================

/// Get the application config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== App Config ====================

/// Complete interpreter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Line protocol of the glove
    #[serde(default)]
    pub frame: FrameConfig,

    /// Preprocessing strategy for the deployed model
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,

    /// Built-in centroid model
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Confidence gate settings
    #[serde(default)]
    pub gate: GateConfig,

    /// Smoothing window settings
    #[serde(default)]
    pub smoothing: SmoothingConfig,

    /// Acquisition worker settings
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GestureError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            GestureError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load a config file, returning defaults if any error occurs
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save config to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GestureError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = self.to_toml()?;

        std::fs::write(path, content).map_err(|e| {
            GestureError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Serialize to a TOML document
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| GestureError::Serialization(format!("Failed to serialize config: {}", e)))
    }

    /// Check the cross-section invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        let arity = self.frame.channel_count;
        if arity == 0 {
            return Err(GestureError::Config(
                "frame.channel_count must be at least 1".to_string(),
            ));
        }
        if self.frame.delimiter.is_ascii_digit()
            || matches!(self.frame.delimiter, '.' | '-' | '+')
        {
            return Err(GestureError::Config(format!(
                "frame.delimiter {:?} collides with number syntax",
                self.frame.delimiter
            )));
        }

        self.preprocessing.validate(arity)?;
        self.classifier.validate(arity)?;

        if !(0.0..=1.0).contains(&self.gate.threshold) {
            return Err(GestureError::Config(format!(
                "gate.threshold {} is outside [0, 1]",
                self.gate.threshold
            )));
        }

        let SmoothingConfig {
            window_size,
            min_support,
        } = self.smoothing;
        if window_size == 0 {
            return Err(GestureError::Config(
                "smoothing.window_size must be at least 1".to_string(),
            ));
        }
        if min_support == 0 || min_support > window_size {
            return Err(GestureError::Config(format!(
                "smoothing.min_support must be in 1..={}, got {}",
                window_size, min_support
            )));
        }

        if self.acquisition.update_buffer == 0 {
            return Err(GestureError::Config(
                "acquisition.update_buffer must be at least 1".to_string(),
            ));
        }
        if self.acquisition.max_line_len == 0 {
            return Err(GestureError::Config(
                "acquisition.max_line_len must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// ==================== Frame Config ====================

/// Line protocol of the glove
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Number of numeric fields in a data line
    pub channel_count: usize,

    /// Field delimiter
    pub delimiter: char,

    /// Substrings marking non-data lines
    pub noise_markers: Vec<String>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            channel_count: DEFAULT_CHANNEL_COUNT,
            delimiter: ',',
            noise_markers: vec![DEFAULT_NOISE_MARKER.to_string()],
        }
    }
}

// ==================== Preprocessing Config ====================

/// A contiguous range of channels normalized with one (min, max) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelGroup {
    /// Group name (for logs)
    pub name: String,
    /// First channel index (inclusive)
    pub start: usize,
    /// Last channel index (exclusive)
    pub end: usize,
    /// Value mapped to 0
    pub min: f64,
    /// Value mapped to 1
    pub max: f64,
}

impl ChannelGroup {
    pub fn new(name: impl Into<String>, start: usize, end: usize, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            min,
            max,
        }
    }
}

/// Default groups of the observed glove: flex sensors then accelerometer axes
pub fn default_channel_groups() -> Vec<ChannelGroup> {
    vec![
        ChannelGroup::new("flex", 0, 5, 100.0, 700.0),
        ChannelGroup::new("inertial", 5, 8, -1.0, 2.0),
    ]
}

/// Preprocessing strategy, chosen to match how the deployed model was trained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PreprocessingConfig {
    /// Channels are passed through unchanged
    Raw,
    /// Per-group min-max normalization
    MinMax { groups: Vec<ChannelGroup> },
    /// Fitted standard scaler: `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// Min-max normalization followed by a fitted scaler
    MinMaxStandard {
        groups: Vec<ChannelGroup>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        PreprocessingConfig::MinMax {
            groups: default_channel_groups(),
        }
    }
}

impl PreprocessingConfig {
    /// Short strategy name
    pub fn strategy_name(&self) -> &'static str {
        match self {
            PreprocessingConfig::Raw => "raw",
            PreprocessingConfig::MinMax { .. } => "min_max",
            PreprocessingConfig::Standard { .. } => "standard",
            PreprocessingConfig::MinMaxStandard { .. } => "min_max_standard",
        }
    }

    fn validate(&self, arity: usize) -> Result<()> {
        match self {
            PreprocessingConfig::Raw => Ok(()),
            PreprocessingConfig::MinMax { groups } => validate_groups(groups, arity),
            PreprocessingConfig::Standard { mean, scale } => validate_scaler(mean, scale, arity),
            PreprocessingConfig::MinMaxStandard {
                groups,
                mean,
                scale,
            } => {
                validate_groups(groups, arity)?;
                validate_scaler(mean, scale, arity)
            }
        }
    }
}

fn validate_groups(groups: &[ChannelGroup], arity: usize) -> Result<()> {
    let mut covered = vec![false; arity];
    for group in groups {
        if group.start >= group.end || group.end > arity {
            return Err(GestureError::Config(format!(
                "channel group '{}' range {}..{} is invalid for {} channels",
                group.name, group.start, group.end, arity
            )));
        }
        if !(group.max > group.min) {
            return Err(GestureError::Config(format!(
                "channel group '{}' needs max > min (got {}..{})",
                group.name, group.min, group.max
            )));
        }
        for slot in &mut covered[group.start..group.end] {
            if *slot {
                return Err(GestureError::Config(format!(
                    "channel group '{}' overlaps another group",
                    group.name
                )));
            }
            *slot = true;
        }
    }
    if let Some(missing) = covered.iter().position(|c| !c) {
        return Err(GestureError::Config(format!(
            "channel {} is not covered by any channel group",
            missing
        )));
    }
    Ok(())
}

fn validate_scaler(mean: &[f64], scale: &[f64], arity: usize) -> Result<()> {
    if mean.len() != arity || scale.len() != arity {
        return Err(GestureError::Config(format!(
            "scaler needs {} mean and scale values, got {} and {}",
            arity,
            mean.len(),
            scale.len()
        )));
    }
    Ok(())
}

// ==================== Classifier Config ====================

/// Built-in nearest-centroid model
///
/// `centroids[i]` is the centroid of `labels[i]`, expressed in preprocessed
/// feature space and ordered like `feature_names`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Labels in training order
    pub labels: Vec<String>,

    /// Feature names in training order
    pub feature_names: Vec<String>,

    /// One centroid per label
    pub centroids: Vec<Vec<f64>>,

    /// Softmax temperature applied to squared distances
    pub temperature: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        // Flex channels read high when the finger is bent.
        let centroids = vec![
            vec![0.15, 0.15, 0.85, 0.85, 0.15, 0.35, 0.40, 0.65],
            vec![0.85, 0.85, 0.85, 0.85, 0.85, 0.35, 0.65, 0.40],
            vec![0.60, 0.85, 0.15, 0.15, 0.15, 0.35, 0.40, 0.65],
            vec![0.85, 0.85, 0.85, 0.85, 0.15, 0.35, 0.40, 0.65],
            vec![0.85, 0.15, 0.15, 0.85, 0.85, 0.35, 0.40, 0.65],
            vec![0.85, 0.15, 0.15, 0.15, 0.85, 0.35, 0.40, 0.65],
            vec![0.15, 0.15, 0.15, 0.15, 0.15, 0.60, 0.40, 0.45],
            vec![0.20, 0.90, 0.90, 0.90, 0.90, 0.35, 0.55, 0.50],
        ];

        Self {
            labels: ["ILoveYou", "PawsUp", "F", "I", "U", "Water", "Mom", "Sorry"]
                .into_iter()
                .map(String::from)
                .collect(),
            feature_names: ["flex1", "flex2", "flex3", "flex4", "flex5", "x", "y", "z"]
                .into_iter()
                .map(String::from)
                .collect(),
            centroids,
            temperature: 0.05,
        }
    }
}

impl ClassifierConfig {
    fn validate(&self, arity: usize) -> Result<()> {
        if self.labels.is_empty() {
            return Err(GestureError::Config(
                "classifier.labels must not be empty".to_string(),
            ));
        }
        for (i, label) in self.labels.iter().enumerate() {
            if self.labels[..i].contains(label) {
                return Err(GestureError::Config(format!(
                    "classifier label '{}' is duplicated",
                    label
                )));
            }
        }
        if self.feature_names.len() != arity {
            return Err(GestureError::Config(format!(
                "classifier expects {} features but frames carry {} channels",
                self.feature_names.len(),
                arity
            )));
        }
        if self.centroids.len() != self.labels.len() {
            return Err(GestureError::Config(format!(
                "classifier has {} labels but {} centroids",
                self.labels.len(),
                self.centroids.len()
            )));
        }
        if let Some((i, _)) = self
            .centroids
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != arity)
        {
            return Err(GestureError::Config(format!(
                "centroid for '{}' does not have {} values",
                self.labels[i], arity
            )));
        }
        if !(self.temperature > 0.0) {
            return Err(GestureError::Config(
                "classifier.temperature must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ==================== Gate / Smoothing Config ====================

/// Confidence gate configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Initial threshold in [0, 1]; adjustable at runtime
    pub threshold: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Smoothing window configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Number of recent decisions kept
    pub window_size: usize,

    /// Votes required for a stable label
    pub min_support: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_support: DEFAULT_MIN_SUPPORT,
        }
    }
}

// ==================== Acquisition Config ====================

/// Acquisition worker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Device or capture file to read lines from
    pub device_path: Option<PathBuf>,

    /// Sleep between polls when idle or when no line is available
    pub idle_poll_ms: u64,

    /// Interval between statistics messages
    pub stats_interval_ms: u64,

    /// Capacity of the lossy frame update channel
    pub update_buffer: usize,

    /// Capacity of the command channel
    pub command_buffer: usize,

    /// Longest wait for a device line before commands are checked again
    pub read_timeout_ms: u64,

    /// Longest accepted device line in bytes; longer lines are discarded
    pub max_line_len: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            device_path: None,
            idle_poll_ms: 10,
            stats_interval_ms: 1000,
            update_buffer: 64,
            command_buffer: 64,
            read_timeout_ms: 100,
            max_line_len: 1024,
        }
    }
}

// ==================== Logging Config ====================

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    pub level: String,

    /// Optional log file (written in addition to stderr)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,gesture_rs=debug".to_string(),
            file: None,
        }
    }
}
