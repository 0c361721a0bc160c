//! Configuration file parser for ~/.config/pitchswipe/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::engine::EngineSettings;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid config value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity the feed is shown to. `--viewer` overrides it.
    pub viewer_id: String,

    /// Fraction of an item that must be on screen to count as visible.
    pub visibility_threshold: f64,

    /// Continuous visibility (ms) before a view is recorded.
    pub view_commit_ms: u64,

    /// Horizontal drag distance (px) that commits a swipe.
    pub swipe_threshold: f64,

    /// How long connect/pass feedback shows before moving on (ms).
    pub action_display_ms: u64,

    /// How long a failed connect is shown (ms).
    pub connect_error_ms: u64,

    /// How long like feedback shows (ms).
    pub like_feedback_ms: u64,

    /// Base of the links handed to the share capability.
    pub share_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        let viewer_id = std::env::var("USER")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "viewer".to_string());
        Self {
            viewer_id,
            visibility_threshold: 0.5,
            view_commit_ms: 3000,
            swipe_threshold: 100.0,
            action_display_ms: 800,
            connect_error_ms: 1500,
            like_feedback_ms: 1000,
            share_base_url: "https://pitchswipe.app".to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "viewer_id",
        "visibility_threshold",
        "view_commit_ms",
        "swipe_threshold",
        "action_display_ms",
        "connect_error_ms",
        "like_feedback_ms",
        "share_base_url",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(path = %path.display(), viewer = %config.viewer_id, "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewer_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "viewer_id",
                reason: "must not be empty".to_string(),
            });
        }
        if !(self.visibility_threshold > 0.0 && self.visibility_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                key: "visibility_threshold",
                reason: format!("{} is not in (0, 1]", self.visibility_threshold),
            });
        }
        if !(self.swipe_threshold > 0.0 && self.swipe_threshold.is_finite()) {
            return Err(ConfigError::Invalid {
                key: "swipe_threshold",
                reason: format!("{} is not a positive distance", self.swipe_threshold),
            });
        }
        let delays = [
            ("view_commit_ms", self.view_commit_ms),
            ("action_display_ms", self.action_display_ms),
            ("connect_error_ms", self.connect_error_ms),
            ("like_feedback_ms", self.like_feedback_ms),
        ];
        for (key, ms) in delays {
            if ms == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            visibility_threshold: self.visibility_threshold,
            view_commit_delay: Duration::from_millis(self.view_commit_ms),
            swipe_threshold: self.swipe_threshold,
            action_display_delay: Duration::from_millis(self.action_display_ms),
            connect_error_delay: Duration::from_millis(self.connect_error_ms),
            like_feedback_delay: Duration::from_millis(self.like_feedback_ms),
            share_base_url: self.share_base_url.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
