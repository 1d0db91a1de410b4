//! Render configuration.
//!
//! [`RenderConfig`] describes the sinks a logger opens: an optional stdout
//! sink and an optional rolling file sink, each with its own template.
//! It deserializes from TOML with every field optional.
//!
//! ```toml
//! stdout = false
//! out_dir = "/var/log/app"
//! out_file = "storage.log"
//! out_pattern = "%J{TDuse}"
//! rotate_size = 104857600
//! async_flush = true
//! ```

use crate::{
    presets::{DEFAULT_FILE_PATTERN, DEFAULT_STDOUT_PATTERN},
    render::{DEFAULT_BUFFER_CAPACITY, RenderMode},
    rolling::RollingConfig,
};
use hookwire_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Sinks and templates of a logger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Open a sink on standard output.
    pub stdout: bool,
    /// Template of the stdout sink.
    pub stdout_pattern: String,
    /// Directory of the file sink; empty disables it.
    pub out_dir: String,
    /// File name of the file sink.
    pub out_file: String,
    /// Template of the file sink.
    pub out_pattern: String,
    /// Bytes buffered in memory before reaching the file.
    pub file_buffer_size: usize,
    /// File size that triggers rotation; `0` disables rotation.
    pub rotate_size: u64,
    /// Rotated backups kept.
    pub max_log_file: usize,
    /// Hand file records to a background flusher instead of writing inline.
    pub async_flush: bool,
    /// Flusher period in milliseconds.
    pub flush_interval_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            stdout_pattern: DEFAULT_STDOUT_PATTERN.to_owned(),
            out_dir: String::new(),
            out_file: "hookwire.log".to_owned(),
            out_pattern: DEFAULT_FILE_PATTERN.to_owned(),
            file_buffer_size: DEFAULT_BUFFER_CAPACITY,
            rotate_size: 256 * 1024 * 1024,
            max_log_file: 10,
            async_flush: false,
            flush_interval_ms: 1000,
        }
    }
}

impl RenderConfig {
    /// Parse a TOML document; missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Enable or disable the stdout sink.
    pub fn with_stdout(mut self, enabled: bool) -> Self {
        self.stdout = enabled;
        self
    }

    /// Template of the stdout sink.
    pub fn with_stdout_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.stdout_pattern = pattern.into();
        self
    }

    /// Enable the file sink at `dir/file`.
    pub fn with_file(mut self, dir: impl Into<String>, file: impl Into<String>) -> Self {
        self.out_dir = dir.into();
        self.out_file = file.into();
        self
    }

    /// Template of the file sink.
    pub fn with_out_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.out_pattern = pattern.into();
        self
    }

    /// Rotation limits of the file sink.
    pub fn with_rotation(mut self, rotate_size: u64, max_log_file: usize) -> Self {
        self.rotate_size = rotate_size;
        self.max_log_file = max_log_file;
        self
    }

    /// Use a background flusher for the file sink.
    pub fn with_async_flush(mut self, interval: Duration) -> Self {
        self.async_flush = true;
        self.flush_interval_ms = interval.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// True when a file sink is configured.
    pub fn file_enabled(&self) -> bool {
        !self.out_dir.is_empty()
    }

    /// Path of the file sink.
    pub fn file_path(&self) -> PathBuf {
        PathBuf::from(&self.out_dir).join(&self.out_file)
    }

    /// Reject settings that cannot produce a working sink.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.file_enabled() && self.out_file.is_empty() {
            return Err(ConfigError::Invalid("out_file must be set when out_dir is".into()));
        }
        if self.async_flush && self.flush_interval_ms == 0 {
            return Err(ConfigError::Invalid("flush_interval_ms must be positive".into()));
        }
        Ok(())
    }

    /// Delivery mode of the file sink.
    pub fn render_mode(&self) -> RenderMode {
        if self.async_flush {
            RenderMode::Buffered {
                flush_interval: Duration::from_millis(self.flush_interval_ms),
                capacity: self.file_buffer_size.max(1),
            }
        } else {
            RenderMode::Sync
        }
    }

    /// Buffering and rotation of the file sink.
    pub fn rolling_config(&self) -> RollingConfig {
        RollingConfig {
            buffer_size: self.file_buffer_size,
            rotate_size: self.rotate_size,
            max_files: self.max_log_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_fields_are_optional() {
        let config = RenderConfig::from_toml_str(
            r#"
            stdout = false
            out_dir = "/tmp/logs"
            out_pattern = "%J{Tu}"
            "#,
        )
        .unwrap();

        assert!(!config.stdout);
        assert!(config.file_enabled());
        assert_eq!(config.out_file, "hookwire.log");
        assert_eq!(config.out_pattern, "%J{Tu}");
        assert_eq!(config.stdout_pattern, DEFAULT_STDOUT_PATTERN);
        assert_eq!(config.render_mode(), RenderMode::Sync);
    }

    #[test]
    fn async_flush_selects_buffered_mode() {
        let config = RenderConfig::default().with_async_flush(Duration::from_millis(250));
        assert_eq!(
            config.render_mode(),
            RenderMode::Buffered {
                flush_interval: Duration::from_millis(250),
                capacity: DEFAULT_BUFFER_CAPACITY,
            }
        );
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(matches!(
            RenderConfig::from_toml_str("stdout = \"yes\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("out_dir = \"x\"\nout_file = \"\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("async_flush = true\nflush_interval_ms = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rolling_config_follows_fields() {
        let config = RenderConfig::default().with_rotation(1024, 3);
        assert_eq!(
            config.rolling_config(),
            RollingConfig {
                buffer_size: DEFAULT_BUFFER_CAPACITY,
                rotate_size: 1024,
                max_files: 3,
            }
        );
    }
}
