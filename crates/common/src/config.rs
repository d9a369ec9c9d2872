//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that forces `-max_muxing_queue_size` on every
/// ffmpeg input.
pub const MAX_MUXING_QUEUE_SIZE_ENV: &str = "MAX_MUXING_QUEUE_SIZE";

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default scan parameters.
    pub scan: ScanDefaults,

    /// Default edit pipeline parameters.
    pub render: RenderDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default scan parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanDefaults {
    /// Step of the first (coarse) pass in seconds.
    pub coarse_step_secs: f64,

    /// Descending refinement schedule in seconds.
    pub refine_steps: Vec<f64>,

    /// Normalized correlation score a template must exceed to count as present.
    pub match_threshold: f32,
}

/// Default edit pipeline parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// ffmpeg program and leading arguments, whitespace separated.
    pub ffmpeg_command: String,

    /// ffmpeg `boxblur` filter parameters.
    pub boxblur: String,

    /// Value for `-max_muxing_queue_size`, appended after each input.
    pub max_muxing_queue_size: Option<u32>,

    /// Keep intermediate split files after a run.
    pub keep_intermediates: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "overblur_detect=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Include thread ids, handy when following the two scan tasks.
    pub thread_ids: bool,
}

impl Default for ScanDefaults {
    fn default() -> Self {
        Self {
            coarse_step_secs: 20.0,
            refine_steps: vec![2.0, 0.5, 0.1],
            match_threshold: 0.9,
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            ffmpeg_command: "ffmpeg -loglevel warning -y".to_string(),
            boxblur: "20".to_string(),
            max_muxing_queue_size: None,
            keep_intermediates: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            thread_ids: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    ///
    /// Environment overrides are applied on top of whatever was loaded.
    pub fn load() -> Self {
        let config_path = config_file_path();
        let mut config = Self::default();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(loaded) => config = loaded,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        config.apply_env_overrides();
        config
    }

    /// Where [`AppConfig::load`] looks.
    pub fn path() -> PathBuf {
        config_file_path()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(MAX_MUXING_QUEUE_SIZE_ENV) {
            match parse_queue_size(&raw) {
                Some(size) => self.render.max_muxing_queue_size = Some(size),
                None if raw.trim().is_empty() => {}
                None => tracing::warn!(
                    value = %raw,
                    "Ignoring invalid {}",
                    MAX_MUXING_QUEUE_SIZE_ENV
                ),
            }
        }
    }
}

fn parse_queue_size(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|size| *size > 0)
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("overblur").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_defaults_match_documented_values() {
        let scan = ScanDefaults::default();
        assert_eq!(scan.coarse_step_secs, 20.0);
        assert_eq!(scan.refine_steps, vec![2.0, 0.5, 0.1]);
        assert!((scan.match_threshold - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_config_fills_missing_fields() {
        let config: AppConfig =
            serde_json::from_str(r#"{"scan":{"coarse_step_secs":10.0}}"#).unwrap();
        assert_eq!(config.scan.coarse_step_secs, 10.0);
        assert_eq!(config.scan.refine_steps, vec![2.0, 0.5, 0.1]);
        assert_eq!(config.render.boxblur, "20");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_queue_size() {
        assert_eq!(parse_queue_size("1024"), Some(1024));
        assert_eq!(parse_queue_size(" 9999 "), Some(9999));
        assert_eq!(parse_queue_size("0"), None);
        assert_eq!(parse_queue_size("lots"), None);
    }
}
