use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for Showreel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Background video sequencing settings
    #[serde(default)]
    pub sequencer: SequencerConfig,

    /// Masonry gallery settings
    #[serde(default)]
    pub gallery: GalleryConfig,

    /// CMS content fetching settings
    #[serde(default)]
    pub content: ContentConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.sequencer.validate()?;
        self.gallery.validate()?;
        self.content.validate()?;
        Ok(())
    }
}

/// Video sequencer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Number of clips kept ready around the active one (1, 2 or 3)
    pub window_size: usize,

    /// Replay the active clip on natural end instead of advancing
    pub loop_single: bool,

    /// Length of the transition window in milliseconds
    pub transition_ms: u64,

    /// Safety cap on screen time per clip, in seconds; 0 disables it
    pub max_clip_seconds: f64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            window_size: 3,
            loop_single: false,
            transition_ms: 500,
            max_clip_seconds: 30.0,
        }
    }
}

impl SequencerConfig {
    /// Transition window as a duration
    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    /// Safety cap as a duration, if one is configured
    pub fn max_clip(&self) -> Option<Duration> {
        (self.max_clip_seconds > 0.0).then(|| Duration::from_secs_f64(self.max_clip_seconds))
    }

    fn validate(&self) -> Result<()> {
        if !(1..=3).contains(&self.window_size) {
            return Err(ConfigError::InvalidValue {
                key: "sequencer.window_size".to_string(),
                value: self.window_size.to_string()
            }.into());
        }

        if self.transition_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sequencer.transition_ms".to_string(),
                value: self.transition_ms.to_string()
            }.into());
        }

        let cap = self.max_clip_seconds;
        if !cap.is_finite() || cap < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "sequencer.max_clip_seconds".to_string(),
                value: cap.to_string()
            }.into());
        }

        Ok(())
    }
}

/// A viewport width threshold and the column count used at or above it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Minimum viewport width in pixels
    pub min_width: u32,

    /// Columns used when the viewport is at least `min_width` wide
    pub columns: usize,
}

/// Masonry gallery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Breakpoints, widest first
    pub breakpoints: Vec<Breakpoint>,

    /// Columns used below the narrowest breakpoint
    pub min_columns: usize,

    /// Aspect ratio (height / width) assumed for unprobed or unreadable images
    pub fallback_ratio: f32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            breakpoints: vec![
                Breakpoint { min_width: 1280, columns: 4 },
                Breakpoint { min_width: 768, columns: 3 },
            ],
            min_columns: 2,
            fallback_ratio: 1.0,
        }
    }
}

impl GalleryConfig {
    /// Reduce a viewport width to a column count
    ///
    /// Pure function of the width; there is no hysteresis near a breakpoint.
    pub fn column_count(&self, viewport_width: u32) -> usize {
        self.breakpoints
            .iter()
            .find(|bp| viewport_width >= bp.min_width)
            .map(|bp| bp.columns)
            .unwrap_or(self.min_columns)
    }

    fn validate(&self) -> Result<()> {
        if self.min_columns == 0 {
            return Err(ConfigError::InvalidValue {
                key: "gallery.min_columns".to_string(),
                value: self.min_columns.to_string()
            }.into());
        }

        for pair in self.breakpoints.windows(2) {
            if pair[0].min_width <= pair[1].min_width {
                return Err(ConfigError::InvalidValue {
                    key: "gallery.breakpoints".to_string(),
                    value: format!("{} before {}", pair[0].min_width, pair[1].min_width)
                }.into());
            }
        }

        if let Some(bp) = self.breakpoints.iter().find(|bp| bp.columns == 0) {
            return Err(ConfigError::InvalidValue {
                key: "gallery.breakpoints.columns".to_string(),
                value: format!("0 at {}px", bp.min_width)
            }.into());
        }

        if !self.fallback_ratio.is_finite() || self.fallback_ratio <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "gallery.fallback_ratio".to_string(),
                value: self.fallback_ratio.to_string()
            }.into());
        }

        Ok(())
    }
}

/// CMS content configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// How long fetched content stays fresh, in seconds (0 disables caching)
    pub cache_ttl_secs: u64,

    /// Directory holding `<content_type>.json` CMS exports
    pub export_dir: Option<PathBuf>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            export_dir: None,
        }
    }
}

impl ContentConfig {
    /// Cache time-to-live as a duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.export_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "content.export_dir".to_string(),
                    value: String::new()
                }.into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("showreel.toml");

        let mut original_config = Config::default();
        original_config.sequencer.window_size = 2;
        original_config.content.export_dir = Some(PathBuf::from("cms"));

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[sequencer]\nwindow_size = 1\nloop_single = true\ntransition_ms = 200\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert!(config.sequencer.loop_single);
        assert_eq!(config.sequencer.max_clip_seconds, 30.0);
        assert_eq!(config.sequencer.max_clip(), Some(Duration::from_secs(30)));
        assert_eq!(config.gallery, GalleryConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_field_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[sequencer]\nloop_single = true\n\n[gallery]\nmin_columns = 1\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.sequencer.window_size, 3);
        assert_eq!(config.sequencer.transition_ms, 500);
        assert_eq!(config.gallery.min_columns, 1);
        assert_eq!(config.gallery.breakpoints, GalleryConfig::default().breakpoints);
    }

    #[test]
    fn test_disabled_cap_survives_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("no-cap.toml");

        let mut config = Config::default();
        config.sequencer.max_clip_seconds = 0.0;
        config.save_to_file(&file_path).unwrap();

        let loaded = Config::from_file(&file_path).unwrap();
        assert_eq!(loaded.sequencer.max_clip(), None);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/definitely/not/here.toml");
        assert!(matches!(
            result,
            Err(crate::error::ShowreelError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_window_size() {
        let mut config = Config::default();
        config.sequencer.window_size = 4;
        assert!(config.validate().is_err());

        config.sequencer.window_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_clip_cap() {
        let mut config = Config::default();
        config.sequencer.max_clip_seconds = -1.0;
        assert!(config.validate().is_err());

        config.sequencer.max_clip_seconds = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_breakpoints_must_descend() {
        let mut config = Config::default();
        config.gallery.breakpoints.reverse();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_column_count_thresholds() {
        let gallery = GalleryConfig::default();
        assert_eq!(gallery.column_count(1920), 4);
        assert_eq!(gallery.column_count(1280), 4);
        assert_eq!(gallery.column_count(1279), 3);
        assert_eq!(gallery.column_count(768), 3);
        assert_eq!(gallery.column_count(767), 2);
        assert_eq!(gallery.column_count(0), 2);
    }
}
