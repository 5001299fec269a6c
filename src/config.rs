use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub map: MapConfig,
    pub feed: FeedConfig,
}

/// Viewport geometry and zoom bounds. Defaults match the dashboard map:
/// 960x600, scale 150, zoom extent [1, 8].
#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// GeoJSON boundary dataset, loaded once at startup. Optional: without
    /// it the map renders blank behind the satellites.
    #[serde(default)]
    pub basemap: Option<PathBuf>,
    #[serde(
        default = "default_animation_duration",
        deserialize_with = "de_duration"
    )]
    pub animation_duration: Duration,
    #[serde(default = "default_lookahead_hours")]
    pub lookahead_hours: f64,
    #[serde(default = "default_step_minutes")]
    pub step_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// YAML satellite catalog with precomputed ground tracks.
    pub catalog: PathBuf,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_width() -> f64 {
    960.0
}

fn default_height() -> f64 {
    600.0
}

fn default_scale() -> f64 {
    150.0
}

fn default_min_zoom() -> f64 {
    1.0
}

fn default_max_zoom() -> f64 {
    8.0
}

fn default_animation_duration() -> Duration {
    Duration::from_secs(30)
}

fn default_lookahead_hours() -> f64 {
    2.0
}

fn default_step_minutes() -> i64 {
    10
}

fn default_page_size() -> u32 {
    25
}

fn de_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(text.trim()).map_err(serde::de::Error::custom)
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            scale: default_scale(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            basemap: None,
            animation_duration: default_animation_duration(),
            lookahead_hours: default_lookahead_hours(),
            step_minutes: default_step_minutes(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(ConfigError::Invalid(
                "viewport dimensions must be positive".into(),
            ));
        }
        if self.viewport.scale <= 0.0 {
            return Err(ConfigError::Invalid("viewport scale must be positive".into()));
        }
        if self.viewport.min_zoom > self.viewport.max_zoom {
            return Err(ConfigError::Invalid(
                "min_zoom must not exceed max_zoom".into(),
            ));
        }
        if self.map.animation_duration.is_zero() {
            return Err(ConfigError::Invalid(
                "animation_duration must be positive".into(),
            ));
        }
        if self.feed.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_dashboard_defaults() {
        let config: Config = serde_yaml::from_str("feed:\n  catalog: sats.yaml\n").unwrap();
        assert_eq!(config.viewport.width, 960.0);
        assert_eq!(config.viewport.scale, 150.0);
        assert_eq!(config.map.animation_duration, Duration::from_secs(30));
        assert_eq!(config.map.lookahead_hours, 2.0);
        assert_eq!(config.map.step_minutes, 10);
        assert_eq!(config.feed.page_size, 25);
        assert!(config.map.basemap.is_none());
    }

    #[test]
    fn duration_parses_human_form() {
        let config: Config = serde_yaml::from_str(
            "feed:\n  catalog: sats.yaml\nmap:\n  animation_duration: 1m 30s\n",
        )
        .unwrap();
        assert_eq!(config.map.animation_duration, Duration::from_secs(90));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let yaml = "feed:\n  catalog: sats.yaml\n  page_size: 0\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let yaml = "feed:\n  catalog: sats.yaml\nviewport:\n  min_zoom: 9\n  max_zoom: 2\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
