//! Configuration for the earthquake map
//!
//! Every field has a default taken from [`crate::core::constants`], so an empty
//! JSON object (or no file at all) yields the stock map.

use crate::core::constants::{
    DEFAULT_CENTER, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TILE_CACHE_SIZE, DEFAULT_ZOOM,
    EARTHQUAKE_FEED_URL, MAX_ZOOM, TECTONIC_PLATES_URL,
};
use crate::core::geo::LatLng;
use crate::data::feed::FeedSource;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Where the two overlays get their data from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub earthquakes: FeedSource,
    pub tectonic_plates: FeedSource,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            earthquakes: FeedSource::Url(EARTHQUAKE_FEED_URL.to_string()),
            tectonic_plates: FeedSource::Url(TECTONIC_PLATES_URL.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuakeMapConfig {
    pub center: LatLng,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub feeds: FeedsConfig,
    pub request_timeout_secs: u64,
    pub tile_cache_size: usize,
    /// Download background tiles. Off for headless runs.
    pub fetch_tiles: bool,
}

impl Default for QuakeMapConfig {
    fn default() -> Self {
        Self {
            center: LatLng::from(DEFAULT_CENTER),
            zoom: DEFAULT_ZOOM,
            min_zoom: 1.0,
            max_zoom: MAX_ZOOM,
            feeds: FeedsConfig::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            tile_cache_size: DEFAULT_TILE_CACHE_SIZE,
            fetch_tiles: true,
        }
    }
}

impl QuakeMapConfig {
    /// Preset for tests and batch use: no tile traffic
    pub fn headless() -> Self {
        Self {
            fetch_tiles: false,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::info!("loaded configuration from {}", path.display());
        Self::from_json_str(&text)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.center.is_valid() {
            return Err(MapError::Config(format!(
                "center ({}, {}) is not a valid coordinate",
                self.center.lat, self.center.lng
            )));
        }
        if !(0.0..=MAX_ZOOM).contains(&self.min_zoom) || self.min_zoom > self.max_zoom {
            return Err(MapError::Config(format!(
                "zoom range {}..{} is invalid",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.max_zoom > MAX_ZOOM {
            return Err(MapError::Config(format!(
                "max_zoom {} exceeds {}",
                self.max_zoom, MAX_ZOOM
            )));
        }
        if !(self.min_zoom..=self.max_zoom).contains(&self.zoom) {
            return Err(MapError::Config(format!(
                "zoom {} outside {}..{}",
                self.zoom, self.min_zoom, self.max_zoom
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(MapError::Config(
                "request_timeout_secs must be positive".into(),
            ));
        }
        if self.tile_cache_size == 0 {
            return Err(MapError::Config("tile_cache_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = QuakeMapConfig::default();
        assert_eq!(config.center, LatLng::new(36.7783, -119.4179));
        assert_eq!(config.zoom, 5.0);
        assert_eq!(
            config.feeds.earthquakes,
            FeedSource::Url(EARTHQUAKE_FEED_URL.to_string())
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_is_default() {
        let config = QuakeMapConfig::from_json_str("{}").unwrap();
        assert_eq!(config, QuakeMapConfig::default());
    }

    #[test]
    fn test_round_trip() {
        let config = QuakeMapConfig::headless();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(QuakeMapConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_partial_override() {
        let config = QuakeMapConfig::from_json_str(
            r#"{ "zoom": 3, "feeds": { "earthquakes": { "file": "day.geojson" } } }"#,
        )
        .unwrap();
        assert_eq!(config.zoom, 3.0);
        assert_eq!(config.feeds.earthquakes, FeedSource::File("day.geojson".into()));
        assert_eq!(
            config.feeds.tectonic_plates,
            FeedSource::Url(TECTONIC_PLATES_URL.to_string())
        );
    }

    #[test]
    fn test_rejects_bad_zoom() {
        let err = QuakeMapConfig::from_json_str(r#"{ "zoom": 40 }"#).unwrap_err();
        assert!(matches!(err, MapError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = QuakeMapConfig::from_json_str(r#"{ "request_timeout_secs": 0 }"#).unwrap_err();
        assert!(matches!(err, MapError::Config(ref m) if m.contains("request_timeout_secs")));
        assert!(QuakeMapConfig::from_json_str(r#"{ "request_timeout_secs": 1 }"#).is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quakemap.json");
        std::fs::write(&path, r#"{ "fetch_tiles": false }"#).unwrap();
        let config = QuakeMapConfig::from_json_file(&path).unwrap();
        assert!(!config.fetch_tiles);
    }
}
