//! # quakemap
//!
//! A small Leaflet-style map engine carrying one application: the last day of
//! USGS earthquakes, colored by depth and sized by magnitude, drawn over
//! tectonic plate boundaries on a choice of three background tile sets.
//!
//! The engine is headless at its core: layers render into a
//! [`rendering::context::RenderContext`] draw queue, and the `egui` feature
//! paints that queue in a widget together with the layer control and legend.

pub mod core;
pub mod data;
pub mod layers;
pub mod rendering;
pub mod runtime;
pub mod symbology;
pub mod ui;

pub mod prelude;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::QuakeMapConfig,
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::Map,
    viewport::Viewport,
};

pub use data::{
    earthquake::Earthquake,
    feed::{FeedEvent, FeedKind, FeedLoader, FeedOutcome, FeedSource, FeedStatus},
    geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry},
};

pub use layers::{
    base::LayerTrait, manager::LayerManager, tile::TileLayer, vector::VectorLayer,
};

pub use symbology::{depth_color, magnitude_radius, DepthBucket, DepthColor};

pub use rendering::context::{DrawCommand, RenderContext};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Tile decode error: {0}")]
    TileDecode(#[from] image::ImageError),
}

/// Error type alias for convenience
pub type Error = MapError;
