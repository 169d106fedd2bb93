//! Core constants: Leaflet defaults plus the fixed parameters of the earthquake map.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Hard upper zoom bound shared by the viewport and tile sources.
pub const MAX_ZOOM: f64 = 19.0;

/// Programmatic +/- zoom step when calling `zoom_in/zoom_out`.
pub const DEFAULT_ZOOM_DELTA: f64 = 1.0;

/// Initial map centre (California).
pub const DEFAULT_CENTER: (f64, f64) = (36.7783, -119.4179);

/// Initial zoom level.
pub const DEFAULT_ZOOM: f64 = 5.0;

/// USGS summary feed: all earthquakes in the past day.
pub const EARTHQUAKE_FEED_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson";

/// PB2002 plate boundaries.
pub const TECTONIC_PLATES_URL: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_plates.json";

/// Depth bucket thresholds, ascending. Shared by the classifier and the legend.
pub const DEPTH_THRESHOLDS: [f64; 6] = [-10.0, 10.0, 30.0, 50.0, 70.0, 90.0];

/// Marker radius in pixels per unit of magnitude.
pub const RADIUS_PER_MAGNITUDE: f64 = 5.0;

/// Per-request timeout for feed and tile downloads.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Tiles held in memory per tile layer.
pub const DEFAULT_TILE_CACHE_SIZE: usize = 512;

/// Layer ids of the two overlays.
pub const TECTONIC_PLATES_LAYER_ID: &str = "tectonic_plates";
pub const EARTHQUAKES_LAYER_ID: &str = "earthquakes";

/// Layer ids of the three base layers; the first is selected initially.
pub const DEFAULT_BASE_LAYER_ID: &str = "default";
pub const WATERCOLOR_LAYER_ID: &str = "watercolor";
pub const WORLD_IMAGERY_LAYER_ID: &str = "world_imagery";
