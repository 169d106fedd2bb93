//! Prelude module for common quakemap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use quakemap::prelude::*;`

pub use crate::core::{
    config::{FeedsConfig, QuakeMapConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{Map, MapOptions},
    viewport::Viewport,
};

pub use crate::data::{
    earthquake::Earthquake,
    feed::{FeedEvent, FeedKind, FeedLoader, FeedOutcome, FeedSource, FeedStatus},
    geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry},
};

pub use crate::layers::{
    base::{LayerProperties, LayerRole, LayerTrait, LayerType},
    manager::LayerManager,
    vector::{
        CircleMarker, FillStyle, LineStyle, PathStyle, SerializableColor, VectorFeature,
        VectorLayer,
    },
};

pub use crate::layers::tile::{
    cache::TileCache,
    loader::{TileImage, TileLoader},
    source::{TileSource, UrlTemplateSource},
    TileLayer,
};

pub use crate::rendering::context::{DrawCommand, RenderContext};

pub use crate::runtime::{spawn, AsyncHandle};

pub use crate::symbology::{depth_color, magnitude_radius, DepthBucket, DepthColor};

pub use crate::ui::{
    legend::{Legend, LegendEntry},
    popup::Popup,
    Position,
};

#[cfg(feature = "egui")]
pub use crate::ui::{
    controls::LayerControl,
    widget::{MapWidget, MapWidgetExt},
};

pub use crate::{Error as MapError, Result};

pub use std::{
    pin::Pin,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::Future;
