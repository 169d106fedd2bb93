use crate::core::geo::{LatLng, LatLngBounds};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// A GeoJSON position: `[lng, lat]` or `[lng, lat, elevation/depth, ...]`
pub type Position = Vec<f64>;

/// GeoJSON geometry objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureTag {
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureCollectionTag {
    FeatureCollection,
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(rename = "type")]
    pub tag: FeatureTag,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub tag: FeatureCollectionTag,
    pub features: Vec<GeoJsonFeature>,
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeoJson {
    FeatureCollection(FeatureCollection),
    Feature(GeoJsonFeature),
    Geometry(GeoJsonGeometry),
}

impl std::str::FromStr for GeoJson {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| MapError::ParseError(format!("Invalid GeoJSON: {}", e)))
    }
}

impl GeoJson {
    /// Flattens the document into features. Bare geometries are wrapped.
    pub fn into_features(self) -> Vec<GeoJsonFeature> {
        match self {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(geometry) => vec![GeoJsonFeature::from_geometry(geometry)],
        }
    }

    pub fn empty_collection() -> Self {
        GeoJson::FeatureCollection(FeatureCollection {
            tag: FeatureCollectionTag::FeatureCollection,
            features: Vec::new(),
        })
    }
}

impl GeoJsonFeature {
    pub fn from_geometry(geometry: GeoJsonGeometry) -> Self {
        Self {
            tag: FeatureTag::Feature,
            id: None,
            geometry: Some(geometry),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = properties {
            self.properties = Some(map);
        }
        self
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.as_ref()?.get(key)
    }

    /// Numeric property; `null` and non-numbers read as `None`
    pub fn number_property(&self, key: &str) -> Option<f64> {
        self.property(key)?.as_f64()
    }

    pub fn string_property(&self, key: &str) -> Option<&str> {
        self.property(key)?.as_str()
    }
}

impl GeoJsonGeometry {
    /// The position of a Point geometry
    pub fn point(&self) -> Option<&[f64]> {
        match self {
            GeoJsonGeometry::Point { coordinates } => Some(coordinates),
            _ => None,
        }
    }

    /// Every ring and line as a coordinate path, for outline rendering.
    /// Points contribute nothing.
    pub fn paths(&self) -> Vec<Vec<LatLng>> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths(&self, out: &mut Vec<Vec<LatLng>>) {
        match self {
            GeoJsonGeometry::Point { .. } | GeoJsonGeometry::MultiPoint { .. } => {}
            GeoJsonGeometry::LineString { coordinates } => out.push(to_path(coordinates)),
            GeoJsonGeometry::MultiLineString { coordinates }
            | GeoJsonGeometry::Polygon { coordinates } => {
                out.extend(coordinates.iter().map(|line| to_path(line)));
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => {
                for polygon in coordinates {
                    out.extend(polygon.iter().map(|ring| to_path(ring)));
                }
            }
            GeoJsonGeometry::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.collect_paths(out);
                }
            }
        }
    }

    /// Rings of every polygon (exterior first), for filling.
    /// Lines and points contribute nothing.
    pub fn polygons(&self) -> Vec<Vec<Vec<LatLng>>> {
        match self {
            GeoJsonGeometry::Polygon { coordinates } => {
                vec![coordinates.iter().map(|ring| to_path(ring)).collect()]
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .map(|polygon| polygon.iter().map(|ring| to_path(ring)).collect())
                .collect(),
            GeoJsonGeometry::GeometryCollection { geometries } => {
                geometries.iter().flat_map(|g| g.polygons()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// All coordinates of the geometry, in document order
    pub fn lat_lngs(&self) -> Vec<LatLng> {
        match self {
            GeoJsonGeometry::Point { coordinates } => {
                LatLng::from_position(coordinates).into_iter().collect()
            }
            GeoJsonGeometry::MultiPoint { coordinates } => to_path(coordinates),
            _ => self.paths().into_iter().flatten().collect(),
        }
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        LatLngBounds::from_points(self.lat_lngs().iter())
    }
}

fn to_path(positions: &[Position]) -> Vec<LatLng> {
    positions
        .iter()
        .filter_map(|p| LatLng::from_position(p))
        .collect()
}
