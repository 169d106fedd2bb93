use crate::core::geo::LatLng;
use crate::data::geojson::GeoJsonFeature;
use serde::{Deserialize, Serialize};

/// One event from the USGS summary feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Earthquake {
    pub id: Option<String>,
    pub position: LatLng,
    /// Hypocentre depth in km, the third ordinate of the location
    pub depth: Option<f64>,
    /// `properties.mag`; USGS publishes `null` for some events
    pub magnitude: Option<f64>,
    pub place: Option<String>,
    /// Origin time, milliseconds since the Unix epoch
    pub time: Option<i64>,
    pub url: Option<String>,
}

impl Earthquake {
    /// Reads an earthquake from a feature. Only Point geometries qualify.
    pub fn from_feature(feature: &GeoJsonFeature) -> Option<Self> {
        let coordinates = feature.geometry.as_ref()?.point()?;
        let position = LatLng::from_position(coordinates)?;

        let id = feature.id.as_ref().map(|id| match id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        Some(Self {
            id,
            position,
            depth: coordinates.get(2).copied(),
            magnitude: feature.number_property("mag"),
            place: feature.string_property("place").map(str::to_owned),
            time: feature.property("time").and_then(|t| t.as_i64()),
            url: feature.string_property("url").map(str::to_owned),
        })
    }

    /// Popup lines: magnitude, depth and location
    pub fn popup_lines(&self) -> Vec<(String, String)> {
        vec![
            ("Magnitude".to_string(), display_or_unknown(self.magnitude)),
            ("Depth".to_string(), display_or_unknown(self.depth)),
            (
                "Location".to_string(),
                self.place.clone().unwrap_or_else(|| "unknown".to_string()),
            ),
        ]
    }

    pub fn popup_text(&self) -> String {
        self.popup_lines()
            .into_iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn display_or_unknown(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geojson::GeoJsonGeometry;
    use serde_json::json;

    fn feature(coordinates: Vec<f64>, properties: serde_json::Value) -> GeoJsonFeature {
        GeoJsonFeature::from_geometry(GeoJsonGeometry::Point { coordinates })
            .with_properties(properties)
    }

    #[test]
    fn test_from_feature() {
        let mut f = feature(
            vec![-155.28, 19.40, 35.0],
            json!({ "mag": 4, "place": "5 km S of Volcano, Hawaii", "time": 1_700_000_000_000_i64 }),
        );
        f.id = Some(json!("hv74000001"));

        let quake = Earthquake::from_feature(&f).unwrap();
        assert_eq!(quake.id.as_deref(), Some("hv74000001"));
        assert_eq!(quake.position, LatLng::new(19.40, -155.28));
        assert_eq!(quake.depth, Some(35.0));
        assert_eq!(quake.magnitude, Some(4.0));
        assert_eq!(quake.time, Some(1_700_000_000_000));
    }

    #[test]
    fn test_missing_values() {
        let quake = Earthquake::from_feature(&feature(vec![10.0, 20.0], json!({ "mag": null })))
            .unwrap();
        assert_eq!(quake.depth, None);
        assert_eq!(quake.magnitude, None);
        assert_eq!(quake.place, None);
    }

    #[test]
    fn test_non_point_rejected() {
        let line = GeoJsonFeature::from_geometry(GeoJsonGeometry::LineString {
            coordinates: vec![vec![0.0, 0.0], vec![1.0, 1.0]],
        });
        assert!(Earthquake::from_feature(&line).is_none());
    }

    #[test]
    fn test_popup_text() {
        let quake = Earthquake::from_feature(&feature(
            vec![-117.6, 35.7, 7.5],
            json!({ "mag": 2.1, "place": "Ridgecrest, CA" }),
        ))
        .unwrap();
        assert_eq!(
            quake.popup_text(),
            "Magnitude: 2.1\nDepth: 7.5\nLocation: Ridgecrest, CA"
        );
    }
}
