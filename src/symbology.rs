//! Depth and magnitude symbology for earthquake markers.
//!
//! Depth picks one of six fixed colors by threshold; magnitude scales the
//! marker radius linearly. The same thresholds drive the legend.

use crate::core::constants::{DEPTH_THRESHOLDS, RADIUS_PER_MAGNITUDE};
use crate::layers::vector::{FillStyle, LineStyle, PathStyle, SerializableColor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthColor {
    Red,
    OrangeRed,
    DarkOrange,
    Orange,
    Yellow,
    SpringGreen,
}

impl DepthColor {
    /// Classifies a depth in km. Boundaries belong to the shallower bucket and
    /// anything not above 10 (including NaN) falls through to springgreen.
    pub fn for_depth(depth: f64) -> Self {
        if depth > 90.0 {
            Self::Red
        } else if depth > 70.0 {
            Self::OrangeRed
        } else if depth > 50.0 {
            Self::DarkOrange
        } else if depth > 30.0 {
            Self::Orange
        } else if depth > 10.0 {
            Self::Yellow
        } else {
            Self::SpringGreen
        }
    }

    /// CSS color keyword
    pub fn css_name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::OrangeRed => "orangered",
            Self::DarkOrange => "darkorange",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::SpringGreen => "springgreen",
        }
    }

    pub fn rgb(&self) -> SerializableColor {
        match self {
            Self::Red => SerializableColor::rgb(255, 0, 0),
            Self::OrangeRed => SerializableColor::rgb(255, 69, 0),
            Self::DarkOrange => SerializableColor::rgb(255, 140, 0),
            Self::Orange => SerializableColor::rgb(255, 165, 0),
            Self::Yellow => SerializableColor::rgb(255, 255, 0),
            Self::SpringGreen => SerializableColor::rgb(0, 255, 127),
        }
    }
}

impl std::fmt::Display for DepthColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.css_name())
    }
}

/// Color for an optional depth; a missing depth classifies like NaN
pub fn depth_color(depth: Option<f64>) -> DepthColor {
    DepthColor::for_depth(depth.unwrap_or(f64::NAN))
}

/// Marker radius in pixels. Not clamped: negative magnitudes give negative radii.
pub fn magnitude_radius(magnitude: f64) -> f64 {
    magnitude * RADIUS_PER_MAGNITUDE
}

/// One legend band, starting at `threshold`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBucket {
    pub threshold: f64,
    /// Start of the next band, `None` for the open-ended deepest one
    pub upper: Option<f64>,
}

impl DepthBucket {
    /// The six fixed bands in ascending order
    pub fn all() -> Vec<DepthBucket> {
        DEPTH_THRESHOLDS
            .iter()
            .enumerate()
            .map(|(i, &threshold)| DepthBucket {
                threshold,
                upper: DEPTH_THRESHOLDS.get(i + 1).copied(),
            })
            .collect()
    }

    /// Color of the band, sampled just inside its lower edge
    pub fn color(&self) -> DepthColor {
        DepthColor::for_depth(self.threshold + 1.0)
    }

    /// Human label, e.g. `10–30` or `90+`
    pub fn label(&self) -> String {
        match self.upper {
            Some(upper) => format!("{}\u{2013}{}", self.threshold, upper),
            None => format!("{}+", self.threshold),
        }
    }
}

/// Circle marker style for an earthquake
pub fn earthquake_style(magnitude: Option<f64>, depth: Option<f64>) -> PathStyle {
    PathStyle {
        color: SerializableColor::rgb(0, 0, 0),
        fill_color: depth_color(depth).rgb(),
        radius: magnitude_radius(magnitude.unwrap_or(0.0)) as f32,
        weight: 0.5,
        opacity: 0.6,
        fill_opacity: 0.5,
    }
}

/// CSS "green"
const PLATE_GREEN: SerializableColor = SerializableColor {
    r: 0,
    g: 128,
    b: 0,
    a: 255,
};

/// Outline style for tectonic plate boundaries
pub fn plate_style() -> LineStyle {
    LineStyle {
        color: PLATE_GREEN,
        width: 1.0,
        opacity: 1.0,
    }
}

/// Faint interior shading of plate polygons, in the stroke color
pub fn plate_fill() -> FillStyle {
    FillStyle {
        color: PLATE_GREEN,
        opacity: 0.2,
    }
}
