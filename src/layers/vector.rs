use crate::{
    core::{
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    data::geojson::GeoJsonGeometry,
    layers::base::{LayerProperties, LayerRole, LayerTrait, LayerType},
    rendering::context::RenderContext,
    Result,
};
use geo::TriangulateEarcut;
use serde::{Deserialize, Serialize};

/// Serializable RGBA color, convertible to `egui::Color32`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with alpha scaled by `opacity`
    pub fn with_opacity(&self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..*self }
    }
}

#[cfg(feature = "egui")]
impl From<egui::Color32> for SerializableColor {
    fn from(color: egui::Color32) -> Self {
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        Self { r, g, b, a }
    }
}

#[cfg(feature = "egui")]
impl From<SerializableColor> for egui::Color32 {
    fn from(color: SerializableColor) -> Self {
        egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
    }
}

/// Leaflet-style path options for a circle marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    /// Stroke color
    pub color: SerializableColor,
    pub fill_color: SerializableColor,
    /// Radius in screen pixels
    pub radius: f32,
    /// Stroke width in pixels
    pub weight: f32,
    /// Stroke opacity
    pub opacity: f32,
    pub fill_opacity: f32,
}

impl Default for PathStyle {
    fn default() -> Self {
        // Leaflet's circleMarker defaults
        Self {
            color: SerializableColor::rgb(0x33, 0x88, 0xff),
            fill_color: SerializableColor::rgb(0x33, 0x88, 0xff),
            radius: 10.0,
            weight: 3.0,
            opacity: 1.0,
            fill_opacity: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: SerializableColor,
    pub width: f32,
    pub opacity: f32,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: SerializableColor::rgb(0x33, 0x88, 0xff),
            width: 3.0,
            opacity: 1.0,
        }
    }
}

/// Polygon interior fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillStyle {
    pub color: SerializableColor,
    pub opacity: f32,
}

impl Default for FillStyle {
    fn default() -> Self {
        // Leaflet's path fill defaults
        Self {
            color: SerializableColor::rgb(0x33, 0x88, 0xff),
            opacity: 0.2,
        }
    }
}

/// A fixed-pixel-radius circle at a geographic position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleMarker {
    pub position: LatLng,
    pub style: PathStyle,
    pub popup: Option<String>,
}

impl CircleMarker {
    pub fn new(position: LatLng, style: PathStyle) -> Self {
        Self {
            position,
            style,
            popup: None,
        }
    }

    pub fn with_popup(mut self, text: impl Into<String>) -> Self {
        self.popup = Some(text.into());
        self
    }

    /// True when `pixel` lies inside the drawn circle
    pub fn contains_pixel(&self, viewport: &Viewport, pixel: &Point) -> bool {
        let radius = self.style.radius as f64;
        radius > 0.0 && viewport.lat_lng_to_pixel(&self.position).distance_to(pixel) <= radius
    }
}

/// Different kinds of vector features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VectorFeature {
    CircleMarker(CircleMarker),
    /// An open line or, when `closed`, a polygon ring
    Path {
        points: Vec<LatLng>,
        closed: bool,
        style: LineStyle,
    },
    /// A triangulated polygon interior. Vertices are world pixels at zoom 0,
    /// where any view is a scale and a shift away.
    Fill {
        vertices: Vec<Point>,
        triangles: Vec<[u32; 3]>,
        style: FillStyle,
    },
}

/// A group of vector features toggled as one overlay
pub struct VectorLayer {
    pub properties: LayerProperties,
    features: Vec<VectorFeature>,
    bounds: Option<LatLngBounds>,
}

impl VectorLayer {
    pub fn new(id: String, name: String) -> Self {
        Self {
            properties: LayerProperties::new(id, name, LayerType::Vector, LayerRole::Overlay),
            features: Vec::new(),
            bounds: None,
        }
    }

    pub fn add_circle_marker(&mut self, marker: CircleMarker) {
        self.grow_bounds(LatLngBounds::new(marker.position, marker.position));
        self.features.push(VectorFeature::CircleMarker(marker));
    }

    /// Adds every line and ring of a GeoJSON geometry as a path.
    /// Returns the number of paths added.
    pub fn add_geometry_outline(&mut self, geometry: &GeoJsonGeometry, style: &LineStyle) -> usize {
        let closed = matches!(
            geometry,
            GeoJsonGeometry::Polygon { .. } | GeoJsonGeometry::MultiPolygon { .. }
        );
        let mut added = 0;
        for points in geometry.paths() {
            if points.len() < 2 {
                continue;
            }
            self.features.push(VectorFeature::Path {
                points,
                closed,
                style: style.clone(),
            });
            added += 1;
        }
        if let Some(bounds) = geometry.bounds().filter(|_| added > 0) {
            self.grow_bounds(bounds);
        }
        added
    }

    /// Adds the interior of every polygon in a GeoJSON geometry.
    /// Returns the number of polygons that produced triangles.
    pub fn add_geometry_fill(&mut self, geometry: &GeoJsonGeometry, style: &FillStyle) -> usize {
        let mut added = 0;
        for rings in geometry.polygons() {
            if let Some((vertices, triangles)) = triangulate(&rings) {
                self.features.push(VectorFeature::Fill {
                    vertices,
                    triangles,
                    style: style.clone(),
                });
                added += 1;
            }
        }
        if let Some(bounds) = geometry.bounds().filter(|_| added > 0) {
            self.grow_bounds(bounds);
        }
        added
    }

    fn grow_bounds(&mut self, other: LatLngBounds) {
        self.bounds = Some(match self.bounds {
            Some(mut bounds) => {
                bounds.extend(&other.south_west);
                bounds.extend(&other.north_east);
                bounds
            }
            None => other,
        });
    }

    pub fn circle_markers(&self) -> impl Iterator<Item = &CircleMarker> {
        self.features.iter().filter_map(|f| match f {
            VectorFeature::CircleMarker(marker) => Some(marker),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.bounds = None;
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Topmost circle marker under a screen pixel (later markers draw on top)
    pub fn hit_test(&self, viewport: &Viewport, pixel: &Point) -> Option<&CircleMarker> {
        self.features.iter().rev().find_map(|f| match f {
            VectorFeature::CircleMarker(marker) if marker.contains_pixel(viewport, pixel) => {
                Some(marker)
            }
            _ => None,
        })
    }
}

impl LayerTrait for VectorLayer {
    crate::impl_layer_trait!(VectorLayer, properties);

    fn bounds(&self) -> Option<LatLngBounds> {
        self.bounds
    }

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let layer_opacity = self.properties.opacity;

        for feature in &self.features {
            match feature {
                VectorFeature::CircleMarker(marker) => {
                    let center = viewport.lat_lng_to_pixel(&marker.position);
                    if layer_opacity < 1.0 {
                        let mut style = marker.style.clone();
                        style.opacity *= layer_opacity;
                        style.fill_opacity *= layer_opacity;
                        context.render_circle(center, &style);
                    } else {
                        context.render_circle(center, &marker.style);
                    }
                }
                VectorFeature::Path {
                    points,
                    closed,
                    style,
                } => {
                    let screen: Vec<Point> =
                        points.iter().map(|p| viewport.lat_lng_to_pixel(p)).collect();
                    let mut style = style.clone();
                    style.opacity *= layer_opacity;
                    context.render_line(screen, &style, *closed);
                }
                VectorFeature::Fill {
                    vertices,
                    triangles,
                    style,
                } => {
                    let screen: Vec<Point> = vertices
                        .iter()
                        .map(|p| viewport.world_to_pixel(p, 0.0))
                        .collect();
                    let mut style = style.clone();
                    style.opacity *= layer_opacity;
                    context.render_fill(screen, triangles, &style);
                }
            }
        }
        Ok(())
    }
}

/// Earcut triangulation of a polygon (exterior ring first) in zoom-0 world pixels
fn triangulate(rings: &[Vec<LatLng>]) -> Option<(Vec<Point>, Vec<[u32; 3]>)> {
    let to_line = |ring: &Vec<LatLng>| -> geo::LineString<f64> {
        ring.iter()
            .map(|p| {
                let world = Viewport::project_at(p, 0.0);
                (world.x, world.y)
            })
            .collect::<Vec<_>>()
            .into()
    };

    let (exterior, interiors) = rings.split_first()?;
    if exterior.len() < 3 {
        return None;
    }
    let holes = interiors.iter().filter(|r| r.len() >= 3).map(to_line).collect();
    let polygon = geo::Polygon::new(to_line(exterior), holes);

    let raw = polygon.earcut_triangles_raw();
    let vertices: Vec<Point> = raw
        .vertices
        .chunks_exact(2)
        .map(|xy| Point::new(xy[0], xy[1]))
        .collect();
    let triangles: Vec<[u32; 3]> = raw
        .triangle_indices
        .chunks_exact(3)
        .map(|t| [t[0] as u32, t[1] as u32, t[2] as u32])
        .collect();

    (!triangles.is_empty()).then_some((vertices, triangles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::context::DrawCommand;

    fn viewport() -> Viewport {
        Viewport::new(LatLng::new(0.0, 0.0), 3.0, Point::new(400.0, 300.0))
    }

    fn marker(lat: f64, lng: f64, radius: f32) -> CircleMarker {
        CircleMarker::new(
            LatLng::new(lat, lng),
            PathStyle {
                radius,
                ..PathStyle::default()
            },
        )
    }

    #[test]
    fn test_new_layer_is_empty_overlay() {
        let layer = VectorLayer::new("quakes".into(), "Earthquake Data".into());
        assert!(layer.is_empty());
        assert_eq!(layer.role(), LayerRole::Overlay);
        assert_eq!(layer.layer_type(), LayerType::Vector);
    }

    #[test]
    fn test_render_emits_circles_and_paths() {
        let mut layer = VectorLayer::new("x".into(), "x".into());
        layer.add_circle_marker(marker(0.0, 0.0, 10.0));
        let ring = GeoJsonGeometry::Polygon {
            coordinates: vec![vec![
                vec![-5.0, -5.0],
                vec![5.0, -5.0],
                vec![5.0, 5.0],
                vec![-5.0, -5.0],
            ]],
        };
        assert_eq!(layer.add_geometry_outline(&ring, &LineStyle::default()), 1);

        let mut ctx = RenderContext::new(400, 300).unwrap();
        layer.render(&mut ctx, &viewport()).unwrap();

        let queue = ctx.get_drawing_queue();
        assert_eq!(queue.len(), 2);
        match &queue[0] {
            DrawCommand::Circle { center, style } => {
                assert!((center.x - 200.0).abs() < 1e-6);
                assert_eq!(style.radius, 10.0);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(matches!(queue[1], DrawCommand::Line { closed: true, .. }));
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut layer = VectorLayer::new("x".into(), "x".into());
        layer.add_circle_marker(marker(0.0, 0.0, 20.0).with_popup("below"));
        layer.add_circle_marker(marker(0.0, 0.0, 5.0).with_popup("above"));

        let vp = viewport();
        let hit = layer.hit_test(&vp, &Point::new(202.0, 150.0)).unwrap();
        assert_eq!(hit.popup.as_deref(), Some("above"));

        let hit = layer.hit_test(&vp, &Point::new(215.0, 150.0)).unwrap();
        assert_eq!(hit.popup.as_deref(), Some("below"));

        assert!(layer.hit_test(&vp, &Point::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_negative_radius_never_hit() {
        let mut layer = VectorLayer::new("x".into(), "x".into());
        layer.add_circle_marker(marker(0.0, 0.0, -5.0));
        assert!(layer.hit_test(&viewport(), &Point::new(200.0, 150.0)).is_none());
    }

    fn square(half: f64) -> GeoJsonGeometry {
        GeoJsonGeometry::Polygon {
            coordinates: vec![vec![
                vec![-half, -half],
                vec![half, -half],
                vec![half, half],
                vec![-half, half],
                vec![-half, -half],
            ]],
        }
    }

    #[test]
    fn test_fill_triangulates_square() {
        let mut layer = VectorLayer::new("plates".into(), "Tectonic Plates".into());
        assert_eq!(layer.add_geometry_fill(&square(5.0), &FillStyle::default()), 1);

        let mut ctx = RenderContext::new(400, 300).unwrap();
        layer.render(&mut ctx, &viewport()).unwrap();
        match &ctx.get_drawing_queue()[0] {
            DrawCommand::Fill {
                points, triangles, ..
            } => {
                assert_eq!(triangles.len(), 2);
                assert!(triangles.iter().flatten().all(|&i| (i as usize) < points.len()));
                // The square is centred on the view
                let cx = points.iter().map(|p| p.x).sum::<f64>() / points.len() as f64;
                assert!((cx - 200.0).abs() < 5.0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_lines_are_not_filled() {
        let mut layer = VectorLayer::new("x".into(), "x".into());
        let line = GeoJsonGeometry::LineString {
            coordinates: vec![vec![0.0, 0.0], vec![3.0, 3.0]],
        };
        assert_eq!(layer.add_geometry_fill(&line, &FillStyle::default()), 0);
        assert!(layer.is_empty());
        assert!(layer.bounds().is_none());
    }

    #[test]
    fn test_bounds_follow_contents() {
        let mut layer = VectorLayer::new("x".into(), "x".into());
        layer.add_circle_marker(marker(40.0, -120.0, 5.0));
        layer.add_geometry_outline(&square(2.0), &LineStyle::default());

        let bounds = layer.bounds().unwrap();
        assert_eq!(bounds.south_west, LatLng::new(-2.0, -120.0));
        assert_eq!(bounds.north_east, LatLng::new(40.0, 2.0));

        layer.clear();
        assert!(layer.bounds().is_none());
    }

    #[test]
    fn test_off_view_layer_is_culled() {
        let mut layer = VectorLayer::new("x".into(), "x".into());
        layer.add_circle_marker(marker(0.0, 0.0, 10.0));

        let far = Viewport::new(LatLng::new(0.0, 100.0), 5.0, Point::new(400.0, 300.0));
        assert!(!layer.intersects_bounds(&far.padded_bounds(64.0)));
        assert!(layer.intersects_bounds(&viewport().padded_bounds(64.0)));
    }

    #[test]
    fn test_color_opacity() {
        let c = SerializableColor::rgb(255, 165, 0).with_opacity(0.5);
        assert_eq!(c.a, 128);
    }
}
