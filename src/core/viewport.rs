use crate::core::constants::{MAX_ZOOM, TILE_SIZE};
use crate::core::geo::{LatLng, LatLngBounds, Point, TileCoord, EARTH_RADIUS};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, MAX_ZOOM),
            size,
            min_zoom: 0.0,
            max_zoom: MAX_ZOOM,
        }
    }

    pub fn set_center(&mut self, center: LatLng) {
        self.center = LatLng::new(LatLng::clamp_lat(center.lat), LatLng::wrap_lng(center.lng));
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    /// Width of the whole world in pixels at `zoom`
    pub fn world_size(zoom: f64) -> f64 {
        TILE_SIZE as f64 * 2_f64.powf(zoom)
    }

    /// Projects a LatLng to world pixel coordinates (Web Mercator, EPSG:3857)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        Self::project_at(lat_lng, zoom.unwrap_or(self.zoom))
    }

    /// [`Viewport::project`] for an explicit zoom, without a view
    pub fn project_at(lat_lng: &LatLng, zoom: f64) -> Point {
        let scale = Self::world_size(zoom);
        let lat = LatLng::clamp_lat(lat_lng.lat).to_radians();

        let x = lat_lng.lng.to_radians() * EARTH_RADIUS;
        let y = (PI / 4.0 + lat / 2.0).tan().ln() * EARTH_RADIUS;

        let circumference = 2.0 * PI * EARTH_RADIUS;
        Point::new(
            (x + PI * EARTH_RADIUS) / circumference * scale,
            (PI * EARTH_RADIUS - y) / circumference * scale,
        )
    }

    /// Inverse of [`Viewport::project`]
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let scale = Self::world_size(zoom.unwrap_or(self.zoom));
        let circumference = 2.0 * PI * EARTH_RADIUS;

        let x = pixel.x / scale * circumference - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - pixel.y / scale * circumference;

        let lng = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        LatLng::new(lat, lng)
    }

    /// World pixel of the top-left corner of the viewport
    fn pixel_origin(&self) -> Point {
        self.project(&self.center, None)
            .subtract(&self.size.multiply(0.5))
    }

    /// Geographic coordinate to container (screen) pixel
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        self.project(lat_lng, None).subtract(&self.pixel_origin())
    }

    /// Screen pixel of a world pixel projected at `world_zoom`
    pub fn world_to_pixel(&self, world: &Point, world_zoom: f64) -> Point {
        world
            .multiply(2_f64.powf(self.zoom - world_zoom))
            .subtract(&self.pixel_origin())
    }

    /// Container (screen) pixel to geographic coordinate
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        self.unproject(&pixel.add(&self.pixel_origin()), None)
    }

    /// Moves the view by a screen-space delta (drag semantics: content follows the pointer)
    pub fn pan_by(&mut self, delta: Point) {
        let center_px = self.project(&self.center, None).subtract(&delta);
        let center = self.unproject(&center_px, None);
        self.set_center(center);
    }

    /// Zooms so that the geographic point under `anchor` stays under it
    pub fn zoom_around(&mut self, anchor: Point, new_zoom: f64) {
        let anchor_geo = self.pixel_to_lat_lng(&anchor);
        self.set_zoom(new_zoom);

        let offset = anchor.subtract(&self.size.multiply(0.5));
        let center_px = self.project(&anchor_geo, None).subtract(&offset);
        let center = self.unproject(&center_px, None);
        self.set_center(center);
    }

    /// Geographic bounds of the visible area
    pub fn bounds(&self) -> LatLngBounds {
        self.padded_bounds(0.0)
    }

    /// Geographic bounds of the visible area grown by `margin` pixels on every side
    pub fn padded_bounds(&self, margin: f64) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(-margin, -margin));
        let se = self.pixel_to_lat_lng(&Point::new(self.size.x + margin, self.size.y + margin));
        LatLngBounds::from_coords(se.lat, nw.lng, nw.lat, se.lng)
    }

    /// Tiles covering the visible area at `zoom`, paired with their screen rectangle
    pub fn visible_tiles(&self, zoom: u8) -> Vec<(TileCoord, (Point, Point))> {
        let tile_size = TILE_SIZE as f64;
        let zoom_f = zoom as f64;
        // Screen scale of one tile when the view is between integer zooms
        let tile_scale = 2_f64.powf(self.zoom - zoom_f);
        let rendered = tile_size * tile_scale;

        let center_px = self.project(&self.center, Some(zoom_f));
        let half = self.size.multiply(0.5 / tile_scale);
        let top_left = center_px.subtract(&half);
        let bottom_right = center_px.add(&half);

        let max_tile = TileCoord::tiles_per_axis(zoom) as i64;
        let min_x = (top_left.x / tile_size).floor() as i64;
        let max_x = (bottom_right.x / tile_size).floor() as i64;
        let min_y = ((top_left.y / tile_size).floor() as i64).max(0);
        let max_y = ((bottom_right.y / tile_size).floor() as i64).min(max_tile - 1);

        let mut tiles = Vec::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                // Wrap horizontally so the world repeats east-west
                let wrapped_x = x.rem_euclid(max_tile) as u32;
                let screen_min = Point::new(
                    (x as f64 * tile_size - top_left.x) * tile_scale,
                    (y as f64 * tile_size - top_left.y) * tile_scale,
                );
                let screen_max = Point::new(screen_min.x + rendered, screen_min.y + rendered);
                tiles.push((TileCoord::new(wrapped_x, y as u32, zoom), (screen_min, screen_max)));
            }
        }
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(LatLng::new(36.7783, -119.4179), 5.0, Point::new(800.0, 600.0))
    }

    #[test]
    fn test_center_projects_to_middle() {
        let vp = viewport();
        let px = vp.lat_lng_to_pixel(&vp.center);
        assert!((px.x - 400.0).abs() < 1e-6);
        assert!((px.y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_project_unproject() {
        let vp = viewport();
        let original = LatLng::new(-33.8688, 151.2093);
        let back = vp.unproject(&vp.project(&original, None), None);
        assert!((back.lat - original.lat).abs() < 1e-9);
        assert!((back.lng - original.lng).abs() < 1e-9);
    }

    #[test]
    fn test_pan_moves_center() {
        let mut vp = viewport();
        let before = vp.center;
        // Drag content to the right: view moves west
        vp.pan_by(Point::new(100.0, 0.0));
        assert!(vp.center.lng < before.lng);
        assert!((vp.center.lat - before.lat).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_around_keeps_anchor() {
        let mut vp = viewport();
        let anchor = Point::new(200.0, 150.0);
        let geo = vp.pixel_to_lat_lng(&anchor);
        vp.zoom_around(anchor, 6.0);
        let px = vp.lat_lng_to_pixel(&geo);
        assert_eq!(vp.zoom, 6.0);
        assert!((px.x - anchor.x).abs() < 1e-6);
        assert!((px.y - anchor.y).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = viewport();
        vp.set_zoom_limits(1.0, 16.0);
        vp.set_zoom(25.0);
        assert_eq!(vp.zoom, 16.0);
    }

    #[test]
    fn test_visible_tiles_cover_viewport() {
        let vp = viewport();
        let tiles = vp.visible_tiles(5);
        // 800x600 at exact zoom needs at least 4x3 tiles
        assert!(tiles.len() >= 12);
        assert!(tiles.iter().all(|(coord, _)| coord.is_valid()));
        let (_, (min, max)) = tiles[0];
        assert!((max.x - min.x - 256.0).abs() < 1e-9);
        assert!(min.x <= 0.0 && min.y <= 0.0);
    }

    #[test]
    fn test_bounds_contain_center() {
        let vp = viewport();
        assert!(vp.bounds().contains(&vp.center));
    }

    #[test]
    fn test_padded_bounds_grow() {
        let vp = viewport();
        let plain = vp.bounds();
        let padded = vp.padded_bounds(64.0);
        assert!(padded.north_east.lat > plain.north_east.lat);
        assert!(padded.south_west.lng < plain.south_west.lng);
    }

    #[test]
    fn test_world_to_pixel_matches_projection() {
        let vp = viewport();
        let place = LatLng::new(37.0, -118.0);
        let from_world = vp.world_to_pixel(&Viewport::project_at(&place, 0.0), 0.0);
        let direct = vp.lat_lng_to_pixel(&place);
        assert!((from_world.x - direct.x).abs() < 1e-6);
        assert!((from_world.y - direct.y).abs() < 1e-6);
    }
}
