use crate::{
    core::{
        config::{FeedsConfig, QuakeMapConfig},
        constants::{
            DEFAULT_BASE_LAYER_ID, DEFAULT_ZOOM_DELTA, EARTHQUAKES_LAYER_ID,
            TECTONIC_PLATES_LAYER_ID, WATERCOLOR_LAYER_ID, WORLD_IMAGERY_LAYER_ID,
        },
        geo::{LatLng, Point},
        viewport::Viewport,
    },
    data::{
        earthquake::Earthquake,
        feed::{
            load_feed, spawn_feed, DocumentFetcher, FeedEvent, FeedKind, FeedLoader, FeedOutcome,
            FeedStatus,
        },
    },
    layers::{
        base::{LayerRole, LayerTrait},
        manager::LayerManager,
        tile::TileLayer,
        vector::{CircleMarker, VectorLayer},
    },
    prelude::HashMap,
    rendering::context::RenderContext,
    symbology::{earthquake_style, plate_fill, plate_style},
    ui::popup::Popup,
    MapError, Result,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MapOptions {
    pub dragging: bool,
    pub scroll_wheel_zoom: bool,
    pub double_click_zoom: bool,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub attribution_control: bool,
    pub zoom_delta: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            dragging: true,
            scroll_wheel_zoom: true,
            double_click_zoom: true,
            min_zoom: None,
            max_zoom: None,
            attribution_control: true,
            zoom_delta: DEFAULT_ZOOM_DELTA,
        }
    }
}

/// The map context: viewport, layer registry and the feed channel.
///
/// Feed tasks never touch the map. They send a [`FeedEvent`] which is applied
/// on the next [`Map::update`] (or [`Map::poll_feeds`]) on the UI thread.
pub struct Map {
    pub viewport: Viewport,
    layer_manager: LayerManager,
    options: MapOptions,
    fetcher: Arc<dyn DocumentFetcher>,
    feed_tx: Sender<FeedEvent>,
    feed_rx: Receiver<FeedEvent>,
    feed_status: HashMap<FeedKind, FeedStatus>,
}

impl Map {
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        let viewport = Viewport::new(center, zoom, size);
        Self::with_options(viewport, MapOptions::default())
    }

    pub fn with_options(viewport: Viewport, options: MapOptions) -> Self {
        let (feed_tx, feed_rx) = unbounded();

        let mut map = Self {
            viewport,
            layer_manager: LayerManager::new(),
            options,
            fetcher: Arc::new(FeedLoader::new()),
            feed_tx,
            feed_rx,
            feed_status: HashMap::default(),
        };

        if let (Some(min), Some(max)) = (map.options.min_zoom, map.options.max_zoom) {
            map.viewport.set_zoom_limits(min, max);
        }

        map
    }

    /// The earthquake map: three base layers, the plate and earthquake
    /// overlays (both empty until their feeds arrive), centred per `config`
    pub fn earthquake_map(config: &QuakeMapConfig, size: Point) -> Result<Self> {
        config.validate()?;

        let options = MapOptions {
            min_zoom: Some(config.min_zoom),
            max_zoom: Some(config.max_zoom),
            ..MapOptions::default()
        };
        let mut map = Self::with_options(Viewport::new(config.center, config.zoom, size), options)
            .with_fetcher(Arc::new(FeedLoader::with_timeout(config.request_timeout())));

        let cache = config.tile_cache_size;
        let bases = [
            TileLayer::openstreetmap(DEFAULT_BASE_LAYER_ID.into(), "Default".into(), cache),
            TileLayer::stadia_watercolor(WATERCOLOR_LAYER_ID.into(), "Water Color".into(), cache),
            TileLayer::esri_world_imagery(
                WORLD_IMAGERY_LAYER_ID.into(),
                "World Imagery".into(),
                cache,
            ),
        ];
        for layer in bases {
            map.add_layer(Box::new(layer.with_fetch(config.fetch_tiles)))?;
        }

        map.add_layer(Box::new(VectorLayer::new(
            TECTONIC_PLATES_LAYER_ID.into(),
            "Tectonic Plates".into(),
        )))?;
        map.add_layer(Box::new(VectorLayer::new(
            EARTHQUAKES_LAYER_ID.into(),
            "Earthquake Data".into(),
        )))?;

        log::info!(
            "earthquake map ready at ({}, {}) zoom {}",
            config.center.lat,
            config.center.lng,
            config.zoom
        );
        Ok(map)
    }

    /// Replaces the fetcher used by [`Map::start_feeds`] and [`Map::load_feeds`]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Starts both feeds as independent background tasks
    pub fn start_feeds(&mut self, feeds: &FeedsConfig) {
        let sources = [
            (FeedKind::TectonicPlates, feeds.tectonic_plates.clone()),
            (FeedKind::Earthquakes, feeds.earthquakes.clone()),
        ];
        for (kind, source) in sources {
            // Detached: the task reports through the channel and is never cancelled
            let status =
                match spawn_feed(self.fetcher.clone(), kind, source, self.feed_tx.clone()) {
                    Ok(_task) => FeedStatus::Pending,
                    Err(e) => {
                        log::error!("{} feed not started: {}", kind, e);
                        FeedStatus::Failed(e.to_string())
                    }
                };
            self.feed_status.insert(kind, status);
        }
    }

    /// Loads both feeds concurrently and applies them before returning
    pub async fn load_feeds(&mut self, feeds: &FeedsConfig) -> Result<()> {
        self.feed_status.insert(FeedKind::TectonicPlates, FeedStatus::Pending);
        self.feed_status.insert(FeedKind::Earthquakes, FeedStatus::Pending);

        let fetcher = self.fetcher.clone();
        let (plates, quakes) = futures::future::join(
            load_feed(fetcher.as_ref(), FeedKind::TectonicPlates, &feeds.tectonic_plates),
            load_feed(fetcher.as_ref(), FeedKind::Earthquakes, &feeds.earthquakes),
        )
        .await;

        self.apply_all([plates, quakes])
    }

    /// Applies every feed event received so far. Returns how many were applied.
    pub fn poll_feeds(&mut self) -> Result<usize> {
        let events: Vec<FeedEvent> = self.feed_rx.try_iter().collect();
        let count = events.len();
        self.apply_all(events)?;
        Ok(count)
    }

    /// Applies each event even when an earlier one fails; returns the first error
    fn apply_all(&mut self, events: impl IntoIterator<Item = FeedEvent>) -> Result<()> {
        let mut first_error = None;
        for event in events {
            if let Err(e) = self.apply_feed_event(event) {
                log::warn!("{}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Rebuilds the overlay belonging to `event.kind` from its outcome.
    /// A missing overlay marks the feed failed.
    pub fn apply_feed_event(&mut self, event: FeedEvent) -> Result<()> {
        let FeedEvent { kind, outcome } = event;
        let layer_id = kind.layer_id();
        let Some(layer) = self.layer_manager.layer_as_mut::<VectorLayer>(layer_id) else {
            let reason = format!("no overlay '{}' for {} feed", layer_id, kind);
            self.feed_status
                .insert(kind, FeedStatus::Failed(reason.clone()));
            return Err(MapError::Layer(reason));
        };
        layer.clear();

        let status = match outcome {
            FeedOutcome::Loaded(features) => {
                let mut shown = 0;
                match kind {
                    FeedKind::TectonicPlates => {
                        let (stroke, fill) = (plate_style(), plate_fill());
                        for geometry in features.iter().filter_map(|f| f.geometry.as_ref()) {
                            let filled = layer.add_geometry_fill(geometry, &fill);
                            if layer.add_geometry_outline(geometry, &stroke) + filled > 0 {
                                shown += 1;
                            }
                        }
                    }
                    FeedKind::Earthquakes => {
                        for quake in features.iter().filter_map(Earthquake::from_feature) {
                            let marker = CircleMarker::new(
                                quake.position,
                                earthquake_style(quake.magnitude, quake.depth),
                            )
                            .with_popup(quake.popup_text());
                            layer.add_circle_marker(marker);
                            shown += 1;
                        }
                    }
                }
                log::debug!(
                    "{} overlay shows {} of {} features ({} elements)",
                    kind,
                    shown,
                    features.len(),
                    layer.len()
                );
                FeedStatus::Loaded(shown)
            }
            FeedOutcome::Failed { reason } => FeedStatus::Failed(reason),
        };

        self.feed_status.insert(kind, status);
        Ok(())
    }

    /// `Pending` until the feed has reported
    pub fn feed_status(&self, kind: FeedKind) -> FeedStatus {
        self.feed_status
            .get(&kind)
            .cloned()
            .unwrap_or(FeedStatus::Pending)
    }

    pub fn overlay(&self, kind: FeedKind) -> Option<&VectorLayer> {
        self.layer_manager.layer_as::<VectorLayer>(kind.layer_id())
    }

    pub fn earthquake_count(&self) -> usize {
        self.overlay(FeedKind::Earthquakes)
            .map_or(0, |layer| layer.circle_markers().count())
    }

    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        self.layer_manager.add_layer(layer)
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Result<()> {
        self.layer_manager
            .remove_layer(layer_id)
            .map(|_| ())
            .ok_or_else(|| MapError::Layer(format!("no layer '{}'", layer_id)))
    }

    pub fn select_base_layer(&mut self, layer_id: &str) -> Result<()> {
        self.layer_manager.select_base_layer(layer_id)
    }

    pub fn set_overlay_visible(&mut self, layer_id: &str, visible: bool) -> Result<()> {
        self.layer_manager.set_overlay_visible(layer_id, visible)
    }

    pub fn toggle_overlay(&mut self, layer_id: &str) -> Result<bool> {
        self.layer_manager.toggle_overlay(layer_id)
    }

    pub fn active_base_layer(&self) -> Option<&str> {
        self.layer_manager.active_base_layer()
    }

    pub fn layer_manager(&self) -> &LayerManager {
        &self.layer_manager
    }

    pub fn set_view(&mut self, center: LatLng, zoom: f64) -> Result<()> {
        if !center.is_valid() || !zoom.is_finite() {
            return Err(MapError::InvalidCoordinates(format!(
                "cannot view ({}, {}) at zoom {}",
                center.lat, center.lng, zoom
            )));
        }
        self.viewport.set_center(center);
        self.viewport.set_zoom(zoom);
        Ok(())
    }

    pub fn pan_by(&mut self, delta: Point) {
        if self.options.dragging {
            self.viewport.pan_by(delta);
        }
    }

    pub fn zoom_in(&mut self) {
        let zoom = self.viewport.zoom + self.options.zoom_delta;
        self.viewport.set_zoom(zoom);
    }

    pub fn zoom_out(&mut self) {
        let zoom = self.viewport.zoom - self.options.zoom_delta;
        self.viewport.set_zoom(zoom);
    }

    /// Zooms by `delta` keeping the point under `anchor` fixed
    pub fn zoom_around(&mut self, anchor: Point, delta: f64) {
        if self.options.scroll_wheel_zoom {
            let zoom = self.viewport.zoom + delta;
            self.viewport.zoom_around(anchor, zoom);
        }
    }

    pub fn set_size(&mut self, size: Point) {
        self.viewport.set_size(size);
    }

    /// Applies finished feeds and lets layers collect their downloads
    pub fn update(&mut self, delta_time: f64) -> Result<()> {
        self.poll_feeds()?;
        self.layer_manager.update(delta_time)
    }

    /// Fills `context` with this frame's draw commands
    pub fn render(&mut self, context: &mut RenderContext) -> Result<()> {
        context.begin_frame();
        self.layer_manager.render(context, &self.viewport)
    }

    /// Popup of the topmost visible marker under a screen pixel
    pub fn hit_test_popup(&self, pixel: &Point) -> Option<Popup> {
        self.layer_manager
            .layers_with_role(LayerRole::Overlay)
            .into_iter()
            .rev()
            .filter(|layer| layer.is_visible())
            .filter_map(|layer| layer.as_any().downcast_ref::<VectorLayer>())
            .find_map(|layer| layer.hit_test(&self.viewport, pixel))
            .and_then(|marker| {
                let content = marker.popup.clone()?;
                Some(Popup::new(marker.position, content))
            })
    }

    /// Attribution line for the visible layers
    pub fn attribution(&self) -> Option<String> {
        if !self.options.attribution_control {
            return None;
        }
        let parts = self.layer_manager.attributions();
        (!parts.is_empty()).then(|| parts.join(" | "))
    }

    /// True while a started feed has not reported or a visible layer is downloading
    pub fn is_loading(&self) -> bool {
        self.feed_status
            .values()
            .any(|status| matches!(status, FeedStatus::Pending))
            || self.layer_manager.is_loading()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geojson::{GeoJsonFeature, GeoJsonGeometry};
    use crate::rendering::context::DrawCommand;
    use crate::symbology::DepthColor;
    use serde_json::json;

    fn map() -> Map {
        Map::earthquake_map(&QuakeMapConfig::headless(), Point::new(800.0, 600.0)).unwrap()
    }

    fn quake(lng: f64, lat: f64, depth: f64, mag: f64) -> GeoJsonFeature {
        GeoJsonFeature::from_geometry(GeoJsonGeometry::Point {
            coordinates: vec![lng, lat, depth],
        })
        .with_properties(json!({ "mag": mag, "place": "10km N of Somewhere, CA" }))
    }

    fn loaded(kind: FeedKind, features: Vec<GeoJsonFeature>) -> FeedEvent {
        FeedEvent {
            kind,
            outcome: FeedOutcome::Loaded(features),
        }
    }

    #[test]
    fn test_registry_layout() {
        let map = map();
        let manager = map.layer_manager();
        let bases: Vec<_> = manager
            .layers_with_role(LayerRole::Base)
            .iter()
            .map(|l| l.name().to_string())
            .collect();
        assert_eq!(bases, vec!["Default", "Water Color", "World Imagery"]);
        assert_eq!(map.active_base_layer(), Some(DEFAULT_BASE_LAYER_ID));

        for kind in [FeedKind::TectonicPlates, FeedKind::Earthquakes] {
            let overlay = map.overlay(kind).unwrap();
            assert!(overlay.is_visible());
            assert!(overlay.is_empty());
            assert_eq!(map.feed_status(kind), FeedStatus::Pending);
        }
        assert_eq!(map.viewport.center, LatLng::new(36.7783, -119.4179));
        assert_eq!(map.viewport.zoom, 5.0);
    }

    #[test]
    fn test_sample_earthquake_marker() {
        let mut map = map();
        map.apply_feed_event(loaded(
            FeedKind::Earthquakes,
            vec![quake(-119.4, 36.7, 35.0, 4.0)],
        ))
        .unwrap();

        let overlay = map.overlay(FeedKind::Earthquakes).unwrap();
        let marker = overlay.circle_markers().next().unwrap();
        assert_eq!(marker.style.fill_color, DepthColor::Orange.rgb());
        assert_eq!(marker.style.radius, 20.0);
        assert_eq!(marker.style.opacity, 0.6);
        assert_eq!(marker.style.fill_opacity, 0.5);
        assert_eq!(marker.style.weight, 0.5);
        assert_eq!(
            marker.popup.as_deref(),
            Some("Magnitude: 4\nDepth: 35\nLocation: 10km N of Somewhere, CA")
        );
        assert_eq!(map.feed_status(FeedKind::Earthquakes), FeedStatus::Loaded(1));
    }

    #[test]
    fn test_empty_collections_render() {
        let mut map = map();
        map.apply_feed_event(loaded(FeedKind::Earthquakes, Vec::new()))
            .unwrap();
        map.apply_feed_event(loaded(FeedKind::TectonicPlates, Vec::new()))
            .unwrap();

        assert_eq!(map.earthquake_count(), 0);
        assert!(map.overlay(FeedKind::TectonicPlates).unwrap().is_empty());

        let mut ctx = RenderContext::new(800, 600).unwrap();
        map.render(&mut ctx).unwrap();
        assert!(ctx.get_drawing_queue().is_empty());
    }

    #[test]
    fn test_failed_feed_leaves_overlay_empty() {
        let mut map = map();
        map.apply_feed_event(FeedEvent {
            kind: FeedKind::TectonicPlates,
            outcome: FeedOutcome::Failed {
                reason: "HTTP 404 Not Found".into(),
            },
        })
        .unwrap();
        map.apply_feed_event(loaded(
            FeedKind::Earthquakes,
            vec![quake(-118.0, 34.0, 5.0, 1.2)],
        ))
        .unwrap();

        assert!(map.overlay(FeedKind::TectonicPlates).unwrap().is_empty());
        assert!(matches!(
            map.feed_status(FeedKind::TectonicPlates),
            FeedStatus::Failed(ref r) if r.contains("404")
        ));
        assert_eq!(map.earthquake_count(), 1);
    }

    #[test]
    fn test_plates_become_green_outlines() {
        let mut map = map();
        let plate = GeoJsonFeature::from_geometry(GeoJsonGeometry::Polygon {
            coordinates: vec![vec![
                vec![-125.0, 30.0],
                vec![-115.0, 30.0],
                vec![-115.0, 40.0],
                vec![-125.0, 30.0],
            ]],
        });
        let bare = GeoJsonFeature {
            geometry: None,
            ..plate.clone()
        };
        map.apply_feed_event(loaded(FeedKind::TectonicPlates, vec![plate, bare]))
            .unwrap();

        let mut ctx = RenderContext::new(800, 600).unwrap();
        map.render(&mut ctx).unwrap();
        let lines: Vec<_> = ctx
            .get_drawing_queue()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Line { style, closed, .. } => Some((style.clone(), *closed)),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, plate_style());
        assert!(lines[0].1);
    }

    #[test]
    fn test_plate_status_counts_features() {
        let mut map = map();
        let ring = |lng: f64| {
            vec![
                vec![lng, 0.0],
                vec![lng + 2.0, 0.0],
                vec![lng + 2.0, 2.0],
                vec![lng, 0.0],
            ]
        };
        let multi = GeoJsonFeature::from_geometry(GeoJsonGeometry::MultiPolygon {
            coordinates: vec![vec![ring(-120.0)], vec![ring(-110.0)], vec![ring(-100.0)]],
        });
        let point = GeoJsonFeature::from_geometry(GeoJsonGeometry::Point {
            coordinates: vec![-119.0, 36.0],
        });
        map.apply_feed_event(loaded(FeedKind::TectonicPlates, vec![multi, point]))
            .unwrap();

        assert_eq!(map.feed_status(FeedKind::TectonicPlates), FeedStatus::Loaded(1));
        // three fills and three outlines
        assert_eq!(map.overlay(FeedKind::TectonicPlates).unwrap().len(), 6);
    }

    #[test]
    fn test_missing_overlay_fails_only_its_feed() {
        let mut map = map();
        map.remove_layer(TECTONIC_PLATES_LAYER_ID).unwrap();
        map.feed_tx
            .send(loaded(FeedKind::TectonicPlates, Vec::new()))
            .unwrap();
        map.feed_tx
            .send(loaded(
                FeedKind::Earthquakes,
                vec![quake(-119.0, 36.0, 12.0, 2.0)],
            ))
            .unwrap();

        assert!(map.poll_feeds().is_err());
        assert!(matches!(
            map.feed_status(FeedKind::TectonicPlates),
            FeedStatus::Failed(ref r) if r.contains("tectonic_plates")
        ));
        assert_eq!(map.feed_status(FeedKind::Earthquakes), FeedStatus::Loaded(1));
        assert!(!map.is_loading());
        assert_eq!(map.poll_feeds().unwrap(), 0);
    }

    #[test]
    fn test_reload_replaces_markers() {
        let mut map = map();
        let event = loaded(FeedKind::Earthquakes, vec![quake(-119.0, 36.0, 1.0, 2.0)]);
        map.apply_feed_event(event.clone()).unwrap();
        map.apply_feed_event(event).unwrap();
        assert_eq!(map.earthquake_count(), 1);
    }

    #[test]
    fn test_hidden_overlay_not_drawn() {
        let mut map = map();
        map.apply_feed_event(loaded(
            FeedKind::Earthquakes,
            vec![quake(-119.4179, 36.7783, 20.0, 3.0)],
        ))
        .unwrap();
        assert!(!map.toggle_overlay(EARTHQUAKES_LAYER_ID).unwrap());

        let mut ctx = RenderContext::new(800, 600).unwrap();
        map.render(&mut ctx).unwrap();
        assert!(ctx.get_drawing_queue().is_empty());
        assert!(map.hit_test_popup(&Point::new(400.0, 300.0)).is_none());
    }

    #[test]
    fn test_click_opens_popup() {
        let mut map = map();
        map.apply_feed_event(loaded(
            FeedKind::Earthquakes,
            vec![quake(-119.4179, 36.7783, 20.0, 3.0)],
        ))
        .unwrap();

        let popup = map.hit_test_popup(&Point::new(405.0, 300.0)).unwrap();
        assert!(popup.content.starts_with("Magnitude: 3"));
        assert!(map.hit_test_popup(&Point::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_base_switch_changes_attribution() {
        let mut map = map();
        assert!(map.attribution().unwrap().contains("OpenStreetMap"));
        map.select_base_layer(WORLD_IMAGERY_LAYER_ID).unwrap();
        assert!(map.attribution().unwrap().contains("Esri"));
        assert!(map.select_base_layer("satellite").is_err());
    }

    #[test]
    fn test_view_changes() {
        let mut map = map();
        map.zoom_in();
        assert_eq!(map.viewport.zoom, 6.0);
        map.zoom_out();
        map.zoom_out();
        assert_eq!(map.viewport.zoom, 4.0);
        assert!(map
            .set_view(LatLng::new(f64::NAN, 0.0), 3.0)
            .is_err());
        map.set_view(LatLng::new(0.0, 0.0), 2.0).unwrap();
        assert_eq!(map.viewport.center, LatLng::new(0.0, 0.0));
    }

    #[tokio::test]
    async fn test_start_feeds_delivers_through_poll() {
        let dir = tempfile::tempdir().unwrap();
        let plates = dir.path().join("plates.json");
        let quakes = dir.path().join("quakes.json");
        std::fs::write(&plates, r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
        std::fs::write(
            &quakes,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"mag":2.5},"geometry":{"type":"Point","coordinates":[-120,37,8]}}
            ]}"#,
        )
        .unwrap();

        let mut map = map();
        map.start_feeds(&FeedsConfig {
            earthquakes: crate::data::feed::FeedSource::File(quakes),
            tectonic_plates: crate::data::feed::FeedSource::File(plates),
        });

        let mut applied = 0;
        for _ in 0..100 {
            applied += map.poll_feeds().unwrap();
            if applied == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(applied, 2);
        assert_eq!(map.earthquake_count(), 1);
        assert_eq!(map.feed_status(FeedKind::TectonicPlates), FeedStatus::Loaded(0));
    }
}
