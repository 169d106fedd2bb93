//! Background tile layer

use super::{TileCache, TileLoader, TileLoaderConfig, TileSource, TileState, UrlTemplateSource};
use crate::{
    core::{geo::TileCoord, viewport::Viewport},
    layers::base::{LayerProperties, LayerRole, LayerTrait, LayerType},
    rendering::context::RenderContext,
    Result,
};

/// A slippy-map base layer drawing tiles from a [`TileSource`]
pub struct TileLayer {
    pub(crate) properties: LayerProperties,
    source: Box<dyn TileSource>,
    cache: TileCache,
    loader: TileLoader,
    /// When false only already-cached tiles are drawn
    fetch_enabled: bool,
}

impl TileLayer {
    pub fn new(id: String, name: String, source: Box<dyn TileSource>, cache_size: usize) -> Self {
        let mut properties = LayerProperties::new(id, name, LayerType::Tile, LayerRole::Base);
        properties.attribution = source.attribution().map(str::to_owned);

        Self {
            properties,
            source,
            cache: TileCache::new(cache_size),
            loader: TileLoader::new(TileLoaderConfig::default()),
            fetch_enabled: true,
        }
    }

    pub fn with_fetch(mut self, enabled: bool) -> Self {
        self.fetch_enabled = enabled;
        self
    }

    /// OpenStreetMap standard tiles
    pub fn openstreetmap(id: String, name: String, cache_size: usize) -> Self {
        Self::new(id, name, Box::new(UrlTemplateSource::openstreetmap()), cache_size)
    }

    pub fn stadia_watercolor(id: String, name: String, cache_size: usize) -> Self {
        Self::new(id, name, Box::new(UrlTemplateSource::stadia_watercolor()), cache_size)
    }

    pub fn esri_world_imagery(id: String, name: String, cache_size: usize) -> Self {
        Self::new(id, name, Box::new(UrlTemplateSource::esri_world_imagery()), cache_size)
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TileCache {
        &mut self.cache
    }

    /// Tile zoom for a view: the nearest integer zoom, capped at the source's
    /// maximum. `None` below the source's minimum, where nothing is drawn.
    pub fn tile_zoom(&self, viewport: &Viewport) -> Option<u8> {
        let zoom = viewport.zoom.round().max(0.0);
        if zoom < self.source.min_zoom() as f64 {
            return None;
        }
        Some((zoom as u8).min(self.source.max_zoom()))
    }

    /// Moves finished downloads into the cache
    fn process_tile_results(&mut self) {
        for result in self.loader.drain() {
            match result.image {
                Ok(image) => self.cache.insert(result.coord, image),
                Err(_) => self.cache.mark_failed(result.coord),
            }
        }
    }

    fn request_tile(&mut self, coord: TileCoord) {
        if !self.fetch_enabled {
            return;
        }
        let url = self.source.url(coord);
        if self.loader.request(coord, url) {
            self.cache.mark_loading(coord);
        }
    }
}

impl LayerTrait for TileLayer {
    crate::impl_layer_trait!(TileLayer, properties);

    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let Some(zoom) = self.tile_zoom(viewport) else {
            return Ok(());
        };

        for (coord, bounds) in viewport.visible_tiles(zoom) {
            let state = self.cache.get(&coord).cloned();
            match state {
                Some(TileState::Ready(image)) => {
                    context.render_tile(
                        &self.properties.id,
                        coord,
                        image,
                        bounds,
                        self.properties.opacity,
                    )?;
                }
                Some(TileState::Loading) | Some(TileState::Failed) => {}
                None => self.request_tile(coord),
            }
        }
        Ok(())
    }

    fn update(&mut self, _delta_time: f64) -> Result<()> {
        self.process_tile_results();
        Ok(())
    }

    fn is_loading(&self) -> bool {
        self.loader.in_flight() > 0
    }
}
