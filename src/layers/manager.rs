use crate::{
    core::viewport::Viewport,
    layers::base::{LayerRole, LayerTrait},
    prelude::HashMap,
    rendering::context::RenderContext,
    MapError, Result,
};

/// Layer registry: owns every layer, keeps them in render order and enforces
/// that at most one base layer is visible at a time
pub struct LayerManager {
    /// All layers indexed by ID
    layers: HashMap<String, Box<dyn LayerTrait>>,
    /// Layer IDs sorted by z-index; insertion order breaks ties
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            layers: HashMap::default(),
            render_order: Vec::new(),
        }
    }

    /// Adds a layer. A base layer added while another base is visible starts hidden.
    pub fn add_layer(&mut self, mut layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        if self.layers.contains_key(&layer_id) {
            return Err(MapError::Layer(format!("duplicate layer id '{}'", layer_id)));
        }

        if layer.role() == LayerRole::Base && self.active_base_layer().is_some() {
            layer.set_visible(false);
        }

        let z_index = layer.z_index();
        log::debug!(
            "registering {:?} layer '{}' ({}) at z={}",
            layer.role(),
            layer_id,
            layer.layer_type(),
            z_index
        );
        self.layers.insert(layer_id.clone(), layer);

        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.z_index() > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.render_order.insert(insert_pos, layer_id);
        Ok(())
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        self.render_order.retain(|id| id != layer_id);
        self.layers.remove(layer_id)
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layers.get(layer_id).map(|l| l.as_ref())
    }

    /// Applies a function to a specific layer mutably
    pub fn with_layer_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn LayerTrait) -> R,
    {
        self.layers.get_mut(layer_id).map(|layer| f(layer.as_mut()))
    }

    /// Typed access to a layer
    pub fn layer_as<T: 'static>(&self, layer_id: &str) -> Option<&T> {
        self.layers.get(layer_id)?.as_any().downcast_ref::<T>()
    }

    pub fn layer_as_mut<T: 'static>(&mut self, layer_id: &str) -> Option<&mut T> {
        self.layers.get_mut(layer_id)?.as_any_mut().downcast_mut::<T>()
    }

    /// Layers in render order
    pub fn layers(&self) -> Vec<&dyn LayerTrait> {
        self.render_order
            .iter()
            .filter_map(|id| self.layers.get(id).map(|l| l.as_ref()))
            .collect()
    }

    /// Layers with the given role, in render order
    pub fn layers_with_role(&self, role: LayerRole) -> Vec<&dyn LayerTrait> {
        self.layers()
            .into_iter()
            .filter(|l| l.role() == role)
            .collect()
    }

    /// The visible base layer, if any
    pub fn active_base_layer(&self) -> Option<&str> {
        self.layers
            .values()
            .find(|l| l.role() == LayerRole::Base && l.is_visible())
            .map(|l| l.id())
    }

    /// Shows `layer_id` and hides every other base layer
    pub fn select_base_layer(&mut self, layer_id: &str) -> Result<()> {
        match self.layers.get(layer_id) {
            Some(layer) if layer.role() == LayerRole::Base => {}
            Some(_) => {
                return Err(MapError::Layer(format!(
                    "'{}' is an overlay, not a base layer",
                    layer_id
                )))
            }
            None => return Err(MapError::Layer(format!("no layer '{}'", layer_id))),
        }

        for (id, layer) in self.layers.iter_mut() {
            if layer.role() == LayerRole::Base {
                layer.set_visible(id == layer_id);
            }
        }
        log::info!("base layer switched to '{}'", layer_id);
        Ok(())
    }

    pub fn set_overlay_visible(&mut self, layer_id: &str, visible: bool) -> Result<()> {
        let layer = self.overlay_mut(layer_id)?;
        layer.set_visible(visible);
        Ok(())
    }

    /// Flips an overlay and returns its new visibility
    pub fn toggle_overlay(&mut self, layer_id: &str) -> Result<bool> {
        let layer = self.overlay_mut(layer_id)?;
        let visible = !layer.is_visible();
        layer.set_visible(visible);
        Ok(visible)
    }

    fn overlay_mut(&mut self, layer_id: &str) -> Result<&mut Box<dyn LayerTrait>> {
        match self.layers.get_mut(layer_id) {
            Some(layer) if layer.role() == LayerRole::Overlay => Ok(layer),
            Some(_) => Err(MapError::Layer(format!(
                "'{}' is a base layer, not an overlay",
                layer_id
            ))),
            None => Err(MapError::Layer(format!("no layer '{}'", layer_id))),
        }
    }

    /// Attribution strings of visible layers, in render order
    pub fn attributions(&self) -> Vec<&str> {
        self.layers()
            .into_iter()
            .filter(|l| l.is_visible())
            .filter_map(|l| l.attribution())
            .collect()
    }

    /// Renders visible layers that intersect the viewport, bottom to top.
    /// The view is padded by the context's cull margin so a marker centred
    /// just off screen still draws its visible part.
    pub fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let viewport_bounds = viewport.padded_bounds(context.cull_margin);

        for layer_id in &self.render_order {
            if let Some(layer) = self.layers.get_mut(layer_id) {
                if layer.is_visible() && layer.intersects_bounds(&viewport_bounds) {
                    layer.render(context, viewport)?;
                }
            }
        }
        Ok(())
    }

    pub fn update(&mut self, delta_time: f64) -> Result<()> {
        for layer in self.layers.values_mut() {
            layer.update(delta_time)?;
        }
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.layers.values().any(|l| l.is_visible() && l.is_loading())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::vector::VectorLayer;

    fn base(id: &str) -> Box<dyn LayerTrait> {
        let mut layer = VectorLayer::new(id.to_string(), id.to_string());
        layer.properties.role = LayerRole::Base;
        layer.properties.z_index = 0;
        Box::new(layer)
    }

    fn overlay(id: &str) -> Box<dyn LayerTrait> {
        Box::new(VectorLayer::new(id.to_string(), id.to_string()))
    }

    fn registry() -> LayerManager {
        let mut manager = LayerManager::new();
        manager.add_layer(base("default")).unwrap();
        manager.add_layer(base("watercolor")).unwrap();
        manager.add_layer(base("imagery")).unwrap();
        manager.add_layer(overlay("plates")).unwrap();
        manager.add_layer(overlay("quakes")).unwrap();
        manager
    }

    #[test]
    fn test_first_base_layer_is_active() {
        let manager = registry();
        assert_eq!(manager.active_base_layer(), Some("default"));
        assert_eq!(manager.layers_with_role(LayerRole::Base).len(), 3);
        assert_eq!(manager.layers_with_role(LayerRole::Overlay).len(), 2);
    }

    #[test]
    fn test_select_base_layer_is_exclusive() {
        let mut manager = registry();
        manager.select_base_layer("imagery").unwrap();

        let visible: Vec<_> = manager
            .layers_with_role(LayerRole::Base)
            .into_iter()
            .filter(|l| l.is_visible())
            .map(|l| l.id().to_string())
            .collect();
        assert_eq!(visible, vec!["imagery".to_string()]);
        // overlays untouched
        assert!(manager.get_layer("plates").unwrap().is_visible());
    }

    #[test]
    fn test_select_rejects_unknown_and_overlays() {
        let mut manager = registry();
        assert!(matches!(manager.select_base_layer("nope"), Err(MapError::Layer(_))));
        assert!(manager.select_base_layer("quakes").is_err());
        assert_eq!(manager.active_base_layer(), Some("default"));
    }

    #[test]
    fn test_overlays_toggle_independently() {
        let mut manager = registry();
        assert!(!manager.toggle_overlay("plates").unwrap());
        assert!(manager.get_layer("quakes").unwrap().is_visible());

        manager.set_overlay_visible("quakes", false).unwrap();
        manager.set_overlay_visible("plates", true).unwrap();
        assert!(manager.get_layer("plates").unwrap().is_visible());
        assert!(!manager.get_layer("quakes").unwrap().is_visible());
        assert!(manager.set_overlay_visible("default", false).is_err());
    }

    #[test]
    fn test_render_order_follows_z_index() {
        let mut manager = LayerManager::new();
        manager.add_layer(overlay("quakes")).unwrap();
        manager.add_layer(base("default")).unwrap();
        let order: Vec<_> = manager.layers().iter().map(|l| l.id().to_string()).collect();
        assert_eq!(order, vec!["default".to_string(), "quakes".to_string()]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut manager = registry();
        assert!(manager.add_layer(overlay("quakes")).is_err());
        assert_eq!(manager.len(), 5);
    }

    #[test]
    fn test_typed_access() {
        let mut manager = registry();
        assert!(manager.layer_as::<VectorLayer>("quakes").is_some());
        assert!(manager.layer_as_mut::<VectorLayer>("quakes").is_some());
        assert!(manager.remove_layer("quakes").is_some());
        assert!(manager.layer_as::<VectorLayer>("quakes").is_none());
    }
}
