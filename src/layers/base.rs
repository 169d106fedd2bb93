use crate::{
    core::{geo::LatLngBounds, viewport::Viewport},
    rendering::context::RenderContext,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tile,
    Vector,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Vector => write!(f, "vector"),
        }
    }
}

/// How a layer takes part in the layer control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerRole {
    /// Mutually exclusive background
    Base,
    /// Independently toggled group drawn above the base
    Overlay,
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub layer_type: LayerType,
    pub role: LayerRole,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
    pub attribution: Option<String>,
}

impl LayerProperties {
    pub fn new(id: String, name: String, layer_type: LayerType, role: LayerRole) -> Self {
        Self {
            id,
            name,
            layer_type,
            role,
            // Overlays draw above every base layer
            z_index: match role {
                LayerRole::Base => 0,
                LayerRole::Overlay => 10,
            },
            opacity: 1.0,
            visible: true,
            attribution: None,
        }
    }
}

/// Behaviour shared by every layer the map can hold
pub trait LayerTrait {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn layer_type(&self) -> LayerType;

    fn role(&self) -> LayerRole;

    fn z_index(&self) -> i32;

    fn set_z_index(&mut self, z_index: i32);

    fn opacity(&self) -> f32;

    fn set_opacity(&mut self, opacity: f32);

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Attribution to show while the layer is visible
    fn attribution(&self) -> Option<&str> {
        None
    }

    /// Queues draw commands for the current view
    fn render(&mut self, context: &mut RenderContext, viewport: &Viewport) -> Result<()>;

    /// Per-frame housekeeping (draining download results and the like)
    fn update(&mut self, _delta_time: f64) -> Result<()> {
        Ok(())
    }

    /// True while the layer is waiting on background work
    fn is_loading(&self) -> bool {
        false
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        None
    }

    fn intersects_bounds(&self, bounds: &LatLngBounds) -> bool {
        self.bounds().map_or(true, |b| b.intersects(bounds))
    }

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
