use crate::core::map::Map;
use crate::layers::base::LayerRole;
use egui::Ui;

/// Leaflet-style layer switcher: radio buttons for the base layers,
/// checkboxes for the overlays
#[derive(Debug, Clone, Default)]
pub struct LayerControl {
    pub collapsed: bool,
}

impl LayerControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the control and applies any selection to `map`.
    /// Returns true when the map's layers changed.
    pub fn show(&mut self, ui: &mut Ui, map: &mut Map) -> bool {
        let mut changed = false;

        let header = if self.collapsed { "▸ Layers" } else { "▾ Layers" };
        if ui.selectable_label(false, header).clicked() {
            self.collapsed = !self.collapsed;
        }
        if self.collapsed {
            return false;
        }

        let entries = |role: LayerRole| -> Vec<(String, String, bool)> {
            map.layer_manager()
                .layers_with_role(role)
                .into_iter()
                .map(|l| (l.id().to_string(), l.name().to_string(), l.is_visible()))
                .collect()
        };
        let bases = entries(LayerRole::Base);
        let overlays = entries(LayerRole::Overlay);

        for (id, name, selected) in bases {
            if ui.radio(selected, name).clicked() && !selected {
                match map.select_base_layer(&id) {
                    Ok(()) => changed = true,
                    Err(e) => log::warn!("{}", e),
                }
            }
        }

        ui.separator();

        for (id, name, mut visible) in overlays {
            if ui.checkbox(&mut visible, name).changed() {
                match map.set_overlay_visible(&id, visible) {
                    Ok(()) => changed = true,
                    Err(e) => log::warn!("{}", e),
                }
            }
        }

        changed
    }
}
