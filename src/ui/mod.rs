//! Map furniture: legend, popups, the layer switch control and the egui widget.
//!
//! `legend` and `popup` hold plain models usable headless; everything that
//! needs egui sits behind the `egui` feature.

pub mod legend;
pub mod popup;

#[cfg(feature = "egui")]
pub mod controls;
#[cfg(feature = "egui")]
pub mod widget;

pub use legend::{Legend, LegendEntry};
pub use popup::Popup;

#[cfg(feature = "egui")]
pub use controls::LayerControl;
#[cfg(feature = "egui")]
pub use widget::{MapWidget, MapWidgetConfig, MapWidgetExt};

/// Corner of the map a control is pinned to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[cfg(feature = "egui")]
impl Position {
    /// Rectangle of `size` inside `container`, `margin` pixels from the corner
    pub fn place(&self, container: egui::Rect, size: egui::Vec2, margin: f32) -> egui::Rect {
        let min = match self {
            Position::TopLeft => container.left_top() + egui::vec2(margin, margin),
            Position::TopRight => {
                container.right_top() + egui::vec2(-margin - size.x, margin)
            }
            Position::BottomLeft => {
                container.left_bottom() + egui::vec2(margin, -margin - size.y)
            }
            Position::BottomRight => container.right_bottom() - size - egui::vec2(margin, margin),
        };
        egui::Rect::from_min_size(min, size)
    }
}
