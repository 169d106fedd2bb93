use crate::core::{geo::LatLng, viewport::Viewport};

/// Text bubble anchored to a map position
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub position: LatLng,
    pub content: String,
}

impl Popup {
    pub fn new(position: LatLng, content: String) -> Self {
        Self { position, content }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines()
    }

    /// Screen position of the anchor for the given view
    pub fn anchor(&self, viewport: &Viewport) -> crate::core::geo::Point {
        viewport.lat_lng_to_pixel(&self.position)
    }
}

#[cfg(feature = "egui")]
#[derive(Debug, Clone)]
pub struct PopupStyle {
    pub background_color: egui::Color32,
    pub border_color: egui::Color32,
    pub border_width: f32,
    pub rounding: f32,
    pub padding: f32,
    pub font_id: egui::FontId,
    pub text_color: egui::Color32,
    /// Gap between the anchor point and the bubble
    pub offset: f32,
}

#[cfg(feature = "egui")]
impl Default for PopupStyle {
    fn default() -> Self {
        Self {
            background_color: egui::Color32::WHITE,
            border_color: egui::Color32::GRAY,
            border_width: 1.0,
            rounding: 4.0,
            padding: 8.0,
            font_id: egui::FontId::proportional(12.0),
            text_color: egui::Color32::BLACK,
            offset: 8.0,
        }
    }
}

#[cfg(feature = "egui")]
impl Popup {
    /// Paints the bubble centred above its anchor. Returns the bubble rectangle.
    pub fn paint(
        &self,
        painter: &egui::Painter,
        map_rect: egui::Rect,
        viewport: &Viewport,
        style: &PopupStyle,
    ) -> egui::Rect {
        let anchor = self.anchor(viewport);
        let anchor = map_rect.min + egui::vec2(anchor.x as f32, anchor.y as f32);

        let text_size = painter
            .layout_no_wrap(self.content.clone(), style.font_id.clone(), style.text_color)
            .size();
        let size = text_size + egui::Vec2::splat(style.padding * 2.0);
        let rect = egui::Rect::from_min_size(
            anchor - egui::vec2(size.x / 2.0, size.y + style.offset),
            size,
        );

        painter.rect_filled(rect, style.rounding, style.background_color);
        painter.rect_stroke(
            rect,
            style.rounding,
            egui::Stroke::new(style.border_width, style.border_color),
        );
        painter.text(
            rect.shrink(style.padding).min,
            egui::Align2::LEFT_TOP,
            &self.content,
            style.font_id.clone(),
            style.text_color,
        );
        rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines() {
        let popup = Popup::new(
            LatLng::new(36.0, -120.0),
            "Magnitude: 2.1\nDepth: 7.5\nLocation: Parkfield, CA".into(),
        );
        let lines: Vec<_> = popup.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "Location: Parkfield, CA");
    }
}
