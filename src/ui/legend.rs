use crate::symbology::{DepthBucket, DepthColor};
use crate::ui::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub color: DepthColor,
    pub label: String,
}

/// Static depth key: one colored swatch per depth bucket
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    entries: Vec<LegendEntry>,
    position: Position,
}

impl Legend {
    /// The six depth buckets in ascending order, pinned bottom-right
    pub fn depth() -> Self {
        let entries = DepthBucket::all()
            .into_iter()
            .map(|bucket| LegendEntry {
                color: bucket.color(),
                label: bucket.label(),
            })
            .collect();

        Self {
            entries,
            position: Position::BottomRight,
        }
    }

    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// HTML markup of the key: a colored `<i>` swatch and a label per row
    pub fn to_html(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "<i style=\"background:{}\"></i> {}",
                    entry.color.css_name(),
                    entry.label.replace('\u{2013}', "&ndash;")
                )
            })
            .collect::<Vec<_>>()
            .join("<br>")
    }

    /// Paints the key into the map's corner
    #[cfg(feature = "egui")]
    pub fn paint(&self, painter: &egui::Painter, map_rect: egui::Rect) {
        use egui::{Align2, Color32, FontId, Stroke};

        const SWATCH: f32 = 18.0;
        const PADDING: f32 = 8.0;
        let font = FontId::proportional(12.0);

        let label_width = self
            .entries
            .iter()
            .map(|e| {
                painter
                    .layout_no_wrap(e.label.clone(), font.clone(), Color32::BLACK)
                    .size()
                    .x
            })
            .fold(0.0_f32, f32::max);
        let size = egui::vec2(
            SWATCH + 2.0 * PADDING + 6.0 + label_width,
            self.entries.len() as f32 * SWATCH + 2.0 * PADDING,
        );
        let frame = self.position.place(map_rect, size, 10.0);

        painter.rect_filled(frame, 5.0, Color32::from_rgba_unmultiplied(255, 255, 255, 204));
        painter.rect_stroke(frame, 5.0, Stroke::new(1.0, Color32::from_gray(180)));

        for (i, entry) in self.entries.iter().enumerate() {
            let top = frame.min + egui::vec2(PADDING, PADDING + i as f32 * SWATCH);
            let swatch = egui::Rect::from_min_size(top, egui::vec2(SWATCH, SWATCH));
            painter.rect_filled(swatch.shrink(1.0), 0.0, Color32::from(entry.color.rgb()));
            painter.text(
                swatch.right_center() + egui::vec2(6.0, 0.0),
                Align2::LEFT_CENTER,
                &entry.label,
                font.clone(),
                Color32::from_gray(40),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::DEPTH_THRESHOLDS;

    #[test]
    fn test_depth_legend_entries() {
        let legend = Legend::depth();
        let labels: Vec<_> = legend.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["-10–10", "10–30", "30–50", "50–70", "70–90", "90+"]
        );
        assert_eq!(legend.position(), Position::BottomRight);
    }

    #[test]
    fn test_colors_match_classifier() {
        let legend = Legend::depth();
        for (entry, threshold) in legend.entries().iter().zip(DEPTH_THRESHOLDS) {
            assert_eq!(entry.color, DepthColor::for_depth(threshold + 1.0));
        }
        assert_eq!(legend.entries()[0].color, DepthColor::SpringGreen);
        assert_eq!(legend.entries()[5].color, DepthColor::Red);
    }

    #[test]
    fn test_html_markup() {
        let html = Legend::depth().to_html();
        assert!(html.starts_with("<i style=\"background:springgreen\"></i> -10&ndash;10<br>"));
        assert!(html.contains("<i style=\"background:orange\"></i> 30&ndash;50<br>"));
        assert!(html.ends_with("<i style=\"background:red\"></i> 90+"));
        assert_eq!(html.matches("<br>").count(), 5);
    }
}
