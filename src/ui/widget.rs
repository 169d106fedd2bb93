use crate::{
    core::{geo::Point, map::Map},
    layers::vector::SerializableColor,
    prelude::{HashMap, HashSet},
    rendering::context::{DrawCommand, RenderContext},
    ui::{
        legend::Legend,
        popup::{Popup, PopupStyle},
    },
    TileCoord,
};
use egui::{Color32, ColorImage, Pos2, Rect, Response, Sense, Shape, Stroke, TextureHandle, Ui, Vec2};
use std::time::Duration;

/// Texture cache key: a tile is uploaded once per layer
type TextureKey = (String, TileCoord);

#[derive(Debug, Clone)]
pub struct MapWidgetConfig {
    pub interactive: bool,
    pub show_zoom_controls: bool,
    pub show_attribution: bool,
    pub show_legend: bool,
    pub preferred_size: Option<Vec2>,
    pub background_color: Color32,
    /// Zoom change per scrolled point
    pub scroll_zoom_speed: f64,
}

impl Default for MapWidgetConfig {
    fn default() -> Self {
        Self {
            interactive: true,
            show_zoom_controls: true,
            show_attribution: true,
            show_legend: true,
            preferred_size: None,
            background_color: Color32::from_rgb(221, 221, 221),
            scroll_zoom_speed: 0.005,
        }
    }
}

/// egui front end for a [`Map`]: paints its draw queue, pans on drag, zooms on
/// scroll and opens a marker's popup on click
pub struct MapWidget {
    map: Map,
    config: MapWidgetConfig,
    legend: Option<Legend>,
    popup: Option<Popup>,
    popup_style: PopupStyle,
    textures: HashMap<TextureKey, TextureHandle>,
}

impl MapWidget {
    pub fn new(map: Map) -> Self {
        Self {
            map,
            config: MapWidgetConfig::default(),
            legend: None,
            popup: None,
            popup_style: PopupStyle::default(),
            textures: HashMap::default(),
        }
    }

    pub fn config_mut(&mut self) -> &mut MapWidgetConfig {
        &mut self.config
    }

    pub fn with_legend(mut self, legend: Legend) -> Self {
        self.legend = Some(legend);
        self
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn show(&mut self, ui: &mut Ui) -> Response {
        let desired_size = self.config.preferred_size.unwrap_or_else(|| ui.available_size());
        let (rect, mut response) = ui.allocate_exact_size(desired_size, Sense::click_and_drag());

        self.map
            .set_size(Point::new(rect.width() as f64, rect.height() as f64));

        if self.config.interactive {
            self.handle_input(ui, rect, &mut response);
        }

        let dt = ui.input(|i| i.stable_dt) as f64;
        if let Err(e) = self.map.update(dt) {
            log::warn!("map update failed: {}", e);
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, self.config.background_color);

        let width = rect.width().max(1.0) as u32;
        let height = rect.height().max(1.0) as u32;
        match RenderContext::new(width, height) {
            Ok(mut render_ctx) => {
                if let Err(e) = self.map.render(&mut render_ctx) {
                    log::warn!("map render failed: {}", e);
                }
                self.paint_queue(ui.ctx(), &painter, rect, render_ctx.get_drawing_queue());
            }
            Err(e) => log::debug!("skipping frame: {}", e),
        }

        if let Some(popup) = &self.popup {
            popup.paint(&painter, rect, self.map.viewport(), &self.popup_style);
        }
        if let Some(legend) = &self.legend {
            if self.config.show_legend {
                legend.paint(&painter, rect);
            }
        }
        if self.config.show_zoom_controls {
            self.paint_zoom_controls(&painter, rect);
        }
        if self.config.show_attribution {
            if let Some(text) = self.map.attribution() {
                painter.text(
                    rect.left_bottom() + egui::vec2(5.0, -5.0),
                    egui::Align2::LEFT_BOTTOM,
                    text,
                    egui::FontId::proportional(10.0),
                    Color32::from_gray(80),
                );
            }
        }

        if self.map.is_loading() {
            ui.ctx().request_repaint_after(Duration::from_millis(100));
        }

        response
    }

    fn handle_input(&mut self, ui: &mut Ui, rect: Rect, response: &mut Response) {
        let (zoom_in_rect, zoom_out_rect) = zoom_control_rects(rect);

        if response.dragged() {
            let delta = response.drag_delta();
            if delta.length_sq() > 0.0 {
                self.map.pan_by(Point::new(delta.x as f64, delta.y as f64));
                response.mark_changed();
            }
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll.abs() > 0.1 {
                let anchor = ui
                    .input(|i| i.pointer.hover_pos())
                    .unwrap_or_else(|| rect.center())
                    - rect.min;
                self.map.zoom_around(
                    Point::new(anchor.x as f64, anchor.y as f64),
                    scroll as f64 * self.config.scroll_zoom_speed,
                );
                response.mark_changed();
            }
        }

        if response.double_clicked() && self.map.options().double_click_zoom {
            if let Some(pos) = response.interact_pointer_pos() {
                let anchor = pos - rect.min;
                let delta = self.map.options().zoom_delta;
                self.map
                    .zoom_around(Point::new(anchor.x as f64, anchor.y as f64), delta);
                response.mark_changed();
            }
        } else if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                if self.config.show_zoom_controls && zoom_in_rect.contains(pos) {
                    self.map.zoom_in();
                } else if self.config.show_zoom_controls && zoom_out_rect.contains(pos) {
                    self.map.zoom_out();
                } else {
                    let local = pos - rect.min;
                    self.popup = self
                        .map
                        .hit_test_popup(&Point::new(local.x as f64, local.y as f64));
                }
                response.mark_changed();
            }
        }
    }

    fn paint_queue(
        &mut self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        rect: Rect,
        queue: &[DrawCommand],
    ) {
        let to_screen = |p: &Point| Pos2::new(rect.min.x + p.x as f32, rect.min.y + p.y as f32);
        let mut used: HashSet<TextureKey> = HashSet::default();

        for command in queue {
            match command {
                DrawCommand::Tile {
                    layer_id,
                    coord,
                    image,
                    bounds,
                    opacity,
                } => {
                    let key = (layer_id.clone(), *coord);
                    let texture = self.textures.entry(key.clone()).or_insert_with(|| {
                        let pixels = ColorImage::from_rgba_unmultiplied(
                            [image.width as usize, image.height as usize],
                            &image.rgba,
                        );
                        ctx.load_texture(
                            format!("{}/{}/{}/{}", layer_id, coord.z, coord.x, coord.y),
                            pixels,
                            egui::TextureOptions::LINEAR,
                        )
                    });
                    painter.image(
                        texture.id(),
                        Rect::from_two_pos(to_screen(&bounds.0), to_screen(&bounds.1)),
                        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE.gamma_multiply(*opacity),
                    );
                    used.insert(key);
                }
                DrawCommand::Line {
                    points,
                    style,
                    closed,
                } => {
                    let points: Vec<Pos2> = points.iter().map(to_screen).collect();
                    let stroke = Stroke::new(style.width, color(style.color, style.opacity));
                    if *closed {
                        painter.add(Shape::closed_line(points, stroke));
                    } else {
                        painter.add(Shape::line(points, stroke));
                    }
                }
                DrawCommand::Fill {
                    points,
                    triangles,
                    style,
                } => {
                    let fill = color(style.color, style.opacity);
                    let mut mesh = egui::Mesh::default();
                    for point in points {
                        mesh.colored_vertex(to_screen(point), fill);
                    }
                    for [a, b, c] in triangles {
                        mesh.add_triangle(*a, *b, *c);
                    }
                    painter.add(Shape::mesh(mesh));
                }
                DrawCommand::Circle { center, style } => {
                    painter.circle(
                        to_screen(center),
                        style.radius,
                        color(style.fill_color, style.fill_opacity),
                        Stroke::new(style.weight, color(style.color, style.opacity)),
                    );
                }
            }
        }

        // Tiles that scrolled out of view give their GPU memory back
        self.textures.retain(|key, _| used.contains(key));
    }

    fn paint_zoom_controls(&self, painter: &egui::Painter, rect: Rect) {
        let (zoom_in_rect, zoom_out_rect) = zoom_control_rects(rect);
        for (button, label) in [(zoom_in_rect, "+"), (zoom_out_rect, "−")] {
            painter.rect_filled(button, 3.0, Color32::from_rgba_unmultiplied(255, 255, 255, 220));
            painter.rect_stroke(button, 3.0, Stroke::new(1.0, Color32::from_gray(100)));
            painter.text(
                button.center(),
                egui::Align2::CENTER_CENTER,
                label,
                egui::FontId::proportional(16.0),
                Color32::BLACK,
            );
        }
    }
}

fn zoom_control_rects(rect: Rect) -> (Rect, Rect) {
    let size = Vec2::splat(30.0);
    (
        Rect::from_min_size(rect.left_top() + egui::vec2(10.0, 10.0), size),
        Rect::from_min_size(rect.left_top() + egui::vec2(10.0, 45.0), size),
    )
}

fn color(color: SerializableColor, opacity: f32) -> Color32 {
    Color32::from(color.with_opacity(opacity))
}

pub trait MapWidgetExt {
    fn map_widget(&mut self, widget: &mut MapWidget) -> Response;
}

impl MapWidgetExt for Ui {
    fn map_widget(&mut self, widget: &mut MapWidget) -> Response {
        widget.show(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::QuakeMapConfig;

    fn widget() -> MapWidget {
        let map = Map::earthquake_map(&QuakeMapConfig::headless(), Point::new(800.0, 600.0))
            .unwrap();
        MapWidget::new(map).with_legend(Legend::depth())
    }

    #[test]
    fn test_config_defaults() {
        let config = MapWidgetConfig::default();
        assert!(config.interactive);
        assert!(config.show_legend);
        assert!(config.preferred_size.is_none());
    }

    #[test]
    fn test_zoom_controls_do_not_overlap() {
        let rect = Rect::from_min_size(Pos2::ZERO, egui::vec2(800.0, 600.0));
        let (zoom_in, zoom_out) = zoom_control_rects(rect);
        assert!(!zoom_in.intersects(zoom_out));
        assert!(rect.contains_rect(zoom_in) && rect.contains_rect(zoom_out));
    }

    #[test]
    fn test_color_applies_opacity() {
        let c = color(SerializableColor::rgb(0, 0, 0), 0.6);
        assert_eq!(c.a(), 153);
    }

    #[test]
    fn test_frame_renders_headless() {
        let mut widget = widget();
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                widget.show(ui);
            });
        });
        assert!(widget.popup().is_none());
        assert!(widget.textures.is_empty());
    }
}
