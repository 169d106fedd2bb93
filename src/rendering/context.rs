use crate::core::geo::{Point, TileCoord};
use crate::layers::tile::loader::TileImage;
use crate::layers::vector::{FillStyle, LineStyle, PathStyle};
use crate::{MapError, Result};
use std::sync::Arc;

/// Commands that layers issue to the render context. Coordinates are screen
/// pixels relative to the top-left corner of the map.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Tile {
        layer_id: String,
        coord: TileCoord,
        image: Arc<TileImage>,
        bounds: (Point, Point),
        opacity: f32,
    },
    Line {
        points: Vec<Point>,
        style: LineStyle,
        closed: bool,
    },
    Circle {
        center: Point,
        style: PathStyle,
    },
    /// A triangulated polygon interior; `triangles` index into `points`
    Fill {
        points: Vec<Point>,
        triangles: Vec<[u32; 3]>,
        style: FillStyle,
    },
}

/// Draw queue for one frame
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    pub drawing_queue: Vec<DrawCommand>,
    /// Commands entirely outside this margin around the frame are dropped
    pub cull_margin: f64,
}

impl RenderContext {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MapError::Render(format!(
                "render target must be non-empty, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            drawing_queue: Vec::new(),
            cull_margin: 64.0,
        })
    }

    pub fn begin_frame(&mut self) {
        self.drawing_queue.clear();
    }

    pub fn render_tile(
        &mut self,
        layer_id: &str,
        coord: TileCoord,
        image: Arc<TileImage>,
        bounds: (Point, Point),
        opacity: f32,
    ) -> Result<()> {
        if bounds.0.x >= bounds.1.x || bounds.0.y >= bounds.1.y {
            return Err(MapError::Render(format!("invalid bounds for tile {:?}", coord)));
        }
        if self.is_outside(bounds.0, bounds.1) {
            return Ok(());
        }
        self.drawing_queue.push(DrawCommand::Tile {
            layer_id: layer_id.to_string(),
            coord,
            image,
            bounds,
            opacity: opacity.clamp(0.0, 1.0),
        });
        Ok(())
    }

    pub fn render_line(&mut self, points: Vec<Point>, style: &LineStyle, closed: bool) {
        if points.len() < 2 {
            return;
        }
        let (min, max) = extent(&points);
        if self.is_outside(min, max) {
            return;
        }
        self.drawing_queue.push(DrawCommand::Line {
            points,
            style: style.clone(),
            closed,
        });
    }

    pub fn render_fill(&mut self, points: Vec<Point>, triangles: &[[u32; 3]], style: &FillStyle) {
        if triangles.is_empty() || style.opacity <= 0.0 {
            return;
        }
        let (min, max) = extent(&points);
        if self.is_outside(min, max) {
            return;
        }
        self.drawing_queue.push(DrawCommand::Fill {
            points,
            triangles: triangles.to_vec(),
            style: style.clone(),
        });
    }

    /// Queues a circle; non-positive radii draw nothing
    pub fn render_circle(&mut self, center: Point, style: &PathStyle) {
        let r = style.radius as f64;
        if r.is_nan() || r <= 0.0 {
            return;
        }
        let min = Point::new(center.x - r, center.y - r);
        let max = Point::new(center.x + r, center.y + r);
        if self.is_outside(min, max) {
            return;
        }
        self.drawing_queue.push(DrawCommand::Circle {
            center,
            style: style.clone(),
        });
    }

    pub fn get_drawing_queue(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    fn is_outside(&self, min: Point, max: Point) -> bool {
        let m = self.cull_margin;
        max.x < -m || max.y < -m || min.x > self.width as f64 + m || min.y > self.height as f64 + m
    }
}

fn extent(points: &[Point]) -> (Point, Point) {
    points.iter().fold(
        (
            Point::new(f64::INFINITY, f64::INFINITY),
            Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        ),
        |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        },
    )
}
