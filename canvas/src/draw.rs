//! Draw session: turns a click-drag with an armed tool into a new shape.
//!
//! The session holds world-space start and current points. Until commit it
//! is not a block; the renderer draws [`DrawSession::preview`] directly in
//! screen space so the outline tracks the pointer exactly. On release,
//! [`DrawSession::commit`] either produces a [`ShapeBlock`] or, for drags
//! shorter than the commit threshold, nothing.

#[cfg(test)]
#[path = "draw_test.rs"]
mod draw_test;

use crate::camera::{Camera, Point, Rect};
use crate::consts::{DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH, DRAW_COMMIT_THRESHOLD, MIN_DRAWN_SIZE};
use crate::doc::{BoxSize, ShapeBlock, ShapeGeometry, ShapeType, StrokeStyle};

/// Stroke and fill applied to newly drawn shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawStyle {
    pub stroke_color: String,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub fill_color: String,
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            stroke_color: DEFAULT_STROKE_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            stroke_style: StrokeStyle::Solid,
            fill_color: "transparent".to_string(),
        }
    }
}

/// Screen-space outline of the shape being drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreviewGeometry {
    Segment { from: Point, to: Point, arrow: bool },
    Rectangle(Rect),
    Ellipse { center: Point, rx: f64, ry: f64 },
    Triangle([Point; 3]),
}

/// An in-progress drawing gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawSession {
    pub shape_type: ShapeType,
    /// World point where the pointer went down.
    pub start: Point,
    /// Latest world pointer position.
    pub current: Point,
}

impl DrawSession {
    #[must_use]
    pub fn begin(shape_type: ShapeType, start: Point) -> Self {
        Self { shape_type, start, current: start }
    }

    pub fn update(&mut self, world: Point) {
        self.current = world;
    }

    /// Straight-line distance from start to the current point, in world units.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.start.distance(self.current)
    }

    /// Top-left of the box spanned by start and current.
    fn origin(&self) -> Point {
        Point::new(self.start.x.min(self.current.x), self.start.y.min(self.current.y))
    }

    /// Build the shape for this gesture, or `None` when the drag was too short to count.
    #[must_use]
    pub fn commit(&self, style: &DrawStyle) -> Option<ShapeBlock> {
        if self.distance() < DRAW_COMMIT_THRESHOLD {
            return None;
        }
        let position = self.origin();
        let geometry = if self.shape_type.is_linear() {
            ShapeGeometry::Segment {
                start: Point::new(self.start.x - position.x, self.start.y - position.y),
                end: Point::new(self.current.x - position.x, self.current.y - position.y),
            }
        } else {
            ShapeGeometry::Box {
                size: BoxSize::new(
                    (self.current.x - self.start.x).abs().max(MIN_DRAWN_SIZE),
                    (self.current.y - self.start.y).abs().max(MIN_DRAWN_SIZE),
                ),
            }
        };

        let mut shape = ShapeBlock::new(self.shape_type, position);
        shape.geometry = geometry;
        shape.stroke_color.clone_from(&style.stroke_color);
        shape.stroke_width = style.stroke_width;
        shape.stroke_style = style.stroke_style;
        shape.fill_color.clone_from(&style.fill_color);
        Some(shape)
    }

    /// Outline to draw for the current pointer position, in screen space.
    #[must_use]
    pub fn preview(&self, camera: &Camera) -> PreviewGeometry {
        let from = camera.world_to_screen(self.start);
        let to = camera.world_to_screen(self.current);
        let rect = Rect::new(from.x.min(to.x), from.y.min(to.y), (to.x - from.x).abs(), (to.y - from.y).abs());
        match self.shape_type {
            ShapeType::Line => PreviewGeometry::Segment { from, to, arrow: false },
            ShapeType::Arrow => PreviewGeometry::Segment { from, to, arrow: true },
            ShapeType::Rectangle => PreviewGeometry::Rectangle(rect),
            ShapeType::Circle => {
                PreviewGeometry::Ellipse { center: rect.center(), rx: rect.width / 2.0, ry: rect.height / 2.0 }
            }
            ShapeType::Triangle => PreviewGeometry::Triangle([
                Point::new(rect.x + rect.width / 2.0, rect.y),
                Point::new(rect.x, rect.bottom()),
                Point::new(rect.right(), rect.bottom()),
            ]),
        }
    }
}
