//! Rendering: turns document, camera, and UI state into a display list.
//!
//! The display list has two coordinate spaces. `content` is in world units
//! and is drawn inside a single camera transform. Selection handles and the
//! draw preview are in screen space and sit above it, so they keep a fixed
//! pixel size at any zoom. This module only reads state.
//!
//! Shape geometry is produced by a lookup table keyed by [`ShapeType`].

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::camera::{Camera, Point, Rect};
use crate::consts::ARROW_SIZE;
use crate::doc::{Block, BlockId, BlockStore, BoxSize, ShapeBlock, ShapeType, StrokeStyle};
use crate::draw::{DrawStyle, PreviewGeometry};
use crate::hit::{self, Handle};
use crate::input::{InputState, UiState};

/// How far an arrow's line stops short of its tip, so the head covers the end.
const ARROW_LINE_INSET: f64 = ARROW_SIZE * 0.7;
/// Icon drawn when the requested name is not a library icon.
const FALLBACK_ICON: &str = "HelpCircle";
/// Exports of the icon library that are not icons.
const NON_ICON_NAMES: [&str; 5] = ["createLucideIcon", "Icon", "IconNode", "LucideProps", "LucideIcon"];

/// Outline stroke. `dash` is `(dash, gap)` or `None` for a solid line.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
    pub dash: Option<(f64, f64)>,
}

/// Dash pattern for a stroke style at `width`.
#[must_use]
pub fn dash_array(style: StrokeStyle, width: f64) -> Option<(f64, f64)> {
    match style {
        StrokeStyle::Solid => None,
        StrokeStyle::Dashed => Some((width * 4.0, width * 2.0)),
        StrokeStyle::Dotted => Some((width, width * 2.0)),
    }
}

/// Geometry of a shape in world space, before rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapePath {
    /// `head` is the arrowhead triangle, tip first.
    Segment { from: Point, to: Point, head: Option<[Point; 3]> },
    Rect(Rect),
    Ellipse { center: Point, rx: f64, ry: f64 },
    Polygon([Point; 3]),
}

type ShapeRenderer = fn(&ShapeBlock) -> ShapePath;

const SHAPE_RENDERERS: [(ShapeType, ShapeRenderer); 5] = [
    (ShapeType::Line, line_path),
    (ShapeType::Arrow, arrow_path),
    (ShapeType::Rectangle, rect_path),
    (ShapeType::Circle, ellipse_path),
    (ShapeType::Triangle, triangle_path),
];

/// Geometry builder for `shape_type`.
#[must_use]
pub fn shape_renderer(shape_type: ShapeType) -> ShapeRenderer {
    SHAPE_RENDERERS
        .iter()
        .find(|(t, _)| *t == shape_type)
        .map_or(rect_path as ShapeRenderer, |(_, r)| *r)
}

fn segment_points(shape: &ShapeBlock) -> (Point, Point) {
    shape.world_segment().unwrap_or((shape.position, shape.position))
}

fn line_path(shape: &ShapeBlock) -> ShapePath {
    let (from, to) = segment_points(shape);
    ShapePath::Segment { from, to, head: None }
}

fn arrow_path(shape: &ShapeBlock) -> ShapePath {
    let (from, tip) = segment_points(shape);
    let dx = tip.x - from.x;
    let dy = tip.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return ShapePath::Segment { from, to: tip, head: None };
    }
    let (ux, uy) = (dx / len, dy / len);
    let to = Point::new(tip.x - ux * ARROW_LINE_INSET, tip.y - uy * ARROW_LINE_INSET);
    let base = Point::new(tip.x - ux * ARROW_SIZE, tip.y - uy * ARROW_SIZE);
    let half = ARROW_SIZE / 2.0;
    let head = [
        tip,
        Point::new(base.x - uy * half, base.y + ux * half),
        Point::new(base.x + uy * half, base.y - ux * half),
    ];
    ShapePath::Segment { from, to, head: Some(head) }
}

/// Box extent inset by half the stroke so the outline stays inside the block.
fn inset_box(shape: &ShapeBlock) -> Rect {
    let size = shape.size().unwrap_or(BoxSize::new(0.0, 0.0));
    let half = shape.stroke_width / 2.0;
    Rect::new(
        shape.position.x + half,
        shape.position.y + half,
        (size.width - shape.stroke_width).max(0.0),
        (size.height - shape.stroke_width).max(0.0),
    )
}

fn rect_path(shape: &ShapeBlock) -> ShapePath {
    ShapePath::Rect(inset_box(shape))
}

fn ellipse_path(shape: &ShapeBlock) -> ShapePath {
    let r = inset_box(shape);
    ShapePath::Ellipse { center: r.center(), rx: r.width / 2.0, ry: r.height / 2.0 }
}

fn triangle_path(shape: &ShapeBlock) -> ShapePath {
    let r = inset_box(shape);
    ShapePath::Polygon([
        Point::new(r.x + r.width / 2.0, r.y),
        Point::new(r.x, r.bottom()),
        Point::new(r.right(), r.bottom()),
    ])
}

/// Name of the library icon to draw for `name`.
#[must_use]
pub fn resolve_icon_name(name: &str) -> &str {
    let starts_upper = name.chars().next().is_some_and(char::is_uppercase);
    if starts_upper && !name.ends_with("Icon") && !NON_ICON_NAMES.contains(&name) {
        name
    } else {
        FALLBACK_ICON
    }
}

// =============================================================
// Display list
// =============================================================

/// One block, ready to draw in world space.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneItem {
    Text { id: BlockId, rect: Rect, content: String, background: Option<String> },
    Shape {
        id: BlockId,
        path: ShapePath,
        stroke: Stroke,
        fill: String,
        /// Degrees, clockwise around `pivot`.
        rotation: f64,
        pivot: Point,
        label: Option<String>,
    },
    Icon { id: BlockId, rect: Rect, name: String, color: String, fill: String, rotation: f64 },
}

/// The draw preview, in screen space.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewItem {
    pub geometry: PreviewGeometry,
    pub stroke: Stroke,
    pub fill: String,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Transform for `content`.
    pub camera: Camera,
    /// Blocks in draw order, world space.
    pub content: Vec<SceneItem>,
    /// Screen-space outline of the selected block, with its rotation.
    pub selection: Option<(Rect, f64)>,
    /// Screen-space handles of the selected block.
    pub handles: Vec<Handle>,
    pub preview: Option<PreviewItem>,
}

fn scene_item(block: &Block) -> SceneItem {
    match block {
        Block::Text(t) => SceneItem::Text {
            id: t.id,
            rect: block.extent(),
            content: t.content.clone(),
            background: t.background_color.clone(),
        },
        Block::Icon(i) => SceneItem::Icon {
            id: i.id,
            rect: block.extent(),
            name: resolve_icon_name(&i.icon_name).to_string(),
            color: i.color.clone(),
            fill: i.fill_color.clone(),
            rotation: i.rotation,
        },
        Block::Shape(s) => SceneItem::Shape {
            id: s.id,
            path: shape_renderer(s.shape_type)(s),
            stroke: Stroke {
                color: s.stroke_color.clone(),
                width: s.stroke_width,
                dash: dash_array(s.stroke_style, s.stroke_width),
            },
            fill: s.fill_color.clone(),
            rotation: s.rotation,
            pivot: block.extent().center(),
            label: s.text.clone(),
        },
    }
}

fn preview_item(style: &DrawStyle, geometry: PreviewGeometry, zoom: f64) -> PreviewItem {
    let width = style.stroke_width * zoom;
    PreviewItem {
        geometry,
        stroke: Stroke { color: style.stroke_color.clone(), width, dash: dash_array(style.stroke_style, width) },
        fill: style.fill_color.clone(),
    }
}

/// Build the display list for the current state.
#[must_use]
pub fn build_scene(doc: &BlockStore, camera: &Camera, ui: &UiState, input: &InputState) -> Scene {
    let content = doc.draw_order().into_iter().map(scene_item).collect();

    let selected = ui.selected_id.and_then(|id| doc.get(&id));
    let selection = selected.map(|b| (camera.world_rect_to_screen(b.extent()), b.rotation()));
    let handles = selected.map(|b| hit::handles(b, camera)).unwrap_or_default();

    let preview = match input {
        InputState::Drawing { session, .. } => {
            Some(preview_item(&ui.draw_style, session.preview(camera), camera.zoom))
        }
        InputState::Idle | InputState::Panning { .. } | InputState::Editing { .. } => None,
    };

    Scene { camera: *camera, content, selection, handles, preview }
}
