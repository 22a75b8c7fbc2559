//! Document model: canvas blocks, their attributes, and the in-memory store.
//!
//! This module defines the closed set of block variants that can live on the
//! canvas (`Block`), a sparse-update type for incremental edits
//! (`BlockPatch`), and the runtime store that owns all live blocks
//! (`BlockStore`).
//!
//! Blocks are stored in world units. The store keeps insertion order; the
//! renderer reads `draw_order`, which lifts every shape above every non-shape
//! block regardless of creation order.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::{Point, Rect};
use crate::consts::{
    DEFAULT_BOX_SIZE, DEFAULT_ICON_SIZE, DEFAULT_LINE_LENGTH, DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH,
    TEXT_DEFAULT_HEIGHT, TEXT_DEFAULT_WIDTH,
};
use crate::markers::{self, MarkerKind};

/// Unique identifier for a block.
pub type BlockId = Uuid;

/// Default fill for shapes.
const SHAPE_FILL: &str = "transparent";
/// Default fill for icons.
const ICON_FILL: &str = "none";
/// Background colour of AI summary blocks.
const SUMMARY_BACKGROUND: &str = "#fef9c3";
/// Heading prepended to AI summary content.
const SUMMARY_HEADING: &str = "<p><strong>📋 Summary</strong></p>";

// =============================================================
// Variant tags
// =============================================================

/// The kind of a block, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Shape,
    Icon,
}

/// Geometry family of a shape block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Line,
    Arrow,
    Rectangle,
    Circle,
    Triangle,
}

impl ShapeType {
    /// Whether this shape is defined by two end points rather than a box.
    #[must_use]
    pub fn is_linear(self) -> bool {
        matches!(self, Self::Line | Self::Arrow)
    }
}

/// Dash pattern for shape outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Width and height of a box shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

impl BoxSize {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

// =============================================================
// Blocks
// =============================================================

/// A rich-text block. `content` is the serialized document of the text surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawTextBlock")]
pub struct TextBlock {
    pub id: BlockId,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub content: String,
    pub background_color: Option<String>,
}

/// Text block as read from storage. Older documents store `x`/`y` at the top level.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTextBlock {
    id: BlockId,
    position: Option<Point>,
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    #[serde(default)]
    content: String,
    background_color: Option<String>,
}

impl From<RawTextBlock> for TextBlock {
    fn from(raw: RawTextBlock) -> Self {
        let position = raw
            .position
            .unwrap_or_else(|| Point::new(raw.x.unwrap_or(0.0), raw.y.unwrap_or(0.0)));
        Self {
            id: raw.id,
            position,
            width: raw.width.unwrap_or(TEXT_DEFAULT_WIDTH),
            height: raw.height.unwrap_or(TEXT_DEFAULT_HEIGHT),
            content: raw.content,
            background_color: raw.background_color,
        }
    }
}

impl TextBlock {
    /// A fresh, empty text block at `position` with default size.
    #[must_use]
    pub fn new(position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width: TEXT_DEFAULT_WIDTH,
            height: TEXT_DEFAULT_HEIGHT,
            content: String::new(),
            background_color: None,
        }
    }
}

/// How a shape's extent is described.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeGeometry {
    /// Line/arrow end points, as offsets from the block position.
    Segment { start: Point, end: Point },
    /// Box shapes: size of the bounding box whose top-left is the block position.
    Box { size: BoxSize },
}

/// A vector shape: line, arrow, rectangle, circle, or triangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawShapeBlock", into = "RawShapeBlock")]
pub struct ShapeBlock {
    pub id: BlockId,
    pub position: Point,
    pub shape_type: ShapeType,
    pub stroke_color: String,
    pub fill_color: String,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    /// Clockwise rotation in degrees around the box centre.
    pub rotation: f64,
    /// Optional label.
    pub text: Option<String>,
    pub geometry: ShapeGeometry,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShapeBlock {
    id: BlockId,
    #[serde(default)]
    position: Point,
    shape_type: ShapeType,
    #[serde(default = "default_stroke_color")]
    stroke_color: String,
    #[serde(default = "default_shape_fill")]
    fill_color: String,
    #[serde(default = "default_stroke_width")]
    stroke_width: f64,
    #[serde(default)]
    stroke_style: StrokeStyle,
    #[serde(default)]
    rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<BoxSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_point: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_point: Option<Point>,
}

fn default_stroke_color() -> String {
    DEFAULT_STROKE_COLOR.to_string()
}

fn default_shape_fill() -> String {
    SHAPE_FILL.to_string()
}

fn default_icon_fill() -> String {
    ICON_FILL.to_string()
}

fn default_stroke_width() -> f64 {
    DEFAULT_STROKE_WIDTH
}

fn default_icon_size() -> f64 {
    DEFAULT_ICON_SIZE
}

fn default_geometry(shape_type: ShapeType) -> ShapeGeometry {
    if shape_type.is_linear() {
        ShapeGeometry::Segment { start: Point::new(0.0, 0.0), end: Point::new(DEFAULT_LINE_LENGTH, 0.0) }
    } else {
        ShapeGeometry::Box { size: BoxSize::new(DEFAULT_BOX_SIZE, DEFAULT_BOX_SIZE) }
    }
}

impl From<RawShapeBlock> for ShapeBlock {
    fn from(raw: RawShapeBlock) -> Self {
        let geometry = match default_geometry(raw.shape_type) {
            ShapeGeometry::Segment { start, end } => ShapeGeometry::Segment {
                start: raw.start_point.unwrap_or(start),
                end: raw.end_point.unwrap_or(end),
            },
            ShapeGeometry::Box { size } => ShapeGeometry::Box { size: raw.size.unwrap_or(size) },
        };
        Self {
            id: raw.id,
            position: raw.position,
            shape_type: raw.shape_type,
            stroke_color: raw.stroke_color,
            fill_color: raw.fill_color,
            stroke_width: raw.stroke_width,
            stroke_style: raw.stroke_style,
            rotation: raw.rotation,
            text: raw.text,
            geometry,
        }
    }
}

impl From<ShapeBlock> for RawShapeBlock {
    fn from(shape: ShapeBlock) -> Self {
        let (size, start_point, end_point) = match shape.geometry {
            ShapeGeometry::Segment { start, end } => (None, Some(start), Some(end)),
            ShapeGeometry::Box { size } => (Some(size), None, None),
        };
        Self {
            id: shape.id,
            position: shape.position,
            shape_type: shape.shape_type,
            stroke_color: shape.stroke_color,
            fill_color: shape.fill_color,
            stroke_width: shape.stroke_width,
            stroke_style: shape.stroke_style,
            rotation: shape.rotation,
            text: shape.text,
            size,
            start_point,
            end_point,
        }
    }
}

impl ShapeBlock {
    /// A fresh shape of `shape_type` at `position` with default styling and geometry.
    #[must_use]
    pub fn new(shape_type: ShapeType, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            shape_type,
            stroke_color: default_stroke_color(),
            fill_color: default_shape_fill(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            stroke_style: StrokeStyle::Solid,
            rotation: 0.0,
            text: None,
            geometry: default_geometry(shape_type),
        }
    }

    /// Box size, or `None` for lines and arrows.
    #[must_use]
    pub fn size(&self) -> Option<BoxSize> {
        match self.geometry {
            ShapeGeometry::Box { size } => Some(size),
            ShapeGeometry::Segment { .. } => None,
        }
    }

    /// End points as offsets from `position`, or `None` for box shapes.
    #[must_use]
    pub fn segment(&self) -> Option<(Point, Point)> {
        match self.geometry {
            ShapeGeometry::Segment { start, end } => Some((start, end)),
            ShapeGeometry::Box { .. } => None,
        }
    }

    /// World-space end points of a line or arrow.
    #[must_use]
    pub fn world_segment(&self) -> Option<(Point, Point)> {
        self.segment().map(|(s, e)| {
            (
                Point::new(self.position.x + s.x, self.position.y + s.y),
                Point::new(self.position.x + e.x, self.position.y + e.y),
            )
        })
    }
}

/// An icon from the icon library, drawn in a square box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconBlock {
    pub id: BlockId,
    #[serde(default)]
    pub position: Point,
    pub icon_name: String,
    #[serde(default = "default_stroke_color")]
    pub color: String,
    #[serde(default = "default_icon_fill")]
    pub fill_color: String,
    #[serde(default = "default_icon_size")]
    pub size: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl IconBlock {
    /// A fresh icon at `position` with default colour and size.
    #[must_use]
    pub fn new(icon_name: impl Into<String>, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            icon_name: icon_name.into(),
            color: default_stroke_color(),
            fill_color: default_icon_fill(),
            size: DEFAULT_ICON_SIZE,
            rotation: 0.0,
        }
    }
}

/// A block on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Text(TextBlock),
    Shape(ShapeBlock),
    Icon(IconBlock),
}

impl Block {
    #[must_use]
    pub fn id(&self) -> BlockId {
        match self {
            Self::Text(b) => b.id,
            Self::Shape(b) => b.id,
            Self::Icon(b) => b.id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text(_) => BlockKind::Text,
            Self::Shape(_) => BlockKind::Shape,
            Self::Icon(_) => BlockKind::Icon,
        }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        match self {
            Self::Text(b) => b.position,
            Self::Shape(b) => b.position,
            Self::Icon(b) => b.position,
        }
    }

    /// Rotation in degrees. Text blocks never rotate.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        match self {
            Self::Text(_) => 0.0,
            Self::Shape(b) => b.rotation,
            Self::Icon(b) => b.rotation,
        }
    }

    #[must_use]
    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Shape(_))
    }

    /// World-space bounding box (unrotated).
    #[must_use]
    pub fn extent(&self) -> Rect {
        match self {
            Self::Text(b) => Rect::new(b.position.x, b.position.y, b.width, b.height),
            Self::Icon(b) => Rect::new(b.position.x, b.position.y, b.size, b.size),
            Self::Shape(b) => match b.geometry {
                ShapeGeometry::Box { size } => Rect::new(b.position.x, b.position.y, size.width, size.height),
                ShapeGeometry::Segment { start, end } => {
                    let x = start.x.min(end.x);
                    let y = start.y.min(end.y);
                    Rect::new(
                        b.position.x + x,
                        b.position.y + y,
                        (end.x - start.x).abs(),
                        (end.y - start.y).abs(),
                    )
                }
            },
        }
    }

    /// Reminder ids referenced by markers in this block's text content.
    #[must_use]
    pub fn reminder_ids(&self) -> Vec<String> {
        match self {
            Self::Text(b) => markers::scan_markers(&b.content)
                .into_iter()
                .filter(|m| m.kind == MarkerKind::Reminder)
                .map(|m| m.id)
                .collect(),
            Self::Shape(_) | Self::Icon(_) => Vec::new(),
        }
    }
}

// =============================================================
// Partial updates
// =============================================================

/// Sparse update for a block. Only present fields that apply to the
/// block's variant are merged; the rest are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    /// Text block width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Text block height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// `Some(None)` clears the background.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Option<String>>,
    /// Box shape size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<BoxSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_point: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_point: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    /// Fill for shapes and icons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<StrokeStyle>,
    /// Shape label; empty string clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Icon colour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Icon edge length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<f64>,
}

impl BlockPatch {
    #[must_use]
    pub fn position(p: Point) -> Self {
        Self { position: Some(p), ..Self::default() }
    }

    #[must_use]
    pub fn rotation(degrees: f64) -> Self {
        Self { rotation: Some(degrees), ..Self::default() }
    }

    /// Merge this patch into `block`.
    pub fn apply(&self, block: &mut Block) {
        match block {
            Block::Text(b) => self.apply_text(b),
            Block::Shape(b) => self.apply_shape(b),
            Block::Icon(b) => self.apply_icon(b),
        }
    }

    fn apply_text(&self, b: &mut TextBlock) {
        if let Some(p) = self.position {
            b.position = p;
        }
        if let Some(w) = self.width {
            b.width = w;
        }
        if let Some(h) = self.height {
            b.height = h;
        }
        if let Some(ref c) = self.content {
            b.content.clone_from(c);
        }
        if let Some(ref bg) = self.background_color {
            b.background_color.clone_from(bg);
        }
    }

    fn apply_shape(&self, b: &mut ShapeBlock) {
        if let Some(p) = self.position {
            b.position = p;
        }
        if let Some(r) = self.rotation {
            b.rotation = r;
        }
        if let Some(ref c) = self.stroke_color {
            b.stroke_color.clone_from(c);
        }
        if let Some(ref c) = self.fill_color {
            b.fill_color.clone_from(c);
        }
        if let Some(w) = self.stroke_width {
            b.stroke_width = w;
        }
        if let Some(s) = self.stroke_style {
            b.stroke_style = s;
        }
        if let Some(ref t) = self.text {
            b.text = if t.is_empty() { None } else { Some(t.clone()) };
        }
        match &mut b.geometry {
            ShapeGeometry::Box { size } => {
                if let Some(s) = self.size {
                    *size = s;
                }
            }
            ShapeGeometry::Segment { start, end } => {
                if let Some(p) = self.start_point {
                    *start = p;
                }
                if let Some(p) = self.end_point {
                    *end = p;
                }
            }
        }
    }

    fn apply_icon(&self, b: &mut IconBlock) {
        if let Some(p) = self.position {
            b.position = p;
        }
        if let Some(r) = self.rotation {
            b.rotation = r;
        }
        if let Some(ref c) = self.color {
            b.color.clone_from(c);
        }
        if let Some(ref c) = self.fill_color {
            b.fill_color.clone_from(c);
        }
        if let Some(s) = self.icon_size {
            b.size = s;
        }
    }
}

/// Build a block of `kind` with a fresh id and type defaults, then merge `patch`.
///
/// Shapes need a geometry family; `shape_type` is used for them and ignored otherwise.
#[must_use]
pub fn create_block(kind: BlockKind, shape_type: ShapeType, icon_name: &str, patch: &BlockPatch) -> Block {
    let origin = patch.position.unwrap_or_default();
    let mut block = match kind {
        BlockKind::Text => Block::Text(TextBlock::new(origin)),
        BlockKind::Shape => Block::Shape(ShapeBlock::new(shape_type, origin)),
        BlockKind::Icon => Block::Icon(IconBlock::new(icon_name, origin)),
    };
    patch.apply(&mut block);
    block
}

// =============================================================
// Store
// =============================================================

/// In-memory, insertion-ordered store of blocks.
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    blocks: Vec<Block>,
}

impl BlockStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Append a block, or replace the block with the same id in place.
    pub fn insert(&mut self, block: Block) {
        let id = block.id();
        if let Some(slot) = self.blocks.iter_mut().find(|b| b.id() == id) {
            *slot = block;
        } else {
            self.blocks.push(block);
        }
    }

    /// Remove a block by id, returning it if it was present.
    pub fn remove(&mut self, id: &BlockId) -> Option<Block> {
        let idx = self.blocks.iter().position(|b| b.id() == *id)?;
        Some(self.blocks.remove(idx))
    }

    #[must_use]
    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == *id)
    }

    pub fn get_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id() == *id)
    }

    /// Merge a patch into the block with `id`. Returns false if there is no such block.
    pub fn apply_patch(&mut self, id: &BlockId, patch: &BlockPatch) -> bool {
        let Some(block) = self.get_mut(id) else {
            return false;
        };
        patch.apply(block);
        true
    }

    /// Replace all blocks with a loaded snapshot.
    pub fn load(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
    }

    /// Blocks in insertion order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Blocks in draw order: all non-shape blocks, then all shapes.
    #[must_use]
    pub fn draw_order(&self) -> Vec<&Block> {
        let (shapes, others): (Vec<&Block>, Vec<&Block>) = self.blocks.iter().partition(|b| b.is_shape());
        others.into_iter().chain(shapes).collect()
    }

    /// World extents of every block.
    pub fn extents(&self) -> impl Iterator<Item = Rect> + '_ {
        self.blocks.iter().map(Block::extent)
    }

    /// Where an AI summary block goes: right of the rightmost non-shape block,
    /// wrapping below the lowest one when that is too far right.
    #[must_use]
    pub fn summary_position(&self) -> Point {
        const GAP: f64 = 30.0;
        const MARGIN: f64 = 50.0;
        const WRAP_X: f64 = 800.0;
        const FALLBACK_W: f64 = 300.0;
        const FALLBACK_H: f64 = 200.0;

        let boxes: Vec<(Point, f64, f64)> = self
            .blocks
            .iter()
            .filter(|b| !b.is_shape())
            .map(|b| match b {
                Block::Text(t) => (t.position, t.width, t.height),
                other => {
                    let r = other.extent();
                    (other.position(), r.width, r.height)
                }
            })
            .map(|(p, w, h)| {
                let w = if w > 0.0 { w } else { FALLBACK_W };
                let h = if h > 0.0 { h } else { FALLBACK_H };
                (p, w, h)
            })
            .collect();

        let Some(rightmost) = boxes.iter().map(|(p, w, _)| p.x + w).reduce(f64::max) else {
            return Point::new(MARGIN, MARGIN);
        };

        let x = rightmost + GAP;
        if x <= WRAP_X {
            return Point::new(x, MARGIN);
        }
        let lowest = boxes.iter().map(|(p, _, h)| p.y + h).fold(f64::MIN, f64::max);
        Point::new(MARGIN, lowest + GAP)
    }

    /// Build the AI summary text block for `html`, positioned by `summary_position`.
    #[must_use]
    pub fn summary_block(&self, html: &str) -> Block {
        let mut block = TextBlock::new(self.summary_position());
        block.width = 400.0;
        block.height = 300.0;
        block.content = format!("{SUMMARY_HEADING}{html}");
        block.background_color = Some(SUMMARY_BACKGROUND.to_string());
        Block::Text(block)
    }

    /// Number of blocks currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the store contains no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
