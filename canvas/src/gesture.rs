//! Pointer-driven edits of an existing block.
//!
//! Each gesture snapshots the block and pointer state at pointer-down and
//! maps every later pointer position to an absolute [`BlockPatch`]. Deltas
//! are always measured from the start snapshot, never accumulated, so
//! replaying the same pointer position yields the same patch. Screen deltas
//! are divided by the zoom captured at the start of the gesture.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use crate::camera::Point;
use crate::consts::{MIN_ICON_SIZE, MIN_SHAPE_SIZE, TEXT_MIN_HEIGHT, TEXT_MIN_WIDTH};
use crate::doc::{BlockPatch, BoxSize};

/// Corner handle of a box shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::Nw, Corner::Ne, Corner::Sw, Corner::Se];

    fn is_west(self) -> bool {
        matches!(self, Self::Nw | Self::Sw)
    }

    fn is_north(self) -> bool {
        matches!(self, Self::Nw | Self::Ne)
    }

    /// Unit offset of this corner from the box centre, in half-extents.
    #[must_use]
    pub fn sign(self) -> (f64, f64) {
        match self {
            Self::Nw => (-1.0, -1.0),
            Self::Ne => (1.0, -1.0),
            Self::Sw => (-1.0, 1.0),
            Self::Se => (1.0, 1.0),
        }
    }
}

/// Which end of a line or arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentEnd {
    Start,
    End,
}

/// Screen delta since the gesture began, in world units.
fn world_delta(start_screen: Point, screen: Point, zoom: f64) -> (f64, f64) {
    ((screen.x - start_screen.x) / zoom, (screen.y - start_screen.y) / zoom)
}

/// Move a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture {
    pub start_screen: Point,
    pub start_position: Point,
    pub zoom: f64,
}

impl DragGesture {
    #[must_use]
    pub fn position_at(&self, screen: Point) -> Point {
        let (dx, dy) = world_delta(self.start_screen, screen, self.zoom);
        Point::new(self.start_position.x + dx, self.start_position.y + dy)
    }
}

/// Resize a box shape from one corner; the opposite corner stays put.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxResizeGesture {
    pub corner: Corner,
    pub start_screen: Point,
    pub start_position: Point,
    pub start_size: BoxSize,
    pub zoom: f64,
}

impl BoxResizeGesture {
    /// New position and size. Each side is clamped to at least the minimum shape size.
    #[must_use]
    pub fn resize_at(&self, screen: Point) -> (Point, BoxSize) {
        let (dx, dy) = world_delta(self.start_screen, screen, self.zoom);
        let (x0, y0) = (self.start_position.x, self.start_position.y);
        let (w0, h0) = (self.start_size.width, self.start_size.height);

        let (x, width) = if self.corner.is_west() {
            let shift = dx.min(w0 - MIN_SHAPE_SIZE);
            (x0 + shift, w0 - shift)
        } else {
            (x0, (w0 + dx).max(MIN_SHAPE_SIZE))
        };
        let (y, height) = if self.corner.is_north() {
            let shift = dy.min(h0 - MIN_SHAPE_SIZE);
            (y0 + shift, h0 - shift)
        } else {
            (y0, (h0 + dy).max(MIN_SHAPE_SIZE))
        };
        (Point::new(x, y), BoxSize::new(width, height))
    }
}

/// Move one end point of a line or arrow. The block position is unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointGesture {
    pub end: SegmentEnd,
    pub start_screen: Point,
    /// The end point's offset from the block position at the start.
    pub start_point: Point,
    pub zoom: f64,
}

impl EndpointGesture {
    #[must_use]
    pub fn point_at(&self, screen: Point) -> Point {
        let (dx, dy) = world_delta(self.start_screen, screen, self.zoom);
        Point::new(self.start_point.x + dx, self.start_point.y + dy)
    }
}

/// Uniformly scale an icon by the averaged pointer delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconResizeGesture {
    pub start_screen: Point,
    pub start_size: f64,
    pub zoom: f64,
}

impl IconResizeGesture {
    #[must_use]
    pub fn size_at(&self, screen: Point) -> f64 {
        let (dx, dy) = world_delta(self.start_screen, screen, self.zoom);
        (self.start_size + (dx + dy) / 2.0).max(MIN_ICON_SIZE)
    }
}

/// Resize a text block from its bottom-right corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextResizeGesture {
    pub start_screen: Point,
    pub start_width: f64,
    pub start_height: f64,
    pub zoom: f64,
}

impl TextResizeGesture {
    #[must_use]
    pub fn size_at(&self, screen: Point) -> (f64, f64) {
        let (dx, dy) = world_delta(self.start_screen, screen, self.zoom);
        ((self.start_width + dx).max(TEXT_MIN_WIDTH), (self.start_height + dy).max(TEXT_MIN_HEIGHT))
    }
}

/// Rotate a block around its on-screen centre, relative to where the pointer started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateGesture {
    /// Screen-space centre of the block.
    pub center: Point,
    /// Pointer angle at the start, in degrees.
    pub start_angle: f64,
    pub start_rotation: f64,
}

/// Angle of `p` around `center` in degrees, clockwise from +x in screen space.
#[must_use]
pub fn pointer_angle(center: Point, p: Point) -> f64 {
    (p.y - center.y).atan2(p.x - center.x).to_degrees()
}

impl RotateGesture {
    #[must_use]
    pub fn begin(center: Point, pointer: Point, start_rotation: f64) -> Self {
        Self { center, start_angle: pointer_angle(center, pointer), start_rotation }
    }

    #[must_use]
    pub fn rotation_at(&self, screen: Point) -> f64 {
        self.start_rotation + (pointer_angle(self.center, screen) - self.start_angle)
    }
}

/// An in-progress edit of one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Drag(DragGesture),
    ResizeBox(BoxResizeGesture),
    Endpoint(EndpointGesture),
    ResizeIcon(IconResizeGesture),
    ResizeText(TextResizeGesture),
    Rotate(RotateGesture),
}

impl Gesture {
    /// The patch that puts the block where the pointer at `screen` says it should be.
    #[must_use]
    pub fn patch_at(&self, screen: Point) -> BlockPatch {
        match self {
            Self::Drag(g) => BlockPatch::position(g.position_at(screen)),
            Self::ResizeBox(g) => {
                let (position, size) = g.resize_at(screen);
                BlockPatch { position: Some(position), size: Some(size), ..BlockPatch::default() }
            }
            Self::Endpoint(g) => {
                let p = g.point_at(screen);
                match g.end {
                    SegmentEnd::Start => BlockPatch { start_point: Some(p), ..BlockPatch::default() },
                    SegmentEnd::End => BlockPatch { end_point: Some(p), ..BlockPatch::default() },
                }
            }
            Self::ResizeIcon(g) => BlockPatch { icon_size: Some(g.size_at(screen)), ..BlockPatch::default() },
            Self::ResizeText(g) => {
                let (w, h) = g.size_at(screen);
                BlockPatch { width: Some(w), height: Some(h), ..BlockPatch::default() }
            }
            Self::Rotate(g) => BlockPatch::rotation(g.rotation_at(screen)),
        }
    }

    /// Cursor shown while the gesture is active.
    #[must_use]
    pub fn cursor(&self) -> &'static str {
        match self {
            Self::Drag(_) => "grabbing",
            Self::ResizeBox(g) => match g.corner {
                Corner::Nw | Corner::Se => "nwse-resize",
                Corner::Ne | Corner::Sw => "nesw-resize",
            },
            Self::ResizeIcon(_) | Self::ResizeText(_) => "nwse-resize",
            Self::Endpoint(_) => "crosshair",
            Self::Rotate(_) => "alias",
        }
    }
}
