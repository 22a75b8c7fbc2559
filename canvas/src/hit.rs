//! Hit-testing: which block, and which part of it, is under the pointer.
//!
//! Handles are only shown for the selected block and sit on top of
//! everything else, so they are tested first, in screen space with a fixed
//! pixel radius. Bodies are tested in world space, topmost first in draw
//! order. Rotated shapes and icons are tested in their local frame.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point};
use crate::consts::{HANDLE_RADIUS_PX, LINE_HIT_PADDING, ROTATE_HANDLE_OFFSET_PX};
use crate::doc::{Block, BlockId, BlockStore};
use crate::gesture::{Corner, SegmentEnd};

/// Which part of a block was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    /// Corner handle of a box shape.
    Corner(Corner),
    /// End point handle of a line or arrow.
    Endpoint(SegmentEnd),
    /// Bottom-right handle of an icon.
    IconResize,
    /// Bottom-right handle of a text block.
    TextResize,
    /// Rotation handle above a box shape.
    Rotate,
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub block_id: BlockId,
    pub part: HitPart,
}

/// A handle drawn for the selected block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub part: HitPart,
    /// Screen-space centre.
    pub at: Point,
}

/// Rotate `p` around `center` by `degrees` clockwise (screen convention, y down).
#[must_use]
pub fn rotate_about(p: Point, center: Point, degrees: f64) -> Point {
    if degrees == 0.0 {
        return p;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
}

/// Handles for `block` when it is selected, in screen space.
#[must_use]
pub fn handles(block: &Block, camera: &Camera) -> Vec<Handle> {
    let rect = camera.world_rect_to_screen(block.extent());
    let center = rect.center();
    let rotation = block.rotation();
    let place = |part, p: Point| Handle { part, at: rotate_about(p, center, rotation) };

    match block {
        Block::Text(_) => vec![place(HitPart::TextResize, Point::new(rect.right(), rect.bottom()))],
        Block::Icon(_) => vec![place(HitPart::IconResize, Point::new(rect.right(), rect.bottom()))],
        Block::Shape(shape) => {
            if let Some((start, end)) = shape.world_segment() {
                return vec![
                    Handle { part: HitPart::Endpoint(SegmentEnd::Start), at: camera.world_to_screen(start) },
                    Handle { part: HitPart::Endpoint(SegmentEnd::End), at: camera.world_to_screen(end) },
                ];
            }
            let mut out = vec![place(HitPart::Rotate, Point::new(center.x, rect.y - ROTATE_HANDLE_OFFSET_PX))];
            for corner in Corner::ALL {
                let (sx, sy) = corner.sign();
                let p = Point::new(center.x + sx * rect.width / 2.0, center.y + sy * rect.height / 2.0);
                out.push(place(HitPart::Corner(corner), p));
            }
            out
        }
    }
}

/// Whether `world` is on the body of `block`.
#[must_use]
pub fn hits_body(block: &Block, world: Point) -> bool {
    if let Block::Shape(shape) = block {
        if let Some((a, b)) = shape.world_segment() {
            let pad = LINE_HIT_PADDING.max(shape.stroke_width / 2.0);
            return distance_to_segment(world, a, b) <= pad;
        }
    }
    let extent = block.extent();
    let local = rotate_about(world, extent.center(), -block.rotation());
    extent.contains(local)
}

/// Shortest distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let len_sq = vx * vx + vy * vy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * vx + (p.y - a.y) * vy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * vx, a.y + t * vy))
}

/// Which block (if any) is under `screen`, checking the selected block's handles first.
#[must_use]
pub fn hit_test(screen: Point, store: &BlockStore, camera: &Camera, selected_id: Option<BlockId>) -> Option<Hit> {
    if let Some(selected) = selected_id.and_then(|id| store.get(&id)) {
        let handle = handles(selected, camera)
            .into_iter()
            .find(|h| h.at.distance(screen) <= HANDLE_RADIUS_PX);
        if let Some(h) = handle {
            return Some(Hit { block_id: selected.id(), part: h.part });
        }
    }

    let world = camera.screen_to_world(screen);
    store
        .draw_order()
        .into_iter()
        .rev()
        .find(|b| hits_body(b, world))
        .map(|b| Hit { block_id: b.id(), part: HitPart::Body })
}
