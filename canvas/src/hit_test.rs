#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{IconBlock, ShapeBlock, ShapeGeometry, ShapeType, TextBlock};

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn close(a: Point, b: Point) -> bool {
    a.distance(b) < 1e-9
}

fn store_with(blocks: Vec<Block>) -> BlockStore {
    let mut store = BlockStore::new();
    store.load(blocks);
    store
}

// =============================================================
// Geometry helpers
// =============================================================

#[test]
fn rotate_about_quarter_turn() {
    let p = rotate_about(pt(10.0, 0.0), pt(0.0, 0.0), 90.0);
    assert!(close(p, pt(0.0, 10.0)));
}

#[test]
fn distance_to_segment_clamps_to_ends() {
    assert_eq!(distance_to_segment(pt(5.0, 3.0), pt(0.0, 0.0), pt(10.0, 0.0)), 3.0);
    assert_eq!(distance_to_segment(pt(-4.0, 3.0), pt(0.0, 0.0), pt(10.0, 0.0)), 5.0);
    assert_eq!(distance_to_segment(pt(3.0, 4.0), pt(0.0, 0.0), pt(0.0, 0.0)), 5.0);
}

// =============================================================
// Bodies
// =============================================================

#[test]
fn empty_canvas_hits_nothing() {
    assert!(hit_test(pt(10.0, 10.0), &BlockStore::new(), &Camera::default(), None).is_none());
}

#[test]
fn text_body_hit_through_camera() {
    let text = Block::Text(TextBlock::new(pt(100.0, 100.0)));
    let id = text.id();
    let store = store_with(vec![text]);
    let camera = Camera { x: -50.0, y: 0.0, zoom: 0.5 };
    // World (120, 110) is screen (10, 55).
    let hit = hit_test(pt(10.0, 55.0), &store, &camera, None).unwrap();
    assert_eq!(hit, Hit { block_id: id, part: HitPart::Body });
}

#[test]
fn shapes_win_over_text_underneath() {
    let text = Block::Text(TextBlock::new(pt(0.0, 0.0)));
    let rect = Block::Shape(ShapeBlock::new(ShapeType::Rectangle, pt(10.0, 10.0)));
    let rect_id = rect.id();
    // Shape inserted first still draws on top.
    let store = store_with(vec![rect, text]);
    let hit = hit_test(pt(20.0, 20.0), &store, &Camera::default(), None).unwrap();
    assert_eq!(hit.block_id, rect_id);
}

#[test]
fn line_hit_uses_padding() {
    let line = Block::Shape(ShapeBlock::new(ShapeType::Line, pt(0.0, 100.0)));
    let store = store_with(vec![line]);
    assert!(hit_test(pt(75.0, 114.0), &store, &Camera::default(), None).is_some());
    assert!(hit_test(pt(75.0, 116.0), &store, &Camera::default(), None).is_none());
}

#[test]
fn rotated_shape_tested_in_local_frame() {
    let mut shape = ShapeBlock::new(ShapeType::Rectangle, pt(0.0, 0.0));
    shape.geometry = ShapeGeometry::Box { size: crate::doc::BoxSize::new(200.0, 20.0) };
    shape.rotation = 90.0;
    let store = store_with(vec![Block::Shape(shape)]);
    // Unrotated this would be inside; rotated a quarter turn it is not.
    assert!(hit_test(pt(190.0, 10.0), &store, &Camera::default(), None).is_none());
    // Above the centre along the rotated long axis.
    assert!(hit_test(pt(100.0, -80.0), &store, &Camera::default(), None).is_some());
}

// =============================================================
// Handles
// =============================================================

#[test]
fn handles_only_for_selected_block() {
    let rect = Block::Shape(ShapeBlock::new(ShapeType::Rectangle, pt(0.0, 0.0)));
    let id = rect.id();
    let store = store_with(vec![rect]);
    let camera = Camera::default();

    let unselected = hit_test(pt(100.0, 100.0), &store, &camera, None).unwrap();
    assert_eq!(unselected.part, HitPart::Body);

    let selected = hit_test(pt(100.0, 100.0), &store, &camera, Some(id)).unwrap();
    assert_eq!(selected.part, HitPart::Corner(Corner::Se));
}

#[test]
fn rotate_handle_sits_above_box() {
    let rect = Block::Shape(ShapeBlock::new(ShapeType::Rectangle, pt(0.0, 0.0)));
    let id = rect.id();
    let store = store_with(vec![rect]);
    let hit = hit_test(pt(50.0, -24.0), &store, &Camera::default(), Some(id)).unwrap();
    assert_eq!(hit.part, HitPart::Rotate);
}

#[test]
fn line_handles_are_endpoints() {
    let line = Block::Shape(ShapeBlock::new(ShapeType::Arrow, pt(10.0, 10.0)));
    let hs = handles(&line, &Camera::default());
    assert_eq!(hs.len(), 2);
    assert_eq!(hs[0], Handle { part: HitPart::Endpoint(SegmentEnd::Start), at: pt(10.0, 10.0) });
    assert_eq!(hs[1], Handle { part: HitPart::Endpoint(SegmentEnd::End), at: pt(160.0, 10.0) });
}

#[test]
fn handle_radius_is_in_screen_pixels() {
    let icon = Block::Icon(IconBlock::new("Star", pt(0.0, 0.0)));
    let id = icon.id();
    let store = store_with(vec![icon]);
    let camera = Camera { x: 0.0, y: 0.0, zoom: 2.0 };
    // Icon corner at world (48, 48) is screen (96, 96).
    let hit = hit_test(pt(103.0, 96.0), &store, &camera, Some(id)).unwrap();
    assert_eq!(hit.part, HitPart::IconResize);
}

#[test]
fn text_block_has_single_resize_handle() {
    let text = Block::Text(TextBlock::new(pt(0.0, 0.0)));
    let hs = handles(&text, &Camera::default());
    assert_eq!(hs, vec![Handle { part: HitPart::TextResize, at: pt(450.0, 180.0) }]);
}
