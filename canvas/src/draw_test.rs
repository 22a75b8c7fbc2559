#![allow(clippy::float_cmp)]

use super::*;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn drawn(shape_type: ShapeType, from: Point, to: Point) -> Option<ShapeBlock> {
    let mut session = DrawSession::begin(shape_type, from);
    session.update(to);
    session.commit(&DrawStyle::default())
}

#[test]
fn short_drag_is_discarded() {
    assert!(drawn(ShapeType::Rectangle, pt(0.0, 0.0), pt(4.9, 0.0)).is_none());
    assert!(drawn(ShapeType::Line, pt(10.0, 10.0), pt(10.0, 10.0)).is_none());
}

#[test]
fn drag_past_threshold_commits() {
    let shape = drawn(ShapeType::Rectangle, pt(0.0, 0.0), pt(5.1, 0.0)).unwrap();
    assert_eq!(shape.position, pt(0.0, 0.0));
    assert_eq!(shape.size(), Some(BoxSize::new(20.0, 20.0)));
}

#[test]
fn threshold_is_inclusive() {
    assert!(drawn(ShapeType::Circle, pt(0.0, 0.0), pt(3.0, 4.0)).is_some());
}

#[test]
fn line_offsets_are_relative_to_min_corner() {
    let shape = drawn(ShapeType::Arrow, pt(100.0, 50.0), pt(20.0, 80.0)).unwrap();
    assert_eq!(shape.position, pt(20.0, 50.0));
    assert_eq!(shape.segment(), Some((pt(80.0, 0.0), pt(0.0, 30.0))));
    assert_eq!(shape.world_segment(), Some((pt(100.0, 50.0), pt(20.0, 80.0))));
}

#[test]
fn box_drawn_up_and_left_normalises() {
    let shape = drawn(ShapeType::Triangle, pt(200.0, 200.0), pt(120.0, 150.0)).unwrap();
    assert_eq!(shape.position, pt(120.0, 150.0));
    assert_eq!(shape.size(), Some(BoxSize::new(80.0, 50.0)));
}

#[test]
fn commit_applies_draw_style() {
    let style = DrawStyle {
        stroke_color: "#ef4444".into(),
        stroke_width: 4.0,
        stroke_style: StrokeStyle::Dashed,
        fill_color: "#fee2e2".into(),
    };
    let mut session = DrawSession::begin(ShapeType::Circle, pt(0.0, 0.0));
    session.update(pt(60.0, 40.0));
    let shape = session.commit(&style).unwrap();
    assert_eq!(shape.stroke_color, "#ef4444");
    assert_eq!(shape.stroke_width, 4.0);
    assert_eq!(shape.stroke_style, StrokeStyle::Dashed);
    assert_eq!(shape.fill_color, "#fee2e2");
}

#[test]
fn preview_tracks_pointer_in_screen_space() {
    let camera = Camera { x: 10.0, y: 20.0, zoom: 2.0 };
    let mut session = DrawSession::begin(ShapeType::Rectangle, pt(0.0, 0.0));
    session.update(pt(50.0, 25.0));
    assert_eq!(session.preview(&camera), PreviewGeometry::Rectangle(Rect::new(10.0, 20.0, 100.0, 50.0)));

    let session = DrawSession { shape_type: ShapeType::Arrow, ..session };
    assert_eq!(
        session.preview(&camera),
        PreviewGeometry::Segment { from: pt(10.0, 20.0), to: pt(110.0, 70.0), arrow: true }
    );
}

#[test]
fn preview_circle_and_triangle() {
    let camera = Camera::default();
    let mut session = DrawSession::begin(ShapeType::Circle, pt(100.0, 100.0));
    session.update(pt(0.0, 40.0));
    assert_eq!(session.preview(&camera), PreviewGeometry::Ellipse { center: pt(50.0, 70.0), rx: 50.0, ry: 30.0 });

    let session = DrawSession { shape_type: ShapeType::Triangle, ..session };
    assert_eq!(
        session.preview(&camera),
        PreviewGeometry::Triangle([pt(50.0, 40.0), pt(0.0, 100.0), pt(100.0, 100.0)])
    );
}
