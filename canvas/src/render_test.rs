#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{IconBlock, ShapeGeometry, TextBlock};
use crate::draw::DrawSession;
use crate::listeners::{ListenerKind, ListenerRegistry};

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn store_with(blocks: Vec<Block>) -> BlockStore {
    let mut store = BlockStore::new();
    store.load(blocks);
    store
}

// =============================================================
// Strokes and shape geometry
// =============================================================

#[test]
fn dash_patterns_scale_with_width() {
    assert_eq!(dash_array(StrokeStyle::Solid, 3.0), None);
    assert_eq!(dash_array(StrokeStyle::Dashed, 3.0), Some((12.0, 6.0)));
    assert_eq!(dash_array(StrokeStyle::Dotted, 3.0), Some((3.0, 6.0)));
}

#[test]
fn every_shape_type_has_a_renderer() {
    for (shape_type, _) in SHAPE_RENDERERS {
        let shape = ShapeBlock::new(shape_type, pt(0.0, 0.0));
        let path = shape_renderer(shape_type)(&shape);
        let segment = matches!(path, ShapePath::Segment { .. });
        assert_eq!(segment, shape_type.is_linear(), "{shape_type:?}");
    }
}

#[test]
fn arrow_line_stops_short_of_tip() {
    let shape = ShapeBlock::new(ShapeType::Arrow, pt(10.0, 0.0));
    let ShapePath::Segment { from, to, head } = arrow_path(&shape) else {
        panic!("expected segment");
    };
    assert_eq!(from, pt(10.0, 0.0));
    assert_eq!(to, pt(160.0 - ARROW_LINE_INSET, 0.0));
    let head = head.unwrap();
    assert_eq!(head[0], pt(160.0, 0.0));
    assert_eq!(head[1], pt(150.0, 5.0));
    assert_eq!(head[2], pt(150.0, -5.0));
}

#[test]
fn zero_length_arrow_has_no_head() {
    let mut shape = ShapeBlock::new(ShapeType::Arrow, pt(0.0, 0.0));
    shape.geometry = ShapeGeometry::Segment { start: pt(5.0, 5.0), end: pt(5.0, 5.0) };
    assert!(matches!(arrow_path(&shape), ShapePath::Segment { head: None, .. }));
}

#[test]
fn box_paths_are_inset_by_half_stroke() {
    let mut shape = ShapeBlock::new(ShapeType::Rectangle, pt(0.0, 0.0));
    shape.stroke_width = 4.0;
    assert_eq!(rect_path(&shape), ShapePath::Rect(Rect::new(2.0, 2.0, 96.0, 96.0)));
    assert_eq!(ellipse_path(&shape), ShapePath::Ellipse { center: pt(50.0, 50.0), rx: 48.0, ry: 48.0 });
    assert_eq!(
        triangle_path(&shape),
        ShapePath::Polygon([pt(50.0, 2.0), pt(2.0, 98.0), pt(98.0, 98.0)])
    );
}

#[test]
fn icon_names_fall_back() {
    assert_eq!(resolve_icon_name("Star"), "Star");
    assert_eq!(resolve_icon_name("star"), "HelpCircle");
    assert_eq!(resolve_icon_name("StarIcon"), "HelpCircle");
    assert_eq!(resolve_icon_name("LucideIcon"), "HelpCircle");
    assert_eq!(resolve_icon_name(""), "HelpCircle");
}

// =============================================================
// Scene
// =============================================================

#[test]
fn scene_content_follows_draw_order() {
    let shape = Block::Shape(ShapeBlock::new(ShapeType::Circle, pt(0.0, 0.0)));
    let text = Block::Text(TextBlock::new(pt(0.0, 0.0)));
    let icon = Block::Icon(IconBlock::new("Bell", pt(0.0, 0.0)));
    let store = store_with(vec![shape, text, icon]);
    let scene = build_scene(&store, &Camera::default(), &UiState::default(), &InputState::Idle);

    assert!(matches!(scene.content[0], SceneItem::Text { .. }));
    assert!(matches!(scene.content[1], SceneItem::Icon { .. }));
    assert!(matches!(scene.content[2], SceneItem::Shape { .. }));
    assert!(scene.selection.is_none());
    assert!(scene.handles.is_empty());
    assert!(scene.preview.is_none());
}

#[test]
fn scene_shows_selection_in_screen_space() {
    let shape = Block::Shape(ShapeBlock::new(ShapeType::Rectangle, pt(10.0, 10.0)));
    let id = shape.id();
    let store = store_with(vec![shape]);
    let ui = UiState { selected_id: Some(id), ..UiState::default() };
    let camera = Camera { x: 0.0, y: 0.0, zoom: 2.0 };
    let scene = build_scene(&store, &camera, &ui, &InputState::Idle);

    assert_eq!(scene.selection, Some((Rect::new(20.0, 20.0, 200.0, 200.0), 0.0)));
    assert_eq!(scene.handles.len(), 5);
}

#[test]
fn scene_includes_draw_preview() {
    let registry = ListenerRegistry::new();
    let mut session = DrawSession::begin(ShapeType::Rectangle, pt(0.0, 0.0));
    session.update(pt(10.0, 10.0));
    let input = InputState::Drawing { session, listeners: registry.subscribe(&[ListenerKind::PointerMove]) };
    let camera = Camera { x: 0.0, y: 0.0, zoom: 2.0 };
    let scene = build_scene(&BlockStore::new(), &camera, &UiState::default(), &input);

    let preview = scene.preview.unwrap();
    assert_eq!(preview.geometry, PreviewGeometry::Rectangle(Rect::new(0.0, 0.0, 20.0, 20.0)));
    assert_eq!(preview.stroke.width, 4.0);
}
