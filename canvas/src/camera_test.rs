#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- Point / Rect ---

#[test]
fn point_distance() {
    assert!(approx_eq(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0));
}

#[test]
fn rect_union_spans_both() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(20.0, -5.0, 5.0, 5.0);
    assert_eq!(a.union(&b), Rect::new(0.0, -5.0, 25.0, 15.0));
}

#[test]
fn rect_contains_edges() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(r.contains(Point::new(10.0, 10.0)));
    assert!(!r.contains(Point::new(10.1, 5.0)));
}

// --- Camera defaults ---

#[test]
fn camera_default_is_identity() {
    let cam = Camera::default();
    assert_eq!(cam, Camera { x: 0.0, y: 0.0, zoom: 1.0 });
}

// --- Coordinate conversion ---

#[test]
fn screen_to_world_with_pan_and_zoom() {
    let cam = Camera { x: 100.0, y: 50.0, zoom: 2.0 };
    let world = cam.screen_to_world(Point::new(300.0, 250.0));
    assert!(point_approx_eq(world, Point::new(100.0, 100.0)));
}

#[test]
fn world_to_screen_with_pan_and_zoom() {
    let cam = Camera { x: 100.0, y: 50.0, zoom: 2.0 };
    let screen = cam.world_to_screen(Point::new(100.0, 100.0));
    assert!(point_approx_eq(screen, Point::new(300.0, 250.0)));
}

#[test]
fn coordinate_round_trip_over_many_cameras() {
    let points = [(0.0, 0.0), (123.5, -77.25), (-1000.0, 999.0), (0.001, 5e4)];
    let cameras = [
        Camera::default(),
        Camera { x: -340.0, y: 12.5, zoom: 0.25 },
        Camera { x: 17.0, y: -900.0, zoom: 2.0 },
        Camera { x: 3.3, y: 4.4, zoom: 1.37 },
    ];
    for cam in cameras {
        for (x, y) in points {
            let p = Point::new(x, y);
            let back = cam.screen_to_world(cam.world_to_screen(p));
            assert!((back.x - p.x).abs() < 1e-6 && (back.y - p.y).abs() < 1e-6, "{cam:?} {p:?}");
        }
    }
}

#[test]
fn screen_dist_to_world_divides_by_zoom() {
    let cam = Camera { x: 0.0, y: 0.0, zoom: 0.5 };
    assert!(approx_eq(cam.screen_dist_to_world(10.0), 20.0));
}

// --- Pan ---

#[test]
fn pan_moves_by_raw_screen_delta() {
    let mut cam = Camera::default();
    cam.pan(50.0, -20.0);
    assert_eq!(cam, Camera { x: 50.0, y: -20.0, zoom: 1.0 });
}

#[test]
fn pan_ignores_zoom() {
    let mut cam = Camera { x: 0.0, y: 0.0, zoom: 2.0 };
    cam.pan(10.0, 10.0);
    assert!(approx_eq(cam.x, 10.0));
    assert!(approx_eq(cam.y, 10.0));
}

// --- Zoom ---

#[test]
fn zoom_at_clamps_repeatedly() {
    let mut cam = Camera::default();
    for _ in 0..100 {
        cam.zoom_at(Point::new(400.0, 300.0), 1.1);
        assert!(cam.zoom <= 2.0 && cam.zoom >= 0.25);
    }
    assert!(approx_eq(cam.zoom, 2.0));
    for _ in 0..100 {
        cam.zoom_at(Point::new(10.0, 700.0), 0.9);
        assert!(cam.zoom <= 2.0 && cam.zoom >= 0.25);
    }
    assert!(approx_eq(cam.zoom, 0.25));
}

#[test]
fn zoom_at_extreme_factors_stay_in_range() {
    for factor in [0.0, 1e-9, 0.5, 3.0, 1e9] {
        let mut cam = Camera { x: 5.0, y: 5.0, zoom: 1.0 };
        cam.zoom_at(Point::new(1.0, 1.0), factor);
        assert!((0.25..=2.0).contains(&cam.zoom), "factor {factor}");
    }
}

#[test]
fn zoom_at_keeps_anchor_fixed() {
    let mut cam = Camera { x: 30.0, y: -12.0, zoom: 0.8 };
    let anchor = Point::new(420.0, 260.0);
    let world_before = cam.screen_to_world(anchor);
    cam.zoom_at(anchor, 1.1);
    let screen_after = cam.world_to_screen(world_before);
    assert!(point_approx_eq(screen_after, anchor));
}

#[test]
fn zoom_at_anchor_fixed_even_when_clamped() {
    let mut cam = Camera { x: 0.0, y: 0.0, zoom: 1.9 };
    let anchor = Point::new(200.0, 100.0);
    let world_before = cam.screen_to_world(anchor);
    cam.zoom_at(anchor, 5.0);
    assert!(approx_eq(cam.zoom, 2.0));
    assert!(point_approx_eq(cam.world_to_screen(world_before), anchor));
}

#[test]
fn zoom_buttons_step_and_clamp() {
    let mut cam = Camera::default();
    cam.zoom_in();
    assert!(approx_eq(cam.zoom, 1.1));
    cam.zoom = 0.3;
    cam.zoom_out();
    assert!(approx_eq(cam.zoom, 0.25));
}

// --- Zoom to fit ---

#[test]
fn zoom_to_fit_empty_resets() {
    let mut cam = Camera { x: 99.0, y: 99.0, zoom: 1.7 };
    cam.zoom_to_fit(Vec::new(), Size::new(800.0, 600.0));
    assert_eq!(cam, Camera::default());
}

#[test]
fn zoom_to_fit_three_blocks_scenario() {
    let extents = vec![
        Rect::new(0.0, 0.0, 50.0, 50.0),
        Rect::new(100.0, 100.0, 100.0, 50.0),
        Rect::new(20.0, 250.0, 30.0, 50.0),
    ];
    let mut cam = Camera::default();
    cam.zoom_to_fit(extents, Size::new(800.0, 600.0));

    // Padded box is 300×400; it fits at 100% without zooming in further.
    assert!(cam.zoom <= 1.0);
    assert!(300.0 * cam.zoom <= 800.0 && 400.0 * cam.zoom <= 600.0);
    assert!(approx_eq(cam.zoom, 1.0));

    // Content centre (100,150) lands on the viewport centre.
    let center = cam.world_to_screen(Point::new(100.0, 150.0));
    assert!(point_approx_eq(center, Point::new(400.0, 300.0)));
}

#[test]
fn zoom_to_fit_shrinks_large_content() {
    let mut cam = Camera::default();
    cam.zoom_to_fit(vec![Rect::new(-500.0, 0.0, 1500.0, 400.0)], Size::new(800.0, 600.0));
    assert!(approx_eq(cam.zoom, 800.0 / 1600.0));
    let center = cam.world_to_screen(Point::new(250.0, 200.0));
    assert!(point_approx_eq(center, Point::new(400.0, 300.0)));
}

#[test]
fn zoom_to_fit_never_goes_below_min_zoom() {
    let mut cam = Camera::default();
    cam.zoom_to_fit(vec![Rect::new(0.0, 0.0, 100_000.0, 100.0)], Size::new(800.0, 600.0));
    assert!(approx_eq(cam.zoom, 0.25));
}

// --- Serde ---

#[test]
fn camera_serializes_as_xy_zoom() {
    let json = serde_json::to_value(Camera { x: 1.0, y: 2.0, zoom: 0.5 }).unwrap_or_default();
    assert_eq!(json, serde_json::json!({ "x": 1.0, "y": 2.0, "zoom": 0.5 }));
}

#[test]
fn camera_deserialize_clamps_and_repairs_zoom() {
    let cam: Camera = serde_json::from_value(serde_json::json!({ "x": 1.0, "y": 2.0, "zoom": 9.0 })).unwrap();
    assert!(approx_eq(cam.zoom, 2.0));

    let cam: Camera = serde_json::from_value(serde_json::json!({ "x": 1.0, "y": 2.0, "zoom": 0 })).unwrap();
    assert!(approx_eq(cam.zoom, 1.0));

    let cam: Camera = serde_json::from_value(serde_json::json!({})).unwrap();
    assert_eq!(cam, Camera::default());
}
