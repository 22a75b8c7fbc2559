//! Shared numeric constants for the canvas crate.

// ── Camera ──────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.25;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 2.0;

/// Zoom increment used by the zoom-in / zoom-out buttons.
pub const ZOOM_STEP: f64 = 0.1;

/// Wheel zoom factor when scrolling down (zoom out).
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Wheel zoom factor when scrolling up (zoom in).
pub const WHEEL_ZOOM_IN: f64 = 1.1;

/// World-unit padding added around content by zoom-to-fit.
pub const FIT_PADDING: f64 = 50.0;

// ── Block defaults ──────────────────────────────────────────────

/// Default text block width in world units.
pub const TEXT_DEFAULT_WIDTH: f64 = 450.0;

/// Default text block height in world units.
pub const TEXT_DEFAULT_HEIGHT: f64 = 180.0;

/// Smallest text block width reachable by resizing.
pub const TEXT_MIN_WIDTH: f64 = 150.0;

/// Smallest text block height reachable by resizing.
pub const TEXT_MIN_HEIGHT: f64 = 60.0;

/// Default stroke colour for shapes and icons.
pub const DEFAULT_STROKE_COLOR: &str = "#374151";

/// Default shape stroke width.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Default box-shape edge length when a size is missing.
pub const DEFAULT_BOX_SIZE: f64 = 100.0;

/// Default line length (end point x offset) when end points are missing.
pub const DEFAULT_LINE_LENGTH: f64 = 150.0;

/// Default icon edge length.
pub const DEFAULT_ICON_SIZE: f64 = 48.0;

// ── Gestures ────────────────────────────────────────────────────

/// Minimum width/height of a resized box shape.
pub const MIN_SHAPE_SIZE: f64 = 30.0;

/// Minimum edge length of a resized icon.
pub const MIN_ICON_SIZE: f64 = 20.0;

/// Minimum distance in world units between draw start and end for a shape to be committed.
pub const DRAW_COMMIT_THRESHOLD: f64 = 5.0;

/// Minimum width/height of a freshly drawn box shape.
pub const MIN_DRAWN_SIZE: f64 = 20.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Distance from the bounding box top edge to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 24.0;

/// World-unit slop around a line when hit-testing its body.
pub const LINE_HIT_PADDING: f64 = 15.0;

// ── Rendering ───────────────────────────────────────────────────

/// Arrowhead length in world units.
pub const ARROW_SIZE: f64 = 10.0;

// ── Overlays ────────────────────────────────────────────────────

/// Delay in milliseconds before an overlay starts listening for outside clicks.
pub const OUTSIDE_CLICK_ARM_MS: f64 = 100.0;

/// Shortest trimmed text selection that opens the insight popup.
pub const MIN_SELECTION_CHARS: usize = 2;
