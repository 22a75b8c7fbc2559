//! Pan/zoom camera and coordinate conversion between screen and world space.
//!
//! `(x, y)` is the screen-space offset of the world origin and `zoom` is a
//! uniform scale factor kept inside [`MIN_ZOOM`, `MAX_ZOOM`]. Because the zoom
//! can never reach zero, `screen_to_world` never divides by zero.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{FIT_PADDING, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// An axis-aligned rectangle. Used for world extents and screen-space overlay boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether `p` lies inside or on the edge of this rectangle.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Smallest rectangle containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Camera state for pan/zoom on the infinite canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCamera")]
pub struct Camera {
    /// Screen-space x offset of the world origin, in CSS pixels.
    pub x: f64,
    /// Screen-space y offset of the world origin, in CSS pixels.
    pub y: f64,
    /// Uniform scale factor (1.0 = no zoom).
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

/// Unvalidated camera as read from a persisted document.
#[derive(Deserialize)]
struct RawCamera {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default = "one")]
    zoom: f64,
}

fn one() -> f64 {
    1.0
}

impl From<RawCamera> for Camera {
    fn from(raw: RawCamera) -> Self {
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
        let zoom = if raw.zoom.is_finite() && raw.zoom > 0.0 {
            clamp_zoom(raw.zoom)
        } else {
            1.0
        };
        Self { x: finite_or_zero(raw.x), y: finite_or_zero(raw.y), zoom }
    }
}

/// Clamp a zoom factor into the allowed range.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.x) / self.zoom,
            y: (screen.y - self.y) / self.zoom,
        }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.x,
            y: world.y * self.zoom + self.y,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Convert a world-space rectangle to its on-screen box.
    #[must_use]
    pub fn world_rect_to_screen(&self, rect: Rect) -> Rect {
        let origin = self.world_to_screen(Point::new(rect.x, rect.y));
        Rect::new(origin.x, origin.y, rect.width * self.zoom, rect.height * self.zoom)
    }

    /// Translate by a raw screen delta. Pan speed does not depend on zoom.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Scale by `factor` around `screen_pt`, keeping the world point under it fixed.
    pub fn zoom_at(&mut self, screen_pt: Point, factor: f64) {
        let new_zoom = clamp_zoom(self.zoom * factor);
        let scale = new_zoom / self.zoom;
        self.x = screen_pt.x - (screen_pt.x - self.x) * scale;
        self.y = screen_pt.y - (screen_pt.y - self.y) * scale;
        self.zoom = new_zoom;
    }

    /// Step the zoom up by one button increment. The offset is left untouched.
    pub fn zoom_in(&mut self) {
        self.zoom = clamp_zoom(self.zoom + ZOOM_STEP);
    }

    /// Step the zoom down by one button increment. The offset is left untouched.
    pub fn zoom_out(&mut self) {
        self.zoom = clamp_zoom(self.zoom - ZOOM_STEP);
    }

    /// Fit all `extents` into `viewport`, never zooming in past 100%.
    ///
    /// With no extents the camera resets to the identity.
    pub fn zoom_to_fit<I>(&mut self, extents: I, viewport: Size)
    where
        I: IntoIterator<Item = Rect>,
    {
        let Some(bounds) = extents.into_iter().reduce(|acc, r| acc.union(&r)) else {
            *self = Camera::default();
            return;
        };

        let width = bounds.width + FIT_PADDING * 2.0;
        let height = bounds.height + FIT_PADDING * 2.0;

        let fit = (viewport.width / width).min(viewport.height / height).min(1.0);
        let zoom = if fit.is_finite() { clamp_zoom(fit) } else { 1.0 };

        self.x = (viewport.width - width * zoom) / 2.0 - bounds.x * zoom + FIT_PADDING * zoom;
        self.y = (viewport.height - height * zoom) / 2.0 - bounds.y * zoom + FIT_PADDING * zoom;
        self.zoom = zoom;
    }
}
