//! World ↔ screen mapping under zoom and scroll.
//!
//! The viewport owns the authoritative scroll offset. [`Camera`] is a cheap,
//! derived read of `(zoom, offset)` taken whenever a conversion is needed, so
//! there is no second pan state to drift out of sync.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::consts::{ARTBOARD_FIT_MARGIN, MAX_ZOOM, MIN_ZOOM};
use crate::geom::{Point, Rect};

/// Viewport dimensions in screen pixels.
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

/// A scrollable host surface. Implementations wrap whatever windowing layer
/// actually scrolls; the engine only reads and writes through this trait.
pub trait Viewport {
    /// Current scroll offset in screen pixels.
    fn offset(&self) -> Point;
    fn set_offset(&mut self, offset: Point);
    fn size(&self) -> Size;
    fn set_size(&mut self, size: Size);
}

/// In-memory viewport for headless hosts and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollViewport {
    offset: Point,
    size: Size,
}

impl ScrollViewport {
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self { offset: Point::default(), size }
    }
}

impl Viewport for ScrollViewport {
    fn offset(&self) -> Point {
        self.offset
    }

    fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    fn size(&self) -> Size {
        self.size
    }

    fn set_size(&mut self, size: Size) {
        self.size = size;
    }
}

/// Zoom and scroll offset at one instant.
///
/// `offset` is in screen pixels, `zoom` is a scale factor (1.0 = 100%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub zoom: f64,
    pub offset: Point,
}

impl Default for Camera {
    fn default() -> Self {
        Self { zoom: 1.0, offset: Point::default() }
    }
}

impl Camera {
    #[must_use]
    pub fn new(zoom: f64, offset: Point) -> Self {
        Self { zoom, offset }
    }

    /// `screen = world * zoom - offset`.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(world.x * self.zoom - self.offset.x, world.y * self.zoom - self.offset.y)
    }

    /// `world = (screen + offset) / zoom`.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new((screen.x + self.offset.x) / self.zoom, (screen.y + self.offset.y) / self.zoom)
    }

    /// Convert a screen-space distance (pixels) to world units.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Offset that keeps the world point under `anchor` (screen) fixed when
    /// switching to `new_zoom`.
    #[must_use]
    pub fn offset_for_zoom_about(&self, new_zoom: f64, anchor: Point) -> Point {
        let world = self.screen_to_world(anchor);
        Point::new(world.x * new_zoom - anchor.x, world.y * new_zoom - anchor.y)
    }
}

/// Clamp a requested zoom into the supported range. Non-finite input keeps 1.0.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() { zoom.clamp(MIN_ZOOM, MAX_ZOOM) } else { 1.0 }
}

/// "Fit and center": the largest zoom ≤ 1 that fits `artboard` inside the
/// fit margin of `viewport`, and the offset that puts the artboard center at
/// the viewport center.
#[must_use]
pub fn fit_artboard(artboard: Rect, viewport: Size) -> Camera {
    let mut zoom = 1.0_f64;
    if artboard.width > 0.0 && viewport.width > 0.0 {
        zoom = zoom.min(ARTBOARD_FIT_MARGIN * viewport.width / artboard.width);
    }
    if artboard.height > 0.0 && viewport.height > 0.0 {
        zoom = zoom.min(ARTBOARD_FIT_MARGIN * viewport.height / artboard.height);
    }
    let zoom = clamp_zoom(zoom);
    let center = artboard.center();
    let offset = Point::new(center.x * zoom - viewport.width / 2.0, center.y * zoom - viewport.height / 2.0);
    Camera { zoom, offset }
}
