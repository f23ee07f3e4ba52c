//! Geometry kernel: points, rectangles, affine transforms and handle lookup.
//!
//! Everything here is pure. Degenerate inputs (zero-size elements, empty
//! sets) produce degenerate but defined outputs rather than failing.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

use crate::doc::CanvasElement;

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

    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle described by its top-left corner and extents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
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

    /// Rectangle spanning two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self { x, y, width: (a.x - b.x).abs(), height: (a.y - b.y).abs() }
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

    /// Closed-interval overlap test; touching edges count as intersecting.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right() && other.x <= self.right() && self.y <= other.bottom() && other.y <= self.bottom()
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }

    /// Smallest rectangle covering all `points`; `None` when empty.
    pub fn covering<I>(points: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// Rotate `p` clockwise (y down) about `center` by `degrees`.
#[must_use]
pub fn rotate_point(p: Point, center: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
}

/// 2D affine transform in canvas convention: `(x, y) -> (a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    #[must_use]
    pub fn translate(tx: f64, ty: f64) -> Self {
        Self { e: tx, f: ty, ..Self::IDENTITY }
    }

    #[must_use]
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self { a: sx, d: sy, ..Self::IDENTITY }
    }

    /// Clockwise rotation about the origin.
    #[must_use]
    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 }
    }

    #[must_use]
    pub fn rotate_about(center: Point, degrees: f64) -> Self {
        Self::translate(center.x, center.y)
            .compose(Self::rotate(degrees))
            .compose(Self::translate(-center.x, -center.y))
    }

    /// `self ∘ inner`: the result applies `inner` first, then `self`.
    #[must_use]
    pub fn compose(self, inner: Affine) -> Affine {
        Affine {
            a: self.a * inner.a + self.c * inner.b,
            b: self.b * inner.a + self.d * inner.b,
            c: self.a * inner.c + self.c * inner.d,
            d: self.b * inner.c + self.d * inner.d,
            e: self.a * inner.e + self.c * inner.f + self.e,
            f: self.b * inner.e + self.d * inner.f + self.f,
        }
    }

    /// Inverse transform, or `None` for a singular (zero-scale) matrix.
    #[must_use]
    pub fn invert(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        Some(Affine {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.a * p.x + self.c * p.y + self.e, self.b * p.x + self.d * p.y + self.f)
    }

    /// Apply only the linear part (for direction vectors and deltas).
    #[must_use]
    pub fn apply_vector(&self, v: Point) -> Point {
        Point::new(self.a * v.x + self.c * v.y, self.b * v.x + self.d * v.y)
    }
}

/// Map an element's local unrotated frame (`0..width`, `0..height`) into its
/// container's frame. Compose with the ancestors' transforms for world space.
#[must_use]
pub fn element_transform(el: &CanvasElement) -> Affine {
    Affine::translate(el.x, el.y).compose(Affine::rotate_about(Point::new(el.width / 2.0, el.height / 2.0), el.rotation))
}

/// The four corners (nw, ne, se, sw) after rotating about the element center.
#[must_use]
pub fn rotated_corners(el: &CanvasElement) -> [Point; 4] {
    let c = el.center();
    let r = el.rect();
    [
        rotate_point(Point::new(r.x, r.y), c, el.rotation),
        rotate_point(Point::new(r.right(), r.y), c, el.rotation),
        rotate_point(Point::new(r.right(), r.bottom()), c, el.rotation),
        rotate_point(Point::new(r.x, r.bottom()), c, el.rotation),
    ]
}

/// Axis-aligned box covering one element's rotated corners.
#[must_use]
pub fn element_aabb(el: &CanvasElement) -> Rect {
    Rect::covering(rotated_corners(el)).unwrap_or_else(|| el.rect())
}

/// Axis-aligned box covering the rotated corners of every element; `None` when empty.
pub fn bounding_box<'a, I>(elements: I) -> Option<Rect>
where
    I: IntoIterator<Item = &'a CanvasElement>,
{
    Rect::covering(elements.into_iter().flat_map(rotated_corners))
}

/// Union of the stored, unrotated rectangles; `None` when empty.
pub fn union_rect<'a, I>(elements: I) -> Option<Rect>
where
    I: IntoIterator<Item = &'a CanvasElement>,
{
    elements.into_iter().map(CanvasElement::rect).reduce(|acc, r| acc.union(&r))
}

/// Triangle vertices (apex top-center, then base right, base left), rotated.
#[must_use]
pub fn triangle_vertices(el: &CanvasElement) -> [Point; 3] {
    let c = el.center();
    let r = el.rect();
    [
        rotate_point(Point::new(r.x + r.width / 2.0, r.y), c, el.rotation),
        rotate_point(Point::new(r.right(), r.bottom()), c, el.rotation),
        rotate_point(Point::new(r.x, r.bottom()), c, el.rotation),
    ]
}

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    pub const ALL: [ResizeAnchor; 8] = [
        ResizeAnchor::N,
        ResizeAnchor::Ne,
        ResizeAnchor::E,
        ResizeAnchor::Se,
        ResizeAnchor::S,
        ResizeAnchor::Sw,
        ResizeAnchor::W,
        ResizeAnchor::Nw,
    ];

    #[must_use]
    pub fn moves_left(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    #[must_use]
    pub fn moves_right(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    #[must_use]
    pub fn moves_top(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    #[must_use]
    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// The handle that stays put while this one is dragged.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::N => Self::S,
            Self::Ne => Self::Sw,
            Self::E => Self::W,
            Self::Se => Self::Nw,
            Self::S => Self::N,
            Self::Sw => Self::Ne,
            Self::W => Self::E,
            Self::Nw => Self::Se,
        }
    }
}

/// Handle location in an element's local unrotated frame.
#[must_use]
pub fn handle_position(anchor: ResizeAnchor, width: f64, height: f64) -> Point {
    match anchor {
        ResizeAnchor::N => Point::new(width / 2.0, 0.0),
        ResizeAnchor::Ne => Point::new(width, 0.0),
        ResizeAnchor::E => Point::new(width, height / 2.0),
        ResizeAnchor::Se => Point::new(width, height),
        ResizeAnchor::S => Point::new(width / 2.0, height),
        ResizeAnchor::Sw => Point::new(0.0, height),
        ResizeAnchor::W => Point::new(0.0, height / 2.0),
        ResizeAnchor::Nw => Point::new(0.0, 0.0),
    }
}

/// CSS cursor hint for a resize handle.
#[must_use]
pub fn cursor_for_direction(anchor: ResizeAnchor) -> &'static str {
    match anchor {
        ResizeAnchor::N | ResizeAnchor::S => "ns-resize",
        ResizeAnchor::E | ResizeAnchor::W => "ew-resize",
        ResizeAnchor::Ne | ResizeAnchor::Sw => "nesw-resize",
        ResizeAnchor::Nw | ResizeAnchor::Se => "nwse-resize",
    }
}

/// Normalize an angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let r = degrees.rem_euclid(360.0);
    if (r - 360.0).abs() < 1e-9 { 0.0 } else { r }
}
