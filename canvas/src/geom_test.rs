#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::ShapeVariant;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn rect_approx_eq(a: Rect, b: Rect) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.width, b.width) && approx_eq(a.height, b.height)
}

fn rect_at(x: f64, y: f64, w: f64, h: f64) -> CanvasElement {
    let mut el = CanvasElement::shape(ShapeVariant::Rectangle, w, h);
    el.x = x;
    el.y = y;
    el
}

// =============================================================
// Rect
// =============================================================

#[test]
fn rect_from_corners_normalizes() {
    let r = Rect::from_corners(Point::new(50.0, 10.0), Point::new(10.0, 40.0));
    assert_eq!(r, Rect::new(10.0, 10.0, 40.0, 30.0));
}

#[test]
fn rect_intersects_partial_overlap() {
    let a = Rect::new(0.0, 0.0, 50.0, 50.0);
    assert!(a.intersects(&Rect::new(40.0, 40.0, 100.0, 100.0)));
    assert!(!a.intersects(&Rect::new(60.0, 60.0, 10.0, 10.0)));
}

#[test]
fn rect_union_covers_both() {
    let u = Rect::new(0.0, 0.0, 10.0, 10.0).union(&Rect::new(20.0, -5.0, 10.0, 10.0));
    assert_eq!(u, Rect::new(0.0, -5.0, 30.0, 15.0));
}

#[test]
fn covering_empty_is_none() {
    assert!(Rect::covering(std::iter::empty()).is_none());
}

// =============================================================
// Rotation
// =============================================================

#[test]
fn rotate_point_quarter_turn_is_clockwise() {
    let p = rotate_point(Point::new(10.0, 0.0), Point::new(0.0, 0.0), 90.0);
    assert!(point_approx_eq(p, Point::new(0.0, 10.0)));
}

#[test]
fn rotate_point_about_itself_is_fixed() {
    let c = Point::new(3.0, 4.0);
    assert!(point_approx_eq(rotate_point(c, c, 123.0), c));
}

#[test]
fn rotated_corners_unrotated_match_rect() {
    let el = rect_at(10.0, 20.0, 30.0, 40.0);
    let corners = rotated_corners(&el);
    assert!(point_approx_eq(corners[0], Point::new(10.0, 20.0)));
    assert!(point_approx_eq(corners[2], Point::new(40.0, 60.0)));
}

#[test]
fn bounding_box_rotated_quarter_turn_swaps_extents() {
    let mut el = rect_at(0.0, 0.0, 100.0, 50.0);
    el.rotation = 90.0;
    let bb = bounding_box([&el]).unwrap();
    assert!(rect_approx_eq(bb, Rect::new(25.0, -25.0, 50.0, 100.0)));
}

#[test]
fn bounding_box_empty_is_none() {
    let none: [&CanvasElement; 0] = [];
    assert!(bounding_box(none).is_none());
}

#[test]
fn bounding_box_spans_multiple_elements() {
    let a = rect_at(0.0, 0.0, 10.0, 10.0);
    let b = rect_at(100.0, 50.0, 20.0, 20.0);
    let bb = bounding_box([&a, &b]).unwrap();
    assert!(rect_approx_eq(bb, Rect::new(0.0, 0.0, 120.0, 70.0)));
}

#[test]
fn bounding_box_zero_size_is_degenerate() {
    let el = rect_at(5.0, 5.0, 0.0, 0.0);
    let bb = bounding_box([&el]).unwrap();
    assert!(rect_approx_eq(bb, Rect::new(5.0, 5.0, 0.0, 0.0)));
}

#[test]
fn union_rect_ignores_rotation() {
    let mut el = rect_at(0.0, 0.0, 100.0, 50.0);
    el.rotation = 90.0;
    assert_eq!(union_rect([&el]), Some(Rect::new(0.0, 0.0, 100.0, 50.0)));
}

#[test]
fn triangle_vertices_unrotated() {
    let el = rect_at(0.0, 0.0, 100.0, 80.0);
    let [apex, right, left] = triangle_vertices(&el);
    assert!(point_approx_eq(apex, Point::new(50.0, 0.0)));
    assert!(point_approx_eq(right, Point::new(100.0, 80.0)));
    assert!(point_approx_eq(left, Point::new(0.0, 80.0)));
}

// =============================================================
// Affine
// =============================================================

#[test]
fn affine_compose_applies_inner_first() {
    let t = Affine::translate(10.0, 0.0).compose(Affine::scale(2.0, 2.0));
    assert!(point_approx_eq(t.apply(Point::new(1.0, 1.0)), Point::new(12.0, 2.0)));
}

#[test]
fn affine_invert_round_trips() {
    let t = Affine::translate(5.0, -3.0).compose(Affine::rotate(33.0)).compose(Affine::scale(2.0, 0.5));
    let inv = t.invert().unwrap();
    let p = Point::new(7.0, 11.0);
    assert!(point_approx_eq(inv.apply(t.apply(p)), p));
}

#[test]
fn affine_singular_has_no_inverse() {
    assert!(Affine::scale(0.0, 1.0).invert().is_none());
}

#[test]
fn element_transform_maps_local_center_to_center() {
    let mut el = rect_at(10.0, 10.0, 40.0, 20.0);
    el.rotation = 45.0;
    let t = element_transform(&el);
    assert!(point_approx_eq(t.apply(Point::new(20.0, 10.0)), el.center()));
}

#[test]
fn element_transform_matches_rotated_corners() {
    let mut el = rect_at(10.0, 10.0, 40.0, 20.0);
    el.rotation = 30.0;
    let t = element_transform(&el);
    let corners = rotated_corners(&el);
    assert!(point_approx_eq(t.apply(Point::new(0.0, 0.0)), corners[0]));
    assert!(point_approx_eq(t.apply(Point::new(40.0, 20.0)), corners[2]));
}

// =============================================================
// Handles
// =============================================================

#[test]
fn handle_positions_cover_edges_and_corners() {
    assert_eq!(handle_position(ResizeAnchor::N, 100.0, 50.0), Point::new(50.0, 0.0));
    assert_eq!(handle_position(ResizeAnchor::Ne, 100.0, 50.0), Point::new(100.0, 0.0));
    assert_eq!(handle_position(ResizeAnchor::E, 100.0, 50.0), Point::new(100.0, 25.0));
    assert_eq!(handle_position(ResizeAnchor::Se, 100.0, 50.0), Point::new(100.0, 50.0));
    assert_eq!(handle_position(ResizeAnchor::S, 100.0, 50.0), Point::new(50.0, 50.0));
    assert_eq!(handle_position(ResizeAnchor::Sw, 100.0, 50.0), Point::new(0.0, 50.0));
    assert_eq!(handle_position(ResizeAnchor::W, 100.0, 50.0), Point::new(0.0, 25.0));
    assert_eq!(handle_position(ResizeAnchor::Nw, 100.0, 50.0), Point::new(0.0, 0.0));
}

#[test]
fn cursor_lookup() {
    assert_eq!(cursor_for_direction(ResizeAnchor::N), "ns-resize");
    assert_eq!(cursor_for_direction(ResizeAnchor::S), "ns-resize");
    assert_eq!(cursor_for_direction(ResizeAnchor::E), "ew-resize");
    assert_eq!(cursor_for_direction(ResizeAnchor::W), "ew-resize");
    assert_eq!(cursor_for_direction(ResizeAnchor::Ne), "nesw-resize");
    assert_eq!(cursor_for_direction(ResizeAnchor::Sw), "nesw-resize");
    assert_eq!(cursor_for_direction(ResizeAnchor::Nw), "nwse-resize");
    assert_eq!(cursor_for_direction(ResizeAnchor::Se), "nwse-resize");
}

#[test]
fn opposite_anchor_is_involution() {
    for anchor in ResizeAnchor::ALL {
        assert_eq!(anchor.opposite().opposite(), anchor);
        assert_ne!(anchor.opposite(), anchor);
    }
}

#[test]
fn anchor_edge_flags() {
    assert!(ResizeAnchor::Nw.moves_left() && ResizeAnchor::Nw.moves_top());
    assert!(!ResizeAnchor::N.moves_left() && !ResizeAnchor::N.moves_right());
    assert!(ResizeAnchor::Se.moves_right() && ResizeAnchor::Se.moves_bottom());
}

#[test]
fn normalize_degrees_wraps() {
    assert!(approx_eq(normalize_degrees(370.0), 10.0));
    assert!(approx_eq(normalize_degrees(-90.0), 270.0));
    assert!(approx_eq(normalize_degrees(360.0), 0.0));
}
