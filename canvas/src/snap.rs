//! Snap engine: alignment corrections and guide lines for drag and resize.
//!
//! Static elements contribute candidate alignment lines; moving elements
//! contribute candidate points. Each axis snaps independently to the single
//! closest (point, line) pair within the threshold. Thresholds are in world
//! units; callers pass `threshold_px / zoom` so the visual distance stays
//! constant on screen.
//!
//! Only the units handed in are considered: a group contributes its own
//! stored box, never its children.

#[cfg(test)]
#[path = "snap_test.rs"]
mod snap_test;

use serde::{Deserialize, Serialize};

use crate::consts::GUIDE_EPSILON;
use crate::doc::CanvasElement;
use crate::geom::{Point, Rect, ResizeAnchor, element_aabb, triangle_vertices};

/// Orientation of an alignment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Constant `y`; spans along x.
    Horizontal,
    /// Constant `x`; spans along y.
    Vertical,
}

/// A candidate alignment line at `value`, spanning `start..end` on the other axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapLine {
    pub orientation: Orientation,
    pub value: f64,
    pub start: f64,
    pub end: f64,
}

/// A visible guide segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub orientation: Orientation,
    pub value: f64,
    pub start: f64,
    pub end: f64,
}

impl Guide {
    fn same_as(&self, other: &Guide) -> bool {
        self.orientation == other.orientation
            && (self.value - other.value).abs() < GUIDE_EPSILON
            && (self.start - other.start).abs() < GUIDE_EPSILON
            && (self.end - other.end).abs() < GUIDE_EPSILON
    }
}

/// Outcome of a translation snap.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateSnap {
    pub dx: f64,
    pub dy: f64,
    pub guides: Vec<Guide>,
}

/// Outcome of a resize snap.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSnap {
    pub bounds: Rect,
    pub guides: Vec<Guide>,
}

fn rect_lines(r: Rect, out: &mut Vec<SnapLine>) {
    let mid_y = r.y + r.height / 2.0;
    let mid_x = r.x + r.width / 2.0;
    for value in [r.y, mid_y, r.bottom()] {
        out.push(SnapLine { orientation: Orientation::Horizontal, value, start: r.x, end: r.right() });
    }
    for value in [r.x, mid_x, r.right()] {
        out.push(SnapLine { orientation: Orientation::Vertical, value, start: r.y, end: r.bottom() });
    }
}

/// Alignment lines contributed by one static element.
#[must_use]
pub fn element_lines(el: &CanvasElement) -> Vec<SnapLine> {
    let mut lines = Vec::with_capacity(6);
    let bounds = element_aabb(el);
    if el.is_triangle() {
        for v in triangle_vertices(el) {
            lines.push(SnapLine { orientation: Orientation::Horizontal, value: v.y, start: bounds.x, end: bounds.right() });
            lines.push(SnapLine { orientation: Orientation::Vertical, value: v.x, start: bounds.y, end: bounds.bottom() });
        }
    } else {
        rect_lines(bounds, &mut lines);
    }
    lines
}

/// Candidate points contributed by one moving element: 4 corners and the
/// center, or the 3 vertices of a triangle.
#[must_use]
pub fn element_points(el: &CanvasElement) -> Vec<Point> {
    if el.is_triangle() {
        return triangle_vertices(el).to_vec();
    }
    let r = element_aabb(el);
    vec![
        Point::new(r.x, r.y),
        Point::new(r.right(), r.y),
        Point::new(r.right(), r.bottom()),
        Point::new(r.x, r.bottom()),
        r.center(),
    ]
}

fn static_lines(statics: &[CanvasElement], artboard: Option<Rect>) -> Vec<SnapLine> {
    let mut lines: Vec<SnapLine> = statics.iter().flat_map(element_lines).collect();
    if let Some(board) = artboard {
        rect_lines(board, &mut lines);
    }
    lines
}

fn coord(p: Point, orientation: Orientation) -> f64 {
    match orientation {
        Orientation::Horizontal => p.y,
        Orientation::Vertical => p.x,
    }
}

fn cross(p: Point, orientation: Orientation) -> f64 {
    match orientation {
        Orientation::Horizontal => p.x,
        Orientation::Vertical => p.y,
    }
}

/// Correction for one axis: the closest (point, line) pair within threshold.
fn axis_correction(points: &[Point], lines: &[SnapLine], orientation: Orientation, raw: f64, threshold: f64) -> f64 {
    let mut best: Option<(f64, f64)> = None;
    for line in lines.iter().filter(|l| l.orientation == orientation) {
        for p in points {
            let c = coord(*p, orientation);
            let distance = (line.value - (c + raw)).abs();
            if distance <= threshold && best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, line.value - c - raw));
            }
        }
    }
    best.map_or(0.0, |(_, correction)| correction)
}

fn guides_at(points: &[Point], lines: &[SnapLine], threshold: f64) -> Vec<Guide> {
    let mut guides: Vec<Guide> = Vec::new();
    for line in lines {
        for p in points {
            if (line.value - coord(*p, line.orientation)).abs() > threshold {
                continue;
            }
            let along = cross(*p, line.orientation);
            let guide = Guide {
                orientation: line.orientation,
                value: line.value,
                start: line.start.min(along),
                end: line.end.max(along),
            };
            if !guides.iter().any(|g| g.same_as(&guide)) {
                guides.push(guide);
            }
        }
    }
    guides
}

/// Snap a translation of `moving` (pre-drag snapshots) by `raw` against
/// `statics` and, optionally, the artboard.
#[must_use]
pub fn snap_translation(
    moving: &[CanvasElement],
    statics: &[CanvasElement],
    raw: Point,
    threshold: f64,
    artboard: Option<Rect>,
) -> TranslateSnap {
    let lines = static_lines(statics, artboard);
    if lines.is_empty() || moving.is_empty() {
        return TranslateSnap { dx: raw.x, dy: raw.y, guides: Vec::new() };
    }
    let points: Vec<Point> = moving.iter().flat_map(element_points).collect();

    let dx = raw.x + axis_correction(&points, &lines, Orientation::Vertical, raw.x, threshold);
    let dy = raw.y + axis_correction(&points, &lines, Orientation::Horizontal, raw.y, threshold);

    let moved: Vec<Point> = points.iter().map(|p| p.offset(dx, dy)).collect();
    let guides = guides_at(&moved, &lines, threshold);
    TranslateSnap { dx, dy, guides }
}

fn first_within(lines: &[SnapLine], orientation: Orientation, value: f64, threshold: f64) -> Option<SnapLine> {
    lines
        .iter()
        .filter(|l| l.orientation == orientation)
        .find(|l| (l.value - value).abs() <= threshold)
        .copied()
}

fn edge_guide(line: SnapLine, span_start: f64, span_end: f64) -> Guide {
    Guide {
        orientation: line.orientation,
        value: line.value,
        start: line.start.min(span_start),
        end: line.end.max(span_end),
    }
}

/// Snap the edges implicated by `anchor` of candidate `bounds`. The opposite
/// edge is untouched; width and height are recomputed from snapped edges and
/// never go negative.
#[must_use]
pub fn snap_resize(
    anchor: ResizeAnchor,
    bounds: Rect,
    statics: &[CanvasElement],
    threshold: f64,
    artboard: Option<Rect>,
) -> ResizeSnap {
    let lines = static_lines(statics, artboard);
    if lines.is_empty() {
        return ResizeSnap { bounds, guides: Vec::new() };
    }

    let mut left = bounds.x;
    let mut right = bounds.right();
    let mut top = bounds.y;
    let mut bottom = bounds.bottom();
    let mut snapped: Vec<SnapLine> = Vec::new();

    if anchor.moves_left() {
        if let Some(line) = first_within(&lines, Orientation::Vertical, left, threshold) {
            left = line.value.min(right);
            snapped.push(line);
        }
    }
    if anchor.moves_right() {
        if let Some(line) = first_within(&lines, Orientation::Vertical, right, threshold) {
            right = line.value.max(left);
            snapped.push(line);
        }
    }
    if anchor.moves_top() {
        if let Some(line) = first_within(&lines, Orientation::Horizontal, top, threshold) {
            top = line.value.min(bottom);
            snapped.push(line);
        }
    }
    if anchor.moves_bottom() {
        if let Some(line) = first_within(&lines, Orientation::Horizontal, bottom, threshold) {
            bottom = line.value.max(top);
            snapped.push(line);
        }
    }

    let guides = snapped
        .into_iter()
        .map(|line| match line.orientation {
            Orientation::Vertical => edge_guide(line, top, bottom),
            Orientation::Horizontal => edge_guide(line, left, right),
        })
        .collect();
    ResizeSnap { bounds: Rect::new(left, top, right - left, bottom - top), guides }
}
