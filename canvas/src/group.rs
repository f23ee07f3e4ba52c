//! Grouping engine: flat selection ↔ nested group conversion and
//! propagation of group edits to descendants.
//!
//! All functions are pure: they take an element tree (or element) and return
//! a new one, so callers can run them inside a single
//! [`Scene::mutate_elements`](crate::doc::Scene::mutate_elements) updater.

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;

use uuid::Uuid;

use crate::doc::{CanvasElement, ElementId, ElementKind, ElementTree, GroupProps};
use crate::geom::union_rect;

/// A change applied to an element and carried down to its descendants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Propagation {
    /// Move the element. Descendants keep their relative offsets.
    Translate { dx: f64, dy: f64 },
    /// Scale the element's size; descendants' relative offsets and sizes
    /// scale by the same factors.
    Scale { sx: f64, sy: f64 },
}

/// Apply `change` to `el`, returning the updated element.
#[must_use]
pub fn propagate(el: &CanvasElement, change: Propagation) -> CanvasElement {
    let mut out = el.clone();
    match change {
        Propagation::Translate { dx, dy } => {
            out.x += dx;
            out.y += dy;
        }
        Propagation::Scale { sx, sy } => scale_in_place(&mut out, sx, sy),
    }
    out
}

fn scale_in_place(el: &mut CanvasElement, sx: f64, sy: f64) {
    el.width = (el.width * sx).max(0.0);
    el.height = (el.height * sy).max(0.0);
    if let ElementKind::Group(group) = &mut el.kind {
        for child in &mut group.children {
            child.x *= sx;
            child.y *= sy;
            scale_in_place(child, sx, sy);
        }
    }
}

/// Copy an explicitly changed rotation and/or opacity onto every descendant.
#[must_use]
pub fn apply_to_descendants(el: &CanvasElement, rotation: Option<f64>, opacity: Option<f64>) -> CanvasElement {
    let mut out = el.clone();
    if let ElementKind::Group(group) = &mut out.kind {
        for child in &mut group.children {
            if let Some(r) = rotation {
                child.rotation = r;
            }
            if let Some(o) = opacity {
                child.opacity = o;
            }
            *child = apply_to_descendants(child, rotation, opacity);
        }
    }
    out
}

/// Deep copy of `el` with a fresh id on it and every descendant.
#[must_use]
pub fn with_fresh_ids(el: &CanvasElement) -> CanvasElement {
    let mut out = el.clone();
    out.id = Uuid::new_v4();
    if let ElementKind::Group(group) = &mut out.kind {
        group.children = group.children.iter().map(with_fresh_ids).collect();
    }
    out
}

/// Wrap the selected top-level elements in a new group placed on top.
///
/// Returns the new tree and the group's id, or `None` when fewer than two of
/// `selected` are present.
#[must_use]
pub fn group_elements(elements: ElementTree, selected: &[ElementId]) -> Option<(ElementTree, ElementId)> {
    let (picked, mut rest): (Vec<CanvasElement>, Vec<CanvasElement>) =
        elements.into_iter().partition(|e| selected.contains(&e.id));
    if picked.len() < 2 {
        return None;
    }
    let bounds = union_rect(&picked)?;
    let children = picked
        .into_iter()
        .map(|mut child| {
            child.x -= bounds.x;
            child.y -= bounds.y;
            child
        })
        .collect();
    let group = CanvasElement::group(bounds, children);
    let id = group.id;
    rest.push(group);
    Some((rest, id))
}

/// Dissolve one top-level group into its children, in place.
///
/// Children become absolute and every produced element (including nested
/// groups and their descendants) gets a fresh id. Nested groups survive.
/// Returns the new tree and the produced top-level ids, or `None` when
/// `group_id` is not a top-level group.
#[must_use]
pub fn ungroup_element(elements: ElementTree, group_id: &ElementId) -> Option<(ElementTree, Vec<ElementId>)> {
    let index = elements.iter().position(|e| e.id == *group_id)?;
    let ElementKind::Group(GroupProps { children }) = &elements[index].kind else {
        return None;
    };
    let origin_x = elements[index].x;
    let origin_y = elements[index].y;

    let released: Vec<CanvasElement> = children
        .iter()
        .map(|child| {
            let mut out = with_fresh_ids(child);
            out.x += origin_x;
            out.y += origin_y;
            out
        })
        .collect();
    let ids = released.iter().map(|e| e.id).collect();

    let mut out = elements;
    out.splice(index..=index, released);
    Some((out, ids))
}
