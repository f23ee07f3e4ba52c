//! Hit-testing: which element part, if any, lies under a world-space point.
//!
//! Handles of the current selection win over element bodies so a handle that
//! overlaps a neighbor still grabs. Bodies are tested top-most first with a
//! rotation-aware point-in-rectangle check.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Camera;
use crate::consts::{HANDLE_RADIUS_PX, ROTATE_HANDLE_OFFSET_PX};
use crate::doc::{CanvasElement, ElementId, Scene};
use crate::geom::{Affine, Point, ResizeAnchor, element_transform, handle_position, union_rect};

/// Which part of an element was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
    RotateHandle,
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// The top-level element hit, or for multi-selection handles, the
    /// primary selected element.
    pub element_id: ElementId,
    pub part: HitPart,
}

/// The frame selection handles are laid out in.
///
/// A single selection uses the element's own rotated frame and offers a
/// rotate handle; a multi-selection uses the unrotated union box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleFrame {
    pub element_id: ElementId,
    /// Local unrotated frame → world.
    pub transform: Affine,
    pub width: f64,
    pub height: f64,
    pub rotatable: bool,
}

impl HandleFrame {
    /// World-space positions of every handle in this frame.
    #[must_use]
    pub fn handles(&self, zoom: f64) -> Vec<(HitPart, Point)> {
        let mut out: Vec<(HitPart, Point)> = ResizeAnchor::ALL
            .iter()
            .map(|&a| (HitPart::ResizeHandle(a), self.transform.apply(handle_position(a, self.width, self.height))))
            .collect();
        if self.rotatable {
            let local = Point::new(self.width / 2.0, -ROTATE_HANDLE_OFFSET_PX / zoom);
            out.push((HitPart::RotateHandle, self.transform.apply(local)));
        }
        out
    }
}

/// Handle frame for the current selection, if anything is selected.
#[must_use]
pub fn selection_frame(scene: &Scene) -> Option<HandleFrame> {
    let selected = scene.selected_elements();
    match selected.as_slice() {
        [] => None,
        [el] => Some(HandleFrame {
            element_id: el.id,
            transform: element_transform(el),
            width: el.width,
            height: el.height,
            rotatable: true,
        }),
        many => {
            let bounds = union_rect(many.iter().copied())?;
            Some(HandleFrame {
                element_id: *scene.selection().first()?,
                transform: Affine::translate(bounds.x, bounds.y),
                width: bounds.width,
                height: bounds.height,
                rotatable: false,
            })
        }
    }
}

/// Whether `world_pt` lies inside `el`'s rotated rectangle.
#[must_use]
pub fn element_contains(el: &CanvasElement, world_pt: Point) -> bool {
    let Some(inverse) = element_transform(el).invert() else {
        return false;
    };
    let local = inverse.apply(world_pt);
    local.x >= 0.0 && local.x <= el.width && local.y >= 0.0 && local.y <= el.height
}

/// Test which element part (if any) is under `world_pt`, checking selection
/// handles first.
#[must_use]
pub fn hit_test(world_pt: Point, scene: &Scene, camera: &Camera) -> Option<Hit> {
    let slop = camera.screen_dist_to_world(HANDLE_RADIUS_PX);
    if let Some(frame) = selection_frame(scene) {
        let handle = frame
            .handles(camera.zoom)
            .into_iter()
            .find(|(_, p)| p.distance(world_pt) <= slop);
        if let Some((part, _)) = handle {
            return Some(Hit { element_id: frame.element_id, part });
        }
    }
    scene
        .elements()
        .iter()
        .rev()
        .find(|el| element_contains(el, world_pt))
        .map(|el| Hit { element_id: el.id, part: HitPart::Body })
}
