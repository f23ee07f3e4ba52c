//! Pointer, keyboard and wheel handling for [`EngineCore`].
//!
//! DESIGN
//! ======
//! Exactly one gesture is active at a time, held in [`InputState`]. Each
//! handler takes the state out, computes the transition and stores the next
//! state back. Intermediate gesture frames mutate the scene without history;
//! pointer-up commits one entry using the tree captured at pointer-down, so
//! the undo snapshot never includes a partially applied delta.
//!
//! Handlers return [`Action`]s for the host: repaint, cursor, selection,
//! history and text-edit notifications.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use tracing::debug;

use crate::consts::{NUDGE_STEP, NUDGE_STEP_LARGE, WHEEL_ZOOM_SENSITIVITY};
use crate::doc::{CanvasElement, ElementId, ElementTree, MutateOptions};
use crate::engine::{Action, EngineCore, replace_by_id};
use crate::geom::{
    Affine, Point, Rect, ResizeAnchor, cursor_for_direction, element_transform, normalize_degrees, union_rect,
};
use crate::group::{Propagation, propagate};
use crate::hit::{Hit, HitPart, hit_test};
use crate::input::{Button, InputState, InteractionMode, Key, Modifiers, WheelDelta};
use crate::snap::{snap_resize, snap_translation};

const CURSOR_DEFAULT: &str = "default";
const CURSOR_MOVE: &str = "move";
const CURSOR_GRAB: &str = "grab";
const CURSOR_GRABBING: &str = "grabbing";
const CURSOR_CROSSHAIR: &str = "crosshair";

impl EngineCore {
    // =============================================================
    // Pointer
    // =============================================================

    /// Pointer pressed at `screen_pt`.
    ///
    /// A press that arrives while a gesture is still active finishes that
    /// gesture first, as if the pointer had been released.
    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.input.is_idle() {
            actions.extend(self.finish_gesture(screen_pt, modifiers));
        }

        match button {
            Button::Secondary => return actions,
            Button::Middle => {
                self.begin_pan(screen_pt, &mut actions);
                return actions;
            }
            Button::Primary => {}
        }
        if self.interaction_mode == InteractionMode::Pan {
            self.begin_pan(screen_pt, &mut actions);
            return actions;
        }

        let camera = self.camera();
        let world = camera.screen_to_world(screen_pt);
        let hit = hit_test(world, &self.scene, &camera);

        if let Some(editing) = self.scene.editing_text_id() {
            if hit.is_some_and(|h| h.element_id == editing && h.part == HitPart::Body) {
                return actions;
            }
            self.scene.set_editing_text(None);
            actions.push(Action::EditTextEnded(editing));
        }

        match hit {
            Some(Hit { part: HitPart::ResizeHandle(anchor), .. }) => self.begin_resize(anchor, world, &mut actions),
            Some(Hit { element_id, part: HitPart::RotateHandle }) => self.begin_rotate(element_id, world, &mut actions),
            Some(Hit { element_id, part: HitPart::Body }) => self.begin_drag(element_id, world, modifiers, &mut actions),
            None => self.begin_marquee(world, modifiers, &mut actions),
        }
        debug!(gesture = self.input.name(), x = world.x, y = world.y, "gesture: started");
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Pointer moved to `screen_pt`.
    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let world = self.camera().screen_to_world(screen_pt);
        match std::mem::take(&mut self.input) {
            InputState::Idle => self.hover(world),
            InputState::Dragging { ids, start_pointer, snapshots, history_snapshot, moved, edit_on_release } => {
                let moved = self.drag_to(&ids, &snapshots, start_pointer, world) || moved;
                self.input =
                    InputState::Dragging { ids, start_pointer, snapshots, history_snapshot, moved, edit_on_release };
                vec![Action::RenderNeeded]
            }
            InputState::Resizing { ids, anchor, start_pointer, start_snapshots, start_bounds, history_snapshot, moved } => {
                let moved = self.resize_to(&ids, anchor, &start_snapshots, start_bounds, start_pointer, world) || moved;
                self.input = InputState::Resizing {
                    ids,
                    anchor,
                    start_pointer,
                    start_snapshots,
                    start_bounds,
                    history_snapshot,
                    moved,
                };
                vec![Action::RenderNeeded]
            }
            InputState::Rotating { id, start_rotation, center, start_angle, history_snapshot } => {
                let mut rotation = start_rotation + pointer_angle(center, world) - start_angle;
                let step = self.config.rotation_snap_deg;
                if modifiers.shift && step > 0.0 {
                    rotation = (rotation / step).round() * step;
                }
                let rotation = normalize_degrees(rotation);
                self.scene.mutate_elements(
                    move |tree| {
                        tree.into_iter()
                            .map(|mut e| {
                                if e.id == id {
                                    e.rotation = rotation;
                                }
                                e
                            })
                            .collect()
                    },
                    MutateOptions::transient(),
                );
                self.input = InputState::Rotating { id, start_rotation, center, start_angle, history_snapshot };
                vec![Action::RenderNeeded]
            }
            InputState::MarqueeSelecting { start, additive, .. } => {
                self.ui.marquee = Some(Rect::from_corners(start, world));
                self.input = InputState::MarqueeSelecting { start, last: world, additive };
                vec![Action::RenderNeeded]
            }
            InputState::Panning { start_screen, start_offset } => {
                let offset = start_offset.offset(start_screen.x - screen_pt.x, start_screen.y - screen_pt.y);
                self.viewport.set_offset(offset);
                self.input = InputState::Panning { start_screen, start_offset };
                vec![Action::RenderNeeded]
            }
        }
    }

    /// Pointer released. The button is not consulted: whichever gesture is
    /// active ends.
    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.finish_gesture(screen_pt, modifiers)
    }

    /// Pointer capture lost. Same as a release.
    pub fn on_pointer_cancel(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.finish_gesture(screen_pt, modifiers)
    }

    // =============================================================
    // Keyboard and wheel
    // =============================================================

    /// Key pressed. While a text element is being edited only Escape is
    /// handled; shortcuts are ignored during a pointer gesture.
    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        if let Some(editing) = self.scene.editing_text_id() {
            if key.is("Escape") {
                self.scene.set_editing_text(None);
                return vec![Action::EditTextEnded(editing), Action::RenderNeeded];
            }
            return Vec::new();
        }
        if !self.input.is_idle() {
            return Vec::new();
        }

        let command = modifiers.command();
        let changed = if command && key.is("g") {
            if modifiers.shift { !self.ungroup_elements().is_empty() } else { self.group_elements().is_some() }
        } else if command && key.is("z") {
            if modifiers.shift { self.redo() } else { self.undo() }
        } else if command && key.is("y") {
            self.redo()
        } else if command && key.is("c") {
            self.copy();
            return Vec::new();
        } else if command && key.is("v") {
            !self.paste().is_empty()
        } else if key.is("Delete") || key.is("Backspace") {
            self.delete_selected()
        } else if let Some((dx, dy)) = arrow_direction(&key) {
            let step = if modifiers.shift { NUDGE_STEP_LARGE } else { NUDGE_STEP };
            self.nudge_selected(dx * step, dy * step)
        } else {
            return Vec::new();
        };
        debug!(key = %key.0, changed, "gesture: key");
        if !changed {
            return Vec::new();
        }
        vec![
            Action::HistoryCommitted,
            Action::SelectionChanged(self.scene.selection().to_vec()),
            Action::RenderNeeded,
        ]
    }

    /// Wheel: zoom about the pointer with Ctrl/Meta held, otherwise scroll.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.command() {
            let factor = (-delta.dy * WHEEL_ZOOM_SENSITIVITY).exp();
            self.zoom_about(self.zoom * factor, screen_pt);
        } else {
            self.pan_by(delta.dx, delta.dy);
        }
        vec![Action::RenderNeeded]
    }

    // =============================================================
    // Gesture starts
    // =============================================================

    fn begin_pan(&mut self, screen_pt: Point, actions: &mut Vec<Action>) {
        self.input = InputState::Panning { start_screen: screen_pt, start_offset: self.viewport.offset() };
        self.set_cursor(CURSOR_GRABBING, actions);
    }

    fn begin_drag(&mut self, id: ElementId, world: Point, modifiers: Modifiers, actions: &mut Vec<Action>) {
        let was_sole = self.scene.selection() == [id].as_slice();
        let before = self.scene.selection().to_vec();
        if modifiers.additive() {
            self.scene.set_selection(&[id], true);
        } else if !self.scene.is_selected(&id) {
            self.scene.set_selection(&[id], false);
        }
        if self.scene.selection() != before.as_slice() {
            actions.push(Action::SelectionChanged(self.scene.selection().to_vec()));
        }

        let arm_edit = was_sole && !modifiers.additive() && self.scene.get(&id).is_some_and(CanvasElement::is_text);
        self.input = InputState::Dragging {
            ids: self.scene.selection().to_vec(),
            start_pointer: world,
            snapshots: self.scene.selected_elements().into_iter().cloned().collect(),
            history_snapshot: self.scene.snapshot(),
            moved: false,
            edit_on_release: arm_edit.then_some(id),
        };
        self.set_cursor(CURSOR_MOVE, actions);
    }

    fn begin_resize(&mut self, anchor: ResizeAnchor, world: Point, actions: &mut Vec<Action>) {
        let start_snapshots: Vec<CanvasElement> = self.scene.selected_elements().into_iter().cloned().collect();
        let Some(start_bounds) = union_rect(&start_snapshots) else {
            return;
        };
        self.input = InputState::Resizing {
            ids: self.scene.selection().to_vec(),
            anchor,
            start_pointer: world,
            start_snapshots,
            start_bounds,
            history_snapshot: self.scene.snapshot(),
            moved: false,
        };
        self.set_cursor(cursor_for_direction(anchor), actions);
    }

    fn begin_rotate(&mut self, id: ElementId, world: Point, actions: &mut Vec<Action>) {
        let Some(el) = self.scene.get(&id) else {
            return;
        };
        // Rotation is about the element's own center, which rotation leaves in place.
        let center = el.center();
        self.input = InputState::Rotating {
            id,
            start_rotation: el.rotation,
            center,
            start_angle: pointer_angle(center, world),
            history_snapshot: self.scene.snapshot(),
        };
        self.set_cursor(CURSOR_GRABBING, actions);
    }

    fn begin_marquee(&mut self, world: Point, modifiers: Modifiers, actions: &mut Vec<Action>) {
        let additive = modifiers.additive();
        if !additive && !self.scene.selection().is_empty() {
            self.scene.clear_selection();
            actions.push(Action::SelectionChanged(Vec::new()));
        }
        self.ui.marquee = Some(Rect::new(world.x, world.y, 0.0, 0.0));
        self.input = InputState::MarqueeSelecting { start: world, last: world, additive };
        self.set_cursor(CURSOR_CROSSHAIR, actions);
    }

    // =============================================================
    // Gesture frames
    // =============================================================

    fn hover(&mut self, world: Point) -> Vec<Action> {
        let cursor = if self.interaction_mode == InteractionMode::Pan {
            CURSOR_GRAB
        } else {
            match hit_test(world, &self.scene, &self.camera()).map(|h| h.part) {
                Some(HitPart::ResizeHandle(anchor)) => cursor_for_direction(anchor),
                Some(HitPart::RotateHandle) => CURSOR_GRAB,
                Some(HitPart::Body) => CURSOR_MOVE,
                None => CURSOR_DEFAULT,
            }
        };
        let mut actions = Vec::new();
        self.set_cursor(cursor, &mut actions);
        actions
    }

    /// Move the dragged elements to their snapped position. Returns whether
    /// the corrected delta exceeds the move epsilon.
    fn drag_to(&mut self, ids: &[ElementId], snapshots: &[CanvasElement], start: Point, world: Point) -> bool {
        let raw = Point::new(world.x - start.x, world.y - start.y);
        let statics = self.statics(ids);
        let threshold = self.config.snap_threshold_px / self.zoom;
        let snap = snap_translation(snapshots, &statics, raw, threshold, Some(self.scene.artboard().rect()));

        let moved: Vec<CanvasElement> = snapshots
            .iter()
            .map(|el| propagate(el, Propagation::Translate { dx: snap.dx, dy: snap.dy }))
            .collect();
        self.scene.mutate_elements(move |tree| replace_by_id(tree, &moved), MutateOptions::transient());
        self.ui.guides = snap.guides;

        let epsilon = self.config.move_epsilon;
        snap.dx.abs() > epsilon || snap.dy.abs() > epsilon
    }

    /// Resize the selection to follow the pointer. Returns whether the
    /// pointer has left its start position.
    fn resize_to(
        &mut self,
        ids: &[ElementId],
        anchor: ResizeAnchor,
        snapshots: &[CanvasElement],
        start_bounds: Rect,
        start: Point,
        world: Point,
    ) -> bool {
        let raw = Point::new(world.x - start.x, world.y - start.y);
        let resized: Vec<CanvasElement> = match snapshots {
            [el] if normalize_degrees(el.rotation).abs() > f64::EPSILON => {
                self.ui.guides.clear();
                vec![resize_rotated(el, anchor, raw)]
            }
            _ => {
                let candidate = drag_edges(start_bounds, anchor, raw);
                let statics = self.statics(ids);
                let threshold = self.config.snap_threshold_px / self.zoom;
                let snap = snap_resize(anchor, candidate, &statics, threshold, Some(self.scene.artboard().rect()));
                self.ui.guides = snap.guides;
                snapshots.iter().map(|el| fit_into(el, start_bounds, snap.bounds)).collect()
            }
        };
        self.scene.mutate_elements(move |tree| replace_by_id(tree, &resized), MutateOptions::transient());

        let epsilon = self.config.move_epsilon;
        raw.x.abs() > epsilon || raw.y.abs() > epsilon
    }

    fn statics(&self, moving: &[ElementId]) -> Vec<CanvasElement> {
        self.scene.elements().iter().filter(|e| !moving.contains(&e.id)).cloned().collect()
    }

    // =============================================================
    // Gesture end
    // =============================================================

    fn finish_gesture(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let state = std::mem::take(&mut self.input);
        if state.is_idle() {
            return Vec::new();
        }
        let name = state.name();
        let mut actions = Vec::new();

        match state {
            InputState::Idle | InputState::Panning { .. } => {}
            InputState::Dragging { moved, history_snapshot, edit_on_release, .. } => {
                if moved {
                    self.commit(history_snapshot, &mut actions);
                } else {
                    self.discard(history_snapshot);
                    if let Some(id) = edit_on_release {
                        if self.start_editing_text(&id) {
                            actions.push(Action::EditTextStarted(id));
                        }
                    }
                }
            }
            InputState::Resizing { moved, history_snapshot, .. } => {
                if moved {
                    self.commit(history_snapshot, &mut actions);
                } else {
                    self.discard(history_snapshot);
                }
            }
            InputState::Rotating { history_snapshot, .. } => self.commit(history_snapshot, &mut actions),
            InputState::MarqueeSelecting { start, additive, .. } => {
                let end = self.camera().screen_to_world(screen_pt);
                let area = Rect::from_corners(start, end);
                // A click on empty canvas is not an area selection.
                let hits: Vec<ElementId> = if area.width.max(area.height) <= self.config.move_epsilon {
                    Vec::new()
                } else {
                    self.scene.elements().iter().filter(|e| e.rect().intersects(&area)).map(|e| e.id).collect()
                };
                let before = self.scene.selection().to_vec();
                self.set_selection(&hits, additive || modifiers.additive());
                if self.scene.selection() != before.as_slice() {
                    actions.push(Action::SelectionChanged(self.scene.selection().to_vec()));
                }
                self.ui.marquee = None;
            }
        }

        self.ui.guides.clear();
        let cursor = if self.interaction_mode == InteractionMode::Pan { CURSOR_GRAB } else { CURSOR_DEFAULT };
        self.set_cursor(cursor, &mut actions);
        debug!(gesture = name, committed = actions.contains(&Action::HistoryCommitted), "gesture: finished");
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Record one history entry for the gesture. The live tree already holds
    /// the final state; the entry is the tree captured at pointer-down.
    fn commit(&mut self, history_snapshot: ElementTree, actions: &mut Vec<Action>) {
        self.scene.mutate_elements(|tree| tree, MutateOptions::commit(history_snapshot));
        actions.push(Action::HistoryCommitted);
    }

    /// Drop sub-epsilon intermediate frames.
    fn discard(&mut self, history_snapshot: ElementTree) {
        self.scene.mutate_elements(move |_| history_snapshot, MutateOptions::transient());
    }

    fn set_cursor(&mut self, cursor: &str, actions: &mut Vec<Action>) {
        if self.ui.cursor != cursor {
            cursor.clone_into(&mut self.ui.cursor);
            actions.push(Action::SetCursor(cursor.to_owned()));
        }
    }
}

// =============================================================
// Geometry helpers
// =============================================================

/// Angle of `p` about `center` in degrees, clockwise from +x (y points down).
fn pointer_angle(center: Point, p: Point) -> f64 {
    (p.y - center.y).atan2(p.x - center.x).to_degrees()
}

fn arrow_direction(key: &Key) -> Option<(f64, f64)> {
    if key.is("ArrowLeft") {
        Some((-1.0, 0.0))
    } else if key.is("ArrowRight") {
        Some((1.0, 0.0))
    } else if key.is("ArrowUp") {
        Some((0.0, -1.0))
    } else if key.is("ArrowDown") {
        Some((0.0, 1.0))
    } else {
        None
    }
}

/// Move the edges of `bounds` implicated by `anchor` by `delta`. An edge
/// never crosses its opposite, so width and height floor at zero.
fn drag_edges(bounds: Rect, anchor: ResizeAnchor, delta: Point) -> Rect {
    let (mut left, mut right) = (bounds.x, bounds.right());
    let (mut top, mut bottom) = (bounds.y, bounds.bottom());
    if anchor.moves_left() {
        left = (left + delta.x).min(right);
    }
    if anchor.moves_right() {
        right = (right + delta.x).max(left);
    }
    if anchor.moves_top() {
        top = (top + delta.y).min(bottom);
    }
    if anchor.moves_bottom() {
        bottom = (bottom + delta.y).max(top);
    }
    Rect::new(left, top, right - left, bottom - top)
}

/// Map `el` from its place in `from` to the same relative place in `to`,
/// scaling its size (and a group's contents) by the same factors.
fn fit_into(el: &CanvasElement, from: Rect, to: Rect) -> CanvasElement {
    let sx = if from.width > 0.0 { to.width / from.width } else { 1.0 };
    let sy = if from.height > 0.0 { to.height / from.height } else { 1.0 };
    let mut out = propagate(el, Propagation::Scale { sx, sy });
    out.x = to.x + (el.x - from.x) * sx;
    out.y = to.y + (el.y - from.y) * sy;
    if from.width <= 0.0 {
        out.width = to.width;
    }
    if from.height <= 0.0 {
        out.height = to.height;
    }
    out
}

/// Resize a rotated element in its own frame. The handle opposite `anchor`
/// stays fixed in world space.
fn resize_rotated(el: &CanvasElement, anchor: ResizeAnchor, world_delta: Point) -> CanvasElement {
    let local_delta = Affine::rotate(-el.rotation).apply_vector(world_delta);
    let local = drag_edges(Rect::new(0.0, 0.0, el.width, el.height), anchor, local_delta);
    // The new box keeps the old rotation, so pinning its center pins every
    // point of the unchanged edges.
    let center = element_transform(el).apply(local.center());
    let mut out = fit_into(el, Rect::new(0.0, 0.0, el.width, el.height), Rect::new(0.0, 0.0, local.width, local.height));
    out.x = center.x - local.width / 2.0;
    out.y = center.y - local.height / 2.0;
    out
}
