#![allow(clippy::float_cmp)]

use super::*;
use crate::camera::Size;
use crate::doc::ShapeVariant;

// =============================================================
// Helpers
// =============================================================

const EPSILON: f64 = 1e-6;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> CanvasElement {
    let mut el = CanvasElement::shape(ShapeVariant::Rectangle, w, h);
    el.x = x;
    el.y = y;
    el
}

/// Engine at zoom 1 with no scroll, so screen and world coordinates agree.
fn engine_with(elements: Vec<CanvasElement>) -> EngineCore {
    let mut engine = EngineCore::new();
    engine.set_viewport(Size::new(800.0, 600.0));
    engine.scene.load(elements);
    engine
}

fn none() -> Modifiers {
    Modifiers::default()
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Modifiers::default() }
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Modifiers::default() }
}

fn ctrl_shift() -> Modifiers {
    Modifiers { ctrl: true, shift: true, ..Modifiers::default() }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn down(engine: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    engine.on_pointer_down(pt(x, y), Button::Primary, none())
}

fn drag(engine: &mut EngineCore, from: Point, to: Point) -> Vec<Action> {
    engine.on_pointer_down(from, Button::Primary, none());
    engine.on_pointer_move(to, none());
    engine.on_pointer_up(to, Button::Primary, none())
}

fn click(engine: &mut EngineCore, x: f64, y: f64) -> Vec<Action> {
    let mut actions = down(engine, x, y);
    actions.extend(engine.on_pointer_up(pt(x, y), Button::Primary, none()));
    actions
}

fn key(engine: &mut EngineCore, name: &str, modifiers: Modifiers) -> Vec<Action> {
    engine.on_key_down(Key::new(name), modifiers)
}

fn el<'a>(engine: &'a EngineCore, id: &ElementId) -> &'a CanvasElement {
    engine.element(id).unwrap()
}

// =============================================================
// Selection by click
// =============================================================

#[test]
fn click_selects_top_most_element() {
    let below = rect(0.0, 0.0, 100.0, 100.0);
    let above = rect(50.0, 50.0, 100.0, 100.0);
    let above_id = above.id;
    let mut engine = engine_with(vec![below, above]);
    let actions = click(&mut engine, 75.0, 75.0);
    assert_eq!(engine.selection(), [above_id].as_slice());
    assert!(actions.contains(&Action::SelectionChanged(vec![above_id])));
    assert!(engine.input.is_idle());
}

#[test]
fn click_without_moving_records_nothing() {
    let mut engine = engine_with(vec![rect(0.0, 0.0, 100.0, 100.0)]);
    let actions = click(&mut engine, 50.0, 50.0);
    assert_eq!(engine.scene.history_len(), 0);
    assert!(!actions.contains(&Action::HistoryCommitted));
}

#[test]
fn shift_click_extends_selection() {
    let a = rect(0.0, 0.0, 50.0, 50.0);
    let b = rect(200.0, 0.0, 50.0, 50.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut engine = engine_with(vec![a, b]);
    click(&mut engine, 25.0, 25.0);
    engine.on_pointer_down(pt(225.0, 25.0), Button::Primary, shift());
    engine.on_pointer_up(pt(225.0, 25.0), Button::Primary, shift());
    assert_eq!(engine.selection(), [a_id, b_id].as_slice());
}

#[test]
fn clicking_empty_canvas_clears_selection() {
    let a = rect(0.0, 0.0, 50.0, 50.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.set_selection(&[id], false);
    click(&mut engine, 400.0, 400.0);
    assert!(engine.selection().is_empty());
}

#[test]
fn secondary_button_does_nothing() {
    let a = rect(0.0, 0.0, 50.0, 50.0);
    let mut engine = engine_with(vec![a]);
    let actions = engine.on_pointer_down(pt(25.0, 25.0), Button::Secondary, none());
    assert!(actions.is_empty());
    assert!(engine.input.is_idle());
    assert!(engine.selection().is_empty());
}

#[test]
fn hover_reports_cursor_changes_once() {
    let mut engine = engine_with(vec![rect(0.0, 0.0, 50.0, 50.0)]);
    let actions = engine.on_pointer_move(pt(25.0, 25.0), none());
    assert_eq!(actions, vec![Action::SetCursor("move".to_owned())]);
    assert!(engine.on_pointer_move(pt(26.0, 25.0), none()).is_empty());
}

// =============================================================
// Dragging
// =============================================================

#[test]
fn drag_snaps_left_edge_to_neighbor_right_edge() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let b = rect(105.0, 0.0, 100.0, 100.0);
    let b_id = b.id;
    let mut engine = engine_with(vec![a, b]);

    engine.on_pointer_down(pt(150.0, 50.0), Button::Primary, none());
    engine.on_pointer_move(pt(144.0, 50.0), none());
    assert_eq!(el(&engine, &b_id).x, 100.0);
    assert!(!engine.ui.guides.is_empty());

    let actions = engine.on_pointer_up(pt(144.0, 50.0), Button::Primary, none());
    assert!(actions.contains(&Action::HistoryCommitted));
    assert_eq!(el(&engine, &b_id).x, 100.0);
    assert!(engine.ui.guides.is_empty());
}

#[test]
fn snapped_position_sticks_for_small_nudges() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let b = rect(105.0, 0.0, 100.0, 100.0);
    let b_id = b.id;
    let mut engine = engine_with(vec![a, b]);

    engine.on_pointer_down(pt(150.0, 50.0), Button::Primary, none());
    engine.on_pointer_move(pt(145.0, 50.0), none());
    let snapped = el(&engine, &b_id).x;
    engine.on_pointer_move(pt(147.0, 50.0), none());
    assert_eq!(el(&engine, &b_id).x, snapped);
    assert_eq!(snapped, 100.0);
}

#[test]
fn drag_commits_exactly_one_entry_with_start_state() {
    let a = rect(0.0, 0.0, 50.0, 50.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    let before = engine.scene.snapshot();

    engine.on_pointer_down(pt(25.0, 25.0), Button::Primary, none());
    for step in 1..=5 {
        engine.on_pointer_move(pt(25.0 + f64::from(step) * 20.0, 25.0), none());
    }
    engine.on_pointer_up(pt(125.0, 25.0), Button::Primary, none());
    assert_eq!(engine.scene.history_len(), 1);
    assert_eq!(el(&engine, &id).x, 100.0);

    engine.undo();
    assert_eq!(engine.scene.snapshot(), before);
}

#[test]
fn drag_moves_whole_selection() {
    let a = rect(0.0, 0.0, 50.0, 50.0);
    let b = rect(300.0, 300.0, 50.0, 50.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut engine = engine_with(vec![a, b]);
    engine.set_selection(&[a_id, b_id], false);

    drag(&mut engine, pt(25.0, 25.0), pt(45.0, 35.0));
    assert_eq!((el(&engine, &a_id).x, el(&engine, &a_id).y), (20.0, 10.0));
    assert_eq!((el(&engine, &b_id).x, el(&engine, &b_id).y), (320.0, 310.0));
    assert_eq!(engine.selection().len(), 2);
}

#[test]
fn pressing_member_of_multi_selection_keeps_selection() {
    let a = rect(0.0, 0.0, 50.0, 50.0);
    let b = rect(300.0, 300.0, 50.0, 50.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut engine = engine_with(vec![a, b]);
    engine.set_selection(&[a_id, b_id], false);

    let actions = click(&mut engine, 25.0, 25.0);
    assert_eq!(engine.selection(), [a_id, b_id].as_slice());
    assert!(!actions.iter().any(|a| matches!(a, Action::SelectionChanged(_))));

    click(&mut engine, 325.0, 325.0);
    assert_eq!(engine.selection(), [a_id, b_id].as_slice());
}

#[test]
fn drag_at_zoom_uses_world_delta() {
    let a = rect(0.0, 0.0, 50.0, 50.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.zoom_about(2.0, pt(0.0, 0.0));
    drag(&mut engine, pt(50.0, 50.0), pt(90.0, 50.0));
    assert_eq!(el(&engine, &id).x, 20.0);
}

#[test]
fn dragging_group_keeps_children_relative() {
    let group = CanvasElement::group(Rect::new(0.0, 0.0, 100.0, 100.0), vec![rect(10.0, 10.0, 20.0, 20.0)]);
    let id = group.id;
    let mut engine = engine_with(vec![group]);
    drag(&mut engine, pt(20.0, 20.0), pt(70.0, 20.0));
    let group = el(&engine, &id);
    assert_eq!(group.x, 50.0);
    assert_eq!(group.children()[0].x, 10.0);
}

#[test]
fn new_press_during_gesture_finishes_it_first() {
    let a = rect(0.0, 0.0, 50.0, 50.0);
    let mut engine = engine_with(vec![a]);
    engine.on_pointer_down(pt(25.0, 25.0), Button::Primary, none());
    engine.on_pointer_move(pt(75.0, 25.0), none());
    let actions = engine.on_pointer_down(pt(500.0, 500.0), Button::Primary, none());
    assert!(actions.contains(&Action::HistoryCommitted));
    assert_eq!(engine.scene.history_len(), 1);
    assert_eq!(engine.input.name(), "marquee");
}

#[test]
fn pointer_cancel_behaves_like_release() {
    let a = rect(0.0, 0.0, 50.0, 50.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.on_pointer_down(pt(25.0, 25.0), Button::Primary, none());
    engine.on_pointer_move(pt(125.0, 25.0), none());
    engine.on_pointer_cancel(pt(125.0, 25.0), none());
    assert!(engine.input.is_idle());
    assert_eq!(engine.scene.history_len(), 1);
    assert_eq!(el(&engine, &id).x, 100.0);
}

// =============================================================
// Resizing
// =============================================================

#[test]
fn resize_from_corner_handle() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.set_selection(&[id], false);

    engine.on_pointer_down(pt(100.0, 100.0), Button::Primary, none());
    assert_eq!(engine.input.name(), "resizing");
    assert_eq!(engine.ui.cursor, "nwse-resize");
    engine.on_pointer_move(pt(150.0, 130.0), none());
    engine.on_pointer_up(pt(150.0, 130.0), Button::Primary, none());

    let a = el(&engine, &id);
    assert_eq!((a.x, a.y), (0.0, 0.0));
    assert!(approx_eq(a.width, 150.0));
    assert!(approx_eq(a.height, 130.0));
    assert_eq!(engine.scene.history_len(), 1);
}

#[test]
fn resize_floors_at_zero() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.set_selection(&[id], false);

    drag(&mut engine, pt(100.0, 100.0), pt(-50.0, -80.0));
    let a = el(&engine, &id);
    assert_eq!((a.width, a.height), (0.0, 0.0));
    assert_eq!((a.x, a.y), (0.0, 0.0));
}

#[test]
fn resize_snaps_dragged_edge_only() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let wall = rect(203.0, 300.0, 10.0, 10.0);
    let id = a.id;
    let mut engine = engine_with(vec![a, wall]);
    engine.set_selection(&[id], false);

    drag(&mut engine, pt(100.0, 50.0), pt(200.0, 50.0));
    let a = el(&engine, &id);
    assert_eq!(a.x, 0.0);
    assert!(approx_eq(a.width, 203.0));
}

#[test]
fn multi_selection_resize_scales_positions() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let b = rect(100.0, 0.0, 100.0, 100.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut engine = engine_with(vec![a, b]);
    engine.set_selection(&[a_id, b_id], false);

    drag(&mut engine, pt(200.0, 50.0), pt(400.0, 50.0));
    assert_eq!((el(&engine, &a_id).x, el(&engine, &a_id).width), (0.0, 200.0));
    assert_eq!((el(&engine, &b_id).x, el(&engine, &b_id).width), (200.0, 200.0));
    assert_eq!(engine.scene.history_len(), 1);
}

#[test]
fn resizing_group_scales_children() {
    let group = CanvasElement::group(Rect::new(0.0, 0.0, 100.0, 100.0), vec![rect(50.0, 0.0, 50.0, 50.0)]);
    let id = group.id;
    let mut engine = engine_with(vec![group]);
    engine.set_selection(&[id], false);

    drag(&mut engine, pt(100.0, 100.0), pt(200.0, 200.0));
    let child = &el(&engine, &id).children()[0];
    assert_eq!((child.x, child.y, child.width, child.height), (100.0, 0.0, 100.0, 100.0));
}

#[test]
fn rotated_resize_keeps_opposite_corner_fixed() {
    let mut a = rect(0.0, 0.0, 100.0, 100.0);
    a.rotation = 90.0;
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.set_selection(&[id], false);
    let pinned_before = element_transform(el(&engine, &id)).apply(pt(0.0, 0.0));

    // The local south-east corner sits at world (0, 100) after a 90° turn.
    drag(&mut engine, pt(0.0, 100.0), pt(0.0, 150.0));
    let a = el(&engine, &id);
    assert!(approx_eq(a.width, 150.0));
    assert!(approx_eq(a.height, 100.0));
    assert_eq!(a.rotation, 90.0);
    let pinned_after = element_transform(a).apply(pt(0.0, 0.0));
    assert!(approx_eq(pinned_before.x, pinned_after.x));
    assert!(approx_eq(pinned_before.y, pinned_after.y));
}

// =============================================================
// Rotating
// =============================================================

#[test]
fn rotate_handle_turns_element() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.set_selection(&[id], false);

    // Rotate handle floats above the top edge center.
    engine.on_pointer_down(pt(50.0, -24.0), Button::Primary, none());
    assert_eq!(engine.input.name(), "rotating");
    engine.on_pointer_move(pt(150.0, 50.0), none());
    let actions = engine.on_pointer_up(pt(150.0, 50.0), Button::Primary, none());
    assert!(approx_eq(el(&engine, &id).rotation, 90.0));
    assert!(actions.contains(&Action::HistoryCommitted));
}

#[test]
fn shift_snaps_rotation_to_increment() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.set_selection(&[id], false);

    engine.on_pointer_down(pt(50.0, -24.0), Button::Primary, none());
    let (sin, cos) = 7.0_f64.to_radians().sin_cos();
    let target = pt(50.0 + 100.0 * cos, 50.0 + 100.0 * sin);
    engine.on_pointer_move(target, none());
    assert!(approx_eq(el(&engine, &id).rotation, 97.0));
    engine.on_pointer_move(target, shift());
    assert!(approx_eq(el(&engine, &id).rotation, 90.0));
}

#[test]
fn rotation_is_normalized() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.set_selection(&[id], false);
    drag(&mut engine, pt(50.0, -24.0), pt(-50.0, 50.0));
    assert!(approx_eq(el(&engine, &id).rotation, 270.0));
}

#[test]
fn rotation_always_commits() {
    let a = rect(0.0, 0.0, 100.0, 100.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.set_selection(&[id], false);
    click(&mut engine, 50.0, -24.0);
    assert_eq!(engine.scene.history_len(), 1);
}

// =============================================================
// Marquee
// =============================================================

#[test]
fn marquee_selects_intersecting_elements() {
    let partial = rect(40.0, 40.0, 100.0, 100.0);
    let outside = rect(60.0, 60.0, 10.0, 10.0);
    let partial_id = partial.id;
    let mut engine = engine_with(vec![partial, outside]);

    engine.on_pointer_down(pt(0.0, 0.0), Button::Primary, none());
    engine.on_pointer_move(pt(50.0, 50.0), none());
    assert_eq!(engine.ui.marquee, Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
    let actions = engine.on_pointer_up(pt(50.0, 50.0), Button::Primary, none());

    assert_eq!(engine.selection(), [partial_id].as_slice());
    assert!(actions.contains(&Action::SelectionChanged(vec![partial_id])));
    assert!(engine.ui.marquee.is_none());
}

#[test]
fn marquee_normalizes_reverse_drag() {
    let a = rect(10.0, 10.0, 10.0, 10.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    drag(&mut engine, pt(50.0, 50.0), pt(0.0, 0.0));
    assert_eq!(engine.selection(), [id].as_slice());
}

#[test]
fn additive_marquee_keeps_existing_selection() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(100.0, 100.0, 10.0, 10.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut engine = engine_with(vec![a, b]);
    engine.set_selection(&[a_id], false);

    engine.on_pointer_down(pt(90.0, 90.0), Button::Primary, shift());
    engine.on_pointer_move(pt(120.0, 120.0), shift());
    engine.on_pointer_up(pt(120.0, 120.0), Button::Primary, none());
    assert_eq!(engine.selection(), [a_id, b_id].as_slice());
}

#[test]
fn modifier_at_release_unions_marquee() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(100.0, 100.0, 10.0, 10.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut engine = engine_with(vec![a, b]);
    engine.set_selection(&[a_id], false);

    engine.on_pointer_down(pt(90.0, 90.0), Button::Primary, none());
    engine.on_pointer_move(pt(120.0, 120.0), none());
    engine.on_pointer_up(pt(120.0, 120.0), Button::Primary, shift());
    // The plain press cleared `a`; the union adds `b` to what remains.
    assert_eq!(engine.selection(), [b_id].as_slice());
}

#[test]
fn empty_click_inside_rotated_element_box_selects_nothing() {
    let mut bar = rect(0.0, 0.0, 100.0, 20.0);
    bar.rotation = 90.0;
    let mut engine = engine_with(vec![bar]);
    // The stored box covers (5, 5); the rotated body spans only x = 40..60.
    let actions = click(&mut engine, 5.0, 5.0);
    assert!(engine.selection().is_empty());
    assert!(!actions.iter().any(|a| matches!(a, Action::SelectionChanged(_))));
}

#[test]
fn marquee_uses_unrotated_bounds() {
    let mut tall = rect(100.0, 0.0, 10.0, 100.0);
    tall.rotation = 90.0;
    let mut engine = engine_with(vec![tall]);
    // The rotated extent reaches x = 55, but the stored box starts at x = 100.
    drag(&mut engine, pt(50.0, 40.0), pt(70.0, 60.0));
    assert!(engine.selection().is_empty());
}

// =============================================================
// Text editing
// =============================================================

#[test]
fn second_click_on_selected_text_enters_edit_mode() {
    let mut text = CanvasElement::text("Title", 300.0, 60.0);
    text.x = 100.0;
    text.y = 100.0;
    let text_id = text.id;
    let mut engine = engine_with(vec![text]);

    click(&mut engine, 200.0, 120.0);
    assert_eq!(engine.selection(), [text_id].as_slice());
    assert_eq!(engine.editing_text_id(), None);

    let actions = click(&mut engine, 200.0, 120.0);
    assert_eq!(engine.editing_text_id(), Some(text_id));
    assert!(actions.contains(&Action::EditTextStarted(text_id)));
}

#[test]
fn dragging_selected_text_does_not_enter_edit_mode() {
    let mut text = CanvasElement::text("Title", 300.0, 60.0);
    text.x = 100.0;
    text.y = 100.0;
    let text_id = text.id;
    let mut engine = engine_with(vec![text]);
    engine.set_selection(&[text_id], false);

    drag(&mut engine, pt(200.0, 120.0), pt(260.0, 180.0));
    assert_eq!(engine.editing_text_id(), None);
    assert_eq!(engine.scene.history_len(), 1);
}

#[test]
fn clicking_other_element_exits_edit_mode_then_selects() {
    let mut text = CanvasElement::text("Title", 300.0, 60.0);
    text.x = 100.0;
    text.y = 100.0;
    let shape = rect(600.0, 400.0, 100.0, 100.0);
    let (text_id, shape_id) = (text.id, shape.id);
    let mut engine = engine_with(vec![text, shape]);
    engine.start_editing_text(&text_id);

    let actions = click(&mut engine, 650.0, 450.0);
    assert_eq!(actions.first(), Some(&Action::EditTextEnded(text_id)));
    assert_eq!(engine.editing_text_id(), None);
    assert_eq!(engine.selection(), [shape_id].as_slice());
}

#[test]
fn clicking_inside_edited_text_keeps_editing() {
    let mut text = CanvasElement::text("Title", 300.0, 60.0);
    text.x = 100.0;
    text.y = 100.0;
    let text_id = text.id;
    let mut engine = engine_with(vec![text]);
    engine.start_editing_text(&text_id);
    click(&mut engine, 200.0, 120.0);
    assert_eq!(engine.editing_text_id(), Some(text_id));
}

#[test]
fn escape_leaves_edit_mode_and_other_keys_are_ignored() {
    let text = CanvasElement::text("Title", 300.0, 60.0);
    let text_id = text.id;
    let mut engine = engine_with(vec![text]);
    engine.start_editing_text(&text_id);

    assert!(key(&mut engine, "Delete", none()).is_empty());
    assert!(key(&mut engine, "z", ctrl()).is_empty());
    assert!(engine.element(&text_id).is_some());

    let actions = key(&mut engine, "Escape", none());
    assert_eq!(actions[0], Action::EditTextEnded(text_id));
    assert_eq!(engine.editing_text_id(), None);
    assert_eq!(engine.selection(), [text_id].as_slice());
}

// =============================================================
// Panning and wheel
// =============================================================

#[test]
fn pan_mode_drag_scrolls_viewport() {
    let mut engine = engine_with(vec![rect(0.0, 0.0, 500.0, 500.0)]);
    engine.set_interaction_mode(InteractionMode::Pan);
    engine.on_pointer_down(pt(100.0, 100.0), Button::Primary, none());
    assert_eq!(engine.input.name(), "panning");
    engine.on_pointer_move(pt(60.0, 80.0), none());
    assert_eq!(engine.pan(), pt(40.0, 20.0));
    engine.on_pointer_up(pt(60.0, 80.0), Button::Primary, none());
    assert!(engine.selection().is_empty());
    assert_eq!(engine.scene.history_len(), 0);
}

#[test]
fn middle_button_pans_in_select_mode() {
    let mut engine = engine_with(Vec::new());
    engine.pan_by(10.0, 10.0);
    engine.on_pointer_down(pt(100.0, 100.0), Button::Middle, none());
    engine.on_pointer_move(pt(130.0, 90.0), none());
    assert_eq!(engine.pan(), pt(-20.0, 20.0));
}

#[test]
fn ctrl_wheel_zooms_about_pointer() {
    let mut engine = engine_with(Vec::new());
    let anchor = pt(200.0, 150.0);
    let world_before = engine.camera().screen_to_world(anchor);
    engine.on_wheel(anchor, WheelDelta { dx: 0.0, dy: -100.0 }, ctrl());
    assert!(engine.zoom() > 1.0);
    let world_after = engine.camera().screen_to_world(anchor);
    assert!(approx_eq(world_before.x, world_after.x));
    assert!(approx_eq(world_before.y, world_after.y));
}

#[test]
fn wheel_zoom_is_clamped() {
    let mut engine = engine_with(Vec::new());
    engine.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: 100_000.0 }, ctrl());
    assert_eq!(engine.zoom(), 0.25);
}

#[test]
fn plain_wheel_scrolls() {
    let mut engine = engine_with(Vec::new());
    engine.on_wheel(pt(0.0, 0.0), WheelDelta { dx: 3.0, dy: 40.0 }, none());
    assert_eq!(engine.pan(), pt(3.0, 40.0));
    assert_eq!(engine.zoom(), 1.0);
}

// =============================================================
// Keyboard
// =============================================================

#[test]
fn group_and_ungroup_shortcuts() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(50.0, 50.0, 10.0, 10.0);
    let ids = [a.id, b.id];
    let mut engine = engine_with(vec![a, b]);
    engine.set_selection(&ids, false);

    let actions = key(&mut engine, "g", ctrl());
    assert!(actions.contains(&Action::HistoryCommitted));
    assert_eq!(engine.elements().len(), 1);
    assert!(engine.elements()[0].is_group());

    key(&mut engine, "G", ctrl_shift());
    assert_eq!(engine.elements().len(), 2);
    assert_eq!(engine.selection().len(), 2);
}

#[test]
fn group_shortcut_with_one_selected_does_nothing() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.set_selection(&[id], false);
    assert!(key(&mut engine, "g", ctrl()).is_empty());
    assert_eq!(engine.scene.history_len(), 0);
}

#[test]
fn undo_redo_shortcuts() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    drag(&mut engine, pt(5.0, 5.0), pt(55.0, 5.0));
    assert_eq!(el(&engine, &id).x, 50.0);

    key(&mut engine, "z", ctrl());
    assert_eq!(el(&engine, &id).x, 0.0);
    key(&mut engine, "z", ctrl_shift());
    assert_eq!(el(&engine, &id).x, 50.0);
    key(&mut engine, "z", ctrl());
    key(&mut engine, "y", ctrl());
    assert_eq!(el(&engine, &id).x, 50.0);
}

#[test]
fn meta_counts_as_command() {
    let mut engine = engine_with(Vec::new());
    engine.add_shape(ShapeVariant::Rectangle);
    let meta = Modifiers { meta: true, ..Modifiers::default() };
    key(&mut engine, "z", meta);
    assert!(engine.elements().is_empty());
}

#[test]
fn copy_paste_shortcuts() {
    let a = rect(10.0, 10.0, 10.0, 10.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.set_selection(&[id], false);
    assert!(key(&mut engine, "c", ctrl()).is_empty());
    key(&mut engine, "v", ctrl());
    assert_eq!(engine.elements().len(), 2);
    let pasted = engine.selection()[0];
    assert_eq!((el(&engine, &pasted).x, el(&engine, &pasted).y), (30.0, 30.0));
}

#[test]
fn delete_and_backspace_remove_selection() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(20.0, 0.0, 10.0, 10.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut engine = engine_with(vec![a, b]);
    engine.set_selection(&[a_id], false);
    key(&mut engine, "Delete", none());
    engine.set_selection(&[b_id], false);
    key(&mut engine, "Backspace", none());
    assert!(engine.elements().is_empty());
}

#[test]
fn arrows_nudge_selection() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let id = a.id;
    let mut engine = engine_with(vec![a]);
    engine.set_selection(&[id], false);
    key(&mut engine, "ArrowRight", none());
    key(&mut engine, "ArrowDown", shift());
    assert_eq!((el(&engine, &id).x, el(&engine, &id).y), (1.0, 10.0));
    assert_eq!(engine.scene.history_len(), 2);
}

#[test]
fn shortcuts_are_ignored_mid_gesture() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let mut engine = engine_with(vec![a]);
    engine.on_pointer_down(pt(5.0, 5.0), Button::Primary, none());
    assert!(key(&mut engine, "Delete", none()).is_empty());
    assert_eq!(engine.elements().len(), 1);
}

#[test]
fn unknown_key_does_nothing() {
    let mut engine = engine_with(Vec::new());
    assert!(key(&mut engine, "q", none()).is_empty());
}
