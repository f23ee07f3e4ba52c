//! Controller API: the single owner of scene, view and gesture state.
//!
//! DESIGN
//! ======
//! `EngineCore` wraps the [`Scene`] (elements, selection, history, artboard)
//! together with the view (zoom, a [`Viewport`] that owns the scroll offset,
//! interaction mode), the active gesture and the clipboard. Every element
//! edit goes through [`Scene::mutate_elements`]. Operations on ineligible
//! state (empty selection, empty stack, empty clipboard) are no-ops that
//! report "nothing happened" through their return value, never errors.
//!
//! Pointer, keyboard and wheel handlers live in [`crate::gesture`].

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::asset::{AssetError, prepare_upload};
use crate::camera::{Camera, ScrollViewport, Size, Viewport, clamp_zoom, fit_artboard};
use crate::config::EditorConfig;
use crate::consts::{DEFAULT_IMAGE_SIZE, DEFAULT_SHAPE_SIZE, DEFAULT_TEXT_HEIGHT, DEFAULT_TEXT_WIDTH};
use crate::doc::{
    Artboard, CanvasElement, ElementId, ElementPatch, ElementTree, MutateOptions, Scene, ShapeVariant,
    apply_patch,
};
use crate::export::{ExportError, ExportOptions, export_artboard};
use crate::geom::{Point, normalize_degrees};
use crate::group::{Propagation, apply_to_descendants, propagate, with_fresh_ids};
use crate::input::{InputState, InteractionMode, UiState};
use crate::persist::DocumentSnapshot;

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    SetCursor(String),
    SelectionChanged(Vec<ElementId>),
    /// The document changed in a way undo can see.
    HistoryCommitted,
    EditTextStarted(ElementId),
    EditTextEnded(ElementId),
}

/// A numeric element field editable from a text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericField {
    X,
    Y,
    Width,
    Height,
    Rotation,
    Opacity,
}

impl NumericField {
    fn read(self, el: &CanvasElement) -> f64 {
        match self {
            Self::X => el.x,
            Self::Y => el.y,
            Self::Width => el.width,
            Self::Height => el.height,
            Self::Rotation => el.rotation,
            Self::Opacity => el.opacity,
        }
    }

    fn patch(self, value: f64) -> ElementPatch {
        let mut patch = ElementPatch::default();
        match self {
            Self::X => patch.x = Some(value),
            Self::Y => patch.y = Some(value),
            Self::Width => patch.width = Some(value),
            Self::Height => patch.height = Some(value),
            Self::Rotation => patch.rotation = Some(normalize_degrees(value)),
            Self::Opacity => patch.opacity = Some(value),
        }
        patch
    }
}

/// Sparse update for the artboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtboardPatch {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub background_color: Option<String>,
    pub opacity: Option<f64>,
    pub visible: Option<bool>,
}

/// Core engine state: all editing logic, independent of any host toolkit.
pub struct EngineCore {
    pub scene: Scene,
    pub ui: UiState,
    pub input: InputState,
    pub config: EditorConfig,
    pub(crate) zoom: f64,
    pub(crate) viewport: Box<dyn Viewport>,
    pub(crate) interaction_mode: InteractionMode,
    pub(crate) clipboard: Vec<CanvasElement>,
    pub(crate) paste_count: u32,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_config(EditorConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EditorConfig) -> Self {
        Self::with_viewport(config, Box::new(ScrollViewport::default()))
    }

    /// Build an engine driving a host-provided viewport.
    #[must_use]
    pub fn with_viewport(config: EditorConfig, viewport: Box<dyn Viewport>) -> Self {
        Self {
            scene: Scene::with_history_limit(config.history_limit),
            ui: UiState::default(),
            input: InputState::default(),
            config,
            zoom: 1.0,
            viewport,
            interaction_mode: InteractionMode::default(),
            clipboard: Vec::new(),
            paste_count: 0,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        self.scene.elements()
    }

    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.scene.get(id)
    }

    #[must_use]
    pub fn selection(&self) -> &[ElementId] {
        self.scene.selection()
    }

    #[must_use]
    pub fn editing_text_id(&self) -> Option<ElementId> {
        self.scene.editing_text_id()
    }

    #[must_use]
    pub fn artboard(&self) -> &Artboard {
        self.scene.artboard()
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Current scroll offset, read from the viewport.
    #[must_use]
    pub fn pan(&self) -> Point {
        self.viewport.offset()
    }

    #[must_use]
    pub fn viewport_size(&self) -> Size {
        self.viewport.size()
    }

    #[must_use]
    pub fn interaction_mode(&self) -> InteractionMode {
        self.interaction_mode
    }

    /// Derived world ↔ screen mapping for this instant.
    #[must_use]
    pub fn camera(&self) -> Camera {
        Camera::new(self.zoom, self.viewport.offset())
    }

    // --- Creation ---

    /// Add a default-sized shape centered on the artboard and select it.
    pub fn add_shape(&mut self, variant: ShapeVariant) -> ElementId {
        self.insert_centered(CanvasElement::shape(variant, DEFAULT_SHAPE_SIZE, DEFAULT_SHAPE_SIZE))
    }

    pub fn add_text(&mut self, content: &str) -> ElementId {
        self.insert_centered(CanvasElement::text(content, DEFAULT_TEXT_WIDTH, DEFAULT_TEXT_HEIGHT))
    }

    /// Add an image. `natural_size` is scaled down so its longest edge fits
    /// the default image size; without it the image is a default square.
    pub fn add_image(&mut self, src: &str, natural_size: Option<(f64, f64)>) -> ElementId {
        let (w, h) = match natural_size {
            Some((w, h)) if w > 0.0 && h > 0.0 => {
                let factor = (DEFAULT_IMAGE_SIZE / w.max(h)).min(1.0);
                (w * factor, h * factor)
            }
            _ => (DEFAULT_IMAGE_SIZE, DEFAULT_IMAGE_SIZE),
        };
        self.insert_centered(CanvasElement::image(src, w, h))
    }

    /// Validate an uploaded file and add it as an image. Rejected uploads
    /// leave the document untouched.
    pub fn add_image_upload(&mut self, mime: &str, bytes: &[u8]) -> Result<ElementId, AssetError> {
        let prepared = prepare_upload(mime, bytes, &self.config)?;
        let size = prepared.natural_size.map(|(w, h)| (f64::from(w), f64::from(h)));
        Ok(self.add_image(&prepared.data_uri, size))
    }

    fn insert_centered(&mut self, mut el: CanvasElement) -> ElementId {
        let center = self.scene.artboard().center();
        el.x = center.x - el.width / 2.0;
        el.y = center.y - el.height / 2.0;
        let id = el.id;
        debug!(%id, name = %el.name, "engine: element added");
        self.scene.mutate_elements(
            move |mut tree| {
                tree.push(el);
                tree
            },
            MutateOptions::default(),
        );
        self.select_only(&[id]);
        id
    }

    // --- Editing ---

    /// Apply a sparse update to one top-level element, recording history.
    ///
    /// Resizing a group scales its descendants; an explicit rotation or
    /// opacity is copied onto every descendant. Returns `false` when the
    /// element is unknown or the patch is rejected.
    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) -> bool {
        let Some(current) = self.scene.get(id) else {
            return false;
        };
        let Some(updated) = patched_with_propagation(current, patch) else {
            debug!(%id, "engine: patch rejected");
            return false;
        };
        self.scene.mutate_elements(
            move |tree| replace_by_id(tree, std::slice::from_ref(&updated)),
            MutateOptions::default(),
        );
        true
    }

    /// Patch every selected element with one history entry. `f` sees each
    /// element's current state.
    pub fn update_selected_elements<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(&CanvasElement) -> ElementPatch,
    {
        let updates: Vec<CanvasElement> = self
            .scene
            .selected_elements()
            .into_iter()
            .filter_map(|el| patched_with_propagation(el, &f(el)))
            .collect();
        if updates.is_empty() {
            return 0;
        }
        let count = updates.len();
        self.scene.mutate_elements(move |tree| replace_by_id(tree, &updates), MutateOptions::default());
        count
    }

    /// Move the selection by a world-space delta with one history entry.
    pub fn nudge_selected(&mut self, dx: f64, dy: f64) -> bool {
        let moved: Vec<CanvasElement> = self
            .scene
            .selected_elements()
            .into_iter()
            .map(|el| propagate(el, Propagation::Translate { dx, dy }))
            .collect();
        if moved.is_empty() {
            return false;
        }
        self.scene.mutate_elements(move |tree| replace_by_id(tree, &moved), MutateOptions::default());
        true
    }

    /// Pass-through to the scene's single mutation entry point.
    pub fn mutate_elements<F>(&mut self, updater: F, options: MutateOptions)
    where
        F: FnOnce(ElementTree) -> ElementTree,
    {
        self.scene.mutate_elements(updater, options);
    }

    /// Set a numeric field from raw text input. Malformed or non-finite
    /// input leaves the element unchanged; the returned value is what the
    /// field holds afterwards, so an input widget can revert to it.
    pub fn set_numeric_field(&mut self, id: &ElementId, field: NumericField, input: &str) -> Option<f64> {
        let last_valid = field.read(self.scene.get(id)?);
        let parsed = match input.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                debug!(%id, ?field, input, "engine: numeric input reverted");
                return Some(last_valid);
            }
        };
        self.update_element(id, &field.patch(parsed));
        self.scene.get(id).map(|el| field.read(el))
    }

    /// Remove every selected element.
    pub fn delete_selected(&mut self) -> bool {
        let ids = self.scene.selection().to_vec();
        if ids.is_empty() {
            return false;
        }
        self.scene
            .mutate_elements(move |tree| tree.into_iter().filter(|e| !ids.contains(&e.id)).collect(), MutateOptions::default());
        true
    }

    // --- Selection ---

    /// Replace or extend the selection. Leaves text-edit mode unless the
    /// resulting selection is exactly the element being edited.
    pub fn set_selection(&mut self, ids: &[ElementId], additive: bool) {
        self.scene.set_selection(ids, additive);
        if let Some(editing) = self.scene.editing_text_id() {
            if self.scene.selection() != [editing].as_slice() {
                self.scene.set_editing_text(None);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(&[], false);
    }

    pub(crate) fn select_only(&mut self, ids: &[ElementId]) {
        self.set_selection(ids, false);
    }

    // --- Clipboard ---

    /// Copy the selection. Resets the paste offset sequence.
    pub fn copy(&mut self) -> usize {
        self.clipboard = self.scene.selected_elements().into_iter().cloned().collect();
        self.paste_count = 0;
        self.clipboard.len()
    }

    /// Paste fresh copies of the clipboard, offset by `paste_offset` times
    /// the number of pastes since the last copy, and select them.
    pub fn paste(&mut self) -> Vec<ElementId> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        self.paste_count += 1;
        let offset = self.config.paste_offset * f64::from(self.paste_count);
        let pasted: Vec<CanvasElement> = self
            .clipboard
            .iter()
            .map(|el| propagate(&with_fresh_ids(el), Propagation::Translate { dx: offset, dy: offset }))
            .collect();
        let ids: Vec<ElementId> = pasted.iter().map(|e| e.id).collect();
        self.scene.mutate_elements(
            move |mut tree| {
                tree.extend(pasted);
                tree
            },
            MutateOptions::default(),
        );
        self.select_only(&ids);
        ids
    }

    // --- View ---

    /// Set the zoom (clamped), keeping the viewport center fixed.
    pub fn set_zoom(&mut self, zoom: f64) {
        let size = self.viewport.size();
        self.zoom_about(zoom, Point::new(size.width / 2.0, size.height / 2.0));
    }

    /// Set the zoom (clamped), keeping the world point under `anchor` fixed.
    pub fn zoom_about(&mut self, zoom: f64, anchor: Point) {
        let zoom = clamp_zoom(zoom);
        let offset = self.camera().offset_for_zoom_about(zoom, anchor);
        self.zoom = zoom;
        self.viewport.set_offset(offset);
    }

    /// Scroll the viewport by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let offset = self.viewport.offset();
        self.viewport.set_offset(offset.offset(dx, dy));
    }

    pub fn set_interaction_mode(&mut self, mode: InteractionMode) {
        self.interaction_mode = mode;
    }

    /// Record a new viewport size. Pan and zoom are left as they are.
    pub fn set_viewport(&mut self, size: Size) {
        self.viewport.set_size(size);
    }

    /// Zoom to fit the artboard and center it in the viewport.
    pub fn fit_artboard(&mut self) {
        let camera = fit_artboard(self.scene.artboard().rect(), self.viewport.size());
        self.zoom = camera.zoom;
        self.viewport.set_offset(camera.offset);
        info!(zoom = camera.zoom, "engine: artboard fit to viewport");
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        let done = self.scene.undo();
        if done {
            self.input = InputState::Idle;
            info!(history = self.scene.history_len(), redo = self.scene.redo_len(), "engine: undo");
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.scene.redo();
        if done {
            self.input = InputState::Idle;
            info!(history = self.scene.history_len(), redo = self.scene.redo_len(), "engine: redo");
        }
        done
    }

    // --- Grouping ---

    /// Group the selection (at least two elements). The group becomes the
    /// sole selection.
    pub fn group_elements(&mut self) -> Option<ElementId> {
        let (tree, group_id) = crate::group::group_elements(self.scene.snapshot(), self.scene.selection())?;
        self.scene.mutate_elements(move |_| tree, MutateOptions::default());
        self.select_only(&[group_id]);
        info!(%group_id, "engine: grouped selection");
        Some(group_id)
    }

    /// Ungroup the sole selected group. Its children (with fresh ids)
    /// become the selection.
    pub fn ungroup_elements(&mut self) -> Vec<ElementId> {
        let Some(group) = self.scene.sole_selected().filter(|el| el.is_group()) else {
            return Vec::new();
        };
        let group_id = group.id;
        let Some((tree, ids)) = crate::group::ungroup_element(self.scene.snapshot(), &group_id) else {
            return Vec::new();
        };
        self.scene.mutate_elements(move |_| tree, MutateOptions::default());
        self.select_only(&ids);
        info!(%group_id, children = ids.len(), "engine: ungrouped");
        ids
    }

    // --- Artboard ---

    pub fn set_artboard(&mut self, artboard: Artboard) {
        self.scene.set_artboard(artboard);
    }

    /// Apply a sparse artboard update. Returns whether the size changed.
    pub fn update_artboard(&mut self, patch: &ArtboardPatch) -> bool {
        let before = self.scene.artboard().clone();
        let mut next = before.clone();
        if let Some(w) = patch.width {
            next.width = w;
        }
        if let Some(h) = patch.height {
            next.height = h;
        }
        if let Some(color) = &patch.background_color {
            next.background_color.clone_from(color);
        }
        if let Some(o) = patch.opacity.filter(|o| o.is_finite()) {
            next.opacity = o;
        }
        if let Some(v) = patch.visible {
            next.visible = v;
        }
        self.scene.set_artboard(next);
        let after = self.scene.artboard();
        after.width != before.width || after.height != before.height
    }

    /// Update the artboard and re-fit the view when its size changed.
    pub fn update_artboard_with_fit(&mut self, patch: &ArtboardPatch) -> bool {
        let resized = self.update_artboard(patch);
        if resized {
            self.fit_artboard();
        }
        resized
    }

    // --- Text editing ---

    /// Enter text-edit mode for a top-level text element. Selects it.
    pub fn start_editing_text(&mut self, id: &ElementId) -> bool {
        if !self.scene.get(id).is_some_and(CanvasElement::is_text) {
            return false;
        }
        self.scene.set_selection(&[*id], false);
        self.scene.set_editing_text(Some(*id))
    }

    /// Leave text-edit mode. Returns the id that was being edited.
    pub fn stop_editing_text(&mut self) -> Option<ElementId> {
        let editing = self.scene.editing_text_id()?;
        self.scene.set_editing_text(None);
        Some(editing)
    }

    // --- Ordering ---

    /// Move the selection to the top of the stack, keeping its relative order.
    pub fn bring_to_front(&mut self) -> bool {
        self.reorder(false)
    }

    /// Move the selection to the bottom of the stack, keeping its relative order.
    pub fn send_to_back(&mut self) -> bool {
        self.reorder(true)
    }

    fn reorder(&mut self, to_back: bool) -> bool {
        let ids = self.scene.selection().to_vec();
        if ids.is_empty() {
            return false;
        }
        self.scene.mutate_elements(
            move |tree| {
                let (picked, rest): (Vec<_>, Vec<_>) = tree.into_iter().partition(|e| ids.contains(&e.id));
                if to_back { picked.into_iter().chain(rest).collect() } else { rest.into_iter().chain(picked).collect() }
            },
            MutateOptions::default(),
        );
        true
    }

    // --- Export and persistence ---

    /// Encode the artboard region as an image `data:` URI.
    pub fn export_as_image(&self, options: &ExportOptions) -> Result<String, ExportError> {
        export_artboard(self.scene.elements(), self.scene.artboard(), options)
    }

    /// Capture the persisted part of the session.
    #[must_use]
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            elements: self.scene.snapshot(),
            selected_ids: self.scene.selection().to_vec(),
            pan: self.viewport.offset(),
            zoom: self.zoom,
            interaction_mode: self.interaction_mode,
            artboard: self.scene.artboard().clone(),
        }
    }

    /// Replace the session from a snapshot. History starts empty.
    pub fn restore(&mut self, snapshot: DocumentSnapshot) {
        self.input = InputState::Idle;
        self.ui = UiState::default();
        self.scene.set_editing_text(None);
        self.scene.set_artboard(snapshot.artboard);
        self.scene.load(snapshot.elements);
        self.scene.set_selection(&snapshot.selected_ids, false);
        self.zoom = clamp_zoom(snapshot.zoom);
        self.viewport.set_offset(snapshot.pan);
        self.interaction_mode = snapshot.interaction_mode;
        info!(elements = self.scene.elements().len(), "engine: document restored");
    }
}

/// Swap in `updated` for the top-level elements with matching ids.
pub(crate) fn replace_by_id(tree: ElementTree, updated: &[CanvasElement]) -> ElementTree {
    tree.into_iter().map(|e| updated.iter().find(|u| u.id == e.id).cloned().unwrap_or(e)).collect()
}

/// Apply `patch` to `el`, carrying group edits down to descendants.
fn patched_with_propagation(el: &CanvasElement, patch: &ElementPatch) -> Option<CanvasElement> {
    let mut updated = apply_patch(el, patch)?;
    if el.is_group() {
        let sx = if el.width > 0.0 { updated.width / el.width } else { 1.0 };
        let sy = if el.height > 0.0 { updated.height / el.height } else { 1.0 };
        if (sx - 1.0).abs() > f64::EPSILON || (sy - 1.0).abs() > f64::EPSILON {
            let (w, h) = (updated.width, updated.height);
            // Scale the stored children, then keep the patched size.
            let unscaled = CanvasElement { width: el.width, height: el.height, ..updated };
            let mut scaled = propagate(&unscaled, Propagation::Scale { sx, sy });
            scaled.width = w;
            scaled.height = h;
            updated = scaled;
        }
        updated = apply_to_descendants(&updated, patch.rotation, patch.opacity.map(|o| o.clamp(0.0, 1.0)));
    }
    Some(updated)
}
