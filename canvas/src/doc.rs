//! Document model: canvas elements, the artboard, and the scene store.
//!
//! This module defines the element tree (`CanvasElement`, `ElementKind`), a
//! sparse-update type for incremental edits (`ElementPatch`), the export
//! region (`Artboard`), and the runtime store that owns all live state and
//! its undo history (`Scene`).
//!
//! All element edits funnel through [`Scene::mutate_elements`]. The updater
//! receives an independent copy of the current tree and returns the new one,
//! so a failed or abandoned edit never leaves the tree partially updated.
//! History entries are full-tree copies; selection and text-edit mode are
//! never part of history.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{ARTBOARD_DEFAULT_SIZE, ARTBOARD_MAX_SIZE, ARTBOARD_MIN_SIZE, VIRTUAL_CANVAS_SIZE};
use crate::geom::{Point, Rect};

/// Unique identifier for a canvas element.
pub type ElementId = Uuid;

/// A full copy of the element tree, as stored in history.
pub type ElementTree = Vec<CanvasElement>;

fn default_opacity() -> f64 {
    1.0
}

/// One visual object on the canvas.
///
/// `x`/`y` are the top-left corner in the coordinate space of the container:
/// world space for top-level elements, group-local space for group children.
/// `rotation` is in degrees, clockwise, about the element's own center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasElement {
    pub id: ElementId,
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(flatten)]
    pub kind: ElementKind,
}

/// Per-type payload of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Shape(ShapeProps),
    Text(TextProps),
    Image(ImageProps),
    Group(GroupProps),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeVariant {
    Rectangle,
    Circle,
    Triangle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProps {
    pub shape: ShapeVariant,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    /// Only meaningful for rectangles.
    #[serde(default)]
    pub corner_radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextShadow {
    pub color: String,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStroke {
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGlow {
    pub color: String,
    pub blur: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub font_weight: String,
    pub color: String,
    pub background: String,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub vertical_align: VerticalAlign,
    pub line_height: f64,
    #[serde(default)]
    pub letter_spacing: f64,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub text_transform: TextTransform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_shadow: Option<TextShadow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_stroke: Option<TextStroke>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_glow: Option<TextGlow>,
}

impl TextProps {
    /// The text as it should be drawn, with `text_transform` applied.
    #[must_use]
    pub fn display_text(&self) -> String {
        match self.text_transform {
            TextTransform::None => self.text.clone(),
            TextTransform::Uppercase => self.text.to_uppercase(),
            TextTransform::Lowercase => self.text.to_lowercase(),
            TextTransform::Capitalize => self
                .text
                .split(' ')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFilters {
    #[serde(default)]
    pub grayscale: bool,
    #[serde(default)]
    pub blur: f64,
    #[serde(default)]
    pub brightness: f64,
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self { grayscale: false, blur: 0.0, brightness: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    /// URI or `data:` URI of the image.
    pub src: String,
    #[serde(default)]
    pub filters: ImageFilters,
    #[serde(default)]
    pub border_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupProps {
    /// Owned children in group-local coordinates, back to front.
    pub children: Vec<CanvasElement>,
}

impl CanvasElement {
    /// A new shape with default styling at the origin.
    #[must_use]
    pub fn shape(variant: ShapeVariant, width: f64, height: f64) -> Self {
        let name = match variant {
            ShapeVariant::Rectangle => "Rectangle",
            ShapeVariant::Circle => "Circle",
            ShapeVariant::Triangle => "Triangle",
        };
        Self::base(
            name,
            width,
            height,
            ElementKind::Shape(ShapeProps {
                shape: variant,
                fill: "#3B82F6".to_owned(),
                stroke: "#1E3A8A".to_owned(),
                stroke_width: 0.0,
                corner_radius: 0.0,
            }),
        )
    }

    /// A new text element with default typography at the origin.
    #[must_use]
    pub fn text(content: &str, width: f64, height: f64) -> Self {
        Self::base(
            "Text",
            width,
            height,
            ElementKind::Text(TextProps {
                text: content.to_owned(),
                font_size: 32.0,
                font_family: "Inter".to_owned(),
                font_weight: "400".to_owned(),
                color: "#111827".to_owned(),
                background: "transparent".to_owned(),
                align: TextAlign::Center,
                vertical_align: VerticalAlign::Middle,
                line_height: 1.2,
                letter_spacing: 0.0,
                italic: false,
                underline: false,
                text_transform: TextTransform::None,
                text_shadow: None,
                text_stroke: None,
                text_glow: None,
            }),
        )
    }

    /// A new image element at the origin.
    #[must_use]
    pub fn image(src: &str, width: f64, height: f64) -> Self {
        Self::base(
            "Image",
            width,
            height,
            ElementKind::Image(ImageProps { src: src.to_owned(), filters: ImageFilters::default(), border_radius: 0.0 }),
        )
    }

    /// A group wrapping `children`, which must already be in group-local coordinates.
    #[must_use]
    pub fn group(bounds: Rect, children: Vec<CanvasElement>) -> Self {
        let mut group = Self::base("Group", bounds.width, bounds.height, ElementKind::Group(GroupProps { children }));
        group.x = bounds.x;
        group.y = bounds.y;
        group
    }

    fn base(name: &str, width: f64, height: f64, kind: ElementKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            x: 0.0,
            y: 0.0,
            width,
            height,
            rotation: 0.0,
            opacity: 1.0,
            kind,
        }
    }

    /// The stored, unrotated rectangle in container space.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Center of the element in container space. Invariant under its own rotation.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, ElementKind::Group(_))
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_))
    }

    #[must_use]
    pub fn is_triangle(&self) -> bool {
        matches!(&self.kind, ElementKind::Shape(s) if s.shape == ShapeVariant::Triangle)
    }

    /// Group children, or an empty slice for leaf elements.
    #[must_use]
    pub fn children(&self) -> &[CanvasElement] {
        match &self.kind {
            ElementKind::Group(g) => &g.children,
            ElementKind::Shape(_) | ElementKind::Text(_) | ElementKind::Image(_) => &[],
        }
    }

    /// Find this element or any descendant by id.
    #[must_use]
    pub fn find(&self, id: &ElementId) -> Option<&CanvasElement> {
        if self.id == *id {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find(id))
    }
}

/// Sparse update for an element. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Kind-payload keys to merge (camelCase, as serialized). Null values
    /// delete keys; `type` and `children` are never patched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<serde_json::Value>,
}

impl ElementPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Apply `patch` to a copy of `element`.
///
/// Returns `None` when the patch is rejected: a non-finite number, a `props`
/// value that is not an object, or merged props that no longer describe a
/// valid payload for the element's type.
#[must_use]
pub fn apply_patch(element: &CanvasElement, patch: &ElementPatch) -> Option<CanvasElement> {
    let numbers = [patch.x, patch.y, patch.width, patch.height, patch.rotation, patch.opacity];
    if numbers.iter().flatten().any(|v| !v.is_finite()) {
        return None;
    }

    let mut out = element.clone();
    if let Some(name) = &patch.name {
        out.name.clone_from(name);
    }
    if let Some(x) = patch.x {
        out.x = x;
    }
    if let Some(y) = patch.y {
        out.y = y;
    }
    if let Some(w) = patch.width {
        out.width = w.max(0.0);
    }
    if let Some(h) = patch.height {
        out.height = h.max(0.0);
    }
    if let Some(r) = patch.rotation {
        out.rotation = r;
    }
    if let Some(o) = patch.opacity {
        out.opacity = o.clamp(0.0, 1.0);
    }
    if let Some(props) = &patch.props {
        out.kind = merge_kind_props(&element.kind, props)?;
    }
    Some(out)
}

fn merge_kind_props(kind: &ElementKind, props: &serde_json::Value) -> Option<ElementKind> {
    let incoming = props.as_object()?;
    let mut current = match serde_json::to_value(kind) {
        Ok(v) => v,
        Err(_) => return None,
    };
    let existing = current.as_object_mut()?;
    for (k, v) in incoming {
        if k == "type" || k == "children" {
            continue;
        }
        if v.is_null() {
            existing.remove(k);
        } else {
            existing.insert(k.clone(), v.clone());
        }
    }
    match serde_json::from_value(current) {
        Ok(kind) => Some(kind),
        Err(_) => None,
    }
}

/// The export/visible region of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artboard {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub background_color: String,
    pub opacity: f64,
    pub visible: bool,
}

impl Default for Artboard {
    fn default() -> Self {
        Self::centered(ARTBOARD_DEFAULT_SIZE, ARTBOARD_DEFAULT_SIZE)
    }
}

impl Artboard {
    /// A white artboard of the given (clamped) size, centered in the virtual canvas.
    #[must_use]
    pub fn centered(width: f64, height: f64) -> Self {
        let mut board = Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            background_color: "#FFFFFF".to_owned(),
            opacity: 1.0,
            visible: true,
        };
        board.resize(width, height);
        board
    }

    /// Clamp a dimension into the allowed artboard range. Non-finite input
    /// yields the minimum.
    #[must_use]
    pub fn clamp_dimension(value: f64) -> f64 {
        if value.is_finite() {
            value.clamp(ARTBOARD_MIN_SIZE, ARTBOARD_MAX_SIZE)
        } else {
            ARTBOARD_MIN_SIZE
        }
    }

    /// Set a new size and re-center in the virtual canvas.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = Self::clamp_dimension(width);
        self.height = Self::clamp_dimension(height);
        self.x = (VIRTUAL_CANVAS_SIZE - self.width) / 2.0;
        self.y = (VIRTUAL_CANVAS_SIZE - self.height) / 2.0;
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[must_use]
    pub fn center(&self) -> Point {
        self.rect().center()
    }
}

/// Options for [`Scene::mutate_elements`].
#[derive(Debug, Clone)]
pub struct MutateOptions {
    /// Push an undo entry for this mutation.
    pub record_history: bool,
    /// Tree to push instead of the pre-mutation tree. Used by gestures to
    /// commit their start-of-gesture state exactly once.
    pub history_snapshot: Option<ElementTree>,
}

impl Default for MutateOptions {
    fn default() -> Self {
        Self { record_history: true, history_snapshot: None }
    }
}

impl MutateOptions {
    /// An intermediate mutation that leaves history untouched.
    #[must_use]
    pub fn transient() -> Self {
        Self { record_history: false, history_snapshot: None }
    }

    /// A committing mutation that records `snapshot` as the undo entry.
    #[must_use]
    pub fn commit(snapshot: ElementTree) -> Self {
        Self { record_history: true, history_snapshot: Some(snapshot) }
    }
}

/// The live document: element tree, selection, history and artboard.
#[derive(Debug, Clone)]
pub struct Scene {
    elements: ElementTree,
    selection: Vec<ElementId>,
    history: Vec<ElementTree>,
    redo: Vec<ElementTree>,
    editing_text_id: Option<ElementId>,
    artboard: Artboard,
    history_limit: Option<usize>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_limit(None)
    }

    /// A scene that keeps at most `history_limit` undo entries. `None` is unbounded.
    #[must_use]
    pub fn with_history_limit(history_limit: Option<usize>) -> Self {
        Self {
            elements: Vec::new(),
            selection: Vec::new(),
            history: Vec::new(),
            redo: Vec::new(),
            editing_text_id: None,
            artboard: Artboard::default(),
            history_limit: history_limit.map(|n| n.max(1)),
        }
    }

    // --- Elements ---

    /// Top-level elements, back to front.
    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    /// A top-level element by id.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find(|e| e.id == *id)
    }

    /// Any element in the tree by id, including group descendants.
    #[must_use]
    pub fn find(&self, id: &ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find_map(|e| e.find(id))
    }

    /// Deep copy of the current tree.
    #[must_use]
    pub fn snapshot(&self) -> ElementTree {
        self.elements.clone()
    }

    /// Replace the tree without touching history. Used when loading a document.
    pub fn load(&mut self, elements: ElementTree) {
        self.elements = elements;
        self.history.clear();
        self.redo.clear();
        self.prune_selection();
    }

    /// The single controlled mutation entry point.
    ///
    /// `updater` receives an independent copy of the current elements and
    /// returns the replacement sequence. When `record_history` is set the
    /// supplied snapshot (or a copy of the pre-mutation tree) is pushed and
    /// the redo stack is cleared.
    pub fn mutate_elements<F>(&mut self, updater: F, options: MutateOptions)
    where
        F: FnOnce(ElementTree) -> ElementTree,
    {
        let before = self.elements.clone();
        let next = updater(before.clone());
        if options.record_history {
            self.push_history(options.history_snapshot.unwrap_or(before));
        }
        self.elements = next;
        self.prune_selection();
    }

    fn push_history(&mut self, entry: ElementTree) {
        self.history.push(entry);
        if let Some(limit) = self.history_limit {
            if self.history.len() > limit {
                let excess = self.history.len() - limit;
                self.history.drain(..excess);
            }
        }
        self.redo.clear();
    }

    /// Restore the latest history entry. Returns `false` on an empty stack.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.elements, previous);
        self.redo.push(current);
        self.clear_selection();
        self.editing_text_id = None;
        true
    }

    /// Re-apply the latest undone tree. Returns `false` on an empty stack.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.elements, next);
        self.history.push(current);
        self.clear_selection();
        self.editing_text_id = None;
        true
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    // --- Selection ---

    /// Selected top-level ids. The first entry is the primary selection.
    #[must_use]
    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    #[must_use]
    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.selection.contains(id)
    }

    /// Selected elements in z-order (back to front).
    #[must_use]
    pub fn selected_elements(&self) -> Vec<&CanvasElement> {
        self.elements.iter().filter(|e| self.selection.contains(&e.id)).collect()
    }

    /// The only selected element, if exactly one is selected.
    #[must_use]
    pub fn sole_selected(&self) -> Option<&CanvasElement> {
        match self.selection.as_slice() {
            [id] => self.get(id),
            _ => None,
        }
    }

    /// Replace the selection, or union into it when `additive`. Unknown ids are dropped.
    pub fn set_selection(&mut self, ids: &[ElementId], additive: bool) {
        if !additive {
            self.selection.clear();
        }
        for id in ids {
            if !self.selection.contains(id) && self.get(id).is_some() {
                self.selection.push(*id);
            }
        }
    }

    /// Remove one id from the selection.
    pub fn deselect(&mut self, id: &ElementId) {
        self.selection.retain(|s| s != id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn prune_selection(&mut self) {
        let elements = &self.elements;
        self.selection.retain(|id| elements.iter().any(|e| e.id == *id));
        if let Some(editing) = self.editing_text_id {
            if !elements.iter().any(|e| e.id == editing && e.is_text()) {
                self.editing_text_id = None;
            }
        }
    }

    // --- Text editing ---

    #[must_use]
    pub fn editing_text_id(&self) -> Option<ElementId> {
        self.editing_text_id
    }

    /// Enter (or, with `None`, leave) text-edit mode. Only top-level text
    /// elements can be edited; returns whether the state changed.
    pub fn set_editing_text(&mut self, id: Option<ElementId>) -> bool {
        let next = id.filter(|id| self.get(id).is_some_and(CanvasElement::is_text));
        if id.is_some() && next.is_none() {
            return false;
        }
        let changed = self.editing_text_id != next;
        self.editing_text_id = next;
        changed
    }

    // --- Artboard ---

    #[must_use]
    pub fn artboard(&self) -> &Artboard {
        &self.artboard
    }

    /// Replace the artboard, clamping and re-centering its size.
    pub fn set_artboard(&mut self, artboard: Artboard) {
        let (w, h) = (artboard.width, artboard.height);
        self.artboard = artboard;
        self.artboard.resize(w, h);
        self.artboard.opacity = self.artboard.opacity.clamp(0.0, 1.0);
    }
}
