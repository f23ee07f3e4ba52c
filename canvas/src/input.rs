//! Input model: interaction modes, modifier keys, mouse buttons, and the
//! gesture state machine.
//!
//! This module defines the types consumed by the input engine. `InteractionMode`
//! and `Modifiers` capture the user's intent at the time of a pointer event.
//! `InputState` is the single active gesture tracked between pointer-down and
//! pointer-up, carrying all context needed to compute deltas from the
//! gesture's start and to commit exactly one history entry on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::doc::{CanvasElement, ElementId, ElementTree};
use crate::geom::{Point, Rect, ResizeAnchor};
use crate::snap::Guide;

/// What a pointer-down on empty canvas does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// Click selects, drag on empty canvas draws a marquee (default).
    #[default]
    Select,
    /// Drag on empty canvas scrolls the viewport.
    Pan,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }

    /// Whether a click should add to the selection instead of replacing it.
    #[must_use]
    pub fn additive(self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    #[default]
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the host (e.g. `"Delete"`, `"g"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    /// Case-insensitive comparison for single letters, exact otherwise.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Transient UI state visible to the renderer. Never part of history.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    /// Snap guides for the gesture in progress, in world space.
    pub guides: Vec<Guide>,
    /// Normalized marquee rectangle in world space.
    pub marquee: Option<Rect>,
    /// CSS cursor hint.
    pub cursor: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self { guides: Vec::new(), marquee: None, cursor: "default".to_owned() }
    }
}

/// Internal state for the input state machine.
///
/// Each active variant carries gesture context needed to compute deltas and
/// emit the final commit on pointer-up. Only one gesture exists at a time.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is moving the selection.
    Dragging {
        /// Ids of the top-level elements being moved.
        ids: Vec<ElementId>,
        /// World-space pointer position at pointer-down.
        start_pointer: Point,
        /// Pre-drag state of every moving element.
        snapshots: Vec<CanvasElement>,
        /// Full tree at pointer-down; committed as the undo entry.
        history_snapshot: ElementTree,
        /// Set once the corrected delta exceeds the move epsilon.
        moved: bool,
        /// Text element to enter edit mode for if released without moving.
        edit_on_release: Option<ElementId>,
    },
    /// The user is resizing the selection by one of its eight handles.
    Resizing {
        ids: Vec<ElementId>,
        anchor: ResizeAnchor,
        start_pointer: Point,
        start_snapshots: Vec<CanvasElement>,
        /// Unrotated union box of the selection at pointer-down.
        start_bounds: Rect,
        history_snapshot: ElementTree,
        moved: bool,
    },
    /// The user is rotating a single element by the rotate handle.
    Rotating {
        id: ElementId,
        /// Rotation in degrees at the start of the gesture.
        start_rotation: f64,
        /// World-space pivot.
        center: Point,
        /// Pointer angle about `center` at pointer-down, in degrees.
        start_angle: f64,
        history_snapshot: ElementTree,
    },
    /// The user is dragging a selection rectangle.
    MarqueeSelecting {
        /// World-space corner where the drag started.
        start: Point,
        /// World-space far corner at the latest event.
        last: Point,
        /// Additive modifier was held at pointer-down.
        additive: bool,
    },
    /// The user is scrolling the viewport by dragging.
    Panning {
        /// Screen-space pointer position at pointer-down.
        start_screen: Point,
        /// Viewport offset at pointer-down.
        start_offset: Point,
    },
}

impl InputState {
    /// Short label for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dragging { .. } => "dragging",
            Self::Resizing { .. } => "resizing",
            Self::Rotating { .. } => "rotating",
            Self::MarqueeSelecting { .. } => "marquee",
            Self::Panning { .. } => "panning",
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
