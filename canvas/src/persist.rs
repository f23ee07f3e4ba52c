//! Document persistence format.
//!
//! DESIGN
//! ======
//! A document round-trips as one JSON object holding the element tree, the
//! selection, the view (scroll offset, zoom, interaction mode) and the
//! artboard. Undo/redo stacks are deliberately not persisted: a reloaded
//! document starts with empty history.

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;

use serde::{Deserialize, Serialize};

use crate::doc::{Artboard, ElementId, ElementTree};
use crate::geom::Point;
use crate::input::InteractionMode;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_zoom() -> f64 {
    1.0
}

/// Everything a host needs to restore an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub elements: ElementTree,
    #[serde(default)]
    pub selected_ids: Vec<ElementId>,
    /// Viewport scroll offset in screen pixels.
    #[serde(default)]
    pub pan: Point,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub interaction_mode: InteractionMode,
    #[serde(default)]
    pub artboard: Artboard,
}

impl Default for DocumentSnapshot {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            selected_ids: Vec::new(),
            pan: Point::default(),
            zoom: default_zoom(),
            interaction_mode: InteractionMode::default(),
            artboard: Artboard::default(),
        }
    }
}

impl DocumentSnapshot {
    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(json)?)
    }
}
