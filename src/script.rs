//! Scripted input replay.
//!
//! A script is a JSON array of events, each tagged with `"type"`. Pointer,
//! key and wheel events go through the same handlers a host would call;
//! the remaining events map onto engine operations directly.

use std::path::{Path, PathBuf};

use canvas::asset::AssetError;
use canvas::camera::Size;
use canvas::doc::{ElementId, ElementPatch, ShapeVariant};
use canvas::engine::{Action, ArtboardPatch, EngineCore, NumericField};
use canvas::geom::Point;
use canvas::input::{Button, InteractionMode, Key, Modifiers, WheelDelta};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("malformed script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("cannot upload {path}: {source}")]
    Upload { path: PathBuf, source: AssetError },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScriptEvent {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerUp {
        x: f64,
        y: f64,
        #[serde(default)]
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerCancel {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Key {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Wheel {
        x: f64,
        y: f64,
        #[serde(default)]
        dx: f64,
        #[serde(default)]
        dy: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    AddShape {
        shape: ShapeVariant,
    },
    AddText {
        text: String,
    },
    AddImage {
        src: String,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
    },
    /// Upload an image file; relative paths resolve against the script's directory.
    UploadImage {
        path: PathBuf,
        mime: String,
    },
    Update {
        id: ElementId,
        patch: ElementPatch,
    },
    SetField {
        id: ElementId,
        field: NumericField,
        value: String,
    },
    Select {
        ids: Vec<ElementId>,
        #[serde(default)]
        additive: bool,
    },
    ClearSelection,
    Delete,
    Copy,
    Paste,
    Undo,
    Redo,
    Group,
    Ungroup,
    BringToFront,
    SendToBack,
    Zoom {
        zoom: f64,
    },
    PanBy {
        dx: f64,
        dy: f64,
    },
    Mode {
        mode: InteractionMode,
    },
    Viewport {
        width: f64,
        height: f64,
    },
    Fit,
    Artboard {
        patch: ArtboardPatch,
        #[serde(default)]
        fit: bool,
    },
    EditText {
        id: ElementId,
    },
    StopEditing,
}

/// Totals gathered over a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub events: usize,
    pub commits: usize,
}

pub fn parse_script(json: &str) -> Result<Vec<ScriptEvent>, ScriptError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptEvent>, ScriptError> {
    let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Read { path: path.to_owned(), source })?;
    parse_script(&json)
}

/// Apply every event in order. `base_dir` resolves relative upload paths.
pub fn replay(engine: &mut EngineCore, events: &[ScriptEvent], base_dir: &Path) -> Result<ReplayReport, ScriptError> {
    let mut report = ReplayReport::default();
    for (index, event) in events.iter().enumerate() {
        let actions = apply(engine, event, base_dir)?;
        report.events += 1;
        report.commits += actions.iter().filter(|a| matches!(a, Action::HistoryCommitted)).count();
        debug!(index, actions = actions.len(), "script event applied");
    }
    info!(events = report.events, commits = report.commits, "script replayed");
    Ok(report)
}

/// Apply a single event and return what the host would have been told.
pub fn apply(engine: &mut EngineCore, event: &ScriptEvent, base_dir: &Path) -> Result<Vec<Action>, ScriptError> {
    let actions = match event {
        ScriptEvent::PointerDown { x, y, button, modifiers } => {
            engine.on_pointer_down(Point::new(*x, *y), *button, *modifiers)
        }
        ScriptEvent::PointerMove { x, y, modifiers } => engine.on_pointer_move(Point::new(*x, *y), *modifiers),
        ScriptEvent::PointerUp { x, y, button, modifiers } => {
            engine.on_pointer_up(Point::new(*x, *y), *button, *modifiers)
        }
        ScriptEvent::PointerCancel { x, y, modifiers } => engine.on_pointer_cancel(Point::new(*x, *y), *modifiers),
        ScriptEvent::Key { key, modifiers } => engine.on_key_down(Key::new(key), *modifiers),
        ScriptEvent::Wheel { x, y, dx, dy, modifiers } => {
            engine.on_wheel(Point::new(*x, *y), WheelDelta { dx: *dx, dy: *dy }, *modifiers)
        }
        ScriptEvent::AddShape { shape } => {
            engine.add_shape(*shape);
            committed(engine)
        }
        ScriptEvent::AddText { text } => {
            engine.add_text(text);
            committed(engine)
        }
        ScriptEvent::AddImage { src, width, height } => {
            engine.add_image(src, width.zip(*height));
            committed(engine)
        }
        ScriptEvent::UploadImage { path, mime } => {
            let path = base_dir.join(path);
            let bytes = std::fs::read(&path).map_err(|source| ScriptError::Read { path: path.clone(), source })?;
            engine.add_image_upload(mime, &bytes).map_err(|source| ScriptError::Upload { path, source })?;
            committed(engine)
        }
        ScriptEvent::Update { id, patch } => {
            let updated = engine.update_element(id, patch);
            changed(engine, updated)
        }
        ScriptEvent::SetField { id, field, value } => {
            let before = engine.element(id).cloned();
            engine.set_numeric_field(id, *field, value);
            let applied = engine.element(id) != before.as_ref();
            changed(engine, applied)
        }
        ScriptEvent::Select { ids, additive } => {
            engine.set_selection(ids, *additive);
            selection(engine)
        }
        ScriptEvent::ClearSelection => {
            engine.clear_selection();
            selection(engine)
        }
        ScriptEvent::Delete => {
            let deleted = engine.delete_selected();
            changed(engine, deleted)
        }
        ScriptEvent::Copy => {
            engine.copy();
            Vec::new()
        }
        ScriptEvent::Paste => {
            let pasted = !engine.paste().is_empty();
            changed(engine, pasted)
        }
        ScriptEvent::Undo => {
            let undone = engine.undo();
            changed(engine, undone)
        }
        ScriptEvent::Redo => {
            let redone = engine.redo();
            changed(engine, redone)
        }
        ScriptEvent::Group => {
            let grouped = engine.group_elements().is_some();
            changed(engine, grouped)
        }
        ScriptEvent::Ungroup => {
            let ungrouped = !engine.ungroup_elements().is_empty();
            changed(engine, ungrouped)
        }
        ScriptEvent::BringToFront => {
            let moved = engine.bring_to_front();
            changed(engine, moved)
        }
        ScriptEvent::SendToBack => {
            let moved = engine.send_to_back();
            changed(engine, moved)
        }
        ScriptEvent::Zoom { zoom } => {
            engine.set_zoom(*zoom);
            vec![Action::RenderNeeded]
        }
        ScriptEvent::PanBy { dx, dy } => {
            engine.pan_by(*dx, *dy);
            vec![Action::RenderNeeded]
        }
        ScriptEvent::Mode { mode } => {
            engine.set_interaction_mode(*mode);
            Vec::new()
        }
        ScriptEvent::Viewport { width, height } => {
            engine.set_viewport(Size::new(*width, *height));
            vec![Action::RenderNeeded]
        }
        ScriptEvent::Fit => {
            engine.fit_artboard();
            vec![Action::RenderNeeded]
        }
        ScriptEvent::Artboard { patch, fit } => {
            if *fit {
                engine.update_artboard_with_fit(patch);
            } else {
                engine.update_artboard(patch);
            }
            vec![Action::RenderNeeded]
        }
        ScriptEvent::EditText { id } => {
            if engine.start_editing_text(id) {
                vec![Action::EditTextStarted(*id), Action::RenderNeeded]
            } else {
                Vec::new()
            }
        }
        ScriptEvent::StopEditing => match engine.stop_editing_text() {
            Some(id) => vec![Action::EditTextEnded(id), Action::RenderNeeded],
            None => Vec::new(),
        },
    };
    Ok(actions)
}

fn committed(engine: &EngineCore) -> Vec<Action> {
    vec![Action::HistoryCommitted, Action::SelectionChanged(engine.selection().to_vec()), Action::RenderNeeded]
}

fn changed(engine: &EngineCore, changed: bool) -> Vec<Action> {
    if changed { committed(engine) } else { Vec::new() }
}

fn selection(engine: &EngineCore) -> Vec<Action> {
    vec![Action::SelectionChanged(engine.selection().to_vec()), Action::RenderNeeded]
}

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;
