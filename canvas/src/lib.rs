//! Scene and interaction engine for a 2D design canvas.
//!
//! This crate owns the full editing lifecycle of an artboard document:
//! translating raw pointer, keyboard and wheel input into scene mutations,
//! maintaining view state for pan/zoom, hit-testing and snapping elements,
//! grouping, undo history, and walking the scene for a render backend. The
//! host is responsible only for wiring input events to the engine, drawing
//! through a [`render::RenderSurface`] and acting on the returned
//! [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Controller API: [`engine::EngineCore`] and host actions |
//! | [`gesture`] | Pointer, keyboard and wheel handlers on the engine |
//! | [`doc`] | Element types, artboard, and the scene store with undo history |
//! | [`geom`] | Points, rectangles, affine transforms, rotated bounds |
//! | [`snap`] | Alignment snapping for drag and resize |
//! | [`group`] | Group/ungroup and change propagation into group children |
//! | [`camera`] | Zoom, viewport scroll offset, coordinate conversions |
//! | [`input`] | Input event types and the gesture state |
//! | [`hit`] | Hit-testing against elements and selection handles |
//! | [`render`] | Scene traversal onto a backend-agnostic surface |
//! | [`export`] | Raster export of the artboard region |
//! | [`asset`] | Image upload validation and `data:` URI handling |
//! | [`persist`] | JSON document snapshots |
//! | [`color`] | CSS-style color parsing |
//! | [`config`] | Editor tuning knobs with environment overrides |
//! | [`consts`] | Shared numeric constants (zoom limits, default sizes, etc.) |

pub mod asset;
pub mod camera;
pub mod color;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod export;
pub mod geom;
pub mod gesture;
pub mod group;
pub mod hit;
pub mod input;
pub mod persist;
pub mod render;
pub mod snap;
