//! Shared numeric constants for the canvas crate.

// ── Virtual canvas ──────────────────────────────────────────────

/// Width and height of the scrollable virtual canvas, in world units.
pub const VIRTUAL_CANVAS_SIZE: f64 = 4000.0;

/// Smallest allowed artboard dimension.
pub const ARTBOARD_MIN_SIZE: f64 = 100.0;

/// Largest allowed artboard dimension.
pub const ARTBOARD_MAX_SIZE: f64 = 4096.0;

/// Default artboard edge length for a new document.
pub const ARTBOARD_DEFAULT_SIZE: f64 = 1080.0;

/// Fraction of the viewport the artboard may occupy after "fit and center".
pub const ARTBOARD_FIT_MARGIN: f64 = 0.8;

// ── Zoom ────────────────────────────────────────────────────────

pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 3.0;

/// Multiplicative zoom change per wheel pixel when zooming with Ctrl/Meta held.
pub const WHEEL_ZOOM_SENSITIVITY: f64 = 0.002;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Distance from the bounding box edge to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 24.0;

// ── Element defaults ────────────────────────────────────────────

/// Edge length of a freshly added shape.
pub const DEFAULT_SHAPE_SIZE: f64 = 200.0;

/// Box size of a freshly added text element.
pub const DEFAULT_TEXT_WIDTH: f64 = 300.0;
pub const DEFAULT_TEXT_HEIGHT: f64 = 60.0;

/// Longest edge of an image added without explicit dimensions.
pub const DEFAULT_IMAGE_SIZE: f64 = 300.0;

/// Nudge distance for arrow keys, and with Shift held.
pub const NUDGE_STEP: f64 = 1.0;
pub const NUDGE_STEP_LARGE: f64 = 10.0;

/// Tolerance used when comparing snap guides for duplicates.
pub const GUIDE_EPSILON: f64 = 1e-6;
