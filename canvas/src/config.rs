//! Editor tuning knobs, with defaults and environment overrides.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_SNAP_THRESHOLD_PX: f64 = 5.0;
pub const DEFAULT_MOVE_EPSILON: f64 = 0.01;
pub const DEFAULT_PASTE_OFFSET: f64 = 20.0;
pub const DEFAULT_ROTATION_SNAP_DEG: f64 = 15.0;
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 2048;

/// MIME types accepted by image upload.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg", "image/gif", "image/webp"];

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Snap distance in screen pixels; divided by zoom before comparing in world units.
    pub snap_threshold_px: f64,
    /// Corrected drag/resize delta below which a gesture counts as a click.
    pub move_epsilon: f64,
    /// Offset applied per successive paste.
    pub paste_offset: f64,
    /// Rotation increment when Shift is held.
    pub rotation_snap_deg: f64,
    /// Cap on retained undo entries. `None` keeps every entry.
    pub history_limit: Option<usize>,
    pub max_image_bytes: usize,
    /// Uploaded images larger than this on either side are downscaled.
    pub max_image_dimension: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold_px: DEFAULT_SNAP_THRESHOLD_PX,
            move_epsilon: DEFAULT_MOVE_EPSILON,
            paste_offset: DEFAULT_PASTE_OFFSET,
            rotation_snap_deg: DEFAULT_ROTATION_SNAP_DEG,
            history_limit: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
        }
    }
}

impl EditorConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// Optional:
    /// - `CANVAS_SNAP_THRESHOLD_PX`
    /// - `CANVAS_MOVE_EPSILON`
    /// - `CANVAS_PASTE_OFFSET`
    /// - `CANVAS_ROTATION_SNAP_DEG`
    /// - `CANVAS_HISTORY_LIMIT` (unset keeps unlimited undo)
    /// - `CANVAS_MAX_IMAGE_BYTES`
    /// - `CANVAS_MAX_IMAGE_DIMENSION`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).map_or(None, Some))
    }

    /// Build config from an arbitrary key lookup. Unparseable or non-positive
    /// values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            snap_threshold_px: parse_f64(&lookup, "CANVAS_SNAP_THRESHOLD_PX", defaults.snap_threshold_px),
            move_epsilon: parse_f64(&lookup, "CANVAS_MOVE_EPSILON", defaults.move_epsilon),
            paste_offset: parse_f64(&lookup, "CANVAS_PASTE_OFFSET", defaults.paste_offset),
            rotation_snap_deg: parse_f64(&lookup, "CANVAS_ROTATION_SNAP_DEG", defaults.rotation_snap_deg),
            history_limit: parse_limit(&lookup, "CANVAS_HISTORY_LIMIT", defaults.history_limit),
            max_image_bytes: parse_usize(&lookup, "CANVAS_MAX_IMAGE_BYTES", defaults.max_image_bytes),
            max_image_dimension: parse_u32(&lookup, "CANVAS_MAX_IMAGE_DIMENSION", defaults.max_image_dimension),
        }
    }
}

fn parse_f64<F>(lookup: &F, key: &str, default: f64) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().parse::<f64>()) {
        Some(Ok(v)) if v.is_finite() && v > 0.0 => v,
        _ => default,
    }
}

fn parse_usize<F>(lookup: &F, key: &str, default: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().parse::<usize>()) {
        Some(Ok(v)) if v > 0 => v,
        _ => default,
    }
}

/// A positive cap, or `default` when unset or malformed.
fn parse_limit<F>(lookup: &F, key: &str, default: Option<usize>) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().parse::<usize>()) {
        Some(Ok(v)) if v > 0 => Some(v),
        _ => default,
    }
}

fn parse_u32<F>(lookup: &F, key: &str, default: u32) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().parse::<u32>()) {
        Some(Ok(v)) if v > 0 => v,
        _ => default,
    }
}
