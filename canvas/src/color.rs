//! CSS color parsing for the raster surface.
//!
//! Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `transparent`, `none`
//! and the empty string. Anything else is `None`; callers decide whether an
//! unknown color means "skip" or "fallback".

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

/// Straight (non-premultiplied) RGBA.
pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// Parse a CSS color string into RGBA.
#[must_use]
pub fn parse_color(input: &str) -> Option<Rgba> {
    let s = input.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("transparent") || s.eq_ignore_ascii_case("none") {
        return Some(TRANSPARENT);
    }
    let hex = s.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 | 4 => {
            let mut out = [0, 0, 0, 255];
            for (i, c) in hex.chars().enumerate() {
                let v = u8::try_from(c.to_digit(16)?).map_or(None, Some)?;
                out[i] = v * 17;
            }
            Some(out)
        }
        6 | 8 => {
            let mut out = [0, 0, 0, 255];
            for i in 0..hex.len() / 2 {
                out[i] = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_or(None, Some)?;
            }
            Some(out)
        }
        _ => None,
    }
}

/// Multiply the alpha channel by `opacity` (clamped to `[0, 1]`).
#[must_use]
pub fn with_opacity(color: Rgba, opacity: f64) -> Rgba {
    let [r, g, b, a] = color;
    let scaled = (f64::from(a) * opacity.clamp(0.0, 1.0)).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let alpha = scaled as u8;
    [r, g, b, alpha]
}
