//! Raster export of the artboard region.
//!
//! DESIGN
//! ======
//! Export reuses the render traversal: a [`RasterSurface`] implements
//! [`RenderSurface`] over an RGBA pixel buffer sized to the artboard at the
//! requested scale. Each primitive is scan-converted by inverse-mapping pixel
//! centers into the primitive's local frame, so rotation and nested group
//! transforms come for free.
//!
//! Only elements whose rotated bounds intersect the artboard are drawn.
//! Shapes, text background boxes and images (with grayscale, brightness and
//! blur filters) are rasterized; glyphs are left to hosts with a font
//! backend. An image that cannot be decoded is skipped with a warning.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::asset::{decode_data_uri, encode_data_uri};
use crate::color::{Rgba, parse_color, with_opacity};
use crate::doc::{Artboard, CanvasElement, ImageFilters};
use crate::geom::{Affine, Point, Rect, element_aabb};
use crate::render::{Primitive, RenderSurface, draw_artboard, draw_elements};

/// Largest allowed export edge in pixels.
const MAX_EXPORT_DIMENSION: f64 = 16384.0;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export region is empty ({width}x{height} px)")]
    EmptyRegion { width: f64, height: f64 },
    #[error("invalid export scale: {0}")]
    InvalidScale(f64),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

fn default_quality() -> f64 {
    0.92
}

fn default_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    #[serde(default)]
    pub format: ExportFormat,
    /// JPEG quality in `0..=1`; ignored for PNG.
    #[serde(default = "default_quality")]
    pub quality: f64,
    /// Output pixels per world unit.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { format: ExportFormat::Png, quality: default_quality(), scale: default_scale() }
    }
}

/// Render the artboard-intersecting subset of `elements` and return a `data:` URI.
pub fn export_artboard(
    elements: &[CanvasElement],
    artboard: &Artboard,
    options: &ExportOptions,
) -> Result<String, ExportError> {
    let bytes = render_artboard(elements, artboard, options)?;
    Ok(encode_data_uri(options.format.mime(), &bytes))
}

/// Render and encode, returning the raw image bytes.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn render_artboard(
    elements: &[CanvasElement],
    artboard: &Artboard,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let scale = options.scale;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ExportError::InvalidScale(scale));
    }
    let width = (artboard.width * scale).round();
    let height = (artboard.height * scale).round();
    if width < 1.0 || height < 1.0 || width > MAX_EXPORT_DIMENSION || height > MAX_EXPORT_DIMENSION {
        return Err(ExportError::EmptyRegion { width, height });
    }

    let region = artboard.rect();
    let visible: Vec<&CanvasElement> = elements.iter().filter(|el| element_aabb(el).intersects(&region)).collect();

    let mut surface = RasterSurface::new(width as u32, height as u32);
    let base = Affine::scale(scale, scale).compose(Affine::translate(-artboard.x, -artboard.y));
    draw_artboard(&mut surface, artboard, base);
    draw_elements(&mut surface, visible.iter().copied(), base);

    let bytes = encode(surface.into_image(), options)?;
    info!(
        width = width as u32,
        height = height as u32,
        elements = visible.len(),
        format = options.format.mime(),
        "export: artboard rendered"
    );
    Ok(bytes)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode(image: RgbaImage, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    match options.format {
        ExportFormat::Png => {
            DynamicImage::ImageRgba8(image).write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
        }
        ExportFormat::Jpeg => {
            let flattened = flatten_on_white(&image);
            let quality = (options.quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
            encoder.encode_image(&flattened)?;
        }
    }
    Ok(out)
}

/// JPEG has no alpha: composite onto white.
fn flatten_on_white(image: &RgbaImage) -> image::RgbImage {
    let mut out = image::RgbImage::new(image.width(), image.height());
    for (x, y, px) in image.enumerate_pixels() {
        let a = f64::from(px[3]) / 255.0;
        let channel = |c: u8| blend_channel(f64::from(c), 255.0, a);
        out.put_pixel(x, y, image::Rgb([channel(px[0]), channel(px[1]), channel(px[2])]));
    }
    out
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_channel(src: f64, dst: f64, src_alpha: f64) -> u8 {
    (src * src_alpha + dst * (1.0 - src_alpha)).round().clamp(0.0, 255.0) as u8
}

// =============================================================
// Raster surface
// =============================================================

/// Software [`RenderSurface`] over an RGBA buffer.
pub struct RasterSurface {
    canvas: RgbaImage,
    /// Decoded image sources; `None` marks a source that failed to decode.
    decoded: HashMap<String, Option<RgbaImage>>,
}

impl RasterSurface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { canvas: RgbaImage::new(width, height), decoded: HashMap::new() }
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    fn load(&mut self, src: &str) {
        if self.decoded.contains_key(src) {
            return;
        }
        let bitmap = match decode_data_uri(src) {
            Ok((_, bytes)) => match image::load_from_memory(&bytes) {
                Ok(img) => Some(img.to_rgba8()),
                Err(e) => {
                    warn!(error = %e, "export: image decode failed; skipping");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "export: unreadable image source; skipping");
                None
            }
        };
        self.decoded.insert(src.to_owned(), bitmap);
    }
}

impl RenderSurface for RasterSurface {
    fn draw(&mut self, primitive: &Primitive<'_>, transform: &Affine, opacity: f64) {
        match primitive {
            Primitive::Rect { width, height, fill, stroke, stroke_width, corner_radius } => {
                let (w, h) = (*width, *height);
                let r = corner_radius.max(0.0).min(w / 2.0).min(h / 2.0);
                let fill = parse_color(fill);
                let stroke = parse_color(stroke);
                let sw = stroke_width.max(0.0);
                fill_local(&mut self.canvas, transform, w, h, opacity, |p| {
                    if !in_rounded_rect(p, w, h, r) {
                        return None;
                    }
                    let inner = Point::new(p.x - sw, p.y - sw);
                    if sw > 0.0 && !in_rounded_rect(inner, w - 2.0 * sw, h - 2.0 * sw, (r - sw).max(0.0)) {
                        return stroke;
                    }
                    fill
                });
            }
            Primitive::Ellipse { width, height, fill, stroke, stroke_width } => {
                let (w, h) = (*width, *height);
                let fill = parse_color(fill);
                let stroke = parse_color(stroke);
                let sw = stroke_width.max(0.0);
                fill_local(&mut self.canvas, transform, w, h, opacity, |p| {
                    let center = Point::new(w / 2.0, h / 2.0);
                    if !in_ellipse(p, center, w / 2.0, h / 2.0) {
                        return None;
                    }
                    if sw > 0.0 && !in_ellipse(p, center, w / 2.0 - sw, h / 2.0 - sw) {
                        return stroke;
                    }
                    fill
                });
            }
            Primitive::Triangle { width, height, fill, stroke, stroke_width } => {
                let (w, h) = (*width, *height);
                let verts = [Point::new(w / 2.0, 0.0), Point::new(w, h), Point::new(0.0, h)];
                let fill = parse_color(fill);
                let stroke = parse_color(stroke);
                let sw = stroke_width.max(0.0);
                fill_local(&mut self.canvas, transform, w, h, opacity, |p| {
                    if !in_triangle(p, verts) {
                        return None;
                    }
                    if sw > 0.0 && edge_distance(p, verts) < sw {
                        return stroke;
                    }
                    fill
                });
            }
            Primitive::Text { width, height, style, .. } => {
                let background = parse_color(&style.background);
                fill_local(&mut self.canvas, transform, *width, *height, opacity, |_| background);
            }
            Primitive::Image { width, height, src, filters, border_radius } => {
                self.load(src);
                let Some(Some(bitmap)) = self.decoded.get(*src) else {
                    return;
                };
                let bitmap = apply_filters(bitmap, *filters);
                let (w, h) = (*width, *height);
                let r = border_radius.max(0.0).min(w / 2.0).min(h / 2.0);
                fill_local(&mut self.canvas, transform, w, h, opacity, |p| {
                    if !in_rounded_rect(p, w, h, r) {
                        return None;
                    }
                    sample(&bitmap, p, w, h)
                });
            }
            Primitive::Line { length, thickness, color } => {
                let color = parse_color(color);
                let t = transform.compose(Affine::translate(0.0, -thickness / 2.0));
                fill_local(&mut self.canvas, &t, *length, *thickness, opacity, |_| color);
            }
            Primitive::Outline { width, height, color, .. } => {
                let (w, h) = (*width, *height);
                let color = parse_color(color);
                fill_local(&mut self.canvas, transform, w, h, opacity, |p| {
                    let near_edge = p.x < 1.0 || p.y < 1.0 || p.x > w - 1.0 || p.y > h - 1.0;
                    if near_edge { color } else { None }
                });
            }
        }
    }
}

/// Apply the element's filter chain; unfiltered images are borrowed as-is.
#[allow(clippy::cast_possible_truncation)]
fn apply_filters(bitmap: &RgbaImage, filters: ImageFilters) -> Cow<'_, RgbaImage> {
    let active = filters.grayscale || filters.brightness != 0.0 || filters.blur > 0.0;
    if !active {
        return Cow::Borrowed(bitmap);
    }
    let mut img = DynamicImage::ImageRgba8(bitmap.clone());
    if filters.grayscale {
        img = img.grayscale();
    }
    if filters.brightness != 0.0 {
        img = img.brighten((filters.brightness.clamp(-1.0, 1.0) * 255.0).round() as i32);
    }
    if filters.blur > 0.0 {
        img = img.blur(filters.blur as f32);
    }
    Cow::Owned(img.to_rgba8())
}

/// Nearest-neighbor sample of `bitmap` stretched over a `w`×`h` local box.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn sample(bitmap: &RgbaImage, p: Point, w: f64, h: f64) -> Option<Rgba> {
    if w <= 0.0 || h <= 0.0 || bitmap.width() == 0 || bitmap.height() == 0 {
        return None;
    }
    let u = (p.x / w * f64::from(bitmap.width())).floor().clamp(0.0, f64::from(bitmap.width() - 1));
    let v = (p.y / h * f64::from(bitmap.height())).floor().clamp(0.0, f64::from(bitmap.height() - 1));
    Some(bitmap.get_pixel(u as u32, v as u32).0)
}

/// Scan-convert a local `0..w` × `0..h` box mapped by `transform`. `shade`
/// returns the straight-alpha color for a local point, or `None` to skip it.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn fill_local<F>(canvas: &mut RgbaImage, transform: &Affine, w: f64, h: f64, opacity: f64, mut shade: F)
where
    F: FnMut(Point) -> Option<Rgba>,
{
    if w <= 0.0 || h <= 0.0 || opacity <= 0.0 {
        return;
    }
    let Some(inverse) = transform.invert() else {
        return;
    };
    let corners = [Point::new(0.0, 0.0), Point::new(w, 0.0), Point::new(w, h), Point::new(0.0, h)];
    let Some(bounds) = Rect::covering(corners.iter().map(|c| transform.apply(*c))) else {
        return;
    };
    let x0 = bounds.x.floor().max(0.0) as u32;
    let y0 = bounds.y.floor().max(0.0) as u32;
    let x1 = (bounds.right().ceil().max(0.0) as u32).min(canvas.width());
    let y1 = (bounds.bottom().ceil().max(0.0) as u32).min(canvas.height());

    for py in y0..y1 {
        for px in x0..x1 {
            let local = inverse.apply(Point::new(f64::from(px) + 0.5, f64::from(py) + 0.5));
            if local.x < 0.0 || local.y < 0.0 || local.x > w || local.y > h {
                continue;
            }
            if let Some(color) = shade(local) {
                blend(canvas, px, py, with_opacity(color, opacity));
            }
        }
    }
}

/// Source-over compositing with straight alpha.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend(canvas: &mut RgbaImage, x: u32, y: u32, src: Rgba) {
    if src[3] == 0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x, y);
    let sa = f64::from(src[3]) / 255.0;
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for i in 0..3 {
        let c = (f64::from(src[i]) * sa + f64::from(dst[i]) * da * (1.0 - sa)) / out_a;
        dst[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn in_rounded_rect(p: Point, w: f64, h: f64, r: f64) -> bool {
    if w < 0.0 || h < 0.0 || p.x < 0.0 || p.y < 0.0 || p.x > w || p.y > h {
        return false;
    }
    if r <= 0.0 {
        return true;
    }
    let cx = p.x.clamp(r, (w - r).max(r));
    let cy = p.y.clamp(r, (h - r).max(r));
    p.distance(Point::new(cx, cy)) <= r
}

fn in_ellipse(p: Point, center: Point, rx: f64, ry: f64) -> bool {
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let dx = (p.x - center.x) / rx;
    let dy = (p.y - center.y) / ry;
    dx * dx + dy * dy <= 1.0
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn in_triangle(p: Point, [a, b, c]: [Point; 3]) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Distance from `p` to the nearest triangle edge line.
fn edge_distance(p: Point, [a, b, c]: [Point; 3]) -> f64 {
    [(a, b), (b, c), (c, a)]
        .iter()
        .map(|(s, e)| {
            let len = s.distance(*e);
            if len == 0.0 { p.distance(*s) } else { cross(*s, *e, p).abs() / len }
        })
        .fold(f64::INFINITY, f64::min)
}
