use super::*;
use crate::doc::{ElementKind, ShapeVariant};

fn rect_at(x: f64, y: f64, w: f64, h: f64, fill: &str) -> CanvasElement {
    let mut el = CanvasElement::shape(ShapeVariant::Rectangle, w, h);
    el.x = x;
    el.y = y;
    if let ElementKind::Shape(shape) = &mut el.kind {
        shape.fill = fill.to_owned();
    }
    el
}

fn small_board() -> Artboard {
    Artboard::centered(100.0, 100.0)
}

fn decode(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}

// =============================================================
// Options and errors
// =============================================================

#[test]
fn options_default_to_png_at_scale_one() {
    let options = ExportOptions::default();
    assert_eq!(options.format, ExportFormat::Png);
    assert!((options.scale - 1.0).abs() < f64::EPSILON);
}

#[test]
fn options_deserialize_with_defaults() {
    let options: ExportOptions = serde_json::from_str(r#"{"format":"jpeg"}"#).unwrap();
    assert_eq!(options.format, ExportFormat::Jpeg);
    assert!((options.quality - 0.92).abs() < f64::EPSILON);
}

#[test]
fn rejects_non_positive_scale() {
    let options = ExportOptions { scale: 0.0, ..ExportOptions::default() };
    let err = export_artboard(&[], &small_board(), &options).unwrap_err();
    assert!(matches!(err, ExportError::InvalidScale(_)));
}

#[test]
fn rejects_region_that_rounds_to_nothing() {
    let options = ExportOptions { scale: 0.001, ..ExportOptions::default() };
    let err = export_artboard(&[], &small_board(), &options).unwrap_err();
    assert!(matches!(err, ExportError::EmptyRegion { .. }));
}

// =============================================================
// Rendering
// =============================================================

#[test]
fn png_has_scaled_dimensions_and_background() {
    let board = small_board();
    let options = ExportOptions { scale: 2.0, ..ExportOptions::default() };
    let img = decode(&render_artboard(&[], &board, &options).unwrap());
    assert_eq!((img.width(), img.height()), (200, 200));
    assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
}

#[test]
fn draws_only_intersecting_elements_in_artboard_space() {
    let board = small_board();
    let inside = rect_at(board.x, board.y, 50.0, 50.0, "#FF0000");
    let outside = rect_at(0.0, 0.0, 50.0, 50.0, "#00FF00");
    let img = decode(&render_artboard(&[inside, outside], &board, &ExportOptions::default()).unwrap());
    assert_eq!(img.get_pixel(10, 10).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(80, 80).0, [255, 255, 255, 255]);
}

#[test]
fn element_opacity_blends_over_background() {
    let board = small_board();
    let mut half = rect_at(board.x, board.y, 100.0, 100.0, "#000000");
    half.opacity = 0.5;
    let img = decode(&render_artboard(&[half], &board, &ExportOptions::default()).unwrap());
    let px = img.get_pixel(50, 50).0;
    assert!((126..=129).contains(&px[0]));
    assert_eq!(px[3], 255);
}

#[test]
fn undecodable_image_is_skipped() {
    let board = small_board();
    let mut broken = CanvasElement::image("data:image/png;base64,AAAA", 100.0, 100.0);
    broken.x = board.x;
    broken.y = board.y;
    let img = decode(&render_artboard(&[broken], &board, &ExportOptions::default()).unwrap());
    assert_eq!(img.get_pixel(50, 50).0, [255, 255, 255, 255]);
}

#[test]
fn image_element_is_sampled() {
    let board = small_board();
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    let mut pic = CanvasElement::image(&encode_data_uri("image/png", &bytes), 100.0, 100.0);
    pic.x = board.x;
    pic.y = board.y;
    let img = decode(&render_artboard(&[pic], &board, &ExportOptions::default()).unwrap());
    assert_eq!(img.get_pixel(50, 50).0, [0, 0, 255, 255]);
}

#[test]
fn jpeg_export_is_a_jpeg_data_uri() {
    let options = ExportOptions { format: ExportFormat::Jpeg, quality: 0.8, scale: 1.0 };
    let uri = export_artboard(&[], &small_board(), &options).unwrap();
    assert!(uri.starts_with("data:image/jpeg;base64,"));
}

// =============================================================
// Scan conversion helpers
// =============================================================

#[test]
fn rounded_rect_cuts_corners() {
    assert!(in_rounded_rect(Point::new(5.0, 5.0), 10.0, 10.0, 0.0));
    assert!(!in_rounded_rect(Point::new(0.2, 0.2), 10.0, 10.0, 4.0));
    assert!(in_rounded_rect(Point::new(5.0, 0.1), 10.0, 10.0, 4.0));
}

#[test]
fn triangle_membership() {
    let verts = [Point::new(5.0, 0.0), Point::new(10.0, 10.0), Point::new(0.0, 10.0)];
    assert!(in_triangle(Point::new(5.0, 5.0), verts));
    assert!(!in_triangle(Point::new(0.5, 0.5), verts));
}

#[test]
fn rotated_fill_covers_rotated_pixels() {
    let mut surface = RasterSurface::new(20, 20);
    let primitive = Primitive::Rect {
        width: 20.0,
        height: 4.0,
        fill: "#000000",
        stroke: "",
        stroke_width: 0.0,
        corner_radius: 0.0,
    };
    // A horizontal bar rotated 90° about its center becomes vertical through x=10.
    let t = Affine::translate(0.0, 8.0).compose(Affine::rotate_about(Point::new(10.0, 2.0), 90.0));
    surface.draw(&primitive, &t, 1.0);
    assert_eq!(surface.image().get_pixel(10, 2).0[3], 255);
    assert_eq!(surface.image().get_pixel(2, 10).0[3], 0);
}
