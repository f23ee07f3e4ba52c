//! Rendering: walks the scene and hands primitives to a [`RenderSurface`].
//!
//! This module never touches a concrete backend. It receives read-only views
//! of document state, camera state and UI state and emits one [`Primitive`]
//! per visual piece, each with the affine transform from the primitive's
//! local frame to the surface and an effective opacity. It does not mutate
//! any application state.
//!
//! Group children are drawn with their parent's transform composed in front
//! of their own and with the parent's opacity multiplied into theirs.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::camera::Camera;
use crate::consts::HANDLE_RADIUS_PX;
use crate::doc::{Artboard, CanvasElement, ElementKind, ImageFilters, Scene, ShapeVariant, TextProps};
use crate::geom::{Affine, Point, element_transform};
use crate::hit::{HitPart, selection_frame};
use crate::input::UiState;
use crate::snap::{Guide, Orientation};

/// Selection outline and handle color.
const SELECTION_COLOR: &str = "#3B82F6";
/// Handle fill.
const HANDLE_FILL: &str = "#FFFFFF";
/// Snap guide color.
const GUIDE_COLOR: &str = "#EC4899";
/// Guide thickness in screen pixels.
const GUIDE_THICKNESS_PX: f64 = 1.0;

/// One drawable piece in its own local frame. Boxed primitives span
/// `0..width` × `0..height`; a line runs from the origin along +x.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive<'a> {
    Rect {
        width: f64,
        height: f64,
        fill: &'a str,
        stroke: &'a str,
        stroke_width: f64,
        corner_radius: f64,
    },
    Ellipse {
        width: f64,
        height: f64,
        fill: &'a str,
        stroke: &'a str,
        stroke_width: f64,
    },
    Triangle {
        width: f64,
        height: f64,
        fill: &'a str,
        stroke: &'a str,
        stroke_width: f64,
    },
    Text {
        width: f64,
        height: f64,
        /// Content with the text transform already applied.
        text: String,
        style: &'a TextProps,
    },
    Image {
        width: f64,
        height: f64,
        src: &'a str,
        filters: ImageFilters,
        border_radius: f64,
    },
    Line {
        length: f64,
        thickness: f64,
        color: &'a str,
    },
    Outline {
        width: f64,
        height: f64,
        color: &'a str,
        dashed: bool,
    },
}

impl Primitive<'_> {
    /// Short label for logging and tests.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rect { .. } => "rect",
            Self::Ellipse { .. } => "ellipse",
            Self::Triangle { .. } => "triangle",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Line { .. } => "line",
            Self::Outline { .. } => "outline",
        }
    }
}

/// A backend that can draw primitives.
pub trait RenderSurface {
    /// Draw `primitive` mapped through `transform` at `opacity` (0..=1).
    fn draw(&mut self, primitive: &Primitive<'_>, transform: &Affine, opacity: f64);
}

/// World → screen transform for `camera`.
#[must_use]
pub fn world_to_screen_transform(camera: &Camera) -> Affine {
    Affine::translate(-camera.offset.x, -camera.offset.y).compose(Affine::scale(camera.zoom, camera.zoom))
}

/// Draw the full frame: artboard, elements, then selection UI.
pub fn draw_scene<S>(surface: &mut S, scene: &Scene, camera: &Camera, ui: &UiState)
where
    S: RenderSurface + ?Sized,
{
    let base = world_to_screen_transform(camera);
    draw_artboard(surface, scene.artboard(), base);
    draw_elements(surface, scene.elements(), base);
    draw_overlay(surface, scene, camera, ui);
}

/// Artboard background, when visible.
pub fn draw_artboard<S>(surface: &mut S, artboard: &Artboard, base: Affine)
where
    S: RenderSurface + ?Sized,
{
    if !artboard.visible {
        return;
    }
    let primitive = Primitive::Rect {
        width: artboard.width,
        height: artboard.height,
        fill: &artboard.background_color,
        stroke: "",
        stroke_width: 0.0,
        corner_radius: 0.0,
    };
    surface.draw(&primitive, &base.compose(Affine::translate(artboard.x, artboard.y)), artboard.opacity);
}

/// Draw `elements` back to front. `base` maps world space onto the surface.
pub fn draw_elements<'a, S, I>(surface: &mut S, elements: I, base: Affine)
where
    S: RenderSurface + ?Sized,
    I: IntoIterator<Item = &'a CanvasElement>,
{
    for el in elements {
        draw_element(surface, el, base, 1.0);
    }
}

fn draw_element<S>(surface: &mut S, el: &CanvasElement, parent: Affine, parent_opacity: f64)
where
    S: RenderSurface + ?Sized,
{
    let transform = parent.compose(element_transform(el));
    let opacity = parent_opacity * el.opacity.clamp(0.0, 1.0);
    let (width, height) = (el.width, el.height);

    match &el.kind {
        ElementKind::Group(group) => {
            for child in &group.children {
                draw_element(surface, child, transform, opacity);
            }
        }
        ElementKind::Shape(shape) => {
            let primitive = match shape.shape {
                ShapeVariant::Rectangle => Primitive::Rect {
                    width,
                    height,
                    fill: &shape.fill,
                    stroke: &shape.stroke,
                    stroke_width: shape.stroke_width,
                    corner_radius: shape.corner_radius,
                },
                ShapeVariant::Circle => Primitive::Ellipse {
                    width,
                    height,
                    fill: &shape.fill,
                    stroke: &shape.stroke,
                    stroke_width: shape.stroke_width,
                },
                ShapeVariant::Triangle => Primitive::Triangle {
                    width,
                    height,
                    fill: &shape.fill,
                    stroke: &shape.stroke,
                    stroke_width: shape.stroke_width,
                },
            };
            surface.draw(&primitive, &transform, opacity);
        }
        ElementKind::Text(text) => {
            let primitive = Primitive::Text { width, height, text: text.display_text(), style: text };
            surface.draw(&primitive, &transform, opacity);
        }
        ElementKind::Image(image) => {
            let primitive = Primitive::Image {
                width,
                height,
                src: &image.src,
                filters: image.filters,
                border_radius: image.border_radius,
            };
            surface.draw(&primitive, &transform, opacity);
        }
    }
}

// =============================================================
// Overlay
// =============================================================

/// Selection outlines, handles, snap guides and the marquee, in screen space.
pub fn draw_overlay<S>(surface: &mut S, scene: &Scene, camera: &Camera, ui: &UiState)
where
    S: RenderSurface + ?Sized,
{
    let base = world_to_screen_transform(camera);

    for el in scene.selected_elements() {
        let outline = Primitive::Outline { width: el.width, height: el.height, color: SELECTION_COLOR, dashed: false };
        surface.draw(&outline, &base.compose(element_transform(el)), 1.0);
    }

    if let Some(frame) = selection_frame(scene) {
        for (part, world) in frame.handles(camera.zoom) {
            draw_handle(surface, camera.world_to_screen(world), part);
        }
    }

    for guide in &ui.guides {
        draw_guide(surface, guide, camera);
    }

    if let Some(m) = ui.marquee {
        let top_left = camera.world_to_screen(Point::new(m.x, m.y));
        let marquee = Primitive::Outline {
            width: m.width * camera.zoom,
            height: m.height * camera.zoom,
            color: SELECTION_COLOR,
            dashed: true,
        };
        surface.draw(&marquee, &Affine::translate(top_left.x, top_left.y), 1.0);
    }
}

fn draw_handle<S>(surface: &mut S, center: Point, part: HitPart)
where
    S: RenderSurface + ?Sized,
{
    let size = HANDLE_RADIUS_PX;
    let at = Affine::translate(center.x - size / 2.0, center.y - size / 2.0);
    let primitive = match part {
        HitPart::RotateHandle => Primitive::Ellipse {
            width: size,
            height: size,
            fill: HANDLE_FILL,
            stroke: SELECTION_COLOR,
            stroke_width: 1.0,
        },
        HitPart::ResizeHandle(_) | HitPart::Body => Primitive::Rect {
            width: size,
            height: size,
            fill: HANDLE_FILL,
            stroke: SELECTION_COLOR,
            stroke_width: 1.0,
            corner_radius: 0.0,
        },
    };
    surface.draw(&primitive, &at, 1.0);
}

fn draw_guide<S>(surface: &mut S, guide: &Guide, camera: &Camera)
where
    S: RenderSurface + ?Sized,
{
    let (from, to) = match guide.orientation {
        Orientation::Horizontal => (Point::new(guide.start, guide.value), Point::new(guide.end, guide.value)),
        Orientation::Vertical => (Point::new(guide.value, guide.start), Point::new(guide.value, guide.end)),
    };
    let from = camera.world_to_screen(from);
    let to = camera.world_to_screen(to);
    let angle = (to.y - from.y).atan2(to.x - from.x).to_degrees();
    let primitive = Primitive::Line { length: from.distance(to), thickness: GUIDE_THICKNESS_PX, color: GUIDE_COLOR };
    surface.draw(&primitive, &Affine::translate(from.x, from.y).compose(Affine::rotate(angle)), 1.0);
}
