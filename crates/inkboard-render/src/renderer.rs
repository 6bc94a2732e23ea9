//! The layered draw pass.
//!
//! Layers, bottom to top: background color and grid, background raster,
//! objects in z-order, the stroke layer (composited once so eraser ink only
//! cuts strokes), the pending ghost layer, and the selection overlay.

use crate::surface::{CompositeMode, Surface, TextRun};
use inkboard_core::camera::Camera;
use inkboard_core::canvas::{Canvas, PendingLayer};
use inkboard_core::hit::{EXTRUDE_DIRECTION, Handle, HandleKind, HandleMetrics, get_handles};
use inkboard_core::scene::SceneStore;
use inkboard_core::selection::Selection;
use inkboard_core::shapes::{
    EntityId, EntityRef, ObjectBody, RasterImage, SceneObject, Stroke as InkStroke, StrokeKind, TextAlign,
    TextContent, rotate_about, stamp_preset,
};
use inkboard_core::tools::ToolController;
use kurbo::{Affine, Arc, BezPath, Cap, Circle, Ellipse, Join, Point, Rect, Shape, Size, Stroke, Vec2};
use peniko::Color;
use std::f64::consts::{FRAC_PI_6, PI};
use thiserror::Error;

/// World distance between grid lines.
const GRID_SIZE: f64 = 20.0;
/// Inner padding of text boxes.
const TEXT_PADDING: f64 = 4.0;
/// Inner padding of sticky notes.
const STICKY_PADDING: f64 = 12.0;
/// Handle edge length in screen pixels.
const HANDLE_SIZE_PX: f64 = 10.0;

/// Errors raised by render backends and export.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    InvalidBuffer { expected: usize, actual: usize },
}

pub type RenderResult<T> = Result<T, RendererError>;

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStyle {
    None,
    #[default]
    Lines,
    Dots,
}

/// Everything one frame needs. The scene is borrowed immutably.
pub struct RenderContext<'a> {
    pub store: &'a SceneStore,
    pub camera: &'a Camera,
    pub selection: &'a Selection,
    pub background: Option<&'a RasterImage>,
    pub pending: Option<&'a PendingLayer>,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio, applied only to the final transform.
    pub scale_factor: f64,
    pub background_color: Color,
    pub grid_style: GridStyle,
    pub selection_color: Color,
    /// Box-select marquee in world coordinates.
    pub selection_rect: Option<Rect>,
    /// Object whose text is drawn by the editor overlay instead.
    pub editing_object: Option<EntityId>,
    pub pending_alpha: f32,
    pub handle_metrics: HandleMetrics,
}

impl<'a> RenderContext<'a> {
    pub fn new(canvas: &'a Canvas, viewport_size: Size) -> Self {
        let pending = canvas.pending();
        Self {
            store: canvas.store(),
            camera: canvas.camera(),
            selection: canvas.selection(),
            background: canvas.background(),
            pending: (!pending.is_empty()).then_some(pending),
            viewport_size,
            scale_factor: canvas.device_pixel_ratio(),
            background_color: Color::from_rgba8(250, 250, 250, 255),
            grid_style: if canvas.config().show_grid {
                GridStyle::Lines
            } else {
                GridStyle::None
            },
            selection_color: Color::from_rgba8(59, 130, 246, 255),
            selection_rect: None,
            editing_object: canvas.editing_object(),
            pending_alpha: 0.45,
            handle_metrics: canvas.handle_metrics(),
        }
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_grid(mut self, style: GridStyle) -> Self {
        self.grid_style = style;
        self
    }

    pub fn with_selection_rect(mut self, rect: Option<Rect>) -> Self {
        self.selection_rect = rect;
        self
    }

    /// Take the marquee of an in-progress box selection.
    pub fn with_controller(self, controller: &ToolController) -> Self {
        self.with_selection_rect(controller.marquee())
    }

    pub fn with_pending_alpha(mut self, alpha: f32) -> Self {
        self.pending_alpha = alpha;
        self
    }

    /// World to physical pixels.
    pub fn view_transform(&self) -> Affine {
        Affine::scale(self.scale_factor) * self.camera.transform()
    }
}

/// Draw one frame of the scene onto `surface`.
pub fn render<S: Surface + ?Sized>(ctx: &RenderContext, surface: &mut S) {
    let view = ctx.view_transform();
    let zoom = ctx.camera.scale;

    surface.clear(ctx.background_color);
    render_grid(surface, ctx, view);

    if let Some(raster) = ctx.background {
        let dest = Rect::new(0.0, 0.0, f64::from(raster.width()), f64::from(raster.height()));
        surface.draw_image(view, raster, dest, 1.0);
    }

    for object in ctx.store.objects() {
        let skip_text = ctx.editing_object == Some(object.id);
        render_object(surface, object, view, skip_text);
    }

    surface.push_layer(CompositeMode::SourceOver, 1.0);
    for stroke in ctx.store.strokes() {
        render_stroke(surface, stroke, view);
    }
    surface.pop_layer();

    if let Some(pending) = ctx.pending {
        surface.push_layer(CompositeMode::SourceOver, ctx.pending_alpha);
        for object in &pending.objects {
            render_object(surface, object, view, false);
        }
        for stroke in &pending.strokes {
            render_stroke(surface, stroke, view);
        }
        surface.pop_layer();
    }

    render_overlay(surface, ctx, view, zoom);
}

fn render_grid<S: Surface + ?Sized>(surface: &mut S, ctx: &RenderContext, view: Affine) {
    if ctx.grid_style == GridStyle::None {
        return;
    }
    let inv = view.inverse();
    let tl = inv * Point::ZERO;
    let br = inv * Point::new(ctx.viewport_size.width, ctx.viewport_size.height);
    let start_x = (tl.x / GRID_SIZE).floor() * GRID_SIZE;
    let start_y = (tl.y / GRID_SIZE).floor() * GRID_SIZE;
    let end_x = (br.x / GRID_SIZE).ceil() * GRID_SIZE;
    let end_y = (br.y / GRID_SIZE).ceil() * GRID_SIZE;
    let pixel = 1.0 / (ctx.camera.scale * ctx.scale_factor);

    let mut path = BezPath::new();
    match ctx.grid_style {
        GridStyle::None => {}
        GridStyle::Lines => {
            let mut x = start_x;
            while x <= end_x {
                path.move_to(Point::new(x, start_y));
                path.line_to(Point::new(x, end_y));
                x += GRID_SIZE;
            }
            let mut y = start_y;
            while y <= end_y {
                path.move_to(Point::new(start_x, y));
                path.line_to(Point::new(end_x, y));
                y += GRID_SIZE;
            }
            surface.stroke(&Stroke::new(0.5 * pixel), view, Color::from_rgba8(200, 200, 200, 100), &path);
        }
        GridStyle::Dots => {
            let half = 1.5 * pixel;
            let mut x = start_x;
            while x <= end_x {
                let mut y = start_y;
                while y <= end_y {
                    path.extend(Rect::new(x - half, y - half, x + half, y + half).path_elements(0.1));
                    y += GRID_SIZE;
                }
                x += GRID_SIZE;
            }
            surface.fill(view, Color::from_rgba8(160, 160, 160, 70), &path);
        }
    }
}

/// Draw one object. Rotation is applied about the box center.
pub fn render_object<S: Surface + ?Sized>(surface: &mut S, object: &SceneObject, view: Affine, skip_text: bool) {
    let rect = object.normalized_rect();
    let transform = view * Affine::rotate_about(object.rotation, rect.center());
    let paint = Paint::of(object);

    match &object.body {
        ObjectBody::Rect => paint.shape(surface, transform, &rect.to_path(0.1)),
        ObjectBody::Ellipse => paint.shape(surface, transform, &Ellipse::from_rect(rect).to_path(0.1)),
        ObjectBody::Triangle { vertices } => paint.shape(surface, transform, &polygon(vertices)),
        ObjectBody::Line => {
            let (start, end) = object.endpoints();
            paint.line(surface, transform, &segment(start, end));
        }
        ObjectBody::Arrow => {
            let (start, end) = object.endpoints();
            let mut path = segment(start, end);
            path.extend(arrow_head(end, start, paint.head_length()));
            paint.line(surface, transform, &path);
        }
        ObjectBody::DoubleArrow => {
            let (start, end) = object.endpoints();
            let mut path = segment(start, end);
            path.extend(arrow_head(end, start, paint.head_length()));
            path.extend(arrow_head(start, end, paint.head_length()));
            paint.line(surface, transform, &path);
        }
        ObjectBody::TriPrism { extrude_offset } => {
            let front = [
                Point::new(rect.center().x, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ];
            render_prism(surface, &paint, transform, &front, *extrude_offset);
        }
        ObjectBody::RectPrism { extrude_offset } => {
            let front = [
                Point::new(rect.x0, rect.y0),
                Point::new(rect.x1, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ];
            render_prism(surface, &paint, transform, &front, *extrude_offset);
        }
        ObjectBody::Cylinder { squash_ratio } => render_cylinder(surface, &paint, transform, rect, *squash_ratio),
        ObjectBody::Text(content) => {
            if !skip_text {
                surface.draw_text(transform, &text_run(content, rect, TEXT_PADDING));
            }
        }
        ObjectBody::Sticky(content) => {
            paint.shape(surface, transform, &rect.to_path(0.1));
            if !skip_text {
                surface.draw_text(transform, &text_run(content, rect, STICKY_PADDING));
            }
        }
        ObjectBody::Link(link) => {
            if !skip_text {
                let run = text_run(&link.content, rect, TEXT_PADDING);
                let underline_y = run.origin.y + run.line_height;
                let underline = segment(
                    Point::new(run.origin.x, underline_y),
                    Point::new(run.origin.x + run.max_width, underline_y),
                );
                surface.stroke(&Stroke::new(1.0), transform, run.color, &underline);
                surface.draw_text(transform, &run);
            }
        }
        ObjectBody::Image { raster } => surface.draw_image(transform, raster, rect, 1.0),
        ObjectBody::Stamp { stamp_key } => {
            let preset = stamp_preset(stamp_key);
            let font_size = rect.height() * 0.8;
            let run = TextRun {
                text: preset.glyph.to_string(),
                origin: rect.origin(),
                max_width: rect.width(),
                font_size,
                line_height: rect.height(),
                font_family: Default::default(),
                bold: false,
                color: paint.stroke,
                align: TextAlign::Center,
            };
            surface.draw_text(transform, &run);
        }
    }
}

/// Draw one freehand stroke. Eraser ink cuts through what the enclosing
/// layer holds.
pub fn render_stroke<S: Surface + ?Sized>(surface: &mut S, stroke: &InkStroke, view: Affine) {
    let color: Color = stroke.color.into();
    let erasing = stroke.kind == StrokeKind::Eraser;
    if erasing {
        surface.push_layer(CompositeMode::DestinationOut, 1.0);
    }
    let ink = if erasing { Color::BLACK } else { color };
    match stroke.points.as_slice() {
        [] => {}
        [dot] => surface.fill(view, ink, &Circle::new(*dot, stroke.width / 2.0).to_path(0.1)),
        [first, rest @ ..] => {
            let mut path = BezPath::new();
            path.move_to(*first);
            for point in rest {
                path.line_to(*point);
            }
            let style = Stroke::new(stroke.width).with_caps(Cap::Round).with_join(Join::Round);
            surface.stroke(&style, view, ink, &path);
        }
    }
    if erasing {
        surface.pop_layer();
    }
}

fn render_overlay<S: Surface + ?Sized>(surface: &mut S, ctx: &RenderContext, view: Affine, zoom: f64) {
    let color = ctx.selection_color;
    let dashed = Stroke::new(1.0 / zoom).with_dashes(0.0, [4.0 / zoom, 4.0 / zoom]);

    let single = ctx.selection.single_object();
    for entity in ctx.selection.entities() {
        match *entity {
            EntityRef::Stroke(id) => {
                if let Some(stroke) = ctx.store.find_stroke(id) {
                    surface.stroke(&dashed, view, color, &stroke.bounds().to_path(0.1));
                }
            }
            EntityRef::Object(id) => {
                let Some(object) = ctx.store.find_object(id) else {
                    continue;
                };
                if !object.is_linear() {
                    let rect = object.normalized_rect();
                    let transform = view * Affine::rotate_about(object.rotation, rect.center());
                    surface.stroke(&dashed, transform, color, &rect.to_path(0.1));
                }
                if single == Some(id) && !object.locked {
                    render_handles(surface, object, ctx, view, zoom);
                }
            }
        }
    }

    if let Some(marquee) = ctx.selection_rect {
        let path = marquee.abs().to_path(0.1);
        surface.fill(view, Color::from_rgba8(59, 130, 246, 25), &path);
        surface.stroke(&dashed, view, color, &path);
    }
}

fn render_handles<S: Surface + ?Sized>(
    surface: &mut S,
    object: &SceneObject,
    ctx: &RenderContext,
    view: Affine,
    zoom: f64,
) {
    let half = HANDLE_SIZE_PX / zoom / 2.0;
    let border = Stroke::new(1.5 / zoom);
    let color = ctx.selection_color;
    let handles = get_handles(object, &ctx.handle_metrics);

    if let Some(rotate) = handles.iter().find(|h| h.kind == HandleKind::Rotate) {
        let rect = object.normalized_rect();
        let top = rotate_about(Point::new(rect.center().x, rect.y0), rect.center(), object.rotation);
        surface.stroke(&Stroke::new(1.0 / zoom), view, color, &segment(top, rotate.position));
    }
    for handle in &handles {
        let path = handle_path(handle, half);
        surface.fill(view, Color::WHITE, &path);
        surface.stroke(&border, view, color, &path);
    }
}

fn handle_path(handle: &Handle, half: f64) -> BezPath {
    let p = handle.position;
    match handle.kind {
        HandleKind::Corner(_) => Rect::new(p.x - half, p.y - half, p.x + half, p.y + half).to_path(0.1),
        HandleKind::Endpoint(_) | HandleKind::Vertex(_) | HandleKind::Rotate => Circle::new(p, half).to_path(0.1),
        HandleKind::Depth => polygon(&[
            Point::new(p.x, p.y - half),
            Point::new(p.x + half, p.y),
            Point::new(p.x, p.y + half),
            Point::new(p.x - half, p.y),
        ]),
    }
}

/// Back face, connecting edges, then front face.
fn render_prism<S: Surface + ?Sized>(surface: &mut S, paint: &Paint, transform: Affine, front: &[Point], depth: f64) {
    let offset = EXTRUDE_DIRECTION * depth;
    let back: Vec<Point> = front.iter().map(|p| *p + offset).collect();
    paint.shape(surface, transform, &polygon(&back));
    let mut edges = BezPath::new();
    for (f, b) in front.iter().zip(&back) {
        edges.move_to(*f);
        edges.line_to(*b);
    }
    paint.line(surface, transform, &edges);
    paint.shape(surface, transform, &polygon(front));
}

fn render_cylinder<S: Surface + ?Sized>(surface: &mut S, paint: &Paint, transform: Affine, rect: Rect, squash: f64) {
    let rx = rect.width() / 2.0;
    let ry = (rx * squash).min(rect.height() / 2.0);
    let cx = rect.center().x;
    let top = Point::new(cx, rect.y0 + ry);
    let bottom = Point::new(cx, rect.y1 - ry);

    let mut body = BezPath::new();
    body.move_to(Point::new(rect.x0, top.y));
    body.line_to(Point::new(rect.x0, bottom.y));
    body.extend(Arc::new(bottom, Vec2::new(rx, ry), PI, -PI, 0.0).append_iter(0.1));
    body.line_to(Point::new(rect.x1, top.y));
    body.close_path();
    paint.shape(surface, transform, &body);
    paint.shape(surface, transform, &Ellipse::new(top, Vec2::new(rx, ry), 0.0).to_path(0.1));
}

/// Resolved colors and pen of one object.
struct Paint {
    stroke: Color,
    fill: Option<Color>,
    outline: Option<Stroke>,
    width: f64,
}

impl Paint {
    fn of(object: &SceneObject) -> Self {
        let outline = (!object.stroke.is_transparent() && object.stroke_width > 0.0)
            .then(|| Stroke::new(object.stroke_width).with_caps(Cap::Round).with_join(Join::Round));
        Self {
            stroke: object.stroke.into(),
            fill: (!object.fill.is_transparent()).then(|| object.fill.into()),
            outline,
            width: object.stroke_width,
        }
    }

    fn head_length(&self) -> f64 {
        (self.width * 4.0).max(10.0)
    }

    fn shape<S: Surface + ?Sized>(&self, surface: &mut S, transform: Affine, path: &BezPath) {
        if let Some(fill) = self.fill {
            surface.fill(transform, fill, path);
        }
        self.line(surface, transform, path);
    }

    fn line<S: Surface + ?Sized>(&self, surface: &mut S, transform: Affine, path: &BezPath) {
        if let Some(outline) = &self.outline {
            surface.stroke(outline, transform, self.stroke, path);
        }
    }
}

fn text_run(content: &TextContent, rect: Rect, padding: f64) -> TextRun {
    TextRun {
        text: content.text.clone(),
        origin: Point::new(rect.x0 + padding, rect.y0 + padding),
        max_width: (rect.width() - 2.0 * padding).max(0.0),
        font_size: content.font_size,
        line_height: content.line_height(),
        font_family: content.font_family,
        bold: content.bold,
        color: content.text_color.into(),
        align: content.text_align,
    }
}

fn segment(start: Point, end: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(start);
    path.line_to(end);
    path
}

fn polygon(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for point in rest {
            path.line_to(*point);
        }
        path.close_path();
    }
    path
}

/// Open chevron at `tip`, pointing away from `from`.
fn arrow_head(tip: Point, from: Point, length: f64) -> BezPath {
    let dir = tip - from;
    let len = dir.hypot();
    let mut path = BezPath::new();
    if len == 0.0 {
        return path;
    }
    let back = -dir / len * length;
    let rotate = |v: Vec2, angle: f64| {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
    };
    path.move_to(tip + rotate(back, FRAC_PI_6));
    path.line_to(tip);
    path.line_to(tip + rotate(back, -FRAC_PI_6));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display_list::{DisplayList, DrawCommand};
    use inkboard_core::shapes::{SerializableColor, TextContent};

    fn record(canvas: &Canvas) -> DisplayList {
        let size = Size::new(800.0, 600.0);
        let mut list = DisplayList::new(size);
        render(&RenderContext::new(canvas, size).with_grid(GridStyle::None), &mut list);
        list
    }

    fn layer_index(list: &DisplayList, wanted: CompositeMode) -> Option<usize> {
        list.commands()
            .iter()
            .position(|c| matches!(c, DrawCommand::PushLayer { mode, .. } if *mode == wanted))
    }

    #[test]
    fn test_empty_scene_clears_and_balances() {
        let canvas = Canvas::new();
        let list = record(&canvas);
        assert!(matches!(list.commands()[0], DrawCommand::Clear(_)));
        assert!(list.is_balanced());
    }

    #[test]
    fn test_grid_follows_config() {
        let canvas = Canvas::new();
        let size = Size::new(100.0, 100.0);
        let mut list = DisplayList::new(size);
        render(&RenderContext::new(&canvas, size), &mut list);
        assert!(matches!(list.commands()[1], DrawCommand::Stroke { .. }));
    }

    #[test]
    fn test_layer_order() {
        let mut canvas = Canvas::new();
        canvas.set_background(Some(RasterImage::from_parts("image/png", vec![0], 4, 4)));
        canvas.add_object(SceneObject::new(ObjectBody::Rect, 0.0, 0.0, 10.0, 10.0));
        canvas.add_stroke(InkStroke::new(StrokeKind::Pen, SerializableColor::black(), 2.0, Point::ZERO));
        canvas.set_pending(Vec::new(), vec![SceneObject::new(ObjectBody::Ellipse, 0.0, 0.0, 5.0, 5.0)]);

        let list = record(&canvas);
        let commands = list.commands();
        let image = commands.iter().position(|c| matches!(c, DrawCommand::Image { .. })).unwrap();
        let rect = commands.iter().position(|c| matches!(c, DrawCommand::Stroke { .. })).unwrap();
        let layers: Vec<usize> = commands
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, DrawCommand::PushLayer { .. }))
            .map(|(i, _)| i)
            .collect();
        assert!(image < rect);
        assert_eq!(layers.len(), 2);
        assert!(rect < layers[0]);
        assert!(matches!(commands[layers[1]], DrawCommand::PushLayer { alpha, .. } if alpha < 1.0));
        assert!(list.is_balanced());
    }

    #[test]
    fn test_eraser_strokes_cut_inside_stroke_layer() {
        let mut canvas = Canvas::new();
        let mut ink = InkStroke::new(StrokeKind::Eraser, SerializableColor::black(), 20.0, Point::ZERO);
        ink.points.push(Point::new(30.0, 0.0));
        canvas.add_stroke(ink);
        let list = record(&canvas);
        let outer = layer_index(&list, CompositeMode::SourceOver).unwrap();
        let cut = layer_index(&list, CompositeMode::DestinationOut).unwrap();
        assert!(outer < cut);
        assert!(list.is_balanced());
    }

    #[test]
    fn test_device_pixel_ratio_only_in_transform() {
        let mut canvas = Canvas::new();
        canvas.set_device_pixel_ratio(2.0);
        let mut object = SceneObject::new(ObjectBody::Rect, 0.0, 0.0, 10.0, 10.0);
        object.fill = SerializableColor::white();
        canvas.add_object(object);
        let list = record(&canvas);
        let transform = list
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::Fill { transform, .. } => Some(*transform),
                _ => None,
            })
            .unwrap();
        assert_eq!(transform * Point::new(10.0, 10.0), Point::new(20.0, 20.0));
    }

    #[test]
    fn test_rotation_about_center() {
        let mut canvas = Canvas::new();
        let mut object = SceneObject::new(ObjectBody::Rect, 0.0, 0.0, 20.0, 10.0);
        object.rotation = PI;
        canvas.add_object(object);
        let list = record(&canvas);
        let DrawCommand::Stroke { transform, .. } = &list.commands()[1] else {
            panic!("expected outline");
        };
        let mapped = *transform * Point::new(0.0, 0.0);
        assert!((mapped - Point::new(20.0, 10.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_editing_text_is_skipped() {
        let mut canvas = Canvas::new();
        let id = canvas.add_object(SceneObject::new(ObjectBody::Text(TextContent::new("hi")), 0.0, 0.0, 50.0, 20.0));
        let list = record(&canvas);
        assert!(list.commands().iter().any(|c| matches!(c, DrawCommand::Text { .. })));

        let size = Size::new(800.0, 600.0);
        let mut ctx = RenderContext::new(&canvas, size);
        ctx.editing_object = Some(id);
        let mut list = DisplayList::new(size);
        render(&ctx, &mut list);
        assert!(!list.commands().iter().any(|c| matches!(c, DrawCommand::Text { .. })));
    }

    #[test]
    fn test_single_selection_draws_handles() {
        let mut canvas = Canvas::new();
        let id = canvas.add_object(SceneObject::new(ObjectBody::Rect, 0.0, 0.0, 100.0, 100.0));
        let plain = record(&canvas).len();
        canvas.set_selection([EntityRef::Object(id)]);
        let selected = record(&canvas).len();
        // Dashed outline, rotate connector, then fill and border per handle.
        assert_eq!(selected, plain + 2 + 2 * 5);
    }

    #[test]
    fn test_marquee_is_drawn_last() {
        let canvas = Canvas::new();
        let size = Size::new(200.0, 200.0);
        let ctx = RenderContext::new(&canvas, size)
            .with_grid(GridStyle::None)
            .with_selection_rect(Some(Rect::new(10.0, 10.0, 50.0, 40.0)));
        let mut list = DisplayList::new(size);
        render(&ctx, &mut list);
        assert!(matches!(list.commands().last(), Some(DrawCommand::Stroke { .. })));
    }
}
