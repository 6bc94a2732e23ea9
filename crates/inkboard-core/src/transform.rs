//! Geometric mutation algorithms: translate, resize, rotate, vertex edit
//! and depth.
//!
//! Every drag is computed from a snapshot taken at drag start plus the
//! current pointer position, never incrementally, so repeated move events
//! cannot accumulate drift.

use crate::hit::{Corner, EXTRUDE_DIRECTION, HandleKind};
use crate::scene::SceneStore;
use crate::shapes::{EntityRef, ObjectBody, SceneObject, rotate_about};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Vertical drag (in half-widths) that moves a cylinder's squash ratio by 0.5.
const SQUASH_DRAG_GAIN: f64 = 0.5;

/// Smallest side a corner drag can shrink a box to.
pub const MIN_RESIZE_EXTENT: f64 = 1.0;

/// Transform-relevant fields of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertices: Option<[Point; 3]>,
    /// Extrusion offset or squash ratio, depending on kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
}

impl ObjectGeometry {
    pub fn capture(object: &SceneObject) -> Self {
        Self {
            x: object.x,
            y: object.y,
            width: object.width,
            height: object.height,
            rotation: object.rotation,
            vertices: object.triangle_vertices(),
            depth: object.extrude_offset().or(object.squash_ratio()),
        }
    }

    pub fn apply(&self, object: &mut SceneObject) {
        object.x = self.x;
        object.y = self.y;
        object.width = self.width;
        object.height = self.height;
        object.rotation = self.rotation;
        if let (Some(new_vertices), ObjectBody::Triangle { vertices }) = (self.vertices, &mut object.body) {
            *vertices = new_vertices;
        }
        if let Some(depth) = self.depth {
            object.set_depth(depth);
        }
    }

    pub fn normalized_rect(&self) -> Rect {
        crate::shapes::normalize_rect(self.x, self.y, self.width, self.height)
    }
}

/// Snapshot of whatever a transform can change on one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum EntityGeometry {
    Object(ObjectGeometry),
    Stroke { points: Vec<Point> },
}

impl EntityGeometry {
    pub fn capture(store: &SceneStore, entity: EntityRef) -> Option<Self> {
        match entity {
            EntityRef::Object(id) => store.find_object(id).map(|o| Self::Object(ObjectGeometry::capture(o))),
            EntityRef::Stroke(id) => store.find_stroke(id).map(|s| Self::Stroke {
                points: s.points.clone(),
            }),
        }
    }

    /// Write this snapshot back. Mismatched families are ignored.
    pub fn restore(&self, store: &mut SceneStore, entity: EntityRef) {
        match (self, entity) {
            (Self::Object(geometry), EntityRef::Object(id)) => {
                if let Some(object) = store.find_object_mut(id) {
                    geometry.apply(object);
                }
            }
            (Self::Stroke { points }, EntityRef::Stroke(id)) => {
                if let Some(stroke) = store.find_stroke_mut(id) {
                    stroke.points = points.clone();
                }
            }
            _ => {}
        }
    }
}

/// Move every captured entity to its original position plus `delta`.
///
/// Locked entities are skipped.
pub fn translate(store: &mut SceneStore, originals: &[(EntityRef, EntityGeometry)], delta: Vec2) {
    for (entity, original) in originals {
        if store.is_locked(*entity) {
            continue;
        }
        original.restore(store, *entity);
        match *entity {
            EntityRef::Object(id) => {
                if let Some(object) = store.find_object_mut(id) {
                    object.translate(delta);
                }
            }
            EntityRef::Stroke(id) => {
                if let Some(stroke) = store.find_stroke_mut(id) {
                    stroke.translate(delta);
                }
            }
        }
    }
}

/// Box produced by dragging `corner` of `before` to `pointer`.
///
/// The opposite corner stays fixed in world space, also for rotated
/// objects. With `keep_aspect` the dominant axis (relative to the original
/// size) drives the other one through the original aspect ratio. Each side
/// is at least [`MIN_RESIZE_EXTENT`], grown in the direction the pointer
/// is on (or the dragged corner's, when the pointer sits on the anchor).
pub fn resize_box(before: &ObjectGeometry, corner: Corner, pointer: Point, keep_aspect: bool) -> Rect {
    let rect = before.normalized_rect();
    let center = rect.center();
    let anchor = corner.opposite().of(rect);
    let local = rotate_about(pointer, center, -before.rotation);

    let mut w = local.x - anchor.x;
    let mut h = local.y - anchor.y;
    let default_dir = corner.of(rect) - anchor;
    let sign_w = if w == 0.0 { default_dir.x.signum() } else { w.signum() };
    let sign_h = if h == 0.0 { default_dir.y.signum() } else { h.signum() };
    if keep_aspect && rect.width() > 0.0 && rect.height() > 0.0 {
        let floor = MIN_RESIZE_EXTENT / rect.width().min(rect.height());
        let scale = (w.abs() / rect.width()).max(h.abs() / rect.height()).max(floor);
        w = sign_w * scale * rect.width();
        h = sign_h * scale * rect.height();
    } else {
        w = sign_w * w.abs().max(MIN_RESIZE_EXTENT);
        h = sign_h * h.abs().max(MIN_RESIZE_EXTENT);
    }

    let resized = Rect::from_points(anchor, anchor + Vec2::new(w, h));
    if before.rotation == 0.0 {
        return resized;
    }
    // Keep the anchor's world position: place the new center so that the
    // rotated anchor lands where it was.
    let anchor_world = rotate_about(anchor, center, before.rotation);
    let rel = anchor - resized.center();
    let (sin, cos) = before.rotation.sin_cos();
    let rotated_rel = Vec2::new(rel.x * cos - rel.y * sin, rel.x * sin + rel.y * cos);
    let new_center = anchor_world - rotated_rel;
    Rect::from_center_size(new_center, resized.size())
}

/// Map a point from one rectangle into another proportionally.
fn remap(point: Point, from: Rect, to: Rect) -> Point {
    let fx = if from.width() > 0.0 { (point.x - from.x0) / from.width() } else { 0.5 };
    let fy = if from.height() > 0.0 { (point.y - from.y0) / from.height() } else { 0.5 };
    Point::new(to.x0 + fx * to.width(), to.y0 + fy * to.height())
}

/// In-flight handle drag on a single object.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleDrag {
    pub handle: HandleKind,
    pub before: ObjectGeometry,
    pub start: Point,
    /// Rotation pivot captured at drag start.
    pub center: Point,
    pub start_angle: f64,
}

impl HandleDrag {
    pub fn begin(object: &SceneObject, handle: HandleKind, start: Point) -> Self {
        let center = object.center();
        Self {
            handle,
            before: ObjectGeometry::capture(object),
            start,
            center,
            start_angle: (start.y - center.y).atan2(start.x - center.x),
        }
    }

    /// Apply the drag for the current pointer position.
    pub fn update(&self, object: &mut SceneObject, pointer: Point, keep_aspect: bool) {
        self.before.apply(object);
        match self.handle {
            HandleKind::Rotate => {
                object.rotation = rotation_for(self.center, self.start_angle, self.before.rotation, pointer);
            }
            HandleKind::Corner(corner) => resize_object(object, &self.before, corner, pointer, keep_aspect),
            HandleKind::Endpoint(index) => {
                if object.is_linear() {
                    let (mut start, mut end) = object.endpoints();
                    if index == 0 {
                        start = pointer;
                    } else {
                        end = pointer;
                    }
                    object.set_endpoints(start, end);
                }
            }
            HandleKind::Vertex(index) => {
                if let Some(mut vertices) = object.triangle_vertices() {
                    if let Some(vertex) = vertices.get_mut(index) {
                        *vertex = rotate_about(pointer, self.center, -self.before.rotation);
                    }
                    object.set_triangle_vertices(vertices);
                }
            }
            HandleKind::Depth => {
                let drag = pointer - self.start;
                let (sin, cos) = (-self.before.rotation).sin_cos();
                let local = Vec2::new(drag.x * cos - drag.y * sin, drag.x * sin + drag.y * cos);
                let start_depth = self.before.depth.unwrap_or(0.0);
                let half_width = self.before.normalized_rect().width() / 2.0;
                match object.body {
                    ObjectBody::TriPrism { .. } | ObjectBody::RectPrism { .. } => {
                        object.set_depth(prism_depth(start_depth, local));
                    }
                    ObjectBody::Cylinder { .. } => {
                        object.set_depth(cylinder_squash(start_depth, local.y, half_width));
                    }
                    _ => {}
                }
            }
        }
    }
}

/// `start_rotation` plus the angle swept by the pointer around `center`.
pub fn rotation_for(center: Point, start_angle: f64, start_rotation: f64, pointer: Point) -> f64 {
    let angle = (pointer.y - center.y).atan2(pointer.x - center.x);
    start_rotation + (angle - start_angle)
}

/// New extrusion from the drag projected onto the extrude diagonal.
pub fn prism_depth(start_depth: f64, drag: Vec2) -> f64 {
    (start_depth + drag.dot(EXTRUDE_DIRECTION)).max(0.0)
}

/// New squash ratio: dragging up (negative `dy`) fattens the ellipse.
pub fn cylinder_squash(start_ratio: f64, dy: f64, half_width: f64) -> f64 {
    if half_width <= 0.0 {
        return start_ratio;
    }
    (start_ratio - dy / half_width * SQUASH_DRAG_GAIN)
        .clamp(crate::shapes::MIN_SQUASH_RATIO, crate::shapes::MAX_SQUASH_RATIO)
}

/// Corner resize, dispatched per kind.
fn resize_object(object: &mut SceneObject, before: &ObjectGeometry, corner: Corner, pointer: Point, keep_aspect: bool) {
    match object.body {
        ObjectBody::Line | ObjectBody::Arrow | ObjectBody::DoubleArrow => {}
        ObjectBody::Triangle { .. } => {
            let from = before.normalized_rect();
            let to = resize_box(before, corner, pointer, keep_aspect);
            if let Some(original) = before.vertices {
                // Vertices live in the unrotated frame around the old center.
                let shift = to.center() - from.center();
                let local_to = Rect::from_center_size(from.center(), to.size());
                object.set_triangle_vertices(original.map(|v| remap(v, from, local_to) + shift));
            }
        }
        ObjectBody::Text(_)
        | ObjectBody::Sticky(_)
        | ObjectBody::Rect
        | ObjectBody::Ellipse
        | ObjectBody::TriPrism { .. }
        | ObjectBody::RectPrism { .. }
        | ObjectBody::Cylinder { .. }
        | ObjectBody::Image { .. }
        | ObjectBody::Link(_)
        | ObjectBody::Stamp { .. } => {
            let rect = resize_box(before, corner, pointer, keep_aspect);
            object.x = rect.x0;
            object.y = rect.y0;
            object.width = rect.width();
            object.height = rect.height();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{SerializableColor, Stroke, StrokeKind};
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn geometry(x: f64, y: f64, w: f64, h: f64) -> ObjectGeometry {
        ObjectGeometry::capture(&SceneObject::new(ObjectBody::Rect, x, y, w, h))
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_free_resize_anchors_opposite_corner() {
        let before = geometry(0.0, 0.0, 100.0, 50.0);
        let rect = resize_box(&before, Corner::BottomRight, Point::new(150.0, 80.0), false);
        assert_eq!(rect, Rect::new(0.0, 0.0, 150.0, 80.0));
        let rect = resize_box(&before, Corner::TopLeft, Point::new(20.0, 10.0), false);
        assert_eq!(rect, Rect::new(20.0, 10.0, 100.0, 50.0));
    }

    #[test]
    fn test_resize_past_anchor_flips_and_normalizes() {
        let before = geometry(0.0, 0.0, 100.0, 50.0);
        let rect = resize_box(&before, Corner::BottomRight, Point::new(-20.0, -10.0), false);
        assert_eq!(rect, Rect::new(-20.0, -10.0, 0.0, 0.0));
    }

    #[test]
    fn test_aspect_locked_resize_keeps_ratio() {
        let before = geometry(10.0, 20.0, 120.0, 40.0);
        let ratio = 40.0 / 120.0;
        for pointer in [
            Point::new(400.0, 70.0),
            Point::new(140.0, 300.0),
            Point::new(-200.0, 61.0),
            Point::new(90.0, -150.0),
        ] {
            for corner in [Corner::TopLeft, Corner::TopRight, Corner::BottomLeft, Corner::BottomRight] {
                let rect = resize_box(&before, corner, pointer, true);
                assert!(
                    (rect.height() / rect.width() - ratio).abs() < 1e-9,
                    "{corner:?} {pointer:?} -> {rect:?}"
                );
            }
        }
    }

    #[test]
    fn test_resize_onto_anchor_keeps_minimum_extent() {
        let before = geometry(0.0, 0.0, 100.0, 50.0);
        let rect = resize_box(&before, Corner::BottomRight, Point::new(0.0, 0.0), true);
        assert!(rect.width() > 0.0 && rect.height() > 0.0);
        assert!(close(rect.height() / rect.width(), 0.5), "{rect:?}");
        assert!(close(rect.height(), MIN_RESIZE_EXTENT));
        assert_eq!((rect.x0, rect.y0), (0.0, 0.0));

        let rect = resize_box(&before, Corner::TopLeft, Point::new(100.0, 50.0), false);
        assert_eq!(rect, Rect::new(99.0, 49.0, 100.0, 50.0));
    }

    #[test]
    fn test_aspect_lock_dominant_axis() {
        let before = geometry(0.0, 0.0, 100.0, 100.0);
        // x grew by 100%, y by 20%: width wins.
        let rect = resize_box(&before, Corner::BottomRight, Point::new(200.0, 120.0), true);
        assert_eq!(rect, Rect::new(0.0, 0.0, 200.0, 200.0));
    }

    #[test]
    fn test_rotated_resize_keeps_anchor_in_world() {
        let mut object = SceneObject::new(ObjectBody::Rect, 0.0, 0.0, 100.0, 50.0);
        object.rotation = FRAC_PI_4;
        let before = ObjectGeometry::capture(&object);
        let anchor_world = rotate_about(Point::new(0.0, 0.0), object.center(), object.rotation);
        let grabbed = rotate_about(Point::new(100.0, 50.0), object.center(), object.rotation);

        let rect = resize_box(&before, Corner::BottomRight, grabbed + Vec2::new(30.0, 10.0), false);
        let after_anchor = rotate_about(Point::new(rect.x0, rect.y0), rect.center(), object.rotation);
        assert!(close(after_anchor.x, anchor_world.x) && close(after_anchor.y, anchor_world.y));
    }

    #[test]
    fn test_rotation_is_additive() {
        let mut object = SceneObject::new(ObjectBody::Rect, -50.0, -50.0, 100.0, 100.0);
        object.rotation = 0.3;
        let drag = HandleDrag::begin(&object, HandleKind::Rotate, Point::new(0.0, -80.0));
        drag.update(&mut object, Point::new(80.0, 0.0), false);
        assert!(close(object.rotation, 0.3 + FRAC_PI_2));
        drag.update(&mut object, Point::new(0.0, -80.0), false);
        assert!(close(object.rotation, 0.3));
    }

    #[test]
    fn test_endpoint_drag_preserves_direction() {
        let mut line = SceneObject::new(ObjectBody::Arrow, 100.0, 100.0, 50.0, 0.0);
        let drag = HandleDrag::begin(&line, HandleKind::Endpoint(1), Point::new(150.0, 100.0));
        drag.update(&mut line, Point::new(40.0, 60.0), false);
        assert_eq!((line.x, line.y, line.width, line.height), (100.0, 100.0, -60.0, -40.0));

        let drag = HandleDrag::begin(&line, HandleKind::Endpoint(0), Point::new(100.0, 100.0));
        drag.update(&mut line, Point::new(0.0, 0.0), false);
        assert_eq!(line.endpoints(), (Point::new(0.0, 0.0), Point::new(40.0, 60.0)));
    }

    #[test]
    fn test_vertex_edit_recomputes_bounds() {
        let mut tri = SceneObject::new(ObjectBody::Triangle { vertices: [Point::ZERO; 3] }, 0.0, 0.0, 100.0, 100.0);
        tri.fit_triangle_to_box();
        let drag = HandleDrag::begin(&tri, HandleKind::Vertex(0), Point::new(50.0, 0.0));
        drag.update(&mut tri, Point::new(50.0, -40.0), false);
        assert_eq!(tri.triangle_vertices().unwrap()[0], Point::new(50.0, -40.0));
        assert_eq!((tri.y, tri.height), (-40.0, 140.0));
    }

    #[test]
    fn test_triangle_corner_resize_scales_vertices() {
        let mut tri = SceneObject::new(ObjectBody::Triangle { vertices: [Point::ZERO; 3] }, 0.0, 0.0, 100.0, 100.0);
        tri.fit_triangle_to_box();
        let drag = HandleDrag::begin(&tri, HandleKind::Corner(Corner::BottomRight), Point::new(100.0, 100.0));
        drag.update(&mut tri, Point::new(200.0, 50.0), false);
        let v = tri.triangle_vertices().unwrap();
        assert_eq!(v[0], Point::new(100.0, 0.0));
        assert_eq!(v[1], Point::new(200.0, 50.0));
        assert_eq!((tri.width, tri.height), (200.0, 50.0));
    }

    #[test]
    fn test_prism_depth_projects_and_clamps() {
        assert!(close(prism_depth(10.0, Vec2::new(30.0, -30.0)), 10.0 + 30.0 * 2f64.sqrt()));
        assert_eq!(prism_depth(10.0, Vec2::new(-100.0, 100.0)), 0.0);
        // Perpendicular drags do nothing.
        assert!(close(prism_depth(10.0, Vec2::new(20.0, 20.0)), 10.0));
    }

    #[test]
    fn test_cylinder_squash_range() {
        assert!(close(cylinder_squash(0.3, -10.0, 50.0), 0.4));
        assert_eq!(cylinder_squash(0.3, -500.0, 50.0), 0.6);
        assert_eq!(cylinder_squash(0.3, 500.0, 50.0), 0.12);
        assert_eq!(cylinder_squash(0.3, 10.0, 0.0), 0.3);
    }

    #[test]
    fn test_translate_skips_locked_and_moves_points() {
        let mut store = SceneStore::new();
        let a = store.add_object(SceneObject::new(ObjectBody::Rect, 0.0, 0.0, 10.0, 10.0));
        let mut locked = SceneObject::new(ObjectBody::Rect, 50.0, 0.0, 10.0, 10.0);
        locked.locked = true;
        let b = store.add_object(locked);
        let mut stroke = Stroke::new(StrokeKind::Pen, SerializableColor::black(), 2.0, Point::ZERO);
        stroke.points.push(Point::new(5.0, 5.0));
        let s = store.add_stroke(stroke);

        let entities = [EntityRef::Object(a), EntityRef::Object(b), EntityRef::Stroke(s)];
        let originals: Vec<_> = entities
            .iter()
            .map(|e| (*e, EntityGeometry::capture(&store, *e).unwrap()))
            .collect();
        translate(&mut store, &originals, Vec2::new(5.0, 0.0));
        translate(&mut store, &originals, Vec2::new(10.0, 3.0));

        assert_eq!(store.find_object(a).unwrap().x, 10.0);
        assert_eq!(store.find_object(b).unwrap().x, 50.0);
        assert_eq!(store.find_stroke(s).unwrap().points, vec![Point::new(10.0, 3.0), Point::new(15.0, 8.0)]);
    }
}
