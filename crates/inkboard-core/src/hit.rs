//! Spatial queries against the scene: entity picking, handle picking and
//! marquee intersection.
//!
//! Tolerances are given in screen pixels and converted to world units with
//! the current view scale, so picking feels the same at every zoom level.

use crate::scene::SceneStore;
use crate::shapes::{EntityId, EntityRef, ObjectBody, SceneObject, point_to_segment_dist, rotate_about};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;

/// Screen-pixel gap between a cylinder's right edge and its depth handle.
pub const CYLINDER_HANDLE_GAP_PX: f64 = 12.0;

/// Unit direction along which prisms extrude (up and to the right).
pub const EXTRUDE_DIRECTION: Vec2 = Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2);

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn opposite(self) -> Self {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    /// Position of this corner on a positive-size rectangle.
    pub fn of(self, rect: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(rect.x0, rect.y0),
            Corner::TopRight => Point::new(rect.x1, rect.y0),
            Corner::BottomLeft => Point::new(rect.x0, rect.y1),
            Corner::BottomRight => Point::new(rect.x1, rect.y1),
        }
    }
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Box resize handle.
    Corner(Corner),
    /// Line endpoint (0 = start, 1 = end).
    Endpoint(usize),
    /// Triangle vertex (0..3).
    Vertex(usize),
    Rotate,
    /// Prism extrusion or cylinder squash.
    Depth,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Axis-aligned square hit box with the given world half-extent.
    pub fn hit_test(&self, point: Point, half_extent: f64) -> bool {
        (point.x - self.position.x).abs() <= half_extent
            && (point.y - self.position.y).abs() <= half_extent
    }
}

/// Screen-space sizes used to lay out and pick handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleMetrics {
    pub scale: f64,
    pub device_pixel_ratio: f64,
    pub hit_px: f64,
    pub rotate_offset_px: f64,
}

impl HandleMetrics {
    /// Half-extent of a handle hit box in world units.
    pub fn hit_extent(&self) -> f64 {
        self.hit_px / self.scale / self.device_pixel_ratio.max(f64::EPSILON)
    }

    fn px(&self, px: f64) -> f64 {
        px / self.scale
    }
}

/// Handles of a single selected object, in world coordinates.
pub fn get_handles(object: &SceneObject, metrics: &HandleMetrics) -> Vec<Handle> {
    match &object.body {
        ObjectBody::Line | ObjectBody::Arrow | ObjectBody::DoubleArrow => {
            let (start, end) = object.endpoints();
            vec![
                Handle::new(start, HandleKind::Endpoint(0)),
                Handle::new(end, HandleKind::Endpoint(1)),
            ]
        }
        ObjectBody::Triangle { vertices } => {
            let center = object.center();
            let mut handles: Vec<Handle> = vertices
                .iter()
                .enumerate()
                .map(|(i, v)| Handle::new(rotate_about(*v, center, object.rotation), HandleKind::Vertex(i)))
                .collect();
            handles.push(rotate_handle(object, metrics));
            handles
        }
        ObjectBody::TriPrism { extrude_offset } | ObjectBody::RectPrism { extrude_offset } => {
            let rect = object.normalized_rect();
            let anchor = Point::new(rect.x1, rect.y0) + EXTRUDE_DIRECTION * *extrude_offset;
            let mut handles = corner_and_rotate_handles(object, metrics);
            handles.push(Handle::new(
                rotate_about(anchor, rect.center(), object.rotation),
                HandleKind::Depth,
            ));
            handles
        }
        ObjectBody::Cylinder { .. } => {
            let rect = object.normalized_rect();
            let anchor = Point::new(rect.x1 + metrics.px(CYLINDER_HANDLE_GAP_PX), rect.center().y);
            let mut handles = corner_and_rotate_handles(object, metrics);
            handles.push(Handle::new(
                rotate_about(anchor, rect.center(), object.rotation),
                HandleKind::Depth,
            ));
            handles
        }
        ObjectBody::Text(_)
        | ObjectBody::Sticky(_)
        | ObjectBody::Rect
        | ObjectBody::Ellipse
        | ObjectBody::Image { .. }
        | ObjectBody::Link(_)
        | ObjectBody::Stamp { .. } => corner_and_rotate_handles(object, metrics),
    }
}

/// Corner handles plus a rotation handle above the top-center, all rotated
/// with the object.
fn corner_and_rotate_handles(object: &SceneObject, metrics: &HandleMetrics) -> Vec<Handle> {
    let rect = object.normalized_rect();
    let center = rect.center();
    let mut handles: Vec<Handle> = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ]
    .into_iter()
    .map(|corner| {
        Handle::new(
            rotate_about(corner.of(rect), center, object.rotation),
            HandleKind::Corner(corner),
        )
    })
    .collect();
    handles.push(rotate_handle(object, metrics));
    handles
}

fn rotate_handle(object: &SceneObject, metrics: &HandleMetrics) -> Handle {
    let rect = object.normalized_rect();
    let center = rect.center();
    let top = Point::new(center.x, rect.y0 - metrics.px(metrics.rotate_offset_px));
    Handle::new(rotate_about(top, center, object.rotation), HandleKind::Rotate)
}

/// Find which handle of `object` (if any) is hit at a world point.
///
/// The rotate handle is tested first since it sits outside the box.
pub fn hit_test_handles(object: &SceneObject, point: Point, metrics: &HandleMetrics) -> Option<HandleKind> {
    let extent = metrics.hit_extent();
    let handles = get_handles(object, metrics);
    handles
        .iter()
        .filter(|h| h.kind == HandleKind::Rotate || h.kind == HandleKind::Depth)
        .chain(handles.iter().filter(|h| h.kind != HandleKind::Rotate && h.kind != HandleKind::Depth))
        .find(|h| h.hit_test(point, extent))
        .map(|h| h.kind)
}

/// Whether a world point lies on `object`.
///
/// Box kinds test the normalized rectangle in the object's unrotated frame;
/// linear kinds test distance to the directed segment.
pub fn object_contains(object: &SceneObject, point: Point, tolerance: f64) -> bool {
    match &object.body {
        ObjectBody::Line | ObjectBody::Arrow | ObjectBody::DoubleArrow => {
            let (start, end) = object.endpoints();
            point_to_segment_dist(point, start, end) <= tolerance.max(object.stroke_width / 2.0)
        }
        ObjectBody::Text(_)
        | ObjectBody::Sticky(_)
        | ObjectBody::Rect
        | ObjectBody::Ellipse
        | ObjectBody::Triangle { .. }
        | ObjectBody::TriPrism { .. }
        | ObjectBody::RectPrism { .. }
        | ObjectBody::Cylinder { .. }
        | ObjectBody::Image { .. }
        | ObjectBody::Link(_)
        | ObjectBody::Stamp { .. } => {
            let rect = object.normalized_rect();
            let local = rotate_about(point, rect.center(), -object.rotation);
            contains_closed(rect, local)
        }
    }
}

/// Containment including the right and bottom edges.
fn contains_closed(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Topmost object containing `point`.
pub fn hit_test_object(store: &SceneStore, point: Point, tolerance: f64) -> Option<EntityId> {
    store
        .objects()
        .iter()
        .rev()
        .find(|o| object_contains(o, point, tolerance))
        .map(|o| o.id)
}

/// Topmost stroke with any point within `tolerance` world units of `point`.
pub fn hit_test_stroke(store: &SceneStore, point: Point, tolerance: f64) -> Option<EntityId> {
    store
        .strokes()
        .iter()
        .rev()
        .find(|s| s.hits(point, tolerance))
        .map(|s| s.id)
}

/// Objects take priority over strokes.
pub fn hit_test(store: &SceneStore, point: Point, tolerance: f64) -> Option<EntityRef> {
    hit_test_object(store, point, tolerance)
        .map(EntityRef::Object)
        .or_else(|| hit_test_stroke(store, point, tolerance).map(EntityRef::Stroke))
}

/// Closed-interval overlap, so zero-area boxes (straight lines) still count.
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

/// All entities whose bounding box intersects the marquee, objects first.
pub fn entities_in_rect(store: &SceneStore, marquee: Rect) -> Vec<EntityRef> {
    let marquee = marquee.abs();
    let objects = store
        .objects()
        .iter()
        .filter(|o| overlaps(o.bounds(), marquee))
        .map(|o| EntityRef::Object(o.id));
    let strokes = store
        .strokes()
        .iter()
        .filter(|s| overlaps(s.bounds(), marquee))
        .map(|s| EntityRef::Stroke(s.id));
    objects.chain(strokes).collect()
}
