//! Box-shaped scene objects and their per-kind payloads.

use super::{EntityId, RasterImage, SerializableColor, TextContent, normalize_rect, points_bounds};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest cylinder squash ratio (ellipse minor axis over half-width).
pub const MIN_SQUASH_RATIO: f64 = 0.12;
/// Largest cylinder squash ratio.
pub const MAX_SQUASH_RATIO: f64 = 0.6;
/// Squash ratio given to freshly drawn cylinders.
pub const DEFAULT_SQUASH_RATIO: f64 = 0.25;
/// Extrusion given to freshly drawn prisms, in world units.
pub const DEFAULT_EXTRUDE_OFFSET: f64 = 24.0;

fn default_squash_ratio() -> f64 {
    DEFAULT_SQUASH_RATIO
}

fn default_extrude_offset() -> f64 {
    DEFAULT_EXTRUDE_OFFSET
}

/// Text plus target URL of a link object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkContent {
    #[serde(flatten)]
    pub content: TextContent,
    #[serde(default)]
    pub url: String,
}

/// Kind-specific object payload. The `kind` tag is flattened into the
/// owning [`SceneObject`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ObjectBody {
    Text(TextContent),
    Sticky(TextContent),
    Rect,
    Ellipse,
    /// Vertices are authoritative; the object box is derived from them.
    Triangle {
        vertices: [Point; 3],
    },
    Line,
    Arrow,
    DoubleArrow,
    TriPrism {
        #[serde(default = "default_extrude_offset", alias = "depth")]
        extrude_offset: f64,
    },
    RectPrism {
        #[serde(default = "default_extrude_offset", alias = "depth")]
        extrude_offset: f64,
    },
    Cylinder {
        #[serde(default = "default_squash_ratio", alias = "depth")]
        squash_ratio: f64,
    },
    Image {
        raster: RasterImage,
    },
    Link(LinkContent),
    Stamp {
        stamp_key: String,
    },
}

/// Fieldless mirror of [`ObjectBody`] for dispatch and tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Text,
    Sticky,
    Rect,
    Ellipse,
    Triangle,
    Line,
    Arrow,
    DoubleArrow,
    TriPrism,
    RectPrism,
    Cylinder,
    Image,
    Link,
    Stamp,
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Text => "text",
            ObjectKind::Sticky => "sticky",
            ObjectKind::Rect => "rect",
            ObjectKind::Ellipse => "ellipse",
            ObjectKind::Triangle => "triangle",
            ObjectKind::Line => "line",
            ObjectKind::Arrow => "arrow",
            ObjectKind::DoubleArrow => "double-arrow",
            ObjectKind::TriPrism => "tri-prism",
            ObjectKind::RectPrism => "rect-prism",
            ObjectKind::Cylinder => "cylinder",
            ObjectKind::Image => "image",
            ObjectKind::Link => "link",
            ObjectKind::Stamp => "stamp",
        }
    }

    /// Kinds whose box is a directed segment rather than an area.
    pub fn is_linear(&self) -> bool {
        matches!(self, ObjectKind::Line | ObjectKind::Arrow | ObjectKind::DoubleArrow)
    }

    /// Kinds carrying editable text.
    pub fn has_text(&self) -> bool {
        matches!(self, ObjectKind::Text | ObjectKind::Sticky | ObjectKind::Link)
    }

    /// Kinds with a depth handle.
    pub fn has_depth(&self) -> bool {
        matches!(self, ObjectKind::TriPrism | ObjectKind::RectPrism | ObjectKind::Cylinder)
    }
}

impl ObjectBody {
    /// Default payload for a shape-tool draft of the given kind.
    ///
    /// Returns `None` for kinds that need external content (images, stamps,
    /// links and text are created by dedicated paths).
    pub fn shape(kind: ObjectKind, anchor: Point) -> Option<Self> {
        let body = match kind {
            ObjectKind::Rect => ObjectBody::Rect,
            ObjectKind::Ellipse => ObjectBody::Ellipse,
            ObjectKind::Triangle => ObjectBody::Triangle {
                vertices: [anchor; 3],
            },
            ObjectKind::Line => ObjectBody::Line,
            ObjectKind::Arrow => ObjectBody::Arrow,
            ObjectKind::DoubleArrow => ObjectBody::DoubleArrow,
            ObjectKind::TriPrism => ObjectBody::TriPrism {
                extrude_offset: DEFAULT_EXTRUDE_OFFSET,
            },
            ObjectKind::RectPrism => ObjectBody::RectPrism {
                extrude_offset: DEFAULT_EXTRUDE_OFFSET,
            },
            ObjectKind::Cylinder => ObjectBody::Cylinder {
                squash_ratio: DEFAULT_SQUASH_RATIO,
            },
            ObjectKind::Text
            | ObjectKind::Sticky
            | ObjectKind::Image
            | ObjectKind::Link
            | ObjectKind::Stamp => return None,
        };
        Some(body)
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectBody::Text(_) => ObjectKind::Text,
            ObjectBody::Sticky(_) => ObjectKind::Sticky,
            ObjectBody::Rect => ObjectKind::Rect,
            ObjectBody::Ellipse => ObjectKind::Ellipse,
            ObjectBody::Triangle { .. } => ObjectKind::Triangle,
            ObjectBody::Line => ObjectKind::Line,
            ObjectBody::Arrow => ObjectKind::Arrow,
            ObjectBody::DoubleArrow => ObjectKind::DoubleArrow,
            ObjectBody::TriPrism { .. } => ObjectKind::TriPrism,
            ObjectBody::RectPrism { .. } => ObjectKind::RectPrism,
            ObjectBody::Cylinder { .. } => ObjectKind::Cylinder,
            ObjectBody::Image { .. } => ObjectKind::Image,
            ObjectBody::Link(_) => ObjectKind::Link,
            ObjectBody::Stamp { .. } => ObjectKind::Stamp,
        }
    }
}

/// A rectangular scene object.
///
/// `width` and `height` may be negative: they encode the drag direction the
/// object was drawn in. Use [`SceneObject::normalized_rect`] for any area
/// computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    pub id: EntityId,
    #[serde(flatten)]
    pub body: ObjectBody,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// Rotation about the box center, in radians.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub stroke: SerializableColor,
    #[serde(default = "SerializableColor::transparent")]
    pub fill: SerializableColor,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub is_annotation: bool,
}

fn default_stroke_width() -> f64 {
    2.0
}

impl SceneObject {
    /// Create an object with default styling. The id is assigned by the
    /// scene store when the object is added.
    pub fn new(body: ObjectBody, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: 0,
            body,
            x,
            y,
            width,
            height,
            rotation: 0.0,
            stroke: SerializableColor::black(),
            fill: SerializableColor::transparent(),
            stroke_width: default_stroke_width(),
            group_id: None,
            locked: false,
            is_annotation: false,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.body.kind()
    }

    pub fn is_linear(&self) -> bool {
        self.kind().is_linear()
    }

    /// Positive-size box of the object, ignoring rotation.
    pub fn normalized_rect(&self) -> Rect {
        normalize_rect(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.normalized_rect().center()
    }

    /// Axis-aligned world bounds including rotation.
    pub fn bounds(&self) -> Rect {
        let rect = self.normalized_rect();
        if self.rotation == 0.0 {
            return rect;
        }
        let center = rect.center();
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ]
        .map(|p| rotate_about(p, center, self.rotation));
        points_bounds(&corners).unwrap_or(rect)
    }

    /// Start and end of a linear object, preserving direction.
    pub fn endpoints(&self) -> (Point, Point) {
        let start = Point::new(self.x, self.y);
        (start, start + Vec2::new(self.width, self.height))
    }

    /// Re-derive the box from a directed segment.
    pub fn set_endpoints(&mut self, start: Point, end: Point) {
        self.x = start.x;
        self.y = start.y;
        self.width = end.x - start.x;
        self.height = end.y - start.y;
    }

    pub fn text(&self) -> Option<&TextContent> {
        match &self.body {
            ObjectBody::Text(content) | ObjectBody::Sticky(content) => Some(content),
            ObjectBody::Link(link) => Some(&link.content),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextContent> {
        match &mut self.body {
            ObjectBody::Text(content) | ObjectBody::Sticky(content) => Some(content),
            ObjectBody::Link(link) => Some(&mut link.content),
            _ => None,
        }
    }

    pub fn triangle_vertices(&self) -> Option<[Point; 3]> {
        match &self.body {
            ObjectBody::Triangle { vertices } => Some(*vertices),
            _ => None,
        }
    }

    /// Overwrite the triangle vertices and re-derive the box from them.
    pub fn set_triangle_vertices(&mut self, new_vertices: [Point; 3]) {
        if let ObjectBody::Triangle { vertices } = &mut self.body {
            *vertices = new_vertices;
            self.recompute_triangle_bounds();
        }
    }

    /// Set the box of a triangle to min/max extent of its vertices.
    pub fn recompute_triangle_bounds(&mut self) {
        if let ObjectBody::Triangle { vertices } = &self.body {
            if let Some(rect) = points_bounds(vertices) {
                self.x = rect.x0;
                self.y = rect.y0;
                self.width = rect.width();
                self.height = rect.height();
            }
        }
    }

    /// Place the triangle vertices as an isosceles triangle filling the
    /// current (possibly directed) box: apex at top center.
    pub fn fit_triangle_to_box(&mut self) {
        let rect = self.normalized_rect();
        if let ObjectBody::Triangle { vertices } = &mut self.body {
            *vertices = [
                Point::new(rect.center().x, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ];
        }
    }

    /// Extrusion offset of a prism.
    pub fn extrude_offset(&self) -> Option<f64> {
        match self.body {
            ObjectBody::TriPrism { extrude_offset } | ObjectBody::RectPrism { extrude_offset } => {
                Some(extrude_offset)
            }
            _ => None,
        }
    }

    /// Squash ratio of a cylinder.
    pub fn squash_ratio(&self) -> Option<f64> {
        match self.body {
            ObjectBody::Cylinder { squash_ratio } => Some(squash_ratio),
            _ => None,
        }
    }

    /// Store a new depth value, whichever unit this kind uses.
    pub fn set_depth(&mut self, value: f64) {
        match &mut self.body {
            ObjectBody::TriPrism { extrude_offset } | ObjectBody::RectPrism { extrude_offset } => {
                *extrude_offset = value.max(0.0);
            }
            ObjectBody::Cylinder { squash_ratio } => {
                *squash_ratio = value.clamp(MIN_SQUASH_RATIO, MAX_SQUASH_RATIO);
            }
            _ => {}
        }
    }

    /// Move the object and any explicit vertices by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
        if let ObjectBody::Triangle { vertices } = &mut self.body {
            for v in vertices {
                *v += delta;
            }
        }
    }

    /// Rewrite the box so width and height are non-negative.
    ///
    /// Linear kinds keep their direction.
    pub fn normalize(&mut self) {
        if self.is_linear() {
            return;
        }
        let rect = self.normalized_rect();
        self.x = rect.x0;
        self.y = rect.y0;
        self.width = rect.width();
        self.height = rect.height();
    }
}

/// Rotate `point` about `center` by `angle` radians.
pub fn rotate_about(point: Point, center: Point, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    let d = point - center;
    center + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
}
