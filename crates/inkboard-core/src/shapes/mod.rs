//! Scene entity definitions for the whiteboard.
//!
//! Two entity families live in a scene: freehand [`Stroke`]s and
//! rectangular [`SceneObject`]s. Both are stored in world coordinates.

mod image;
mod object;
mod stamp;
mod stroke;
mod text;

pub use image::{DecodeError, RasterImage};
pub use object::{
    DEFAULT_EXTRUDE_OFFSET, DEFAULT_SQUASH_RATIO, LinkContent, MAX_SQUASH_RATIO, MIN_SQUASH_RATIO,
    ObjectBody, ObjectKind, SceneObject, rotate_about,
};
pub use stamp::{StampPreset, STAMP_PRESETS, stamp_preset};
pub use stroke::{Stroke, StrokeKind};
pub use text::{FontFamily, TextAlign, TextContent};

use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Identifier of a stroke or object, unique within its family.
pub type EntityId = u64;

/// A reference to either entity family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "family", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    Object(EntityId),
    Stroke(EntityId),
}

/// Serializable color representation (RGBA8).
///
/// Encoded in JSON as a CSS hex string, or `"transparent"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Whether drawing with this color would be invisible.
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Return the same color with its alpha scaled by `factor`.
    pub fn with_opacity(self, factor: f64) -> Self {
        let alpha = (f64::from(self.a) * factor.clamp(0.0, 1.0)).round() as u8;
        Self { a: alpha, ..self }
    }

    /// Parse a CSS hex color (`#rgb`, `#rrggbb`, `#rrggbbaa`) or `transparent`.
    pub fn parse(color: &str) -> Option<Self> {
        let color = color.trim();
        if color.eq_ignore_ascii_case("transparent") {
            return Some(Self::transparent());
        }
        let hex = color.strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let r = channel(&hex[0..1])? * 17;
                let g = channel(&hex[1..2])? * 17;
                let b = channel(&hex[2..3])? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as a CSS hex string.
    pub fn to_hex(&self) -> String {
        if self.a == 0 {
            "transparent".to_string()
        } else if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::black()
    }
}

impl From<SerializableColor> for String {
    fn from(color: SerializableColor) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for SerializableColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Normalize a possibly negative-size box to a positive-size rectangle.
///
/// Width and height encode draw direction, so every geometric consumer
/// goes through here before treating the box as an area.
pub fn normalize_rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::new(x, y, x + width, y + height).abs()
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    point.distance(proj)
}

/// Bounding rectangle of a point set, or `None` when empty.
pub fn points_bounds(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p)),
    )
}
