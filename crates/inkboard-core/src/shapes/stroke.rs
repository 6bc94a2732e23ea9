//! Freehand strokes.

use super::{EntityId, SerializableColor, points_bounds};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// How a stroke composites onto the stroke layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeKind {
    #[default]
    Pen,
    /// Wide, translucent ink.
    Highlighter,
    /// Removes ink underneath it (destination-out) without touching objects.
    Eraser,
}

/// A freehand polyline in world coordinates.
///
/// Points are appended while the stroke is being drawn and are otherwise
/// only changed by transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: EntityId,
    #[serde(default)]
    pub kind: StrokeKind,
    #[serde(default)]
    pub color: SerializableColor,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub is_annotation: bool,
}

fn default_width() -> f64 {
    3.0
}

impl Stroke {
    /// Create a stroke with a single starting point. The id is assigned by
    /// the scene store when the stroke is added.
    pub fn new(kind: StrokeKind, color: SerializableColor, width: f64, start: Point) -> Self {
        Self {
            id: 0,
            kind,
            color,
            width,
            points: vec![start],
            group_id: None,
            locked: false,
            is_annotation: false,
        }
    }

    /// Append a point unless it lies closer than `min_distance` to the last
    /// one. Returns whether the point was kept.
    pub fn push_point(&mut self, point: Point, min_distance: f64) -> bool {
        if let Some(last) = self.points.last() {
            if last.distance(point) < min_distance {
                return false;
            }
        }
        self.points.push(point);
        true
    }

    /// Bounding box of the point set, inflated by half the ink width.
    pub fn bounds(&self) -> Rect {
        let half = self.width / 2.0;
        points_bounds(&self.points)
            .unwrap_or(Rect::ZERO)
            .inflate(half, half)
    }

    /// Whether any point lies within `tolerance` of `point`.
    pub fn hits(&self, point: Point, tolerance: f64) -> bool {
        let tolerance_sq = tolerance * tolerance;
        self.points
            .iter()
            .any(|p| (*p - point).hypot2() <= tolerance_sq)
    }

    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
    }
}
