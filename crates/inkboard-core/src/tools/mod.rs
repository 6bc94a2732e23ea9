//! Tool system for the whiteboard.

mod controller;

pub use controller::{InteractionState, ToolController};

use crate::shapes::{ObjectKind, SerializableColor, StrokeKind};
use serde::{Deserialize, Serialize};

/// Shapes drawn by dragging out a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeTool {
    Rect,
    Ellipse,
    Triangle,
    Line,
    Arrow,
    DoubleArrow,
    TriPrism,
    RectPrism,
    Cylinder,
}

impl ShapeTool {
    pub fn object_kind(self) -> ObjectKind {
        match self {
            ShapeTool::Rect => ObjectKind::Rect,
            ShapeTool::Ellipse => ObjectKind::Ellipse,
            ShapeTool::Triangle => ObjectKind::Triangle,
            ShapeTool::Line => ObjectKind::Line,
            ShapeTool::Arrow => ObjectKind::Arrow,
            ShapeTool::DoubleArrow => ObjectKind::DoubleArrow,
            ShapeTool::TriPrism => ObjectKind::TriPrism,
            ShapeTool::RectPrism => ObjectKind::RectPrism,
            ShapeTool::Cylinder => ObjectKind::Cylinder,
        }
    }
}

/// Available tools.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "tool", content = "variant", rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Pen,
    Highlighter,
    /// Deletes whole strokes on contact.
    Eraser,
    /// Paints destination-out ink over strokes.
    PixelEraser,
    Text,
    Sticky,
    Shape(ShapeTool),
    /// Places the preset with this key.
    Stamp(String),
}

impl ToolKind {
    /// Stroke kind drawn by freehand tools.
    pub fn stroke_kind(&self) -> Option<StrokeKind> {
        match self {
            ToolKind::Pen => Some(StrokeKind::Pen),
            ToolKind::Highlighter => Some(StrokeKind::Highlighter),
            ToolKind::PixelEraser => Some(StrokeKind::Eraser),
            _ => None,
        }
    }
}

/// Styling applied to newly created entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolStyle {
    pub stroke_color: SerializableColor,
    pub fill_color: SerializableColor,
    pub stroke_width: f64,
    pub pen_width: f64,
    pub highlighter_color: SerializableColor,
    pub highlighter_width: f64,
    pub eraser_width: f64,
    pub font_size: f64,
    pub sticky_color: SerializableColor,
}

impl Default for ToolStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            fill_color: SerializableColor::transparent(),
            stroke_width: 2.0,
            pen_width: 3.0,
            highlighter_color: SerializableColor::new(255, 235, 59, 96),
            highlighter_width: 18.0,
            eraser_width: 24.0,
            font_size: 20.0,
            sticky_color: SerializableColor::new(255, 245, 157, 255),
        }
    }
}

impl ToolStyle {
    /// Ink color and width for a freehand stroke kind.
    pub fn ink(&self, kind: StrokeKind) -> (SerializableColor, f64) {
        match kind {
            StrokeKind::Pen => (self.stroke_color, self.pen_width),
            StrokeKind::Highlighter => (self.highlighter_color, self.highlighter_width),
            StrokeKind::Eraser => (SerializableColor::black(), self.eraser_width),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_json() {
        let json = serde_json::to_string(&ToolKind::Shape(ShapeTool::DoubleArrow)).unwrap();
        assert_eq!(json, r#"{"tool":"shape","variant":"double-arrow"}"#);
        let tool: ToolKind = serde_json::from_str(r#"{"tool":"pixel-eraser"}"#).unwrap();
        assert_eq!(tool, ToolKind::PixelEraser);
    }

    #[test]
    fn test_stroke_kinds() {
        assert_eq!(ToolKind::Pen.stroke_kind(), Some(StrokeKind::Pen));
        assert_eq!(ToolKind::PixelEraser.stroke_kind(), Some(StrokeKind::Eraser));
        assert_eq!(ToolKind::Eraser.stroke_kind(), None);
    }
}
