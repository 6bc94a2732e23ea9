//! Board export/import format.

use crate::shapes::{EntityId, RasterImage, SceneObject, Stroke};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only schema version this build reads and writes.
pub const BOARD_VERSION: u32 = 1;

/// Board import/export errors.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Invalid board JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported board version {0} (expected {BOARD_VERSION})")]
    UnsupportedVersion(u32),
}

/// Serialized board: view state, entities and background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardData {
    pub version: u32,
    #[serde(default = "one")]
    pub scale: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
    #[serde(default = "first_id")]
    pub next_object_id: EntityId,
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    /// Serialized as `{dataUrl, width, height}` or `null`.
    #[serde(default)]
    pub background: Option<RasterImage>,
}

fn one() -> f64 {
    1.0
}

fn first_id() -> EntityId {
    1
}

impl Default for BoardData {
    fn default() -> Self {
        Self {
            version: BOARD_VERSION,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            next_object_id: 1,
            strokes: Vec::new(),
            objects: Vec::new(),
            background: None,
        }
    }
}

impl BoardData {
    pub fn to_json(&self) -> Result<String, BoardError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, BoardError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and version-check a board.
    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        let data: Self = serde_json::from_str(json)?;
        data.check_version()?;
        Ok(data)
    }

    pub fn check_version(&self) -> Result<(), BoardError> {
        if self.version == BOARD_VERSION {
            Ok(())
        } else {
            Err(BoardError::UnsupportedVersion(self.version))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ObjectBody, SerializableColor, StrokeKind};
    use kurbo::Point;

    #[test]
    fn test_default_board_json() {
        let json = BoardData::default().to_json().unwrap();
        assert!(json.contains(r#""version":1"#));
        assert!(json.contains(r#""nextObjectId":1"#));
        assert!(json.contains(r#""background":null"#));
    }

    #[test]
    fn test_round_trip_with_background() {
        let mut data = BoardData::default();
        data.background = Some(RasterImage::from_parts("image/png", vec![9, 8, 7], 640, 480));
        let mut stroke = Stroke::new(StrokeKind::Pen, SerializableColor::black(), 2.0, Point::new(1.0, 2.0));
        stroke.id = 4;
        data.strokes.push(stroke);
        let mut object = SceneObject::new(ObjectBody::Ellipse, 1.0, 2.0, 3.0, 4.0);
        object.id = 9;
        data.objects.push(object);

        let json = data.to_json().unwrap();
        assert!(json.contains(r#""dataUrl":"data:image/png;base64,"#));
        assert_eq!(BoardData::from_json(&json).unwrap(), data);
    }

    #[test]
    fn test_rejects_other_versions() {
        let result = BoardData::from_json(r#"{"version":2}"#);
        assert!(matches!(result, Err(BoardError::UnsupportedVersion(2))));
        assert!(matches!(BoardData::from_json("[]"), Err(BoardError::Json(_))));
    }
}
