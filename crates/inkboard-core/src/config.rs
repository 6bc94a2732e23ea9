//! Engine tuning knobs.

use serde::{Deserialize, Serialize};

/// Tunable constants of the interaction engine.
///
/// Pixel quantities are screen pixels and are divided by the current view
/// scale before being compared against world geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub stroke_hit_tolerance_px: f64,
    /// Half-extent of the square handle hit boxes.
    pub handle_hit_px: f64,
    pub rotate_handle_offset_px: f64,
    /// Points closer than this (world units) to the previous point are dropped.
    pub min_point_distance: f64,
    /// Shape drafts smaller than this on both axes are discarded.
    pub min_shape_size: f64,
    pub paste_offset: f64,
    pub wheel_zoom_step: f64,
    /// Participant may erase objects; entities it creates are annotations.
    pub privileged: bool,
    /// Restricted eraser that only removes annotation entities.
    pub eraser_annotations_only: bool,
    pub show_grid: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.2,
            max_scale: 5.0,
            stroke_hit_tolerance_px: 6.0,
            handle_hit_px: 10.0,
            rotate_handle_offset_px: 28.0,
            min_point_distance: 2.0,
            min_shape_size: 2.0,
            paste_offset: 20.0,
            wheel_zoom_step: 1.1,
            privileged: false,
            eraser_annotations_only: false,
            show_grid: true,
        }
    }
}

impl EngineConfig {
    /// Load a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"maxScale": 8, "privileged": true}"#).unwrap();
        assert_eq!(config.max_scale, 8.0);
        assert!(config.privileged);
        assert_eq!(config.min_scale, 0.2);
        assert_eq!(config.stroke_hit_tolerance_px, 6.0);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_invalid_json_errors() {
        assert!(EngineConfig::from_json("{\"minScale\": \"small\"}").is_err());
    }
}
