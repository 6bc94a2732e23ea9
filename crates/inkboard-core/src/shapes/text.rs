//! Text payload shared by text, sticky and link objects.

use super::SerializableColor;
use serde::{Deserialize, Serialize};

/// Font family options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    #[default]
    SansSerif,
    Serif,
    Monospace,
    Handwriting,
}

impl FontFamily {
    /// Get the font family name as used by the renderer.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::SansSerif => "sans-serif",
            FontFamily::Serif => "serif",
            FontFamily::Monospace => "monospace",
            FontFamily::Handwriting => "cursive",
        }
    }
}

/// Horizontal text alignment inside the object box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Editable text carried by text-bearing objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub font_family: FontFamily,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub text_color: SerializableColor,
    #[serde(default)]
    pub text_align: TextAlign,
}

fn default_font_size() -> f64 {
    TextContent::DEFAULT_FONT_SIZE
}

impl TextContent {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Line height used for layout and editor overlays.
    pub fn line_height(&self) -> f64 {
        self.font_size * 1.25
    }

    /// Number of rendered lines (an empty string still occupies one).
    pub fn line_count(&self) -> usize {
        self.text.lines().count().max(1)
    }
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            bold: false,
            text_color: SerializableColor::black(),
            text_align: TextAlign::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let content: TextContent = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(content.text, "hi");
        assert!((content.font_size - TextContent::DEFAULT_FONT_SIZE).abs() < f64::EPSILON);
        assert_eq!(content.text_align, TextAlign::Left);
    }

    #[test]
    fn test_line_count() {
        assert_eq!(TextContent::new("").line_count(), 1);
        assert_eq!(TextContent::new("a\nb\nc").line_count(), 3);
    }
}
