//! Drawing surface abstraction.
//!
//! The draw pass never owns a graphics context. It is handed a `Surface`
//! and issues vector commands against it, so a GPU scene builder, a raster
//! backend and the recording [`DisplayList`](crate::DisplayList) are
//! interchangeable.

use inkboard_core::shapes::{FontFamily, RasterImage, TextAlign};
use kurbo::{Affine, BezPath, Point, Size, Stroke};
use peniko::{BlendMode, Color, Compose, Mix};

/// How a layer is combined with what is already on the surface when it is
/// popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    #[default]
    SourceOver,
    /// Clears destination pixels where the layer has coverage.
    DestinationOut,
}

impl CompositeMode {
    pub fn blend_mode(self) -> BlendMode {
        match self {
            CompositeMode::SourceOver => BlendMode::new(Mix::Normal, Compose::SrcOver),
            CompositeMode::DestinationOut => BlendMode::new(Mix::Normal, Compose::DestOut),
        }
    }
}

/// A block of text to lay out inside a box (in the transform's space).
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Top-left corner of the layout box.
    pub origin: Point,
    pub max_width: f64,
    pub font_size: f64,
    pub line_height: f64,
    pub font_family: FontFamily,
    pub bold: bool,
    pub color: Color,
    pub align: TextAlign,
}

/// Target of a render pass.
pub trait Surface {
    /// Size in physical pixels.
    fn size(&self) -> Size;

    fn clear(&mut self, color: Color);

    fn fill(&mut self, transform: Affine, color: Color, path: &BezPath);

    fn stroke(&mut self, style: &Stroke, transform: Affine, color: Color, path: &BezPath);

    fn draw_text(&mut self, transform: Affine, run: &TextRun);

    /// Draw a raster stretched over `dest`.
    fn draw_image(&mut self, transform: Affine, image: &RasterImage, dest: kurbo::Rect, alpha: f32);

    /// Start an offscreen layer. Everything drawn until the matching
    /// [`Surface::pop_layer`] is composited onto the surface in one step.
    fn push_layer(&mut self, mode: CompositeMode, alpha: f32);

    fn pop_layer(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_modes_map_to_compose() {
        assert_eq!(CompositeMode::DestinationOut.blend_mode().compose, Compose::DestOut);
        assert_eq!(CompositeMode::default().blend_mode().compose, Compose::SrcOver);
    }
}
