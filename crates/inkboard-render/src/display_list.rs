//! Recording surface.

use crate::surface::{CompositeMode, Surface, TextRun};
use inkboard_core::shapes::RasterImage;
use kurbo::{Affine, BezPath, Rect, Size, Stroke};
use peniko::Color;

/// One recorded surface call.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Clear(Color),
    Fill {
        transform: Affine,
        color: Color,
        path: BezPath,
    },
    Stroke {
        style: Stroke,
        transform: Affine,
        color: Color,
        path: BezPath,
    },
    Text {
        transform: Affine,
        run: TextRun,
    },
    Image {
        transform: Affine,
        dest: Rect,
        alpha: f32,
        image: RasterImage,
    },
    PushLayer {
        mode: CompositeMode,
        alpha: f32,
    },
    PopLayer,
}

/// A [`Surface`] that records commands for later replay or inspection.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    size: Size,
    commands: Vec<DrawCommand>,
    depth: usize,
}

impl DisplayList {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether every pushed layer was popped.
    pub fn is_balanced(&self) -> bool {
        self.depth == 0
    }

    pub fn reset(&mut self) {
        self.commands.clear();
        self.depth = 0;
    }

    /// Replay the recording onto another surface.
    pub fn replay<S: Surface + ?Sized>(&self, target: &mut S) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear(color) => target.clear(*color),
                DrawCommand::Fill { transform, color, path } => target.fill(*transform, *color, path),
                DrawCommand::Stroke {
                    style,
                    transform,
                    color,
                    path,
                } => target.stroke(style, *transform, *color, path),
                DrawCommand::Text { transform, run } => target.draw_text(*transform, run),
                DrawCommand::Image {
                    transform,
                    dest,
                    alpha,
                    image,
                } => target.draw_image(*transform, image, *dest, *alpha),
                DrawCommand::PushLayer { mode, alpha } => target.push_layer(*mode, *alpha),
                DrawCommand::PopLayer => target.pop_layer(),
            }
        }
    }
}

impl Surface for DisplayList {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill(&mut self, transform: Affine, color: Color, path: &BezPath) {
        self.commands.push(DrawCommand::Fill {
            transform,
            color,
            path: path.clone(),
        });
    }

    fn stroke(&mut self, style: &Stroke, transform: Affine, color: Color, path: &BezPath) {
        self.commands.push(DrawCommand::Stroke {
            style: style.clone(),
            transform,
            color,
            path: path.clone(),
        });
    }

    fn draw_text(&mut self, transform: Affine, run: &TextRun) {
        self.commands.push(DrawCommand::Text {
            transform,
            run: run.clone(),
        });
    }

    fn draw_image(&mut self, transform: Affine, image: &RasterImage, dest: Rect, alpha: f32) {
        self.commands.push(DrawCommand::Image {
            transform,
            dest,
            alpha,
            image: image.clone(),
        });
    }

    fn push_layer(&mut self, mode: CompositeMode, alpha: f32) {
        self.depth += 1;
        self.commands.push(DrawCommand::PushLayer { mode, alpha });
    }

    fn pop_layer(&mut self) {
        if self.depth == 0 {
            log::warn!("pop_layer without a matching push_layer");
            return;
        }
        self.depth -= 1;
        self.commands.push(DrawCommand::PopLayer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape;

    #[test]
    fn test_records_and_balances_layers() {
        let mut list = DisplayList::new(Size::new(100.0, 50.0));
        list.clear(Color::WHITE);
        list.push_layer(CompositeMode::SourceOver, 1.0);
        assert!(!list.is_balanced());
        list.fill(Affine::IDENTITY, Color::BLACK, &Rect::new(0.0, 0.0, 1.0, 1.0).to_path(0.1));
        list.pop_layer();
        list.pop_layer();
        assert!(list.is_balanced());
        assert_eq!(list.len(), 4);
        assert_eq!(list.size(), Size::new(100.0, 50.0));
    }

    #[test]
    fn test_replay_copies_commands() {
        let mut list = DisplayList::new(Size::new(10.0, 10.0));
        list.clear(Color::WHITE);
        list.stroke(&Stroke::new(2.0), Affine::IDENTITY, Color::BLACK, &BezPath::new());
        let mut copy = DisplayList::new(Size::new(10.0, 10.0));
        list.replay(&mut copy);
        assert_eq!(copy.len(), 2);
        assert!(matches!(&copy.commands()[1], DrawCommand::Stroke { style, .. } if style.width == 2.0));
    }
}
