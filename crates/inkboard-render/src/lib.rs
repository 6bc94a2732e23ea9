//! Inkboard Render Library
//!
//! Draws an inkboard scene onto any [`Surface`]: grid, background,
//! objects, a composited stroke layer, pending ink and the selection
//! overlay. Also crops and encodes PNG exports.

pub mod display_list;
pub mod export;
pub mod renderer;
pub mod surface;

pub use display_list::{DisplayList, DrawCommand};
pub use export::{PixelBuffer, PixelReader, PixelRegion, content_region, crop_to_content, encode_png, export_png};
pub use renderer::{GridStyle, RenderContext, RenderResult, RendererError, render, render_object, render_stroke};
pub use surface::{CompositeMode, Surface, TextRun};
