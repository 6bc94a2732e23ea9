//! PNG export with transparent-margin cropping.

use crate::renderer::{RenderResult, RendererError};

/// Tightly packed, non-premultiplied RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> RenderResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RendererError::InvalidBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// A fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn full_region(&self) -> PixelRegion {
        PixelRegion {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }

    fn alpha(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize * self.width as usize + x as usize) * 4 + 3]
    }

    /// Copy out a sub-rectangle. The region is clamped to the buffer.
    pub fn crop(&self, region: PixelRegion) -> PixelBuffer {
        let x0 = region.x.min(self.width);
        let y0 = region.y.min(self.height);
        let x1 = region.x.saturating_add(region.width).min(self.width);
        let y1 = region.y.saturating_add(region.height).min(self.height);
        let row_len = (x1 - x0) as usize * 4;
        let mut data = Vec::with_capacity(row_len * (y1 - y0) as usize);
        for y in y0..y1 {
            let start = (y as usize * self.width as usize + x0 as usize) * 4;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }
        PixelBuffer {
            width: x1 - x0,
            height: y1 - y0,
            data,
        }
    }
}

/// Integer pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A surface whose pixels can be read back.
pub trait PixelReader {
    /// Read the whole surface. Backends that cannot read back (tainted or
    /// GPU-only targets) return [`RendererError::CapabilityUnavailable`].
    fn read_pixels(&self) -> RenderResult<PixelBuffer>;
}

impl PixelReader for PixelBuffer {
    fn read_pixels(&self) -> RenderResult<PixelBuffer> {
        Ok(self.clone())
    }
}

/// Smallest region containing every pixel with nonzero alpha, grown by
/// `padding` and clamped to the buffer. `None` for a blank buffer.
pub fn content_region(pixels: &PixelBuffer, padding: u32) -> Option<PixelRegion> {
    let mut min = (u32::MAX, u32::MAX);
    let mut max = (0, 0);
    let mut found = false;
    for y in 0..pixels.height {
        for x in 0..pixels.width {
            if pixels.alpha(x, y) > 0 {
                found = true;
                min = (min.0.min(x), min.1.min(y));
                max = (max.0.max(x), max.1.max(y));
            }
        }
    }
    if !found {
        return None;
    }
    let x0 = min.0.saturating_sub(padding);
    let y0 = min.1.saturating_sub(padding);
    let x1 = max.0.saturating_add(padding + 1).min(pixels.width);
    let y1 = max.1.saturating_add(padding + 1).min(pixels.height);
    Some(PixelRegion {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    })
}

/// Read the surface and crop it to its content.
///
/// When pixels cannot be read the whole surface is exported instead, so
/// export degrades rather than fails. A blank surface is also exported
/// whole.
pub fn crop_to_content<R: PixelReader + ?Sized>(reader: &R, full: PixelRegion, padding: u32) -> PixelRegion {
    match reader.read_pixels() {
        Ok(pixels) => content_region(&pixels, padding).unwrap_or(full),
        Err(RendererError::CapabilityUnavailable(reason)) => {
            log::warn!("Pixel readback unavailable ({reason}), exporting full surface");
            full
        }
        Err(e) => {
            log::warn!("Pixel readback failed: {e}, exporting full surface");
            full
        }
    }
}

/// Encode RGBA pixels as PNG.
pub fn encode_png(pixels: &PixelBuffer) -> RenderResult<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, pixels.width, pixels.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RendererError::Encode(e.to_string()))?;
        writer
            .write_image_data(&pixels.data)
            .map_err(|e| RendererError::Encode(e.to_string()))?;
    }
    Ok(out)
}

/// Read, crop to content, and encode in one step.
pub fn export_png<R: PixelReader + ?Sized>(reader: &R, padding: u32) -> RenderResult<Vec<u8>> {
    let pixels = reader.read_pixels()?;
    let region = content_region(&pixels, padding).unwrap_or(pixels.full_region());
    encode_png(&pixels.crop(region))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tainted;

    impl PixelReader for Tainted {
        fn read_pixels(&self) -> RenderResult<PixelBuffer> {
            Err(RendererError::CapabilityUnavailable("cross-origin image".into()))
        }
    }

    fn with_dot(width: u32, height: u32, x: u32, y: u32) -> PixelBuffer {
        let mut pixels = PixelBuffer::transparent(width, height);
        let i = ((y * width + x) * 4) as usize;
        pixels.data[i..i + 4].copy_from_slice(&[255, 0, 0, 255]);
        pixels
    }

    #[test]
    fn test_content_region_pads_and_clamps() {
        let pixels = with_dot(20, 10, 3, 4);
        assert_eq!(
            content_region(&pixels, 2),
            Some(PixelRegion { x: 1, y: 2, width: 5, height: 5 })
        );
        assert_eq!(
            content_region(&pixels, 10),
            Some(PixelRegion { x: 0, y: 0, width: 14, height: 10 })
        );
        assert_eq!(content_region(&PixelBuffer::transparent(4, 4), 0), None);
    }

    #[test]
    fn test_unreadable_surface_falls_back_to_full() {
        let full = PixelRegion { x: 0, y: 0, width: 64, height: 48 };
        assert_eq!(crop_to_content(&Tainted, full, 8), full);
    }

    #[test]
    fn test_crop_copies_rows() {
        let pixels = with_dot(8, 8, 5, 6);
        let cropped = pixels.crop(PixelRegion { x: 5, y: 6, width: 1, height: 1 });
        assert_eq!(cropped.data, vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_buffer_length_is_checked() {
        assert!(matches!(
            PixelBuffer::new(2, 2, vec![0; 15]),
            Err(RendererError::InvalidBuffer { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_export_png_signature() {
        let png = export_png(&with_dot(16, 16, 8, 8), 1).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        assert!(export_png(&Tainted, 0).is_err());
    }
}
