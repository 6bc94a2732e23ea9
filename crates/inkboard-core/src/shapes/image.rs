//! Owned raster payloads for image objects and the board background.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

/// Raster decoding errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed data URL: {0}")]
    DataUrl(String),
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),
}

/// An encoded raster image with its natural pixel size.
///
/// The encoded bytes are shared, so cloning an image object (copy/paste,
/// history snapshots) never duplicates the payload.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RasterPayload", try_from = "RasterPayload")]
pub struct RasterImage {
    mime: String,
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
}

/// JSON form of a raster: a data URL plus its natural size.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RasterPayload {
    data_url: String,
    width: u32,
    height: u32,
}

impl RasterImage {
    /// Decode encoded image bytes (PNG, JPEG or WebP) to validate them and
    /// learn their natural size.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let format = image::guess_format(bytes)?;
        let (width, height) =
            image::ImageReader::with_format(Cursor::new(bytes), format).into_dimensions()?;
        Ok(Self {
            mime: format.to_mime_type().to_string(),
            bytes: Arc::from(bytes),
            width,
            height,
        })
    }

    /// Build from already-validated parts.
    pub fn from_parts(mime: impl Into<String>, bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            mime: mime.into(),
            bytes: Arc::from(bytes),
            width,
            height,
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URL without decoding pixels.
    pub fn from_data_url(url: &str, width: u32, height: u32) -> Result<Self, DecodeError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| DecodeError::DataUrl("missing data: prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| DecodeError::DataUrl("missing payload separator".to_string()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| DecodeError::DataUrl(format!("unsupported encoding in {header:?}")))?;
        let bytes = BASE64.decode(payload.trim())?;
        Ok(Self::from_parts(mime, bytes, width, height))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Natural height divided by natural width (1.0 for empty images).
    pub fn aspect_ratio(&self) -> f64 {
        if self.width == 0 {
            1.0
        } else {
            f64::from(self.height) / f64::from(self.width)
        }
    }
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl From<RasterImage> for RasterPayload {
    fn from(image: RasterImage) -> Self {
        Self {
            data_url: image.to_data_url(),
            width: image.width,
            height: image.height,
        }
    }
}

impl TryFrom<RasterPayload> for RasterImage {
    type Error = DecodeError;

    fn try_from(payload: RasterPayload) -> Result<Self, Self::Error> {
        Self::from_data_url(&payload.data_url, payload.width, payload.height)
    }
}
