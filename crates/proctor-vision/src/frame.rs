//! Decoded webcam frames.

use image::RgbImage;
use tracing::debug;

use crate::error::{VisionError, VisionResult};

/// A single still frame plus the storage handle it was persisted under.
///
/// The raster is absent when the stored bytes are not a decodable image.
/// Such a frame still has a handle, but every check that needs pixels sees
/// [`VisionError::UnreadableFrame`].
#[derive(Debug, Clone)]
pub struct Frame {
    handle: String,
    image: Option<RgbImage>,
}

impl Frame {
    /// Wrap an already decoded raster.
    pub fn from_image(handle: impl Into<String>, image: RgbImage) -> Self {
        Self {
            handle: handle.into(),
            image: Some(image),
        }
    }

    /// A frame whose bytes could not be resolved at all.
    pub fn missing(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            image: None,
        }
    }

    /// Decode encoded image bytes (PNG, JPEG, ...).
    pub fn decode(handle: impl Into<String>, bytes: &[u8]) -> Self {
        let handle = handle.into();
        let image = match image::load_from_memory(bytes) {
            Ok(decoded) => Some(decoded.to_rgb8()),
            Err(e) => {
                debug!(handle = %handle, error = %e, "Frame bytes are not a decodable image");
                None
            }
        };
        Self { handle, image }
    }

    /// Storage handle of this frame.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Decoded RGB raster.
    pub fn raster(&self) -> VisionResult<&RgbImage> {
        self.image
            .as_ref()
            .ok_or_else(|| VisionError::unreadable(&self.handle))
    }

    pub fn is_readable(&self) -> bool {
        self.image.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png_roundtrip() {
        let image = RgbImage::from_fn(4, 3, |x, y| image::Rgb([x as u8 * 10, y as u8 * 20, 7]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image.clone())
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();

        let frame = Frame::decode("a.png", &bytes);
        assert!(frame.is_readable());
        assert_eq!(frame.raster().unwrap(), &image);
        assert_eq!(frame.handle(), "a.png");
    }

    #[test]
    fn test_garbage_bytes_are_unreadable() {
        let frame = Frame::decode("junk.bin", b"not an image");
        assert!(!frame.is_readable());
        assert!(matches!(frame.raster(), Err(VisionError::UnreadableFrame(h)) if h == "junk.bin"));
    }
}
