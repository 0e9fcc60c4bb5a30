//! Image decode capability.
//!
//! The coordinator consumes this seam to turn raw encoded bytes into pixels
//! before handing them to the detector. [`StdImageDecoder`] is the bundled
//! implementation backed by the `image` crate.

use thiserror::Error;

/// A decoded grayscale image, ready for the detector capability.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    /// Grayscale pixel data (width * height bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unsupported or corrupt image data: {0}")]
    Invalid(String),
}

/// Capability that decodes raw encoded image bytes into pixels.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, DecodeError>;
}

/// Decoder backed by the `image` crate (PNG, JPEG, and friends).
///
/// Decodes to grayscale: the detector capability works on luminance only.
pub struct StdImageDecoder;

impl ImageDecoder for StdImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| DecodeError::Invalid(e.to_string()))?;
        let gray = decoded.to_luma8();
        let (width, height) = gray.dimensions();
        Ok(PixelBuffer {
            data: gray.into_raw(),
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_png_round_trip() {
        let img = image::GrayImage::from_pixel(4, 2, image::Luma([128u8]));
        let mut encoded = Vec::new();
        img.write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();

        let pixels = StdImageDecoder.decode(&encoded).unwrap();
        assert_eq!(pixels.width, 4);
        assert_eq!(pixels.height, 2);
        assert_eq!(pixels.data.len(), 8);
        assert!(pixels.data.iter().all(|&p| p == 128));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = StdImageDecoder.decode(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(result, Err(DecodeError::Invalid(_))));
    }

    #[test]
    fn test_decode_empty_fails() {
        assert!(StdImageDecoder.decode(&[]).is_err());
    }
}
