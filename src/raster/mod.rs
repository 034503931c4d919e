//! Off-screen frame buffer.
//!
//! Copies a live video frame into an owned raster at its native size,
//! mirrors it for front cameras, and encodes it to a compressed image.

use crate::capture::{ImageEncoding, VideoFrame};
use image::{imageops, DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

/// Errors from drawing or encoding a frame.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("frame has zero width or height")]
    EmptyFrame,
    #[error("pixel buffer is {actual} bytes, expected {expected} for {width}x{height}")]
    BufferMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Draws `frame` into a new raster of the same dimensions.
///
/// With `mirror` set, each row is reversed left-to-right.
pub fn render_frame(frame: &VideoFrame, mirror: bool) -> Result<RgbaImage, RasterError> {
    if !frame.has_dimensions() {
        return Err(RasterError::EmptyFrame);
    }

    let expected = frame.pixel_count() * crate::capture::BYTES_PER_PIXEL;
    let buffer = RgbaImage::from_raw(frame.width(), frame.height(), frame.pixels().to_vec())
        .ok_or(RasterError::BufferMismatch {
            width: frame.width(),
            height: frame.height(),
            expected,
            actual: frame.pixels().len(),
        })?;

    Ok(if mirror {
        imageops::flip_horizontal(&buffer)
    } else {
        buffer
    })
}

/// Encodes a raster. JPEG drops the alpha channel.
pub fn encode(
    raster: &RgbaImage,
    encoding: ImageEncoding,
    jpeg_quality: u8,
) -> Result<Vec<u8>, RasterError> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);

    match encoding {
        ImageEncoding::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(raster.clone()).to_rgb8();
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, jpeg_quality);
            encoder.write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
        ImageEncoding::Png => {
            let encoder = image::codecs::png::PngEncoder::new(&mut cursor);
            encoder.write_image(
                raster.as_raw(),
                raster.width(),
                raster.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
    }

    tracing::trace!(
        width = raster.width(),
        height = raster.height(),
        bytes = buffer.len(),
        ?encoding,
        "Encoded frame"
    );
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: [u8; 4] = [255, 0, 0, 255];
    const B: [u8; 4] = [0, 255, 0, 255];
    const C: [u8; 4] = [0, 0, 255, 255];
    const D: [u8; 4] = [255, 255, 255, 255];

    fn two_by_two() -> VideoFrame {
        VideoFrame::new([A, B, C, D].concat(), 2, 2, 1)
    }

    #[test]
    fn test_front_camera_mirrors_rows() {
        let raster = render_frame(&two_by_two(), true).unwrap();
        assert_eq!(raster.as_raw(), &[B, A, D, C].concat());
    }

    #[test]
    fn test_back_camera_keeps_orientation() {
        let raster = render_frame(&two_by_two(), false).unwrap();
        assert_eq!(raster.as_raw(), &[A, B, C, D].concat());
    }

    #[test]
    fn test_raster_matches_native_size() {
        let frame = VideoFrame::new(vec![7u8; 5 * 3 * 4], 5, 3, 1);
        let raster = render_frame(&frame, true).unwrap();
        assert_eq!(raster.dimensions(), (5, 3));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let frame = VideoFrame::new(Vec::new(), 0, 10, 1);
        assert!(matches!(render_frame(&frame, false), Err(RasterError::EmptyFrame)));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let frame = VideoFrame::new(vec![0u8; 3], 2, 2, 1);
        assert!(matches!(
            render_frame(&frame, false),
            Err(RasterError::BufferMismatch { expected: 16, actual: 3, .. })
        ));
    }

    #[test]
    fn test_png_is_lossless() {
        let raster = render_frame(&two_by_two(), true).unwrap();
        let bytes = encode(&raster, ImageEncoding::Png, 92).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_jpeg_keeps_dimensions() {
        let frame = VideoFrame::new(vec![90u8; 16 * 8 * 4], 16, 8, 1);
        let raster = render_frame(&frame, false).unwrap();
        let bytes = encode(&raster, ImageEncoding::Jpeg, 80).unwrap();

        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }
}
