//! Gallery upload.
//!
//! The camera-free path: a picked file is accepted as-is if it is an
//! image, and becomes a [`CapturedFrame`] without touching any device.
//! Any container `image` can sniff and read a header from is accepted
//! (JPEG, PNG, GIF, WebP, BMP with the enabled codecs).

use crate::capture::{CapturedFrame, FrameSource};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Errors from reading a picked file.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file data")]
    Empty,
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("not a supported image: {0}")]
    NotAnImage(String),
    #[error("image has zero width or height")]
    EmptyImage,
}

/// Accepts raw bytes from the file picker.
pub fn from_bytes(bytes: Vec<u8>) -> Result<CapturedFrame, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }

    let format = image::guess_format(&bytes).map_err(|e| UploadError::NotAnImage(e.to_string()))?;

    // Sniffed but without a decoder compiled in fails here
    let (width, height) = image::ImageReader::with_format(Cursor::new(&bytes), format)
        .into_dimensions()
        .map_err(|e| UploadError::NotAnImage(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(UploadError::EmptyImage);
    }

    tracing::info!(width, height, ?format, bytes = bytes.len(), "Accepted gallery image");
    Ok(CapturedFrame::new(
        bytes,
        width,
        height,
        format,
        FrameSource::Gallery,
    ))
}

/// Reads and accepts a file from disk.
pub fn from_path(path: impl AsRef<Path>) -> Result<CapturedFrame, UploadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| UploadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let raster = RgbaImage::new(width, height);
        let mut bytes = Vec::new();
        image::codecs::png::PngEncoder::new(&mut bytes)
            .write_image(
                raster.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgba8,
            )
            .unwrap();
        bytes
    }

    fn webp_bytes(width: u32, height: u32) -> Vec<u8> {
        let raster = RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
        let mut bytes = Vec::new();
        image::codecs::webp::WebPEncoder::new_lossless(&mut bytes)
            .write_image(raster.as_raw(), width, height, ExtendedColorType::Rgba8)
            .unwrap();
        bytes
    }

    fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
        let raster = RgbaImage::from_pixel(width, height, image::Rgba([40, 200, 40, 255]));
        let mut bytes = Vec::new();
        {
            // Trailer is written when the encoder drops
            let mut encoder = image::codecs::gif::GifEncoder::new(&mut bytes);
            encoder
                .encode(raster.as_raw(), width, height, ExtendedColorType::Rgba8)
                .unwrap();
        }
        bytes
    }

    #[test]
    fn test_png_passes_through_unchanged() {
        let bytes = png_bytes(3, 2);
        let frame = from_bytes(bytes.clone()).unwrap();

        assert_eq!(frame.bytes(), bytes.as_slice());
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(frame.format(), ImageFormat::Png);
        assert_eq!(frame.mime_type(), "image/png");
        assert_eq!(frame.source(), FrameSource::Gallery);
    }

    #[test]
    fn test_accepts_webp() {
        let bytes = webp_bytes(5, 3);
        let frame = from_bytes(bytes.clone()).unwrap();

        assert_eq!(frame.format(), ImageFormat::WebP);
        assert_eq!(frame.mime_type(), "image/webp");
        assert_eq!((frame.width(), frame.height()), (5, 3));
        assert_eq!(frame.bytes(), bytes.as_slice());
    }

    #[test]
    fn test_accepts_gif() {
        let bytes = gif_bytes(4, 6);
        let frame = from_bytes(bytes.clone()).unwrap();

        assert_eq!(frame.format(), ImageFormat::Gif);
        assert_eq!(frame.mime_type(), "image/gif");
        assert_eq!((frame.width(), frame.height()), (4, 6));
        assert_eq!(frame.bytes(), bytes.as_slice());
    }

    #[test]
    fn test_truncated_image_is_rejected() {
        let mut bytes = gif_bytes(4, 4);
        bytes.truncate(8);
        assert!(matches!(from_bytes(bytes), Err(UploadError::NotAnImage(_))));
    }

    #[test]
    fn test_rejects_empty_and_non_images() {
        assert!(matches!(from_bytes(Vec::new()), Err(UploadError::Empty)));
        assert!(matches!(
            from_bytes(b"hello, not an image".to_vec()),
            Err(UploadError::NotAnImage(_))
        ));
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.png");
        std::fs::write(&path, png_bytes(4, 4)).unwrap();

        let frame = from_path(&path).unwrap();
        assert_eq!(frame.width(), 4);

        let missing = from_path(dir.path().join("missing.png"));
        assert!(matches!(missing, Err(UploadError::Read { .. })));
    }
}
