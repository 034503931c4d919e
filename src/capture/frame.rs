//! Frame types: the live video frame a stream exposes, and the encoded
//! image that leaves the scan flow.

use super::config::FacingMode;
use image::ImageFormat;
use std::time::Instant;

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// The current frame of a live video stream.
///
/// Pixels are tightly packed RGBA8, row-major. A stream whose metadata
/// has not loaded reports zero width or height.
#[derive(Clone)]
pub struct VideoFrame {
    /// Raw RGBA pixel data.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Time the frame was read from the stream.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl VideoFrame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// A frame with no decodable content.
    pub fn empty(sequence: u64) -> Self {
        Self::new(Vec::new(), 0, 0, sequence)
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consumes the frame, returning its pixel buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// True when both dimensions are non-zero.
    #[inline]
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count() * BYTES_PER_PIXEL
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

/// Where a [`CapturedFrame`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    /// Snapshot of a live camera stream.
    Camera { facing: FacingMode, mirrored: bool },
    /// File picked from the gallery, passed through unchanged.
    Gallery,
}

/// An encoded still image handed to the navigator.
///
/// Immutable once produced.
#[derive(Clone)]
pub struct CapturedFrame {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    format: ImageFormat,
    source: FrameSource,
}

impl CapturedFrame {
    pub fn new(
        bytes: Vec<u8>,
        width: u32,
        height: u32,
        format: ImageFormat,
        source: FrameSource,
    ) -> Self {
        Self {
            bytes,
            width,
            height,
            format,
            source,
        }
    }

    /// Encoded image bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Container format of [`bytes`](Self::bytes).
    #[inline]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    #[inline]
    pub fn source(&self) -> FrameSource {
        self.source
    }

    /// Content address of the encoded bytes (BLAKE3, hex).
    pub fn digest(&self) -> String {
        blake3::hash(&self.bytes).to_hex().to_string()
    }
}

impl std::fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("source", &self.source)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let pixels = vec![0u8; 64 * 48 * BYTES_PER_PIXEL];
        let frame = VideoFrame::new(pixels, 64, 48, 1);

        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.has_dimensions());
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        let frame = VideoFrame::new(vec![0u8; 100], 64, 48, 1);
        assert!(!frame.is_valid());
    }

    #[test]
    fn test_empty_frame_has_no_dimensions() {
        let frame = VideoFrame::empty(0);
        assert!(!frame.has_dimensions());
        assert!(frame.is_valid());
    }

    #[test]
    fn test_digest_is_stable() {
        let a = CapturedFrame::new(vec![1, 2, 3], 1, 1, ImageFormat::Png, FrameSource::Gallery);
        let b = CapturedFrame::new(vec![1, 2, 3], 1, 1, ImageFormat::Png, FrameSource::Gallery);
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }
}
