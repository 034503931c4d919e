//! Native camera backend over `nokhwa`.
//!
//! Facing modes map to configured device indices since desktop backends
//! do not report which way a camera points. Frames are decoded as RGB
//! and widened to RGBA.

use super::config::{CaptureConfig, FacingMode, MediaConstraints};
use super::device::{DeviceError, MediaDevices, MediaStream};
use super::frame::{VideoFrame, BYTES_PER_PIXEL};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::{Camera, NokhwaError};

/// [`MediaDevices`] backed by the platform camera API.
pub struct NativeDevices {
    front_index: u32,
    back_index: u32,
    next_stream: u64,
}

impl NativeDevices {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            front_index: config.front_device_index,
            back_index: config.back_device_index,
            next_stream: 1,
        }
    }

    fn index_for(&self, facing: Option<FacingMode>) -> (u32, FacingMode) {
        match facing {
            Some(FacingMode::Front) => (self.front_index, FacingMode::Front),
            Some(FacingMode::Back) => (self.back_index, FacingMode::Back),
            // Unconstrained: first device, which is the built-in webcam on laptops
            None => (0, FacingMode::Front),
        }
    }
}

impl MediaDevices for NativeDevices {
    type Stream = NativeStream;

    fn is_supported(&self) -> bool {
        nokhwa::native_api_backend().is_some()
    }

    async fn acquire(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<NativeStream, DeviceError> {
        let (index, facing) = self.index_for(constraints.facing);

        let format_type = match (constraints.ideal_width, constraints.ideal_height) {
            (Some(width), Some(height)) => {
                RequestedFormatType::HighestResolution(Resolution::new(width, height))
            }
            _ => RequestedFormatType::AbsoluteHighestFrameRate,
        };
        let requested = RequestedFormat::new::<RgbFormat>(format_type);

        let mut camera =
            Camera::new(CameraIndex::Index(index), requested).map_err(classify_nokhwa)?;
        camera.open_stream().map_err(classify_nokhwa)?;

        let id = self.next_stream;
        self.next_stream += 1;
        tracing::info!(stream = id, device = index, %facing, "Native camera stream opened");

        Ok(NativeStream {
            id,
            facing,
            camera,
            live: true,
            sequence: 0,
        })
    }
}

/// A running `nokhwa` stream.
pub struct NativeStream {
    id: u64,
    facing: FacingMode,
    camera: Camera,
    live: bool,
    sequence: u64,
}

impl MediaStream for NativeStream {
    fn id(&self) -> u64 {
        self.id
    }

    fn facing(&self) -> Option<FacingMode> {
        Some(self.facing)
    }

    async fn ready(&mut self) -> Result<(), DeviceError> {
        // A decodable first frame stands in for "metadata loaded"
        let buffer = self.camera.frame().map_err(classify_nokhwa)?;
        buffer
            .decode_image::<RgbFormat>()
            .map(|_| ())
            .map_err(classify_nokhwa)
    }

    fn current_frame(&mut self) -> VideoFrame {
        self.sequence += 1;
        let decoded = match self
            .camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>())
        {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(stream = self.id, error = %e, "Failed to read camera frame");
                return VideoFrame::empty(self.sequence);
            }
        };

        let (width, height) = (decoded.width(), decoded.height());
        let rgb = decoded.into_raw();
        let mut rgba = Vec::with_capacity(rgb.len() / 3 * BYTES_PER_PIXEL);
        for px in rgb.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        VideoFrame::new(rgba, width, height, self.sequence)
    }

    fn stop_tracks(&mut self) {
        if !self.live {
            return;
        }
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!(stream = self.id, error = %e, "Failed to stop camera stream");
        }
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for NativeStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

/// Maps backend failures onto the device vocabulary.
///
/// `nokhwa` reports most failures as free-form strings, so the
/// distinction between permission, busy and missing devices is textual.
fn classify_nokhwa(error: NokhwaError) -> DeviceError {
    let message = error.to_string();
    let lower = message.to_ascii_lowercase();

    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized")
    {
        DeviceError::NotAllowed(message)
    } else if lower.contains("busy") || lower.contains("in use") {
        DeviceError::NotReadable(message)
    } else if lower.contains("no such device")
        || lower.contains("not found")
        || lower.contains("could not open device")
    {
        DeviceError::NotFound(message)
    } else if lower.contains("format") || lower.contains("resolution") {
        DeviceError::Overconstrained {
            constraint: message,
        }
    } else {
        DeviceError::Other {
            name: "NokhwaError".to_string(),
            message,
        }
    }
}
