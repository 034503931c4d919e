//! Camera devices, requests and frames.
//!
//! This module holds everything on the device side of the capture
//! controller: the [`MediaDevices`] capability, the error taxonomy that
//! device failures are classified into, request/config types, and the
//! frame types that flow out of a session.

mod config;
mod device;
mod error;
mod fake;
mod frame;
#[cfg(feature = "camera")]
mod native;

pub use config::{
    AnalysisConfig, CameraRequest, CaptureConfig, ConfigError, FacingMode, FileConfig,
    ImageEncoding, MediaConstraints, Resolution, StorageConfig,
};
pub use device::{DeviceError, MediaDevices, MediaStream};
pub use error::{CameraError, CaptureErrorKind, Recovery};
pub use fake::{DeviceEvent, FakeDevices, FakeOutcome, FakeStream};
pub use frame::{CapturedFrame, FrameSource, VideoFrame, BYTES_PER_PIXEL};
#[cfg(feature = "camera")]
pub use native::{NativeDevices, NativeStream};
