//! Device media capability.
//!
//! The controller never touches camera hardware directly. It is handed a
//! [`MediaDevices`] implementation that can grant and release streams,
//! so hosts can plug in a native backend and tests a scripted fake.

use super::config::{FacingMode, MediaConstraints};
use super::frame::VideoFrame;
use thiserror::Error;

/// Raw failure reported by the device layer, before classification.
///
/// Variant names follow the failure vocabulary common to media-capture
/// APIs so host bridges can forward them with [`DeviceError::from_name`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("camera access not allowed: {0}")]
    NotAllowed(String),
    #[error("no matching camera device: {0}")]
    NotFound(String),
    #[error("camera could not be started: {0}")]
    NotReadable(String),
    #[error("constraint `{constraint}` cannot be satisfied")]
    Overconstrained { constraint: String },
    #[error("camera start aborted: {0}")]
    Aborted(String),
    #[error("{name}: {message}")]
    Other { name: String, message: String },
}

impl DeviceError {
    /// Maps a named failure (e.g. `"NotAllowedError"`) onto a variant.
    ///
    /// Both current and legacy names are accepted. Anything unrecognised
    /// is kept verbatim in [`DeviceError::Other`].
    pub fn from_name(name: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                DeviceError::NotAllowed(message)
            }
            "NotFoundError" | "DevicesNotFoundError" => DeviceError::NotFound(message),
            "NotReadableError" | "TrackStartError" => DeviceError::NotReadable(message),
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                DeviceError::Overconstrained {
                    constraint: message,
                }
            }
            "AbortError" => DeviceError::Aborted(message),
            other => DeviceError::Other {
                name: other.to_string(),
                message,
            },
        }
    }
}

/// A live media stream granted by the device layer.
#[allow(async_fn_in_trait)]
pub trait MediaStream {
    /// Identifier used in logs and event traces.
    fn id(&self) -> u64;

    /// The camera the device actually opened, when it reports one.
    fn facing(&self) -> Option<FacingMode>;

    /// Resolves once metadata has loaded and playback has started.
    async fn ready(&mut self) -> Result<(), DeviceError>;

    /// Reads the frame currently displayed by the preview.
    fn current_frame(&mut self) -> VideoFrame;

    /// Stops every track, releasing the hardware. Must be idempotent.
    fn stop_tracks(&mut self);

    /// True while any track is still running.
    fn is_live(&self) -> bool;
}

/// Capability for acquiring and releasing camera streams.
#[allow(async_fn_in_trait)]
pub trait MediaDevices {
    /// Stream handle this device hands out.
    type Stream: MediaStream;

    /// Whether the host exposes camera capture at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Requests a stream. Suspends until the device grants or rejects,
    /// including any permission prompt.
    async fn acquire(&mut self, constraints: &MediaConstraints)
        -> Result<Self::Stream, DeviceError>;

    /// Releases a stream by stopping all of its tracks.
    fn release(&mut self, mut stream: Self::Stream) {
        stream.stop_tracks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_current_and_legacy() {
        assert!(matches!(
            DeviceError::from_name("NotAllowedError", "denied"),
            DeviceError::NotAllowed(_)
        ));
        assert!(matches!(
            DeviceError::from_name("PermissionDeniedError", "denied"),
            DeviceError::NotAllowed(_)
        ));
        assert!(matches!(
            DeviceError::from_name("DevicesNotFoundError", ""),
            DeviceError::NotFound(_)
        ));
        assert!(matches!(
            DeviceError::from_name("TrackStartError", ""),
            DeviceError::NotReadable(_)
        ));
        assert_eq!(
            DeviceError::from_name("OverconstrainedError", "width"),
            DeviceError::Overconstrained {
                constraint: "width".into()
            }
        );
    }

    #[test]
    fn test_from_name_unknown_is_kept() {
        let err = DeviceError::from_name("TypeError", "bad call");
        assert_eq!(err.to_string(), "TypeError: bad call");
    }
}
