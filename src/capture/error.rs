//! Capture error taxonomy.
//!
//! Every device-layer failure is converted into one of a fixed set of
//! kinds at the acquisition boundary. Each kind carries a user-facing
//! message and a recovery path; none of them is fatal.

use super::device::DeviceError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Classified failure kinds surfaced by the capture controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureErrorKind {
    PermissionDenied,
    DeviceNotFound,
    DeviceBusy,
    UnsatisfiableConstraints,
    CaptureFailed,
    Unknown,
}

impl CaptureErrorKind {
    /// All kinds, in table order.
    pub const ALL: [CaptureErrorKind; 6] = [
        CaptureErrorKind::PermissionDenied,
        CaptureErrorKind::DeviceNotFound,
        CaptureErrorKind::DeviceBusy,
        CaptureErrorKind::UnsatisfiableConstraints,
        CaptureErrorKind::CaptureFailed,
        CaptureErrorKind::Unknown,
    ];

    /// Classifies a raw device failure.
    pub fn classify(error: &DeviceError) -> Self {
        match error {
            DeviceError::NotAllowed(_) => CaptureErrorKind::PermissionDenied,
            DeviceError::NotFound(_) => CaptureErrorKind::DeviceNotFound,
            DeviceError::NotReadable(_) | DeviceError::Aborted(_) => CaptureErrorKind::DeviceBusy,
            DeviceError::Overconstrained { .. } => CaptureErrorKind::UnsatisfiableConstraints,
            DeviceError::Other { .. } => CaptureErrorKind::Unknown,
        }
    }

    /// Human-readable message shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            CaptureErrorKind::PermissionDenied => {
                "Camera access was denied. Allow camera permission in your settings or upload a photo from the gallery."
            }
            CaptureErrorKind::DeviceNotFound => {
                "No camera found on this device. Please upload a photo from the gallery."
            }
            CaptureErrorKind::DeviceBusy => {
                "The camera is being used by another app. Close other apps using the camera and try again."
            }
            CaptureErrorKind::UnsatisfiableConstraints => {
                "This camera does not support the requested settings."
            }
            CaptureErrorKind::CaptureFailed => {
                "Unable to capture photo. Wait for the preview to start and try again."
            }
            CaptureErrorKind::Unknown => "Unable to access the camera. Please try again.",
        }
    }

    /// What the user can do next.
    pub fn recovery(self) -> Recovery {
        match self {
            CaptureErrorKind::PermissionDenied => Recovery::ChangePermissionOrUpload,
            CaptureErrorKind::DeviceNotFound => Recovery::UploadOnly,
            CaptureErrorKind::DeviceBusy => Recovery::CloseOtherAppsAndRetry,
            CaptureErrorKind::UnsatisfiableConstraints => Recovery::RetryRelaxed,
            CaptureErrorKind::CaptureFailed => Recovery::RetryCapture,
            CaptureErrorKind::Unknown => Recovery::Retry,
        }
    }

    /// Only unsatisfiable constraints earn an automatic fallback attempt.
    #[inline]
    pub fn allows_relaxed_retry(self) -> bool {
        matches!(self, CaptureErrorKind::UnsatisfiableConstraints)
    }

    /// Stable label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureErrorKind::PermissionDenied => "permission_denied",
            CaptureErrorKind::DeviceNotFound => "device_not_found",
            CaptureErrorKind::DeviceBusy => "device_busy",
            CaptureErrorKind::UnsatisfiableConstraints => "unsatisfiable_constraints",
            CaptureErrorKind::CaptureFailed => "capture_failed",
            CaptureErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CaptureErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recovery path offered alongside an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    /// Ask the user to grant permission; gallery upload stays available.
    ChangePermissionOrUpload,
    /// No camera: gallery upload is the only way forward.
    UploadOnly,
    CloseOtherAppsAndRetry,
    /// Handled internally by the single relaxed fallback.
    RetryRelaxed,
    /// Session stays open; capture can be pressed again.
    RetryCapture,
    Retry,
}

impl Recovery {
    /// Whether "open camera" is worth offering again.
    pub fn allows_retry(self) -> bool {
        !matches!(self, Recovery::UploadOnly)
    }

    /// Whether the gallery upload should be highlighted.
    pub fn offers_gallery(self) -> bool {
        matches!(
            self,
            Recovery::ChangePermissionOrUpload | Recovery::UploadOnly
        )
    }
}

/// A classified capture failure as stored in `last_error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CameraError {
    kind: CaptureErrorKind,
    message: String,
    #[source]
    cause: Option<DeviceError>,
}

impl CameraError {
    /// Error of the given kind with its standard message.
    pub fn new(kind: CaptureErrorKind) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            cause: None,
        }
    }

    /// Error of the given kind with a custom message.
    pub fn with_message(kind: CaptureErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Classifies a device failure, keeping it as the source.
    pub fn from_device(error: DeviceError) -> Self {
        let kind = CaptureErrorKind::classify(&error);
        Self {
            kind,
            message: kind.message().to_string(),
            cause: Some(error),
        }
    }

    /// Reclassifies while keeping the underlying cause.
    pub(crate) fn reclassified(self, kind: CaptureErrorKind) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            cause: self.cause,
        }
    }

    #[inline]
    pub fn kind(&self) -> CaptureErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn recovery(&self) -> Recovery {
        self.kind.recovery()
    }

    /// The raw device failure, if this error came from the device layer.
    pub fn cause(&self) -> Option<&DeviceError> {
        self.cause.as_ref()
    }
}

impl From<DeviceError> for CameraError {
    fn from(error: DeviceError) -> Self {
        Self::from_device(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_classification_table() {
        let cases = [
            (DeviceError::NotAllowed(String::new()), CaptureErrorKind::PermissionDenied),
            (DeviceError::NotFound(String::new()), CaptureErrorKind::DeviceNotFound),
            (DeviceError::NotReadable(String::new()), CaptureErrorKind::DeviceBusy),
            (DeviceError::Aborted(String::new()), CaptureErrorKind::DeviceBusy),
            (
                DeviceError::Overconstrained {
                    constraint: "width".into(),
                },
                CaptureErrorKind::UnsatisfiableConstraints,
            ),
            (
                DeviceError::Other {
                    name: "TypeError".into(),
                    message: String::new(),
                },
                CaptureErrorKind::Unknown,
            ),
        ];

        for (error, kind) in cases {
            assert_eq!(CaptureErrorKind::classify(&error), kind, "{error:?}");
        }
    }

    #[test]
    fn test_only_constraints_retry_relaxed() {
        for kind in CaptureErrorKind::ALL {
            assert_eq!(
                kind.allows_relaxed_retry(),
                kind == CaptureErrorKind::UnsatisfiableConstraints
            );
        }
    }

    #[test]
    fn test_recovery_paths() {
        assert!(CaptureErrorKind::DeviceNotFound.recovery().offers_gallery());
        assert!(!CaptureErrorKind::DeviceNotFound.recovery().allows_retry());
        assert!(CaptureErrorKind::PermissionDenied.recovery().offers_gallery());
        assert!(CaptureErrorKind::DeviceBusy.recovery().allows_retry());
        assert_eq!(
            CaptureErrorKind::CaptureFailed.recovery(),
            Recovery::RetryCapture
        );
    }

    #[test]
    fn test_device_error_kept_as_source() {
        let error = CameraError::from(DeviceError::NotAllowed("blocked".into()));
        assert_eq!(error.kind(), CaptureErrorKind::PermissionDenied);
        assert_eq!(error.to_string(), CaptureErrorKind::PermissionDenied.message());
        assert!(error.source().is_some());
    }
}
