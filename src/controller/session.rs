//! The single owned stream and the counters kept across sessions.

use crate::capture::{CameraError, CameraRequest, CaptureErrorKind, FacingMode, MediaStream};
use serde::Serialize;

/// One acquired stream, from grant to release.
pub(crate) struct Session<S: MediaStream> {
    pub(crate) stream: S,
    /// Camera actually delivering frames; decides mirroring.
    pub(crate) facing: FacingMode,
    /// Granted on the relaxed fallback rather than the original request.
    pub(crate) relaxed: bool,
}

impl<S: MediaStream> Session<S> {
    pub(crate) fn new(stream: S, request: CameraRequest, relaxed: bool) -> Self {
        let facing = stream.facing().unwrap_or(request.facing());
        if facing != request.facing() {
            tracing::warn!(
                stream = stream.id(),
                requested = %request.facing(),
                granted = %facing,
                "Device opened a different camera than requested"
            );
        }
        Self {
            stream,
            facing,
            relaxed,
        }
    }
}

/// Read-only view of the controller's session attributes.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: super::CameraState,
    /// Camera in use, or the one the next "open" will request.
    pub facing_mode: FacingMode,
    pub is_initializing: bool,
    pub is_active: bool,
    /// Whether the live stream came from the relaxed fallback.
    pub relaxed: bool,
    #[serde(skip)]
    pub last_error: Option<CameraError>,
}

/// Counters across the controller's lifetime.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    /// Acquisition requests sent to the device, fallbacks included.
    pub acquisitions: u64,
    /// Relaxed fallback requests.
    pub fallbacks: u64,
    /// Streams released.
    pub releases: u64,
    /// Frames handed to the navigator.
    pub captures: u64,
    errors: [u64; 6],
}

impl SessionStats {
    pub(crate) fn record_error(&mut self, kind: CaptureErrorKind) {
        self.errors[kind as usize] += 1;
    }

    /// Errors surfaced for one kind.
    pub fn errors(&self, kind: CaptureErrorKind) -> u64 {
        self.errors[kind as usize]
    }

    /// Errors surfaced across all kinds.
    pub fn total_errors(&self) -> u64 {
        self.errors.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConfig, FakeDevices, MediaConstraints, MediaDevices};

    #[tokio::test]
    async fn test_session_facing_follows_granted_stream() {
        let request = CaptureConfig::default().request_for(FacingMode::Back);
        let mut devices = FakeDevices::new().with_relaxed_facing(FacingMode::Front);

        let stream = devices.acquire(&request.constraints()).await.unwrap();
        let session = Session::new(stream, request, false);
        assert_eq!(session.facing, FacingMode::Back);
        assert!(!session.relaxed);

        let stream = devices.acquire(&MediaConstraints::relaxed()).await.unwrap();
        let session = Session::new(stream, request, true);
        assert_eq!(session.facing, FacingMode::Front);
        assert!(session.relaxed);
    }

    #[test]
    fn test_error_counters_by_kind() {
        let mut stats = SessionStats::default();
        stats.record_error(CaptureErrorKind::DeviceBusy);
        stats.record_error(CaptureErrorKind::DeviceBusy);
        stats.record_error(CaptureErrorKind::Unknown);

        assert_eq!(stats.errors(CaptureErrorKind::DeviceBusy), 2);
        assert_eq!(stats.errors(CaptureErrorKind::Unknown), 1);
        assert_eq!(stats.errors(CaptureErrorKind::PermissionDenied), 0);
        assert_eq!(stats.total_errors(), 3);
    }
}
