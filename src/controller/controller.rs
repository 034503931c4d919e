//! Camera capture controller.
//!
//! Drives the pure rules in [`super::state`] against an injected
//! [`MediaDevices`] capability. The controller owns at most one stream and
//! always releases it before asking for another.

use super::navigator::Navigator;
use super::session::{Session, SessionStats, SessionStatus};
use super::state::{plan, settle, Action, CameraState, Effect, InvalidAction, Outcome};
use crate::capture::{
    CameraError, CameraRequest, CaptureConfig, CaptureErrorKind, CapturedFrame, FacingMode,
    FrameSource, MediaConstraints, MediaDevices, MediaStream,
};
use crate::raster;
use crate::upload::{self, UploadError};
use thiserror::Error;

const UNSUPPORTED_MESSAGE: &str = "Camera not supported on this device. Please use gallery upload.";

/// Errors returned from controller actions.
///
/// A [`ControllerError::Camera`] is also stored as the controller's
/// `last_error`; an invalid action changes nothing.
#[derive(Debug, Clone, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Invalid(#[from] InvalidAction),
    #[error(transparent)]
    Camera(#[from] CameraError),
}

impl ControllerError {
    /// Classified kind, for camera failures.
    pub fn kind(&self) -> Option<CaptureErrorKind> {
        match self {
            ControllerError::Camera(e) => Some(e.kind()),
            ControllerError::Invalid(_) => None,
        }
    }
}

/// State machine for the scan screen's camera.
pub struct CaptureController<D: MediaDevices, N: Navigator> {
    devices: D,
    navigator: N,
    config: CaptureConfig,
    state: CameraState,
    session: Option<Session<D::Stream>>,
    /// Camera the next "open" asks for.
    facing: FacingMode,
    last_error: Option<CameraError>,
    stats: SessionStats,
}

impl<D: MediaDevices, N: Navigator> CaptureController<D, N> {
    /// Creates an idle controller.
    pub fn new(devices: D, navigator: N, config: CaptureConfig) -> Self {
        let facing = config.facing;
        Self {
            devices,
            navigator,
            config,
            state: CameraState::Idle,
            session: None,
            facing,
            last_error: None,
            stats: SessionStats::default(),
        }
    }

    #[inline]
    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Most recent classified failure, cleared by the next successful open.
    pub fn last_error(&self) -> Option<&CameraError> {
        self.last_error.as_ref()
    }

    /// Camera currently streaming, or the one "open" will request.
    pub fn facing(&self) -> FacingMode {
        self.session.as_ref().map_or(self.facing, |s| s.facing)
    }

    /// Whether the host offers camera capture at all.
    pub fn camera_supported(&self) -> bool {
        self.devices.is_supported()
    }

    /// True while a device stream is owned.
    pub fn holds_stream(&self) -> bool {
        self.session.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            facing_mode: self.facing(),
            is_initializing: self.state.is_initializing(),
            is_active: self.state.is_active(),
            relaxed: self.session.as_ref().is_some_and(|s| s.relaxed),
            last_error: self.last_error.clone(),
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn devices(&self) -> &D {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut D {
        &mut self.devices
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    /// Enters the scan screen from the menu or "scan again".
    pub fn enter(&mut self) {
        self.teardown();
        self.last_error = None;
        self.navigator.open_scan();
    }

    /// Opens the camera last asked for (the configured one initially).
    pub async fn open(&mut self) -> Result<(), ControllerError> {
        let request = self.config.request_for(self.facing);
        self.start(Action::Open, request).await
    }

    /// Opens a specific camera.
    pub async fn open_facing(&mut self, facing: FacingMode) -> Result<(), ControllerError> {
        let request = self.config.request_for(facing);
        self.start(Action::Open, request).await
    }

    /// Tears down the current stream and opens the other camera.
    pub async fn switch_camera(&mut self) -> Result<(), ControllerError> {
        let request = self.config.request_for(self.facing().toggled());
        self.start(Action::Switch, request).await
    }

    async fn start(&mut self, action: Action, request: CameraRequest) -> Result<(), ControllerError> {
        // &mut self rules out a concurrent acquisition, so Initializing here
        // means a previous open was dropped mid-await
        if self.state.is_initializing() {
            tracing::warn!("Previous camera request was abandoned");
            self.state = CameraState::Idle;
        }

        let transition = plan(self.state, self.holds_stream(), action)?;
        if let Effect::Acquire { release_first: true } = transition.effect {
            self.release_session();
        }

        self.facing = request.facing();
        self.state = transition.next;
        self.last_error = None;

        if !self.devices.is_supported() {
            let error = CameraError::with_message(CaptureErrorKind::DeviceNotFound, UNSUPPORTED_MESSAGE);
            return Err(self.fail_acquisition(error).into());
        }

        tracing::info!(%action, facing = %request.facing(), "Requesting camera");

        let first = self.acquire(request, request.constraints(), false).await;
        let result = match first {
            Err(error) if error.kind().allows_relaxed_retry() => {
                tracing::warn!(
                    facing = %request.facing(),
                    error = ?error.cause(),
                    "Constraints unsatisfiable, retrying with unconstrained video"
                );
                self.stats.fallbacks += 1;
                self.acquire(request, MediaConstraints::relaxed(), true)
                    .await
                    .map_err(|e| {
                        if e.kind() == CaptureErrorKind::UnsatisfiableConstraints {
                            e.reclassified(CaptureErrorKind::DeviceNotFound)
                        } else {
                            e
                        }
                    })
            }
            other => other,
        };

        match result {
            Ok(()) => {
                self.state = settle(self.state, Outcome::Acquired);
                if let Some(session) = &self.session {
                    tracing::info!(
                        stream = session.stream.id(),
                        facing = %session.facing,
                        relaxed = session.relaxed,
                        "Camera active"
                    );
                }
                Ok(())
            }
            Err(error) => Err(self.fail_acquisition(error).into()),
        }
    }

    /// One acquisition attempt. On success the stream is owned by
    /// `self.session` before playback is awaited.
    async fn acquire(
        &mut self,
        request: CameraRequest,
        constraints: MediaConstraints,
        relaxed: bool,
    ) -> Result<(), CameraError> {
        debug_assert!(self.session.is_none(), "acquiring while holding a stream");
        self.stats.acquisitions += 1;

        let stream = self.devices.acquire(&constraints).await?;
        tracing::debug!(stream = stream.id(), ?constraints, "Stream granted");
        let session = self.session.insert(Session::new(stream, request, relaxed));

        let ready = session.stream.ready().await;
        if let Err(error) = ready {
            tracing::debug!(%error, "Stream never started playing");
            self.release_session();
            return Err(error.into());
        }
        Ok(())
    }

    fn fail_acquisition(&mut self, error: CameraError) -> CameraError {
        tracing::warn!(kind = %error.kind(), cause = ?error.cause(), "Camera unavailable");
        self.state = settle(self.state, Outcome::AcquireFailed(error.kind()));
        self.record_error(error.clone());
        error
    }

    fn record_error(&mut self, error: CameraError) {
        self.stats.record_error(error.kind());
        self.last_error = Some(error);
    }

    /// Snapshots the live frame, releases the stream and hands the image
    /// to the navigator.
    ///
    /// A frame without dimensions leaves the stream running so the user
    /// can press capture again.
    pub fn capture(&mut self) -> Result<(), ControllerError> {
        let transition = plan(self.state, self.holds_stream(), Action::Capture)?;
        debug_assert_eq!(transition.effect, Effect::Capture);

        let Some(session) = self.session.as_mut() else {
            return Err(InvalidAction {
                action: Action::Capture,
                state: self.state,
            }
            .into());
        };
        let facing = session.facing;
        let mirrored = facing.mirrors();
        let frame = session.stream.current_frame();

        let encoded = if frame.has_dimensions() {
            raster::render_frame(&frame, mirrored).and_then(|raster| {
                raster::encode(&raster, self.config.encoding, self.config.jpeg_quality)
                    .map(|bytes| (bytes, raster.width(), raster.height()))
            })
        } else {
            Err(raster::RasterError::EmptyFrame)
        };

        let (bytes, width, height) = match encoded {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(
                    width = frame.width(),
                    height = frame.height(),
                    error = %e,
                    "Frame not capturable yet"
                );
                self.state = settle(self.state, Outcome::FrameUnavailable);
                let error = CameraError::new(CaptureErrorKind::CaptureFailed);
                self.record_error(error.clone());
                return Err(error.into());
            }
        };

        // Drawn and encoded; only now is the frame source dropped
        self.release_session();
        self.state = settle(self.state, Outcome::FrameCaptured);
        self.last_error = None;
        self.stats.captures += 1;

        let image = CapturedFrame::new(
            bytes,
            width,
            height,
            self.config.encoding.format(),
            FrameSource::Camera { facing, mirrored },
        );
        tracing::info!(width, height, %facing, mirrored, "Frame captured");
        self.navigator.on_captured(image);
        Ok(())
    }

    /// "Close camera": back to idle without a frame.
    pub fn close(&mut self) {
        self.apply_release(Action::Close);
    }

    /// Releases everything. Safe to call in any state, any number of times.
    pub fn teardown(&mut self) {
        self.apply_release(Action::Teardown);
    }

    /// Leaves the scan flow without an image.
    pub fn cancel(&mut self) {
        self.teardown();
        self.navigator.on_cancelled();
    }

    /// Gallery fallback. Bypasses the state machine apart from making
    /// sure no camera stays open behind it.
    pub fn upload(&mut self, bytes: Vec<u8>) -> Result<(), UploadError> {
        let image = upload::from_bytes(bytes)?;
        self.teardown();
        self.navigator.on_captured(image);
        Ok(())
    }

    fn apply_release(&mut self, action: Action) {
        let transition = match plan(self.state, self.holds_stream(), action) {
            Ok(t) => t,
            Err(e) => {
                // Close and teardown are accepted from every state
                tracing::error!(error = %e, "Release rejected");
                return;
            }
        };
        if transition.effect == Effect::Release {
            self.release_session();
        }
        if self.state != transition.next {
            tracing::debug!(from = %self.state, %action, "Camera idle");
        }
        self.state = transition.next;
    }

    fn release_session(&mut self) {
        if let Some(session) = self.session.take() {
            let id = session.stream.id();
            self.devices.release(session.stream);
            self.stats.releases += 1;
            tracing::info!(stream = id, "Camera stream released");
        }
    }
}

impl<D: MediaDevices, N: Navigator> Drop for CaptureController<D, N> {
    fn drop(&mut self) {
        self.teardown();
    }
}
