//! Pure transition rules for the capture controller.
//!
//! [`plan`] decides whether an action is allowed and which single effect
//! has to run; [`settle`] folds the effect's outcome back into a state.
//! Neither touches a device, so any host (event loop, actor, test
//! harness) can drive them.

use crate::capture::CaptureErrorKind;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "state", content = "kind", rename_all = "snake_case")]
pub enum CameraState {
    /// No stream held.
    #[default]
    Idle,
    /// Stream requested, not yet playing.
    Initializing,
    /// Live preview.
    Active,
    /// Frame extracted and handed off; stream released.
    Captured,
    /// Last attempt failed. Only `CaptureFailed` keeps a stream.
    Error(CaptureErrorKind),
}

impl CameraState {
    #[inline]
    pub fn is_initializing(&self) -> bool {
        matches!(self, CameraState::Initializing)
    }

    /// Preview is running (a failed capture leaves it running).
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            CameraState::Active | CameraState::Error(CaptureErrorKind::CaptureFailed)
        )
    }

    pub fn error_kind(&self) -> Option<CaptureErrorKind> {
        match self {
            CameraState::Error(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for CameraState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraState::Idle => f.write_str("idle"),
            CameraState::Initializing => f.write_str("initializing"),
            CameraState::Active => f.write_str("active"),
            CameraState::Captured => f.write_str("captured"),
            CameraState::Error(kind) => write!(f, "error({kind})"),
        }
    }
}

/// User or host actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Open,
    Switch,
    Capture,
    Close,
    /// Leaving the screen or destroying the controller.
    Teardown,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Open => "open camera",
            Action::Switch => "switch camera",
            Action::Capture => "capture",
            Action::Close => "close camera",
            Action::Teardown => "tear down",
        };
        f.write_str(name)
    }
}

/// The one side effect a transition needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Pure state update.
    None,
    /// Stop the held stream.
    Release,
    /// Request a new stream, releasing the held one first if any.
    Acquire { release_first: bool },
    /// Snapshot the current frame, then release.
    Capture,
}

/// Result of running an [`Effect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Acquired,
    AcquireFailed(CaptureErrorKind),
    FrameCaptured,
    FrameUnavailable,
}

/// A planned transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State to enter while the effect runs.
    pub next: CameraState,
    pub effect: Effect,
}

/// Rejected action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} while {state}")]
pub struct InvalidAction {
    pub action: Action,
    pub state: CameraState,
}

/// Plans `action` from `state`. `holding` says whether a stream is owned.
pub fn plan(state: CameraState, holding: bool, action: Action) -> Result<Transition, InvalidAction> {
    let invalid = InvalidAction { action, state };

    match action {
        Action::Open | Action::Switch => {
            // Session replacement is serialized: never two requests in flight
            if state.is_initializing() {
                return Err(invalid);
            }
            Ok(Transition {
                next: CameraState::Initializing,
                effect: Effect::Acquire {
                    release_first: holding,
                },
            })
        }
        Action::Capture => {
            if holding && state.is_active() {
                Ok(Transition {
                    next: state,
                    effect: Effect::Capture,
                })
            } else {
                Err(invalid)
            }
        }
        Action::Close | Action::Teardown => Ok(Transition {
            next: CameraState::Idle,
            effect: if holding { Effect::Release } else { Effect::None },
        }),
    }
}

/// Applies an effect outcome to the state that was entered for it.
///
/// Outcomes that do not belong to `state` leave it unchanged.
pub fn settle(state: CameraState, outcome: Outcome) -> CameraState {
    match (state, outcome) {
        (CameraState::Initializing, Outcome::Acquired) => CameraState::Active,
        (CameraState::Initializing, Outcome::AcquireFailed(kind)) => CameraState::Error(kind),
        (s, Outcome::FrameCaptured) if s.is_active() => CameraState::Captured,
        (s, Outcome::FrameUnavailable) if s.is_active() => {
            CameraState::Error(CaptureErrorKind::CaptureFailed)
        }
        (s, outcome) => {
            tracing::debug!(state = %s, ?outcome, "Ignoring outcome for state");
            s
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_from_idle_acquires() {
        let t = plan(CameraState::Idle, false, Action::Open).unwrap();
        assert_eq!(t.next, CameraState::Initializing);
        assert_eq!(t.effect, Effect::Acquire { release_first: false });
    }

    #[test]
    fn test_switch_from_active_releases_first() {
        let t = plan(CameraState::Active, true, Action::Switch).unwrap();
        assert_eq!(t.effect, Effect::Acquire { release_first: true });
    }

    #[test]
    fn test_no_second_acquisition_in_flight() {
        for action in [Action::Open, Action::Switch] {
            let err = plan(CameraState::Initializing, false, action).unwrap_err();
            assert_eq!(err.state, CameraState::Initializing);
        }
    }

    #[test]
    fn test_capture_requires_live_stream() {
        assert!(plan(CameraState::Idle, false, Action::Capture).is_err());
        assert!(plan(CameraState::Captured, false, Action::Capture).is_err());
        assert!(plan(
            CameraState::Error(CaptureErrorKind::PermissionDenied),
            false,
            Action::Capture
        )
        .is_err());

        let t = plan(CameraState::Active, true, Action::Capture).unwrap();
        assert_eq!(t.effect, Effect::Capture);

        // Retry after a zero-sized frame keeps the session
        let retry = CameraState::Error(CaptureErrorKind::CaptureFailed);
        assert_eq!(plan(retry, true, Action::Capture).unwrap().effect, Effect::Capture);
    }

    #[test]
    fn test_teardown_without_stream_is_noop() {
        for state in [
            CameraState::Idle,
            CameraState::Captured,
            CameraState::Error(CaptureErrorKind::DeviceBusy),
        ] {
            let t = plan(state, false, Action::Teardown).unwrap();
            assert_eq!(t.next, CameraState::Idle);
            assert_eq!(t.effect, Effect::None);
        }
        let t = plan(CameraState::Active, true, Action::Close).unwrap();
        assert_eq!(t.effect, Effect::Release);
    }

    #[test]
    fn test_settle_outcomes() {
        assert_eq!(
            settle(CameraState::Initializing, Outcome::Acquired),
            CameraState::Active
        );
        assert_eq!(
            settle(
                CameraState::Initializing,
                Outcome::AcquireFailed(CaptureErrorKind::PermissionDenied)
            ),
            CameraState::Error(CaptureErrorKind::PermissionDenied)
        );
        assert_eq!(
            settle(CameraState::Active, Outcome::FrameUnavailable),
            CameraState::Error(CaptureErrorKind::CaptureFailed)
        );
        assert_eq!(
            settle(CameraState::Active, Outcome::FrameCaptured),
            CameraState::Captured
        );
        assert_eq!(settle(CameraState::Idle, Outcome::Acquired), CameraState::Idle);
    }

    #[test]
    fn test_state_flags() {
        assert!(CameraState::Initializing.is_initializing());
        assert!(CameraState::Active.is_active());
        assert!(CameraState::Error(CaptureErrorKind::CaptureFailed).is_active());
        assert!(!CameraState::Error(CaptureErrorKind::Unknown).is_active());
        assert_eq!(
            CameraState::Error(CaptureErrorKind::DeviceBusy).to_string(),
            "error(device_busy)"
        );
    }
}
