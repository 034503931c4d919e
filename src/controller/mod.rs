//! Camera capture controller.
//!
//! An explicit state machine (`Idle → Initializing → Active → Captured`,
//! with `Error` on any failed attempt) owning at most one device stream.
//! Transition rules are pure; the controller applies the one effect each
//! transition needs (acquire, release or capture).

#[allow(clippy::module_inception)]
mod controller;
mod navigator;
mod session;
mod state;

pub use controller::{CaptureController, ControllerError};
pub use navigator::{Navigator, RecordingNavigator};
pub use session::{SessionStats, SessionStatus};
pub use state::{plan, settle, Action, CameraState, Effect, InvalidAction, Outcome, Transition};
