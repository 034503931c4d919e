//! PurePlate scan flow.
//!
//! Camera capture for the PurePlate food-safety companion, plus the small
//! collaborators around it: gallery upload, a mock analysis service and a
//! locally persisted community alert feed.
//!
//! # Architecture
//!
//! ```text
//! MediaDevices ──acquire/release──▶ CaptureController ──on_captured──▶ Navigator
//!                                          │                              │
//!                                   raster (mirror, encode)        MockAnalyzer
//! gallery upload ────────────────────────────────────────────────────────▶┘
//! ```
//!
//! # Design Principles
//!
//! - **One stream at a time**: the controller always releases before it acquires
//! - **Explicit states**: pure transition rules, one effect per transition
//! - **Typed failures**: every device error is classified and recoverable
//! - **Injected hardware**: devices are a capability, so tests use a fake
//!
//! # Example
//!
//! ```no_run
//! use pureplate::{
//!     analysis::MockAnalyzer,
//!     capture::{CaptureConfig, FakeDevices},
//!     controller::{CaptureController, RecordingNavigator},
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut controller = CaptureController::new(
//!     FakeDevices::new(),
//!     RecordingNavigator::new(),
//!     CaptureConfig::default(),
//! );
//!
//! controller.open().await?;
//! controller.capture()?;
//!
//! if let Some(image) = controller.navigator_mut().take_last() {
//!     let report = MockAnalyzer::from_os_entropy().analyze(&image);
//!     println!("{:?}", report.verdict);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod alerts;
pub mod analysis;
pub mod capture;
pub mod controller;
pub mod metrics;
pub mod raster;
pub mod upload;

// Re-export commonly used types at crate root
pub use alerts::{Alert, AlertStore, FileStore, ReportForm, Severity};
pub use analysis::{AnalysisReport, MockAnalyzer, Verdict};
pub use capture::{
    CameraError, CaptureConfig, CaptureErrorKind, CapturedFrame, FacingMode, FakeDevices,
    FileConfig, MediaDevices, MediaStream,
};
pub use controller::{CameraState, CaptureController, ControllerError, Navigator};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
