//! Prometheus metrics for the scan flow.
//!
//! The CLI prints the registry in text exposition format with `--metrics`.
//!
//! # Metrics Exposed
//!
//! ## Session Metrics
//! - `pureplate_capture_stream_held` - Whether a camera stream is held (1/0)
//! - `pureplate_capture_active` - Whether the preview is running (1/0)
//! - `pureplate_capture_acquisitions_total` - Stream requests, fallbacks included
//! - `pureplate_capture_fallbacks_total` - Relaxed-constraint retries
//! - `pureplate_capture_releases_total` - Streams released
//! - `pureplate_capture_captures_total` - Frames handed off
//! - `pureplate_capture_errors_total{kind}` - Classified failures
//!
//! ## Downstream Metrics
//! - `pureplate_analyses_total` - Mock analyses performed
//! - `pureplate_user_alerts` - User alerts in the local store

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
