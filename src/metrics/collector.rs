//! Metrics collection and registry.

use crate::capture::CaptureErrorKind;
use crate::controller::{CameraState, SessionStats};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of scan-flow state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Whether a device stream is currently owned.
    pub stream_held: bool,
    /// Whether the preview is running.
    pub active: bool,
    /// Acquisition requests, fallbacks included.
    pub acquisitions: u64,
    /// Relaxed fallback requests.
    pub fallbacks: u64,
    /// Streams released.
    pub releases: u64,
    /// Frames handed off.
    pub captures: u64,
    /// Surfaced errors, indexed like [`CaptureErrorKind::ALL`].
    pub errors: [u64; 6],
    /// Mock analyses run.
    pub analyses: u64,
    /// User-submitted alerts in the local store.
    pub user_alerts: usize,
}

/// Prometheus metrics registry for the scan flow.
pub struct MetricsRegistry {
    registry: Registry,

    // Session metrics
    stream_held: IntGauge,
    active: IntGauge,
    acquisitions_total: IntCounter,
    fallbacks_total: IntCounter,
    releases_total: IntCounter,
    captures_total: IntCounter,
    errors_total: IntCounterVec,

    // Downstream metrics
    analyses_total: IntCounter,
    user_alerts: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all capture metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let stream_held = IntGauge::new(
            "pureplate_capture_stream_held",
            "Whether a camera stream is currently held (1=held, 0=released)",
        )?;
        let active = IntGauge::new(
            "pureplate_capture_active",
            "Whether the camera preview is running",
        )?;
        let acquisitions_total = IntCounter::new(
            "pureplate_capture_acquisitions_total",
            "Camera stream requests sent to the device",
        )?;
        let fallbacks_total = IntCounter::new(
            "pureplate_capture_fallbacks_total",
            "Relaxed-constraint fallback requests",
        )?;
        let releases_total = IntCounter::new(
            "pureplate_capture_releases_total",
            "Camera streams released",
        )?;
        let captures_total = IntCounter::new(
            "pureplate_capture_captures_total",
            "Frames captured and handed off",
        )?;
        let errors_total = IntCounterVec::new(
            Opts::new(
                "pureplate_capture_errors_total",
                "Classified capture failures by kind",
            ),
            &["kind"],
        )?;

        let analyses_total = IntCounter::new(
            "pureplate_analyses_total",
            "Mock analyses performed",
        )?;
        let user_alerts = IntGauge::new(
            "pureplate_user_alerts",
            "User-submitted alerts in the local store",
        )?;

        registry.register(Box::new(stream_held.clone()))?;
        registry.register(Box::new(active.clone()))?;
        registry.register(Box::new(acquisitions_total.clone()))?;
        registry.register(Box::new(fallbacks_total.clone()))?;
        registry.register(Box::new(releases_total.clone()))?;
        registry.register(Box::new(captures_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(analyses_total.clone()))?;
        registry.register(Box::new(user_alerts.clone()))?;

        // Pre-create every label so all kinds show up at zero
        for kind in CaptureErrorKind::ALL {
            errors_total.with_label_values(&[kind.as_str()]);
        }

        Ok(Self {
            registry,
            stream_held,
            active,
            acquisitions_total,
            fallbacks_total,
            releases_total,
            captures_total,
            errors_total,
            analyses_total,
            user_alerts,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.stream_held.set(i64::from(snapshot.stream_held));
        self.active.set(i64::from(snapshot.active));
        self.user_alerts.set(snapshot.user_alerts as i64);

        // Counters only move forward by the difference
        advance(&self.acquisitions_total, snapshot.acquisitions);
        advance(&self.fallbacks_total, snapshot.fallbacks);
        advance(&self.releases_total, snapshot.releases);
        advance(&self.captures_total, snapshot.captures);
        advance(&self.analyses_total, snapshot.analyses);

        for (kind, &count) in CaptureErrorKind::ALL.iter().zip(snapshot.errors.iter()) {
            advance(&self.errors_total.with_label_values(&[kind.as_str()]), count);
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

impl MetricsSnapshot {
    /// Builds a snapshot from the controller and its collaborators.
    pub fn from_components(
        state: CameraState,
        stream_held: bool,
        stats: &SessionStats,
        analyses: u64,
        user_alerts: usize,
    ) -> Self {
        let mut errors = [0u64; 6];
        for (slot, kind) in errors.iter_mut().zip(CaptureErrorKind::ALL) {
            *slot = stats.errors(kind);
        }

        Self {
            stream_held,
            active: state.is_active(),
            acquisitions: stats.acquisitions,
            fallbacks: stats.fallbacks,
            releases: stats.releases,
            captures: stats.captures,
            errors,
            analyses,
            user_alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let mut errors = [0u64; 6];
        errors[CaptureErrorKind::PermissionDenied as usize] = 2;
        let snapshot = MetricsSnapshot {
            stream_held: true,
            active: true,
            acquisitions: 4,
            fallbacks: 1,
            releases: 3,
            captures: 1,
            errors,
            analyses: 1,
            user_alerts: 2,
        };

        registry.update(&snapshot);
        // Re-applying the same snapshot must not double count
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("pureplate_capture_stream_held 1"));
        assert!(output.contains("pureplate_capture_acquisitions_total 4"));
        assert!(output.contains("pureplate_capture_errors_total{kind=\"permission_denied\"} 2"));
        assert!(output.contains("pureplate_capture_errors_total{kind=\"device_busy\"} 0"));
        assert!(output.contains("pureplate_user_alerts 2"));
    }

    #[test]
    fn test_snapshot_from_stats() {
        let stats = SessionStats::default();
        let snapshot = MetricsSnapshot::from_components(CameraState::Active, true, &stats, 0, 0);
        assert!(snapshot.active);
        assert!(snapshot.stream_held);
        assert_eq!(snapshot.errors, [0; 6]);
    }
}
