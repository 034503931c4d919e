//! Screen navigator boundary.

use crate::capture::CapturedFrame;

/// Owns which screen is visible; receives the scan flow's results.
pub trait Navigator {
    /// Shows the scan screen.
    fn open_scan(&mut self);

    /// Takes ownership of a captured or uploaded image.
    fn on_captured(&mut self, image: CapturedFrame);

    /// The user left the scan flow without an image.
    fn on_cancelled(&mut self);
}

/// Navigator that just remembers what it was told.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    scans_opened: usize,
    captured: Vec<CapturedFrame>,
    cancelled: usize,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scans_opened(&self) -> usize {
        self.scans_opened
    }

    pub fn captured(&self) -> &[CapturedFrame] {
        &self.captured
    }

    /// Removes and returns the most recent image.
    pub fn take_last(&mut self) -> Option<CapturedFrame> {
        self.captured.pop()
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl Navigator for RecordingNavigator {
    fn open_scan(&mut self) {
        self.scans_opened += 1;
    }

    fn on_captured(&mut self, image: CapturedFrame) {
        tracing::debug!(?image, "Navigator received image");
        self.captured.push(image);
    }

    fn on_cancelled(&mut self) {
        self.cancelled += 1;
    }
}
