//! Scripted in-process camera.
//!
//! Grants or rejects acquisitions according to a script, serves
//! synthetic frames, and records every acquire/release so tests and the
//! demo binary can check the one-stream-at-a-time invariant.

use super::config::{FacingMode, MediaConstraints, Resolution};
use super::device::{DeviceError, MediaDevices, MediaStream};
use super::frame::{VideoFrame, BYTES_PER_PIXEL};
use std::collections::VecDeque;

/// Scripted result of one acquisition.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    /// Grant a stream that becomes ready.
    Grant,
    /// Reject the request.
    Reject(DeviceError),
    /// Grant a stream whose playback never starts.
    GrantUnready(DeviceError),
}

/// Observable device activity, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Acquire { constraints: MediaConstraints },
    Grant { stream: u64 },
    Reject { error: DeviceError },
    Release { stream: u64 },
}

/// Fake implementation of [`MediaDevices`].
#[derive(Debug)]
pub struct FakeDevices {
    supported: bool,
    script: VecDeque<FakeOutcome>,
    native: Resolution,
    frame: Option<VideoFrame>,
    relaxed_facing: FacingMode,
    events: Vec<DeviceEvent>,
    next_stream: u64,
    live: usize,
    max_live: usize,
}

impl Default for FakeDevices {
    fn default() -> Self {
        Self {
            supported: true,
            script: VecDeque::new(),
            native: Resolution::new(64, 48),
            frame: None,
            relaxed_facing: FacingMode::Back,
            events: Vec::new(),
            next_stream: 1,
            live: 0,
            max_live: 0,
        }
    }
}

impl FakeDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host with no camera API at all.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::default()
        }
    }

    /// Queues outcomes for the next acquisitions. Once the script runs
    /// out every request is granted.
    pub fn with_script(mut self, outcomes: impl IntoIterator<Item = FakeOutcome>) -> Self {
        self.script.extend(outcomes);
        self
    }

    /// Size of synthetic frames.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.native = Resolution::new(width, height);
        self
    }

    /// Serves this exact frame from every stream.
    pub fn with_frame(mut self, frame: VideoFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Camera handed out for unconstrained requests.
    pub fn with_relaxed_facing(mut self, facing: FacingMode) -> Self {
        self.relaxed_facing = facing;
        self
    }

    /// Queues one more outcome.
    pub fn push_outcome(&mut self, outcome: FakeOutcome) {
        self.script.push_back(outcome);
    }

    /// Everything that happened so far.
    pub fn events(&self) -> &[DeviceEvent] {
        &self.events
    }

    /// Number of acquisition requests received.
    pub fn acquire_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DeviceEvent::Acquire { .. }))
            .count()
    }

    /// Number of streams released.
    pub fn release_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DeviceEvent::Release { .. }))
            .count()
    }

    /// Streams granted and not yet released.
    pub fn live_streams(&self) -> usize {
        self.live
    }

    /// Highest number of simultaneously live streams ever observed.
    pub fn max_live_streams(&self) -> usize {
        self.max_live
    }

    fn synthesize(&self) -> VideoFrame {
        let Resolution { width, height } = self.native;
        let mut pixels = Vec::with_capacity((width * height) as usize * BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                // Left-to-right red ramp so mirroring is visible
                let r = ((x * 255) / width.max(1)) as u8;
                let g = ((y * 255) / height.max(1)) as u8;
                pixels.extend_from_slice(&[r, g, 128, 255]);
            }
        }
        VideoFrame::new(pixels, width, height, 0)
    }
}

impl MediaDevices for FakeDevices {
    type Stream = FakeStream;

    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn acquire(&mut self, constraints: &MediaConstraints) -> Result<FakeStream, DeviceError> {
        self.events.push(DeviceEvent::Acquire {
            constraints: *constraints,
        });

        let (ready, outcome_error) = match self.script.pop_front().unwrap_or(FakeOutcome::Grant) {
            FakeOutcome::Grant => (Ok(()), None),
            FakeOutcome::GrantUnready(error) => (Err(error), None),
            FakeOutcome::Reject(error) => (Ok(()), Some(error)),
        };

        if let Some(error) = outcome_error {
            self.events.push(DeviceEvent::Reject {
                error: error.clone(),
            });
            return Err(error);
        }

        let id = self.next_stream;
        self.next_stream += 1;
        self.live += 1;
        self.max_live = self.max_live.max(self.live);
        self.events.push(DeviceEvent::Grant { stream: id });

        let frame = self.frame.clone().unwrap_or_else(|| self.synthesize());
        let facing = constraints.facing.unwrap_or(self.relaxed_facing);
        tracing::debug!(stream = id, %facing, "FakeDevices granted stream");

        Ok(FakeStream {
            id,
            facing,
            frame,
            ready,
            live: true,
            sequence: 0,
        })
    }

    fn release(&mut self, mut stream: FakeStream) {
        stream.stop_tracks();
        self.live = self.live.saturating_sub(1);
        self.events.push(DeviceEvent::Release { stream: stream.id });
        tracing::debug!(stream = stream.id, "FakeDevices released stream");
    }
}

/// Stream handed out by [`FakeDevices`].
#[derive(Debug)]
pub struct FakeStream {
    id: u64,
    facing: FacingMode,
    frame: VideoFrame,
    ready: Result<(), DeviceError>,
    live: bool,
    sequence: u64,
}

impl MediaStream for FakeStream {
    fn id(&self) -> u64 {
        self.id
    }

    fn facing(&self) -> Option<FacingMode> {
        Some(self.facing)
    }

    async fn ready(&mut self) -> Result<(), DeviceError> {
        self.ready.clone()
    }

    fn current_frame(&mut self) -> VideoFrame {
        self.sequence += 1;
        VideoFrame::new(
            self.frame.pixels().to_vec(),
            self.frame.width(),
            self.frame.height(),
            self.sequence,
        )
    }

    fn stop_tracks(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}
