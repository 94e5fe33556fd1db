//! Mock adapters for integration tests.
//!
//! Every port call is recorded so tests can assert on the full history
//! without a camera, a model, or a serial console.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;

use camclassify::app::events::{PipelineEvent, PipelineStats};
use camclassify::app::ports::{ClockPort, EventSink, FrameSource, Interpreter};
use camclassify::config::SensorConfig;
use camclassify::error::{Error, InferenceError, InitError};
use camclassify::frame::{FrameBuffer, PixelFormat};
use camclassify::inference::LabelTable;

// ── Frames ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MockFrame {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl MockFrame {
    pub fn grayscale(width: usize, height: usize, fill: u8) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Grayscale,
            data: vec![fill; width * height],
        }
    }

    /// Dark `width × height` frame with a white rectangle over
    /// columns `x` and rows `y` (half-open).
    pub fn bright_square(
        width: usize,
        height: usize,
        x: core::ops::Range<usize>,
        y: core::ops::Range<usize>,
    ) -> Self {
        let mut frame = Self::grayscale(width, height, 0);
        for row in y {
            frame.data[row * width + x.start..row * width + x.end].fill(255);
        }
        frame
    }
}

impl FrameBuffer for MockFrame {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

// ── MockFrameSource ───────────────────────────────────────────

/// Serves scripted frames (`None` = capture failure), then repeats
/// `fallback` forever.
pub struct MockFrameSource {
    pub script: VecDeque<Option<MockFrame>>,
    pub fallback: Option<MockFrame>,
    pub acquired: usize,
    pub released: usize,
    pub outstanding: usize,
    /// Set if `acquire_frame` was ever called with a frame still out.
    pub overlapped: bool,
}

impl MockFrameSource {
    pub fn new(fallback: Option<MockFrame>) -> Self {
        Self {
            script: VecDeque::new(),
            fallback,
            acquired: 0,
            released: 0,
            outstanding: 0,
            overlapped: false,
        }
    }

    pub fn then(mut self, frame: Option<MockFrame>) -> Self {
        self.script.push_back(frame);
        self
    }
}

impl FrameSource for MockFrameSource {
    type Frame = MockFrame;

    fn initialize(&mut self, config: &SensorConfig) -> Result<(), InitError> {
        config.validate()
    }

    fn acquire_frame(&mut self) -> Option<MockFrame> {
        if self.outstanding > 0 {
            self.overlapped = true;
        }
        let next = match self.script.pop_front() {
            Some(scripted) => scripted,
            None => self.fallback.clone(),
        };
        if next.is_some() {
            self.acquired += 1;
            self.outstanding += 1;
        }
        next
    }

    fn release_frame(&mut self, _frame: MockFrame) {
        self.released += 1;
        self.outstanding -= 1;
    }
}

// ── QuadrantInterpreter ───────────────────────────────────────

pub const QUADRANT_LABELS: LabelTable = &["top_left", "top_right", "bottom_left", "bottom_right"];

/// Stub model: scores each 16×16 quadrant of the 32×32 input by its mean.
pub struct QuadrantInterpreter {
    input: Vec<f32>,
    output: [f32; 4],
    pub last_input: Vec<f32>,
    pub invocations: usize,
    pub fail_with: Option<InferenceError>,
}

impl QuadrantInterpreter {
    pub fn new() -> Self {
        Self {
            input: vec![0.0; 32 * 32],
            output: [0.0; 4],
            last_input: Vec::new(),
            invocations: 0,
            fail_with: None,
        }
    }
}

impl Interpreter for QuadrantInterpreter {
    fn input_tensor(&mut self) -> &mut [f32] {
        &mut self.input
    }

    fn invoke(&mut self) -> Result<(), InferenceError> {
        self.invocations += 1;
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        self.last_input = self.input.clone();
        self.output = [0.0; 4];
        for (i, v) in self.input.iter().enumerate() {
            let (x, y) = (i % 32, i / 32);
            let q = usize::from(y >= 16) * 2 + usize::from(x >= 16);
            self.output[q] += v / 256.0;
        }
        Ok(())
    }

    fn output_tensor(&self) -> &[f32] {
        &self.output
    }

    fn arena_used_bytes(&self) -> usize {
        self.input.len() * 4
    }
}

// ── FakeClock ─────────────────────────────────────────────────

/// Advances by `step_us` on every read.
pub struct FakeClock {
    now: Cell<u64>,
    step_us: u64,
}

impl FakeClock {
    pub fn new(step_us: u64) -> Self {
        Self {
            now: Cell::new(0),
            step_us,
        }
    }
}

impl ClockPort for FakeClock {
    fn uptime_us(&self) -> u64 {
        let t = self.now.get();
        self.now.set(t + self.step_us);
        t
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Owned copy of a [`PipelineEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Started,
    CaptureRequested(u64),
    FrameCaptured { width: usize, height: usize, len: usize },
    Preprocessed,
    InvokeStarted,
    Classified {
        scores: Vec<(usize, &'static str, f32)>,
        top: Option<&'static str>,
        invoke_us: u64,
    },
    FrameReleased,
    Skipped(Error),
    Stats(PipelineStats),
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<Recorded>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classified(&self) -> Vec<&Recorded> {
        self.events
            .iter()
            .filter(|e| matches!(e, Recorded::Classified { .. }))
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Recorded) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &PipelineEvent<'_>) {
        let rec = match event {
            PipelineEvent::Started { .. } => Recorded::Started,
            PipelineEvent::CaptureRequested { iteration } => Recorded::CaptureRequested(*iteration),
            PipelineEvent::FrameCaptured { width, height, len } => Recorded::FrameCaptured {
                width: *width,
                height: *height,
                len: *len,
            },
            PipelineEvent::Preprocessed => Recorded::Preprocessed,
            PipelineEvent::InvokeStarted => Recorded::InvokeStarted,
            PipelineEvent::Classified { result, invoke_us } => Recorded::Classified {
                scores: result
                    .iter()
                    .map(|c| (c.index, c.label, c.probability))
                    .collect(),
                top: result.top().map(|c| c.label),
                invoke_us: *invoke_us,
            },
            PipelineEvent::FrameReleased => Recorded::FrameReleased,
            PipelineEvent::IterationSkipped(e) => Recorded::Skipped(*e),
            PipelineEvent::Stats(s) => Recorded::Stats(*s),
        };
        self.events.push(rec);
    }
}
