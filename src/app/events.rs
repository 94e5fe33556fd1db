//! Outbound pipeline events.
//!
//! The [`PipelineService`](super::service::PipelineService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide how to render them.

use crate::error::Error;
use crate::inference::ClassificationResult;

/// Structured events emitted by the capture loop, in iteration order.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    /// The service is ready to loop.
    Started {
        capture_interval_ms: u32,
        arena_used_bytes: usize,
        arena_capacity_bytes: usize,
    },

    /// An iteration began and a frame was requested.
    CaptureRequested { iteration: u64 },

    /// The sensor delivered a frame.
    FrameCaptured {
        width: usize,
        height: usize,
        len: usize,
    },

    /// The frame was resampled into the input tensor.
    Preprocessed,

    /// The graph is about to run.
    InvokeStarted,

    /// Inference succeeded; one entry per reported class.
    Classified {
        result: &'a ClassificationResult,
        invoke_us: u64,
    },

    /// The frame was handed back to the driver.
    FrameReleased,

    /// The iteration ended without a report.
    IterationSkipped(Error),

    /// Periodic counters.
    Stats(PipelineStats),
}

/// Running counters over the life of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub iterations: u64,
    pub classified: u64,
    pub acquire_failures: u64,
    pub preprocess_failures: u64,
    pub inference_failures: u64,
}

impl PipelineStats {
    pub fn record_skip(&mut self, error: &Error) {
        match error {
            Error::Acquire(_) => self.acquire_failures += 1,
            Error::Preprocess(_) => self.preprocess_failures += 1,
            Error::Inference(_) => self.inference_failures += 1,
            Error::Init(_) | Error::ModelLoad(_) | Error::Config(_) => {}
        }
    }

    pub fn skipped(&self) -> u64 {
        self.acquire_failures + self.preprocess_failures + self.inference_failures
    }
}
