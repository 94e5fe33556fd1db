//! Pipeline service: the hexagonal core.
//!
//! [`PipelineService`] owns the inference runner, the monotonic clock and
//! the running counters.  One call to [`run_iteration`] performs a full
//! capture → preprocess → infer → report cycle; the frame source and the
//! event sink are injected at the call site so the whole loop body is
//! testable with mock adapters.
//!
//! ```text
//!  FrameSource ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                  │        PipelineService        │
//!                  │ preprocess · runner · stats   │
//!                  └──────────────────────────────┘
//! ```
//!
//! [`run_iteration`]: PipelineService::run_iteration

use core::mem::ManuallyDrop;

use log::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{AcquireError, Error, InferenceError};
use crate::frame::FrameBuffer;
use crate::inference::{InferenceRunner, RunnerState};
use crate::preprocess::resize_and_normalize;

use super::events::{PipelineEvent, PipelineStats};
use super::ports::{ClockPort, EventSink, FrameSource, Interpreter};

// ───────────────────────────────────────────────────────────────
// Frame lease
// ───────────────────────────────────────────────────────────────

/// An acquired frame that goes back to its source when the lease ends,
/// whichever way the iteration exits.
pub struct FrameLease<'s, S: FrameSource> {
    source: &'s mut S,
    frame: ManuallyDrop<S::Frame>,
}

impl<'s, S: FrameSource> FrameLease<'s, S> {
    pub fn new(source: &'s mut S, frame: S::Frame) -> Self {
        Self {
            source,
            frame: ManuallyDrop::new(frame),
        }
    }

    pub fn frame(&self) -> &S::Frame {
        &self.frame
    }

    /// Hand the frame back now.
    pub fn release(self) {
        drop(self);
    }
}

impl<S: FrameSource> Drop for FrameLease<'_, S> {
    fn drop(&mut self) {
        // SAFETY: `frame` is only taken here, and `drop` runs once.
        let frame = unsafe { ManuallyDrop::take(&mut self.frame) };
        self.source.release_frame(frame);
    }
}

// ───────────────────────────────────────────────────────────────
// PipelineService
// ───────────────────────────────────────────────────────────────

/// How one iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Scores were produced and emitted.
    Reported,
    /// A per-iteration error was logged and the loop moves on.
    Skipped(Error),
}

pub struct PipelineService<I, C> {
    runner: InferenceRunner<I>,
    clock: C,
    config: PipelineConfig,
    stats: PipelineStats,
}

impl<I: Interpreter, C: ClockPort> PipelineService<I, C> {
    /// Wrap a runner that has already been loaded.
    pub fn new(runner: InferenceRunner<I>, clock: C, config: PipelineConfig) -> Self {
        Self {
            runner,
            clock,
            config,
            stats: PipelineStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the loop.  Fails if the model was never loaded, so the
    /// caller can stop before entering the loop.
    pub fn start(&mut self, arena_capacity_bytes: usize, sink: &mut impl EventSink) -> Result<(), Error> {
        if self.runner.state() != RunnerState::Ready {
            return Err(InferenceError::NotReady.into());
        }
        sink.emit(&PipelineEvent::Started {
            capture_interval_ms: self.config.capture_interval_ms,
            arena_used_bytes: self.runner.arena_used_bytes(),
            arena_capacity_bytes,
        });
        info!(
            "PipelineService started: {} labels, every {} ms",
            self.runner.labels().len(),
            self.config.capture_interval_ms
        );
        Ok(())
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one capture → preprocess → infer → report cycle.
    ///
    /// Every frame acquired here is released before this returns.  Errors
    /// never escape: they are counted, emitted as
    /// [`PipelineEvent::IterationSkipped`], and returned as the outcome.
    pub fn run_iteration<S: FrameSource>(
        &mut self,
        source: &mut S,
        sink: &mut impl EventSink,
    ) -> IterationOutcome {
        self.stats.iterations += 1;
        sink.emit(&PipelineEvent::CaptureRequested {
            iteration: self.stats.iterations,
        });

        let result = match source.acquire_frame() {
            None => Err(Error::from(AcquireError::NoFrame)),
            Some(frame) => {
                let lease = FrameLease::new(source, frame);
                let result = self.classify(lease.frame(), sink);
                lease.release();
                sink.emit(&PipelineEvent::FrameReleased);
                result
            }
        };

        let outcome = match result {
            Ok(()) => {
                self.stats.classified += 1;
                IterationOutcome::Reported
            }
            Err(e) => {
                warn!("Iteration {} skipped: {}", self.stats.iterations, e);
                self.stats.record_skip(&e);
                sink.emit(&PipelineEvent::IterationSkipped(e));
                IterationOutcome::Skipped(e)
            }
        };

        let every = u64::from(self.config.stats_interval_iterations);
        if every > 0 && self.stats.iterations % every == 0 {
            sink.emit(&PipelineEvent::Stats(self.stats));
        }
        outcome
    }

    /// Preprocess, invoke and report one frame.  The caller owns release.
    fn classify(&mut self, frame: &impl FrameBuffer, sink: &mut impl EventSink) -> Result<(), Error> {
        sink.emit(&PipelineEvent::FrameCaptured {
            width: frame.width(),
            height: frame.height(),
            len: frame.len(),
        });

        let input = self.runner.input_tensor()?;
        resize_and_normalize(frame, input)?;
        sink.emit(&PipelineEvent::Preprocessed);

        sink.emit(&PipelineEvent::InvokeStarted);
        let started = self.clock.uptime_us();
        self.runner.invoke()?;
        let invoke_us = self.clock.uptime_us().saturating_sub(started);

        let result = self.runner.read_output()?;
        sink.emit(&PipelineEvent::Classified {
            result: &result,
            invoke_us,
        });
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn runner(&self) -> &InferenceRunner<I> {
        &self.runner
    }
}
