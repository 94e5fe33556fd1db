//! Port traits: the hexagonal boundary between the pipeline and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PipelineService (domain)
//! ```
//!
//! The camera driver, the interpreter, log rendering and the clock all
//! implement these traits.  [`PipelineService`](super::service::PipelineService)
//! consumes them via generics, so the capture loop never touches hardware
//! directly and runs unchanged against host mocks.

use crate::config::SensorConfig;
use crate::error::{InferenceError, InitError};
use crate::frame::FrameBuffer;

use super::events::PipelineEvent;

// ───────────────────────────────────────────────────────────────
// Frame source (driven adapter: sensor → domain)
// ───────────────────────────────────────────────────────────────

/// Produces one frame buffer per request.
///
/// At most one frame is outstanding: every frame returned by
/// [`acquire_frame`](Self::acquire_frame) must be handed back to
/// [`release_frame`](Self::release_frame) before the next acquire.
pub trait FrameSource {
    type Frame: FrameBuffer;

    /// Configure the sensor.  Called exactly once at startup; an error here
    /// is fatal.
    fn initialize(&mut self, config: &SensorConfig) -> Result<(), InitError>;

    /// Block until a frame is captured.  `None` means skip this iteration.
    fn acquire_frame(&mut self) -> Option<Self::Frame>;

    /// Return a frame's memory to the driver.
    fn release_frame(&mut self, frame: Self::Frame);
}

// ───────────────────────────────────────────────────────────────
// Interpreter (driven adapter: domain → model execution)
// ───────────────────────────────────────────────────────────────

/// A loaded model whose tensors live in an arena the implementation owns.
pub trait Interpreter {
    /// The input tensor, written in place before each invocation.
    fn input_tensor(&mut self) -> &mut [f32];

    /// Execute the graph on the current input tensor.
    fn invoke(&mut self) -> Result<(), InferenceError>;

    /// Output scores of the last invocation, one per class.
    fn output_tensor(&self) -> &[f32];

    /// Bytes of the arena claimed by the planned tensors.
    fn arena_used_bytes(&self) -> usize;
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The pipeline emits structured [`PipelineEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &PipelineEvent<'_>);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic time since boot.
pub trait ClockPort {
    fn uptime_us(&self) -> u64;
}
