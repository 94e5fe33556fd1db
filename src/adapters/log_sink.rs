//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by rendering pipeline events as tagged lines on
//! the ESP-IDF logger (UART / USB-CDC in production).  One `RESULT` line is
//! written per reported class.

use log::{debug, info, warn};

use crate::app::events::PipelineEvent;
use crate::app::ports::EventSink;
use crate::config::{MODEL_IMAGE_HEIGHT, MODEL_IMAGE_WIDTH};

/// Adapter that logs every [`PipelineEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::Started {
                capture_interval_ms,
                arena_used_bytes,
                arena_capacity_bytes,
            } => {
                info!(
                    "START | interval={}ms | arena={}/{} bytes",
                    capture_interval_ms, arena_used_bytes, arena_capacity_bytes
                );
            }
            PipelineEvent::CaptureRequested { iteration } => {
                info!("CAPTURE | #{} taking picture", iteration);
            }
            PipelineEvent::FrameCaptured { width, height, len } => {
                info!("CAPTURE | {}x{} | size={} bytes", width, height, len);
            }
            PipelineEvent::Preprocessed => {
                info!(
                    "PREPROC | resized to {}x{}, normalized",
                    MODEL_IMAGE_WIDTH, MODEL_IMAGE_HEIGHT
                );
            }
            PipelineEvent::InvokeStarted => {
                debug!("INFER | invoking");
            }
            PipelineEvent::Classified { result, invoke_us } => {
                info!("INFER | done in {} us", invoke_us);
                for c in result.iter() {
                    info!("RESULT | label={} prob={:.4}", c.label, c.probability);
                }
                if let Some(top) = result.top() {
                    info!("RESULT | top={} ({:.4})", top.label, top.probability);
                }
            }
            PipelineEvent::FrameReleased => {
                debug!("CAPTURE | frame released");
            }
            PipelineEvent::IterationSkipped(e) => {
                warn!("SKIP | {}", e);
            }
            PipelineEvent::Stats(s) => {
                info!(
                    "STATS | iterations={} classified={} skipped={} \
                     (acquire={} preprocess={} inference={})",
                    s.iterations,
                    s.classified,
                    s.skipped(),
                    s.acquire_failures,
                    s.preprocess_failures,
                    s.inference_failures,
                );
            }
        }
    }
}
