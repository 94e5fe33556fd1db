//! CamClassify Firmware: Main Entry Point
//!
//! Hexagonal architecture around a single cooperative capture loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  CameraDriver      LogEventSink     MonotonicClock   Watchdog  │
//! │  (FrameSource)     (EventSink)      (ClockPort)      (TWDT)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            PipelineService (pure logic)                │    │
//! │  │  preprocess · InferenceRunner(MicroInterpreter+arena)  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::{Context, Result};
use embedded_hal::delay::DelayNs;
use esp_idf_hal::delay::FreeRtos;
use log::{error, info};

use camclassify::adapters::log_sink::LogEventSink;
use camclassify::adapters::time::MonotonicClock;
use camclassify::app::ports::FrameSource;
use camclassify::app::service::PipelineService;
use camclassify::config::{PipelineConfig, SensorConfig};
use camclassify::drivers::camera::CameraDriver;
use camclassify::drivers::watchdog::Watchdog;
use camclassify::error::Error;
use camclassify::inference::{DIGIT_LABELS, InferenceRunner, TensorArena};

/// Classifier artifact embedded at build time (see `build.rs`).
static MODEL: &[u8] = include_bytes!(env!("CAMCLASSIFY_MODEL"));

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  CamClassify v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let sensor_config = SensorConfig::default();
    let config = PipelineConfig::default();
    config.validate().context("pipeline config")?;

    // ── 3. Camera (fatal on failure) ──────────────────────────
    let mut camera = CameraDriver::new();
    if let Err(e) = camera.initialize(&sensor_config) {
        error!("Camera init failed: {}; not entering capture loop", e);
        return Err(Error::from(e)).context("camera init");
    }

    // ── 4. Model + arena (fatal on failure) ───────────────────
    let arena = TensorArena::with_capacity(config.arena_size_bytes);
    let arena_capacity = arena.capacity_bytes();
    let mut runner = InferenceRunner::new(DIGIT_LABELS, config.first_reported_class);
    if let Err(e) = runner.load(MODEL, arena) {
        error!("Model load failed: {}; not entering capture loop", e);
        return Err(Error::from(e)).context("model load");
    }

    // ── 5. Service wiring ─────────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut watchdog = Watchdog::new(config.watchdog_timeout_ms);
    let interval_ms = config.capture_interval_ms;
    let mut service = PipelineService::new(runner, MonotonicClock::new(), config);
    service.start(arena_capacity, &mut sink)?;

    info!("System ready. Entering capture loop.");

    // ── 6. Capture loop ───────────────────────────────────────
    let mut delay = FreeRtos;
    loop {
        service.run_iteration(&mut camera, &mut sink);
        watchdog.feed();
        delay.delay_ms(interval_ms);
    }
}
