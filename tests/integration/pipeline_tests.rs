//! Integration tests for PipelineService → preprocess → runner → EventSink.
//!
//! A stub quadrant interpreter stands in for the model so the tests can
//! reason about exact scores.

use camclassify::app::service::{IterationOutcome, PipelineService};
use camclassify::config::PipelineConfig;
use camclassify::error::{AcquireError, Error, InferenceError, PreprocessError};
use camclassify::inference::InferenceRunner;
use camclassify::preprocess::{INPUT_LEN, resize_and_normalize};

use super::mock_hw::{
    FakeClock, MockFrame, MockFrameSource, QUADRANT_LABELS, QuadrantInterpreter, Recorded,
    RecordingSink,
};

type Service = PipelineService<QuadrantInterpreter, FakeClock>;

fn make_service(config: PipelineConfig) -> Service {
    let mut runner = InferenceRunner::new(QUADRANT_LABELS, config.first_reported_class);
    runner.bind(QuadrantInterpreter::new()).unwrap();
    PipelineService::new(runner, FakeClock::new(1_500), config)
}

fn quiet_config() -> PipelineConfig {
    PipelineConfig {
        stats_interval_iterations: 0,
        ..PipelineConfig::default()
    }
}

/// 320×240 QVGA frame, bright square at columns 40..120, rows 30..100.
fn qvga_with_square() -> MockFrame {
    MockFrame::bright_square(320, 240, 40..120, 30..100)
}

// ── End to end ────────────────────────────────────────────────

#[test]
fn bright_square_maps_to_tensor_region() {
    let mut tensor = [0.5f32; INPUT_LEN];
    resize_and_normalize(&qvga_with_square(), &mut tensor).unwrap();

    // Destination pixels whose sample centres fall inside the square.
    for y in 0..32 {
        for x in 0..32 {
            let v = tensor[y * 32 + x];
            if (4..=11).contains(&x) && (4..=12).contains(&y) {
                assert_eq!(v, 1.0, "inside square at ({x},{y})");
            } else {
                assert_eq!(v, 0.0, "outside square at ({x},{y})");
            }
        }
    }
}

#[test]
fn bright_square_reports_top_left() {
    let mut service = make_service(quiet_config());
    let mut source = MockFrameSource::new(Some(qvga_with_square()));
    let mut sink = RecordingSink::new();

    let outcome = service.run_iteration(&mut source, &mut sink);
    assert_eq!(outcome, IterationOutcome::Reported);

    let classified = sink.classified();
    assert_eq!(classified.len(), 1);
    let Recorded::Classified { scores, top, .. } = classified[0] else {
        unreachable!()
    };
    assert_eq!(*top, Some("top_left"));
    assert_eq!(scores.len(), 4);
    // 8 × 9 bright pixels in a 16 × 16 quadrant.
    assert!((scores[0].2 - 72.0 / 256.0).abs() < 1e-6);
    assert!(scores[1..].iter().all(|s| s.2 == 0.0));

    let interp = service.runner().interpreter().unwrap();
    assert_eq!(interp.last_input.iter().filter(|&&v| v == 1.0).count(), 72);
}

#[test]
fn successful_iteration_emits_events_in_order() {
    let mut service = make_service(quiet_config());
    let mut source = MockFrameSource::new(Some(MockFrame::grayscale(160, 120, 40)));
    let mut sink = RecordingSink::new();

    service.run_iteration(&mut source, &mut sink);

    let kinds: Vec<&str> = sink
        .events
        .iter()
        .map(|e| match e {
            Recorded::CaptureRequested(_) => "capture",
            Recorded::FrameCaptured { .. } => "captured",
            Recorded::Preprocessed => "preproc",
            Recorded::InvokeStarted => "invoke",
            Recorded::Classified { .. } => "classified",
            Recorded::FrameReleased => "released",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        ["capture", "captured", "preproc", "invoke", "classified", "released"]
    );
    assert_eq!(
        sink.events[1],
        Recorded::FrameCaptured {
            width: 160,
            height: 120,
            len: 160 * 120
        }
    );
}

#[test]
fn invoke_duration_comes_from_clock() {
    let mut service = make_service(quiet_config());
    let mut source = MockFrameSource::new(Some(MockFrame::grayscale(32, 32, 0)));
    let mut sink = RecordingSink::new();

    service.run_iteration(&mut source, &mut sink);
    let classified = sink.classified();
    let Recorded::Classified { invoke_us, .. } = classified[0] else {
        unreachable!()
    };
    assert_eq!(*invoke_us, 1_500);
}

// ── Resource balance ──────────────────────────────────────────

#[test]
fn every_acquired_frame_is_released_before_next_acquire() {
    let mut service = make_service(quiet_config());
    let mut source = MockFrameSource::new(Some(MockFrame::grayscale(320, 240, 128)))
        .then(None)
        .then(Some(MockFrame::grayscale(0, 240, 0)))
        .then(Some(MockFrame::grayscale(320, 240, 7)))
        .then(None);
    let mut sink = RecordingSink::new();

    for _ in 0..20 {
        service.run_iteration(&mut source, &mut sink);
        assert_eq!(source.outstanding, 0);
    }

    assert!(!source.overlapped);
    assert_eq!(source.acquired, 18);
    assert_eq!(source.released, source.acquired);
    assert_eq!(sink.count(|e| *e == Recorded::FrameReleased), 18);
}

// ── Skip paths ────────────────────────────────────────────────

#[test]
fn missing_frame_skips_without_release() {
    let mut service = make_service(quiet_config());
    let mut source = MockFrameSource::new(None);
    let mut sink = RecordingSink::new();

    let outcome = service.run_iteration(&mut source, &mut sink);

    let expected = Error::Acquire(AcquireError::NoFrame);
    assert_eq!(outcome, IterationOutcome::Skipped(expected));
    assert_eq!(source.released, 0);
    assert_eq!(
        sink.events,
        vec![Recorded::CaptureRequested(1), Recorded::Skipped(expected)]
    );
    assert_eq!(service.runner().interpreter().unwrap().invocations, 0);
}

#[test]
fn degenerate_frame_skips_and_still_releases() {
    let mut service = make_service(quiet_config());
    let mut source = MockFrameSource::new(Some(MockFrame::grayscale(0, 240, 0)));
    let mut sink = RecordingSink::new();

    let outcome = service.run_iteration(&mut source, &mut sink);

    assert_eq!(
        outcome,
        IterationOutcome::Skipped(Error::Preprocess(PreprocessError::DegenerateFrame {
            width: 0,
            height: 240
        }))
    );
    assert_eq!(source.released, 1);
    assert!(sink.classified().is_empty());
    assert_eq!(sink.count(|e| *e == Recorded::Preprocessed), 0);
    assert_eq!(service.runner().interpreter().unwrap().invocations, 0);
}

#[test]
fn short_buffer_skips_and_still_releases() {
    let mut service = make_service(quiet_config());
    let mut frame = MockFrame::grayscale(320, 240, 0);
    frame.data.truncate(1000);
    let mut source = MockFrameSource::new(Some(frame));
    let mut sink = RecordingSink::new();

    let outcome = service.run_iteration(&mut source, &mut sink);
    assert!(matches!(
        outcome,
        IterationOutcome::Skipped(Error::Preprocess(PreprocessError::BufferTooShort { .. }))
    ));
    assert_eq!(source.released, 1);
}

#[test]
fn inference_failure_skips_reporting_and_continues() {
    let mut runner = InferenceRunner::new(QUADRANT_LABELS, 0);
    let mut interp = QuadrantInterpreter::new();
    interp.fail_with = Some(InferenceError::NonFiniteOutput);
    runner.bind(interp).unwrap();
    let mut service = PipelineService::new(runner, FakeClock::new(1), quiet_config());
    let mut source = MockFrameSource::new(Some(MockFrame::grayscale(64, 48, 200)));
    let mut sink = RecordingSink::new();

    for _ in 0..3 {
        let outcome = service.run_iteration(&mut source, &mut sink);
        assert_eq!(
            outcome,
            IterationOutcome::Skipped(Error::Inference(InferenceError::NonFiniteOutput))
        );
    }
    assert!(sink.classified().is_empty());
    assert_eq!(source.released, 3);
    assert_eq!(service.stats().inference_failures, 3);
    assert_eq!(service.stats().iterations, 3);
}

#[test]
fn loop_recovers_after_failed_iterations() {
    let mut service = make_service(quiet_config());
    let mut source = MockFrameSource::new(Some(MockFrame::grayscale(320, 240, 128)))
        .then(None)
        .then(Some(MockFrame::grayscale(320, 0, 0)));
    let mut sink = RecordingSink::new();

    let outcomes: Vec<_> = (0..3)
        .map(|_| service.run_iteration(&mut source, &mut sink))
        .collect();
    assert!(matches!(outcomes[0], IterationOutcome::Skipped(Error::Acquire(_))));
    assert!(matches!(outcomes[1], IterationOutcome::Skipped(Error::Preprocess(_))));
    assert_eq!(outcomes[2], IterationOutcome::Reported);

    let stats = service.stats();
    assert_eq!(stats.iterations, 3);
    assert_eq!(stats.classified, 1);
    assert_eq!(stats.acquire_failures, 1);
    assert_eq!(stats.preprocess_failures, 1);
    assert_eq!(stats.skipped(), 2);
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn first_reported_class_one_omits_index_zero() {
    let config = PipelineConfig {
        first_reported_class: 1,
        ..quiet_config()
    };
    let mut service = make_service(config);
    let mut source = MockFrameSource::new(Some(qvga_with_square()));
    let mut sink = RecordingSink::new();

    service.run_iteration(&mut source, &mut sink);
    let classified = sink.classified();
    let Recorded::Classified { scores, top, .. } = classified[0] else {
        unreachable!()
    };
    let labels: Vec<&str> = scores.iter().map(|s| s.1).collect();
    assert_eq!(labels, ["top_right", "bottom_left", "bottom_right"]);
    assert_eq!(scores[0].0, 1);
    // The bright quadrant is no longer reported, so all remaining scores tie.
    assert_eq!(*top, Some("top_right"));
}

#[test]
fn stats_are_emitted_every_n_iterations() {
    let config = PipelineConfig {
        stats_interval_iterations: 3,
        ..PipelineConfig::default()
    };
    let mut service = make_service(config);
    let mut source = MockFrameSource::new(Some(MockFrame::grayscale(32, 32, 0))).then(None);
    let mut sink = RecordingSink::new();

    for _ in 0..7 {
        service.run_iteration(&mut source, &mut sink);
    }
    let stats: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            Recorded::Stats(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].iterations, 3);
    assert_eq!(stats[0].acquire_failures, 1);
    assert_eq!(stats[0].classified, 2);
    assert_eq!(stats[1].iterations, 6);
}

#[test]
fn start_announces_loop_once_loaded() {
    let mut service = make_service(PipelineConfig::default());
    let mut sink = RecordingSink::new();
    service.start(61_440, &mut sink).unwrap();
    assert_eq!(sink.events, vec![Recorded::Started]);
}

#[test]
fn start_refuses_unloaded_runner() {
    let runner: InferenceRunner<QuadrantInterpreter> = InferenceRunner::new(QUADRANT_LABELS, 0);
    let mut service = PipelineService::new(runner, FakeClock::new(1), PipelineConfig::default());
    let mut sink = RecordingSink::new();
    assert_eq!(
        service.start(61_440, &mut sink),
        Err(Error::Inference(InferenceError::NotReady))
    );
    assert!(sink.events.is_empty());
}
