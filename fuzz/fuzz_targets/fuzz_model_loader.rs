//! Fuzz target: model artifact loading
//!
//! Feeds arbitrary bytes through `ModelSchema::decode` and the full
//! runner load path. Loading must either fail cleanly or yield a Ready
//! runner whose arena plan fits the offered capacity.
//!
//! cargo fuzz run fuzz_model_loader

#![no_main]

use camclassify::inference::{
    DIGIT_LABELS, InferenceRunner, MicroInterpreter, ModelSchema, RunnerState, TensorArena,
};
use libfuzzer_sys::fuzz_target;

const ARENA_BYTES: usize = 16 * 1024;

fuzz_target!(|data: &[u8]| {
    let _ = ModelSchema::decode(data);

    let mut runner: InferenceRunner<MicroInterpreter<'_>> = InferenceRunner::new(DIGIT_LABELS, 0);
    match runner.load(data, TensorArena::with_capacity(ARENA_BYTES)) {
        Ok(()) => {
            assert_eq!(runner.state(), RunnerState::Ready);
            assert!(runner.arena_used_bytes() <= ARENA_BYTES);
            if let Ok(input) = runner.input_tensor() {
                input.fill(0.5);
            }
            if runner.invoke().is_ok() {
                let result = runner.read_output().expect("output after invoke");
                assert_eq!(result.len(), DIGIT_LABELS.len());
            }
        }
        Err(_) => assert_eq!(runner.state(), RunnerState::Uninitialized),
    }
});
