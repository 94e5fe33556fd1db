//! On-device classifier: model format, arena planning and execution.
//!
//! ```text
//!  model bytes ──▶ ModelSchema ──▶ MicroInterpreter ──▶ InferenceRunner
//!                                   (owns TensorArena)
//! ```

pub mod arena;
pub mod interpreter;
pub mod kernels;
pub mod model;
pub mod runner;

pub use arena::TensorArena;
pub use interpreter::MicroInterpreter;
pub use model::{ModelSchema, Op, Padding, TensorShape};
pub use runner::{
    Classification, ClassificationResult, DIGIT_LABELS, InferenceRunner, LabelTable, MAX_CLASSES,
    RunnerState,
};
