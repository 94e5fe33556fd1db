//! Inference runner: owns the interpreter and drives the invoke cycle.
//!
//! ```text
//!  Uninitialized ──load()──▶ Ready ──invoke()──▶ Invoking ──▶ Ready
//!                                 ◀──────────────────────────┘
//! ```
//!
//! Constructed once at boot and passed into the capture loop; the arena,
//! input tensor, and output tensor are all owned through the interpreter.

use log::info;

use super::arena::TensorArena;
use super::interpreter::MicroInterpreter;
use crate::app::ports::Interpreter;
use crate::error::{InferenceError, ModelLoadError};
use crate::preprocess::{INPUT_LEN, NormalizedTensor};

/// Upper bound on classes a report can carry.
pub const MAX_CLASSES: usize = 32;

/// Class labels, indexed by model output position.
pub type LabelTable = &'static [&'static str];

/// Labels for the digit classifier shipped with this firmware.
pub const DIGIT_LABELS: LabelTable = &["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Uninitialized,
    Ready,
    Invoking,
}

/// One labelled score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub index: usize,
    pub label: &'static str,
    pub probability: f32,
}

/// Scores for one invocation, in class-index order.
#[derive(Debug, Clone, Default)]
pub struct ClassificationResult {
    entries: heapless::Vec<Classification, MAX_CLASSES>,
}

impl ClassificationResult {
    pub fn iter(&self) -> impl Iterator<Item = &Classification> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Classification] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest-scoring class; the lowest index wins ties.
    pub fn top(&self) -> Option<&Classification> {
        self.entries.iter().fold(None, |best, c| match best {
            Some(b) if b.probability >= c.probability => Some(b),
            _ => Some(c),
        })
    }
}

pub struct InferenceRunner<I> {
    interpreter: Option<I>,
    state: RunnerState,
    labels: LabelTable,
    first_reported_class: usize,
    /// Set by a successful `invoke`, cleared when the input is rewritten.
    output_valid: bool,
}

impl<I: Interpreter> InferenceRunner<I> {
    pub fn new(labels: LabelTable, first_reported_class: usize) -> Self {
        Self {
            interpreter: None,
            state: RunnerState::Uninitialized,
            labels,
            first_reported_class,
            output_valid: false,
        }
    }

    /// Adopt an already-loaded interpreter, checking its tensor sizes
    /// against the compile-time input size and the label table.
    pub fn bind(&mut self, mut interpreter: I) -> Result<(), ModelLoadError> {
        if self.state != RunnerState::Uninitialized {
            return Err(ModelLoadError::AlreadyLoaded);
        }
        let input_len = interpreter.input_tensor().len();
        if input_len != INPUT_LEN {
            return Err(ModelLoadError::InputSize {
                expected: INPUT_LEN,
                actual: input_len,
            });
        }
        let classes = interpreter.output_tensor().len();
        if classes != self.labels.len() || classes > MAX_CLASSES {
            return Err(ModelLoadError::OutputSize {
                expected: self.labels.len().min(MAX_CLASSES),
                actual: classes,
            });
        }
        if self.first_reported_class >= classes {
            return Err(ModelLoadError::FirstClassOutOfRange {
                first: self.first_reported_class,
                classes,
            });
        }

        self.interpreter = Some(interpreter);
        self.state = RunnerState::Ready;
        self.output_valid = false;
        Ok(())
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn labels(&self) -> LabelTable {
        self.labels
    }

    pub fn interpreter(&self) -> Option<&I> {
        self.interpreter.as_ref()
    }

    pub fn arena_used_bytes(&self) -> usize {
        self.interpreter
            .as_ref()
            .map_or(0, Interpreter::arena_used_bytes)
    }

    /// The input slot, reused across iterations.  Borrowing it invalidates
    /// the previous output.
    pub fn input_tensor(&mut self) -> Result<&mut NormalizedTensor, InferenceError> {
        let interp = self.interpreter.as_mut().ok_or(InferenceError::NotReady)?;
        self.output_valid = false;
        interp
            .input_tensor()
            .try_into()
            .map_err(|_| InferenceError::NotReady)
    }

    /// Run the graph on the current input tensor.
    pub fn invoke(&mut self) -> Result<(), InferenceError> {
        let interp = self.interpreter.as_mut().ok_or(InferenceError::NotReady)?;
        self.state = RunnerState::Invoking;
        let result = interp.invoke();
        self.state = RunnerState::Ready;
        self.output_valid = result.is_ok();
        result
    }

    /// Label the output scores of the last successful invocation.
    pub fn read_output(&self) -> Result<ClassificationResult, InferenceError> {
        let interp = self.interpreter.as_ref().ok_or(InferenceError::NotReady)?;
        if !self.output_valid {
            return Err(InferenceError::NoValidOutput);
        }
        let mut result = ClassificationResult::default();
        let scored = self.labels.iter().zip(interp.output_tensor()).enumerate();
        for (index, (&label, &probability)) in scored.skip(self.first_reported_class) {
            // Capacity was checked in bind().
            let _ = result.entries.push(Classification {
                index,
                label,
                probability,
            });
        }
        Ok(result)
    }
}

impl<'m> InferenceRunner<MicroInterpreter<'m>> {
    /// `Uninitialized → Ready`: parse `model` and plan it into `arena`.
    pub fn load(&mut self, model: &'m [u8], arena: TensorArena) -> Result<(), ModelLoadError> {
        if self.state != RunnerState::Uninitialized {
            return Err(ModelLoadError::AlreadyLoaded);
        }
        let interpreter = MicroInterpreter::load(model, arena)?;
        self.bind(interpreter)?;
        info!(
            "InferenceRunner ready: {} classes (reporting from #{}), arena {} bytes used",
            self.labels.len(),
            self.first_reported_class,
            self.arena_used_bytes()
        );
        Ok(())
    }
}
