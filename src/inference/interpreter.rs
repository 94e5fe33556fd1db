//! Micro interpreter: executes a [`ModelSchema`] inside a [`TensorArena`].
//!
//! All memory is planned at load time:
//!
//! ```text
//! arena: ┌──────────────┬──────────────────┬──────────────────┬ ─ ─ ─ ─ ┐
//!        │ input tensor │ activation slot A │ activation slot B │  unused
//!        └──────────────┴──────────────────┴──────────────────┴ ─ ─ ─ ─ ┘
//! ```
//!
//! Operators ping-pong between the two activation slots (op 0 reads the
//! input and writes A, op 1 reads A and writes B, ...).  Each slot is sized
//! for the largest intermediate tensor.  The output tensor is the prefix of
//! whichever slot the last operator wrote.

use core::ops::Range;

use log::{debug, info};

use super::arena::TensorArena;
use super::kernels;
use super::model::{ModelSchema, Shape};
use crate::app::ports::Interpreter;
use crate::error::{InferenceError, ModelLoadError};

pub struct MicroInterpreter<'m> {
    schema: ModelSchema<'m>,
    /// Output shape of each operator.
    shapes: Vec<Shape>,
    arena: TensorArena,
    input: Range<usize>,
    slot_len: usize,
    output: Range<usize>,
}

impl<'m> MicroInterpreter<'m> {
    /// Parse `model`, resolve kernels, and carve every tensor out of `arena`.
    pub fn load(model: &'m [u8], mut arena: TensorArena) -> Result<Self, ModelLoadError> {
        let schema = ModelSchema::decode(model)?;
        let shapes = schema.infer_shapes()?;

        let input_len = schema.input_shape().len();
        let slot_len = shapes.iter().map(Shape::len).max().unwrap_or(0);
        let slots = if shapes.len() > 1 { 2 } else { 1 };

        let required = slot_len
            .saturating_mul(slots)
            .saturating_add(input_len)
            .saturating_mul(core::mem::size_of::<f32>());
        let capacity = arena.capacity_bytes();
        if required > capacity {
            return Err(ModelLoadError::ArenaTooSmall { required, capacity });
        }

        arena.reset();
        let too_small = |_| ModelLoadError::ArenaTooSmall { required, capacity };
        let input = arena.reserve(input_len).map_err(too_small)?;
        let slot_a = arena.reserve(slot_len).map_err(too_small)?;
        let slot_b = if slots == 2 {
            arena.reserve(slot_len).map_err(too_small)?
        } else {
            slot_a.end..slot_a.end
        };

        let last = shapes.len() - 1;
        let out_slot = if last % 2 == 0 { slot_a } else { slot_b };
        let output = out_slot.start..out_slot.start + shapes[last].len();

        for (i, op) in schema.ops.iter().enumerate() {
            debug!("op {:>2}: {:<16} -> {:?}", i, op.name(), shapes[i]);
        }
        info!(
            "Model loaded: {} ops, input {:?}, output {} values, arena {}/{} bytes",
            schema.ops.len(),
            schema.input_shape(),
            shapes[last].len(),
            arena.used_bytes(),
            capacity
        );

        Ok(Self {
            schema,
            shapes,
            arena,
            input,
            slot_len,
            output,
        })
    }

    pub fn input_shape(&self) -> Shape {
        self.schema.input_shape()
    }

    pub fn op_count(&self) -> usize {
        self.schema.ops.len()
    }

    pub fn arena_capacity_bytes(&self) -> usize {
        self.arena.capacity_bytes()
    }

    fn run_graph(&mut self) -> Result<(), InferenceError> {
        let words = self.arena.words_mut();
        let (input, rest) = words.split_at_mut(self.input.end);
        let input: &[f32] = &input[self.input.clone()];
        let (slot_a, slot_b) = rest.split_at_mut(self.slot_len);

        let mut in_shape = self.schema.input_shape();
        for (i, op) in self.schema.ops.iter().enumerate() {
            let out_shape = self.shapes[i];
            let (src, dst): (&[f32], &mut [f32]) = if i == 0 {
                (input, &mut slot_a[..])
            } else if i % 2 == 1 {
                (&slot_a[..], &mut slot_b[..])
            } else {
                (&slot_b[..], &mut slot_a[..])
            };
            if src.len() < in_shape.len() || dst.len() < out_shape.len() {
                return Err(InferenceError::KernelFailed { op: i });
            }
            kernels::eval(
                op,
                &src[..in_shape.len()],
                in_shape,
                out_shape,
                &mut dst[..out_shape.len()],
            );
            in_shape = out_shape;
        }
        Ok(())
    }
}

impl Interpreter for MicroInterpreter<'_> {
    fn input_tensor(&mut self) -> &mut [f32] {
        &mut self.arena.words_mut()[self.input.clone()]
    }

    fn invoke(&mut self) -> Result<(), InferenceError> {
        if !self.arena.words()[self.input.clone()].iter().all(|v| v.is_finite()) {
            return Err(InferenceError::NonFiniteInput);
        }
        self.run_graph()?;
        if !self.output_tensor().iter().all(|v| v.is_finite()) {
            return Err(InferenceError::NonFiniteOutput);
        }
        Ok(())
    }

    fn output_tensor(&self) -> &[f32] {
        &self.arena.words()[self.output.clone()]
    }

    fn arena_used_bytes(&self) -> usize {
        self.arena.used_bytes()
    }
}
