//! Fixed-capacity tensor arena.
//!
//! One contiguous buffer, allocated once at boot, that backs every tensor
//! the interpreter touches.  Regions are handed out by a bump reservation
//! during model load and never freed individually; the whole arena lives as
//! long as the interpreter that owns it.
//!
//! Storage is `f32` words so every region is naturally aligned for the
//! kernels.  Capacity is still declared and reported in bytes.

use core::ops::Range;

const WORD: usize = core::mem::size_of::<f32>();

/// Owned working memory for one loaded model.
pub struct TensorArena {
    words: Box<[f32]>,
    offset: usize,
}

/// Returned when a reservation does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaExhausted {
    pub requested_bytes: usize,
    pub remaining_bytes: usize,
}

impl TensorArena {
    /// Allocate an arena of `bytes` capacity (rounded down to whole words).
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            words: vec![0.0; bytes / WORD].into_boxed_slice(),
            offset: 0,
        }
    }

    /// Reserve `len` f32 elements and return their word range.
    pub fn reserve(&mut self, len: usize) -> Result<Range<usize>, ArenaExhausted> {
        if self.offset + len > self.words.len() {
            return Err(ArenaExhausted {
                requested_bytes: len * WORD,
                remaining_bytes: self.remaining_bytes(),
            });
        }
        let start = self.offset;
        self.offset += len;
        Ok(start..self.offset)
    }

    /// Drop all reservations and zero the buffer.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.words.fill(0.0);
    }

    pub fn capacity_bytes(&self) -> usize {
        self.words.len() * WORD
    }

    pub fn used_bytes(&self) -> usize {
        self.offset * WORD
    }

    pub fn remaining_bytes(&self) -> usize {
        (self.words.len() - self.offset) * WORD
    }

    pub(crate) fn words(&self) -> &[f32] {
        &self.words
    }

    pub(crate) fn words_mut(&mut self) -> &mut [f32] {
        &mut self.words
    }
}
