//! Storage capability for packed sequences.
//!
//! A sequence does not own its atom buffer: it operates on whatever block a
//! [`SequenceStore`] exposes, and every reallocation is negotiated first.
//! [`SequenceStore::can_resize`] answers without side effects, so a prepared
//! mutation can be declined before any data moves, and `resize_block` then
//! performs the reallocation the negotiation promised.

use log::trace;
use retzef_common::Result;

use crate::codec::{SEGMENT_SIZE_ATOMS, SEGMENT_SIZE_BYTES};

/// Outcome of a resize negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocStatus {
    Granted,
    Declined,
}

/// A block of whole segments exposed as 16-bit atoms.
pub trait SequenceStore {
    /// Currently allocated block size in bytes.
    fn block_size(&self) -> usize;

    fn atoms(&self) -> &[u16];

    fn atoms_mut(&mut self) -> &mut [u16];

    /// Whether a block of `required` bytes would be granted.
    fn can_resize(&self, required: usize) -> AllocStatus;

    /// Reallocates the block to `required` bytes, zero-filling growth.
    fn resize_block(&mut self, required: usize) -> Result<()>;
}

/// Block size in bytes covering `units` atoms, rounded to whole segments.
#[inline]
pub fn compute_block_size(units: usize) -> usize {
    units.div_ceil(SEGMENT_SIZE_ATOMS) * SEGMENT_SIZE_BYTES
}

/// In-memory store over a vector of 64-bit segments, with an optional hard
/// budget in bytes.
#[derive(Debug, Clone, Default)]
pub struct HeapStore {
    segments: Vec<u64>,
    limit: Option<usize>,
}

impl HeapStore {
    /// A store that grants every resize.
    pub fn unbounded() -> HeapStore {
        HeapStore::default()
    }

    /// A store that declines growth beyond `limit` bytes.
    pub fn with_limit(limit: usize) -> HeapStore {
        HeapStore {
            segments: Vec::new(),
            limit: Some(limit),
        }
    }
}

impl SequenceStore for HeapStore {
    fn block_size(&self) -> usize {
        self.segments.len() * SEGMENT_SIZE_BYTES
    }

    fn atoms(&self) -> &[u16] {
        bytemuck::cast_slice(&self.segments)
    }

    fn atoms_mut(&mut self) -> &mut [u16] {
        bytemuck::cast_slice_mut(&mut self.segments)
    }

    fn can_resize(&self, required: usize) -> AllocStatus {
        match self.limit {
            Some(limit) if required > limit && required > self.block_size() => {
                AllocStatus::Declined
            }
            _ => AllocStatus::Granted,
        }
    }

    fn resize_block(&mut self, required: usize) -> Result<()> {
        let segments = required.div_ceil(SEGMENT_SIZE_BYTES);
        trace!(
            "heap store resize: {} -> {} segments",
            self.segments.len(),
            segments
        );
        self.segments.resize(segments, 0);
        Ok(())
    }
}
