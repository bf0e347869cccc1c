//! Succinct run-length-encoded symbol sequences over small alphabets.
//!
//! An [`SsrleSequence`] stores a sequence of `BPS`-bit symbols as a packed
//! stream of pattern runs inside an externally managed atom block, and
//! answers positional queries directly on the packed form:
//!
//! - `access` reads the symbol at a position;
//! - `rank`, `select_fw`, `select_bw` and the `count_*` operations resolve
//!   ordered queries under any [`SeqOpType`] comparison;
//! - edits (`insert`, `remove`, `update`, merge and split) follow a
//!   prepare/commit protocol that lets the block owner veto reallocation
//!   before anything changes.
//!
//! Storage is negotiated through the [`SequenceStore`] trait; [`HeapStore`]
//! is the in-memory implementation.

pub mod codec;
mod cursor;
mod index;
pub mod run;
mod segment;
pub mod sequence;
pub mod store;
#[cfg(test)]
mod tests;

pub use run::{Run, SeqOpType};
pub use sequence::{
    InsertPlan, MergePlan, Prepared, RemovePlan, SelectResult, SsrleSequence, UpdatePlan,
};
pub use store::{AllocStatus, HeapStore, SequenceStore};
