//! Block index over a packed stream.
//!
//! The stream is summarized per block of [`ATOMS_PER_BLOCK`] atoms:
//!
//! - the *size plane* holds cumulative symbol counts, locating the block
//!   that contains a given position;
//! - one *rank plane* per symbol holds cumulative occurrence counts,
//!   providing rank prefixes and select entry points.
//!
//! Blocks start at segment boundaries, so a run always belongs to exactly
//! one block. The index is rebuilt after every committed mutation and only
//! exists once the stream outgrows a single block.

use crate::codec::{SEGMENT_SIZE_ATOMS, symbol_count};
use crate::cursor::RunCursor;
use crate::run::SeqOpType;

/// Atoms summarized by one index block; a multiple of the segment size.
pub(crate) const ATOMS_PER_BLOCK: usize = 256;

/// The first block whose cumulative value passes the probe, with the
/// cumulative value of the blocks before it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexFind {
    pub block: usize,
    pub prefix: u64,
}

/// Cumulative per-block values of one quantity.
#[derive(Debug, Clone)]
pub(crate) struct IndexPlane {
    pub(crate) cum: Vec<u64>,
}

impl IndexPlane {
    /// Cumulative value of the blocks before `block`.
    #[inline]
    pub fn prefix(&self, block: usize) -> u64 {
        if block == 0 { 0 } else { self.cum[block - 1] }
    }

    /// First block whose cumulative value exceeds `value`.
    pub fn find_fw_gt(&self, value: u64) -> Option<IndexFind> {
        let block = self.cum.partition_point(|&c| c <= value);
        (block < self.cum.len()).then(|| IndexFind {
            block,
            prefix: self.prefix(block),
        })
    }

    /// First block whose cumulative value reaches `value`.
    pub fn find_fw_ge(&self, value: u64) -> Option<IndexFind> {
        let block = self.cum.partition_point(|&c| c < value);
        (block < self.cum.len()).then(|| IndexFind {
            block,
            prefix: self.prefix(block),
        })
    }

    /// Total over all blocks.
    pub fn sum(&self) -> u64 {
        self.cum.last().copied().unwrap_or(0)
    }
}

/// Evaluates a comparison over per-symbol column values, given the total
/// across all symbols.
fn op_value(total: u64, col: impl Fn(usize) -> u64, symbol: u8, op: SeqOpType) -> u64 {
    let s = symbol as usize;
    match op {
        SeqOpType::Eq => col(s),
        SeqOpType::Neq => total - col(s),
        SeqOpType::Lt => (0..s).map(&col).sum(),
        SeqOpType::Le => (0..=s).map(&col).sum(),
        SeqOpType::Gt => total - (0..=s).map(&col).sum::<u64>(),
        SeqOpType::Ge => total - (0..s).map(&col).sum::<u64>(),
        SeqOpType::EqNlt => unreachable!("EqNlt is decomposed before index evaluation"),
    }
}

/// Per-block summaries of a packed stream.
#[derive(Debug, Clone)]
pub(crate) struct SequenceIndex<const BPS: usize> {
    sizes: IndexPlane,
    ranks: Vec<IndexPlane>,
}

impl<const BPS: usize> SequenceIndex<BPS> {
    /// Builds the index, or `None` while the stream still fits one block.
    pub fn build(atoms: &[u16]) -> Option<SequenceIndex<BPS>> {
        const { assert!(ATOMS_PER_BLOCK % SEGMENT_SIZE_ATOMS == 0) };
        let code_units = atoms.len();
        if code_units <= ATOMS_PER_BLOCK {
            return None;
        }
        let blocks = code_units.div_ceil(ATOMS_PER_BLOCK);
        let symbols = symbol_count(BPS);
        let mut sizes = vec![0u64; blocks];
        let mut counts = vec![0u64; blocks * symbols];
        for (run, at) in RunCursor::<BPS>::new(atoms) {
            let block = at / ATOMS_PER_BLOCK;
            sizes[block] += run.full_run_length();
            run.full_ranks(&mut counts[block * symbols..(block + 1) * symbols]);
        }
        for b in 1..blocks {
            sizes[b] += sizes[b - 1];
            for s in 0..symbols {
                counts[b * symbols + s] += counts[(b - 1) * symbols + s];
            }
        }
        let ranks = (0..symbols)
            .map(|s| IndexPlane {
                cum: (0..blocks).map(|b| counts[b * symbols + s]).collect(),
            })
            .collect();
        Some(SequenceIndex {
            sizes: IndexPlane { cum: sizes },
            ranks,
        })
    }

    pub fn blocks(&self) -> usize {
        self.sizes.cum.len()
    }

    /// Block containing position `pos`, or `None` when `pos` is past the
    /// last stored position.
    #[inline]
    pub fn locate_pos(&self, pos: u64) -> Option<IndexFind> {
        self.sizes.find_fw_gt(pos)
    }

    /// Symbol count of the blocks before `block`.
    #[inline]
    pub fn size_prefix(&self, block: usize) -> u64 {
        self.sizes.prefix(block)
    }

    /// Occurrences of `symbol` in the blocks before `block`.
    #[inline]
    pub fn rank_prefix(&self, block: usize, symbol: usize) -> u64 {
        self.ranks[symbol].prefix(block)
    }

    /// Occurrences of `symbol` in the whole stream.
    #[inline]
    pub fn rank_total(&self, symbol: usize) -> u64 {
        self.ranks[symbol].sum()
    }

    /// Comparison-matching symbol count in the blocks before `block`.
    pub fn op_rank_prefix(&self, block: usize, symbol: u8, op: SeqOpType) -> u64 {
        op_value(
            self.sizes.prefix(block),
            |s| self.ranks[s].prefix(block),
            symbol,
            op,
        )
    }

    /// Comparison-matching symbol count in the whole stream.
    pub fn op_rank_total(&self, symbol: u8, op: SeqOpType) -> u64 {
        op_value(self.sizes.sum(), |s| self.ranks[s].sum(), symbol, op)
    }

    /// First block whose cumulative comparison-matching count exceeds
    /// `rank`, with that count for the preceding blocks.
    pub fn find_op_rank(&self, rank: u64, symbol: u8, op: SeqOpType) -> Option<IndexFind> {
        if op == SeqOpType::Eq {
            return self.ranks[symbol as usize].find_fw_gt(rank);
        }
        let mut prefix = 0;
        for block in 0..self.blocks() {
            let cum = self.op_rank_prefix(block + 1, symbol, op);
            if cum > rank {
                return Some(IndexFind { block, prefix });
            }
            prefix = cum;
        }
        None
    }
}
