//! The SSRLE sequence object: queries and two-phase mutations.
//!
//! [`SsrleSequence`] interprets the atom block of a [`SequenceStore`] as a
//! packed run stream and keeps the derived state next to it: the symbol
//! count, the occupied atom count and the optional block index.
//!
//! Reads never mutate. Writes are split in two:
//!
//! - `prepare_*` computes the complete post-edit run list, packs its size
//!   and asks the store whether the required block would be granted. It
//!   returns [`Prepared::Ready`] with an opaque plan, or
//!   [`Prepared::Declined`] with the negotiated sizes. The sequence is not
//!   touched either way.
//! - `commit_*` consumes the plan by value, resizes the block through the
//!   store, rewrites every segment from atom zero, updates the metadata and
//!   rebuilds the index.
//!
//! A declined allocation is a status, not an error; the one-shot
//! conveniences (`append`, `insert_symbols`) convert it into an error for
//! callers that have no fallback.

use std::fmt;

use log::{debug, trace};
use retzef_common::{Result, error::Error, verify_arg, verify_data};

use crate::cursor::RunCursor;
use crate::index::{ATOMS_PER_BLOCK, SequenceIndex};
use crate::run::{Run, SeqOpType, compactify_runs, count_symbols, runs_from_symbols};
use crate::segment;
use crate::store::{AllocStatus, SequenceStore, compute_block_size};

/// Result of a select query: the found position and the achieved rank.
/// When fewer matches exist, `idx` is the not-found position (the sequence
/// size for forward queries) and `rank` is the total match count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectResult {
    pub idx: u64,
    pub rank: u64,
}

/// Outcome of a `prepare_*` call.
#[must_use = "a prepared mutation does nothing until committed"]
#[derive(Debug)]
pub enum Prepared<P> {
    /// The store would grant the required block; commit with the plan.
    Ready(P),
    /// The store declined the required block size; nothing changed.
    Declined { existing: usize, required: usize },
}

impl<P> Prepared<P> {
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Prepared::Ready(_))
    }

    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> Prepared<Q> {
        match self {
            Prepared::Ready(plan) => Prepared::Ready(f(plan)),
            Prepared::Declined { existing, required } => Prepared::Declined { existing, required },
        }
    }

    /// Unwraps the plan, turning a declined allocation into an error.
    pub fn ready(self) -> Result<P> {
        match self {
            Prepared::Ready(plan) => Ok(plan),
            Prepared::Declined { existing, required } => {
                Err(Error::allocation_declined(existing, required))
            }
        }
    }
}

/// The complete post-edit state a commit applies verbatim.
#[derive(Debug)]
struct WritePlan<const BPS: usize> {
    runs: Vec<Run<BPS>>,
    code_units: usize,
    new_size: u64,
}

/// Plan produced by [`SsrleSequence::prepare_insert`].
#[derive(Debug)]
pub struct InsertPlan<const BPS: usize>(WritePlan<BPS>);

/// Plan produced by [`SsrleSequence::prepare_remove`]. Removing an empty
/// range prepares a plan whose commit does nothing.
#[derive(Debug)]
pub struct RemovePlan<const BPS: usize>(Option<WritePlan<BPS>>);

/// Plan produced by [`SsrleSequence::prepare_update`].
#[derive(Debug)]
pub struct UpdatePlan<const BPS: usize>(WritePlan<BPS>);

/// Plan produced by [`SsrleSequence::prepare_merge_with`]; applied to the
/// *other* sequence by [`SsrleSequence::commit_merge_with`].
#[derive(Debug)]
pub struct MergePlan<const BPS: usize>(WritePlan<BPS>);

#[derive(Debug, Default, Clone, Copy)]
struct Metadata {
    size: u64,
    code_units: usize,
}

/// A succinct run-length-encoded symbol sequence over a `2^BPS` alphabet,
/// stored in an externally managed atom block.
pub struct SsrleSequence<S: SequenceStore, const BPS: usize> {
    store: S,
    meta: Metadata,
    index: Option<SequenceIndex<BPS>>,
}

impl<S: SequenceStore, const BPS: usize> SsrleSequence<S, BPS> {
    /// Creates an empty sequence over `store`, resetting its block.
    pub fn new(store: S) -> Result<SsrleSequence<S, BPS>> {
        let mut seq = SsrleSequence {
            store,
            meta: Metadata::default(),
            index: None,
        };
        seq.store.resize_block(compute_block_size(0))?;
        Ok(seq)
    }

    /// Number of symbol positions.
    #[inline]
    pub fn size(&self) -> u64 {
        self.meta.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meta.size == 0
    }

    /// Number of occupied atoms.
    #[inline]
    pub fn code_units(&self) -> usize {
        self.meta.code_units
    }

    #[inline]
    fn atoms(&self) -> &[u16] {
        &self.store.atoms()[..self.meta.code_units]
    }

    /// Iterates the stored runs in order.
    pub fn iter(&self) -> impl Iterator<Item = Run<BPS>> + '_ {
        RunCursor::<BPS>::new(self.atoms()).map(|(run, _)| run)
    }

    fn collect_runs(&self) -> Vec<Run<BPS>> {
        self.iter().collect()
    }

    fn cursor_at(&self, start: usize) -> RunCursor<'_, BPS> {
        RunCursor::with_start(self.atoms(), start)
    }

    /// Scan entry point for position `pos`: starting atom and the symbol
    /// count before it.
    fn scan_origin(&self, pos: u64) -> (usize, u64) {
        if let Some(index) = &self.index {
            if let Some(found) = index.locate_pos(pos) {
                return (found.block * ATOMS_PER_BLOCK, found.prefix);
            }
        }
        (0, 0)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Symbol at position `pos`.
    pub fn access(&self, pos: u64) -> Result<u8> {
        if pos >= self.meta.size {
            return Err(Error::position_out_of_bounds(pos, self.meta.size));
        }
        let (start, mut sum) = self.scan_origin(pos);
        for (run, _) in self.cursor_at(start) {
            let len = run.full_run_length();
            if pos < sum + len {
                return Ok(run.symbol(pos - sum));
            }
            sum += len;
        }
        Err(Error::invalid_format("ssrle sequence"))
    }

    /// Number of positions in `[0, pos)` whose symbol satisfies `op`
    /// against `symbol`. `EqNlt` is not defined for rank.
    pub fn rank(&self, pos: u64, symbol: u8, op: SeqOpType) -> Result<u64> {
        if op == SeqOpType::EqNlt {
            return Err(Error::unsupported("rank with EqNlt"));
        }
        verify_arg!(symbol, (symbol as usize) < Run::<BPS>::SYMBOLS);
        if pos > self.meta.size {
            return Err(Error::position_out_of_bounds(pos, self.meta.size));
        }
        Ok(self.rank_unchecked(pos, symbol, op))
    }

    fn rank_unchecked(&self, pos: u64, symbol: u8, op: SeqOpType) -> u64 {
        let (start, size_base, mut rank) = match &self.index {
            Some(index) => match index.locate_pos(pos) {
                Some(found) => (
                    found.block * ATOMS_PER_BLOCK,
                    found.prefix,
                    index.op_rank_prefix(found.block, symbol, op),
                ),
                None => return index.op_rank_total(symbol, op),
            },
            None => (0, 0, 0),
        };
        let mut sum = size_base;
        for (run, _) in self.cursor_at(start) {
            let len = run.full_run_length();
            if pos < sum + len {
                return rank + run.rank(pos - sum, symbol, op);
            }
            rank += run.full_rank(symbol, op);
            sum += len;
        }
        rank
    }

    /// Rank within `[start, end)`.
    pub fn rank_range(&self, start: u64, end: u64, symbol: u8, op: SeqOpType) -> Result<u64> {
        if start > end || end > self.meta.size {
            return Err(Error::range_out_of_bounds(start, end, self.meta.size));
        }
        Ok(self.rank(end, symbol, op)? - self.rank(start, symbol, op)?)
    }

    /// Adds the per-symbol counts of `[0, pos)` into `sink`, which must
    /// cover the alphabet.
    pub fn ranks(&self, pos: u64, sink: &mut [u64]) -> Result<()> {
        verify_arg!(sink, sink.len() >= Run::<BPS>::SYMBOLS);
        if pos > self.meta.size {
            return Err(Error::position_out_of_bounds(pos, self.meta.size));
        }
        let (start, mut sum) = match &self.index {
            Some(index) => match index.locate_pos(pos) {
                Some(found) => {
                    for (s, slot) in sink.iter_mut().enumerate().take(Run::<BPS>::SYMBOLS) {
                        *slot += index.rank_prefix(found.block, s);
                    }
                    (found.block * ATOMS_PER_BLOCK, found.prefix)
                }
                None => {
                    for (s, slot) in sink.iter_mut().enumerate().take(Run::<BPS>::SYMBOLS) {
                        *slot += index.rank_total(s);
                    }
                    return Ok(());
                }
            },
            None => (0, 0),
        };
        for (run, _) in self.cursor_at(start) {
            let len = run.full_run_length();
            if pos < sum + len {
                run.ranks(pos - sum, sink);
                return Ok(());
            }
            run.full_ranks(sink);
            sum += len;
        }
        Ok(())
    }

    /// Adds the per-symbol counts of the whole sequence into `sink`.
    pub fn full_ranks(&self, sink: &mut [u64]) -> Result<()> {
        self.ranks(self.meta.size, sink)
    }

    /// Position of the zero-based `rank`-th symbol satisfying `op`,
    /// scanning forward.
    pub fn select_fw(&self, rank: u64, symbol: u8, op: SeqOpType) -> Result<SelectResult> {
        verify_arg!(symbol, (symbol as usize) < Run::<BPS>::SYMBOLS);
        if op == SeqOpType::EqNlt {
            return Ok(self.select_fw_eq_nlt(rank, symbol));
        }
        Ok(self.select_fw_op(rank, symbol, op))
    }

    fn select_fw_op(&self, rank: u64, symbol: u8, op: SeqOpType) -> SelectResult {
        let (start, mut sum, mut acc) = match &self.index {
            Some(index) => match index.find_op_rank(rank, symbol, op) {
                Some(found) => (
                    found.block * ATOMS_PER_BLOCK,
                    index.size_prefix(found.block),
                    found.prefix,
                ),
                None => {
                    return SelectResult {
                        idx: self.meta.size,
                        rank: index.op_rank_total(symbol, op),
                    };
                }
            },
            None => (0, 0, 0),
        };
        for (run, _) in self.cursor_at(start) {
            let full = run.full_rank(symbol, op);
            if rank < acc + full {
                return SelectResult {
                    idx: sum + run.select_fw(rank - acc, symbol, op),
                    rank,
                };
            }
            acc += full;
            sum += run.full_run_length();
        }
        SelectResult {
            idx: self.meta.size,
            rank: acc,
        }
    }

    /// `EqNlt` select: the earlier of the `Eq` and `Lt` positions. For
    /// symbol zero nothing is smaller, so it degenerates to `Eq`.
    fn select_fw_eq_nlt(&self, rank: u64, symbol: u8) -> SelectResult {
        if symbol == 0 {
            return self.select_fw_op(rank, symbol, SeqOpType::Eq);
        }
        let res_eq = self.select_fw_op(rank, symbol, SeqOpType::Eq);
        let res_lt = self.select_fw_op(rank, symbol, SeqOpType::Lt);
        if res_eq.idx <= res_lt.idx { res_eq } else { res_lt }
    }

    /// Forward select over `[idx, size)`: the zero-based `rank`-th
    /// satisfying symbol at or after `idx`. The returned rank is counted
    /// from `idx`.
    pub fn select_fw_from(
        &self,
        idx: u64,
        rank: u64,
        symbol: u8,
        op: SeqOpType,
    ) -> Result<SelectResult> {
        verify_arg!(symbol, (symbol as usize) < Run::<BPS>::SYMBOLS);
        if idx > self.meta.size {
            return Err(Error::position_out_of_bounds(idx, self.meta.size));
        }
        if op == SeqOpType::EqNlt {
            if symbol == 0 {
                return Ok(self.select_fw_from_op(idx, rank, symbol, SeqOpType::Eq));
            }
            let res_eq = self.select_fw_from_op(idx, rank, symbol, SeqOpType::Eq);
            let res_lt = self.select_fw_from_op(idx, rank, symbol, SeqOpType::Lt);
            return Ok(if res_eq.idx <= res_lt.idx { res_eq } else { res_lt });
        }
        Ok(self.select_fw_from_op(idx, rank, symbol, op))
    }

    fn select_fw_from_op(&self, idx: u64, rank: u64, symbol: u8, op: SeqOpType) -> SelectResult {
        let base = self.rank_unchecked(idx, symbol, op);
        let res = self.select_fw_op(rank + base, symbol, op);
        SelectResult {
            idx: res.idx,
            rank: res.rank - base,
        }
    }

    /// Position of the zero-based `rank`-th satisfying symbol, scanning
    /// backward from the end. `EqNlt` is not defined backward.
    pub fn select_bw(&self, rank: u64, symbol: u8, op: SeqOpType) -> Result<SelectResult> {
        if op == SeqOpType::EqNlt {
            return Err(Error::unsupported("select_bw with EqNlt"));
        }
        verify_arg!(symbol, (symbol as usize) < Run::<BPS>::SYMBOLS);
        let full = self.rank_unchecked(self.meta.size, symbol, op);
        if rank < full {
            Ok(self.select_fw_op(full - rank - 1, symbol, op))
        } else {
            Ok(SelectResult {
                idx: self.meta.size,
                rank: full,
            })
        }
    }

    /// Backward select over `[0, idx]`: the zero-based `rank`-th satisfying
    /// symbol at or before `idx`, scanning backward. Returns `idx + 1` as
    /// the not-found position.
    pub fn select_bw_from(
        &self,
        idx: u64,
        rank: u64,
        symbol: u8,
        op: SeqOpType,
    ) -> Result<SelectResult> {
        if op == SeqOpType::EqNlt {
            return Err(Error::unsupported("select_bw with EqNlt"));
        }
        verify_arg!(symbol, (symbol as usize) < Run::<BPS>::SYMBOLS);
        if idx >= self.meta.size {
            return Err(Error::position_out_of_bounds(idx, self.meta.size));
        }
        let full = self.rank_unchecked(idx + 1, symbol, op);
        if rank < full {
            Ok(self.select_fw_op(full - rank - 1, symbol, op))
        } else {
            Ok(SelectResult {
                idx: idx + 1,
                rank: full,
            })
        }
    }

    /// Length of the run of `symbol` starting at `idx`; zero when the
    /// symbol there differs.
    pub fn count_fw(&self, idx: u64, symbol: u8) -> Result<u64> {
        verify_arg!(symbol, (symbol as usize) < Run::<BPS>::SYMBOLS);
        if idx > self.meta.size {
            return Err(Error::position_out_of_bounds(idx, self.meta.size));
        }
        let rank = self.rank_unchecked(idx, symbol, SeqOpType::Neq);
        let next = self.select_fw_op(rank, symbol, SeqOpType::Neq);
        Ok(next.idx - idx)
    }

    /// Length of the run of `symbol` ending at `idx` (inclusive); zero when
    /// the symbol there differs.
    pub fn count_bw(&self, idx: u64, symbol: u8) -> Result<u64> {
        verify_arg!(symbol, (symbol as usize) < Run::<BPS>::SYMBOLS);
        if idx >= self.meta.size {
            return Err(Error::position_out_of_bounds(idx, self.meta.size));
        }
        let rank = self.rank_unchecked(idx + 1, symbol, SeqOpType::Neq);
        if rank == 0 {
            Ok(idx + 1)
        } else {
            let prev = self.select_fw_op(rank - 1, symbol, SeqOpType::Neq);
            Ok(idx - prev.idx)
        }
    }

    /// Decoded runs covering symbol range `[pos, pos + len)`, with the edge
    /// runs trimmed to the range.
    pub fn symbol_runs(&self, pos: u64, len: u64) -> Result<Vec<Run<BPS>>> {
        if pos > self.meta.size || len > self.meta.size - pos {
            return Err(Error::range_out_of_bounds(pos, pos + len, self.meta.size));
        }
        let mut out = Vec::new();
        if len == 0 {
            return Ok(out);
        }
        let (start, mut sum) = self.scan_origin(pos);
        let mut pos = pos;
        let mut remaining = len;
        for (run, _) in self.cursor_at(start) {
            let rlen = run.full_run_length();
            if pos >= sum + rlen {
                sum += rlen;
                continue;
            }
            let off = pos - sum;
            let take = remaining.min(rlen - off);
            if off == 0 && take == rlen {
                out.push(run);
            } else {
                out.extend(run.extract(off, take));
            }
            remaining -= take;
            pos += take;
            sum += rlen;
            if remaining == 0 {
                break;
            }
        }
        Ok(out)
    }

    /// Verifies the packed stream against the metadata: every stored run is
    /// encodable, no adjacent pair is mergeable, and the symbol and atom
    /// counts match.
    pub fn check(&self) -> Result<()> {
        let mut cursor = RunCursor::<BPS>::new(self.atoms());
        let mut total = 0u64;
        let mut prev: Option<Run<BPS>> = None;
        for (run, _) in cursor.by_ref() {
            verify_data!(run, run.is_encodable());
            total += run.full_run_length();
            if let Some(prev) = prev {
                verify_data!(runs, prev.coalesce(run).is_err());
            }
            prev = Some(run);
        }
        verify_data!(code_units, cursor.pos() == self.meta.code_units);
        verify_data!(size, total == self.meta.size);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Two-phase mutations
    // ------------------------------------------------------------------

    fn negotiate(&self, runs: Vec<Run<BPS>>, new_size: u64) -> Prepared<WritePlan<BPS>> {
        let code_units = segment::compute_size(&runs, 0);
        let required = compute_block_size(code_units * 2);
        match self.store.can_resize(required) {
            AllocStatus::Granted => Prepared::Ready(WritePlan {
                runs,
                code_units,
                new_size,
            }),
            AllocStatus::Declined => {
                let existing = self.store.block_size();
                debug!("prepare declined: required {required} bytes, existing {existing}");
                Prepared::Declined { existing, required }
            }
        }
    }

    fn apply_plan(&mut self, plan: WritePlan<BPS>) -> Result<()> {
        let required = compute_block_size(plan.code_units * 2);
        self.store.resize_block(required)?;
        let end = segment::write_segments_to(&plan.runs, self.store.atoms_mut(), 0);
        debug_assert_eq!(end, plan.code_units);
        debug!(
            "commit: {} runs, {} -> {} atoms, size {} -> {}",
            plan.runs.len(),
            self.meta.code_units,
            plan.code_units,
            self.meta.size,
            plan.new_size
        );
        self.meta.code_units = plan.code_units;
        self.meta.size = plan.new_size;
        self.reindex();
        Ok(())
    }

    fn reindex(&mut self) {
        self.index = SequenceIndex::build(self.atoms());
        trace!(
            "reindex: {} atoms, indexed: {}",
            self.meta.code_units,
            self.index.is_some()
        );
    }

    /// Stages the insertion of `runs` at position `pos`.
    pub fn prepare_insert(
        &self,
        pos: u64,
        runs: &[Run<BPS>],
    ) -> Result<Prepared<InsertPlan<BPS>>> {
        if pos > self.meta.size {
            return Err(Error::position_out_of_bounds(pos, self.meta.size));
        }
        verify_arg!(runs, runs.iter().all(|r| !r.is_empty() && r.is_encodable()));
        let (mut left, right) = split_runs(self.collect_runs(), pos);
        left.extend_from_slice(runs);
        left.extend(right);
        let merged = compactify_runs(left);
        let new_size = self.meta.size + count_symbols(runs);
        Ok(self.negotiate(merged, new_size).map(InsertPlan))
    }

    pub fn commit_insert(&mut self, plan: InsertPlan<BPS>) -> Result<()> {
        self.apply_plan(plan.0)
    }

    /// Stages the removal of symbol range `[start, end)`.
    pub fn prepare_remove(&self, start: u64, end: u64) -> Result<Prepared<RemovePlan<BPS>>> {
        if start > end || end > self.meta.size {
            return Err(Error::range_out_of_bounds(start, end, self.meta.size));
        }
        if start == end {
            return Ok(Prepared::Ready(RemovePlan(None)));
        }
        let (mut left, rest) = split_runs(self.collect_runs(), start);
        let (_, right) = split_runs(rest, end - start);
        left.extend(right);
        let merged = compactify_runs(left);
        let new_size = self.meta.size - (end - start);
        Ok(self
            .negotiate(merged, new_size)
            .map(|plan| RemovePlan(Some(plan))))
    }

    pub fn commit_remove(&mut self, plan: RemovePlan<BPS>) -> Result<()> {
        match plan.0 {
            Some(plan) => self.apply_plan(plan),
            None => Ok(()),
        }
    }

    /// Stages the replacement of `[pos, pos + len)` with `runs`, where
    /// `len` is the symbol count of `runs`.
    pub fn prepare_update(
        &self,
        pos: u64,
        runs: &[Run<BPS>],
    ) -> Result<Prepared<UpdatePlan<BPS>>> {
        let len = count_symbols(runs);
        if pos > self.meta.size || len > self.meta.size - pos {
            return Err(Error::range_out_of_bounds(pos, pos + len, self.meta.size));
        }
        verify_arg!(runs, runs.iter().all(|r| !r.is_empty() && r.is_encodable()));
        let (mut left, rest) = split_runs(self.collect_runs(), pos);
        let (_, right) = split_runs(rest, len);
        left.extend_from_slice(runs);
        left.extend(right);
        let merged = compactify_runs(left);
        Ok(self.negotiate(merged, self.meta.size).map(UpdatePlan))
    }

    pub fn commit_update(&mut self, plan: UpdatePlan<BPS>) -> Result<()> {
        self.apply_plan(plan.0)
    }

    /// Stages appending this sequence onto `other`, negotiating against
    /// `other`'s store. This sequence is never modified by the pair.
    pub fn prepare_merge_with(
        &self,
        other: &SsrleSequence<S, BPS>,
    ) -> Result<Prepared<MergePlan<BPS>>> {
        let mut runs = other.collect_runs();
        runs.extend(self.iter());
        let merged = compactify_runs(runs);
        let code_units = segment::compute_size(&merged, 0);
        let required = compute_block_size(code_units * 2);
        let new_size = other.meta.size + self.meta.size;
        Ok(match other.store.can_resize(required) {
            AllocStatus::Granted => Prepared::Ready(MergePlan(WritePlan {
                runs: merged,
                code_units,
                new_size,
            })),
            AllocStatus::Declined => {
                let existing = other.store.block_size();
                debug!("merge declined: required {required} bytes, existing {existing}");
                Prepared::Declined { existing, required }
            }
        })
    }

    pub fn commit_merge_with(
        &self,
        other: &mut SsrleSequence<S, BPS>,
        plan: MergePlan<BPS>,
    ) -> Result<()> {
        other.apply_plan(plan.0)
    }

    /// Moves symbol range `[pos, size)` into `other`, replacing `other`'s
    /// content, and keeps `[0, pos)`. `pos == size` is a no-op. A declined
    /// allocation on either side surfaces as an error.
    pub fn split_to(&mut self, other: &mut SsrleSequence<S, BPS>, pos: u64) -> Result<()> {
        if pos > self.meta.size {
            return Err(Error::position_out_of_bounds(pos, self.meta.size));
        }
        if pos == self.meta.size {
            return Ok(());
        }
        let (left, right) = split_runs(self.collect_runs(), pos);
        let left = compactify_runs(left);
        let right = compactify_runs(right);
        let left_units = segment::compute_size(&left, 0);
        let right_units = segment::compute_size(&right, 0);
        let left_required = compute_block_size(left_units * 2);
        let right_required = compute_block_size(right_units * 2);
        if let AllocStatus::Declined = self.store.can_resize(left_required) {
            return Err(Error::allocation_declined(self.store.block_size(), left_required));
        }
        if let AllocStatus::Declined = other.store.can_resize(right_required) {
            return Err(Error::allocation_declined(
                other.store.block_size(),
                right_required,
            ));
        }
        let size = self.meta.size;
        other.apply_plan(WritePlan {
            runs: right,
            code_units: right_units,
            new_size: size - pos,
        })?;
        self.apply_plan(WritePlan {
            runs: left,
            code_units: left_units,
            new_size: pos,
        })
    }

    /// Re-packs the current content, merging whatever became mergeable.
    pub fn compactify(&mut self) -> Result<()> {
        let runs = compactify_runs(self.collect_runs());
        let code_units = segment::compute_size(&runs, 0);
        let new_size = self.meta.size;
        self.apply_plan(WritePlan {
            runs,
            code_units,
            new_size,
        })
    }

    /// Empties the sequence and releases the block.
    pub fn clear(&mut self) -> Result<()> {
        self.apply_plan(WritePlan {
            runs: Vec::new(),
            code_units: 0,
            new_size: 0,
        })
    }

    // ------------------------------------------------------------------
    // One-shot conveniences
    // ------------------------------------------------------------------

    /// Appends `runs`, converting a declined allocation into an error.
    pub fn append(&mut self, runs: &[Run<BPS>]) -> Result<()> {
        let plan = self.prepare_insert(self.meta.size, runs)?.ready()?;
        self.commit_insert(plan)
    }

    /// Appends a symbol slice.
    pub fn append_symbols(&mut self, symbols: &[u8]) -> Result<()> {
        verify_arg!(symbols, symbols.iter().all(|&s| (s as usize) < Run::<BPS>::SYMBOLS));
        self.append(&runs_from_symbols::<BPS>(symbols))
    }

    /// Inserts a symbol slice at position `pos`.
    pub fn insert_symbols(&mut self, pos: u64, symbols: &[u8]) -> Result<()> {
        verify_arg!(symbols, symbols.iter().all(|&s| (s as usize) < Run::<BPS>::SYMBOLS));
        let plan = self
            .prepare_insert(pos, &runs_from_symbols::<BPS>(symbols))?
            .ready()?;
        self.commit_insert(plan)
    }

    // ------------------------------------------------------------------
    // Comparison-specific conveniences
    // ------------------------------------------------------------------

    pub fn rank_eq(&self, pos: u64, symbol: u8) -> Result<u64> {
        self.rank(pos, symbol, SeqOpType::Eq)
    }

    pub fn rank_neq(&self, pos: u64, symbol: u8) -> Result<u64> {
        self.rank(pos, symbol, SeqOpType::Neq)
    }

    pub fn rank_lt(&self, pos: u64, symbol: u8) -> Result<u64> {
        self.rank(pos, symbol, SeqOpType::Lt)
    }

    pub fn rank_le(&self, pos: u64, symbol: u8) -> Result<u64> {
        self.rank(pos, symbol, SeqOpType::Le)
    }

    pub fn rank_gt(&self, pos: u64, symbol: u8) -> Result<u64> {
        self.rank(pos, symbol, SeqOpType::Gt)
    }

    pub fn rank_ge(&self, pos: u64, symbol: u8) -> Result<u64> {
        self.rank(pos, symbol, SeqOpType::Ge)
    }

    pub fn select_fw_eq(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_fw(rank, symbol, SeqOpType::Eq)
    }

    pub fn select_fw_neq(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_fw(rank, symbol, SeqOpType::Neq)
    }

    pub fn select_fw_lt(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_fw(rank, symbol, SeqOpType::Lt)
    }

    pub fn select_fw_le(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_fw(rank, symbol, SeqOpType::Le)
    }

    pub fn select_fw_gt(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_fw(rank, symbol, SeqOpType::Gt)
    }

    pub fn select_fw_ge(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_fw(rank, symbol, SeqOpType::Ge)
    }

    pub fn select_bw_eq(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_bw(rank, symbol, SeqOpType::Eq)
    }

    pub fn select_bw_neq(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_bw(rank, symbol, SeqOpType::Neq)
    }

    pub fn select_bw_lt(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_bw(rank, symbol, SeqOpType::Lt)
    }

    pub fn select_bw_le(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_bw(rank, symbol, SeqOpType::Le)
    }

    pub fn select_bw_gt(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_bw(rank, symbol, SeqOpType::Gt)
    }

    pub fn select_bw_ge(&self, rank: u64, symbol: u8) -> Result<SelectResult> {
        self.select_bw(rank, symbol, SeqOpType::Ge)
    }
}

impl<S: SequenceStore, const BPS: usize> fmt::Debug for SsrleSequence<S, BPS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SsrleSequence(size: {}, code_units: {}, runs: [",
            self.meta.size, self.meta.code_units
        )?;
        for (i, run) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{run}")?;
        }
        write!(f, "])")
    }
}

/// Index of the run containing `pos` and the offset within it; one past the
/// last run when `pos` equals the total symbol count.
fn find_in_runs<const BPS: usize>(runs: &[Run<BPS>], pos: u64) -> (usize, u64) {
    let mut offset = 0;
    for (i, run) in runs.iter().enumerate() {
        let len = run.full_run_length();
        if pos < offset + len {
            return (i, pos - offset);
        }
        offset += len;
    }
    (runs.len(), 0)
}

/// Splits a run list at symbol position `pos`.
fn split_runs<const BPS: usize>(
    runs: Vec<Run<BPS>>,
    pos: u64,
) -> (Vec<Run<BPS>>, Vec<Run<BPS>>) {
    let (idx, local) = find_in_runs(&runs, pos);
    if idx == runs.len() {
        return (runs, Vec::new());
    }
    let mut left = runs;
    let tail = left.split_off(idx);
    let split = tail[0].split(local);
    left.extend(split.left);
    let mut right = Vec::with_capacity(tail.len() + 1);
    right.extend(split.right);
    right.extend_from_slice(&tail[1..]);
    (left, right)
}
