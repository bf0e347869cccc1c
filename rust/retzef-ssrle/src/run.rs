//! Symbol runs: the unit of storage for SSRLE sequences.
//!
//! A [`Run`] is a short symbol *pattern* repeated a number of times:
//!
//! - `pattern` holds up to [`Run::MAX_PATTERN_LENGTH`] symbols of `BPS` bits
//!   each, packed LSB first into a `u64`;
//! - `run_length` is the repeat count; the run covers
//!   `pattern_length * run_length` symbol positions;
//! - a run with `pattern_length == 0` is structural: the stream terminator
//!   when `run_length == 0`, an atom-skipping padding marker otherwise.
//!
//! Structural edits (`split`, `insert`, `remove_range`, `extract`) return
//! their results in small fixed-capacity vectors and never emit runs that
//! would not fit a single code word.

use std::fmt;

use itertools::Itertools;
use tinyvec::ArrayVec;

use crate::codec;

/// Comparison applied by rank/select/count queries when testing a stored
/// symbol against the query symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqOpType {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    /// "Equal, or the nearest smaller": resolved by select-forward as the
    /// earlier of the `Eq` and `Lt` positions. Not defined for rank or
    /// select-backward.
    EqNlt,
}

#[inline]
fn op_matches(op: SeqOpType, stored: u8, symbol: u8) -> bool {
    match op {
        SeqOpType::Eq => stored == symbol,
        SeqOpType::Neq => stored != symbol,
        SeqOpType::Lt => stored < symbol,
        SeqOpType::Le => stored <= symbol,
        SeqOpType::Gt => stored > symbol,
        SeqOpType::Ge => stored >= symbol,
        SeqOpType::EqNlt => unreachable!("EqNlt is decomposed before per-run evaluation"),
    }
}

/// A bit-packed symbol run over a `2^BPS` alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Run<const BPS: usize> {
    pattern: u64,
    pattern_length: usize,
    run_length: u64,
}

/// Edit results: up to five surviving pieces, in order.
pub type RunPieces<const BPS: usize> = ArrayVec<[Run<BPS>; 5]>;

/// Outcome of [`Run::split`]: pieces covering `[0, at)` and
/// `[at, full_run_length)`.
#[derive(Debug, Clone, Default)]
pub struct RunSplit<const BPS: usize> {
    pub left: ArrayVec<[Run<BPS>; 2]>,
    pub right: ArrayVec<[Run<BPS>; 2]>,
}

#[inline]
fn push_run<const BPS: usize, A>(out: &mut ArrayVec<A>, run: Run<BPS>)
where
    A: tinyvec::Array<Item = Run<BPS>>,
{
    if !run.is_empty() {
        out.push(run);
    }
}

impl<const BPS: usize> Run<BPS> {
    /// Alphabet size.
    pub const SYMBOLS: usize = 1usize << BPS;

    /// Mask of one symbol.
    pub const SYMBOL_MASK: u64 = (1u64 << BPS) - 1;

    /// Longest pattern a single code word can carry.
    pub const MAX_PATTERN_LENGTH: usize = codec::max_pattern_length(BPS);

    /// Creates a run; the pattern is masked to `pattern_length` symbols.
    #[inline]
    pub fn new(pattern_length: usize, pattern: u64, run_length: u64) -> Run<BPS> {
        debug_assert!(pattern_length <= Self::MAX_PATTERN_LENGTH);
        Run {
            pattern: pattern & codec::mask64(pattern_length * BPS),
            pattern_length,
            run_length,
        }
    }

    /// The stream terminator.
    #[inline]
    pub const fn null() -> Run<BPS> {
        Run {
            pattern: 0,
            pattern_length: 0,
            run_length: 0,
        }
    }

    /// A padding marker covering `len` atoms, itself included.
    #[inline]
    pub fn padding(len: u64) -> Run<BPS> {
        debug_assert!(len > 0 && len < codec::SEGMENT_SIZE_ATOMS as u64);
        Run {
            pattern: 0,
            pattern_length: 0,
            run_length: len,
        }
    }

    /// A single-symbol run repeated `run_length` times.
    #[inline]
    pub fn repeat(symbol: u8, run_length: u64) -> Run<BPS> {
        debug_assert!((symbol as usize) < Self::SYMBOLS);
        Run::new(1, symbol as u64, run_length)
    }

    /// Builds a single-repeat run from a symbol slice.
    pub fn from_symbols(symbols: &[u8]) -> Run<BPS> {
        debug_assert!(symbols.len() <= Self::MAX_PATTERN_LENGTH);
        let mut pattern = 0u64;
        for (i, &s) in symbols.iter().enumerate() {
            debug_assert!((s as usize) < Self::SYMBOLS);
            pattern |= (s as u64 & Self::SYMBOL_MASK) << (i * BPS);
        }
        Run {
            pattern,
            pattern_length: symbols.len(),
            run_length: 1,
        }
    }

    #[inline]
    pub fn pattern(&self) -> u64 {
        self.pattern
    }

    #[inline]
    pub fn pattern_length(&self) -> usize {
        self.pattern_length
    }

    #[inline]
    pub fn run_length(&self) -> u64 {
        self.run_length
    }

    /// Number of symbol positions this run covers.
    #[inline]
    pub fn full_run_length(&self) -> u64 {
        self.pattern_length as u64 * self.run_length
    }

    /// True when the run covers no symbol positions (terminator or padding).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pattern_length == 0 || self.run_length == 0
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.pattern_length == 0 && self.run_length == 0
    }

    #[inline]
    pub fn is_padding(&self) -> bool {
        self.pattern_length == 0 && self.run_length > 0
    }

    /// True when the run fits a single code word.
    #[inline]
    pub fn is_encodable(&self) -> bool {
        codec::is_fit(BPS, self.pattern_length, self.run_length)
    }

    /// Encoded size in atoms.
    #[inline]
    pub fn size_in_units(&self) -> usize {
        codec::estimate_units(BPS, self.pattern_length, self.run_length)
    }

    /// Symbol at pattern offset `idx`.
    #[inline]
    pub fn pattern_symbol(&self, idx: usize) -> u8 {
        debug_assert!(idx < self.pattern_length);
        ((self.pattern >> (idx * BPS)) & Self::SYMBOL_MASK) as u8
    }

    /// Replaces the symbol at pattern offset `idx`.
    #[inline]
    pub fn set_pattern_symbol(&mut self, idx: usize, symbol: u8) {
        debug_assert!(idx < self.pattern_length);
        debug_assert!((symbol as usize) < Self::SYMBOLS);
        let shift = idx * BPS;
        self.pattern &= !(Self::SYMBOL_MASK << shift);
        self.pattern |= (symbol as u64) << shift;
    }

    /// Symbol at run offset `idx` (spanning all repeats).
    #[inline]
    pub fn symbol(&self, idx: u64) -> u8 {
        debug_assert!(idx < self.full_run_length());
        let p_idx = if self.run_length == 1 {
            idx as usize
        } else {
            (idx % self.pattern_length as u64) as usize
        };
        self.pattern_symbol(p_idx)
    }

    /// Bit-slice of `len` pattern symbols starting at `start`.
    #[inline]
    pub fn sub_pattern(&self, start: usize, len: usize) -> u64 {
        debug_assert!(start + len <= self.pattern_length);
        (self.pattern >> (start * BPS)) & codec::mask64(len * BPS)
    }

    // ------------------------------------------------------------------
    // Encoding
    // ------------------------------------------------------------------

    /// Packs this run into `target`, returning the number of atoms written.
    pub fn encode_to(&self, target: &mut [u16]) -> usize {
        debug_assert!(self.is_encodable() || self.pattern_length == 0);
        let units = self.size_in_units();
        debug_assert!(units <= codec::MAX_RUN_SIZE_ATOMS);
        let mut value = (units - 1) as u64;
        value |= (self.pattern_length as u64) << codec::SIZE_FIELD_BITS;
        value |= self.pattern << (codec::SIZE_FIELD_BITS + codec::len_bits(BPS));
        let shift = codec::SIZE_FIELD_BITS + codec::len_bits(BPS) + self.pattern_length * BPS;
        if shift < 64 {
            value |= self.run_length << shift;
        }
        codec::write_word(target, value, units);
        units
    }

    /// Decodes one run from the head of `source`, returning it with its
    /// size in atoms. `source[0]` must not be the terminator atom.
    pub fn decode_from(source: &[u16]) -> (Run<BPS>, usize) {
        debug_assert!(!source.is_empty() && source[0] != 0);
        let units = (source[0] & 0x3) as usize + 1;
        debug_assert!(units <= source.len());
        let value = codec::read_word(source, units);
        let len_bits = codec::len_bits(BPS);
        let pattern_length = ((value >> codec::SIZE_FIELD_BITS) & codec::mask64(len_bits)) as usize;
        let pattern =
            (value >> (codec::SIZE_FIELD_BITS + len_bits)) & codec::mask64(pattern_length * BPS);
        let shift = codec::SIZE_FIELD_BITS + len_bits + pattern_length * BPS;
        let field_bits = (units * codec::ATOM_BITS).saturating_sub(shift);
        let mut run_length = if field_bits > 0 && shift < 64 {
            (value >> shift) & codec::mask64(field_bits)
        } else {
            0
        };
        if run_length == 0 && pattern_length > 0 {
            run_length = 1;
        }
        (
            Run {
                pattern,
                pattern_length,
                run_length,
            },
            units,
        )
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Splits the run at symbol offset `at`.
    pub fn split(&self, at: u64) -> RunSplit<BPS> {
        debug_assert!(at <= self.full_run_length());
        let mut split = RunSplit::default();
        if self.run_length == 1 {
            let a = at as usize;
            push_run(&mut split.left, Run::new(a, self.pattern, 1));
            push_run(
                &mut split.right,
                Run::new(self.pattern_length - a, self.pattern >> (a * BPS), 1),
            );
        } else if self.pattern_length == 1 {
            push_run(&mut split.left, Run::new(1, self.pattern, at));
            push_run(&mut split.right, Run::new(1, self.pattern, self.run_length - at));
        } else {
            let plen = self.pattern_length as u64;
            let reps = at / plen;
            let at_start = (at % plen) as usize;
            push_run(&mut split.left, Run::new(self.pattern_length, self.pattern, reps));
            if at_start == 0 {
                push_run(
                    &mut split.right,
                    Run::new(self.pattern_length, self.pattern, self.run_length - reps),
                );
            } else {
                split.left.push(Run::new(at_start, self.pattern, 1));
                split.right.push(Run::new(
                    self.pattern_length - at_start,
                    self.pattern >> (at_start * BPS),
                    1,
                ));
                push_run(
                    &mut split.right,
                    Run::new(self.pattern_length, self.pattern, self.run_length - reps - 1),
                );
            }
        }
        split
    }

    /// Splices `run`'s symbols into this run at symbol offset `at`.
    pub fn insert(&self, run: &Run<BPS>, at: u64) -> RunPieces<BPS> {
        debug_assert!(at <= self.full_run_length());
        debug_assert!(!self.is_empty() && !run.is_empty());
        let mut out = RunPieces::new();
        let plen = self.pattern_length as u64;

        // Same pattern at a period boundary: extend the repeat count.
        if self.pattern_length == run.pattern_length
            && self.pattern == run.pattern
            && at % plen == 0
            && codec::is_fit(BPS, self.pattern_length, self.run_length + run.run_length)
        {
            out.push(Run::new(
                self.pattern_length,
                self.pattern,
                self.run_length + run.run_length,
            ));
            return out;
        }

        if at == self.full_run_length() {
            if self.run_length == 1
                && run.run_length == 1
                && codec::is_fit(BPS, self.pattern_length + run.pattern_length, 1)
            {
                let pattern = self.pattern | run.pattern << (self.pattern_length * BPS);
                out.push(Run::new(self.pattern_length + run.pattern_length, pattern, 1));
            } else {
                out.push(*self);
                out.push(*run);
            }
            return out;
        }

        let at_start = (at % plen) as usize;
        let prefix_reps = at / plen;
        push_run(&mut out, Run::new(self.pattern_length, self.pattern, prefix_reps));

        if at_start == 0 {
            if run.run_length == 1
                && codec::is_fit(BPS, run.pattern_length + self.pattern_length, 1)
            {
                // Fuse the inserted pattern with one period of this run.
                let pattern = run.pattern | self.pattern << (run.pattern_length * BPS);
                out.push(Run::new(run.pattern_length + self.pattern_length, pattern, 1));
                push_run(
                    &mut out,
                    Run::new(
                        self.pattern_length,
                        self.pattern,
                        self.run_length - prefix_reps - 1,
                    ),
                );
            } else {
                out.push(*run);
                push_run(
                    &mut out,
                    Run::new(self.pattern_length, self.pattern, self.run_length - prefix_reps),
                );
            }
        } else if run.run_length == 1
            && codec::is_fit(BPS, self.pattern_length + run.pattern_length, 1)
        {
            // Splice the inserted pattern into the middle of one period.
            let low = self.pattern & codec::mask64(at_start * BPS);
            let mid = run.pattern << (at_start * BPS);
            let high = (self.pattern >> (at_start * BPS)) << ((at_start + run.pattern_length) * BPS);
            out.push(Run::new(
                self.pattern_length + run.pattern_length,
                low | mid | high,
                1,
            ));
            push_run(
                &mut out,
                Run::new(
                    self.pattern_length,
                    self.pattern,
                    self.run_length - prefix_reps - 1,
                ),
            );
        } else {
            out.push(Run::new(at_start, self.pattern, 1));
            out.push(*run);
            out.push(Run::new(
                self.pattern_length - at_start,
                self.pattern >> (at_start * BPS),
                1,
            ));
            push_run(
                &mut out,
                Run::new(
                    self.pattern_length,
                    self.pattern,
                    self.run_length - prefix_reps - 1,
                ),
            );
        }
        out
    }

    /// Removes symbol range `[start, end)` from this run.
    pub fn remove_range(&self, start: u64, end: u64) -> RunPieces<BPS> {
        debug_assert!(start <= end && end <= self.full_run_length());
        let mut out = RunPieces::new();
        if start == end {
            out.push(*self);
            return out;
        }
        let len = end - start;
        if self.run_length == 1 {
            let s = start as usize;
            let low = self.pattern & codec::mask64(s * BPS);
            let high = (self.pattern >> (end as usize * BPS)) << (s * BPS);
            push_run(
                &mut out,
                Run::new(self.pattern_length - len as usize, low | high, 1),
            );
            return out;
        }
        if self.pattern_length == 1 {
            push_run(&mut out, Run::new(1, self.pattern, self.run_length - len));
            return out;
        }
        let plen = self.pattern_length as u64;
        let from_start = (start % plen) as usize;
        let to_start = (end % plen) as usize;
        if from_start == 0 && len % plen == 0 {
            push_run(
                &mut out,
                Run::new(self.pattern_length, self.pattern, self.run_length - len / plen),
            );
            return out;
        }
        let prefix_reps = start / plen;
        let suffix_reps = self.run_length - end / plen - if to_start > 0 { 1 } else { 0 };
        push_run(&mut out, Run::new(self.pattern_length, self.pattern, prefix_reps));
        let keep_right = self.pattern_length - to_start;
        if from_start > 0 && to_start > 0 && from_start + keep_right <= Self::MAX_PATTERN_LENGTH {
            // Surviving edges of the hole fuse into one pattern.
            let fused = (self.pattern & codec::mask64(from_start * BPS))
                | (self.pattern >> (to_start * BPS)) << (from_start * BPS);
            out.push(Run::new(from_start + keep_right, fused, 1));
        } else {
            if from_start > 0 {
                out.push(Run::new(from_start, self.pattern, 1));
            }
            if to_start > 0 {
                out.push(Run::new(keep_right, self.pattern >> (to_start * BPS), 1));
            }
        }
        push_run(&mut out, Run::new(self.pattern_length, self.pattern, suffix_reps));
        out
    }

    /// Copies symbol range `[start, start + len)` out of this run.
    pub fn extract(&self, start: u64, len: u64) -> RunPieces<BPS> {
        debug_assert!(start + len <= self.full_run_length());
        let mut out = RunPieces::new();
        if len == 0 {
            return out;
        }
        if self.run_length == 1 {
            out.push(Run::new(len as usize, self.pattern >> (start as usize * BPS), 1));
            return out;
        }
        if self.pattern_length == 1 {
            out.push(Run::new(1, self.pattern, len));
            return out;
        }
        let plen = self.pattern_length as u64;
        let end = start + len;
        let f0 = (start % plen) as usize;
        let f1 = (end % plen) as usize;
        if start / plen == end / plen {
            out.push(Run::new(f1 - f0, self.pattern >> (f0 * BPS), 1));
            return out;
        }
        if f0 > 0 {
            out.push(Run::new(
                self.pattern_length - f0,
                self.pattern >> (f0 * BPS),
                1,
            ));
        }
        let whole = end / plen - start / plen - if f0 > 0 { 1 } else { 0 };
        push_run(&mut out, Run::new(self.pattern_length, self.pattern, whole));
        if f1 > 0 {
            out.push(Run::new(f1, self.pattern, 1));
        }
        out
    }

    /// Merges an adjacent run into this one when the result still fits a
    /// single code word.
    #[inline]
    pub fn coalesce(&self, next: Run<BPS>) -> Result<Run<BPS>, (Run<BPS>, Run<BPS>)> {
        if self.pattern_length == next.pattern_length
            && self.pattern == next.pattern
            && codec::is_fit(BPS, self.pattern_length, self.run_length + next.run_length)
        {
            return Ok(Run::new(
                self.pattern_length,
                self.pattern,
                self.run_length + next.run_length,
            ));
        }
        if self.run_length == 1
            && next.run_length == 1
            && codec::is_fit(BPS, self.pattern_length + next.pattern_length, 1)
        {
            return Ok(Run::new(
                self.pattern_length + next.pattern_length,
                self.pattern | next.pattern << (self.pattern_length * BPS),
                1,
            ));
        }
        Err((*self, next))
    }

    // ------------------------------------------------------------------
    // Rank and select within one run
    // ------------------------------------------------------------------

    /// Number of matching symbols among the first `idx` pattern symbols.
    pub fn pattern_rank(&self, idx: usize, symbol: u8, op: SeqOpType) -> u64 {
        debug_assert!(idx <= self.pattern_length);
        let mut rank = 0;
        for i in 0..idx {
            if op_matches(op, self.pattern_symbol(i), symbol) {
                rank += 1;
            }
        }
        rank
    }

    /// Number of matching symbols in run range `[0, idx)`.
    pub fn rank(&self, idx: u64, symbol: u8, op: SeqOpType) -> u64 {
        debug_assert!(idx <= self.full_run_length());
        if self.run_length == 1 {
            return self.pattern_rank(idx as usize, symbol, op);
        }
        let plen = self.pattern_length as u64;
        let reps = idx / plen;
        let rem = (idx % plen) as usize;
        reps * self.pattern_rank(self.pattern_length, symbol, op)
            + self.pattern_rank(rem, symbol, op)
    }

    /// Number of matching symbols in the whole run.
    #[inline]
    pub fn full_rank(&self, symbol: u8, op: SeqOpType) -> u64 {
        self.pattern_rank(self.pattern_length, symbol, op) * self.run_length
    }

    /// Pattern offset of the zero-based `rank`-th matching symbol, or
    /// `pattern_length` when the pattern holds fewer matches.
    pub fn pattern_select(&self, rank: u64, symbol: u8, op: SeqOpType) -> usize {
        let mut rank = rank;
        for i in 0..self.pattern_length {
            if op_matches(op, self.pattern_symbol(i), symbol) {
                if rank == 0 {
                    return i;
                }
                rank -= 1;
            }
        }
        self.pattern_length
    }

    /// Run offset of the zero-based `rank`-th matching symbol, or
    /// `full_run_length` when the run holds fewer matches.
    pub fn select_fw(&self, rank: u64, symbol: u8, op: SeqOpType) -> u64 {
        if self.run_length == 1 {
            return self.pattern_select(rank, symbol, op) as u64;
        }
        let period = self.pattern_rank(self.pattern_length, symbol, op);
        if period == 0 {
            return self.full_run_length();
        }
        let base = rank / period;
        if base >= self.run_length {
            return self.full_run_length();
        }
        let local = self.pattern_select(rank % period, symbol, op) as u64;
        base * self.pattern_length as u64 + local
    }

    /// Adds per-symbol counts of the first `idx` pattern symbols into `sink`.
    pub fn pattern_ranks(&self, idx: u64, sink: &mut [u64]) {
        debug_assert!(sink.len() >= Self::SYMBOLS);
        for i in 0..idx as usize {
            sink[self.pattern_symbol(i) as usize] += 1;
        }
    }

    /// Adds per-symbol counts of run range `[0, idx)` into `sink`.
    pub fn ranks(&self, idx: u64, sink: &mut [u64]) {
        debug_assert!(idx <= self.full_run_length());
        if self.run_length == 1 {
            return self.pattern_ranks(idx, sink);
        }
        let plen = self.pattern_length as u64;
        let reps = idx / plen;
        if reps > 0 {
            for i in 0..self.pattern_length {
                sink[self.pattern_symbol(i) as usize] += reps;
            }
        }
        self.pattern_ranks(idx % plen, sink);
    }

    /// Adds per-symbol counts of the whole run into `sink`.
    pub fn full_ranks(&self, sink: &mut [u64]) {
        debug_assert!(sink.len() >= Self::SYMBOLS);
        for i in 0..self.pattern_length {
            sink[self.pattern_symbol(i) as usize] += self.run_length;
        }
    }
}

impl<const BPS: usize> fmt::Display for Run<BPS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, '", self.pattern_length)?;
        for i in 0..self.pattern_length {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", self.pattern_symbol(i))?;
        }
        write!(f, "', {}}}", self.run_length)
    }
}

/// Total number of symbol positions covered by `runs`.
pub fn count_symbols<const BPS: usize>(runs: &[Run<BPS>]) -> u64 {
    runs.iter().map(|run| run.full_run_length()).sum()
}

/// Drops empty runs and merges every mergeable adjacent pair.
pub fn compactify_runs<const BPS: usize>(
    runs: impl IntoIterator<Item = Run<BPS>>,
) -> Vec<Run<BPS>> {
    runs.into_iter()
        .filter(|run| !run.is_empty())
        .coalesce(|prev, next| prev.coalesce(next))
        .collect()
}

/// Packs a symbol slice into runs: one repeat run per maximal same-symbol
/// stretch, with neighboring one-symbol stretches fused into patterns by
/// [`compactify_runs`].
pub fn runs_from_symbols<const BPS: usize>(symbols: &[u8]) -> Vec<Run<BPS>> {
    compactify_runs(
        symbols
            .iter()
            .dedup_with_count()
            .map(|(len, &symbol)| Run::<BPS>::repeat(symbol, len as u64)),
    )
}
