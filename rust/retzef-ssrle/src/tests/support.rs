//! Shared test helpers: a plain-vector reference model and seeded
//! generators for runs and symbol streams.

use crate::codec;
use crate::run::{Run, SeqOpType};
use crate::sequence::{SelectResult, SsrleSequence};
use crate::store::HeapStore;

pub const ALL_OPS: [SeqOpType; 6] = [
    SeqOpType::Eq,
    SeqOpType::Neq,
    SeqOpType::Lt,
    SeqOpType::Le,
    SeqOpType::Gt,
    SeqOpType::Ge,
];

pub fn op_holds(op: SeqOpType, stored: u8, symbol: u8) -> bool {
    match op {
        SeqOpType::Eq => stored == symbol,
        SeqOpType::Neq => stored != symbol,
        SeqOpType::Lt => stored < symbol,
        SeqOpType::Le => stored <= symbol,
        SeqOpType::Gt => stored > symbol,
        SeqOpType::Ge => stored >= symbol,
        SeqOpType::EqNlt => panic!("EqNlt has no per-symbol matcher"),
    }
}

pub fn model_rank(symbols: &[u8], pos: usize, symbol: u8, op: SeqOpType) -> u64 {
    symbols[..pos]
        .iter()
        .filter(|&&s| op_holds(op, s, symbol))
        .count() as u64
}

pub fn model_select_fw(symbols: &[u8], rank: u64, symbol: u8, op: SeqOpType) -> SelectResult {
    let mut seen = 0;
    for (i, &s) in symbols.iter().enumerate() {
        if op_holds(op, s, symbol) {
            if seen == rank {
                return SelectResult {
                    idx: i as u64,
                    rank,
                };
            }
            seen += 1;
        }
    }
    SelectResult {
        idx: symbols.len() as u64,
        rank: seen,
    }
}

/// Positions matching `op` against `symbol`, in order.
pub fn model_positions(symbols: &[u8], symbol: u8, op: SeqOpType) -> Vec<u64> {
    symbols
        .iter()
        .enumerate()
        .filter(|&(_, &s)| op_holds(op, s, symbol))
        .map(|(i, _)| i as u64)
        .collect()
}

pub fn model_count_fw(symbols: &[u8], idx: usize, symbol: u8) -> u64 {
    symbols[idx..].iter().take_while(|&&s| s == symbol).count() as u64
}

pub fn model_count_bw(symbols: &[u8], idx: usize, symbol: u8) -> u64 {
    symbols[..=idx]
        .iter()
        .rev()
        .take_while(|&&s| s == symbol)
        .count() as u64
}

/// Expands a run list back into plain symbols.
pub fn materialize<const BPS: usize>(runs: &[Run<BPS>]) -> Vec<u8> {
    let mut out = Vec::new();
    for run in runs {
        for i in 0..run.full_run_length() {
            out.push(run.symbol(i));
        }
    }
    out
}

pub fn random_symbols<const BPS: usize>(len: usize) -> Vec<u8> {
    (0..len)
        .map(|_| fastrand::usize(0..Run::<BPS>::SYMBOLS) as u8)
        .collect()
}

/// Symbols with long same-symbol stretches, so the packed form holds
/// compressed repeat runs rather than literal patterns.
pub fn random_runny_symbols<const BPS: usize>(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        let s = fastrand::usize(0..Run::<BPS>::SYMBOLS) as u8;
        let n = fastrand::usize(1..40).min(len - out.len());
        out.extend(std::iter::repeat(s).take(n));
    }
    out
}

/// A valid encodable run with a bounded symbol count, mixing single-repeat
/// patterns, classic repeats and periodic shapes.
pub fn random_run<const BPS: usize>() -> Run<BPS> {
    match fastrand::usize(0..3) {
        0 => Run::new(
            fastrand::usize(1..=Run::<BPS>::MAX_PATTERN_LENGTH),
            fastrand::u64(..),
            1,
        ),
        1 => Run::new(1, fastrand::u64(..), fastrand::u64(1..200)),
        _ => {
            let plen = fastrand::usize(2..=Run::<BPS>::MAX_PATTERN_LENGTH);
            let max_rl = codec::max_run_length(BPS, plen).min(64);
            Run::new(plen, fastrand::u64(..), fastrand::u64(1..=max_rl))
        }
    }
}

pub fn random_runs<const BPS: usize>(count: usize) -> Vec<Run<BPS>> {
    (0..count).map(|_| random_run::<BPS>()).collect()
}

pub fn build_seq<const BPS: usize>(symbols: &[u8]) -> SsrleSequence<HeapStore, BPS> {
    let mut seq = SsrleSequence::<_, BPS>::new(HeapStore::unbounded()).unwrap();
    seq.append_symbols(symbols).unwrap();
    seq.check().unwrap();
    assert_eq!(seq.size(), symbols.len() as u64);
    seq
}

/// Reads the whole sequence back and compares it with the model.
pub fn assert_same_content<const BPS: usize>(seq: &SsrleSequence<HeapStore, BPS>, model: &[u8]) {
    assert_eq!(seq.size(), model.len() as u64);
    let runs: Vec<Run<BPS>> = seq.iter().collect();
    assert_eq!(materialize(&runs), model);
}
