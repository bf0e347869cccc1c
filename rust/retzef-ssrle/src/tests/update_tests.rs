//! Mutation tests: the prepare/commit protocol, declined allocations,
//! split and merge, and a randomized edit soak against a vector model.

use retzef_common::error::ErrorKind;

use crate::run::{Run, runs_from_symbols};
use crate::sequence::{Prepared, SsrleSequence};
use crate::store::HeapStore;

use super::support::{assert_same_content, build_seq, random_runny_symbols, random_symbols};

fn soak<const BPS: usize>(iters: usize) {
    let mut model: Vec<u8> = Vec::new();
    let mut seq = SsrleSequence::<_, BPS>::new(HeapStore::unbounded()).unwrap();
    for i in 0..iters {
        match fastrand::usize(0..10) {
            0..=4 => {
                let at = fastrand::u64(0..=seq.size());
                let batch = random_runny_symbols::<BPS>(fastrand::usize(1..120));
                seq.insert_symbols(at, &batch).unwrap();
                let at = at as usize;
                model.splice(at..at, batch.iter().copied());
            }
            5..=7 => {
                if seq.size() > 0 {
                    let start = fastrand::u64(0..seq.size());
                    let end = fastrand::u64(start..=seq.size());
                    let plan = seq.prepare_remove(start, end).unwrap().ready().unwrap();
                    seq.commit_remove(plan).unwrap();
                    model.drain(start as usize..end as usize);
                }
            }
            8 => {
                if seq.size() > 40 {
                    let at = fastrand::u64(0..seq.size() - 30);
                    let patch = random_symbols::<BPS>(30);
                    let plan = seq
                        .prepare_update(at, &runs_from_symbols::<BPS>(&patch))
                        .unwrap()
                        .ready()
                        .unwrap();
                    seq.commit_update(plan).unwrap();
                    let at = at as usize;
                    model.splice(at..at + 30, patch.iter().copied());
                }
            }
            _ => seq.compactify().unwrap(),
        }
        if i % 25 == 0 {
            seq.check().unwrap();
            assert_same_content(&seq, &model);
        }
    }
    seq.check().unwrap();
    assert_same_content(&seq, &model);
}

#[test]
fn insert_by_prepare_and_commit_places_runs() {
    let mut seq = build_seq::<2>(&[3, 3, 0, 0]);
    let runs = [Run::repeat(1, 5), Run::from_symbols(&[2, 0, 2])];
    let prepared = seq.prepare_insert(2, &runs).unwrap();
    assert!(prepared.is_ready());
    seq.commit_insert(prepared.ready().unwrap()).unwrap();
    seq.check().unwrap();
    assert_same_content(&seq, &[3, 3, 1, 1, 1, 1, 1, 2, 0, 2, 0, 0]);
}

#[test]
fn insert_symbols_matches_vector_splice() {
    fastrand::seed(0x1A5E);
    let mut model = random_runny_symbols::<2>(200);
    let mut seq = build_seq::<2>(&model);

    for _ in 0..40 {
        let at = fastrand::u64(0..=seq.size());
        let batch = random_symbols::<2>(fastrand::usize(1..30));
        seq.insert_symbols(at, &batch).unwrap();
        let at = at as usize;
        model.splice(at..at, batch.iter().copied());
        seq.check().unwrap();
    }
    assert_same_content(&seq, &model);
}

#[test]
fn remove_matches_vector_drain() {
    fastrand::seed(0xD3A1);
    let mut model = random_runny_symbols::<2>(400);
    let mut seq = build_seq::<2>(&model);

    for (start, end) in [(0u64, 25u64), (100, 101), (307, 374), (0, 0), (300, 307), (0, 300)] {
        let plan = seq.prepare_remove(start, end).unwrap().ready().unwrap();
        seq.commit_remove(plan).unwrap();
        model.drain(start as usize..end as usize);
        seq.check().unwrap();
        assert_same_content(&seq, &model);
    }
    assert!(seq.is_empty());
    assert_eq!(seq.code_units(), 0);
}

#[test]
fn removing_an_empty_range_commits_as_a_no_op() {
    let model = [1u8, 1, 2, 2];
    let mut seq = build_seq::<2>(&model);
    let units = seq.code_units();

    let prepared = seq.prepare_remove(2, 2).unwrap();
    assert!(prepared.is_ready());
    seq.commit_remove(prepared.ready().unwrap()).unwrap();
    assert_eq!(seq.code_units(), units);
    assert_same_content(&seq, &model);

    let mut empty = SsrleSequence::<_, 2>::new(HeapStore::unbounded()).unwrap();
    let plan = empty.prepare_remove(0, 0).unwrap().ready().unwrap();
    empty.commit_remove(plan).unwrap();
    assert_eq!(empty.size(), 0);
}

#[test]
fn update_replaces_a_range_in_place() {
    fastrand::seed(0x9D8);
    let model = random_symbols::<2>(200);
    let mut seq = build_seq::<2>(&model);

    let patch = random_symbols::<2>(30);
    let plan = seq
        .prepare_update(50, &runs_from_symbols::<2>(&patch))
        .unwrap()
        .ready()
        .unwrap();
    seq.commit_update(plan).unwrap();
    seq.check().unwrap();

    let mut expect = model.clone();
    expect[50..80].copy_from_slice(&patch);
    assert_eq!(seq.size(), 200);
    assert_same_content(&seq, &expect);
}

#[test]
fn removing_an_insertion_restores_the_original() {
    fastrand::seed(0xD00D);
    let model = random_runny_symbols::<4>(300);
    let mut seq = build_seq::<4>(&model);

    let extra = random_symbols::<4>(40);
    seq.insert_symbols(120, &extra).unwrap();
    assert_eq!(seq.size(), 340);

    let plan = seq.prepare_remove(120, 160).unwrap().ready().unwrap();
    seq.commit_remove(plan).unwrap();
    seq.check().unwrap();
    assert_same_content(&seq, &model);
}

#[test]
fn split_then_merge_restores_the_original() {
    fastrand::seed(0x5713);
    let original = random_runny_symbols::<2>(800);
    let mut a = build_seq::<2>(&original);

    for pos in [0u64, 800, 137, 400] {
        let mut b = SsrleSequence::<_, 2>::new(HeapStore::unbounded()).unwrap();
        a.split_to(&mut b, pos).unwrap();
        a.check().unwrap();
        b.check().unwrap();
        assert_same_content(&a, &original[..pos as usize]);
        assert_same_content(&b, &original[pos as usize..]);

        let plan = b.prepare_merge_with(&a).unwrap().ready().unwrap();
        b.commit_merge_with(&mut a, plan).unwrap();
        a.check().unwrap();
        assert_same_content(&a, &original);
        assert_same_content(&b, &original[pos as usize..]);
    }
}

#[test]
fn declined_insert_leaves_the_sequence_untouched() {
    fastrand::seed(0xDEC1);
    let mut seq = SsrleSequence::<_, 2>::new(HeapStore::with_limit(16)).unwrap();
    seq.append_symbols(&[0, 1, 2, 3]).unwrap();

    let big = random_symbols::<2>(300);
    let prepared = seq.prepare_insert(2, &runs_from_symbols::<2>(&big)).unwrap();
    assert!(!prepared.is_ready());
    match prepared {
        Prepared::Declined { existing, required } => {
            assert_eq!(existing, 8);
            assert!(required > 16, "required: {required}");
        }
        Prepared::Ready(_) => panic!("insert within a 16-byte budget must be declined"),
    }
    assert_eq!(seq.size(), 4);
    assert_same_content(&seq, &[0, 1, 2, 3]);
    seq.check().unwrap();

    // the one-shot form surfaces the decline as an error
    let err = seq.insert_symbols(2, &big).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::AllocationDeclined { existing: 8, .. }
    ));
    assert_same_content(&seq, &[0, 1, 2, 3]);
}

#[test]
fn declined_split_leaves_both_sequences_untouched() {
    fastrand::seed(0xDEC2);
    let model = random_runny_symbols::<2>(600);
    let mut a = build_seq::<2>(&model);
    let mut b = SsrleSequence::<_, 2>::new(HeapStore::with_limit(8)).unwrap();

    let err = a.split_to(&mut b, 100).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::AllocationDeclined { .. }));
    assert_same_content(&a, &model);
    assert_eq!(b.size(), 0);
}

#[test]
fn declined_merge_reports_the_required_block() {
    fastrand::seed(0xDEC3);
    let mut small = SsrleSequence::<_, 2>::new(HeapStore::with_limit(16)).unwrap();
    small.append_symbols(&[0, 1, 2, 3]).unwrap();
    let big = build_seq::<2>(&random_symbols::<2>(400));

    match big.prepare_merge_with(&small).unwrap() {
        Prepared::Declined { existing, required } => {
            assert_eq!(existing, 8);
            assert!(required > 16, "required: {required}");
        }
        Prepared::Ready(_) => panic!("merge into a 16-byte budget must be declined"),
    }
    assert_same_content(&small, &[0, 1, 2, 3]);
}

#[test]
fn clear_releases_the_block() {
    fastrand::seed(0xC1EA2);
    let mut seq = build_seq::<2>(&random_symbols::<2>(100));
    assert!(seq.code_units() > 0);

    seq.clear().unwrap();
    assert_eq!(seq.size(), 0);
    assert_eq!(seq.code_units(), 0);
    seq.check().unwrap();

    seq.append_symbols(&[1, 2, 3]).unwrap();
    assert_same_content(&seq, &[1, 2, 3]);
}

#[test]
fn repacking_changes_nothing_after_a_commit() {
    fastrand::seed(0xCAC7);
    let model = random_runny_symbols::<2>(500);
    let mut seq = build_seq::<2>(&model);
    let units = seq.code_units();

    seq.compactify().unwrap();
    assert_eq!(seq.code_units(), units);
    assert_same_content(&seq, &model);

    seq.compactify().unwrap();
    assert_eq!(seq.code_units(), units);
    seq.check().unwrap();
}

#[test]
fn mutation_bounds_are_validated() {
    let seq = build_seq::<2>(&[0, 1, 2, 3]);
    let runs = runs_from_symbols::<2>(&[1, 1]);

    assert!(matches!(
        seq.prepare_insert(5, &runs).unwrap_err().kind(),
        ErrorKind::PositionOutOfBounds { .. }
    ));
    assert!(matches!(
        seq.prepare_remove(3, 2).unwrap_err().kind(),
        ErrorKind::RangeOutOfBounds { .. }
    ));
    assert!(matches!(
        seq.prepare_remove(0, 5).unwrap_err().kind(),
        ErrorKind::RangeOutOfBounds { .. }
    ));
    assert!(matches!(
        seq.prepare_update(3, &runs).unwrap_err().kind(),
        ErrorKind::RangeOutOfBounds { .. }
    ));
    let empty_run = [Run::<2>::null()];
    assert!(matches!(
        seq.prepare_insert(0, &empty_run).unwrap_err().kind(),
        ErrorKind::InvalidArgument { .. }
    ));

    let mut seq2 = build_seq::<2>(&[0, 1]);
    let mut other = SsrleSequence::<_, 2>::new(HeapStore::unbounded()).unwrap();
    assert!(matches!(
        seq2.split_to(&mut other, 3).unwrap_err().kind(),
        ErrorKind::PositionOutOfBounds { .. }
    ));
}

#[test]
fn random_edit_soak_small_alphabet() {
    fastrand::seed(0x50A1);
    soak::<2>(150);
}

#[test]
fn random_edit_soak_wide_alphabet() {
    fastrand::seed(0x50A2);
    soak::<4>(150);
}
