use crate::cursor::RunCursor;
use crate::run::{Run, compactify_runs};
use crate::segment::{SegmentCursor, compute_size, write_segments_to};

use super::support::random_runs;

#[test]
fn cursor_places_within_one_segment() {
    let mut cursor = SegmentCursor::new(0);
    let p = cursor.place(2);
    assert_eq!(p.at, 0);
    assert!(p.padding.is_none());
    let p = cursor.place(2);
    assert_eq!(p.at, 2);
    assert!(p.padding.is_none());
    assert_eq!(cursor.pos(), 4);

    // The next placement opens a fresh segment without padding.
    let p = cursor.place(3);
    assert_eq!(p.at, 4);
    assert!(p.padding.is_none());
    assert_eq!(cursor.pos(), 7);
}

#[test]
fn cursor_pads_on_boundary_crossing() {
    let mut cursor = SegmentCursor::new(0);
    cursor.place(3);
    let p = cursor.place(2);
    assert_eq!(p.padding, Some((3, 1)));
    assert_eq!(p.at, 4);
    assert_eq!(cursor.pos(), 6);
}

#[test]
fn cursor_honors_start_offset_mid_segment() {
    let mut cursor = SegmentCursor::new(6);
    let p = cursor.place(4);
    assert_eq!(p.padding, Some((6, 2)));
    assert_eq!(p.at, 8);
    assert_eq!(cursor.pos(), 12);
}

#[test]
fn compute_size_counts_padding() {
    // 3 + 2 atoms: the second run crosses the boundary, one padding atom.
    let runs = [Run::<1>::new(30, 0x2AAA_AAAA, 1), Run::<1>::new(16, 0xFFFF, 1)];
    assert_eq!(runs[0].size_in_units(), 3);
    assert_eq!(runs[1].size_in_units(), 2);
    assert_eq!(compute_size(&runs, 0), 6);
    // from atom 2 both runs cross a boundary: 2 padding atoms, then 1.
    assert_eq!(compute_size(&runs, 2), 10);
}

#[test]
fn write_encodes_padding_and_zero_fill() {
    // two 3-atom runs: the second crosses the segment boundary
    let runs = [
        Run::<2>::new(13, 0x155_5555, 1),
        Run::<2>::new(13, 0x2AA_AAAA, 1),
    ];
    assert_eq!(runs[0].size_in_units(), 3);

    let mut atoms = vec![0xFFFFu16; 8];
    let end = write_segments_to(&runs, &mut atoms, 0);
    assert_eq!(end, 7);
    // one padding atom closes the first segment
    assert_eq!(atoms[3], 0x0080);
    // tail of the final segment is zero-filled
    assert_eq!(atoms[7], 0);

    let decoded: Vec<Run<2>> = RunCursor::new(&atoms[..end]).map(|(run, _)| run).collect();
    assert_eq!(decoded, runs);
}

#[test]
fn sizing_and_writing_agree_across_offsets() {
    fastrand::seed(0x5EED);
    for _ in 0..100 {
        let runs = compactify_runs(random_runs::<3>(fastrand::usize(0..24)));
        for start in [0usize, 1, 3, 4, 6, 11] {
            let size = compute_size(&runs, start);
            let mut atoms = vec![0u16; size.next_multiple_of(4).max(4)];
            let end = write_segments_to(&runs, &mut atoms, start);
            assert_eq!(end, size, "start {start}, {} runs", runs.len());

            let decoded: Vec<Run<3>> = RunCursor::with_start(&atoms[..end], start)
                .map(|(run, _)| run)
                .collect();
            assert_eq!(decoded, runs);
        }
    }
}

#[test]
fn no_run_straddles_a_segment_boundary() {
    fastrand::seed(0xB0BA);
    for _ in 0..50 {
        let runs = compactify_runs(random_runs::<5>(16));
        let size = compute_size(&runs, 0);
        let mut atoms = vec![0u16; size.next_multiple_of(4).max(4)];
        write_segments_to(&runs, &mut atoms, 0);
        for (run, at) in RunCursor::<5>::new(&atoms[..size]) {
            let units = run.size_in_units();
            assert_eq!(at / 4, (at + units - 1) / 4, "run {run} at {at}");
        }
    }
}
