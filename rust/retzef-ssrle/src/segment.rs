//! Segment-aligned packing of run lists.
//!
//! Runs are written back to back as 16-bit atoms, but never across a 4-atom
//! segment boundary. A run that would straddle the boundary is pushed to the
//! next segment and the gap is covered by one padding atom plus zeroed
//! filler. Sizing and writing advance the same cursor, so [`compute_size`]
//! always equals the number of atoms [`write_segments_to`] produces.

use log::trace;

use crate::codec::{MAX_RUN_SIZE_ATOMS, SEGMENT_SIZE_ATOMS};
use crate::run::Run;

/// Where one run lands in the atom stream.
pub(crate) struct Placement {
    /// Padding to emit before the run: atom position and covered length.
    pub padding: Option<(usize, usize)>,
    /// Atom position of the run itself.
    pub at: usize,
}

/// Tracks the write position and the current segment boundary.
pub(crate) struct SegmentCursor {
    pos: usize,
    limit: usize,
}

impl SegmentCursor {
    pub fn new(start: usize) -> SegmentCursor {
        let limit = start - start % SEGMENT_SIZE_ATOMS + SEGMENT_SIZE_ATOMS;
        SegmentCursor { pos: start, limit }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Reserves `units` atoms for one run, stepping over the segment
    /// boundary when the run would straddle it. The skipped gap is at most
    /// `SEGMENT_SIZE_ATOMS - 1` atoms and always fits one padding atom.
    pub fn place(&mut self, units: usize) -> Placement {
        debug_assert!(units >= 1 && units <= MAX_RUN_SIZE_ATOMS);
        let padding = if self.pos + units > self.limit {
            let pad = (self.pos, self.limit - self.pos);
            self.pos = self.limit;
            self.limit += SEGMENT_SIZE_ATOMS;
            Some(pad)
        } else {
            None
        };
        let at = self.pos;
        self.pos += units;
        if self.pos == self.limit {
            self.limit += SEGMENT_SIZE_ATOMS;
        }
        Placement { padding, at }
    }
}

/// End position (atoms) after packing `runs` starting at atom `start`.
pub(crate) fn compute_size<const BPS: usize>(runs: &[Run<BPS>], start: usize) -> usize {
    let mut cursor = SegmentCursor::new(start);
    for run in runs {
        if run.is_empty() {
            continue;
        }
        cursor.place(run.size_in_units());
    }
    cursor.pos()
}

/// Packs `runs` into `target` starting at atom `start`, zero-filling the
/// tail of the final segment. Returns the end position.
pub(crate) fn write_segments_to<const BPS: usize>(
    runs: &[Run<BPS>],
    target: &mut [u16],
    start: usize,
) -> usize {
    let mut cursor = SegmentCursor::new(start);
    for run in runs {
        if run.is_empty() {
            continue;
        }
        let placement = cursor.place(run.size_in_units());
        if let Some((at, len)) = placement.padding {
            trace!("segment padding: {len} atoms at {at}");
            Run::<BPS>::padding(len as u64).encode_to(&mut target[at..]);
            for atom in &mut target[at + 1..at + len] {
                *atom = 0;
            }
        }
        run.encode_to(&mut target[placement.at..]);
    }
    let end = cursor.pos();
    finish_segment(target, end);
    end
}

/// Zero-fills the remainder of the segment containing atom `end`.
fn finish_segment(target: &mut [u16], end: usize) {
    let tail = end.next_multiple_of(SEGMENT_SIZE_ATOMS).min(target.len());
    for atom in &mut target[end..tail] {
        *atom = 0;
    }
}
