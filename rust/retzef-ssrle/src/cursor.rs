//! Decoding iterator over a packed atom stream.

use crate::run::Run;

/// Yields the symbol-bearing runs of a packed stream together with the atom
/// position each was decoded from. Padding runs are stepped over; iteration
/// stops at the stream terminator or the end of the slice.
pub(crate) struct RunCursor<'a, const BPS: usize> {
    atoms: &'a [u16],
    pos: usize,
}

impl<'a, const BPS: usize> RunCursor<'a, BPS> {
    pub fn new(atoms: &'a [u16]) -> RunCursor<'a, BPS> {
        RunCursor { atoms, pos: 0 }
    }

    pub fn with_start(atoms: &'a [u16], start: usize) -> RunCursor<'a, BPS> {
        debug_assert!(start <= atoms.len());
        RunCursor { atoms, pos: start }
    }

    /// Current atom position; after exhaustion, the end of the decoded data.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }
}

impl<const BPS: usize> Iterator for RunCursor<'_, BPS> {
    type Item = (Run<BPS>, usize);

    fn next(&mut self) -> Option<(Run<BPS>, usize)> {
        while self.pos < self.atoms.len() {
            if self.atoms[self.pos] == 0 {
                return None;
            }
            let (run, units) = Run::<BPS>::decode_from(&self.atoms[self.pos..]);
            if run.is_padding() {
                self.pos += run.run_length() as usize;
                continue;
            }
            if run.is_empty() {
                return None;
            }
            let at = self.pos;
            self.pos += units;
            return Some((run, at));
        }
        None
    }
}
