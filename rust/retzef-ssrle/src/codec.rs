//! Bit-level layout of a packed run.
//!
//! A run is encoded as a single little-endian code word occupying 1 to 4
//! 16-bit atoms:
//!
//! - bits `[0, 2)` — number of atoms minus one;
//! - bits `[2, 2 + LEN_BITS)` — pattern length;
//! - the next `pattern_length * BPS` bits — the pattern, LSB first;
//! - the remaining bits of the occupied atoms — the run length. An empty or
//!   all-zero run-length field stands for a run length of one.
//!
//! A pattern length of zero marks the two structural runs: run length zero is
//! the stream terminator, a positive run length is a padding run covering that
//! many atoms (itself included) up to the next segment boundary.

/// Width of one code unit (atom) in bits.
pub const ATOM_BITS: usize = 16;

/// Number of atoms per segment; runs never cross a segment boundary.
pub const SEGMENT_SIZE_ATOMS: usize = 4;

/// Size of one segment in bytes.
pub const SEGMENT_SIZE_BYTES: usize = SEGMENT_SIZE_ATOMS * ATOM_BITS / 8;

/// Maximal encoded size of a single run.
pub const MAX_RUN_SIZE_ATOMS: usize = 4;

/// Width of the atom-count field at the start of each code word.
pub const SIZE_FIELD_BITS: usize = 2;

/// Width of the pattern-length field for the given symbol width: the smallest
/// `w` such that the longest pattern expressible in the remaining bits,
/// `(62 - w) / bps`, itself fits into `w` bits.
pub const fn len_bits(bps: usize) -> usize {
    assert!(bps >= 1 && bps <= 8);
    let mut w = 1;
    while (62 - w) / bps >= (1 << w) {
        w += 1;
    }
    w
}

/// Longest pattern (in symbols) a single code word can carry.
pub const fn max_pattern_length(bps: usize) -> usize {
    (62 - len_bits(bps)) / bps
}

/// Alphabet size for the given symbol width.
pub const fn symbol_count(bps: usize) -> usize {
    1 << bps
}

/// A mask of `bits` low bits, saturating at the full word.
#[inline]
pub const fn mask64(bits: usize) -> u64 {
    if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 }
}

/// Number of bits needed to store a run-length value. Lengths of zero and one
/// occupy no bits at all.
#[inline]
pub const fn run_length_bitsize(value: u64) -> usize {
    if value <= 1 {
        0
    } else {
        64 - value.leading_zeros() as usize
    }
}

/// Total payload width of a code word for the given run shape.
#[inline]
pub const fn code_word_bits(bps: usize, pattern_length: usize, run_length: u64) -> usize {
    SIZE_FIELD_BITS + len_bits(bps) + pattern_length * bps + run_length_bitsize(run_length)
}

/// True when a run of this shape is encodable in one code word.
#[inline]
pub const fn is_fit(bps: usize, pattern_length: usize, run_length: u64) -> bool {
    code_word_bits(bps, pattern_length, run_length) <= 64
}

/// Number of atoms the encoded run will occupy.
#[inline]
pub const fn estimate_units(bps: usize, pattern_length: usize, run_length: u64) -> usize {
    code_word_bits(bps, pattern_length, run_length).div_ceil(ATOM_BITS)
}

/// Largest run length encodable alongside a pattern of the given length.
#[inline]
pub const fn max_run_length(bps: usize, pattern_length: usize) -> u64 {
    let used = SIZE_FIELD_BITS + len_bits(bps) + pattern_length * bps;
    if used >= 64 { 1 } else { mask64(64 - used) }
}

#[inline]
pub(crate) fn read_word(source: &[u16], units: usize) -> u64 {
    let mut value = 0u64;
    let mut i = 0;
    while i < units {
        value |= (source[i] as u64) << (i * ATOM_BITS);
        i += 1;
    }
    value
}

#[inline]
pub(crate) fn write_word(target: &mut [u16], value: u64, units: usize) {
    let mut i = 0;
    while i < units {
        target[i] = (value >> (i * ATOM_BITS)) as u16;
        i += 1;
    }
}
