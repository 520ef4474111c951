//! In-place rewriting of XML byte buffers.
//!
//! Rewritten parts are produced by splicing new bytes over a handful of byte
//! ranges of the original part. Everything outside those ranges (declarations,
//! namespace prefixes, attribute quoting, whitespace) is copied verbatim.

use std::ops::Range;

/// One replacement of a byte range of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub range: Range<usize>,
    pub replacement: Vec<u8>,
}

impl Splice {
    #[inline]
    pub fn new(range: Range<usize>, replacement: impl Into<Vec<u8>>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }
}

/// Apply `splices` to `src`.
///
/// Splices must be sorted by start offset and must not overlap; scanners
/// produce them in document order, which satisfies both.
pub fn apply_splices(src: &[u8], splices: &[Splice]) -> Vec<u8> {
    let delta: isize = splices
        .iter()
        .map(|s| s.replacement.len() as isize - s.range.len() as isize)
        .sum();
    let mut out = Vec::with_capacity((src.len() as isize + delta).max(0) as usize);

    let mut cursor = 0;
    for splice in splices {
        debug_assert!(splice.range.start >= cursor, "splices out of order");
        out.extend_from_slice(&src[cursor..splice.range.start]);
        out.extend_from_slice(&splice.replacement);
        cursor = splice.range.end;
    }
    out.extend_from_slice(&src[cursor..]);

    out
}
