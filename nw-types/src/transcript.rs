use crate::{EndSpaceFree, Penalties, Score, ScoringMatrix, Seq};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Range, slice, str::FromStr};
use thiserror::Error;

/// One aligned column.
///
/// `Insert` is a gap in sequence 1: it consumes a residue of sequence 2 only.
/// `Delete` is a gap in sequence 2: it consumes a residue of sequence 1 only.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Serialize, Deserialize)]
pub enum EditOp {
    Match,
    Replace,
    Insert,
    Delete,
}

impl EditOp {
    pub fn to_char(self) -> char {
        match self {
            EditOp::Match => 'M',
            EditOp::Replace => 'R',
            EditOp::Insert => 'I',
            EditOp::Delete => 'D',
        }
    }

    pub fn from_char(c: char) -> Option<EditOp> {
        Some(match c {
            'M' => EditOp::Match,
            'R' => EditOp::Replace,
            'I' => EditOp::Insert,
            'D' => EditOp::Delete,
            _ => return None,
        })
    }

    /// The diagonal op for the given pair of residues.
    #[inline]
    pub fn diagonal(a: u8, b: u8) -> EditOp {
        if a.eq_ignore_ascii_case(&b) {
            EditOp::Match
        } else {
            EditOp::Replace
        }
    }

    #[inline]
    pub fn consumes_seq1(self) -> bool {
        self != EditOp::Insert
    }

    #[inline]
    pub fn consumes_seq2(self) -> bool {
        self != EditOp::Delete
    }

    /// The op obtained when sequences 1 and 2 trade places.
    #[inline]
    pub fn swapped(self) -> EditOp {
        match self {
            EditOp::Insert => EditOp::Delete,
            EditOp::Delete => EditOp::Insert,
            op => op,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("invalid transcript symbol {symbol:?} at {pos}")]
    InvalidSymbol { symbol: char, pos: usize },
    #[error("column {column}: {op:?} runs past the end of sequence {seq}")]
    Overrun { column: usize, op: EditOp, seq: u8 },
    #[error("column {column}: {op:?} does not fit residues {a:?} and {b:?}")]
    WrongDiagonal { column: usize, op: EditOp, a: char, b: char },
    #[error("transcript consumes {used} of {len} residues of sequence {seq}")]
    Incomplete { seq: u8, used: usize, len: usize },
}

/// A run of consecutive `Match` columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSegment {
    pub start1: usize,
    pub start2: usize,
    pub len: usize,
}

impl MatchSegment {
    pub fn range1(&self) -> Range<usize> {
        self.start1..self.start1 + self.len
    }

    pub fn range2(&self) -> Range<usize> {
        self.start2..self.start2 + self.len
    }
}

/// The first longest segment.
fn longest<'a>(segments: impl Iterator<Item = &'a MatchSegment>) -> Option<MatchSegment> {
    segments.fold(None, |best, s| match best {
        Some(b) if b.len >= s.len => Some(b),
        _ => Some(*s),
    })
}

/// Edit operations ordered from the start of the alignment to its end.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    ops: Vec<EditOp>,
}

impl From<Vec<EditOp>> for Transcript {
    fn from(ops: Vec<EditOp>) -> Self {
        Self { ops }
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            write!(f, "{}", op.to_char())?;
        }
        Ok(())
    }
}

impl Extend<EditOp> for Transcript {
    fn extend<T: IntoIterator<Item = EditOp>>(&mut self, iter: T) {
        self.ops.extend(iter)
    }
}

impl FromStr for Transcript {
    type Err = TranscriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .enumerate()
            .map(|(pos, symbol)| {
                EditOp::from_char(symbol).ok_or(TranscriptError::InvalidSymbol { symbol, pos })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Transcript::from)
    }
}

impl Transcript {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, op: EditOp) {
        self.ops.push(op);
    }

    /// Reverse the transcript.
    pub fn reverse(&mut self) {
        self.ops.reverse()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn iter(&self) -> slice::Iter<'_, EditOp> {
        self.ops.iter()
    }

    /// Maximal runs of equal ops.
    pub fn runs(&self) -> Vec<(EditOp, usize)> {
        self.ops
            .iter()
            .group_by(|&&op| op)
            .into_iter()
            .map(|(op, run)| (op, run.count()))
            .collect()
    }

    /// Run-length encoding, e.g. `3M1R2I`.
    pub fn to_cigar_string(&self) -> String {
        self.runs()
            .into_iter()
            .map(|(op, cnt)| format!("{cnt}{}", op.to_char()))
            .join("")
    }

    /// The transcript of the alignment with sequences 1 and 2 swapped.
    pub fn swapped(&self) -> Transcript {
        self.ops.iter().map(|op| op.swapped()).collect_vec().into()
    }

    /// Number of residues consumed from sequence 1 and 2.
    pub fn consumed(&self) -> (usize, usize) {
        (
            self.ops.iter().filter(|op| op.consumes_seq1()).count(),
            self.ops.iter().filter(|op| op.consumes_seq2()).count(),
        )
    }

    /// Number of occurrences of `op`.
    pub fn count(&self, op: EditOp) -> usize {
        self.ops.iter().filter(|&&o| o == op).count()
    }

    /// All maximal runs of `Match` columns, from start to end.
    pub fn match_segments(&self) -> Vec<MatchSegment> {
        let (mut i, mut j) = (0, 0);
        let mut segments = vec![];
        for (op, len) in self.runs() {
            if op == EditOp::Match {
                segments.push(MatchSegment {
                    start1: i,
                    start2: j,
                    len,
                });
            }
            i += if op.consumes_seq1() { len } else { 0 };
            j += if op.consumes_seq2() { len } else { 0 };
        }
        segments
    }

    /// The leftmost segment of at least `min_size` matches, or the leftmost
    /// longest one when there is none.
    pub fn left_seg(&self, min_size: usize) -> Option<MatchSegment> {
        let segments = self.match_segments();
        segments
            .iter()
            .find(|s| s.len >= min_size)
            .copied()
            .or_else(|| longest(segments.iter()))
    }

    /// The rightmost segment of at least `min_size` matches, or the rightmost
    /// longest one when there is none.
    pub fn right_seg(&self, min_size: usize) -> Option<MatchSegment> {
        let segments = self.match_segments();
        segments
            .iter()
            .rev()
            .find(|s| s.len >= min_size)
            .copied()
            .or_else(|| longest(segments.iter().rev()))
    }

    /// The leftmost longest segment of matches.
    pub fn longest_seg(&self) -> Option<MatchSegment> {
        longest(self.match_segments().iter())
    }

    /// Checks that the transcript aligns `a` to `b`: every residue is consumed
    /// exactly once and diagonal ops agree with the residues.
    pub fn check(&self, a: Seq, b: Seq) -> Result<(), TranscriptError> {
        let (mut i, mut j) = (0, 0);
        for (column, &op) in self.ops.iter().enumerate() {
            if op.consumes_seq1() && i >= a.len() {
                return Err(TranscriptError::Overrun { column, op, seq: 1 });
            }
            if op.consumes_seq2() && j >= b.len() {
                return Err(TranscriptError::Overrun { column, op, seq: 2 });
            }
            if matches!(op, EditOp::Match | EditOp::Replace) && EditOp::diagonal(a[i], b[j]) != op
            {
                return Err(TranscriptError::WrongDiagonal {
                    column,
                    op,
                    a: a[i] as char,
                    b: b[j] as char,
                });
            }
            i += op.consumes_seq1() as usize;
            j += op.consumes_seq2() as usize;
        }
        if i != a.len() {
            return Err(TranscriptError::Incomplete {
                seq: 1,
                used: i,
                len: a.len(),
            });
        }
        if j != b.len() {
            return Err(TranscriptError::Incomplete {
                seq: 2,
                used: j,
                len: b.len(),
            });
        }
        Ok(())
    }

    /// Recomputes the score of this alignment of `a` and `b`.
    ///
    /// Each gap run scores `open + len * extend`, except leading and trailing
    /// runs that `esf` makes free. The transcript must be consistent with the
    /// sequences, see `check`.
    pub fn score(
        &self,
        a: Seq,
        b: Seq,
        matrix: &ScoringMatrix,
        penalties: &Penalties,
        esf: EndSpaceFree,
    ) -> Score {
        let runs = self.runs();
        let last = runs.len().saturating_sub(1);
        let (mut i, mut j) = (0, 0);
        let mut score = 0;
        for (idx, &(op, len)) in runs.iter().enumerate() {
            match op {
                EditOp::Match | EditOp::Replace => {
                    for k in 0..len {
                        score += matrix.score(a[i + k], b[j + k]);
                    }
                    i += len;
                    j += len;
                }
                EditOp::Insert => {
                    let free = (idx == 0 && esf.left1) || (idx == last && esf.right1);
                    if !free {
                        score += penalties.gap(len);
                    }
                    j += len;
                }
                EditOp::Delete => {
                    let free = (idx == 0 && esf.left2) || (idx == last && esf.right2);
                    if !free {
                        score += penalties.gap(len);
                    }
                    i += len;
                }
            }
        }
        score
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a EditOp;

    type IntoIter = slice::Iter<'a, EditOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_and_display() {
        let t: Transcript = "MMRIIDM".parse().unwrap();
        assert_eq!(t.to_string(), "MMRIIDM");
        assert_eq!(t.to_cigar_string(), "2M1R2I1D1M");
        assert_eq!(t.consumed(), (5, 6));
        assert_eq!(t.count(EditOp::Insert), 2);
        assert_eq!(
            "MMX".parse::<Transcript>(),
            Err(TranscriptError::InvalidSymbol {
                symbol: 'X',
                pos: 2
            })
        );
    }

    #[test]
    fn swap_gaps() {
        let t: Transcript = "MIIRD".parse().unwrap();
        assert_eq!(t.swapped().to_string(), "MDDRI");
    }

    #[test]
    fn check_consistency() {
        let t: Transcript = "MIMRD".parse().unwrap();
        assert_eq!(t.check(b"ACGT", b"AGCT"), Ok(()));
        assert!(matches!(
            t.check(b"ACGA", b"AGCT"),
            Err(TranscriptError::WrongDiagonal { column: 3, .. })
        ));
        assert!(matches!(
            t.check(b"ACGTT", b"AGCT"),
            Err(TranscriptError::Incomplete { seq: 1, .. })
        ));
        assert!(matches!(
            t.check(b"ACG", b"AGCT"),
            Err(TranscriptError::Overrun { seq: 1, .. })
        ));
    }

    #[test]
    fn segments() {
        // Segments: 2 at (0, 0), 3 at (3, 3), 4 at (6, 7), 1 at (11, 11).
        let t: Transcript = "MMRMMMIMMMMDM".parse().unwrap();
        let seg = |start1, start2, len| MatchSegment {
            start1,
            start2,
            len,
        };
        assert_eq!(
            t.match_segments(),
            vec![seg(0, 0, 2), seg(3, 3, 3), seg(6, 7, 4), seg(11, 11, 1)]
        );
        assert_eq!(seg(6, 7, 4).range1(), 6..10);
        assert_eq!(seg(6, 7, 4).range2(), 7..11);
    }

    #[test]
    fn left_segment() {
        let t: Transcript = "MMRMMMIMMMMDM".parse().unwrap();
        assert_eq!(t.left_seg(0).map(|s| s.start1), Some(0));
        assert_eq!(t.left_seg(3).map(|s| s.start1), Some(3));
        // Nothing long enough: the longest.
        assert_eq!(t.left_seg(10).map(|s| (s.start1, s.start2, s.len)), Some((6, 7, 4)));
        // Ties go to the left.
        let t: Transcript = "MMIMM".parse().unwrap();
        assert_eq!(t.left_seg(5).map(|s| s.start2), Some(0));
    }

    #[test]
    fn right_segment() {
        let t: Transcript = "MMRMMMIMMMMDM".parse().unwrap();
        assert_eq!(t.right_seg(1).map(|s| s.start1), Some(11));
        assert_eq!(t.right_seg(2).map(|s| s.start1), Some(6));
        assert_eq!(t.right_seg(10).map(|s| (s.start1, s.start2, s.len)), Some((6, 7, 4)));
        // Ties go to the right.
        let t: Transcript = "MMIMM".parse().unwrap();
        assert_eq!(t.right_seg(5).map(|s| (s.start1, s.start2)), Some((2, 3)));
    }

    #[test]
    fn longest_segment() {
        let t: Transcript = "MMRMMMIMMMMDM".parse().unwrap();
        assert_eq!(t.longest_seg().map(|s| s.range1()), Some(6..10));
        let t: Transcript = "MMIMM".parse().unwrap();
        assert_eq!(t.longest_seg().map(|s| s.range2()), Some(0..2));
        // No identical column at all.
        let t: Transcript = "RRID".parse().unwrap();
        assert_eq!(t.longest_seg(), None);
        assert_eq!(t.left_seg(1), None);
        assert_eq!(t.right_seg(1), None);
    }

    #[test]
    fn rescoring() {
        let m = ScoringMatrix::nucleotide(1, -3);
        let p = Penalties::default();
        // ACG-T / A-GAT: M D M I M
        let t: Transcript = "MDMIM".parse().unwrap();
        let (a, b) = (b"ACGT", b"AGAT");
        assert_eq!(t.check(a, b), Ok(()));
        assert_eq!(t.score(a, b, &m, &p, EndSpaceFree::none()), 3 - 7 - 7);

        // Leading insertions are free with `left1`.
        let t: Transcript = "IIMM".parse().unwrap();
        let (a, b) = (b"AC", b"GGAC");
        assert_eq!(t.score(a, b, &m, &p, EndSpaceFree::none()), 2 - 9);
        let esf = EndSpaceFree::new(true, false, false, false);
        assert_eq!(t.score(a, b, &m, &p, esf), 2);
        // ... but not with `left2`.
        let esf = EndSpaceFree::new(false, false, true, true);
        assert_eq!(t.score(a, b, &m, &p, esf), 2 - 9);
    }
}
