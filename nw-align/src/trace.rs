//! Backtrace storage and the traceback walk.
use crate::error::AlignError;
use nw_types::*;

/// Backtrace bits of a single cell.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub(crate) struct Tracer(u8);

impl Tracer {
    /// The best score of the cell ends in a diagonal step.
    const DIAGONAL: u8 = 1 << 0;
    /// Otherwise, it ends in an insertion (set) or a deletion (unset).
    const INSERT: u8 = 1 << 1;
    /// The insertion state continues the insertion state on the left.
    const INSERT_EXTENDS: u8 = 1 << 2;
    /// The deletion state continues the deletion state above.
    const DELETE_EXTENDS: u8 = 1 << 3;

    pub(crate) fn new(best: Layer, insert_extends: bool, delete_extends: bool) -> Self {
        let mut bits = match best {
            Layer::Diagonal => Self::DIAGONAL,
            Layer::GapInSeq1 => Self::INSERT,
            Layer::GapInSeq2 => 0,
        };
        if insert_extends {
            bits |= Self::INSERT_EXTENDS;
        }
        if delete_extends {
            bits |= Self::DELETE_EXTENDS;
        }
        Tracer(bits)
    }

    /// A row 0 cell.
    pub(crate) fn insertion(extends: bool) -> Self {
        Self::new(Layer::GapInSeq1, extends, false)
    }

    /// A column 0 cell.
    pub(crate) fn deletion(extends: bool) -> Self {
        Self::new(Layer::GapInSeq2, false, extends)
    }

    fn best(self) -> Layer {
        if self.0 & Self::DIAGONAL != 0 {
            Layer::Diagonal
        } else if self.0 & Self::INSERT != 0 {
            Layer::GapInSeq1
        } else {
            Layer::GapInSeq2
        }
    }

    fn insert_extends(self) -> bool {
        self.0 & Self::INSERT_EXTENDS != 0
    }

    fn delete_extends(self) -> bool {
        self.0 & Self::DELETE_EXTENDS != 0
    }
}

/// One `Tracer` per DP cell, row major.
pub(crate) struct TraceMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Tracer>,
}

impl TraceMatrix {
    /// Allocates a `rows x cols` matrix, failing gracefully when memory is short.
    pub(crate) fn try_new(rows: usize, cols: usize) -> Result<Self, AlignError> {
        let cells = rows as u64 * cols as u64;
        let len = rows.checked_mul(cols).ok_or(AlignError::Allocation { cells })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| AlignError::Allocation { cells })?;
        data.resize(len, Tracer::default());
        Ok(Self { rows, cols, data })
    }

    #[inline]
    pub(crate) fn set(&mut self, i: usize, j: usize, tracer: Tracer) {
        self.data[i * self.cols + j] = tracer;
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> Tracer {
        self.data[i * self.cols + j]
    }

    /// Walks back from the bottom right cell to the origin and returns the
    /// edit ops from start to end.
    ///
    /// `a` and `b` must be the sequences the matrix was filled for; they are
    /// only used to tell matches from replacements.
    pub(crate) fn traceback(&self, a: Seq, b: Seq) -> Transcript {
        assert_eq!((self.rows, self.cols), (a.len() + 1, b.len() + 1));
        let (mut i, mut j) = (a.len(), b.len());
        let mut transcript = Transcript::with_capacity(a.len() + b.len());
        let mut layer = self.get(i, j).best();
        while (i, j) != (0, 0) {
            let tracer = self.get(i, j);
            match layer {
                Layer::Diagonal => {
                    assert!(i > 0 && j > 0, "Traceback left the matrix at ({i}, {j})");
                    transcript.push(EditOp::diagonal(a[i - 1], b[j - 1]));
                    i -= 1;
                    j -= 1;
                    layer = self.get(i, j).best();
                }
                Layer::GapInSeq1 => {
                    assert!(j > 0, "Traceback left the matrix at ({i}, {j})");
                    transcript.push(EditOp::Insert);
                    j -= 1;
                    if !tracer.insert_extends() {
                        layer = self.get(i, j).best();
                    }
                }
                Layer::GapInSeq2 => {
                    assert!(i > 0, "Traceback left the matrix at ({i}, {j})");
                    transcript.push(EditOp::Delete);
                    i -= 1;
                    if !tracer.delete_extends() {
                        layer = self.get(i, j).best();
                    }
                }
            }
        }
        transcript.reverse();
        transcript
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nw::fill;
    use crate::rule::AffineRule;
    use std::ops::ControlFlow;

    fn align(a: Seq, b: Seq, p: &Penalties, esf: EndSpaceFree) -> (Score, Transcript) {
        let m = ScoringMatrix::nucleotide(p.match_score, p.mismatch);
        let rule = AffineRule::new(a, b, &m, p, esf);
        let mut trace = TraceMatrix::try_new(a.len() + 1, b.len() + 1).unwrap();
        let s = fill(&rule, Some(&mut trace), |_| ControlFlow::Continue(())).unwrap();
        let t = trace.traceback(a, b);
        assert_eq!(t.check(a, b), Ok(()));
        assert_eq!(t.score(a, b, &m, p, esf), s);
        (s, t)
    }

    #[test]
    fn tracer_bits() {
        let t = Tracer::new(Layer::GapInSeq2, true, false);
        assert_eq!(t.best(), Layer::GapInSeq2);
        assert!(t.insert_extends());
        assert!(!t.delete_extends());
        assert_eq!(Tracer::insertion(false).best(), Layer::GapInSeq1);
        assert_eq!(Tracer::deletion(true).best(), Layer::GapInSeq2);
    }

    #[test]
    fn identical() {
        let (s, t) = align(b"ACGTACGT", b"ACGTACGT", &Penalties::default(), EndSpaceFree::none());
        assert_eq!(s, 8);
        assert_eq!(t.to_string(), "MMMMMMMM");
    }

    #[test]
    fn single_gap_run() {
        let p = Penalties::default();
        let (s, t) = align(b"AAACCCGGG", b"AAAGGG", &p, EndSpaceFree::none());
        assert_eq!(s, 6 + p.gap(3));
        assert_eq!(t.to_cigar_string(), "3M3D3M");

        let (s, t) = align(b"AAAGGG", b"AAACCCGGG", &p, EndSpaceFree::none());
        assert_eq!(s, 6 + p.gap(3));
        assert_eq!(t.to_cigar_string(), "3M3I3M");
    }

    #[test]
    fn free_ends() {
        let p = Penalties::default();
        let (s, t) = align(b"ACGT", b"TTTTACGTTTTT", &p, EndSpaceFree::all());
        assert_eq!(s, 4);
        assert_eq!(t.to_cigar_string(), "4I4M5I");

        let esf = EndSpaceFree::new(false, false, true, true);
        let (s, t) = align(b"TTTTACGTTTTT", b"ACGT", &p, esf);
        assert_eq!(s, 4);
        assert_eq!(t.to_cigar_string(), "4D4M5D");
    }
}
