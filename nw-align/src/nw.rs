//! Row-by-row fill of the three-state affine DP.
//!
//! Scores are kept for the current row only. When a `TraceMatrix` is given,
//! every cell also stores a `Tracer` byte so the optimal path can be
//! recovered afterwards.
use crate::error::AlignError;
use crate::rule::{GapScores, TransitionRule};
use crate::trace::{TraceMatrix, Tracer};
use nw_types::*;
use std::ops::ControlFlow;

/// The `V` and `F` values of one row. `E` only depends on the cell to the
/// left and is kept in a local.
pub(crate) struct Row {
    /// Best score ending in each cell.
    v: Vec<Score>,
    /// Best score ending in a gap in sequence 2 (vertical).
    f: Vec<Score>,
}

/// `max(best + open + extend, state + extend)`, and whether extending won.
/// Ties open a new gap.
#[inline]
fn open_or_extend(best: Score, state: Score, gap: GapScores) -> (Score, bool) {
    let open = best + gap.open + gap.extend;
    let extend = state + gap.extend;
    if extend > open {
        (extend, true)
    } else {
        (open, false)
    }
}

/// Number of DP cells for sequences of the given lengths, including row and column 0.
pub(crate) fn num_cells(len1: usize, len2: usize) -> u64 {
    (len1 as u64 + 1) * (len2 as u64 + 1)
}

impl Row {
    /// Row 0: the origin followed by insertions only.
    fn first<R: TransitionRule>(rule: &R, trace: &mut Option<&mut TraceMatrix>) -> Self {
        let cols = rule.dims().1 + 1;
        let mut row = Row {
            v: vec![NEG_INF; cols],
            f: vec![NEG_INF; cols],
        };
        row.v[0] = 0;
        let mut e = NEG_INF;
        for j in 1..cols {
            let (e_new, extends) = open_or_extend(row.v[j - 1], e, rule.insertion(0, j));
            e = e_new;
            row.v[j] = e;
            if let Some(trace) = trace {
                trace.set(0, j, Tracer::insertion(extends));
            }
        }
        row
    }

    /// Overwrites row `i - 1` with row `i`.
    fn next<R: TransitionRule>(
        &mut self,
        rule: &R,
        i: usize,
        trace: &mut Option<&mut TraceMatrix>,
    ) {
        let cols = self.v.len();

        // Column 0: deletions only.
        let mut diag = self.v[0];
        let (f0, extends) = open_or_extend(self.v[0], self.f[0], rule.deletion(i, 0));
        self.f[0] = f0;
        self.v[0] = f0;
        if let Some(trace) = trace {
            trace.set(i, 0, Tracer::deletion(extends));
        }

        let mut e = NEG_INF;
        for j in 1..cols {
            // `diag` is V(i-1, j-1), `self.v[j]` still holds V(i-1, j) and
            // `self.v[j-1]` already holds V(i, j-1).
            let g = diag + rule.substitution(i, j);
            diag = self.v[j];
            let (e_new, e_extends) = open_or_extend(self.v[j - 1], e, rule.insertion(i, j));
            let (f_new, f_extends) = open_or_extend(self.v[j], self.f[j], rule.deletion(i, j));
            e = e_new;
            self.f[j] = f_new;

            // Ties prefer the diagonal, then the insertion.
            let (best, layer) = if g >= e && g >= f_new {
                (g, Layer::Diagonal)
            } else if e >= f_new {
                (e, Layer::GapInSeq1)
            } else {
                (f_new, Layer::GapInSeq2)
            };
            self.v[j] = best;
            if let Some(trace) = trace {
                trace.set(i, j, Tracer::new(layer, e_extends, f_extends));
            }
        }
    }
}

/// Fills the DP for `rule` and returns the score of the bottom right cell.
///
/// `after_row(cells_done)` is called after every row, starting with row 0.
/// Returning `ControlFlow::Break` stops the fill and yields `None`.
pub(crate) fn fill<R: TransitionRule>(
    rule: &R,
    mut trace: Option<&mut TraceMatrix>,
    mut after_row: impl FnMut(u64) -> ControlFlow<()>,
) -> Option<Score> {
    let (len1, len2) = rule.dims();
    let cols = len2 as u64 + 1;
    let mut row = Row::first(rule, &mut trace);
    if after_row(cols).is_break() {
        return None;
    }
    for i in 1..=len1 {
        row.next(rule, i, &mut trace);
        if after_row((i as u64 + 1) * cols).is_break() {
            return None;
        }
    }
    Some(row.v[len2])
}

/// Checks the problem size against `max_cells` and allocates the trace matrix.
pub(crate) fn allocate_trace(
    len1: usize,
    len2: usize,
    max_cells: u64,
) -> Result<TraceMatrix, AlignError> {
    let cells = num_cells(len1, len2);
    if cells > max_cells {
        return Err(AlignError::TooLarge {
            len1,
            len2,
            cells,
            limit: max_cells,
        });
    }
    TraceMatrix::try_new(len1 + 1, len2 + 1)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rule::AffineRule;

    fn score(a: Seq, b: Seq, p: Penalties, esf: EndSpaceFree) -> Score {
        let m = ScoringMatrix::nucleotide(p.match_score, p.mismatch);
        let rule = AffineRule::new(a, b, &m, &p, esf);
        fill(&rule, None, |_| ControlFlow::Continue(())).unwrap()
    }

    #[test]
    fn boundaries() {
        let p = Penalties::default();
        // A single gap of length 4 on either side.
        assert_eq!(score(b"A", b"AAAAA", p, EndSpaceFree::none()), 1 + p.gap(4));
        assert_eq!(score(b"AAAAA", b"A", p, EndSpaceFree::none()), 1 + p.gap(4));
        assert_eq!(score(b"A", b"CCCCA", p, EndSpaceFree::none()), 1 + p.gap(4));
        assert_eq!(score(b"A", b"CCCCA", p, EndSpaceFree::all()), 1);
        assert_eq!(score(b"A", b"ACCCC", p, EndSpaceFree::all()), 1);
    }

    #[test]
    fn row_callback() {
        let p = Penalties::default();
        let m = ScoringMatrix::nucleotide(p.match_score, p.mismatch);
        let rule = AffineRule::new(b"ACG", b"ACGTT", &m, &p, EndSpaceFree::none());
        let mut done = vec![];
        let s = fill(&rule, None, |cells| {
            done.push(cells);
            ControlFlow::Continue(())
        });
        assert_eq!(s, Some(3 + p.gap(2)));
        assert_eq!(done, vec![6, 12, 18, 24]);

        let mut rows = 0;
        let s = fill(&rule, None, |_| {
            rows += 1;
            if rows == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(s, None);
        assert_eq!(rows, 2);
    }

    #[test]
    fn size_limit() {
        assert!(matches!(
            allocate_trace(9, 9, 99),
            Err(AlignError::TooLarge { cells: 100, .. })
        ));
        assert!(allocate_trace(9, 9, 100).is_ok());
    }
}
