//! `TransitionRule` is the per-cell policy of the three-state affine
//! recurrence. The DP fill and traceback are fixed; a rule only decides what
//! each step into a cell scores.
//!
//! The recurrence over cell `(i, j)`, with `V` the best score of a cell:
//!
//! ```text
//! G(i, j) = V(i-1, j-1) + substitution(i, j)
//! E(i, j) = max(V(i, j-1) + open + extend, E(i, j-1) + extend)   insertion(i, j)
//! F(i, j) = max(V(i-1, j) + open + extend, F(i-1, j) + extend)   deletion(i, j)
//! V(i, j) = max(G, E, F)
//! ```
//!
//! Row 0 and column 0 use the same `E` and `F` steps, so boundary penalties
//! also come from the rule.

use nw_types::*;

/// Open and extend scores of a single gap step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GapScores {
    pub open: Score,
    pub extend: Score,
}

impl GapScores {
    pub const FREE: GapScores = GapScores { open: 0, extend: 0 };
}

pub trait TransitionRule {
    /// The lengths of sequence 1 and sequence 2.
    fn dims(&self) -> (usize, usize);

    /// Score of the diagonal step into `(i, j)`, aligning `seq1[i-1]` with `seq2[j-1]`.
    fn substitution(&self, i: usize, j: usize) -> Score;

    /// Scores of the horizontal step into `(i, j)`: `seq2[j-1]` against a gap in row `i`.
    fn insertion(&self, i: usize, j: usize) -> GapScores;

    /// Scores of the vertical step into `(i, j)`: `seq1[i-1]` against a gap in column `j`.
    fn deletion(&self, i: usize, j: usize) -> GapScores;
}

/// Substitution matrix, affine gaps and optionally free end gaps.
#[derive(Clone, Copy, Debug)]
pub struct AffineRule<'a> {
    a: Seq<'a>,
    b: Seq<'a>,
    matrix: &'a ScoringMatrix,
    gap: GapScores,
    esf: EndSpaceFree,
}

impl<'a> AffineRule<'a> {
    pub fn new(
        a: Seq<'a>,
        b: Seq<'a>,
        matrix: &'a ScoringMatrix,
        penalties: &Penalties,
        esf: EndSpaceFree,
    ) -> Self {
        Self {
            a,
            b,
            matrix,
            gap: GapScores {
                open: penalties.gap_open,
                extend: penalties.gap_extend,
            },
            esf,
        }
    }
}

impl<'a> TransitionRule for AffineRule<'a> {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.a.len(), self.b.len())
    }

    #[inline]
    fn substitution(&self, i: usize, j: usize) -> Score {
        self.matrix.score(self.a[i - 1], self.b[j - 1])
    }

    /// Row 0 holds the leading insertions, the last row the trailing ones.
    #[inline]
    fn insertion(&self, i: usize, _j: usize) -> GapScores {
        if (i == 0 && self.esf.left1) || (i == self.a.len() && self.esf.right1) {
            GapScores::FREE
        } else {
            self.gap
        }
    }

    #[inline]
    fn deletion(&self, _i: usize, j: usize) -> GapScores {
        if (j == 0 && self.esf.left2) || (j == self.b.len() && self.esf.right2) {
            GapScores::FREE
        } else {
            self.gap
        }
    }
}
