//! This module contains the `Penalties` and `EndSpaceFree` parameters of the
//! affine scoring model.
//!
//! A gap of length `k` scores `gap_open + k * gap_extend`: the open penalty is
//! paid once per gap run, the extend penalty for every gap column including
//! the first.

use crate::Score;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MATCH: Score = 1;
pub const DEFAULT_MISMATCH: Score = -3;
pub const DEFAULT_GAP_OPEN: Score = -5;
pub const DEFAULT_GAP_EXTEND: Score = -2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalties {
    /// Score of two identical unambiguous nucleotides.
    pub match_score: Score,
    /// Score of any other nucleotide pair.
    pub mismatch: Score,
    pub gap_open: Score,
    pub gap_extend: Score,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            match_score: DEFAULT_MATCH,
            mismatch: DEFAULT_MISMATCH,
            gap_open: DEFAULT_GAP_OPEN,
            gap_extend: DEFAULT_GAP_EXTEND,
        }
    }
}

impl Penalties {
    pub fn new(match_score: Score, mismatch: Score, gap_open: Score, gap_extend: Score) -> Self {
        Self {
            match_score,
            mismatch,
            gap_open,
            gap_extend,
        }
    }

    /// Linear gaps: `open = 0`, so a gap of length `k` scores `k * indel`.
    pub fn linear(match_score: Score, mismatch: Score, indel: Score) -> Self {
        Self::new(match_score, mismatch, 0, indel)
    }

    /// The score of a single gap run of length `len`.
    #[inline]
    pub fn gap(&self, len: usize) -> Score {
        if len == 0 {
            0
        } else {
            self.gap_open + len as Score * self.gap_extend
        }
    }
}

/// Which ends of which sequence may be gapped for free.
///
/// `left1`/`right1` cover leading/trailing gaps in sequence 1, i.e. runs of
/// `Insert` at the start/end of the transcript. `left2`/`right2` cover gaps in
/// sequence 2, i.e. runs of `Delete`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndSpaceFree {
    pub left1: bool,
    pub right1: bool,
    pub left2: bool,
    pub right2: bool,
}

impl EndSpaceFree {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self::uniform(true)
    }

    pub fn uniform(free: bool) -> Self {
        Self {
            left1: free,
            right1: free,
            left2: free,
            right2: free,
        }
    }

    pub fn new(left1: bool, right1: bool, left2: bool, right2: bool) -> Self {
        Self {
            left1,
            right1,
            left2,
            right2,
        }
    }

    pub fn any(&self) -> bool {
        self.left1 || self.right1 || self.left2 || self.right2
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let p = Penalties::default();
        assert_eq!((p.match_score, p.mismatch, p.gap_open, p.gap_extend), (1, -3, -5, -2));
        assert!(!EndSpaceFree::default().any());
    }

    #[test]
    fn affine_gap() {
        let p = Penalties::default();
        assert_eq!(p.gap(0), 0);
        assert_eq!(p.gap(1), -7);
        assert_eq!(p.gap(3), -11);
        assert_eq!(p.gap(10), -25);
        assert_eq!(Penalties::linear(1, -1, -1).gap(4), -4);
    }
}
