//! Substitution scores: a 256x256 table indexed by residue bytes.
//!
//! The nucleotide table depends on the match/mismatch scores and is built on
//! demand. BLOSUM62 is built once per process and shared.

use crate::{Score, Seq};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// IUPACna: the four bases followed by the ambiguity codes.
pub const NUCLEOTIDES: &[u8] = b"AGTCBDHKMNRSVWY";
/// Number of unambiguous bases at the start of `NUCLEOTIDES`.
const BASES: usize = 4;

/// IUPACaa residues covered by BLOSUM62.
pub const AMINO_ACIDS: &[u8] = b"ARNDCQEGHILKMFPSTWYVBZX";

/// BLOSUM62 score of residues outside `AMINO_ACIDS`.
pub const BLOSUM62_DEFAULT_SCORE: Score = -4;

/// The built-in matrices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum MatrixKind {
    /// Identity scoring over IUPACna using the match/mismatch scores.
    #[default]
    Nucleotide,
    /// BLOSUM62 over IUPACaa.
    Blosum62,
}

impl MatrixKind {
    pub fn alphabet(&self) -> &'static [u8] {
        match self {
            MatrixKind::Nucleotide => NUCLEOTIDES,
            MatrixKind::Blosum62 => AMINO_ACIDS,
        }
    }

    /// Returns the position of the first byte of `seq` outside the alphabet.
    /// Lowercase residues are accepted.
    pub fn check_sequence(&self, seq: Seq) -> Option<usize> {
        let mut valid = [false; 256];
        for &c in self.alphabet() {
            valid[c as usize] = true;
            valid[c.to_ascii_lowercase() as usize] = true;
        }
        seq.iter().position(|&c| !valid[c as usize])
    }
}

lazy_static! {
    static ref BLOSUM62: Arc<ScoringMatrix> = Arc::new(ScoringMatrix::build_blosum62());
}

/// Substitution scores for every ordered pair of bytes.
///
/// Lookups use `(row, col) = (residue of seq1, residue of seq2)`. Symmetry is
/// not enforced.
#[derive(Clone, PartialEq, Eq)]
pub struct ScoringMatrix {
    /// 256 rows of 256 columns.
    scores: Box<[[Score; 256]]>,
}

impl fmt::Debug for ScoringMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringMatrix").finish_non_exhaustive()
    }
}

impl ScoringMatrix {
    /// A matrix scoring every pair as `default`.
    pub fn filled(default: Score) -> Self {
        Self {
            scores: vec![[default; 256]; 256].into_boxed_slice(),
        }
    }

    /// Identity scoring over IUPACna.
    ///
    /// Equal unambiguous bases score `match_score`. All other pairs, including
    /// identical ambiguity codes and bytes outside the alphabet, score `mismatch`.
    pub fn nucleotide(match_score: Score, mismatch: Score) -> Self {
        let mut m = Self::filled(mismatch);
        for &c in &NUCLEOTIDES[..BASES] {
            for x in [c, c.to_ascii_lowercase()] {
                for y in [c, c.to_ascii_lowercase()] {
                    m.set(x, y, match_score);
                }
            }
        }
        m
    }

    /// The shared BLOSUM62 matrix.
    pub fn blosum62() -> Arc<ScoringMatrix> {
        BLOSUM62.clone()
    }

    fn build_blosum62() -> Self {
        let mut m = Self::filled(BLOSUM62_DEFAULT_SCORE);
        for &x in AMINO_ACIDS {
            for &y in AMINO_ACIDS {
                let s = bio::scores::blosum62(x, y);
                for a in [x, x.to_ascii_lowercase()] {
                    for b in [y, y.to_ascii_lowercase()] {
                        m.set(a, b, s);
                    }
                }
            }
        }
        m
    }

    /// Builds the matrix for `kind`. Match and mismatch scores are only used
    /// for nucleotides.
    pub fn for_kind(kind: MatrixKind, match_score: Score, mismatch: Score) -> Arc<ScoringMatrix> {
        match kind {
            MatrixKind::Nucleotide => Arc::new(Self::nucleotide(match_score, mismatch)),
            MatrixKind::Blosum62 => Self::blosum62(),
        }
    }

    #[inline]
    pub fn score(&self, a: u8, b: u8) -> Score {
        self.scores[a as usize][b as usize]
    }

    #[inline]
    pub fn set(&mut self, a: u8, b: u8, score: Score) {
        self.scores[a as usize][b as usize] = score;
    }

    /// Sets `(a, b)` and `(b, a)`.
    pub fn set_symmetric(&mut self, a: u8, b: u8, score: Score) {
        self.set(a, b, score);
        self.set(b, a, score);
    }

    pub fn is_symmetric(&self) -> bool {
        (0..256).all(|a| (0..a).all(|b| self.scores[a][b] == self.scores[b][a]))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nucleotide_scores() {
        let m = ScoringMatrix::nucleotide(1, -3);
        assert_eq!(m.score(b'A', b'A'), 1);
        assert_eq!(m.score(b'a', b'A'), 1);
        assert_eq!(m.score(b'A', b'C'), -3);
        // Ambiguity codes never match, not even themselves.
        assert_eq!(m.score(b'N', b'N'), -3);
        // Unknown bytes get a defined score.
        assert_eq!(m.score(0, 255), -3);
        assert!(m.is_symmetric());
    }

    #[test]
    fn blosum62_scores() {
        let m = ScoringMatrix::blosum62();
        assert_eq!(m.score(b'A', b'A'), 4);
        assert_eq!(m.score(b'W', b'W'), 11);
        assert_eq!(m.score(b'C', b'C'), 9);
        assert_eq!(m.score(b'A', b'R'), -1);
        assert_eq!(m.score(b'w', b'W'), 11);
        assert_eq!(m.score(b'#', b'A'), BLOSUM62_DEFAULT_SCORE);
        assert!(m.is_symmetric());
        // Built once.
        assert!(Arc::ptr_eq(&m, &ScoringMatrix::blosum62()));
    }

    #[test]
    fn check_alphabet() {
        assert_eq!(MatrixKind::Nucleotide.check_sequence(b"ACGTNacgtn"), None);
        assert_eq!(MatrixKind::Nucleotide.check_sequence(b"ACGU"), Some(3));
        assert_eq!(MatrixKind::Blosum62.check_sequence(b"MKVLW"), None);
        assert_eq!(MatrixKind::Blosum62.check_sequence(b"MK*"), Some(2));
    }
}
