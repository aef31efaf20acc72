//! Guide hits that pin parts of the alignment.
//!
//! A pattern is a list of gapless hits, each aligning `seq1[start1..=end1]`
//! to `seq2[start2..=end2]`. Only the regions between consecutive hits are
//! aligned by the DP; the hits themselves become diagonal columns.
use nw_types::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern has {len} coordinates, expected a multiple of four")]
    NotQuadruples { len: usize },
    #[error("guide {guide}: hits must be on the plus strand")]
    MinusStrand { guide: usize },
    #[error("guide {guide}: hits must be sorted and disjoint")]
    Unsorted { guide: usize },
    #[error("guide {guide}: hit lengths differ between the sequences")]
    UnequalLengths { guide: usize },
    #[error("guide {guide}: hit is out of range")]
    OutOfRange { guide: usize },
}

/// A gapless hit with inclusive coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guide {
    pub start1: usize,
    pub end1: usize,
    pub start2: usize,
    pub end2: usize,
}

impl Guide {
    /// Number of aligned columns of the hit.
    pub fn columns(&self) -> usize {
        self.end1 - self.start1 + 1
    }
}

/// Parses flat `(start1, end1, start2, end2)` quadruples and checks them
/// against the sequence lengths.
pub fn parse_pattern(
    coords: &[usize],
    len1: usize,
    len2: usize,
) -> Result<Vec<Guide>, PatternError> {
    if coords.len() % 4 != 0 {
        return Err(PatternError::NotQuadruples { len: coords.len() });
    }
    let mut guides: Vec<Guide> = Vec::with_capacity(coords.len() / 4);
    for (idx, c) in coords.chunks_exact(4).enumerate() {
        let g = Guide {
            start1: c[0],
            end1: c[1],
            start2: c[2],
            end2: c[3],
        };
        if g.start1 > g.end1 || g.start2 > g.end2 {
            return Err(PatternError::MinusStrand { guide: idx });
        }
        if let Some(prev) = guides.last() {
            if g.start1 <= prev.end1 || g.start2 <= prev.end2 {
                return Err(PatternError::Unsorted { guide: idx });
            }
        }
        if g.end1 - g.start1 != g.end2 - g.start2 {
            return Err(PatternError::UnequalLengths { guide: idx });
        }
        if g.end1 >= len1 || g.end2 >= len2 {
            return Err(PatternError::OutOfRange { guide: idx });
        }
        guides.push(g);
    }
    Ok(guides)
}

/// A part of the DP between two hits, or between a hit and an end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Region {
    pub seq1: Range<usize>,
    pub seq2: Range<usize>,
    pub esf: EndSpaceFree,
}

impl Region {
    pub fn cells(&self) -> u64 {
        (self.seq1.len() as u64 + 1) * (self.seq2.len() as u64 + 1)
    }
}

/// The `guides.len() + 1` regions left open by `guides`.
///
/// Only the first region keeps the leading free ends and only the last one
/// the trailing free ends.
pub(crate) fn regions(
    guides: &[Guide],
    len1: usize,
    len2: usize,
    esf: EndSpaceFree,
) -> Vec<Region> {
    let n = guides.len();
    let mut regions = Vec::with_capacity(n + 1);
    let (mut i, mut j) = (0, 0);
    for k in 0..=n {
        let (end1, end2) = match guides.get(k) {
            Some(g) => (g.start1, g.start2),
            None => (len1, len2),
        };
        regions.push(Region {
            seq1: i..end1,
            seq2: j..end2,
            esf: EndSpaceFree::new(
                k == 0 && esf.left1,
                k == n && esf.right1,
                k == 0 && esf.left2,
                k == n && esf.right2,
            ),
        });
        if let Some(g) = guides.get(k) {
            (i, j) = (g.end1 + 1, g.end2 + 1);
        }
    }
    regions
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validation() {
        assert_eq!(parse_pattern(&[], 8, 8), Ok(vec![]));
        assert_eq!(
            parse_pattern(&[0, 3, 4, 7], 8, 8),
            Ok(vec![Guide {
                start1: 0,
                end1: 3,
                start2: 4,
                end2: 7
            }])
        );
        assert_eq!(
            parse_pattern(&[1, 2, 3], 8, 8),
            Err(PatternError::NotQuadruples { len: 3 })
        );
        assert_eq!(
            parse_pattern(&[3, 1, 1, 3], 8, 8),
            Err(PatternError::MinusStrand { guide: 0 })
        );
        assert_eq!(
            parse_pattern(&[0, 1, 0, 1, 1, 2, 2, 3], 8, 8),
            Err(PatternError::Unsorted { guide: 1 })
        );
        assert_eq!(
            parse_pattern(&[0, 1, 0, 1, 2, 3, 2, 3, 5, 6, 3, 4], 8, 8),
            Err(PatternError::Unsorted { guide: 2 })
        );
        assert_eq!(
            parse_pattern(&[0, 1, 0, 2], 8, 8),
            Err(PatternError::UnequalLengths { guide: 0 })
        );
        assert_eq!(
            parse_pattern(&[0, 1, 0, 1, 6, 8, 5, 7], 8, 8),
            Err(PatternError::OutOfRange { guide: 1 })
        );
    }

    #[test]
    fn region_layout() {
        let guides = parse_pattern(&[2, 3, 1, 2, 6, 6, 4, 4], 10, 8).unwrap();
        let r = regions(&guides, 10, 8, EndSpaceFree::all());
        assert_eq!(
            r,
            vec![
                Region {
                    seq1: 0..2,
                    seq2: 0..1,
                    esf: EndSpaceFree::new(true, false, true, false)
                },
                Region {
                    seq1: 4..6,
                    seq2: 3..4,
                    esf: EndSpaceFree::none()
                },
                Region {
                    seq1: 7..10,
                    seq2: 5..8,
                    esf: EndSpaceFree::new(false, true, false, true)
                },
            ]
        );
        assert_eq!(r.iter().map(Region::cells).sum::<u64>(), 6 + 6 + 16);

        // A hit touching both ends leaves two empty regions.
        let guides = parse_pattern(&[0, 3, 0, 3], 4, 4).unwrap();
        let r = regions(&guides, 4, 4, EndSpaceFree::none());
        assert_eq!((r[0].seq1.clone(), r[0].seq2.clone()), (0..0, 0..0));
        assert_eq!((r[1].seq1.clone(), r[1].seq2.clone()), (4..4, 4..4));
    }
}
