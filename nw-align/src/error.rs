use crate::pattern::PatternError;
use nw_types::TranscriptError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignError {
    #[error("sequence {seq} is empty")]
    EmptySequence { seq: u8 },
    #[error(
        "sequence {seq} is inconsistent with the scoring matrix: symbol {residue:?} at {pos}"
    )]
    InvalidResidue { seq: u8, pos: usize, residue: char },
    #[error("alignment of {len1} x {len2} residues needs {cells} cells, the limit is {limit}")]
    TooLarge {
        len1: usize,
        len2: usize,
        cells: u64,
        limit: u64,
    },
    #[error("failed to allocate the backtrace matrix of {cells} cells")]
    Allocation { cells: u64 },
    #[error("alignment cancelled by the progress callback")]
    Cancelled,
    #[error("no completed alignment; call run() first")]
    NotAligned,
    #[error("transcript does not match the sequences: {0}")]
    TranscriptMismatch(#[from] TranscriptError),
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),
    #[error("line width must be positive")]
    InvalidLineWidth,
}
