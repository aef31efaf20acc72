//! Turning a transcript back into gapped sequences and text.
use crate::error::AlignError;
use nw_types::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for the residue missing on the gapped side of a column.
pub const GAP: u8 = b'-';

/// Default number of columns per line of text output.
pub const DEFAULT_LINE_WIDTH: usize = 100;

/// The two rows of an alignment, of equal length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GappedPair {
    pub seq1: Sequence,
    pub seq2: Sequence,
}

impl GappedPair {
    pub fn len(&self) -> usize {
        self.seq1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq1.is_empty()
    }

    /// Row `row` (1 or 2) with the gaps removed.
    pub fn ungapped(&self, row: u8) -> Sequence {
        let s = if row == 1 { &self.seq1 } else { &self.seq2 };
        s.iter().copied().filter(|&c| c != GAP).collect()
    }
}

/// Walks `transcript` forward and emits both rows of the alignment.
///
/// Fails when the transcript runs past the end of a sequence or does not use
/// all of it. Whether `Match`/`Replace` agree with the residues is not checked.
pub fn apply_transcript(
    transcript: &Transcript,
    a: Seq,
    b: Seq,
) -> Result<GappedPair, AlignError> {
    let mut seq1 = Sequence::with_capacity(transcript.len());
    let mut seq2 = Sequence::with_capacity(transcript.len());
    let (mut i, mut j) = (0, 0);
    for (column, &op) in transcript.iter().enumerate() {
        let c1 = if op.consumes_seq1() {
            let c = *a
                .get(i)
                .ok_or(TranscriptError::Overrun { column, op, seq: 1 })?;
            i += 1;
            c
        } else {
            GAP
        };
        let c2 = if op.consumes_seq2() {
            let c = *b
                .get(j)
                .ok_or(TranscriptError::Overrun { column, op, seq: 2 })?;
            j += 1;
            c
        } else {
            GAP
        };
        seq1.push(c1);
        seq2.push(c2);
    }
    if i != a.len() {
        return Err(TranscriptError::Incomplete {
            seq: 1,
            used: i,
            len: a.len(),
        }
        .into());
    }
    if j != b.len() {
        return Err(TranscriptError::Incomplete {
            seq: 2,
            used: j,
            len: b.len(),
        }
        .into());
    }
    Ok(GappedPair { seq1, seq2 })
}

/// Text renderings of an alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum TextLayout {
    /// Blocks of both rows with a `^` under every mismatch.
    #[default]
    Mismatches,
    /// Blocks of both rows with a `|` between identical residues.
    Pipes,
    /// Both gapped rows as FASTA records.
    Fasta,
}

/// A formatted alignment; render it with `to_string()`.
pub struct TextAlignment<'a> {
    pub pair: &'a GappedPair,
    pub transcript: &'a Transcript,
    pub ids: [&'a str; 2],
    pub layout: TextLayout,
    pub line_width: usize,
}

impl<'a> TextAlignment<'a> {
    pub fn new(
        pair: &'a GappedPair,
        transcript: &'a Transcript,
        ids: [&'a str; 2],
        layout: TextLayout,
        line_width: usize,
    ) -> Result<Self, AlignError> {
        if line_width == 0 {
            return Err(AlignError::InvalidLineWidth);
        }
        debug_assert_eq!(pair.len(), transcript.len());
        Ok(Self {
            pair,
            transcript,
            ids,
            layout,
            line_width,
        })
    }

    fn write_row(f: &mut fmt::Formatter<'_>, row: &[u8]) -> fmt::Result {
        writeln!(f, "{}", seq_to_string(row))
    }

    /// One line with `marker` under the columns whose op is `op`.
    fn write_marker(
        f: &mut fmt::Formatter<'_>,
        ops: &[EditOp],
        op: EditOp,
        marker: char,
    ) -> fmt::Result {
        let line: String = ops
            .iter()
            .map(|&o| if o == op { marker } else { ' ' })
            .collect();
        writeln!(f, "{line}")
    }

    fn write_blocks(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (mut pos1, mut pos2) = (0, 0);
        let ops = self.transcript.ops();
        for start in (0..self.pair.len()).step_by(self.line_width) {
            let end = (start + self.line_width).min(self.pair.len());
            let (row1, row2) = (&self.pair.seq1[start..end], &self.pair.seq2[start..end]);
            writeln!(f, "{start}\t{pos1}:{pos2}")?;
            match self.layout {
                TextLayout::Mismatches => {
                    Self::write_row(f, row1)?;
                    Self::write_row(f, row2)?;
                    Self::write_marker(f, &ops[start..end], EditOp::Replace, '^')?;
                }
                TextLayout::Pipes => {
                    Self::write_row(f, row1)?;
                    Self::write_marker(f, &ops[start..end], EditOp::Match, '|')?;
                    Self::write_row(f, row2)?;
                    writeln!(f)?;
                }
                TextLayout::Fasta => unreachable!(),
            }
            pos1 += row1.iter().filter(|&&c| c != GAP).count();
            pos2 += row2.iter().filter(|&&c| c != GAP).count();
        }
        Ok(())
    }

    fn write_fasta(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, row) in self.ids.iter().zip([&self.pair.seq1, &self.pair.seq2]) {
            writeln!(f, ">{id}")?;
            for line in row.chunks(self.line_width) {
                Self::write_row(f, line)?;
            }
        }
        Ok(())
    }
}

impl<'a> fmt::Display for TextAlignment<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.layout {
            TextLayout::Mismatches | TextLayout::Pipes => self.write_blocks(f),
            TextLayout::Fasta => self.write_fasta(f),
        }
    }
}
