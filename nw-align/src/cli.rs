use crate::{AlignError, Aligner};
use clap::Parser;
use nw_types::*;
use serde::{Deserialize, Serialize};

/// Scoring parameters of the aligner.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[clap(next_help_heading = "Scoring")]
pub struct AlignerArgs {
    /// Substitution matrix.
    #[clap(long, default_value_t, value_enum, display_order = 10)]
    pub matrix: MatrixKind,

    /// Score of two identical nucleotides.
    #[clap(long = "match", default_value_t = DEFAULT_MATCH, allow_hyphen_values = true)]
    pub match_score: Score,

    /// Score of two different nucleotides.
    #[clap(long, default_value_t = DEFAULT_MISMATCH, allow_hyphen_values = true)]
    pub mismatch: Score,

    /// Paid once per gap.
    #[clap(long, default_value_t = DEFAULT_GAP_OPEN, allow_hyphen_values = true)]
    pub gap_open: Score,

    /// Paid for every gap column, including the first.
    #[clap(long, default_value_t = DEFAULT_GAP_EXTEND, allow_hyphen_values = true)]
    pub gap_extend: Score,

    /// Do not penalize gaps at either end of either sequence.
    #[clap(long)]
    pub end_space_free: bool,

    /// Free leading gaps in sequence 1.
    #[clap(long, hide_short_help = true)]
    pub free_left1: bool,
    /// Free trailing gaps in sequence 1.
    #[clap(long, hide_short_help = true)]
    pub free_right1: bool,
    /// Free leading gaps in sequence 2.
    #[clap(long, hide_short_help = true)]
    pub free_left2: bool,
    /// Free trailing gaps in sequence 2.
    #[clap(long, hide_short_help = true)]
    pub free_right2: bool,

    /// Refuse alignments whose DP table has more cells.
    #[clap(long, default_value_t = crate::DEFAULT_MAX_CELLS)]
    pub max_cells: u64,

    /// Guide hits `start1,end1,start2,end2,...` (0-based, inclusive) the
    /// alignment must pass through.
    #[clap(long, value_delimiter = ',', hide_short_help = true)]
    pub pattern: Vec<usize>,

    /// Reject residues outside the alphabet of the matrix.
    #[clap(long)]
    pub verify: bool,
}

impl Default for AlignerArgs {
    fn default() -> Self {
        Self {
            matrix: MatrixKind::default(),
            match_score: DEFAULT_MATCH,
            mismatch: DEFAULT_MISMATCH,
            gap_open: DEFAULT_GAP_OPEN,
            gap_extend: DEFAULT_GAP_EXTEND,
            end_space_free: false,
            free_left1: false,
            free_right1: false,
            free_left2: false,
            free_right2: false,
            max_cells: crate::DEFAULT_MAX_CELLS,
            pattern: vec![],
            verify: false,
        }
    }
}

impl AlignerArgs {
    pub fn penalties(&self) -> Penalties {
        Penalties::new(self.match_score, self.mismatch, self.gap_open, self.gap_extend)
    }

    /// `--end-space-free` turns on all four ends.
    pub fn end_space_free(&self) -> EndSpaceFree {
        let all = self.end_space_free;
        EndSpaceFree::new(
            all || self.free_left1,
            all || self.free_right1,
            all || self.free_left2,
            all || self.free_right2,
        )
    }

    /// A configured aligner for the pair `(a, b)`.
    pub fn build<'a>(&self, a: Seq<'a>, b: Seq<'a>) -> Result<Aligner<'a>, AlignError> {
        let mut aligner = if self.verify {
            Aligner::new_verified(a, b, self.matrix)?
        } else {
            Aligner::new(a, b, self.matrix)?
        };
        aligner.set_penalties(self.penalties());
        aligner.set_end_space_free_ends(self.end_space_free());
        aligner.set_max_cells(self.max_cells);
        aligner.set_pattern(&self.pattern)?;
        Ok(aligner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::PatternError;

    #[test]
    fn parse() {
        let args = AlignerArgs::parse_from([
            "nw",
            "--match",
            "2",
            "--mismatch",
            "-1",
            "--gap-open",
            "-4",
            "--free-left1",
        ]);
        assert_eq!(args.penalties(), Penalties::new(2, -1, -4, DEFAULT_GAP_EXTEND));
        assert_eq!(
            args.end_space_free(),
            EndSpaceFree::new(true, false, false, false)
        );
        assert_eq!(args.matrix, MatrixKind::Nucleotide);

        let args = AlignerArgs::parse_from(["nw", "--end-space-free", "--matrix", "blosum62"]);
        assert_eq!(args.end_space_free(), EndSpaceFree::all());
        assert_eq!(args.matrix, MatrixKind::Blosum62);

        let args = AlignerArgs::parse_from(["nw", "--pattern", "0,3,4,7"]);
        assert_eq!(args.pattern, vec![0, 3, 4, 7]);
    }

    #[test]
    fn build() {
        let args = AlignerArgs {
            verify: true,
            ..Default::default()
        };
        assert!(args.build(b"ACGT", b"ACGT").is_ok());
        assert!(matches!(
            args.build(b"ACGT", b"ACXT"),
            Err(AlignError::InvalidResidue { seq: 2, pos: 2, .. })
        ));

        let args = AlignerArgs {
            pattern: vec![0, 1, 0, 2],
            ..Default::default()
        };
        assert_eq!(
            args.build(b"ACGT", b"ACGT").unwrap_err(),
            AlignError::InvalidPattern(PatternError::UnequalLengths { guide: 0 })
        );
    }
}
