//! Global pairwise alignment with affine gap penalties.
//!
//! `Aligner` owns the parameters of one pair of sequences. `run()` fills the
//! three-state DP of a `TransitionRule` row by row, stores one backtrace byte
//! per cell, and walks it back into a `Transcript`.
//!
//! ```
//! use nw_align::*;
//! use nw_types::*;
//!
//! let mut aligner = Aligner::new(b"ACGTTACG", b"ACGTACG", MatrixKind::Nucleotide).unwrap();
//! let score = aligner.run().unwrap();
//! assert_eq!(score, 7 + DEFAULT_GAP_OPEN + DEFAULT_GAP_EXTEND);
//! assert_eq!(aligner.transcript().unwrap().to_string(), "MMMDMMMM");
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod error;
pub mod format;
mod nw;
pub mod pattern;
pub mod progress;
pub mod rule;
pub mod seq_align;
mod trace;


pub use error::AlignError;
pub use format::{
    apply_transcript, GappedPair, TextAlignment, TextLayout, DEFAULT_LINE_WIDTH, GAP,
};
pub use pattern::{Guide, PatternError};
pub use progress::{Progress, ProgressCallback};
pub use rule::{AffineRule, GapScores, TransitionRule};
pub use seq_align::{AlignKind, DenseSegment, SeqAlign};

use instant::Instant;
use log::{debug, trace, warn};
use nw_types::*;
use std::{ops::ControlFlow, sync::Arc, time::Duration};

/// Largest DP table `run()` accepts by default.
pub const DEFAULT_MAX_CELLS: u64 = u32::MAX as u64;

/// Outcome of the last `run()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    NotRun,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Clone, Debug)]
struct Alignment {
    score: Score,
    transcript: Transcript,
}

/// Aligner for one fixed pair of sequences.
///
/// Setters only change the parameters of the next `run()`. The score and
/// transcript of a completed run stay available until the next `run()`.
pub struct Aligner<'a> {
    a: Seq<'a>,
    b: Seq<'a>,
    kind: MatrixKind,
    /// Replaces the built-in matrix of `kind` when set.
    matrix: Option<Arc<ScoringMatrix>>,
    penalties: Penalties,
    esf: EndSpaceFree,
    ids: [String; 2],
    max_cells: u64,
    /// Guide hits; only the regions between them are aligned.
    pattern: Vec<Guide>,
    progress: Option<ProgressCallback<'a>>,
    status: Status,
    alignment: Option<Alignment>,
}

impl<'a> std::fmt::Debug for Aligner<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aligner")
            .field("len1", &self.a.len())
            .field("len2", &self.b.len())
            .field("kind", &self.kind)
            .field("custom_matrix", &self.matrix.is_some())
            .field("penalties", &self.penalties)
            .field("esf", &self.esf)
            .field("ids", &self.ids)
            .field("max_cells", &self.max_cells)
            .field("guides", &self.pattern.len())
            .field("status", &self.status)
            .finish()
    }
}

/// Polls the callback, if any. `true` means cancel.
fn poll(progress: &mut Option<ProgressCallback<'_>>, p: Progress) -> bool {
    trace!("progress {}/{}", p.done, p.total);
    match progress.as_mut() {
        Some(callback) => callback(p),
        None => false,
    }
}

impl<'a> Aligner<'a> {
    /// Binds the two sequences. Fails when either is empty.
    ///
    /// Residues are not checked: bytes outside the alphabet of `kind` get the
    /// default score of the matrix. See `new_verified`.
    pub fn new(a: Seq<'a>, b: Seq<'a>, kind: MatrixKind) -> Result<Self, AlignError> {
        if a.is_empty() {
            return Err(AlignError::EmptySequence { seq: 1 });
        }
        if b.is_empty() {
            return Err(AlignError::EmptySequence { seq: 2 });
        }
        Ok(Self {
            a,
            b,
            kind,
            matrix: None,
            penalties: Penalties::default(),
            esf: EndSpaceFree::none(),
            ids: ["seq1".into(), "seq2".into()],
            max_cells: DEFAULT_MAX_CELLS,
            pattern: vec![],
            progress: None,
            status: Status::NotRun,
            alignment: None,
        })
    }

    /// As `new`, but also rejects residues outside the alphabet of `kind`.
    /// Lowercase residues are accepted.
    pub fn new_verified(a: Seq<'a>, b: Seq<'a>, kind: MatrixKind) -> Result<Self, AlignError> {
        let aligner = Self::new(a, b, kind)?;
        for (seq, s) in [(1, a), (2, b)] {
            if let Some(pos) = kind.check_sequence(s) {
                return Err(AlignError::InvalidResidue {
                    seq,
                    pos,
                    residue: s[pos] as char,
                });
            }
        }
        Ok(aligner)
    }

    /// Uses `matrix` for substitutions. Match and mismatch scores are ignored.
    pub fn with_matrix(
        a: Seq<'a>,
        b: Seq<'a>,
        matrix: Arc<ScoringMatrix>,
    ) -> Result<Self, AlignError> {
        let mut aligner = Self::new(a, b, MatrixKind::default())?;
        aligner.matrix = Some(matrix);
        Ok(aligner)
    }

    pub fn set_match_score(&mut self, score: Score) {
        self.penalties.match_score = score;
    }

    pub fn set_mismatch_score(&mut self, score: Score) {
        self.penalties.mismatch = score;
    }

    pub fn set_gap_open(&mut self, score: Score) {
        self.penalties.gap_open = score;
    }

    pub fn set_gap_extend(&mut self, score: Score) {
        self.penalties.gap_extend = score;
    }

    pub fn set_penalties(&mut self, penalties: Penalties) {
        self.penalties = penalties;
    }

    /// Free gaps at both ends of both sequences, or none at all.
    pub fn set_end_space_free(&mut self, free: bool) {
        self.esf = EndSpaceFree::uniform(free);
    }

    pub fn set_end_space_free_ends(&mut self, esf: EndSpaceFree) {
        self.esf = esf;
    }

    /// Names used by the FASTA layout and in `SeqAlign`.
    pub fn set_seq_ids(&mut self, id1: impl Into<String>, id2: impl Into<String>) {
        self.ids = [id1.into(), id2.into()];
    }

    pub fn set_max_cells(&mut self, max_cells: u64) {
        self.max_cells = max_cells;
    }

    /// Pins the alignment to gapless hits given as flat
    /// `(start1, end1, start2, end2)` quadruples with inclusive, 0-based ends.
    ///
    /// Hits must be sorted, disjoint and of equal length on both sequences.
    /// An empty slice removes the pattern. On error the previous pattern is kept.
    pub fn set_pattern(&mut self, coords: &[usize]) -> Result<(), AlignError> {
        self.pattern = pattern::parse_pattern(coords, self.a.len(), self.b.len())?;
        Ok(())
    }

    pub fn pattern(&self) -> &[Guide] {
        &self.pattern
    }

    /// `callback` is polled before the fill and after every DP row. Returning
    /// `true` makes `run()` stop with `AlignError::Cancelled`.
    pub fn set_progress_callback(&mut self, callback: impl FnMut(Progress) -> bool + 'a) {
        self.progress = Some(Box::new(callback));
    }

    pub fn clear_progress_callback(&mut self) {
        self.progress = None;
    }

    pub fn seqs(&self) -> (Seq<'a>, Seq<'a>) {
        (self.a, self.b)
    }

    pub fn penalties(&self) -> &Penalties {
        &self.penalties
    }

    pub fn end_space_free(&self) -> EndSpaceFree {
        self.esf
    }

    pub fn ids(&self) -> [&str; 2] {
        [&self.ids[0], &self.ids[1]]
    }

    /// The substitution matrix the next `run()` uses.
    pub fn matrix(&self) -> Arc<ScoringMatrix> {
        match &self.matrix {
            Some(matrix) => matrix.clone(),
            None => ScoringMatrix::for_kind(
                self.kind,
                self.penalties.match_score,
                self.penalties.mismatch,
            ),
        }
    }

    /// Aligns the sequences with the current parameters and returns the optimal score.
    ///
    /// With a pattern, the score is that of the best alignment through all hits.
    pub fn run(&mut self) -> Result<Score, AlignError> {
        if !self.pattern.is_empty() {
            let result = self.run_guided();
            return self.finish(result);
        }
        let matrix = self.matrix();
        let rule = AffineRule::new(self.a, self.b, &matrix, &self.penalties, self.esf);
        self.run_with_rule(&rule)
    }

    /// Aligns the sequences using `rule` for every transition.
    ///
    /// The rule must have the dimensions of the bound sequences. The pattern
    /// is not used.
    pub fn run_with_rule<R: TransitionRule>(&mut self, rule: &R) -> Result<Score, AlignError> {
        let (len1, len2) = (self.a.len(), self.b.len());
        assert_eq!(
            rule.dims(),
            (len1, len2),
            "Transition rule does not match the sequences"
        );
        self.alignment = None;
        self.status = Status::Failed;

        let total = nw::num_cells(len1, len2);
        debug!("Aligning {len1} x {len2} ({total} cells)");
        let result = self.start(total).and_then(|()| {
            let (a, b) = (self.a, self.b);
            self.align_region(rule, a, b, 0, total)
        });
        self.finish(result)
    }

    /// Aligns every region left open by the pattern and stitches the hits in between.
    fn run_guided(&mut self) -> Result<(Score, Transcript), AlignError> {
        self.alignment = None;
        self.status = Status::Failed;

        let (a, b) = (self.a, self.b);
        let regions = pattern::regions(&self.pattern, a.len(), b.len(), self.esf);
        let total: u64 = regions.iter().map(|r| r.cells()).sum();
        debug!(
            "Aligning {} x {} through {} guides ({total} cells)",
            a.len(),
            b.len(),
            self.pattern.len()
        );
        for r in &regions {
            if r.cells() > self.max_cells {
                let e = AlignError::TooLarge {
                    len1: r.seq1.len(),
                    len2: r.seq2.len(),
                    cells: r.cells(),
                    limit: self.max_cells,
                };
                warn!("{e}");
                return Err(e);
            }
        }
        self.start(total)?;

        let matrix = self.matrix();
        let mut transcript = Transcript::with_capacity(a.len() + b.len());
        let mut done = 0;
        for (k, r) in regions.iter().enumerate() {
            let (ra, rb) = (&a[r.seq1.clone()], &b[r.seq2.clone()]);
            let rule = AffineRule::new(ra, rb, &matrix, &self.penalties, r.esf);
            let (_, part) = self.align_region(&rule, ra, rb, done, total)?;
            transcript.extend(part.iter().copied());
            done += r.cells();
            if let Some(g) = self.pattern.get(k) {
                transcript.extend(
                    (0..g.columns()).map(|x| EditOp::diagonal(a[g.start1 + x], b[g.start2 + x])),
                );
            }
        }
        let score = transcript.score(a, b, &matrix, &self.penalties, self.esf);
        Ok((score, transcript))
    }

    /// The initial poll, before anything is allocated.
    fn start(&mut self, total: u64) -> Result<(), AlignError> {
        if poll(&mut self.progress, Progress { done: 0, total }) {
            warn!("Alignment cancelled before the start");
            return Err(AlignError::Cancelled);
        }
        Ok(())
    }

    /// Fills and traces back one DP of `rule` over `a` and `b`. `offset` of
    /// the `total` cells were done before.
    fn align_region<R: TransitionRule>(
        &mut self,
        rule: &R,
        a: Seq,
        b: Seq,
        offset: u64,
        total: u64,
    ) -> Result<(Score, Transcript), AlignError> {
        let start = Instant::now();
        let mut trace = nw::allocate_trace(a.len(), b.len(), self.max_cells).map_err(|e| {
            warn!("{e}");
            e
        })?;

        let progress = &mut self.progress;
        let mut filled = offset;
        let score = nw::fill(rule, Some(&mut trace), |done| {
            filled = offset + done;
            if poll(progress, Progress { done: filled, total }) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        let Some(score) = score else {
            warn!("Alignment cancelled after {filled} of {total} cells");
            return Err(AlignError::Cancelled);
        };

        let transcript = trace.traceback(a, b);
        debug!(
            "Region {} x {}: score {score}, {} columns in {:.3}s",
            a.len(),
            b.len(),
            transcript.len(),
            start.elapsed().as_secs_f32()
        );
        Ok((score, transcript))
    }

    /// Records the outcome of a run.
    fn finish(
        &mut self,
        result: Result<(Score, Transcript), AlignError>,
    ) -> Result<Score, AlignError> {
        match result {
            Ok((score, transcript)) => {
                self.status = Status::Completed;
                self.alignment = Some(Alignment { score, transcript });
                Ok(score)
            }
            Err(e) => {
                if e == AlignError::Cancelled {
                    self.status = Status::Cancelled;
                }
                Err(e)
            }
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Score of the last completed run.
    pub fn score(&self) -> Option<Score> {
        self.alignment.as_ref().map(|a| a.score)
    }

    /// Transcript of the last completed run.
    pub fn transcript(&self) -> Option<&Transcript> {
        self.alignment.as_ref().map(|a| &a.transcript)
    }

    fn completed(&self) -> Result<&Alignment, AlignError> {
        self.alignment.as_ref().ok_or(AlignError::NotAligned)
    }

    /// Both rows of the last alignment, with `-` for gaps.
    pub fn apply_transcript(&self) -> Result<GappedPair, AlignError> {
        apply_transcript(&self.completed()?.transcript, self.a, self.b)
    }

    /// Renders the last alignment. `line_width` must be positive;
    /// `DEFAULT_LINE_WIDTH` is the usual choice.
    pub fn format_as_text(
        &self,
        layout: TextLayout,
        line_width: usize,
    ) -> Result<String, AlignError> {
        let alignment = self.completed()?;
        let pair = apply_transcript(&alignment.transcript, self.a, self.b)?;
        let text =
            TextAlignment::new(&pair, &alignment.transcript, self.ids(), layout, line_width)?;
        Ok(text.to_string())
    }

    pub fn format_as_seq_align(&self) -> Result<SeqAlign, AlignError> {
        let alignment = self.completed()?;
        Ok(SeqAlign::new(
            &alignment.transcript,
            alignment.score,
            self.ids.clone(),
        ))
    }

    /// Rescores the last transcript with the current parameters.
    pub fn score_by_transcript(&self) -> Result<Score, AlignError> {
        let alignment = self.completed()?;
        Ok(alignment
            .transcript
            .score(self.a, self.b, &self.matrix(), &self.penalties, self.esf))
    }

    /// Extrapolated wall time of `run()` for the current parameters.
    ///
    /// Fills the score rows without backtrace for at most about `budget` and
    /// scales the elapsed time by the fraction of cells done.
    pub fn estimate_running_time(&self, budget: Duration) -> Duration {
        let matrix = self.matrix();
        let rule = AffineRule::new(self.a, self.b, &matrix, &self.penalties, self.esf);
        let total = nw::num_cells(self.a.len(), self.b.len());
        let start = Instant::now();
        let mut filled = 0;
        let finished = nw::fill(&rule, None, |done| {
            filled = done;
            if start.elapsed() >= budget {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        let elapsed = start.elapsed();
        let estimate = if finished.is_some() {
            elapsed
        } else {
            elapsed.mul_f64(total as f64 / filled as f64)
        };
        debug!(
            "Estimated {:.3}s from {filled} of {total} cells",
            estimate.as_secs_f32()
        );
        estimate
    }
}
