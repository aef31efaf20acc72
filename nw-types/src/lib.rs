pub mod penalties;
pub mod scoring;
pub mod transcript;

// Re-export types for convenience of `use nw_types::*;`.
pub use penalties::*;
pub use scoring::*;
pub use transcript::*;

/// Alignment scores are maximized. Penalties are negative.
pub type Score = i32;

/// A borrowed sequence.
pub type Seq<'a> = &'a [u8];

/// An owned sequence.
pub type Sequence = Vec<u8>;

/// Score of unreachable states.
///
/// Half of the minimum so that adding a single penalty never overflows.
pub const NEG_INF: Score = Score::MIN / 2;

/// The three states of the affine recurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Ending in a match or replacement.
    Diagonal,
    /// Ending in a gap in sequence 1 (horizontal move, `Insert`).
    GapInSeq1,
    /// Ending in a gap in sequence 2 (vertical move, `Delete`).
    GapInSeq2,
}

/// Human readable version of a sequence.
pub fn seq_to_string(seq: Seq) -> String {
    String::from_utf8_lossy(seq).into_owned()
}
