//! Structured alignment records: the transcript as a list of dense segments.
use itertools::Itertools;
use nw_types::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignKind {
    Global,
}

/// A maximal run of columns of the same kind: diagonal, gap in sequence 1, or
/// gap in sequence 2. Matches and replacements share a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenseSegment {
    /// 0-based start in each sequence; `None` for the gapped sequence.
    pub starts: [Option<usize>; 2],
    pub len: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqAlign {
    pub kind: AlignKind,
    /// Number of aligned sequences.
    pub dim: usize,
    pub score: Score,
    pub ids: [String; 2],
    pub segments: Vec<DenseSegment>,
}

fn segment_layer(op: EditOp) -> Layer {
    match op {
        EditOp::Match | EditOp::Replace => Layer::Diagonal,
        EditOp::Insert => Layer::GapInSeq1,
        EditOp::Delete => Layer::GapInSeq2,
    }
}

impl SeqAlign {
    pub fn new(transcript: &Transcript, score: Score, ids: [String; 2]) -> Self {
        let (mut pos1, mut pos2) = (0, 0);
        let mut segments = vec![];
        for (layer, run) in &transcript.iter().group_by(|&&op| segment_layer(op)) {
            let len = run.count();
            let starts = match layer {
                Layer::Diagonal => [Some(pos1), Some(pos2)],
                Layer::GapInSeq1 => [None, Some(pos2)],
                Layer::GapInSeq2 => [Some(pos1), None],
            };
            if starts[0].is_some() {
                pos1 += len;
            }
            if starts[1].is_some() {
                pos2 += len;
            }
            segments.push(DenseSegment { starts, len });
        }
        Self {
            kind: AlignKind::Global,
            dim: 2,
            score,
            ids,
            segments,
        }
    }

    /// Number of alignment columns.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn segments() {
        let t: Transcript = "MRMIIDDDM".parse().unwrap();
        let sa = SeqAlign::new(&t, -3, ["a".into(), "b".into()]);
        assert_eq!(sa.dim, 2);
        assert_eq!(sa.len(), 9);
        assert_eq!(
            sa.segments,
            vec![
                DenseSegment {
                    starts: [Some(0), Some(0)],
                    len: 3
                },
                DenseSegment {
                    starts: [None, Some(3)],
                    len: 2
                },
                DenseSegment {
                    starts: [Some(3), None],
                    len: 3
                },
                DenseSegment {
                    starts: [Some(6), Some(5)],
                    len: 1
                },
            ]
        );
    }

    #[test]
    fn serialize() {
        let t: Transcript = "MI".parse().unwrap();
        let sa = SeqAlign::new(&t, -6, ["a".into(), "b".into()]);
        let json = serde_json::to_string(&sa).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"Global","dim":2,"score":-6,"ids":["a","b"],"segments":[{"starts":[0,0],"len":1},{"starts":[null,1],"len":1}]}"#
        );
        assert_eq!(serde_json::from_str::<SeqAlign>(&json).unwrap(), sa);
    }
}
