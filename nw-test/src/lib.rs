//! Test tooling: random inputs and a cross-check against the affine aligner of `rust-bio`.
pub mod generate;

use bio::alignment::pairwise;
use itertools::Itertools;
use nw_types::*;
use rand::{seq::IteratorRandom, thread_rng, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use generate::*;

pub fn test_sequences() -> Vec<(Seq<'static>, Seq<'static>)> {
    vec![
        (b"GATTACA", b"GCATGCU"),
        (b"TTGGGTCAATCAGCCAGTTTTTA", b"TTTGAGTGGGTCATCACCGATTTTAT"),
        (b"ACTGACCAGT", b"CCGACAGGA"),
        (b"AGTTTTAT", b"ACCGATTTTTA"),
        (b"CTCTCTTCTCTCTCTA", b"CCTCTCTCTCTCCTCTC"),
        (b"AGTGGGTTGCCTTCATTCCG", b"AGTGGTGTCTTCAGGCCTTCATTCCG"),
        (b"GCACGTCGCCCCCCGCCCGCG", b"GCCCGCCCGCCCGCCCCCGCCCCC"),
        (b"CGCGTGTATCCGTCCACATCGAGCCGCCCTTGTTGCTTTTCGAGCGCTCATTTCCCGCAAGAGTGGCGTGCGGTCACTTTCGCGCAGCAATTAGAGTACTAACGGGTAGACGTGGCTTTCCTCCTCGTCCTGTCAACGCGCATAGGATGTCCTGCAGCAGGCCGCCGCGATTGCCTAAATCAAGGGGTTCCAATGGAGTTTCCATCTGATATCCGCGCTCCGGTTCTGAGTCTAAAGTGGAAATACTCCGAATGGGCCGGTATGAGGTTGGGTCAATCAGCCAGTTTTTA",
         b"CGCTGGGGATGCCTCCACCTTTCGAGTGCCTGTTGGTTCCGACGCTATCATAGTCCCCATGCAAGGAGATGGCTGCGCGTCCTATCGCGCGGCAAATAGAGTCTACGGGGGCGGCTGTCCTCCTCGTCCTGGTCAACGGCCATAGGATTTCCGCGATGGTCGCCCGGATGTGCCTAAACCAAGGCTCCGATGGAGCTGCCTCTGATATCCGCGCTGCCGGTTTCCTGACGTCTGAAAACGTTGGAAAATACCTCCGAATGGGCCCCGTTTGAGTGGGTCATCACCGATTTTAT"),
    ]
}

const FIXED: bool = false;

/// Environment variable that fixes the seed of `gen_seqs`, to replay a failing run.
pub const SEED_VAR: &str = "NW_TEST_SEED";

pub fn gen_seqs() -> impl Iterator<Item = ((Sequence, Sequence), (usize, f32, ErrorModel, u64))> {
    let seed = std::env::var(SEED_VAR).ok().and_then(|s| s.parse().ok());
    gen_seqs_with_seed(seed)
}

/// The pairs of `gen_seqs` for a given seed. The same seed gives the same pairs.
pub fn gen_seqs_with_seed(
    seed: Option<u64>,
) -> impl Iterator<Item = ((Sequence, Sequence), (usize, f32, ErrorModel, u64))> {
    // Run each test on a new random seed for increased coverage over time.
    let seed = seed.unwrap_or_else(|| {
        if FIXED {
            31415
        } else {
            thread_rng().gen_range(0..u64::MAX)
        }
    });
    let rng = &mut ChaCha8Rng::seed_from_u64(seed);
    let mut ns = vec![
        1usize, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 30, 40, 50, 60,
        70, 80, 90, 100, 128, 200, 255, 256, 257, 300,
    ];
    let mut es = vec![0.0f32, 0.01, 0.05, 0.10, 0.20, 0.30, 0.50, 0.70, 1.0];

    // Pick a random subset of the above. CI runs often enough to get good coverage.
    if !FIXED {
        let nl = ns.len();
        ns = ns.into_iter().choose_multiple(rng, nl / 3);
        let el = es.len();
        es = es.into_iter().choose_multiple(rng, el / 3);
    }

    let models = [ErrorModel::Uniform, ErrorModel::Gap, ErrorModel::Move];
    ns.into_iter()
        .cartesian_product(es)
        .cartesian_product(models)
        .map(move |((n, e), error_model)| {
            let (a, b) = generate_model(n, e, error_model, seed);
            ((a, b), (n, e, error_model, seed))
        })
}

/// Optimal score from `rust-bio`.
///
/// Free end gaps are only supported on sequence 1 (leading and trailing
/// `Insert` runs together), which is `semiglobal` with `b` as the clipped side.
pub fn reference_score(
    a: Seq,
    b: Seq,
    matrix: &ScoringMatrix,
    penalties: &Penalties,
    esf: EndSpaceFree,
) -> Score {
    assert!(
        esf == EndSpaceFree::none() || esf == EndSpaceFree::new(true, true, false, false),
        "reference supports no free ends or free ends of sequence 1 only"
    );
    let score = |x: u8, y: u8| matrix.score(x, y);
    let mut aligner = pairwise::Aligner::with_capacity(
        a.len(),
        b.len(),
        penalties.gap_open,
        penalties.gap_extend,
        score,
    );
    if esf.any() {
        aligner.semiglobal(a, b).score
    } else {
        aligner.global(a, b).score
    }
}

/// Runs `align` on one pair and checks it against the reference:
/// - the score equals `reference_score`,
/// - the transcript, when returned, aligns `a` to `b` and rescoring it gives the same score.
pub fn test_aligner_on_input(
    a: Seq,
    b: Seq,
    matrix: &ScoringMatrix,
    penalties: &Penalties,
    esf: EndSpaceFree,
    align: &mut impl FnMut(Seq, Seq) -> (Score, Option<Transcript>),
    params: &str,
) {
    // Set to true for local debugging.
    const D: bool = false;

    // useful in case of panics inside the alignment code.
    eprintln!("{params}");
    if D {
        eprintln!("a {}\nb {}", seq_to_string(a), seq_to_string(b));
    }
    let score = reference_score(a, b, matrix, penalties, esf);
    let (aligner_score, transcript) = align(a, b);
    assert_eq!(
        score,
        aligner_score,
        "\n{params}\nlet a = \"{}\".as_bytes();\nlet b = \"{}\".as_bytes();\npenalties {penalties:?}",
        seq_to_string(a),
        seq_to_string(b),
    );
    let Some(transcript) = transcript else {
        // Transcript not returned so not checked.
        return;
    };
    assert_eq!(transcript.check(a, b), Ok(()), "{params}\ntranscript {transcript}");
    assert_eq!(
        transcript.score(a, b, matrix, penalties, esf),
        score,
        "{params}\ntranscript {transcript}"
    );
}

/// Tests `align` on the hardcoded pairs and a large set of random pairs:
/// - length 1 to 300
/// - error rate 0.0 to 1.0
/// - error models: uniform, gap, move
///
/// Pairs where generation produced an empty sequence are skipped.
pub fn test_aligner(
    penalties: Penalties,
    esf: EndSpaceFree,
    mut align: impl FnMut(Seq, Seq) -> (Score, Option<Transcript>),
) {
    let matrix = ScoringMatrix::nucleotide(penalties.match_score, penalties.mismatch);
    for (a, b) in test_sequences() {
        test_aligner_on_input(
            a,
            b,
            &matrix,
            &penalties,
            esf,
            &mut align,
            &format!(
                "hardcoded test_sequences: a {:?} b {:?}",
                seq_to_string(a),
                seq_to_string(b)
            ),
        );
    }
    for ((a, b), (n, e, error_model, seed)) in gen_seqs() {
        if a.is_empty() || b.is_empty() {
            continue;
        }
        test_aligner_on_input(
            &a,
            &b,
            &matrix,
            &penalties,
            esf,
            &mut align,
            &format!(
                "seed {seed:>20} n {n:>5} e {e:>.2} error_model {error_model:?} \
                 (replay with {SEED_VAR}={seed})"
            ),
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn replayable_seed() {
        let first = gen_seqs_with_seed(Some(7)).collect_vec();
        assert!(!first.is_empty());
        assert!(first.iter().all(|(_, (_, _, _, seed))| *seed == 7));
        assert_eq!(gen_seqs_with_seed(Some(7)).collect_vec(), first);
    }
}
