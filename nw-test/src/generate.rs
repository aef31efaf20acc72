use clap::{Parser, ValueEnum};
use itertools::Itertools;
use nw_types::*;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorModel {
    /// Random substitutions, insertions and deletions.
    #[default]
    Uniform,
    /// Make a single gap (insertion or deletion) of size e*n.
    Gap,
    /// Delete a region of size e*n and insert it elsewhere.
    Move,
}

#[derive(Parser, Clone, Debug)]
#[clap(next_help_heading = "Generated input")]
pub struct GenerateArgs {
    /// The number of sequence pairs to generate
    #[clap(short = 'x', long, default_value_t = 1, display_order = 2)]
    pub cnt: usize,

    /// Length of generated sequences
    #[clap(short = 'n', long, display_order = 3, requires = "error_rate")]
    pub length: Option<usize>,

    /// Induced error rate
    #[clap(short, long, display_order = 4)]
    pub error_rate: Option<f32>,

    #[clap(
        long,
        value_enum,
        default_value_t,
        value_name = "MODEL",
        hide_short_help = true
    )]
    pub error_model: ErrorModel,

    /// Seed to initialize RNG for reproducability
    #[clap(long)]
    pub seed: Option<u64>,
}

impl GenerateArgs {
    /// `None` when no length was given.
    pub fn to_generate_options(&self, alphabet: &'static [u8]) -> Option<GenerateOptions> {
        Some(GenerateOptions {
            length: self.length?,
            error_rate: self.error_rate.unwrap_or(0.0),
            error_model: self.error_model,
            alphabet,
        })
    }
}

#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub length: usize,
    pub error_rate: f32,
    pub error_model: ErrorModel,
    /// Residues to draw from.
    pub alphabet: &'static [u8],
}

/// The four unambiguous bases.
pub const DNA: &[u8] = b"ACGT";

/// The twenty standard amino acids.
pub const PROTEIN: &[u8] = b"ARNDCQEGHILKMFPSTWYV";

/// The residues to generate for sequences scored with `kind`.
pub fn alphabet_for(kind: MatrixKind) -> &'static [u8] {
    match kind {
        MatrixKind::Nucleotide => DNA,
        MatrixKind::Blosum62 => PROTEIN,
    }
}

enum Mutation {
    // Replace char at pos.
    Substitution(usize, u8),
    // Insert char before pos.
    Insertion(usize, u8),
    // Delete char at pos.
    Deletion(usize),
}

fn rand_char(alphabet: &[u8], rng: &mut impl Rng) -> u8 {
    alphabet[rng.gen_range(0..alphabet.len())]
}

fn random_mutation(len_b: usize, alphabet: &[u8], rng: &mut impl Rng) -> Mutation {
    // Substitution / insertion / deletion all with equal probability.
    // For length 0 sequences, only generate insertions.
    match if len_b == 0 {
        1
    } else {
        rng.gen_range(0..3usize)
    } {
        0 => Mutation::Substitution(rng.gen_range(0..len_b), rand_char(alphabet, rng)),
        1 => Mutation::Insertion(rng.gen_range(0..len_b + 1), rand_char(alphabet, rng)),
        2 => Mutation::Deletion(rng.gen_range(0..len_b)),
        _ => unreachable!(),
    }
}

pub fn random_sequence(n: usize, alphabet: &[u8], rng: &mut impl Rng) -> Sequence {
    (0..n).map(|_| rand_char(alphabet, rng)).collect_vec()
}

/// A random sequence and a mutated copy of it.
///
/// `Gap` and `Move` are capped at the sequence length, so high error rates
/// can produce an empty second sequence.
pub fn generate_pair(opt: &GenerateOptions, rng: &mut impl Rng) -> (Sequence, Sequence) {
    let a = random_sequence(opt.length, opt.alphabet, rng);
    let num_mutations = (opt.error_rate * opt.length as f32).ceil() as usize;
    let mut b = a.clone();
    match opt.error_model {
        ErrorModel::Uniform => {
            for _ in 0..num_mutations {
                match random_mutation(b.len(), opt.alphabet, rng) {
                    Mutation::Substitution(i, c) => b[i] = c,
                    Mutation::Insertion(i, c) => b.insert(i, c),
                    Mutation::Deletion(i) => {
                        b.remove(i);
                    }
                }
            }
        }
        ErrorModel::Gap => {
            if rng.gen_bool(0.5) {
                // deletion
                let len = num_mutations.min(b.len());
                let start = rng.gen_range(0..=b.len() - len);
                b.drain(start..start + len);
            } else {
                // insertion
                let start = rng.gen_range(0..=b.len());
                let text = random_sequence(num_mutations, opt.alphabet, rng);
                b.splice(start..start, text);
            }
        }
        ErrorModel::Move => {
            let len = num_mutations.min(b.len());
            let start = rng.gen_range(0..=b.len() - len);
            let piece = b.drain(start..start + len).collect_vec();
            let start = rng.gen_range(0..=b.len());
            b.splice(start..start, piece);
        }
    }
    (a, b)
}

/// Deterministic pair: seeded `ChaCha8Rng` over DNA with uniform errors.
pub fn generate_model(
    n: usize,
    e: f32,
    error_model: ErrorModel,
    seed: u64,
) -> (Sequence, Sequence) {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    generate_pair(
        &GenerateOptions {
            length: n,
            error_rate: e,
            error_model,
            alphabet: DNA,
        },
        &mut rng,
    )
}

pub fn setup_sequences(n: usize, e: f32) -> (Sequence, Sequence) {
    generate_model(n, e, ErrorModel::Uniform, 31415)
}
