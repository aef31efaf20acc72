use bio::io::fasta;
use clap::{value_parser, Parser};
use itertools::Itertools;
use nw_align::{cli::AlignerArgs, TextLayout, DEFAULT_LINE_WIDTH};
use nw_test::GenerateArgs;
use nw_types::Seq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    ops::ControlFlow,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unknown file extension of {0:?}; must be in {{seq,txt,fna,fa,fasta}}")]
    UnknownExtension(PathBuf),
    #[error("{path:?}, line {line}: expected a line starting with {expected:?}")]
    SeqPrefix {
        path: PathBuf,
        line: usize,
        expected: char,
    },
    #[error("either -i/--input or -n/--length is required")]
    NoInput,
}

/// Globally align pairs of sequences with affine gap penalties.
#[derive(Parser, Debug)]
#[clap(author, about, disable_version_flag(true))]
// Override some generator flags
#[clap(mut_arg("seed", |a| a.hide_short_help(true)))]
#[clap(mut_arg("cnt", |a| a.hide_short_help(true)))]
#[clap(group(
    clap::ArgGroup::new("input_type")
        .required(true)
        .args(&["input", "length"]),
))]
pub struct Cli {
    /// A .seq, .txt, or Fasta file, or a directory of them, with sequence pairs to align.
    #[clap(short, long, value_parser = value_parser!(PathBuf), display_order = 1)]
    pub input: Option<PathBuf>,

    /// Write a .csv of `{score},{transcript}` lines
    #[clap(short, long, value_parser = value_parser!(PathBuf), display_order = 1)]
    pub output: Option<PathBuf>,

    /// How to print each alignment.
    #[clap(long, value_enum, default_value_t, display_order = 5)]
    pub layout: TextLayout,

    /// Columns per line of printed alignments.
    #[clap(long, default_value_t = DEFAULT_LINE_WIDTH, display_order = 5)]
    pub line_width: usize,

    /// Print one JSON alignment record per pair instead of text.
    #[clap(long, display_order = 5)]
    pub json: bool,

    /// Only print the summary.
    #[clap(short, long)]
    pub silent: bool,

    #[clap(flatten)]
    pub aligner: AlignerArgs,

    /// Options to generate an input pair.
    #[clap(flatten)]
    pub generate: GenerateArgs,
}

fn read_pairs_from_lines(
    path: &Path,
    seq_format: bool,
    run_pair: &mut impl FnMut(Seq, Seq) -> ControlFlow<()>,
) -> Result<ControlFlow<()>, InputError> {
    let lines: Vec<Vec<u8>> = BufReader::new(File::open(path)?)
        .lines()
        .map_ok(String::into_bytes)
        .collect::<Result<_, _>>()?;
    for (idx, (mut a, mut b)) in lines.into_iter().tuples().enumerate() {
        if seq_format {
            for (line, s, expected) in [(2 * idx, &mut a, '>'), (2 * idx + 1, &mut b, '<')] {
                if s.first() != Some(&(expected as u8)) {
                    return Err(InputError::SeqPrefix {
                        path: path.to_path_buf(),
                        line: line + 1,
                        expected,
                    });
                }
                s.remove(0);
            }
        }
        if run_pair(&a, &b).is_break() {
            return Ok(ControlFlow::Break(()));
        }
    }
    Ok(ControlFlow::Continue(()))
}

fn read_pairs_from_fasta(
    path: &Path,
    run_pair: &mut impl FnMut(Seq, Seq) -> ControlFlow<()>,
) -> Result<ControlFlow<()>, InputError> {
    let reader = fasta::Reader::new(BufReader::new(File::open(path)?));
    for (a, b) in reader.records().tuples() {
        let (a, b) = (a?, b?);
        if run_pair(a.seq(), b.seq()).is_break() {
            return Ok(ControlFlow::Break(()));
        }
    }
    Ok(ControlFlow::Continue(()))
}

impl Cli {
    /// Call the given function for each pair in the input.
    pub fn process_input_pairs(
        &self,
        mut run_pair: impl FnMut(Seq, Seq) -> ControlFlow<()>,
    ) -> Result<(), InputError> {
        if let Some(input) = &self.input {
            // Parse file
            let files = if input.is_file() {
                vec![input.clone()]
            } else {
                let mut files = input
                    .read_dir()?
                    .map_ok(|x| x.path())
                    .collect::<Result<Vec<_>, _>>()?;
                files.sort();
                files
            };

            for f in files {
                let ext = f.extension().and_then(|e| e.to_str());
                let flow = match ext {
                    Some(ext @ ("seq" | "txt")) => {
                        read_pairs_from_lines(&f, ext == "seq", &mut run_pair)?
                    }
                    Some("fna" | "fa" | "fasta") => read_pairs_from_fasta(&f, &mut run_pair)?,
                    _ => return Err(InputError::UnknownExtension(f)),
                };
                if flow.is_break() {
                    break;
                }
            }
        } else {
            // Generate random input.
            let options = self
                .generate
                .to_generate_options(nw_test::alphabet_for(self.aligner.matrix))
                .ok_or(InputError::NoInput)?;
            let seed = self.generate.seed.unwrap_or_else(|| {
                let seed = ChaCha8Rng::from_entropy().gen_range(0..1_000);
                eprintln!("Seed: {seed}");
                seed
            });
            let rng = &mut ChaCha8Rng::seed_from_u64(seed);
            for _ in 0..self.generate.cnt {
                let (a, b) = nw_test::generate_pair(&options, rng);
                if run_pair(&a, &b).is_break() {
                    break;
                }
            }
        }
        Ok(())
    }
}
