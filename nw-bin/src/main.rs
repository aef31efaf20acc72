use clap::Parser;
use itertools::Itertools;
use log::{info, warn};
use nw_bin::Cli;
use nw_types::*;
use std::{error::Error, ops::ControlFlow, time::Instant};

/// Aligns one pair and renders it as requested.
fn align_pair(args: &Cli, a: Seq, b: Seq) -> Result<(Score, String, String), Box<dyn Error>> {
    let mut aligner = args.aligner.build(a, b)?;
    let score = aligner.run()?;
    let out = if args.json {
        serde_json::to_string(&aligner.format_as_seq_align()?)?
    } else {
        aligner.format_as_text(args.layout, args.line_width)?
    };
    let transcript = aligner.transcript().map(|t| t.to_string());
    Ok((score, out, transcript.unwrap_or_default()))
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Cli::parse();

    let start = Instant::now();
    let mut pairs = 0;
    let mut failed = 0;
    let mut cells = 0u64;
    let mut total_score = 0i64;
    let mut csv = vec![];

    // Process the input.
    args.process_input_pairs(|a: Seq, b: Seq| {
        let (len1, len2) = (a.len(), b.len());
        match align_pair(&args, a, b) {
            Ok((score, out, transcript)) => {
                if !args.silent {
                    println!("{out}");
                }
                pairs += 1;
                cells += (len1 as u64 + 1) * (len2 as u64 + 1);
                total_score += score as i64;
                if args.output.is_some() {
                    csv.push(format!("{score},{transcript}"));
                }
            }
            Err(e) => {
                warn!("Pair {} ({len1} x {len2}): {e}", pairs + failed);
                failed += 1;
            }
        }
        ControlFlow::Continue(())
    })?;

    info!(
        "Aligned {pairs} pairs ({failed} failed), {cells} cells, total score {total_score} in {:.3}s",
        start.elapsed().as_secs_f32()
    );

    if let Some(output) = &args.output {
        std::fs::write(output, csv.iter().map(|l| format!("{l}\n")).join(""))?;
    }
    Ok(())
}
