use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use clap::{Parser, ValueEnum};
use notediff::{
    algorithm::{align::count_pairs, preprocess::split_line_strs, preprocess::split_lines, LineMatcher, Match},
    testcase::load_testcases,
    worker::hash_diff::{diff_lines, WorkerStats},
};
use regex::Regex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmType {
    /// Exact pass and edit-ratio fuzzy pass.
    Smart,
    /// Exact pass and word-overlap fuzzy pass.
    Basic,
    /// The worker's greedy hash diff.
    Hash,
}

#[derive(Parser)]
struct Args {
    testcase_directory: PathBuf,

    #[arg(short, long, default_value_t = String::from(""))]
    filter: String,

    /// Defaults to all of them.
    #[arg(value_enum)]
    algorithms: Vec<AlgorithmType>,

    #[arg(short, long, default_value_t = 1)]
    repeat: u32,
}

fn describe_matches(matches: &[Match]) -> String {
    let (exact, fuzzy) = count_pairs(matches);
    format!("{exact} exact, {fuzzy} fuzzy, {} unmatched", matches.len() - (exact + fuzzy))
}

fn time<T>(repeat: u32, mut run: impl FnMut() -> T) -> (Duration, T) {
    let start = Instant::now();
    let mut result = run();
    for _ in 1..repeat {
        result = run();
    }
    (start.elapsed() / repeat.max(1), result)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let regex = Regex::new(&args.filter)?;
    let algorithms = if args.algorithms.is_empty() {
        AlgorithmType::value_variants().to_vec()
    } else {
        args.algorithms.clone()
    };

    for testcase in load_testcases(&args.testcase_directory, &regex)? {
        let original = split_lines(&testcase.original);
        let modified = split_lines(&testcase.modified);
        println!("{}: {} vs {} lines", testcase.name, original.len(), modified.len());

        for algorithm in &algorithms {
            let (elapsed, summary) = match algorithm {
                AlgorithmType::Smart => {
                    let matcher = LineMatcher::smart();
                    let (elapsed, matches) = time(args.repeat, || matcher.match_lines(&original, &modified));
                    (elapsed, describe_matches(&matches))
                }
                AlgorithmType::Basic => {
                    let matcher = LineMatcher::basic();
                    let (elapsed, matches) = time(args.repeat, || matcher.match_lines(&original, &modified));
                    (elapsed, describe_matches(&matches))
                }
                AlgorithmType::Hash => {
                    let original = split_line_strs(&testcase.original);
                    let modified = split_line_strs(&testcase.modified);
                    let (elapsed, chunks) = time(args.repeat, || diff_lines(&original, &modified));
                    let stats = WorkerStats::new(&chunks, original.len() + modified.len());
                    let summary = format!(
                        "{} unchanged, {} removed, {} added in {} chunks",
                        stats.unchanged, stats.removed, stats.added, stats.chunks
                    );
                    (elapsed, summary)
                }
            };
            println!("  {algorithm:?}: {elapsed:?} ({summary})");
        }
    }

    Ok(())
}
