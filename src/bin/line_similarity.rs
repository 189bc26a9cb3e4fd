use std::path::PathBuf;

use clap::Parser;
use notediff::{
    algorithm::{preprocess::split_lines, CharDiffScoring, LineMatcher, LineScoring, WordOverlapScoring},
    testcase::load_testcases,
};
use regex::Regex;

/// Prints both similarity scores for every line pair the smart matcher finds.
#[derive(Parser)]
struct Args {
    testcase_directory: PathBuf,

    #[arg(short, long, default_value_t = String::from(""))]
    filter: String,

    /// Also print exact matches.
    #[arg(long)]
    exact: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let regex = Regex::new(&args.filter)?;
    let matcher = LineMatcher::smart();
    let word_overlap = WordOverlapScoring::default();

    for testcase in load_testcases(&args.testcase_directory, &regex)? {
        println!("# {}", testcase.name);
        let original = split_lines(&testcase.original);
        let modified = split_lines(&testcase.modified);
        for m in matcher.match_lines(&original, &modified) {
            let (Some(o), Some(n)) = (m.original_index, m.modified_index) else {
                continue;
            };
            if m.similarity >= 1.0 && !args.exact {
                continue;
            }
            let (a, b) = (original[o].content, modified[n].content);
            println!(
                "{:.3} {:.3}\t{}:{a:?}\t{}:{b:?}",
                CharDiffScoring.similarity(a, b),
                word_overlap.similarity(a, b),
                o + 1,
                n + 1,
            );
        }
    }

    Ok(())
}
