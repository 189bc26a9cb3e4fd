use anyhow::{bail, Context as _};
use clap::Parser;
use notediff::{
    algorithm::{char_diff::diff_spans, preprocess::split_line_strs, Alignment, LineType},
    config::{default_config_path, Config, ConfigOpt, OutputFormat},
    engine::{DiffEngine, DiffOutput, EngineChoice},
    render::render_document,
    size::SizeEstimate,
    validate::{print_errors, validate_alignment, validate_spans},
    worker::Response,
};
use std::{
    fs,
    io::{stdin, stdout, BufWriter, Write},
    path::PathBuf,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Compares two texts line by line and prints the difference as HTML.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    original: PathBuf,
    modified: PathBuf,
    #[command(flatten)]
    config: ConfigOpt,
    /// Defaults to notediff/config.toml in the user's config directory.
    #[arg(long, value_name = "FILE")]
    config_file: Option<PathBuf>,
    /// Diff only this page of lines (numbered from 0), positionally.
    #[arg(long, value_name = "NUM")]
    page: Option<usize>,
    /// Don't ask before diffing a large input synchronously.
    #[arg(short = 'y', long)]
    yes: bool,
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn confirm_large_input(estimate: &SizeEstimate, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let size = format!("{} chars, about {} lines", estimate.total_chars, estimate.estimated_lines);
    if !atty::is(atty::Stream::Stdin) {
        bail!("The input is large ({size}). Pass --yes to diff it synchronously anyway.");
    }
    eprint!("The input is large ({size}) and diffing it synchronously may take a while. Continue? [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn debug_validate(alignment: &Alignment, original: &str, modified: &str) {
    let mut errors = validate_alignment(&alignment.lines, &split_line_strs(original), &split_line_strs(modified));
    for line in alignment.lines.iter().filter(|line| line.line_type == LineType::Modified) {
        let old = line.original_content.as_deref().unwrap_or("");
        let new = line.modified_content.as_deref().unwrap_or("");
        errors.extend(validate_spans(&diff_spans(old, new), old, new));
    }
    print_errors(&errors);
}

fn print_aligned(alignment: &Alignment, out: &mut impl Write) -> anyhow::Result<()> {
    let [left, right] = alignment.padded_sides();
    let width = left.iter().map(|line| line.chars().count()).max().unwrap_or(0);
    for (line, (l, r)) in alignment.lines.iter().zip(left.iter().zip(&right)) {
        let marker = match line.line_type {
            LineType::Same => ' ',
            LineType::Added => '>',
            LineType::Removed => '<',
            LineType::Modified => '|',
        };
        writeln!(out, "{l:<width$} {marker} {r}")?;
    }
    Ok(())
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config_file = args.config_file.or_else(default_config_path);
    let config = Config::load(args.config, config_file.as_deref())?;
    let read = |path: &PathBuf| fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()));
    let original = read(&args.original)?;
    let modified = read(&args.modified)?;

    let engine = DiffEngine::new(config.engine_settings());
    let estimate = engine.estimate(&original, &modified);
    let needs_alignment = matches!(config.output, OutputFormat::Aligned | OutputFormat::Json);
    let synchronous = needs_alignment || (config.engine == EngineChoice::Sync && args.page.is_none());
    if synchronous && estimate.is_large && !confirm_large_input(&estimate, args.yes)? {
        eprintln!("Cancelled.");
        return Ok(());
    }

    let mut out = BufWriter::new(stdout().lock());
    let on_event = |event: &Response| debug!(kind = event.kind(), progress = ?event.progress(), "worker event");

    if needs_alignment {
        let alignment = engine.settings().aligner.align(&original, &modified);
        if config.debug_validate {
            debug_validate(&alignment, &original, &modified);
        }
        if config.output == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut out, &alignment.lines)?;
            writeln!(out)?;
        } else {
            print_aligned(&alignment, &mut out)?;
        }
        out.flush()?;
        return Ok(());
    }

    let output = match args.page {
        Some(page) => engine.diff_page(&original, &modified, page, config.mode, on_event)?,
        None => engine.diff(&original, &modified, config.mode, on_event)?,
    };
    if config.debug_validate {
        if let DiffOutput::Sync { alignment, .. } = &output {
            debug_validate(alignment, &original, &modified);
        }
    }

    match config.output {
        OutputFormat::Html => writeln!(out, "{}", output.html())?,
        OutputFormat::Document => {
            let title = format!("{} → {}", args.original.display(), args.modified.display());
            write!(out, "{}", render_document(output.html(), &title))?;
        }
        OutputFormat::Stats => {
            let result = match &output {
                DiffOutput::Sync { alignment, .. } => serde_json::json!({
                    "path": "sync",
                    "stats": alignment.stats,
                    "debug": alignment.debug,
                }),
                DiffOutput::Worker { stats, .. } => serde_json::json!({ "path": "worker", "stats": stats }),
                DiffOutput::Paged { page } => serde_json::json!({
                    "path": "paged",
                    "window": page.window,
                    "stats": page.stats,
                }),
            };
            let summary = serde_json::json!({
                "analysis": engine.classify(&original, &modified),
                "estimate": estimate,
                "result": result,
            });
            serde_json::to_writer_pretty(&mut out, &summary)?;
            writeln!(out)?;
        }
        OutputFormat::Aligned | OutputFormat::Json => {}
    }
    out.flush()?;
    Ok(())
}

fn main() {
    // Print errors with Display, not Debug.
    if let Err(e) = try_main() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
