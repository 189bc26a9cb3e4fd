//! Entry points: the synchronous diff functions and [`DiffEngine`], which picks between them and
//! the background worker by input size.

use std::time::Instant;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    algorithm::{
        align::{build_aligned_lines, count_pairs, Alignment, AlignmentDebug, DiffStats},
        matcher::{LineMatcher, MatcherKind},
        preprocess::split_lines,
        scoring::{CharDiffScoring, TScore, WordOverlapScoring},
    },
    cache::DiffCache,
    error::WorkerError,
    render::{render, RenderMode},
    size::{ProcessingMode, SizeAnalysis, SizeEstimate, SizePolicy},
    worker::{PagedDiff, Response, WorkerClient, WorkerSettings, WorkerStats},
};

pub use crate::size::classify_size;

/// Matches and aligns lines, choosing the matcher by input size.
#[derive(Clone, Debug, PartialEq)]
pub struct Aligner {
    pub policy: SizePolicy,
    pub smart_threshold: TScore,
    pub basic_threshold: TScore,
}

impl Default for Aligner {
    fn default() -> Aligner {
        Aligner {
            policy: SizePolicy::default(),
            smart_threshold: LineMatcher::<CharDiffScoring>::SMART_THRESHOLD,
            basic_threshold: LineMatcher::<WordOverlapScoring>::BASIC_THRESHOLD,
        }
    }
}

impl Aligner {
    /// Inputs that the size policy sends to the alignment path get the cheaper word-overlap
    /// matcher, all others the edit-ratio one.
    pub fn align(&self, original_text: &str, modified_text: &str) -> Alignment {
        let start = Instant::now();
        let analysis = self.policy.classify(original_text, modified_text);
        let original = split_lines(original_text);
        let modified = split_lines(modified_text);

        let (matcher, threshold, matches) = if analysis.should_use_alignment {
            let matcher = LineMatcher::new(WordOverlapScoring::default(), self.basic_threshold);
            (MatcherKind::Basic, self.basic_threshold, matcher.match_lines(&original, &modified))
        } else {
            let matcher = LineMatcher::new(CharDiffScoring, self.smart_threshold);
            (MatcherKind::Smart, self.smart_threshold, matcher.match_lines(&original, &modified))
        };
        let lines = build_aligned_lines(&original, &modified, &matches);
        let (exact_matches, fuzzy_matches) = count_pairs(&matches);

        let snapshot = AlignmentDebug {
            matcher,
            threshold,
            analysis,
            exact_matches,
            fuzzy_matches,
            elapsed: start.elapsed(),
        };
        debug!(
            ?matcher,
            mode = ?analysis.processing_mode,
            exact_matches,
            fuzzy_matches,
            elapsed = ?snapshot.elapsed,
            "aligned"
        );
        Alignment {
            stats: DiffStats::from_lines(&lines),
            lines,
            debug: snapshot,
        }
    }
}

pub fn align_for_sync_scroll(original: &str, modified: &str) -> Alignment {
    Aligner::default().align(original, modified)
}

pub fn compute_line_diff(original: &str, modified: &str, mode: RenderMode) -> String {
    let alignment = align_for_sync_scroll(original, modified);
    render(&alignment.lines, mode).to_html()
}

pub fn compute_inline_diff(original: &str, modified: &str) -> String {
    compute_line_diff(original, modified, RenderMode::Inline)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineChoice {
    /// Pick by input size.
    #[default]
    Auto,
    /// Always diff on the calling thread.
    Sync,
    /// Always use the background worker.
    Worker,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineSettings {
    pub choice: EngineChoice,
    pub aligner: Aligner,
    pub worker: WorkerSettings,
    pub lines_per_page: usize,
    /// `0` disables the cache.
    pub cache_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> EngineSettings {
        EngineSettings {
            choice: EngineChoice::Auto,
            aligner: Aligner::default(),
            worker: WorkerSettings::default(),
            lines_per_page: 1_000,
            cache_capacity: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "path", rename_all = "kebab-case")]
pub enum DiffOutput {
    /// Computed on the calling thread with line matching.
    Sync { html: String, alignment: Alignment },
    /// Full hash diff from the worker.
    Worker { html: String, stats: WorkerStats },
    /// A single page, for inputs too large to diff whole.
    Paged { page: PagedDiff },
}

impl DiffOutput {
    pub fn html(&self) -> &str {
        match self {
            DiffOutput::Sync { html, .. } | DiffOutput::Worker { html, .. } => html,
            DiffOutput::Paged { page } => &page.html,
        }
    }
}

enum Path {
    Sync,
    Worker,
    Paged,
}

pub struct DiffEngine {
    settings: EngineSettings,
    cache: DiffCache<DiffOutput>,
    worker: WorkerClient,
}

impl DiffEngine {
    pub fn new(settings: EngineSettings) -> DiffEngine {
        DiffEngine {
            cache: DiffCache::new(settings.cache_capacity),
            worker: WorkerClient::new(settings.worker.clone()),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn worker(&self) -> &WorkerClient {
        &self.worker
    }

    pub fn classify(&self, original: &str, modified: &str) -> SizeAnalysis {
        self.settings.aligner.policy.classify(original, modified)
    }

    pub fn estimate(&self, original: &str, modified: &str) -> SizeEstimate {
        self.settings.aligner.policy.estimate(original, modified)
    }

    fn choose_path(&self, analysis: &SizeAnalysis, estimate: &SizeEstimate) -> Path {
        match self.settings.choice {
            EngineChoice::Sync => Path::Sync,
            EngineChoice::Worker if estimate.is_very_large => Path::Paged,
            EngineChoice::Worker => Path::Worker,
            EngineChoice::Auto if estimate.is_very_large => Path::Paged,
            EngineChoice::Auto if analysis.processing_mode >= ProcessingMode::Large => Path::Worker,
            EngineChoice::Auto => Path::Sync,
        }
    }

    /// Diffs the two texts on the path their size calls for. Worker events are passed to
    /// `on_event`. Inputs that are too large to diff whole yield their first page.
    pub fn diff(
        &self,
        original: &str,
        modified: &str,
        mode: RenderMode,
        on_event: impl FnMut(&Response),
    ) -> Result<DiffOutput, WorkerError> {
        if let Some(output) = self.cache.get(original, modified, mode) {
            debug!("diff cache hit");
            return Ok(output);
        }

        let analysis = self.classify(original, modified);
        let estimate = self.estimate(original, modified);
        if estimate.is_very_large {
            warn!(chars = estimate.total_chars, "very large input, only one page will be diffed");
        }
        let output = match self.choose_path(&analysis, &estimate) {
            Path::Sync => {
                let alignment = self.settings.aligner.align(original, modified);
                let html = render(&alignment.lines, mode).to_html();
                DiffOutput::Sync { html, alignment }
            }
            Path::Worker => {
                info!(mode = ?analysis.processing_mode, "diffing in the background worker");
                let diff = self.worker.diff(original, modified, mode, on_event)?;
                DiffOutput::Worker {
                    html: diff.html,
                    stats: diff.stats,
                }
            }
            Path::Paged => return self.diff_page(original, modified, 0, mode, on_event),
        };
        self.cache.insert(original, modified, mode, output.clone());
        Ok(output)
    }

    /// Positional diff of one page of `settings.lines_per_page` lines.
    pub fn diff_page(
        &self,
        original: &str,
        modified: &str,
        page_number: usize,
        mode: RenderMode,
        on_event: impl FnMut(&Response),
    ) -> Result<DiffOutput, WorkerError> {
        let page = self.worker.paged_diff(
            original,
            modified,
            page_number,
            self.settings.lines_per_page,
            mode,
            on_event,
        )?;
        Ok(DiffOutput::Paged { page })
    }
}

impl Default for DiffEngine {
    fn default() -> DiffEngine {
        DiffEngine::new(EngineSettings::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{algorithm::align::LineType, render::REMOVED_CLASS};

    #[test]
    fn small_inputs_use_the_smart_matcher() {
        let alignment = align_for_sync_scroll("The quick fox", "The slow fox");
        assert_eq!(alignment.debug.matcher, MatcherKind::Smart);
        assert_eq!(alignment.debug.fuzzy_matches, 1);
        assert_eq!(alignment.lines[0].line_type, LineType::Modified);
    }

    #[test]
    fn large_inputs_use_the_basic_matcher() {
        let text: String = (0..3_000).map(|i| format!("line number {i}\n")).collect();
        let alignment = align_for_sync_scroll(&text, &text);
        assert!(alignment.debug.analysis.should_use_alignment);
        assert_eq!(alignment.debug.matcher, MatcherKind::Basic);
        assert!(!alignment.stats.has_changes());
    }

    #[test]
    fn inline_diff_drops_removed_text() {
        let html = compute_inline_diff("keep\ndrop me", "keep");
        assert!(!html.contains("drop me"));
        assert!(html.contains("&nbsp;"));
        let html = compute_line_diff("keep\ndrop me", "keep", RenderMode::Line);
        assert!(html.contains("<span class=\"diff-removed\">drop me</span>"));
    }

    #[test]
    fn engine_picks_path_by_size() {
        let engine = DiffEngine::default();
        let output = engine.diff("a\nb", "a\nc", RenderMode::Line, |_| {}).unwrap();
        assert!(matches!(output, DiffOutput::Sync { .. }));

        let text: String = (0..6_000).map(|i| format!("{i}\n")).collect();
        let output = engine.diff(&text, &text, RenderMode::Line, |_| {}).unwrap();
        let DiffOutput::Worker { stats, .. } = output else {
            panic!("expected a worker diff, got {output:?}");
        };
        assert_eq!(stats.unchanged, 6_001);
    }

    #[test]
    fn very_large_inputs_are_paged() {
        let settings = EngineSettings {
            aligner: Aligner {
                policy: SizePolicy {
                    very_large_input_chars: 10,
                    ..SizePolicy::default()
                },
                ..Aligner::default()
            },
            lines_per_page: 2,
            ..EngineSettings::default()
        };
        let engine = DiffEngine::new(settings);
        let output = engine.diff("a\nb\nc\nd", "a\nb\nx\nd", RenderMode::Line, |_| {}).unwrap();
        let DiffOutput::Paged { page } = output else {
            panic!("expected a paged diff, got {output:?}");
        };
        assert_eq!(page.window.page_number, 0);
        assert_eq!(page.window.total_pages, 2);
        assert_eq!(page.stats.same, 2);
    }

    #[test]
    fn results_are_cached() {
        let engine = DiffEngine::default();
        let first = engine.diff("a", "b", RenderMode::Line, |_| {}).unwrap();
        let second = engine.diff("a", "b", RenderMode::Line, |_| {}).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.cache.len(), 1);
    }

    #[test]
    fn edit_in_the_middle_is_not_served_from_cache() {
        let padding = "filler line\n".repeat(160);
        let original = format!("{padding}the cat sat\n{padding}");
        let edited = original.replace("cat", "dog");
        assert_eq!(original.len(), edited.len());

        let engine = DiffEngine::default();
        let first = engine.diff(&original, &original, RenderMode::Line, |_| {}).unwrap();
        assert!(!first.html().contains(REMOVED_CLASS));
        let second = engine.diff(&original, &edited, RenderMode::Line, |_| {}).unwrap();
        assert_ne!(first, second);
        assert!(second.html().contains(REMOVED_CLASS));
        assert!(second.html().contains("dog"));
    }
}
