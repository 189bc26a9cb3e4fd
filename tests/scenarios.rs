use notediff::{
    algorithm::{char_diff::diff_spans, preprocess::split_lines, DiffSpan, LineMatcher, LineType, SpanOp},
    align_for_sync_scroll, classify_size, compute_inline_diff, compute_line_diff,
    render::RenderMode,
    size::ProcessingMode,
};
use pretty_assertions::assert_eq;

#[test]
fn identical_texts() {
    let alignment = align_for_sync_scroll("a\nb\nc", "a\nb\nc");
    let types: Vec<_> = alignment.lines.iter().map(|line| line.line_type).collect();
    assert_eq!(types, [LineType::Same; 3]);
    assert_eq!(alignment.stats.same, 3);
    assert_eq!(alignment.stats.added + alignment.stats.removed, 0);
}

#[test]
fn inserted_line() {
    let (original, modified) = (split_lines("a\nb"), split_lines("a\nx\nb"));
    let matches = LineMatcher::smart().match_lines(&original, &modified);
    let pairs: Vec<_> = matches
        .iter()
        .filter(|m| m.is_pair())
        .map(|m| (m.original_index, m.modified_index, m.similarity))
        .collect();
    assert_eq!(pairs, [(Some(0), Some(0), 1.0), (Some(1), Some(2), 1.0)]);
    assert!(matches.iter().any(|m| m.original_index.is_none() && m.modified_index == Some(1)));

    let html = compute_line_diff("a\nb", "a\nx\nb", RenderMode::Line);
    assert_eq!(
        html,
        "<div class=\"diff-line\">a</div>\n\
         <div class=\"diff-line\"><span class=\"diff-added\">x</span></div>\n\
         <div class=\"diff-line\">b</div>"
    );
}

#[test]
fn substituted_word() {
    let spans = diff_spans("The quick fox", "The slow fox");
    assert_eq!(
        spans,
        [
            DiffSpan::new(SpanOp::Equal, "The "),
            DiffSpan::new(SpanOp::Delete, "quick"),
            DiffSpan::new(SpanOp::Insert, "slow"),
            DiffSpan::new(SpanOp::Equal, " fox"),
        ]
    );
}

#[test]
fn many_lines_are_xlarge() {
    // 6000 lines, 200,000 chars in total.
    let line = "x".repeat(32);
    let mut lines = vec![line.as_str(); 6_000];
    let last = "x".repeat(200_000 - 32 * 5_999 - 5_999);
    lines[5_999] = &last;
    let text = lines.join("\n");
    assert_eq!(text.chars().count(), 200_000);

    let analysis = classify_size(&text, "");
    assert_eq!(analysis.total_lines, 6_001);
    assert_eq!(analysis.processing_mode, ProcessingMode::Xlarge);
    assert!(analysis.should_use_alignment);
    assert_eq!(analysis.recommended_chunk_size, 50);
}

#[test]
fn inline_mode_hides_removed_lines() {
    let html = compute_inline_diff("kept\nremoved line", "kept");
    assert_eq!(
        html,
        "<div class=\"diff-line\">kept</div>\n<div class=\"diff-line\">&nbsp;</div>"
    );
}

#[test]
fn inline_mode_shows_only_insertions() {
    let html = compute_inline_diff("The quick fox", "The slow fox");
    assert_eq!(
        html,
        "<div class=\"diff-line\">The <span class=\"inline-diff-added\">slow</span> fox</div>"
    );
}

#[test]
fn empty_texts() {
    assert_eq!(compute_line_diff("", "", RenderMode::Line), "<div class=\"diff-line\">&nbsp;</div>");
    let alignment = align_for_sync_scroll("", "");
    assert_eq!(alignment.lines.len(), 1);
    assert_eq!(alignment.lines[0].line_type, LineType::Same);
}

#[test]
fn debug_snapshot_comes_with_the_alignment() {
    let alignment = align_for_sync_scroll("one\ntwo\nthree", "one\ntwo!\nfour");
    assert_eq!(alignment.debug.exact_matches, 1);
    assert_eq!(alignment.debug.analysis.processing_mode, ProcessingMode::Small);
    assert_eq!(alignment.debug.threshold, 0.5);
}
