//! Character-level edit scripts for a pair of matched lines.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanOp {
    Equal,
    Insert,
    Delete,
}

impl SpanOp {
    /// Whether the span's text belongs to the old and the new string, respectively.
    pub fn sides(&self) -> [bool; 2] {
        match self {
            SpanOp::Equal => [true, true],
            SpanOp::Delete => [true, false],
            SpanOp::Insert => [false, true],
        }
    }
}

impl From<ChangeTag> for SpanOp {
    fn from(tag: ChangeTag) -> SpanOp {
        match tag {
            ChangeTag::Equal => SpanOp::Equal,
            ChangeTag::Delete => SpanOp::Delete,
            ChangeTag::Insert => SpanOp::Insert,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSpan {
    pub op: SpanOp,
    pub text: String,
}

impl DiffSpan {
    pub fn new(op: SpanOp, text: impl Into<String>) -> DiffSpan {
        DiffSpan { op, text: text.into() }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Computes a character-level edit script turning `old` into `new`.
///
/// Concatenating the `Equal` and `Delete` spans gives back `old`, concatenating the `Equal` and
/// `Insert` spans gives back `new`. Within every run of edits between two equalities the deletion
/// comes first.
pub fn diff_spans(old: &str, new: &str) -> Vec<DiffSpan> {
    if old == new {
        return if old.is_empty() {
            vec![]
        } else {
            vec![DiffSpan::new(SpanOp::Equal, old)]
        };
    }
    if old.is_empty() {
        return vec![DiffSpan::new(SpanOp::Insert, new)];
    }
    if new.is_empty() {
        return vec![DiffSpan::new(SpanOp::Delete, old)];
    }

    let diff = TextDiff::configure().algorithm(Algorithm::Myers).diff_chars(old, new);
    let mut spans: Vec<DiffSpan> = vec![];
    for change in diff.iter_all_changes() {
        let op = SpanOp::from(change.tag());
        match spans.last_mut() {
            Some(last) if last.op == op => last.text.push_str(change.value()),
            _ => spans.push(DiffSpan::new(op, change.value())),
        }
    }
    cleanup_semantic(spans)
}

/// Total length in chars of the `Equal` spans.
pub fn equal_char_count(spans: &[DiffSpan]) -> usize {
    spans
        .iter()
        .filter(|span| span.op == SpanOp::Equal)
        .map(DiffSpan::char_count)
        .sum()
}

/// Rebuilds the old (`side == 0`) or the new (`side == 1`) string from an edit script.
pub fn reconstruct(spans: &[DiffSpan], side: usize) -> String {
    spans
        .iter()
        .filter(|span| span.op.sides()[side])
        .map(|span| span.text.as_str())
        .collect()
}

/// Regroups every run of edits into one deletion followed by one insertion, merges adjacent
/// equalities and drops empty spans.
fn normalize(spans: Vec<DiffSpan>) -> Vec<DiffSpan> {
    let mut result = vec![];
    let mut deleted = String::new();
    let mut inserted = String::new();

    fn flush(result: &mut Vec<DiffSpan>, deleted: &mut String, inserted: &mut String) {
        if !deleted.is_empty() {
            result.push(DiffSpan::new(SpanOp::Delete, std::mem::take(deleted)));
        }
        if !inserted.is_empty() {
            result.push(DiffSpan::new(SpanOp::Insert, std::mem::take(inserted)));
        }
    }

    for span in spans {
        match span.op {
            SpanOp::Delete => deleted.push_str(&span.text),
            SpanOp::Insert => inserted.push_str(&span.text),
            SpanOp::Equal => {
                if span.text.is_empty() {
                    continue;
                }
                flush(&mut result, &mut deleted, &mut inserted);
                match result.last_mut() {
                    Some(DiffSpan {
                        op: SpanOp::Equal,
                        text,
                    }) => text.push_str(&span.text),
                    _ => result.push(span),
                }
            }
        }
    }
    flush(&mut result, &mut deleted, &mut inserted);
    result
}

/// Size of the edit run visited by `range` up to the first equality: the larger of its deleted and
/// inserted char counts.
fn edit_run_size(spans: &[DiffSpan], range: impl Iterator<Item = usize>) -> usize {
    let mut sizes = [0, 0];
    for i in range {
        match spans[i].op {
            SpanOp::Equal => break,
            SpanOp::Delete => sizes[0] += spans[i].char_count(),
            SpanOp::Insert => sizes[1] += spans[i].char_count(),
        }
    }
    sizes[0].max(sizes[1])
}

/// Folds short equalities that sit between two larger edits into those edits, so that e.g.
/// `quick` → `slow` is shown as one substitution instead of a flicker of one-letter matches.
fn cleanup_semantic(spans: Vec<DiffSpan>) -> Vec<DiffSpan> {
    let mut spans = normalize(spans);
    loop {
        let mut changed = false;
        let mut result = Vec::with_capacity(spans.len());
        for i in 0..spans.len() {
            let span = &spans[i];
            let is_interior_equality = span.op == SpanOp::Equal && i > 0 && i + 1 < spans.len();
            if is_interior_equality {
                let length = span.char_count();
                let before = edit_run_size(&spans, (0..i).rev());
                let after = edit_run_size(&spans, i + 1..spans.len());
                if length <= before && length <= after {
                    result.push(DiffSpan::new(SpanOp::Delete, span.text.clone()));
                    result.push(DiffSpan::new(SpanOp::Insert, span.text.clone()));
                    changed = true;
                    continue;
                }
            }
            result.push(span.clone());
        }
        spans = normalize(result);
        if !changed {
            return spans;
        }
    }
}
