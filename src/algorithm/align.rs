//! Display-ready line pairs built from a set of matches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    matcher::{Match, MatcherKind},
    preprocess::{is_blank, Line},
    scoring::TScore,
};
use crate::size::SizeAnalysis;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Same,
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedLine {
    pub original_content: Option<String>,
    pub modified_content: Option<String>,
    /// 1-based.
    pub original_line_number: Option<usize>,
    /// 1-based.
    pub modified_line_number: Option<usize>,
    pub line_type: LineType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<TScore>,
}

impl AlignedLine {
    pub fn same(original: &Line, modified: &Line) -> AlignedLine {
        AlignedLine {
            original_content: Some(original.content.to_owned()),
            modified_content: Some(modified.content.to_owned()),
            original_line_number: Some(original.index + 1),
            modified_line_number: Some(modified.index + 1),
            line_type: LineType::Same,
            similarity: Some(1.0),
        }
    }

    pub fn removed(original: &Line) -> AlignedLine {
        AlignedLine {
            original_content: Some(original.content.to_owned()),
            modified_content: None,
            original_line_number: Some(original.index + 1),
            modified_line_number: None,
            line_type: LineType::Removed,
            similarity: None,
        }
    }

    pub fn added(modified: &Line) -> AlignedLine {
        AlignedLine {
            original_content: None,
            modified_content: Some(modified.content.to_owned()),
            original_line_number: None,
            modified_line_number: Some(modified.index + 1),
            line_type: LineType::Added,
            similarity: None,
        }
    }

    /// Classifies a matched pair. Lines that are identical, or both blank, are `Same`.
    pub fn paired(original: &Line, modified: &Line, similarity: TScore) -> AlignedLine {
        if original.content == modified.content || (original.is_blank() && modified.is_blank()) {
            return AlignedLine::same(original, modified);
        }
        AlignedLine {
            line_type: LineType::Modified,
            similarity: Some(similarity),
            ..AlignedLine::same(original, modified)
        }
    }

    /// Pairs two lines by position, without scoring them.
    pub fn positional(original: &Line, modified: &Line) -> AlignedLine {
        AlignedLine {
            similarity: None,
            ..AlignedLine::paired(original, modified, 0.0)
        }
    }

    pub fn is_blank(&self) -> bool {
        [&self.original_content, &self.modified_content]
            .iter()
            .all(|content| content.as_deref().map_or(true, is_blank))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub same: usize,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

impl DiffStats {
    pub fn from_lines(lines: &[AlignedLine]) -> DiffStats {
        let mut stats = DiffStats::default();
        for line in lines {
            stats.record(line.line_type);
        }
        stats
    }

    pub fn record(&mut self, line_type: LineType) {
        match line_type {
            LineType::Same => self.same += 1,
            LineType::Added => self.added += 1,
            LineType::Removed => self.removed += 1,
            LineType::Modified => self.modified += 1,
        }
    }

    pub fn merge(&mut self, other: DiffStats) {
        self.same += other.same;
        self.added += other.added;
        self.removed += other.removed;
        self.modified += other.modified;
    }

    pub fn has_changes(&self) -> bool {
        self.added + self.removed + self.modified > 0
    }
}

/// What the aligner did, returned with every alignment instead of being kept around globally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentDebug {
    pub matcher: MatcherKind,
    pub threshold: TScore,
    pub analysis: SizeAnalysis,
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alignment {
    pub lines: Vec<AlignedLine>,
    pub stats: DiffStats,
    pub debug: AlignmentDebug,
}

impl Alignment {
    /// Both sides padded with empty lines to a common length, for synchronized scrolling.
    pub fn padded_sides(&self) -> [Vec<&str>; 2] {
        let original = self.lines.iter().map(|line| line.original_content.as_deref().unwrap_or(""));
        let modified = self.lines.iter().map(|line| line.modified_content.as_deref().unwrap_or(""));
        [original.collect(), modified.collect()]
    }
}

/// Counts `(exact, fuzzy)` pairs among `matches`.
pub fn count_pairs(matches: &[Match]) -> (usize, usize) {
    let pairs = matches.iter().filter(|m| m.is_pair());
    pairs.fold((0, 0), |(exact, fuzzy), m| {
        if m.similarity >= 1.0 {
            (exact + 1, fuzzy)
        } else {
            (exact, fuzzy + 1)
        }
    })
}

/// Orders the matched lines for top-to-bottom reading.
///
/// Pairs and removed lines follow the original text. A modified-only line is placed right before
/// the first pair whose modified line comes after it, and the ones past the last pair trail at
/// the end. `matches` index into `original` and `modified`, whose lines must be contiguous.
pub fn build_aligned_lines(original: &[Line], modified: &[Line], matches: &[Match]) -> Vec<AlignedLine> {
    let original_base = original.first().map_or(0, |line| line.index);
    let modified_base = modified.first().map_or(0, |line| line.index);
    let original_line = |index: usize| &original[index - original_base];
    let modified_line = |index: usize| &modified[index - modified_base];

    let mut only_added: Vec<usize> = matches
        .iter()
        .filter(|m| m.original_index.is_none())
        .filter_map(|m| m.modified_index)
        .collect();
    only_added.sort_unstable();
    let mut next_added = 0;

    let mut result = Vec::with_capacity(matches.len());
    for m in matches {
        let Some(original_index) = m.original_index else {
            continue;
        };
        match m.modified_index {
            Some(modified_index) => {
                while next_added < only_added.len() && only_added[next_added] < modified_index {
                    result.push(AlignedLine::added(modified_line(only_added[next_added])));
                    next_added += 1;
                }
                result.push(AlignedLine::paired(
                    original_line(original_index),
                    modified_line(modified_index),
                    m.similarity,
                ));
            }
            None => result.push(AlignedLine::removed(original_line(original_index))),
        }
    }
    for &modified_index in &only_added[next_added..] {
        result.push(AlignedLine::added(modified_line(modified_index)));
    }
    result
}
