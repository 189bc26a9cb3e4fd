//! Line correspondence: exact matches first, then the most similar remaining line.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use string_interner::{DefaultStringInterner, DefaultSymbol};
use tracing::debug;

use super::{
    preprocess::Line,
    scoring::{CharDiffScoring, LineScoring, TScore, WordOverlapScoring},
};

/// A pairing of an original line with a modified line. A missing index marks a line that exists
/// on one side only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub original_index: Option<usize>,
    pub modified_index: Option<usize>,
    pub similarity: TScore,
}

impl Match {
    pub fn pair(original_index: usize, modified_index: usize, similarity: TScore) -> Match {
        Match {
            original_index: Some(original_index),
            modified_index: Some(modified_index),
            similarity,
        }
    }

    pub fn removed(original_index: usize) -> Match {
        Match {
            original_index: Some(original_index),
            modified_index: None,
            similarity: 0.0,
        }
    }

    pub fn added(modified_index: usize) -> Match {
        Match {
            original_index: None,
            modified_index: Some(modified_index),
            similarity: 0.0,
        }
    }

    pub fn is_pair(&self) -> bool {
        self.original_index.is_some() && self.modified_index.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    Smart,
    Basic,
}

pub struct LineMatcher<S> {
    scoring: S,
    threshold: TScore,
}

impl LineMatcher<CharDiffScoring> {
    pub const SMART_THRESHOLD: TScore = 0.5;

    /// Fuzzy matching on character-level edit ratio.
    pub fn smart() -> Self {
        LineMatcher::new(CharDiffScoring, Self::SMART_THRESHOLD)
    }
}

impl LineMatcher<WordOverlapScoring> {
    pub const BASIC_THRESHOLD: TScore = 0.6;

    /// Fuzzy matching on word overlap, cheap enough for the larger size tiers.
    pub fn basic() -> Self {
        LineMatcher::new(WordOverlapScoring::default(), Self::BASIC_THRESHOLD)
    }
}

impl<S: LineScoring> LineMatcher<S> {
    pub fn new(scoring: S, threshold: TScore) -> Self {
        LineMatcher { scoring, threshold }
    }

    pub fn threshold(&self) -> TScore {
        self.threshold
    }

    pub fn scoring(&self) -> &S {
        &self.scoring
    }

    /// Matches every line of `original` and `modified` to at most one partner.
    ///
    /// The result contains exactly one entry per input line index, sorted by original index with
    /// modified-only lines after all entries that have an original index.
    pub fn match_lines(&self, original: &[Line], modified: &[Line]) -> Vec<Match> {
        let mut used = [vec![false; original.len()], vec![false; modified.len()]];
        let mut matches = Vec::with_capacity(original.len().max(modified.len()));

        let exact = exact_pass(original, modified, &mut used, &mut matches);
        let fuzzy = self.fuzzy_pass(original, modified, &mut used, &mut matches);
        debug!(
            original_lines = original.len(),
            modified_lines = modified.len(),
            exact,
            fuzzy,
            threshold = self.threshold,
            "matched lines"
        );

        for (position, line) in original.iter().enumerate() {
            if !used[0][position] {
                matches.push(Match::removed(line.index));
            }
        }
        for (position, line) in modified.iter().enumerate() {
            if !used[1][position] {
                matches.push(Match::added(line.index));
            }
        }

        let offset = original.iter().map(|line| line.index + 1).max().unwrap_or(0);
        matches.sort_by_key(|m| match (m.original_index, m.modified_index) {
            (Some(original_index), _) => original_index,
            (None, Some(modified_index)) => modified_index + offset,
            (None, None) => usize::MAX,
        });
        matches
    }

    fn fuzzy_pass(
        &self,
        original: &[Line],
        modified: &[Line],
        used: &mut [Vec<bool>; 2],
        matches: &mut Vec<Match>,
    ) -> usize {
        let mut found = 0;
        for (i, a) in original.iter().enumerate() {
            // A blank line only ever matches exactly.
            if used[0][i] || a.is_blank() {
                continue;
            }
            let mut best: Option<(usize, TScore)> = None;
            for (j, b) in modified.iter().enumerate() {
                if used[1][j] {
                    continue;
                }
                let bound = self.scoring.upper_bound(a, b);
                match best {
                    Some((_, best_score)) if bound <= best_score => continue,
                    None if bound < self.threshold => continue,
                    _ => {}
                }
                let score = self.scoring.similarity(a.content, b.content);
                if score >= self.threshold && best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((j, score));
                }
            }
            if let Some((j, score)) = best {
                used[0][i] = true;
                used[1][j] = true;
                matches.push(Match::pair(a.index, modified[j].index, score));
                found += 1;
            }
        }
        found
    }
}

/// Pairs every original line with the first unused identical modified line.
fn exact_pass(original: &[Line], modified: &[Line], used: &mut [Vec<bool>; 2], matches: &mut Vec<Match>) -> usize {
    let mut interner = DefaultStringInterner::default();
    let mut positions: HashMap<DefaultSymbol, VecDeque<usize>> = HashMap::new();
    for (j, line) in modified.iter().enumerate() {
        positions
            .entry(interner.get_or_intern(line.content))
            .or_default()
            .push_back(j);
    }

    let mut found = 0;
    for (i, line) in original.iter().enumerate() {
        let Some(symbol) = interner.get(line.content) else {
            continue;
        };
        if let Some(j) = positions.get_mut(&symbol).and_then(VecDeque::pop_front) {
            used[0][i] = true;
            used[1][j] = true;
            matches.push(Match::pair(line.index, modified[j].index, 1.0));
            found += 1;
        }
    }
    found
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algorithm::preprocess::split_lines;
    use pretty_assertions::assert_eq;

    pub fn pair(original: usize, modified: usize, similarity: TScore) -> Match {
        Match::pair(original, modified, similarity)
    }

    #[test]
    fn exact_matches_keep_order() {
        let original = split_lines("a\nb");
        let modified = split_lines("a\nx\nb");
        let matches = LineMatcher::smart().match_lines(&original, &modified);
        assert_eq!(matches, vec![pair(0, 0, 1.0), pair(1, 2, 1.0), Match::added(1)]);
    }

    #[test]
    fn duplicates_pair_up_in_order() {
        let original = split_lines("x\nx\ny");
        let modified = split_lines("x\ny\nx");
        let matches = LineMatcher::smart().match_lines(&original, &modified);
        assert_eq!(matches, vec![pair(0, 0, 1.0), pair(1, 2, 1.0), pair(2, 1, 1.0)]);
    }

    #[test]
    fn similar_line_is_matched_fuzzily() {
        let original = split_lines("let total = price * count;\nremoved entirely");
        let modified = split_lines("let total = price * amount;");
        let matches = LineMatcher::smart().match_lines(&original, &modified);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].original_index, Some(0));
        assert_eq!(matches[0].modified_index, Some(0));
        assert!(matches[0].similarity >= 0.5 && matches[0].similarity < 1.0);
        assert_eq!(matches[1], Match::removed(1));
    }

    #[test]
    fn ties_go_to_the_first_candidate() {
        let original = split_lines("abcdef");
        let modified = split_lines("abcdeX\nabcdeY");
        let matches = LineMatcher::smart().match_lines(&original, &modified);
        assert_eq!(matches[0].modified_index, Some(0));
        assert_eq!(matches[1], Match::added(1));
    }

    #[test]
    fn below_threshold_stays_unmatched() {
        let original = split_lines("12345");
        let modified = split_lines("abcde");
        let matches = LineMatcher::smart().match_lines(&original, &modified);
        assert_eq!(matches, vec![Match::removed(0), Match::added(0)]);
    }

    #[test]
    fn basic_matcher_uses_word_overlap() {
        let original = split_lines("the quick brown fox jumps");
        let modified = split_lines("the quick brown cat jumps");
        let matches = LineMatcher::basic().match_lines(&original, &modified);
        // "quick", "brown", "jumps" and "the" are shared: 4 of 5 tokens.
        assert_eq!(matches, vec![pair(0, 0, 0.8)]);
    }

    #[test]
    fn empty_lines_match_exactly() {
        let original = split_lines("a\n\nb");
        let modified = split_lines("a\n\nc");
        let matches = LineMatcher::smart().match_lines(&original, &modified);
        assert!(matches.contains(&pair(1, 1, 1.0)));
    }
}
