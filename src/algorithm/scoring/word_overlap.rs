use std::collections::HashMap;

use crate::algorithm::preprocess::{is_blank, Line};

use super::{LineScoring, TScore};

/// Share of whitespace-separated tokens the two lines have in common.
///
/// Each token of one line is matched with at most one equal token of the other, so the score is a
/// multiset intersection and `similarity(a, b) == similarity(b, a)`.
#[derive(Debug, Clone, Copy)]
pub struct WordOverlapScoring {
    /// Tokens shorter than this many chars never count as common.
    pub min_token_chars: usize,
    /// Lines whose lengths differ by more than this factor get `dissimilar_score` right away.
    pub max_length_ratio: f64,
    pub dissimilar_score: TScore,
}

impl Default for WordOverlapScoring {
    fn default() -> WordOverlapScoring {
        WordOverlapScoring {
            min_token_chars: 3,
            max_length_ratio: 2.0,
            dissimilar_score: 0.2,
        }
    }
}

impl WordOverlapScoring {
    fn lengths_too_different(&self, a_chars: usize, b_chars: usize) -> bool {
        let (shorter, longer) = (a_chars.min(b_chars), a_chars.max(b_chars));
        longer as f64 > shorter as f64 * self.max_length_ratio
    }

    fn is_counted(&self, token: &str) -> bool {
        token.chars().count() >= self.min_token_chars
    }
}

impl LineScoring for WordOverlapScoring {
    fn similarity(&self, a: &str, b: &str) -> TScore {
        if a == b {
            return 1.0;
        }
        if is_blank(a) || is_blank(b) {
            return 0.0;
        }
        if self.lengths_too_different(a.chars().count(), b.chars().count()) {
            return self.dissimilar_score;
        }

        let a_tokens: Vec<&str> = a.split_whitespace().collect();
        let b_tokens: Vec<&str> = b.split_whitespace().collect();
        let mut available: HashMap<&str, usize> = HashMap::new();
        for &token in b_tokens.iter().filter(|token| self.is_counted(token)) {
            *available.entry(token).or_insert(0) += 1;
        }

        let mut common = 0;
        for token in a_tokens.iter().filter(|token| self.is_counted(token)) {
            if let Some(count) = available.get_mut(token) {
                if *count > 0 {
                    *count -= 1;
                    common += 1;
                }
            }
        }
        common as TScore / a_tokens.len().max(b_tokens.len()) as TScore
    }

    fn upper_bound(&self, a: &Line, b: &Line) -> TScore {
        if a.content != b.content && self.lengths_too_different(a.char_count, b.char_count) {
            self.dissimilar_score
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identical_lines() {
        let scoring = WordOverlapScoring::default();
        assert_eq!(scoring.similarity("one two three", "one two three"), 1.0);
    }

    #[test]
    fn very_different_lengths_short_circuit() {
        let scoring = WordOverlapScoring::default();
        assert_eq!(scoring.similarity("short", "a much much longer line of text"), 0.2);
    }

    #[test]
    fn short_tokens_are_ignored() {
        let scoring = WordOverlapScoring::default();
        // "is" and "a" are too short, only "test" counts: 1 common out of 3 tokens.
        let score = scoring.similarity("is a test", "be a test");
        assert!((score - 1.0 / 3.0).abs() < 1e-9, "{score}");
    }

    #[test]
    fn repeated_tokens_are_consumed_once() {
        let scoring = WordOverlapScoring::default();
        let a = "foo foo foo bar";
        let b = "foo bar baz qux";
        assert_eq!(scoring.similarity(a, b), 0.5);
        assert_eq!(scoring.similarity(b, a), 0.5);
    }
}
