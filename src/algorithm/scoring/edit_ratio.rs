use crate::algorithm::{
    char_diff::{diff_spans, equal_char_count},
    preprocess::{is_blank, Line},
};

use super::{LineScoring, TScore};

/// Share of the longer line that survives unchanged in the character-level diff.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharDiffScoring;

impl LineScoring for CharDiffScoring {
    fn similarity(&self, a: &str, b: &str) -> TScore {
        if a == b {
            return 1.0;
        }
        if is_blank(a) || is_blank(b) {
            return 0.0;
        }
        let longest = a.chars().count().max(b.chars().count());
        equal_char_count(&diff_spans(a, b)) as TScore / longest as TScore
    }

    fn upper_bound(&self, a: &Line, b: &Line) -> TScore {
        let longest = a.char_count.max(b.char_count);
        if longest == 0 {
            return 1.0;
        }
        a.char_count.min(b.char_count) as TScore / longest as TScore
    }
}
