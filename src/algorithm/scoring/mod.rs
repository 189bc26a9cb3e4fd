//! Line similarity scores in `[0, 1]`.

mod edit_ratio;
mod word_overlap;

pub use self::{edit_ratio::CharDiffScoring, word_overlap::WordOverlapScoring};

use super::preprocess::Line;

pub type TScore = f64;

pub trait LineScoring {
    /// Similarity of two line strings, `1.0` for identical lines.
    fn similarity(&self, a: &str, b: &str) -> TScore;

    /// A cheap value that `similarity(a, b)` can never exceed.
    fn upper_bound(&self, _a: &Line, _b: &Line) -> TScore {
        1.0
    }
}

impl<S: LineScoring + ?Sized> LineScoring for &S {
    fn similarity(&self, a: &str, b: &str) -> TScore {
        (**self).similarity(a, b)
    }

    fn upper_bound(&self, a: &Line, b: &Line) -> TScore {
        (**self).upper_bound(a, b)
    }
}
