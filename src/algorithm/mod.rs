pub mod align;
pub mod char_diff;
pub mod matcher;
pub mod preprocess;
pub mod scoring;

pub use self::{
    align::{build_aligned_lines, AlignedLine, Alignment, AlignmentDebug, DiffStats, LineType},
    char_diff::{diff_spans, DiffSpan, SpanOp},
    matcher::{LineMatcher, Match, MatcherKind},
    preprocess::{split_lines, Line},
    scoring::{CharDiffScoring, LineScoring, WordOverlapScoring},
};
