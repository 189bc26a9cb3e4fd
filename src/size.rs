//! Input size classification.
//!
//! Two independent classifiers live here. [`SizePolicy::classify`] picks the processing tier that
//! decides between the synchronous matcher, the cheap alignment matcher and chunked rendering. It
//! looks at exact line and char counts of both texts. [`SizePolicy::estimate`] only looks at the
//! char count and decides whether to warn the user and whether the worker should page the result.
//! Their thresholds overlap without agreeing (a 400,000 char input is `Large` but not `is_large`),
//! so a change to one must be checked against the callers of both: `engine::DiffEngine` and the
//! command-line confirmation prompt.

use serde::{Deserialize, Serialize};

use crate::algorithm::preprocess::count_lines;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    Small,
    Medium,
    Large,
    Xlarge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TierLimit {
    pub max_lines: usize,
    pub max_chars: usize,
}

impl TierLimit {
    fn admits(&self, lines: usize, chars: usize) -> bool {
        lines <= self.max_lines && chars <= self.max_chars
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SizePolicy {
    pub small: TierLimit,
    pub medium: TierLimit,
    pub large: TierLimit,
    pub medium_chunk_size: usize,
    pub large_chunk_size: usize,
    pub xlarge_chunk_size: usize,
    pub chars_per_line_estimate: usize,
    pub large_input_chars: usize,
    pub very_large_input_chars: usize,
}

impl Default for SizePolicy {
    fn default() -> SizePolicy {
        SizePolicy {
            small: TierLimit {
                max_lines: 1_000,
                max_chars: 100_000,
            },
            medium: TierLimit {
                max_lines: 2_000,
                max_chars: 300_000,
            },
            large: TierLimit {
                max_lines: 5_000,
                max_chars: 1_000_000,
            },
            medium_chunk_size: 500,
            large_chunk_size: 100,
            xlarge_chunk_size: 50,
            chars_per_line_estimate: 80,
            large_input_chars: 500_000,
            very_large_input_chars: 5_000_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeAnalysis {
    pub total_lines: usize,
    pub total_chars: usize,
    pub average_line_length: f64,
    pub processing_mode: ProcessingMode,
    pub should_use_alignment: bool,
    pub recommended_chunk_size: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeEstimate {
    pub total_chars: usize,
    pub estimated_lines: usize,
    pub is_large: bool,
    pub is_very_large: bool,
}

impl SizePolicy {
    /// Picks the processing tier. Exceeding either the line or the char bound of a tier moves the
    /// input to the next one.
    pub fn classify(&self, original: &str, modified: &str) -> SizeAnalysis {
        let total_lines = count_lines(original) + count_lines(modified);
        let total_chars = original.chars().count() + modified.chars().count();

        let (processing_mode, should_use_alignment, recommended_chunk_size) =
            if self.small.admits(total_lines, total_chars) {
                (ProcessingMode::Small, false, total_lines)
            } else if self.medium.admits(total_lines, total_chars) {
                (ProcessingMode::Medium, false, self.medium_chunk_size.min(total_lines))
            } else if self.large.admits(total_lines, total_chars) {
                (ProcessingMode::Large, true, self.large_chunk_size)
            } else {
                (ProcessingMode::Xlarge, true, self.xlarge_chunk_size)
            };

        SizeAnalysis {
            total_lines,
            total_chars,
            average_line_length: total_chars as f64 / total_lines.max(1) as f64,
            processing_mode,
            should_use_alignment,
            recommended_chunk_size,
        }
    }

    /// Estimates the input size from the char count alone.
    pub fn estimate(&self, original: &str, modified: &str) -> SizeEstimate {
        let total_chars = original.chars().count() + modified.chars().count();
        SizeEstimate {
            total_chars,
            estimated_lines: total_chars / self.chars_per_line_estimate.max(1),
            is_large: total_chars > self.large_input_chars,
            is_very_large: total_chars > self.very_large_input_chars,
        }
    }
}

pub fn classify_size(original: &str, modified: &str) -> SizeAnalysis {
    SizePolicy::default().classify(original, modified)
}

pub fn estimate_size(original: &str, modified: &str) -> SizeEstimate {
    SizePolicy::default().estimate(original, modified)
}

#[cfg(test)]
mod test {
    use super::*;

    fn text(lines: usize, line_length: usize) -> String {
        vec!["x".repeat(line_length); lines].join("\n")
    }

    #[test]
    fn small_input() {
        let analysis = classify_size("a\nb\nc", "a\nb");
        assert_eq!(analysis.processing_mode, ProcessingMode::Small);
        assert_eq!(analysis.total_lines, 5);
        assert_eq!(analysis.total_chars, 8);
        assert!(!analysis.should_use_alignment);
        assert_eq!(analysis.recommended_chunk_size, 5);
    }

    #[test]
    fn medium_by_lines() {
        let analysis = classify_size(&text(800, 10), &text(800, 10));
        assert_eq!(analysis.processing_mode, ProcessingMode::Medium);
        assert_eq!(analysis.recommended_chunk_size, 500);
        assert!(!analysis.should_use_alignment);
    }

    #[test]
    fn large_by_chars() {
        let analysis = classify_size(&text(200, 2_000), "");
        assert_eq!(analysis.processing_mode, ProcessingMode::Large);
        assert!(analysis.should_use_alignment);
        assert_eq!(analysis.recommended_chunk_size, 100);
    }

    #[test]
    fn xlarge_by_lines() {
        // 6,000 lines and about 200,000 chars: only the line bound is exceeded.
        let original = text(3_000, 32);
        let modified = text(3_000, 32);
        let analysis = classify_size(&original, &modified);
        assert_eq!(analysis.total_lines, 6_000);
        assert!(analysis.total_chars <= 200_000);
        assert_eq!(analysis.processing_mode, ProcessingMode::Xlarge);
        assert!(analysis.should_use_alignment);
        assert_eq!(analysis.recommended_chunk_size, 50);
    }

    #[test]
    fn estimate_flags() {
        let big = "y".repeat(600_000);
        let estimate = estimate_size(&big, "");
        assert_eq!(estimate.estimated_lines, 7_500);
        assert!(estimate.is_large);
        assert!(!estimate.is_very_large);
        assert!(!estimate_size("short", "text").is_large);
    }

    #[test]
    fn classifiers_disagree_on_purpose() {
        let text = "z".repeat(400_000);
        assert_eq!(classify_size(&text, "").processing_mode, ProcessingMode::Large);
        assert!(!estimate_size(&text, "").is_large);
    }
}
