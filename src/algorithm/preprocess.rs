use std::ops::Range;

use memchr::memchr_iter;

/// One `\n`-delimited segment of an input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Zero-based position in the text the line was split from.
    pub index: usize,
    pub content: &'a str,
    pub trimmed: &'a str,
    pub char_count: usize,
}

impl<'a> Line<'a> {
    pub fn new(index: usize, content: &'a str) -> Line<'a> {
        Line {
            index,
            content,
            trimmed: content.trim(),
            char_count: content.chars().count(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.trimmed.is_empty()
    }
}

/// Byte ranges of the lines of `text`, without the terminating `\n`.
///
/// A text with `k` newlines always has `k + 1` lines, so `""` is one empty line and a trailing
/// newline produces a final empty line.
pub fn line_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = vec![];
    let mut start = 0;
    for newline in memchr_iter(b'\n', text.as_bytes()) {
        ranges.push(start..newline);
        start = newline + 1;
    }
    ranges.push(start..text.len());
    ranges
}

pub fn split_lines(text: &str) -> Vec<Line<'_>> {
    line_ranges(text)
        .into_iter()
        .enumerate()
        .map(|(index, range)| Line::new(index, &text[range]))
        .collect()
}

pub fn split_line_strs(text: &str) -> Vec<&str> {
    line_ranges(text).into_iter().map(|range| &text[range]).collect()
}

pub fn count_lines(text: &str) -> usize {
    memchr_iter(b'\n', text.as_bytes()).count() + 1
}

pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
