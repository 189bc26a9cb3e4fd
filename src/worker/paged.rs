//! Page windows and the positional comparison used by paged diffs.

use serde::{Deserialize, Serialize};

use crate::algorithm::{
    align::AlignedLine,
    preprocess::{split_line_strs, Line},
};

/// A page of lines, `start..end` (0-based), of the longer of the two texts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub page_number: usize,
    pub lines_per_page: usize,
    pub total_lines: usize,
    pub total_pages: usize,
    pub start: usize,
    pub end: usize,
}

pub fn page_window(
    original_lines: usize,
    modified_lines: usize,
    page_number: usize,
    lines_per_page: usize,
) -> Result<PageWindow, String> {
    if lines_per_page == 0 {
        return Err("lines per page must be positive".to_owned());
    }
    let total_lines = original_lines.max(modified_lines);
    let total_pages = total_lines.div_ceil(lines_per_page).max(1);
    if page_number >= total_pages {
        return Err(format!("page {page_number} is out of range, there are {total_pages} pages"));
    }
    let start = page_number * lines_per_page;
    Ok(PageWindow {
        page_number,
        lines_per_page,
        total_lines,
        total_pages,
        start,
        end: (start + lines_per_page).min(total_lines),
    })
}

/// Compares line `i` of `original` with line `i` of `modified` for every `i` in the window.
pub fn positional_lines(original: &[&str], modified: &[&str], window: &PageWindow) -> Vec<AlignedLine> {
    (window.start..window.end)
        .filter_map(|i| match (original.get(i), modified.get(i)) {
            (Some(o), Some(m)) => Some(AlignedLine::positional(&Line::new(i, o), &Line::new(i, m))),
            (Some(o), None) => Some(AlignedLine::removed(&Line::new(i, o))),
            (None, Some(m)) => Some(AlignedLine::added(&Line::new(i, m))),
            (None, None) => None,
        })
        .collect()
}

/// Chars of both texts inside the window.
pub fn window_chars(original: &[&str], modified: &[&str], window: &PageWindow) -> usize {
    [original, modified]
        .iter()
        .flat_map(|lines| lines.iter().take(window.end).skip(window.start))
        .map(|line| line.chars().count())
        .sum()
}

/// Whether the page is large enough to be streamed in sub-chunks. Invalid pages are not streamed.
pub fn is_streaming(
    original: &str,
    modified: &str,
    page_number: usize,
    lines_per_page: usize,
    threshold_chars: usize,
) -> bool {
    let (original, modified) = (split_line_strs(original), split_line_strs(modified));
    match page_window(original.len(), modified.len(), page_number, lines_per_page) {
        Ok(window) => window_chars(&original, &modified, &window) > threshold_chars,
        Err(_) => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algorithm::align::LineType;

    #[test]
    fn windows() {
        let window = page_window(250, 120, 2, 100).unwrap();
        assert_eq!((window.start, window.end, window.total_pages), (200, 250, 3));
        assert!(page_window(250, 120, 3, 100).is_err());
        assert!(page_window(10, 10, 0, 0).is_err());
    }

    #[test]
    fn single_line_texts_have_one_page() {
        let window = page_window(1, 1, 0, 50).unwrap();
        assert_eq!((window.start, window.end, window.total_pages), (0, 1, 1));
    }

    #[test]
    fn compares_by_position() {
        let original = ["a", "b", "c"];
        let modified = ["a", "x", "b"];
        let window = page_window(3, 3, 0, 10).unwrap();
        let types: Vec<_> = positional_lines(&original, &modified, &window)
            .iter()
            .map(|line| line.line_type)
            .collect();
        assert_eq!(types, [LineType::Same, LineType::Modified, LineType::Modified]);
    }

    #[test]
    fn shorter_side_runs_out() {
        let window = page_window(3, 1, 0, 2).unwrap();
        let lines = positional_lines(&["a", "b", "c"], &["a"], &window);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].line_type, LineType::Removed);
        assert_eq!(lines[1].original_line_number, Some(2));
        let window = page_window(3, 1, 1, 2).unwrap();
        let lines = positional_lines(&["a", "b", "c"], &["a"], &window);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].original_content.as_deref(), Some("c"));
    }

    #[test]
    fn streaming_depends_on_page_size() {
        let text = "0123456789\n".repeat(20);
        assert!(is_streaming(&text, &text, 0, 10, 150));
        assert!(!is_streaming(&text, &text, 0, 5, 150));
        assert!(!is_streaming(&text, &text, 99, 10, 0));
    }
}
