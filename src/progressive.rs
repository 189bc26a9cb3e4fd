//! Consumers that hand out a diff a piece at a time.

use std::ops::Range;

use crate::{
    algorithm::{align::AlignedLine, preprocess::count_lines},
    error::WorkerError,
    render::{render, RenderMode, RenderedLine},
    worker::{paged::page_window, PagedDiff, Response, WorkerClient},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChunk {
    /// Aligned line indices covered by the chunk.
    pub range: Range<usize>,
    pub lines: Vec<RenderedLine>,
    /// Fraction of all lines rendered so far, in `0.0..=1.0`.
    pub progress: f64,
}

impl RenderedChunk {
    pub fn to_html(&self) -> String {
        crate::render::join_lines(&self.lines)
    }
}

/// Renders aligned lines in chunks of a fixed size, so that large alignments can be shown as they
/// are produced, or only around the visible part of the view.
pub struct VirtualRenderer<'a> {
    lines: &'a [AlignedLine],
    mode: RenderMode,
    chunk_size: usize,
    position: usize,
}

impl<'a> VirtualRenderer<'a> {
    pub fn new(lines: &'a [AlignedLine], mode: RenderMode, chunk_size: usize) -> VirtualRenderer<'a> {
        VirtualRenderer {
            lines,
            mode,
            chunk_size: chunk_size.max(1),
            position: 0,
        }
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.lines.len().div_ceil(self.chunk_size)
    }

    /// Renders the lines in `range`, clamped to the alignment.
    pub fn render_range(&self, range: Range<usize>) -> RenderedChunk {
        let end = range.end.min(self.lines.len());
        let start = range.start.min(end);
        RenderedChunk {
            range: start..end,
            lines: render(&self.lines[start..end], self.mode).lines,
            progress: if self.lines.is_empty() {
                1.0
            } else {
                end as f64 / self.lines.len() as f64
            },
        }
    }

    /// The lines visible in a viewport of `height` lines starting at `top`, plus one chunk of
    /// margin on either side.
    pub fn render_viewport(&self, top: usize, height: usize) -> RenderedChunk {
        let start = top.saturating_sub(self.chunk_size);
        self.render_range(start..top.saturating_add(height).saturating_add(self.chunk_size))
    }
}

impl Iterator for VirtualRenderer<'_> {
    type Item = RenderedChunk;

    fn next(&mut self) -> Option<RenderedChunk> {
        if self.position >= self.lines.len() {
            return None;
        }
        let chunk = self.render_range(self.position..self.position + self.chunk_size);
        self.position = chunk.range.end;
        Some(chunk)
    }
}

/// Walks through the pages of a paged diff computed by the worker.
pub struct PagedController<'w> {
    client: &'w WorkerClient,
    original: String,
    modified: String,
    lines_per_page: usize,
    mode: RenderMode,
    total_pages: usize,
    current: Option<PagedDiff>,
}

impl<'w> PagedController<'w> {
    pub fn new(
        client: &'w WorkerClient,
        original: String,
        modified: String,
        lines_per_page: usize,
        mode: RenderMode,
    ) -> PagedController<'w> {
        let total_pages = page_window(count_lines(&original), count_lines(&modified), 0, lines_per_page)
            .map_or(0, |window| window.total_pages);
        PagedController {
            client,
            original,
            modified,
            lines_per_page,
            mode,
            total_pages,
            current: None,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn current(&self) -> Option<&PagedDiff> {
        self.current.as_ref()
    }

    pub fn load(&mut self, page_number: usize, on_event: impl FnMut(&Response)) -> Result<&PagedDiff, WorkerError> {
        let page = self.client.paged_diff(
            &self.original,
            &self.modified,
            page_number,
            self.lines_per_page,
            self.mode,
            on_event,
        )?;
        Ok(&*self.current.insert(page))
    }

    /// Loads the page after the current one, or the first page. `None` past the last page.
    pub fn next_page(&mut self, on_event: impl FnMut(&Response)) -> Result<Option<&PagedDiff>, WorkerError> {
        let next = self.current.as_ref().map_or(0, |page| page.window.page_number + 1);
        if next >= self.total_pages {
            return Ok(None);
        }
        self.load(next, on_event).map(Some)
    }

    /// `None` on the first page or before any page was loaded.
    pub fn previous_page(&mut self, on_event: impl FnMut(&Response)) -> Result<Option<&PagedDiff>, WorkerError> {
        match self.current.as_ref().map(|page| page.window.page_number) {
            Some(current) if current > 0 => self.load(current - 1, on_event).map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algorithm::{align::build_aligned_lines, matcher::LineMatcher, preprocess::split_lines};

    fn aligned(original: &str, modified: &str) -> Vec<AlignedLine> {
        let (original, modified) = (split_lines(original), split_lines(modified));
        let matches = LineMatcher::smart().match_lines(&original, &modified);
        build_aligned_lines(&original, &modified, &matches)
    }

    #[test]
    fn chunks_cover_all_lines() {
        let text: String = (0..25).map(|i| format!("line {i}\n")).collect();
        let lines = aligned(&text, &text);
        let renderer = VirtualRenderer::new(&lines, RenderMode::Line, 10);
        assert_eq!(renderer.chunk_count(), 3);
        let chunks: Vec<_> = renderer.collect();
        let ranges: Vec<_> = chunks.iter().map(|chunk| chunk.range.clone()).collect();
        assert_eq!(ranges, [0..10, 10..20, 20..26]);
        assert_eq!(chunks[2].progress, 1.0);
        let joined: Vec<String> = chunks.iter().map(RenderedChunk::to_html).collect();
        assert_eq!(joined.join("\n"), render(&lines, RenderMode::Line).to_html());
    }

    #[test]
    fn viewport_has_margins() {
        let text: String = (0..100).map(|i| format!("{i}\n")).collect();
        let lines = aligned(&text, &text);
        let renderer = VirtualRenderer::new(&lines, RenderMode::Line, 10);
        assert_eq!(renderer.render_viewport(50, 20).range, 40..80);
        assert_eq!(renderer.render_viewport(0, 20).range, 0..30);
        assert_eq!(renderer.render_viewport(95, 20).range, 85..101);
    }

    #[test]
    fn zero_chunk_size_is_one() {
        let lines = aligned("a\nb", "a\nb");
        assert_eq!(VirtualRenderer::new(&lines, RenderMode::Inline, 0).count(), 2);
    }
}
