//! HTML output for aligned lines.
//!
//! Every line becomes a `<div class="diff-line">`. Changed text is wrapped in spans carrying
//! `diff-added`/`diff-removed` in line mode and `inline-diff-added` in inline mode. Whitespace is
//! kept literally and preserved by the stylesheet; only blank lines get a `&nbsp;` placeholder,
//! wrapped in the marker span when the line was added or removed.

use std::borrow::Cow;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::algorithm::{
    align::{AlignedLine, LineType},
    char_diff::{diff_spans, DiffSpan, SpanOp},
    preprocess::is_blank,
};

pub const LINE_CLASS: &str = "diff-line";
pub const ADDED_CLASS: &str = "diff-added";
pub const REMOVED_CLASS: &str = "diff-removed";
pub const INLINE_ADDED_CLASS: &str = "inline-diff-added";
pub const BLANK_PLACEHOLDER: &str = "&nbsp;";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Deleted and inserted text are both shown.
    #[default]
    Line,
    /// Only the resulting text is shown, with insertions highlighted.
    Inline,
}

impl RenderMode {
    fn added_class(self) -> &'static str {
        match self {
            RenderMode::Line => ADDED_CLASS,
            RenderMode::Inline => INLINE_ADDED_CLASS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedLine {
    pub line_type: LineType,
    pub original_line_number: Option<usize>,
    pub modified_line_number: Option<usize>,
    pub html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedDiff {
    pub lines: Vec<RenderedLine>,
}

impl RenderedDiff {
    pub fn to_html(&self) -> String {
        join_lines(&self.lines)
    }
}

pub fn join_lines(lines: &[RenderedLine]) -> String {
    let mut html = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            html.push('\n');
        }
        html.push_str(&line.html);
    }
    html
}

/// Escapes `& < > " '`.
pub fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(text)
}

fn styled(class: &str, text: &str) -> String {
    format!("<span class=\"{class}\">{}</span>", escape(text))
}

fn styled_placeholder(class: &str) -> String {
    format!("<span class=\"{class}\">{BLANK_PLACEHOLDER}</span>")
}

fn line_div(inner: &str) -> String {
    format!("<div class=\"{LINE_CLASS}\">{inner}</div>")
}

/// Renders an edit script as the content of a single line.
pub fn render_spans(spans: &[DiffSpan], mode: RenderMode) -> String {
    let mut html = String::new();
    for span in spans {
        match (span.op, mode) {
            (SpanOp::Equal, _) => html.push_str(&escape(&span.text)),
            (SpanOp::Insert, _) => html.push_str(&styled(mode.added_class(), &span.text)),
            (SpanOp::Delete, RenderMode::Line) => html.push_str(&styled(REMOVED_CLASS, &span.text)),
            (SpanOp::Delete, RenderMode::Inline) => {}
        }
    }
    html
}

fn render_inner(line: &AlignedLine, mode: RenderMode) -> String {
    let original = line.original_content.as_deref().unwrap_or("");
    let modified = line.modified_content.as_deref().unwrap_or("");
    match line.line_type {
        LineType::Added if is_blank(modified) => styled_placeholder(mode.added_class()),
        LineType::Added => styled(mode.added_class(), modified),
        LineType::Removed => match mode {
            RenderMode::Line if is_blank(original) => styled_placeholder(REMOVED_CLASS),
            RenderMode::Line => styled(REMOVED_CLASS, original),
            RenderMode::Inline => BLANK_PLACEHOLDER.to_owned(),
        },
        _ if line.is_blank() => BLANK_PLACEHOLDER.to_owned(),
        LineType::Same => escape(if modified.is_empty() { original } else { modified }).into_owned(),
        LineType::Modified => {
            if original == modified || line.similarity.is_some_and(|similarity| similarity >= 1.0) {
                return escape(modified).into_owned();
            }
            let html = render_spans(&diff_spans(original, modified), mode);
            if html.is_empty() {
                BLANK_PLACEHOLDER.to_owned()
            } else {
                html
            }
        }
    }
}

pub fn render_line(line: &AlignedLine, mode: RenderMode) -> RenderedLine {
    RenderedLine {
        line_type: line.line_type,
        original_line_number: line.original_line_number,
        modified_line_number: line.modified_line_number,
        html: line_div(&render_inner(line, mode)),
    }
}

pub fn render(lines: &[AlignedLine], mode: RenderMode) -> RenderedDiff {
    RenderedDiff {
        lines: lines.iter().map(|line| render_line(line, mode)).collect(),
    }
}

pub const STYLESHEET: &str = "\
.diff-view { font-family: monospace; color: #202124; background: #ffffff; }
.diff-line { white-space: pre-wrap; min-height: 1.2em; }
.diff-added { background: #aaf2aa; }
.diff-removed { background: #ffcdd2; text-decoration: line-through; }
.inline-diff-added { background: #d8fed8; }
";

/// Wraps rendered lines in a standalone page with the default stylesheet.
pub fn render_document(body: &str, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{STYLESHEET}</style>\n</head>\n<body>\n<div class=\"diff-view\">\n{body}\n</div>\n</body>\n</html>\n",
        escape(title)
    )
}
