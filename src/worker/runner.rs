//! The worker thread: takes requests one at a time and answers each with a stream of responses.

use std::{
    cell::Cell,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, Sender},
        Arc,
    },
};

use tracing::{debug, warn};

use super::{
    hash_diff::{diff_chunks, Chunk, HashIndex, WorkerStats, CHECKPOINT_INTERVAL},
    paged::{page_window, positional_lines, window_chars},
    protocol::{FullDiff, PagedChunk, PagedDiff, PartialDiff, Request, RequestId, Response},
    WorkerSettings,
};
use crate::{
    algorithm::{
        align::{AlignedLine, DiffStats},
        preprocess::split_line_strs,
    },
    render::{render, RenderMode},
};

/// A request together with the flag its client sets to cancel it.
pub(crate) struct Envelope {
    pub request: Request,
    pub cancel: Arc<AtomicBool>,
}

enum Failure {
    Cancelled,
    Error(String),
}

struct RequestContext<'a> {
    id: RequestId,
    cancel: &'a AtomicBool,
    responses: &'a Sender<Response>,
    last_progress: Cell<Option<u8>>,
}

impl RequestContext<'_> {
    fn check(&self) -> Result<(), Failure> {
        if self.cancel.load(Ordering::Relaxed) {
            Err(Failure::Cancelled)
        } else {
            Ok(())
        }
    }

    fn send(&self, response: Response) {
        // A closed channel means the client is gone; the request loop ends on its own.
        let _ = self.responses.send(response);
    }

    /// Clamps `progress` so that it never decreases, and reports it if it grew.
    fn advance(&self, progress: usize) -> Option<u8> {
        let progress = progress.min(100) as u8;
        match self.last_progress.get() {
            Some(last) if progress <= last => None,
            _ => {
                self.last_progress.set(Some(progress));
                Some(progress)
            }
        }
    }

    fn progress(&self, progress: usize) {
        if let Some(progress) = self.advance(progress) {
            self.send(Response::Progress { id: self.id, progress });
        }
    }

    fn current_progress(&self) -> u8 {
        self.last_progress.get().unwrap_or(0)
    }
}

pub(crate) fn run(requests: Receiver<Envelope>, responses: Sender<Response>, settings: WorkerSettings) {
    for Envelope { request, cancel } in requests {
        let ctx = RequestContext {
            id: request.id(),
            cancel: &cancel,
            responses: &responses,
            last_progress: Cell::new(None),
        };
        let outcome = match ctx.check() {
            Err(failure) => Err(failure),
            Ok(()) => catch_unwind(AssertUnwindSafe(|| handle(&ctx, &settings, request)))
                .unwrap_or_else(|panic| Err(Failure::Error(panic_message(panic.as_ref())))),
        };
        let response = match outcome {
            Ok(response) => response,
            Err(Failure::Cancelled) => {
                debug!(id = %ctx.id, "request cancelled");
                Response::Cancelled { id: ctx.id }
            }
            Err(Failure::Error(error)) => {
                warn!(id = %ctx.id, %error, "request failed");
                Response::Error { id: ctx.id, error }
            }
        };
        if responses.send(response).is_err() {
            break;
        }
    }
    debug!("diff worker exiting");
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "diff worker panicked".to_owned()
    }
}

fn handle(ctx: &RequestContext, settings: &WorkerSettings, request: Request) -> Result<Response, Failure> {
    match request {
        Request::Diff {
            original_text,
            modified_text,
            diff_mode,
            ..
        } => full_diff(ctx, settings, &original_text, &modified_text, diff_mode),
        Request::PagedDiff {
            original_text,
            modified_text,
            page_number,
            lines_per_page,
            diff_mode,
            ..
        } => paged_diff(
            ctx,
            settings,
            &original_text,
            &modified_text,
            page_number,
            lines_per_page,
            diff_mode,
        ),
    }
}

/// Renders `chunks`, calling `checkpoint` before every [`CHECKPOINT_INTERVAL`] lines, so one huge
/// chunk cannot outlive a cancellation.
fn render_chunks(
    chunks: &[Chunk],
    mode: RenderMode,
    mut checkpoint: impl FnMut() -> Result<(), Failure>,
) -> Result<String, Failure> {
    let lines: Vec<AlignedLine> = chunks.iter().flat_map(Chunk::aligned_lines).collect();
    let mut html = String::new();
    for piece in lines.chunks(CHECKPOINT_INTERVAL) {
        checkpoint()?;
        if !html.is_empty() {
            html.push('\n');
        }
        html.push_str(&render(piece, mode).to_html());
    }
    Ok(html)
}

fn full_diff(
    ctx: &RequestContext,
    settings: &WorkerSettings,
    original_text: &str,
    modified_text: &str,
    mode: RenderMode,
) -> Result<Response, Failure> {
    ctx.progress(0);
    let original = split_line_strs(original_text);
    let modified = split_line_strs(modified_text);
    let total_lines = original.len() + modified.len();
    ctx.progress(10);

    let index = HashIndex::build(&modified);
    ctx.check()?;
    ctx.progress(30);

    let chunks = diff_chunks(&original, &modified, &index, |done| -> Result<(), Failure> {
        ctx.check()?;
        ctx.progress(30 + 30 * done / original.len().max(1));
        Ok(())
    })?;
    ctx.progress(60);

    let send_partials = total_lines > settings.partial_threshold_lines;
    let batch_size = settings.partial_batch_chunks.max(1);
    let mut html = String::new();
    let mut processed = 0;
    for batch in chunks.chunks(batch_size) {
        let part = render_chunks(batch, mode, || ctx.check())?;
        processed += batch.len();
        if !html.is_empty() {
            html.push('\n');
        }
        html.push_str(&part);
        if send_partials {
            ctx.send(Response::Diff {
                id: ctx.id,
                data: PartialDiff {
                    html: part,
                    processed_chunks: processed,
                    total_chunks: chunks.len(),
                },
            });
        }
        ctx.progress(60 + 39 * processed / chunks.len());
    }

    let stats = WorkerStats::new(&chunks, total_lines);
    debug!(id = %ctx.id, ?stats, "full diff done");
    Ok(Response::Complete {
        id: ctx.id,
        data: FullDiff { html, stats },
    })
}

fn paged_diff(
    ctx: &RequestContext,
    settings: &WorkerSettings,
    original_text: &str,
    modified_text: &str,
    page_number: usize,
    lines_per_page: usize,
    mode: RenderMode,
) -> Result<Response, Failure> {
    let original = split_line_strs(original_text);
    let modified = split_line_strs(modified_text);
    let window = page_window(original.len(), modified.len(), page_number, lines_per_page).map_err(Failure::Error)?;
    let lines = positional_lines(&original, &modified, &window);
    let stats = DiffStats::from_lines(&lines);
    let streamed = window_chars(&original, &modified, &window) > settings.stream_threshold_chars;

    let html = if streamed {
        let sub_chunk = settings.stream_chunk_lines.max(1);
        let mut parts = Vec::with_capacity(lines.len().div_ceil(sub_chunk));
        let mut done = 0;
        for part in lines.chunks(sub_chunk) {
            ctx.check()?;
            let html = render(part, mode).to_html();
            let start_line = window.start + done;
            done += part.len();
            let progress = ctx.advance(100 * done / lines.len()).unwrap_or_else(|| ctx.current_progress());
            ctx.send(Response::PagedProgress {
                id: ctx.id,
                progress,
                data: PagedChunk {
                    html: html.clone(),
                    start_line,
                    end_line: window.start + done,
                },
            });
            parts.push(html);
        }
        parts.join("\n")
    } else {
        render(&lines, mode).to_html()
    };

    debug!(id = %ctx.id, page = page_number, streamed, "paged diff done");
    Ok(Response::PagedComplete {
        id: ctx.id,
        data: PagedDiff {
            html,
            window,
            stats,
            streamed,
        },
    })
}
