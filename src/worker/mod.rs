//! Background diffing for inputs too large for the synchronous path.
//!
//! A single worker thread is started on first use and serves requests in order. Clients talk to it
//! through [`WorkerClient`], which tags requests with ids, routes responses back to their callers
//! and cancels requests that time out.

mod client;
pub mod hash_diff;
pub mod paged;
pub mod protocol;
mod runner;

use std::time::Duration;

pub use self::{
    client::{PendingRequest, WorkerClient},
    hash_diff::{ChunkKind, WorkerStats},
    paged::PageWindow,
    protocol::{FullDiff, PagedChunk, PagedDiff, PartialDiff, Request, RequestId, Response},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerSettings {
    pub full_timeout: Duration,
    pub paged_timeout: Duration,
    /// Used instead of `paged_timeout` for pages that are streamed.
    pub streaming_timeout: Duration,
    /// Full diffs of more lines than this also send each rendered batch as it is done.
    pub partial_threshold_lines: usize,
    pub partial_batch_chunks: usize,
    /// Pages with more chars than this are rendered and sent in sub-chunks.
    pub stream_threshold_chars: usize,
    pub stream_chunk_lines: usize,
}

impl Default for WorkerSettings {
    fn default() -> WorkerSettings {
        WorkerSettings {
            full_timeout: Duration::from_secs(30),
            paged_timeout: Duration::from_secs(5),
            streaming_timeout: Duration::from_secs(60),
            partial_threshold_lines: 10_000,
            partial_batch_chunks: 1_000,
            stream_threshold_chars: 100_000,
            stream_chunk_lines: 50,
        }
    }
}
