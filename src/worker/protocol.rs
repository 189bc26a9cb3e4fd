//! Messages exchanged with the diff worker thread.
//!
//! Every request carries a [`RequestId`] and every response echoes it, so several requests can be
//! in flight at once. All messages serialize to JSON objects tagged by `type`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{hash_diff::WorkerStats, paged::PageWindow};
use crate::{algorithm::align::DiffStats, render::RenderMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> RequestId {
        RequestId(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> RequestId {
        RequestId(uuid)
    }

    pub const fn inner(self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> RequestId {
        RequestId::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Request {
    /// Hash-based diff of the whole texts.
    Diff {
        id: RequestId,
        original_text: String,
        modified_text: String,
        #[serde(default)]
        diff_mode: RenderMode,
    },
    /// Positional diff of a single page of lines. Pages are numbered from 0.
    PagedDiff {
        id: RequestId,
        original_text: String,
        modified_text: String,
        page_number: usize,
        lines_per_page: usize,
        #[serde(default)]
        diff_mode: RenderMode,
    },
}

impl Request {
    pub fn id(&self) -> RequestId {
        match self {
            Request::Diff { id, .. } | Request::PagedDiff { id, .. } => *id,
        }
    }
}

/// One batch of a full diff, sent ahead of `complete` for large inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDiff {
    pub html: String,
    pub processed_chunks: usize,
    pub total_chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullDiff {
    pub html: String,
    pub stats: WorkerStats,
}

/// Lines `start_line..end_line` (0-based, in the whole text) of a page being streamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedChunk {
    pub html: String,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedDiff {
    pub html: String,
    pub window: PageWindow,
    pub stats: DiffStats,
    pub streamed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Response {
    /// Percentage in `0..=100`, non-decreasing within a request.
    Progress { id: RequestId, progress: u8 },
    Diff { id: RequestId, data: PartialDiff },
    Complete { id: RequestId, data: FullDiff },
    Error { id: RequestId, error: String },
    Cancelled { id: RequestId },
    PagedProgress { id: RequestId, progress: u8, data: PagedChunk },
    PagedComplete { id: RequestId, data: PagedDiff },
}

impl Response {
    pub fn id(&self) -> RequestId {
        match self {
            Response::Progress { id, .. }
            | Response::Diff { id, .. }
            | Response::Complete { id, .. }
            | Response::Error { id, .. }
            | Response::Cancelled { id }
            | Response::PagedProgress { id, .. }
            | Response::PagedComplete { id, .. } => *id,
        }
    }

    /// Whether this is the last response for its request.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Response::Complete { .. }
                | Response::Error { .. }
                | Response::Cancelled { .. }
                | Response::PagedComplete { .. }
        )
    }

    pub fn progress(&self) -> Option<u8> {
        match self {
            Response::Progress { progress, .. } | Response::PagedProgress { progress, .. } => Some(*progress),
            _ => None,
        }
    }

    /// The `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Response::Progress { .. } => "progress",
            Response::Diff { .. } => "diff",
            Response::Complete { .. } => "complete",
            Response::Error { .. } => "error",
            Response::Cancelled { .. } => "cancelled",
            Response::PagedProgress { .. } => "paged-progress",
            Response::PagedComplete { .. } => "paged-complete",
        }
    }
}
