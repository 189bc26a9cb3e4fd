use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The worker did not finish in time. The request is cancelled when this is returned.
    #[error("diff request timed out after {0:?} (처리 시간 초과)")]
    Timeout(Duration),
    #[error("diff worker failed: {0}")]
    Failed(String),
    #[error("diff request was cancelled")]
    Cancelled,
    #[error("diff worker is not running")]
    Disconnected,
    #[error("unexpected `{0}` response from the diff worker")]
    UnexpectedResponse(&'static str),
}
