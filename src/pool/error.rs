//! Batch pool error taxonomy (§7 of the design).

use thiserror::Error;

/// Every way a [`BatchPool`](crate::pool::BatchPool) operation can fail.
/// The pool never retries a failed worker: a `Failed` pool is replaced by
/// `shutdown` + `init`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("graph spec is invalid: {0}")]
    GraphInvalid(String),

    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    #[error("pool is not ready")]
    NotReady,

    #[error("a batch is already in flight")]
    InFlight,

    #[error("worker {0} did not respond within the timeout")]
    WorkerTimeout(usize),

    #[error("worker {0} crashed: {1}")]
    WorkerCrash(usize, String),

    #[error("pool is shutting down")]
    Shutdown,
}
