//! Error types for worker-comm operations.

use thiserror::Error;

use crate::Tag;

#[derive(Debug, Error)]
pub enum Error {
    #[error("rank {rank} is outside a world of {size} workers")]
    UnknownRank { rank: usize, size: usize },

    #[error("rank {rank} has left the world")]
    Disconnected { rank: usize },

    #[error("unexpected payload from rank {sender} on tag {tag}")]
    UnexpectedPayload { sender: usize, tag: Tag },

    #[error("expected {expected} values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("worker {rank} panicked")]
    WorkerPanicked { rank: usize },

    #[error("worker task was cancelled")]
    Cancelled,
}
