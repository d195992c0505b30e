//! Error types for expm operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("communication error: {0}")]
    Comm(#[from] worker_comm::Error),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("block from rank {rank} has {actual} values, expected {expected}")]
    BlockSize {
        rank: usize,
        expected: usize,
        actual: usize,
    },

    #[error("matrix is {rows}x{cols}, expected a square matrix")]
    NotSquare { rows: usize, cols: usize },

    #[error("{len} values cannot form a {rows}x{cols} matrix")]
    Shape { rows: usize, cols: usize, len: usize },

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("coordinator finished without a result")]
    MissingResult,
}

/// Problems with the run parameters, detected before any work is distributed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Required arguments missing.")]
    MissingArguments,

    #[error("Missing required option {0}")]
    MissingOption(&'static str),

    #[error("Option {0} requires a value")]
    MissingValue(String),

    #[error("Unknown option {0}")]
    UnknownOption(String),

    #[error("Invalid seed value. Seed must be greater than 0")]
    InvalidSeed,

    #[error("Invalid n value. N is the dimension of the matrix. Must be > 0.")]
    InvalidOrder,

    #[error("Invalid output filename!")]
    InvalidOutput,

    #[error("Invalid worker count. Must be > 0.")]
    InvalidWorkers,

    #[error("Invalid cache size. Must be > 0.")]
    InvalidCacheElements,

    #[error("Matrix order {order} is smaller than the number of workers {workers}")]
    OrderBelowWorkers { order: usize, workers: usize },
}
