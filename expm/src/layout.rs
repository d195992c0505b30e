//! Row-block layout of a square matrix over a fixed number of workers.

use crate::ConfigError;

/// How an `order x order` matrix is split into equal row-blocks.
///
/// When `order` is not a multiple of the worker count the matrix is padded
/// with zero rows and columns up to the next multiple, so every worker owns a
/// `rows_per_worker x padded_order` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    order: usize,
    padded_order: usize,
    rows_per_worker: usize,
    workers: usize,
}

impl BlockLayout {
    pub fn new(order: usize, workers: usize) -> Result<Self, ConfigError> {
        if workers < 1 {
            return Err(ConfigError::InvalidWorkers);
        }
        if order < 1 {
            return Err(ConfigError::InvalidOrder);
        }
        if order < workers {
            return Err(ConfigError::OrderBelowWorkers { order, workers });
        }

        let padded_order = if order % workers == 0 {
            order
        } else {
            (order / workers + 1) * workers
        };

        Ok(Self {
            order,
            padded_order,
            rows_per_worker: padded_order / workers,
            workers,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn padded_order(&self) -> usize {
        self.padded_order
    }

    pub fn rows_per_worker(&self) -> usize {
        self.rows_per_worker
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_padded(&self) -> bool {
        self.padded_order != self.order
    }

    /// Global index of the first row owned by `rank`.
    pub fn row_start(&self, rank: usize) -> usize {
        rank * self.rows_per_worker
    }

    /// Number of values in one row-block.
    pub fn block_len(&self) -> usize {
        self.rows_per_worker * self.padded_order
    }
}
