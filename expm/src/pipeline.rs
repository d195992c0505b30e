//! Ring-pipelined Taylor iteration.
//!
//! Every worker keeps its row-block of A in place for the whole run. To form
//! the next power `A * M`, the row-blocks of M travel around the ring: at each
//! rotation step a worker sends the block it holds to its predecessor,
//! receives the next one from its successor, and while the transfer is in
//! flight multiplies the part of its A-block that meets the block it holds.
//! After `size` steps every worker has seen every block of M exactly once and
//! holds its own rows of `A * M`.

use std::mem;
use std::sync::Arc;

use futures_util::future::try_join;
use tracing::{debug, trace};
use worker_comm::{Comm, Tag};

use crate::Error;
use crate::kernel::Kernel;
use crate::layout::BlockLayout;
use crate::matrix::Matrix;

pub const RING_TAG: Tag = Tag(1);

/// Block indices a worker holds at each rotation step of one term.
pub fn ring_schedule(rank: usize, size: usize) -> impl Iterator<Item = usize> {
    (0..size).map(move |step| (rank + step) % size)
}

/// Per-worker state of the Taylor series.
///
/// `power` is this worker's rows of the newest term `A^k / k!`, `sum` its rows
/// of the partial sum. `product` is a scratch buffer kept alive across terms.
/// Buffers change roles by swapping or moving, never by copying; a received
/// block replaces `power` as is.
pub struct TaylorWorker<'a> {
    comm: &'a Comm,
    layout: BlockLayout,
    kernel: Kernel,
    a: Arc<Matrix>,
    power: Matrix,
    product: Matrix,
    sum: Matrix,
    k: u64,
}

impl<'a> TaylorWorker<'a> {
    /// Starts from `M = A` and `S = I + A` for this worker's rows.
    pub fn new(comm: &'a Comm, layout: BlockLayout, kernel: Kernel, a_block: Matrix) -> Self {
        let rows = layout.rows_per_worker();
        let cols = layout.padded_order();
        assert_eq!(
            (a_block.rows(), a_block.cols()),
            (rows, cols),
            "A-block does not match the layout"
        );

        let power = a_block.clone();
        let mut sum = Matrix::identity_block(rows, cols, layout.row_start(comm.rank()));
        sum += &power;

        Self {
            comm,
            layout,
            kernel,
            a: Arc::new(a_block),
            power,
            product: Matrix::zeros(rows, cols),
            sum,
            k: 2,
        }
    }

    /// Index of the next term to be computed.
    pub fn next_index(&self) -> u64 {
        self.k
    }

    /// This worker's rows of the newest term.
    pub fn term(&self) -> &Matrix {
        &self.power
    }

    pub fn into_sum(self) -> Matrix {
        self.sum
    }

    /// Computes `M_k = A * M_{k-1} / k` and adds it to the sum.
    pub async fn advance(&mut self) -> Result<(), Error> {
        self.multiply_ring().await?;

        mem::swap(&mut self.power, &mut self.product);
        self.power.divide_by(self.k);
        self.sum += &self.power;

        debug!(rank = self.comm.rank(), k = self.k, "term added");
        self.k += 1;
        Ok(())
    }

    /// Leaves this worker's rows of `A * M` in `product`.
    pub async fn multiply_ring(&mut self) -> Result<(), Error> {
        let rank = self.comm.rank();
        let size = self.comm.size();
        let predecessor = (rank + size - 1) % size;
        let successor = (rank + 1) % size;

        self.product.fill_zero();

        for (step, owner) in ring_schedule(rank, size).enumerate() {
            let transfer = if step + 1 < size {
                let recv = self.comm.irecv(successor, RING_TAG, self.layout.block_len())?;
                let send = self.comm.isend(predecessor, RING_TAG, self.power.as_slice());
                Some((send, recv))
            } else {
                None
            };

            trace!(rank, step, owner, "multiplying held block");
            self.accumulate_block(owner).await?;

            if let Some((send, recv)) = transfer {
                let ((), received) = try_join(send.wait(), recv.wait()).await?;
                self.power = Matrix::from_vec(
                    self.layout.rows_per_worker(),
                    self.layout.padded_order(),
                    received,
                )?;
            }
        }

        Ok(())
    }

    /// `product += A[:, rows of block owner] * power`, off the async threads.
    async fn accumulate_block(&mut self, owner: usize) -> Result<(), Error> {
        let a = Arc::clone(&self.a);
        let kernel = self.kernel;
        let column = self.layout.row_start(owner);
        let power = mem::take(&mut self.power);
        let mut product = mem::take(&mut self.product);

        let (power, product) = tokio::task::spawn_blocking(move || {
            kernel.multiply_accumulate_columns(&a, column, &power, &mut product);
            (power, product)
        })
        .await?;

        self.power = power;
        self.product = product;
        Ok(())
    }
}
