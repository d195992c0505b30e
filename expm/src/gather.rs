//! Reassembling the distributed sum on the coordinator.

use tracing::debug;
use worker_comm::{Comm, Tag};

use crate::layout::BlockLayout;
use crate::matrix::Matrix;
use crate::{COORDINATOR, Error};

pub const FINAL_SUM_TAG: Tag = Tag(2);

/// Collects every worker's row-block of `local` on the coordinator.
///
/// Returns the unpadded `order x order` matrix on the coordinator and `None`
/// on every other rank. A block of the wrong length means the workers were
/// not started with the same layout and fails the run.
pub async fn gather(comm: &Comm, local: Matrix, layout: &BlockLayout) -> Result<Option<Matrix>, Error> {
    if comm.rank() != COORDINATOR {
        comm.send(COORDINATOR, FINAL_SUM_TAG, local.as_slice()).await?;
        return Ok(None);
    }

    let order = layout.padded_order();
    let mut full = Matrix::zeros(order, order);
    full.copy_rows_from(&local, layout.row_start(COORDINATOR));
    drop(local);

    for rank in (0..comm.size()).filter(|&r| r != COORDINATOR) {
        let values = comm.recv(rank, FINAL_SUM_TAG).await?;
        if values.len() != layout.block_len() {
            return Err(Error::BlockSize {
                rank,
                expected: layout.block_len(),
                actual: values.len(),
            });
        }
        let block = Matrix::from_vec(layout.rows_per_worker(), order, values)?;
        full.copy_rows_from(&block, layout.row_start(rank));
    }

    if !layout.is_padded() {
        return Ok(Some(full));
    }

    debug!(order = layout.order(), padded = order, "trimming padding");
    Ok(Some(full.submatrix(0, 0, layout.order(), layout.order())))
}
