//! Scattering row-blocks of A from the coordinator.

use std::borrow::Cow;

use tracing::debug;
use worker_comm::Comm;

use crate::layout::BlockLayout;
use crate::matrix::Matrix;
use crate::{COORDINATOR, Error};

/// Hands every worker its row-block of A.
///
/// Only the coordinator passes `global`; it is zero-padded to the layout's
/// padded order first when needed. Every rank, the coordinator included,
/// returns a `rows_per_worker x padded_order` block.
pub async fn distribute(
    comm: &Comm,
    global: Option<&Matrix>,
    layout: &BlockLayout,
) -> Result<Matrix, Error> {
    let source = match global {
        Some(a) if comm.rank() == COORDINATOR => {
            assert_eq!(
                (a.rows(), a.cols()),
                (layout.order(), layout.order()),
                "matrix does not match the layout"
            );
            if layout.is_padded() {
                debug!(
                    order = layout.order(),
                    padded = layout.padded_order(),
                    "padding matrix with zeros"
                );
                Some(Cow::Owned(a.padded(layout.padded_order())))
            } else {
                Some(Cow::Borrowed(a))
            }
        }
        _ => None,
    };

    let block = comm
        .scatter(
            COORDINATOR,
            source.as_deref().map(Matrix::as_slice),
            layout.block_len(),
        )
        .await?;

    Matrix::from_vec(layout.rows_per_worker(), layout.padded_order(), block)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use worker_comm::World;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 3)]
    async fn blocks_cover_the_padded_matrix() {
        let a = Arc::new(Matrix::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ])
        .unwrap());
        let layout = BlockLayout::new(3, 2).unwrap();

        let blocks = World::new(2)
            .run(move |comm| {
                let a = Arc::clone(&a);
                async move { distribute(&comm, Some(a.as_ref()), &layout).await }
            })
            .await
            .unwrap();

        assert_eq!(
            blocks[0].as_slice(),
            &[1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0]
        );
        assert_eq!(
            blocks[1].as_slice(),
            &[7.0, 8.0, 9.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 3)]
    async fn unpadded_matrix_is_split_as_is() {
        let a = Arc::new(Matrix::random(6, 5));
        let layout = BlockLayout::new(6, 3).unwrap();
        let expected = Arc::clone(&a);

        let blocks = World::new(3)
            .run(move |comm| {
                let a = Arc::clone(&a);
                async move {
                    let global = (comm.rank() == COORDINATOR).then_some(a.as_ref());
                    distribute(&comm, global, &layout).await
                }
            })
            .await
            .unwrap();

        for (rank, block) in blocks.iter().enumerate() {
            assert_eq!(*block, expected.submatrix(rank * 2, 0, 2, 6));
        }
    }
}
