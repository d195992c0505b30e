//! Collective operations built on point-to-point transfers.
//!
//! Every rank in the world must enter the same collective with the same root,
//! otherwise the world stalls.

use tracing::trace;

use crate::mailbox::Payload;
use crate::{Comm, Error, Tag};

impl Comm {
    /// Returns once every rank has entered the barrier.
    pub async fn barrier(&self) -> Result<(), Error> {
        const ROOT: usize = 0;

        if self.rank() == ROOT {
            for rank in 1..self.size() {
                self.take(rank, Tag::BARRIER)
                    .await?
                    .into_signal(rank, Tag::BARRIER)?;
            }
            for rank in 1..self.size() {
                self.post(rank, Tag::BARRIER, Payload::Signal)?;
            }
        } else {
            self.post(ROOT, Tag::BARRIER, Payload::Signal)?;
            self.take(ROOT, Tag::BARRIER)
                .await?
                .into_signal(ROOT, Tag::BARRIER)?;
        }

        trace!(rank = self.rank(), "barrier passed");
        Ok(())
    }

    /// Splits `data` on `root` into `size` consecutive blocks of `block_len`
    /// values and hands block `r` to rank `r`.
    ///
    /// Only the root's `data` is read; other ranks pass `None`.
    pub async fn scatter(
        &self,
        root: usize,
        data: Option<&[f64]>,
        block_len: usize,
    ) -> Result<Vec<f64>, Error> {
        if self.rank() != root {
            let block = self
                .take(root, Tag::SCATTER)
                .await?
                .into_values(root, Tag::SCATTER)?;
            if block.len() != block_len {
                return Err(Error::SizeMismatch {
                    expected: block_len,
                    actual: block.len(),
                });
            }
            return Ok(block);
        }

        let expected = block_len * self.size();
        let data = data.unwrap_or_default();
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        let mut own = Vec::new();
        for (rank, block) in data.chunks(block_len.max(1)).enumerate() {
            if rank == root {
                own = block.to_vec();
            } else {
                self.post(rank, Tag::SCATTER, Payload::Values(block.to_vec()))?;
            }
        }

        trace!(root, block_len, "scatter sent");
        Ok(own)
    }

    /// Reduces `value` from every rank to its maximum on `root`.
    ///
    /// Returns `Some(max)` on the root and `None` elsewhere.
    pub async fn reduce_max(&self, root: usize, value: f64) -> Result<Option<f64>, Error> {
        if self.rank() != root {
            self.post(root, Tag::REDUCE, Payload::Scalar(value))?;
            return Ok(None);
        }

        let mut max = value;
        for rank in (0..self.size()).filter(|&r| r != root) {
            let other = self
                .take(rank, Tag::REDUCE)
                .await?
                .into_scalar(rank, Tag::REDUCE)?;
            max = max.max(other);
        }
        Ok(Some(max))
    }

    /// Delivers the root's `flag` to every rank; non-root values are ignored.
    pub async fn broadcast_flag(&self, root: usize, flag: bool) -> Result<bool, Error> {
        if self.rank() != root {
            return self
                .take(root, Tag::BROADCAST)
                .await?
                .into_flag(root, Tag::BROADCAST);
        }

        for rank in (0..self.size()).filter(|&r| r != root) {
            self.post(rank, Tag::BROADCAST, Payload::Flag(flag))?;
        }
        Ok(flag)
    }
}

#[cfg(test)]
mod tests {
    use crate::World;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn scatter_hands_out_blocks_in_rank_order() {
        let data: Vec<f64> = (0..8).map(|v| v as f64).collect();

        let blocks = World::new(4)
            .run(move |comm| {
                let data = data.clone();
                async move {
                    let source = (comm.rank() == 0).then_some(data.as_slice());
                    comm.scatter(0, source, 2).await
                }
            })
            .await
            .unwrap();

        assert_eq!(
            blocks,
            vec![
                vec![0.0, 1.0],
                vec![2.0, 3.0],
                vec![4.0, 5.0],
                vec![6.0, 7.0],
            ]
        );
    }

    #[tokio::test]
    async fn scatter_rejects_short_buffer() {
        let comms = World::new(2).into_comms();

        let err = comms[0].scatter(0, Some(&[1.0, 2.0, 3.0]), 2).await.unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { expected: 4, actual: 3 }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn reduce_max_reaches_root_only() {
        let results = World::new(3)
            .run(|comm| async move {
                let value = [0.5, -7.0, 2.25][comm.rank()];
                comm.reduce_max(0, value).await
            })
            .await
            .unwrap();

        assert_eq!(results, vec![Some(2.25), None, None]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn broadcast_overrides_local_flags() {
        let results = World::new(3)
            .run(|comm| async move {
                let local = comm.rank() != 0;
                comm.broadcast_flag(0, local).await
            })
            .await
            .unwrap();

        assert_eq!(results, vec![false, false, false]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn consecutive_barriers_do_not_mix() {
        let results = World::new(4)
            .run(|comm| async move {
                for _ in 0..3 {
                    comm.barrier().await?;
                }
                Ok::<_, Error>(comm.rank())
            })
            .await
            .unwrap();

        assert_eq!(results, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn single_rank_collectives_are_local() {
        let comms = World::new(1).into_comms();
        let comm = &comms[0];

        comm.barrier().await.unwrap();
        assert_eq!(comm.scatter(0, Some(&[1.0, 2.0]), 2).await.unwrap(), vec![1.0, 2.0]);
        assert_eq!(comm.reduce_max(0, 3.0).await.unwrap(), Some(3.0));
        assert!(comm.broadcast_flag(0, true).await.unwrap());
    }
}
