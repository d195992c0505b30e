//! Creating a world of ranks and running a worker on each of them.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::mailbox::Mailbox;
use crate::{Comm, Error};

/// A fixed set of ranks `0..size` that can reach each other.
pub struct World {
    comms: Vec<Comm>,
}

impl World {
    pub fn new(size: usize) -> Self {
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..size).map(|_| mpsc::unbounded_channel()).unzip();
        let peers: Arc<[_]> = senders.into();

        let comms = receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| Comm::new(rank, Arc::clone(&peers), Mailbox::new(receiver)))
            .collect();

        Self { comms }
    }

    pub fn size(&self) -> usize {
        self.comms.len()
    }

    /// Hands out the per-rank handles, ordered by rank.
    pub fn into_comms(self) -> Vec<Comm> {
        self.comms
    }

    /// Runs `worker` once per rank, each on its own task.
    ///
    /// Results come back ordered by rank. The first worker to fail (or panic)
    /// aborts all the others, since the remaining ranks would otherwise wait
    /// forever on a peer that is gone.
    pub async fn run<F, Fut, T, E>(self, worker: F) -> Result<Vec<T>, E>
    where
        F: Fn(Comm) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<Error> + Send + 'static,
    {
        let size = self.size();
        let mut tasks = JoinSet::new();

        for comm in self.comms {
            let rank = comm.rank();
            let fut = worker(comm);
            tasks.spawn(async move { (rank, AssertUnwindSafe(fut).catch_unwind().await) });
        }

        let mut results: Vec<Option<T>> = (0..size).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok((rank, Ok(Ok(value)))) => {
                    debug!(rank, "worker finished");
                    results[rank] = Some(value);
                    continue;
                }
                Ok((rank, Ok(Err(e)))) => {
                    warn!(rank, "worker failed, aborting the world");
                    e
                }
                Ok((rank, Err(_panic))) => {
                    warn!(rank, "worker panicked, aborting the world");
                    E::from(Error::WorkerPanicked { rank })
                }
                Err(_) => E::from(Error::Cancelled),
            };
            tasks.abort_all();
            return Err(failure);
        }

        results
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| E::from(Error::Cancelled))
    }
}
