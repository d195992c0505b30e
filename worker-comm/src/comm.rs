//! Point-to-point transfers between ranks.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::Error;
use crate::mailbox::{Envelope, Mailbox, Payload};

/// Message tag used to keep unrelated traffic apart.
///
/// Tags from `0xFF00` upward are reserved for the collective operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub u16);

impl Tag {
    pub(crate) const BARRIER: Tag = Tag(0xFF00);
    pub(crate) const SCATTER: Tag = Tag(0xFF01);
    pub(crate) const REDUCE: Tag = Tag(0xFF02);
    pub(crate) const BROADCAST: Tag = Tag(0xFF03);
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// One worker's handle on the world.
///
/// A `Comm` knows its own rank, the world size, and how to reach every other
/// rank. Messages sent to a rank are buffered in that rank's mailbox until it
/// asks for them, so sends never wait for the receiver.
pub struct Comm {
    rank: usize,
    peers: Arc<[UnboundedSender<Envelope>]>,
    mailbox: Arc<Mailbox>,
}

impl Comm {
    pub(crate) fn new(rank: usize, peers: Arc<[UnboundedSender<Envelope>]>, mailbox: Mailbox) -> Self {
        Self {
            rank,
            peers,
            mailbox: Arc::new(mailbox),
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.peers.len()
    }

    /// Starts sending a copy of `data` to `dest`.
    pub fn isend(&self, dest: usize, tag: Tag, data: &[f64]) -> SendRequest {
        SendRequest {
            outcome: self.post(dest, tag, Payload::Values(data.to_vec())),
        }
    }

    /// Starts receiving a message of `len` values from `source`.
    ///
    /// The receive runs in the background; `RecvRequest::wait` hands back the
    /// message buffer itself, so the data is copied only once, by the sender.
    /// A message of any other length fails with [`Error::SizeMismatch`].
    pub fn irecv(&self, source: usize, tag: Tag, len: usize) -> Result<RecvRequest, Error> {
        self.check_rank(source)?;
        let mailbox = Arc::clone(&self.mailbox);
        let rank = self.rank;

        let handle = tokio::spawn(async move {
            let values = mailbox.take(source, tag).await?.into_values(source, tag)?;
            if values.len() != len {
                return Err(Error::SizeMismatch {
                    expected: len,
                    actual: values.len(),
                });
            }
            trace!(rank, source, %tag, len, "receive complete");
            Ok(values)
        });

        Ok(RecvRequest {
            rank,
            handle: Some(handle),
        })
    }

    /// Sends `data` to `dest` and waits for the send to complete.
    pub async fn send(&self, dest: usize, tag: Tag, data: &[f64]) -> Result<(), Error> {
        self.isend(dest, tag, data).wait().await
    }

    /// Receives the next message from `source` with `tag`, whatever its length.
    pub async fn recv(&self, source: usize, tag: Tag) -> Result<Vec<f64>, Error> {
        self.check_rank(source)?;
        self.mailbox.take(source, tag).await?.into_values(source, tag)
    }

    pub(crate) fn post(&self, dest: usize, tag: Tag, payload: Payload) -> Result<(), Error> {
        let peer = self.peers.get(dest).ok_or(Error::UnknownRank {
            rank: dest,
            size: self.size(),
        })?;
        trace!(rank = self.rank, dest, %tag, "post");
        peer.send(Envelope {
            sender: self.rank,
            tag,
            payload,
        })
        .map_err(|_| Error::Disconnected { rank: dest })
    }

    pub(crate) async fn take(&self, source: usize, tag: Tag) -> Result<Payload, Error> {
        self.check_rank(source)?;
        self.mailbox.take(source, tag).await
    }

    fn check_rank(&self, rank: usize) -> Result<(), Error> {
        if rank < self.size() {
            Ok(())
        } else {
            Err(Error::UnknownRank {
                rank,
                size: self.size(),
            })
        }
    }
}

/// Pending send started by [`Comm::isend`].
#[must_use = "a send request must be waited on"]
pub struct SendRequest {
    outcome: Result<(), Error>,
}

impl SendRequest {
    pub async fn wait(self) -> Result<(), Error> {
        self.outcome
    }
}

/// Pending receive started by [`Comm::irecv`].
///
/// Dropping the request without waiting cancels the receive.
#[must_use = "a receive request must be waited on"]
pub struct RecvRequest {
    rank: usize,
    handle: Option<JoinHandle<Result<Vec<f64>, Error>>>,
}

impl RecvRequest {
    pub async fn wait(mut self) -> Result<Vec<f64>, Error> {
        let handle = self.handle.take().ok_or(Error::Cancelled)?;
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(Error::WorkerPanicked { rank: self.rank }),
            Err(_) => Err(Error::Cancelled),
        }
    }
}

impl Drop for RecvRequest {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::World;

    use super::*;

    #[tokio::test]
    async fn send_and_receive() {
        let mut comms = World::new(2).into_comms();
        let second = comms.pop().unwrap();
        let first = comms.pop().unwrap();

        first.send(1, Tag(3), &[1.0, 2.0, 3.0]).await.unwrap();
        let values = second.recv(0, Tag(3)).await.unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn irecv_returns_the_message() {
        let mut comms = World::new(2).into_comms();
        let second = comms.pop().unwrap();
        let first = comms.pop().unwrap();

        let request = second.irecv(0, Tag(1), 2).unwrap();
        first.isend(1, Tag(1), &[4.0, 5.0]).wait().await.unwrap();

        assert_eq!(request.wait().await.unwrap(), vec![4.0, 5.0]);
    }

    #[tokio::test]
    async fn irecv_rejects_wrong_length() {
        let mut comms = World::new(2).into_comms();
        let second = comms.pop().unwrap();
        let first = comms.pop().unwrap();

        first.send(1, Tag(1), &[1.0, 2.0, 3.0]).await.unwrap();
        let err = second
            .irecv(0, Tag(1), 2)
            .unwrap()
            .wait()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { expected: 2, actual: 3 }));
    }

    #[tokio::test]
    async fn ring_exchange_in_both_directions() {
        let comms = World::new(3).into_comms();

        let mut requests = Vec::new();
        for comm in &comms {
            let size = comm.size();
            let successor = (comm.rank() + 1) % size;
            let predecessor = (comm.rank() + size - 1) % size;
            let recv = comm.irecv(successor, Tag(9), 1).unwrap();
            let send = comm.isend(predecessor, Tag(9), &[comm.rank() as f64]);
            requests.push((send, recv));
        }

        for (rank, (send, recv)) in requests.into_iter().enumerate() {
            send.wait().await.unwrap();
            let got = recv.wait().await.unwrap();
            assert_eq!(got, vec![((rank + 1) % 3) as f64]);
        }
    }

    #[tokio::test]
    async fn unknown_rank_is_rejected() {
        let comms = World::new(2).into_comms();

        let err = comms[0].send(5, Tag(0), &[]).await.unwrap_err();
        assert!(matches!(err, Error::UnknownRank { rank: 5, size: 2 }));
        assert!(comms[0].irecv(2, Tag(0), 0).is_err());
    }

    #[tokio::test]
    async fn send_to_departed_rank_fails() {
        let mut comms = World::new(2).into_comms();
        drop(comms.pop());

        let err = comms[0].send(1, Tag(0), &[1.0]).await.unwrap_err();
        assert!(matches!(err, Error::Disconnected { rank: 1 }));
    }

    #[test]
    fn tag_display() {
        assert_eq!(Tag(2).to_string(), "0x0002");
        assert_eq!(Tag::BARRIER.to_string(), "0xff00");
    }
}
