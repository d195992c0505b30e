//! Per-rank inbox that matches messages by sender and tag.

use std::collections::VecDeque;
use std::sync::{Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex, mpsc};
use tracing::trace;

use crate::{Error, Tag};

/// Message body carried between ranks.
#[derive(Debug)]
pub(crate) enum Payload {
    Values(Vec<f64>),
    Scalar(f64),
    Flag(bool),
    Signal,
}

#[derive(Debug)]
pub(crate) struct Envelope {
    pub sender: usize,
    pub tag: Tag,
    pub payload: Payload,
}

/// Messages that arrive before anyone asks for them are parked in `pending`
/// and handed out oldest first, so two messages with the same sender and tag
/// are never reordered.
///
/// Only one take at a time reads from the channel. The channel lock is
/// released after every message, and `pending` is checked before and after
/// acquiring it, so a take whose message is already parked never waits behind
/// a take that is still waiting for its own.
pub(crate) struct Mailbox {
    receiver: Mutex<mpsc::UnboundedReceiver<Envelope>>,
    pending: StdMutex<VecDeque<Envelope>>,
}

impl Mailbox {
    pub fn new(receiver: mpsc::UnboundedReceiver<Envelope>) -> Self {
        Self {
            receiver: Mutex::new(receiver),
            pending: StdMutex::new(VecDeque::new()),
        }
    }

    /// Waits for the oldest message from `sender` carrying `tag`.
    pub async fn take(&self, sender: usize, tag: Tag) -> Result<Payload, Error> {
        loop {
            if let Some(payload) = self.take_parked(sender, tag) {
                return Ok(payload);
            }

            let mut receiver = self.receiver.lock().await;
            // another take may have parked our message while we waited
            if let Some(payload) = self.take_parked(sender, tag) {
                return Ok(payload);
            }

            match receiver.recv().await {
                Some(envelope) if envelope.sender == sender && envelope.tag == tag => {
                    return Ok(envelope.payload);
                }
                Some(envelope) => {
                    trace!(sender = envelope.sender, tag = %envelope.tag, "parking message");
                    self.parked().push_back(envelope);
                }
                None => return Err(Error::Disconnected { rank: sender }),
            }
        }
    }

    fn take_parked(&self, sender: usize, tag: Tag) -> Option<Payload> {
        let mut pending = self.parked();
        let pos = pending
            .iter()
            .position(|e| e.sender == sender && e.tag == tag)?;
        pending.remove(pos).map(|envelope| envelope.payload)
    }

    fn parked(&self) -> MutexGuard<'_, VecDeque<Envelope>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Payload {
    pub fn into_values(self, sender: usize, tag: Tag) -> Result<Vec<f64>, Error> {
        match self {
            Payload::Values(values) => Ok(values),
            _ => Err(Error::UnexpectedPayload { sender, tag }),
        }
    }

    pub fn into_scalar(self, sender: usize, tag: Tag) -> Result<f64, Error> {
        match self {
            Payload::Scalar(value) => Ok(value),
            _ => Err(Error::UnexpectedPayload { sender, tag }),
        }
    }

    pub fn into_flag(self, sender: usize, tag: Tag) -> Result<bool, Error> {
        match self {
            Payload::Flag(flag) => Ok(flag),
            _ => Err(Error::UnexpectedPayload { sender, tag }),
        }
    }

    pub fn into_signal(self, sender: usize, tag: Tag) -> Result<(), Error> {
        match self {
            Payload::Signal => Ok(()),
            _ => Err(Error::UnexpectedPayload { sender, tag }),
        }
    }
}
