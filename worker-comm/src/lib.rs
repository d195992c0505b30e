//! Ranked workers exchanging tagged messages inside one process.
//!
//! `worker-comm` gives a fixed group of tasks the message-passing model of an
//! SPMD program: each worker owns a rank in `0..size`, talks to other ranks
//! only through tagged messages, and joins the others in collective
//! operations. No memory is shared between ranks; a message is a copy.
//!
//! # Features
//!
//! - Non-blocking `isend` / `irecv` with explicit `wait`
//! - Message matching by sender and tag, order preserved per (sender, tag)
//! - Collectives: barrier, scatter, max-reduce, flag broadcast
//! - `World::run` aborts the whole group when any worker fails
//!
//! # Example
//!
//! ```no_run
//! use worker_comm::{Tag, World};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), worker_comm::Error> {
//!     let sums = World::new(4)
//!         .run(|comm| async move {
//!             let next = (comm.rank() + 1) % comm.size();
//!             let prev = (comm.rank() + comm.size() - 1) % comm.size();
//!
//!             let incoming = comm.irecv(prev, Tag(1), 1)?;
//!             comm.isend(next, Tag(1), &[comm.rank() as f64]).wait().await?;
//!             let got = incoming.wait().await?;
//!
//!             comm.reduce_max(0, got[0]).await
//!         })
//!         .await?;
//!
//!     assert_eq!(sums[0], Some(3.0));
//!     Ok(())
//! }
//! ```

mod collective;
mod comm;
mod error;
mod mailbox;
mod world;

pub use comm::{Comm, RecvRequest, SendRequest, Tag};
pub use error::Error;
pub use world::World;
