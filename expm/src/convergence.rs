//! Group-wide stop/continue decision.

use tracing::debug;
use worker_comm::Comm;

use crate::matrix::Matrix;
use crate::{COORDINATOR, Error};

/// Decides on the coordinator whether another term is needed and tells every
/// worker, so the whole ring leaves the loop on the same term.
///
/// The series continues while the largest absolute entry of the newest term,
/// over all workers, is above `tolerance`. This looks only at the size of the
/// last term, not at how much it changed the sum, and so assumes terms keep
/// shrinking once past the spectral radius.
pub async fn should_continue(comm: &Comm, term: &Matrix, tolerance: f64) -> Result<bool, Error> {
    let local = term.max_abs();

    let decision = match comm.reduce_max(COORDINATOR, local).await? {
        Some(global) => {
            debug!(global, tolerance, "largest entry of newest term");
            global > tolerance
        }
        None => true,
    };

    Ok(comm.broadcast_flag(COORDINATOR, decision).await?)
}
