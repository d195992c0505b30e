//! Running the series on one or many workers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use worker_comm::{Comm, World};

use crate::config::{ExpmConfig, effective_tolerance};
use crate::convergence::should_continue;
use crate::distribute::distribute;
use crate::gather::gather;
use crate::kernel::Kernel;
use crate::layout::BlockLayout;
use crate::matrix::Matrix;
use crate::pipeline::TaylorWorker;
use crate::{COORDINATOR, Error, single};

/// Result of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Approximation of `exp(A)`, same order as the input.
    pub sum: Matrix,
    /// Index `k` of the last term `A^k / k!` added to the sum.
    pub last_term: u64,
    /// Time spent between the start and end synchronization points.
    pub elapsed: Duration,
}

/// Computes matrix exponentials with a fixed configuration.
#[derive(Debug, Clone)]
pub struct MatrixExp {
    config: ExpmConfig,
}

impl MatrixExp {
    /// A non-positive or NaN `config.tolerance` is replaced by
    /// [`DEFAULT_TOLERANCE`](crate::DEFAULT_TOLERANCE).
    pub fn new(mut config: ExpmConfig) -> Self {
        config.tolerance = effective_tolerance(config.tolerance);
        Self { config }
    }

    pub fn config(&self) -> &ExpmConfig {
        &self.config
    }

    /// Sums the Taylor series of `exp(a)` across `config.workers` workers.
    ///
    /// The worker count and order are checked before anything is handed out,
    /// so a configuration error never starts a worker. With a single worker
    /// the series is summed directly without any message passing.
    pub async fn compute(&self, a: &Matrix) -> Result<Solution, Error> {
        if a.rows() != a.cols() {
            return Err(Error::NotSquare {
                rows: a.rows(),
                cols: a.cols(),
            });
        }
        let layout = BlockLayout::new(a.rows(), self.config.workers)?;

        info!(
            order = layout.order(),
            padded_order = layout.padded_order(),
            workers = layout.workers(),
            tolerance = self.config.tolerance,
            "computing matrix exponential"
        );

        let solution = if layout.workers() == 1 {
            self.compute_single(a).await?
        } else {
            self.compute_distributed(a, layout).await?
        };

        info!(
            last_term = solution.last_term,
            elapsed = ?solution.elapsed,
            "series converged"
        );
        Ok(solution)
    }

    async fn compute_single(&self, a: &Matrix) -> Result<Solution, Error> {
        let a = a.clone();
        let tolerance = self.config.tolerance;
        let kernel = Kernel::new(self.config.kernel);

        let started = Instant::now();
        let series = tokio::task::spawn_blocking(move || single::exponential(&a, tolerance, &kernel)).await?;

        Ok(Solution {
            sum: series.sum,
            last_term: series.last_term,
            elapsed: started.elapsed(),
        })
    }

    async fn compute_distributed(&self, a: &Matrix, layout: BlockLayout) -> Result<Solution, Error> {
        let config = self.config;
        let global = Arc::new(a.clone());

        let results = World::new(layout.workers())
            .run(move |comm| run_worker(comm, Arc::clone(&global), layout, config))
            .await?;

        results.into_iter().flatten().next().ok_or(Error::MissingResult)
    }
}

/// One worker's share of a run. Only the coordinator reads `a` and only the
/// coordinator returns a solution.
async fn run_worker(
    comm: Comm,
    a: Arc<Matrix>,
    layout: BlockLayout,
    config: ExpmConfig,
) -> Result<Option<Solution>, Error> {
    comm.barrier().await?;
    let started = Instant::now();

    let global = (comm.rank() == COORDINATOR).then_some(a.as_ref());
    let block = distribute(&comm, global, &layout).await?;
    drop(a);

    let mut worker = TaylorWorker::new(&comm, layout, Kernel::new(config.kernel), block);
    loop {
        worker.advance().await?;
        if !should_continue(&comm, worker.term(), config.tolerance).await? {
            break;
        }
    }

    let last_term = worker.next_index() - 1;
    debug!(rank = comm.rank(), last_term, "leaving the series loop");
    let sum = gather(&comm, worker.into_sum(), &layout).await?;

    comm.barrier().await?;
    let elapsed = started.elapsed();

    Ok(sum.map(|sum| Solution {
        sum,
        last_term,
        elapsed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigError, KernelConfig};

    fn solver(workers: usize) -> MatrixExp {
        MatrixExp::new(
            ExpmConfig::new(workers)
                .with_tolerance(1e-12)
                .with_kernel(KernelConfig { cache_elements: 48 }),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn distributed_matches_single_worker() {
        let a = Matrix::random(7, 3);

        let single = solver(1).compute(&a).await.unwrap();
        let ring = solver(3).compute(&a).await.unwrap();

        assert_eq!((ring.sum.rows(), ring.sum.cols()), (7, 7));
        assert_eq!(ring.last_term, single.last_term);
        for (x, y) in ring.sum.as_slice().iter().zip(single.sum.as_slice()) {
            assert!((x - y).abs() <= 1e-9 * y.abs().max(1.0), "{} != {}", x, y);
        }
    }

    #[tokio::test]
    async fn too_many_workers_is_rejected() {
        let outcome = solver(4).compute(&Matrix::zeros(3, 3)).await;
        assert!(matches!(
            outcome,
            Err(Error::Config(ConfigError::OrderBelowWorkers { order: 3, workers: 4 }))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn negative_tolerance_set_directly_still_terminates() {
        for workers in [1, 2] {
            let mut config = ExpmConfig::new(workers);
            config.tolerance = -1.0;
            let solver = MatrixExp::new(config);
            assert_eq!(solver.config().tolerance, crate::DEFAULT_TOLERANCE);

            let solution = tokio::time::timeout(
                Duration::from_secs(5),
                solver.compute(&Matrix::zeros(4, 4)),
            )
            .await
            .expect("series did not stop")
            .unwrap();
            assert_eq!(solution.last_term, 2);
            assert_eq!(solution.sum, Matrix::identity(4));
        }
    }

    #[tokio::test]
    async fn non_square_input_is_rejected() {
        let outcome = solver(1).compute(&Matrix::zeros(2, 3)).await;
        assert!(matches!(outcome, Err(Error::NotSquare { rows: 2, cols: 3 })));
    }
}
