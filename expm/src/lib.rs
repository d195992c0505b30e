//! Matrix exponential by Taylor series, summed by a ring of workers.
//!
//! `expm` approximates `exp(A) = I + A + A^2/2! + A^3/3! + ...` for a square
//! matrix `A`. The matrix is split into contiguous row-blocks, one per worker.
//! Each new term `A^k / k!` is formed by rotating the row-blocks of the
//! previous term around a ring of workers while each worker multiplies the
//! block it holds into its rows of the product. Transfers overlap with the
//! multiplication.
//!
//! The series stops once the largest absolute entry of the newest term, over
//! all workers, is at most the configured tolerance.
//!
//! # Features
//!
//! - Zero-padding for orders not divisible by the worker count
//! - Cache-blocked multiply kernel with a configurable working-set budget
//! - Direct single-worker path without message passing
//! - Truncated text report of the input and the result
//!
//! # Example
//!
//! ```no_run
//! use expm::{ExpmConfig, Matrix, MatrixExp};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), expm::Error> {
//!     let a = Matrix::random(64, 42);
//!     let solver = MatrixExp::new(ExpmConfig::new(4).with_tolerance(1e-8));
//!
//!     let solution = solver.compute(&a).await?;
//!     println!("{} terms in {:?}", solution.last_term, solution.elapsed);
//!     Ok(())
//! }
//! ```

mod config;
mod convergence;
mod distribute;
mod error;
mod gather;
mod kernel;
mod layout;
mod matrix;
mod matrix_exp;
mod output;
mod params;
mod pipeline;
mod single;

/// Rank that owns the global matrices and makes the stop decision.
pub const COORDINATOR: usize = 0;

pub use config::{DEFAULT_CACHE_ELEMENTS, DEFAULT_TOLERANCE, ExpmConfig, KernelConfig};
pub use error::{ConfigError, Error};
pub use kernel::Kernel;
pub use layout::BlockLayout;
pub use matrix::Matrix;
pub use matrix_exp::{MatrixExp, Solution};
pub use output::{Format, MAX_ENTRIES_TO_OUTPUT, save_report, write_matrix, write_report};
pub use params::{Params, usage};
pub use single::{Series, exponential};
