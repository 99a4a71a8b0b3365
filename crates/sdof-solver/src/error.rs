//! Error types for sdof-solver

use crate::materials::MaterialError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolveError>;

/// Errors surfaced by a single analysis run.
///
/// Configuration problems abort before the first step. Per-step convergence
/// failures inside a spectrum sweep are *not* propagated through this type;
/// they become a terminal marker on the run's result so one period's failure
/// never discards the other periods.
#[derive(Error, Debug)]
pub enum SolveError {
    #[error("configuration error: {0}")]
    Config(#[from] sdof_model::ConfigError),

    #[error(
        "step {step}: equilibrium iteration exhausted {iterations} iterations \
         (residual norm {residual_norm:.3e})"
    )]
    ConvergenceFailure {
        step: usize,
        iterations: usize,
        residual_norm: f64,
    },

    #[error("step {step}: material state did not converge: {source}")]
    MaterialNonconvergence {
        step: usize,
        #[source]
        source: MaterialError,
    },

    #[error("effective system is singular at step {step}")]
    SingularSystem { step: usize },

    #[error("eigen-solve failed: {0}")]
    Eigen(String),
}
