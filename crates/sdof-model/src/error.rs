//! Error types for sdof-model

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors, raised before any analysis step runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("time step must be positive, got {0}")]
    NonPositiveTimeStep(f64),

    #[error("period must be positive, got {0}")]
    NonPositivePeriod(f64),

    #[error("time series has no samples")]
    EmptySeries,

    #[error("explicit time series requires {times} times and {values} values to match")]
    LengthMismatch { times: usize, values: usize },

    #[error("explicit series times must be strictly increasing (t[{index}] = {time})")]
    NonIncreasingTimes { index: usize, time: f64 },

    #[error("windowed series requires end > start, got [{start}, {end}]")]
    EmptyWindow { start: f64, end: f64 },

    #[error("excitation needs at least {required} components, got {given}")]
    TooFewComponents { required: usize, given: usize },

    #[error("transient analysis requires an excitation")]
    MissingExcitation,

    #[error("interpolation weight must be non-negative, got {0}")]
    NegativeWeight(f64),

    #[error("{count} components but {weights} interpolation weights")]
    WeightCountMismatch { count: usize, weights: usize },

    #[error("free dynamic DOF {dof} has non-positive mass {mass}")]
    NonPositiveMass { dof: usize, mass: f64 },

    #[error("oscillator has no directions")]
    NoDirections,

    #[error("material parameter out of range: {0}")]
    BadMaterialParameter(String),

    #[error("iteration parameter out of range: {0}")]
    BadIterationParameter(String),

    #[error("analysis kind not supported by this solver")]
    UnsupportedAnalysisKind,

    #[error("damping ratio must be non-negative, got {0}")]
    NegativeDampingRatio(f64),

    #[error("sweep grid is empty or inverted: start {start}, stop {stop}, step {step}")]
    BadSweepGrid { start: f64, stop: f64, step: f64 },

    #[error("controlled DOF index {dof} out of range for {num_dofs} free DOFs")]
    ControlDofOutOfRange { dof: usize, num_dofs: usize },
}
