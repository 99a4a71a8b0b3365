//! Analysis configuration and run dispatch.
//!
//! A run is described by one immutable `AnalysisConfig` value. Every call to
//! `run()` builds a fresh oscillator, damping model, and solver state from
//! that value — solver state is never reused or reconfigured in place, which
//! is what makes the spectrum sweeper's parallel fan-out safe.
//!
//! Per-step convergence failures do not escape as errors: they terminate the
//! run and are reported as a marker on the result, so callers (the sweeper
//! in particular) can keep the committed prefix of the trajectory.

use crate::error::{Result, SolveError};
use crate::recorder::ResponseRecorder;
use crate::static_solver::StaticSolver;
use crate::transient::TransientSolver;
use serde::Serialize;
use sdof_model::{
    AnalysisKind, ConfigError, DampingSpec, Excitation, IterationParams, NewmarkParams,
    OscillatorSpec, TimeSeries,
};

/// Phase of one integration step.
///
/// Steps move Predicted → Iterating → Converged; a step that exhausts its
/// iteration budget (or whose material state fails) ends in Failed and the
/// run stops advancing.
#[derive(Debug, Clone, PartialEq)]
pub enum StepPhase {
    Predicted,
    Iterating,
    Converged,
    Failed(FailureReason),
}

/// Why a step failed to converge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FailureReason {
    /// Newton iteration exhausted without meeting tolerance
    IterationLimit {
        iterations: usize,
        residual_norm: f64,
    },
    /// A material's state determination failed (stick/slip flip budget)
    Material(crate::materials::MaterialError),
    /// The effective system could not be factorized
    SingularSystem,
}

/// Terminal status of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RunOutcome {
    /// Every requested step converged and was committed
    Completed,
    /// The run stopped at `step`; committed steps before it remain valid
    Failed { step: usize, reason: FailureReason },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }
}

/// Trajectory plus terminal status for one run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub recorder: ResponseRecorder,
    pub outcome: RunOutcome,
}

impl RunResult {
    /// View the outcome as a `SolveError` for callers that treat a single
    /// run's non-convergence as fatal.
    pub fn as_error(&self) -> Option<SolveError> {
        match &self.outcome {
            RunOutcome::Completed => None,
            RunOutcome::Failed { step, reason } => Some(match reason {
                FailureReason::IterationLimit {
                    iterations,
                    residual_norm,
                } => SolveError::ConvergenceFailure {
                    step: *step,
                    iterations: *iterations,
                    residual_norm: *residual_norm,
                },
                FailureReason::Material(source) => SolveError::MaterialNonconvergence {
                    step: *step,
                    source: source.clone(),
                },
                FailureReason::SingularSystem => SolveError::SingularSystem { step: *step },
            }),
        }
    }
}

/// Initial displacement and velocity, in free-DOF order. Empty vectors mean
/// zeros.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialConditions {
    pub displacement: Vec<f64>,
    pub velocity: Vec<f64>,
}

impl InitialConditions {
    pub fn at_rest() -> Self {
        Self::default()
    }

    pub fn with_velocity(velocity: Vec<f64>) -> Self {
        Self {
            displacement: Vec::new(),
            velocity,
        }
    }

    pub fn with_displacement(displacement: Vec<f64>) -> Self {
        Self {
            displacement,
            velocity: Vec::new(),
        }
    }
}

/// Immutable description of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub oscillator: OscillatorSpec,
    pub damping: DampingSpec,
    pub newmark: NewmarkParams,
    pub iteration: IterationParams,
    pub kind: AnalysisKind,
    /// Base excitation; required for transient runs
    pub excitation: Option<Excitation>,
    /// Reference load vector for static runs (defaults to a unit load on
    /// the first/controlled DOF)
    pub reference_load: Option<Vec<f64>>,
    /// Optional pseudo-time → load-factor series for load control
    pub factor_series: Option<TimeSeries>,
    pub initial: InitialConditions,
}

impl AnalysisConfig {
    /// Transient run under the given excitation, starting at rest.
    pub fn transient(
        oscillator: OscillatorSpec,
        damping: DampingSpec,
        excitation: Excitation,
        time_step: f64,
        num_steps: usize,
    ) -> Self {
        Self {
            oscillator,
            damping,
            newmark: NewmarkParams::default(),
            iteration: IterationParams::default(),
            kind: AnalysisKind::Transient {
                time_step,
                num_steps,
            },
            excitation: Some(excitation),
            reference_load: None,
            factor_series: None,
            initial: InitialConditions::at_rest(),
        }
    }

    /// Execute the run: fresh oscillator, damping model, and solver state.
    ///
    /// # Errors
    /// Configuration problems surface here before the first step. Per-step
    /// non-convergence is reported via `RunResult::outcome` instead.
    pub fn run(&self) -> Result<RunResult> {
        self.oscillator.validate()?;
        self.iteration.validate()?;
        self.kind
            .validate(self.oscillator.num_directions())
            .map_err(SolveError::Config)?;

        match self.kind {
            AnalysisKind::Transient {
                time_step,
                num_steps,
            } => {
                let excitation = self
                    .excitation
                    .clone()
                    .ok_or(SolveError::Config(ConfigError::MissingExcitation))?;
                TransientSolver::new(
                    &self.oscillator,
                    &self.damping,
                    excitation,
                    self.newmark,
                    self.iteration,
                    time_step,
                    num_steps,
                    self.initial.clone(),
                )?
                .solve()
            }
            AnalysisKind::LoadControl { .. } | AnalysisKind::DisplacementControl { .. } => {
                StaticSolver::new(
                    &self.oscillator,
                    self.kind,
                    self.iteration,
                    self.reference_load.clone(),
                    self.factor_series.clone(),
                )?
                .solve()
            }
        }
    }
}
