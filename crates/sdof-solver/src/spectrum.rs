//! Response-spectrum sweep.
//!
//! For each period T in the grid the sweeper derives the oscillator for that
//! period — stiffness K = M·(2π/T)² for the elastic family, or the same K
//! with a fixed yield strength F_y and derived yield deformation d_y = F_y/K
//! for the constant-strength hysteretic family — then builds a completely
//! fresh solver state and integrates the full record.
//!
//! Per period it extracts Sd = max|u|, Sv = max|v|, Sa = max|a_rel + a_g|
//! (total acceleration, so the rigid limit recovers the peak ground
//! acceleration), the peak restoring force, the peak input energy
//! E = ∫ −M·a_g·v dt, and the energy-equivalent velocity √(2E/M).
//!
//! Runs share no mutable state, so the grid fans out on the rayon worker
//! pool; collection restores period order regardless of completion order. A
//! period that fails to converge still produces its `SpectrumPoint`, flagged
//! through `RunOutcome`, with peaks taken over the committed prefix — one
//! entry per requested period, always.

use crate::analysis::{FailureReason, InitialConditions, RunOutcome, RunResult};
use crate::error::Result;
use crate::recorder::ResponseRecorder;
use crate::transient::TransientSolver;
use nalgebra::DVector;
use rayon::prelude::*;
use serde::Serialize;
use sdof_model::{
    BackbonePoint, DampingSpec, Excitation, IterationParams, MaterialSpec, NewmarkParams,
    OscillatorSpec, SweepGrid,
};

/// Oscillator family swept across periods.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepMaterial {
    /// Linear spring with K = M·(2π/T)²
    Elastic,
    /// Constant-strength pinched hysteretic law: the backbone holds
    /// `yield_force` at d_y, 2d_y, 3d_y with d_y = F_y/K derived per period
    Hysteretic {
        yield_force: f64,
        pinch_x: f64,
        pinch_y: f64,
    },
}

impl SweepMaterial {
    /// Concrete material parameters for one period's stiffness.
    fn spec_for_stiffness(&self, stiffness: f64) -> MaterialSpec {
        match self {
            SweepMaterial::Elastic => MaterialSpec::Elastic { stiffness },
            SweepMaterial::Hysteretic {
                yield_force,
                pinch_x,
                pinch_y,
            } => {
                let dy = yield_force / stiffness;
                MaterialSpec::hysteretic_symmetric(
                    [
                        BackbonePoint::new(*yield_force, dy),
                        BackbonePoint::new(*yield_force, 2.0 * dy),
                        BackbonePoint::new(*yield_force, 3.0 * dy),
                    ],
                    *pinch_x,
                    *pinch_y,
                )
            }
        }
    }
}

/// Sweep description: one oscillator family, one record, one grid.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub mass: f64,
    pub grid: SweepGrid,
    pub material: SweepMaterial,
    pub damping: DampingSpec,
    pub excitation: Excitation,
    pub time_step: f64,
    /// Steps per run; `None` integrates to the end of the excitation
    pub num_steps: Option<usize>,
    pub newmark: NewmarkParams,
    pub iteration: IterationParams,
}

impl SweepConfig {
    fn steps(&self) -> usize {
        match self.num_steps {
            Some(n) => n,
            None => (self.excitation.end_time() / self.time_step).ceil() as usize,
        }
    }
}

/// Peak response of one oscillator period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumPoint {
    pub period: f64,
    /// Sd = max|u|
    pub peak_displacement: f64,
    /// Sv = max|v|
    pub peak_velocity: f64,
    /// Sa = max|a_rel + a_g| (total acceleration)
    pub peak_acceleration: f64,
    pub peak_force: f64,
    /// max over the cumulative input energy
    pub peak_input_energy: f64,
    /// √(2·E_max/M)
    pub energy_velocity: f64,
    pub outcome: RunOutcome,
}

/// Run the sweep: one `SpectrumPoint` per grid period, in period order.
///
/// # Errors
/// Only configuration errors abort the sweep (bad grid, bad mass, bad
/// parameters) — they are detected on the first period before any fan-out.
/// Per-period non-convergence is flagged on the point, never propagated.
pub fn sweep(config: &SweepConfig) -> Result<Vec<SpectrumPoint>> {
    config.grid.validate()?;
    let periods = config.grid.periods();

    // validate the per-period construction once, eagerly, so configuration
    // errors surface before dispatching workers
    build_solver(config, periods[0])?;

    let points: Vec<SpectrumPoint> = periods
        .par_iter()
        .map(|&period| run_period(config, period))
        .collect();
    Ok(points)
}

fn build_solver(config: &SweepConfig, period: f64) -> Result<TransientSolver> {
    let omega = 2.0 * std::f64::consts::PI / period;
    let stiffness = config.mass * omega * omega;
    let spec = OscillatorSpec::single(
        config.mass,
        config.material.spec_for_stiffness(stiffness),
    );
    TransientSolver::new(
        &spec,
        &config.damping,
        config.excitation.clone(),
        config.newmark,
        config.iteration,
        config.time_step,
        config.steps(),
        InitialConditions::at_rest(),
    )
}

/// One period's independent run; infallible so the sweep always yields an
/// entry. Construction errors (which the eager check makes unreachable in
/// practice) are folded into a failed outcome at step 0.
fn run_period(config: &SweepConfig, period: f64) -> SpectrumPoint {
    let result = match build_solver(config, period).and_then(TransientSolver::solve) {
        Ok(result) => result,
        Err(_) => RunResult {
            recorder: ResponseRecorder::new(),
            outcome: RunOutcome::Failed {
                step: 0,
                reason: FailureReason::SingularSystem,
            },
        },
    };

    let masses = mass_vector(config);
    let peak_energy = result
        .recorder
        .peak_input_energy(&masses, &config.excitation);
    SpectrumPoint {
        period,
        peak_displacement: result.recorder.peak_displacement(),
        peak_velocity: result.recorder.peak_velocity(),
        peak_acceleration: result.recorder.peak_total_acceleration(&config.excitation),
        peak_force: result.recorder.peak_force(),
        peak_input_energy: peak_energy,
        energy_velocity: (2.0 * peak_energy / config.mass).max(0.0).sqrt(),
        outcome: result.outcome,
    }
}

fn mass_vector(config: &SweepConfig) -> DVector<f64> {
    DVector::from_element(1, config.mass)
}
