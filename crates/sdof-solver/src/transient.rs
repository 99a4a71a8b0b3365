//! Transient integration: Newmark-β with Newton equilibrium iteration.
//!
//! Solves the coupled equations of motion under base excitation:
//!
//! M·ü + C·u̇ + r(u) = p(t),   p(t) = −M·ι·a_g(t)
//!
//! with the implicit Newmark family (β, γ):
//!
//! ```text
//! u_{n+1} = u_n + Δt·u̇_n + (Δt²/2)·[(1−2β)·ü_n + 2β·ü_{n+1}]
//! u̇_{n+1} = u̇_n + Δt·[(1−γ)·ü_n + γ·ü_{n+1}]
//! ```
//!
//! Each step runs the {Predicted, Iterating, Converged, Failed} machine: the
//! predictor holds the committed displacement, the Newton loop solves
//!
//! K_eff·Δu = p − (M·ü + C·u̇ + r(u)),
//! K_eff = K_tan + γ/(β·Δt)·C + 1/(β·Δt²)·M
//!
//! re-evaluating the materials (uncommitted) every iteration, and the step
//! commits only on convergence. A step that exhausts its iteration budget
//! marks the run failed from that step on; committed steps stay recorded.
//!
//! C comes from `RayleighDamping` and is built once from the *initial*
//! stiffness; it is not updated as the tangent changes.

use crate::analysis::{FailureReason, InitialConditions, RunOutcome, RunResult, StepPhase};
use crate::damping::RayleighDamping;
use crate::error::{Result, SolveError};
use crate::oscillator::Oscillator;
use crate::recorder::{ResponseRecorder, StepState};
use nalgebra::DVector;
use sdof_model::{
    ConfigError, ConvergenceCriterion, DampingSpec, Excitation, IterationParams, NewmarkParams,
    OscillatorSpec,
};

/// One transient run: owns its freshly built oscillator and damping model.
pub struct TransientSolver {
    oscillator: Oscillator,
    damping: RayleighDamping,
    excitation: Excitation,
    newmark: NewmarkParams,
    iteration: IterationParams,
    time_step: f64,
    num_steps: usize,
    initial: InitialConditions,
}

impl TransientSolver {
    /// Build the solver state for one run.
    ///
    /// # Errors
    /// `SolveError::Config` for invalid specs or a non-positive time step;
    /// `SolveError::Eigen` if the damping eigen-solve fails.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        oscillator_spec: &OscillatorSpec,
        damping_spec: &DampingSpec,
        excitation: Excitation,
        newmark: NewmarkParams,
        iteration: IterationParams,
        time_step: f64,
        num_steps: usize,
        initial: InitialConditions,
    ) -> Result<Self> {
        if time_step <= 0.0 {
            return Err(SolveError::Config(ConfigError::NonPositiveTimeStep(
                time_step,
            )));
        }
        iteration.validate()?;
        let oscillator = Oscillator::from_spec(oscillator_spec)?;
        let damping = RayleighDamping::from_model(&oscillator, damping_spec)?;
        Ok(Self {
            oscillator,
            damping,
            excitation,
            newmark,
            iteration,
            time_step,
            num_steps,
            initial,
        })
    }

    /// Natural frequencies found while building the damping model.
    pub fn modal_frequencies(&self) -> &[f64] {
        &self.damping.modal.frequencies
    }

    /// Run every step to completion or failure.
    pub fn solve(mut self) -> Result<RunResult> {
        let n = self.oscillator.num_dofs();
        let mass = self.oscillator.mass_matrix();
        let mass_vec = self.oscillator.mass_vector();
        let k0 = self.oscillator.initial_stiffness_matrix();
        let c = self.damping.matrix(&mass, &k0);

        let mut u = initial_vector(&self.initial.displacement, n);
        let mut v = initial_vector(&self.initial.velocity, n);

        // establish the committed material state at u₀ and solve
        // M·a₀ = p(0) − C·v₀ − r(u₀) for the starting acceleration
        let resp0 = self
            .oscillator
            .restoring_force(&u)
            .map_err(|source| SolveError::MaterialNonconvergence { step: 0, source })?;
        self.oscillator.commit();
        let p0 = load_vector(&mass_vec, &self.excitation, 0.0);
        let mut a = mass
            .clone()
            .lu()
            .solve(&(&p0 - &c * &v - &resp0.forces))
            .ok_or(SolveError::SingularSystem { step: 0 })?;

        let dt = self.time_step;
        let beta = self.newmark.beta;
        let gamma = self.newmark.gamma;
        let c1 = 1.0 / (beta * dt * dt);
        let c2 = 1.0 / (beta * dt);
        let c3 = 0.5 / beta - 1.0;

        let mut recorder = ResponseRecorder::with_capacity(self.num_steps);

        for step in 1..=self.num_steps {
            let t = step as f64 * dt;
            let p = load_vector(&mass_vec, &self.excitation, t);

            // Predicted: hold the committed displacement, update a and v
            // through the Newmark relations
            let mut phase = StepPhase::Predicted;
            let mut u_trial = u.clone();
            let mut a_trial = -c2 * &v - c3 * &a;
            let mut v_trial = &v + dt * ((1.0 - gamma) * &a + gamma * &a_trial);

            let mut resp = match self.oscillator.restoring_force(&u_trial) {
                Ok(r) => r,
                Err(e) => {
                    return Ok(finish_failed(recorder, &mut self.oscillator, step, e));
                }
            };
            let mut residual = &p - &mass * &a_trial - &c * &v_trial - &resp.forces;
            let mut residual_norm = residual.norm();

            debug_assert!(matches!(phase, StepPhase::Predicted));
            phase = StepPhase::Iterating;
            for _ in 0..self.iteration.max_iterations {
                let k_eff = &resp.tangent + (gamma / (beta * dt)) * &c + c1 * &mass;
                let delta_u = match k_eff.lu().solve(&residual) {
                    Some(x) => x,
                    None => {
                        phase = StepPhase::Failed(FailureReason::SingularSystem);
                        break;
                    }
                };
                u_trial += &delta_u;
                a_trial = c1 * (&u_trial - &u) - c2 * &v - c3 * &a;
                v_trial = &v + dt * ((1.0 - gamma) * &a + gamma * &a_trial);

                resp = match self.oscillator.restoring_force(&u_trial) {
                    Ok(r) => r,
                    Err(e) => {
                        phase = StepPhase::Failed(FailureReason::Material(e));
                        break;
                    }
                };
                residual = &p - &mass * &a_trial - &c * &v_trial - &resp.forces;
                residual_norm = residual.norm();

                let measure = match self.iteration.criterion {
                    ConvergenceCriterion::DisplacementIncrement => delta_u.norm(),
                    ConvergenceCriterion::ResidualNorm => residual_norm,
                };
                if measure < self.iteration.tolerance {
                    phase = StepPhase::Converged;
                    break;
                }
            }

            match phase {
                StepPhase::Converged => {
                    self.oscillator.commit();
                    u = u_trial;
                    v = v_trial;
                    a = a_trial;
                    let reaction = self.oscillator.support_reaction(&resp.forces);
                    recorder.record(StepState {
                        time: t,
                        displacement: u.clone(),
                        velocity: v.clone(),
                        acceleration: a.clone(),
                        restoring_force: resp.forces.clone(),
                        support_reaction: reaction,
                        load_factor: self.excitation.acceleration_at(t),
                    });
                }
                StepPhase::Failed(reason) => {
                    self.oscillator.revert_to_last_commit();
                    return Ok(RunResult {
                        recorder,
                        outcome: RunOutcome::Failed { step, reason },
                    });
                }
                // still Predicted/Iterating: budget exhausted without meeting
                // tolerance
                _ => {
                    self.oscillator.revert_to_last_commit();
                    return Ok(RunResult {
                        recorder,
                        outcome: RunOutcome::Failed {
                            step,
                            reason: FailureReason::IterationLimit {
                                iterations: self.iteration.max_iterations,
                                residual_norm,
                            },
                        },
                    });
                }
            }
        }

        Ok(RunResult {
            recorder,
            outcome: RunOutcome::Completed,
        })
    }
}

/// Effective load p(t) = −M·ι·a_g(t) for a lumped (diagonal) mass.
fn load_vector(mass_vec: &DVector<f64>, excitation: &Excitation, t: f64) -> DVector<f64> {
    -excitation.acceleration_at(t) * mass_vec
}

fn initial_vector(values: &[f64], n: usize) -> DVector<f64> {
    if values.is_empty() {
        DVector::zeros(n)
    } else {
        let mut v = DVector::zeros(n);
        for (i, &x) in values.iter().take(n).enumerate() {
            v[i] = x;
        }
        v
    }
}

fn finish_failed(
    recorder: ResponseRecorder,
    oscillator: &mut Oscillator,
    step: usize,
    source: crate::materials::MaterialError,
) -> RunResult {
    oscillator.revert_to_last_commit();
    RunResult {
        recorder,
        outcome: RunOutcome::Failed {
            step,
            reason: FailureReason::Material(source),
        },
    }
}
