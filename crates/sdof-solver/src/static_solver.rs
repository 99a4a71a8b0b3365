//! Static analysis: Newton equilibrium under load or displacement control.
//!
//! Solves r(u) = λ·p_ref without mass or damping terms. The load factor λ
//! (load control) or the controlled DOF's prescribed increment (displacement
//! control) plays the role of the time axis:
//!
//! - **Load control**: λ advances by a fixed increment per step (optionally
//!   through a pseudo-time → factor series); Newton iterates
//!   K_tan·Δu = λ·p_ref − r(u).
//! - **Displacement control**: one DOF advances by a fixed increment and λ
//!   becomes an unknown. Each iteration does the standard two-solve update:
//!   Δu_R = K⁻¹·R, Δu_P = K⁻¹·p_ref, then Δλ is chosen so the controlled
//!   component hits its prescribed increment (first iteration) or holds
//!   (later iterations).
//!
//! Steps run the same {Predicted, Iterating, Converged, Failed} machine as
//! the transient integrator: materials are evaluated uncommitted inside the
//! loop and committed only when the step converges.

use crate::analysis::{FailureReason, RunOutcome, RunResult, StepPhase};
use crate::error::{Result, SolveError};
use crate::oscillator::Oscillator;
use crate::recorder::{ResponseRecorder, StepState};
use nalgebra::DVector;
use sdof_model::{
    AnalysisKind, ConfigError, ConvergenceCriterion, IterationParams, OscillatorSpec, TimeSeries,
};

/// One static run: owns its freshly built oscillator.
pub struct StaticSolver {
    oscillator: Oscillator,
    kind: AnalysisKind,
    iteration: IterationParams,
    reference_load: DVector<f64>,
    factor_series: Option<TimeSeries>,
}

impl StaticSolver {
    /// Build the solver state for one run.
    ///
    /// `reference_load` defaults to a unit load on the controlled DOF
    /// (displacement control) or the first DOF (load control).
    pub fn new(
        oscillator_spec: &OscillatorSpec,
        kind: AnalysisKind,
        iteration: IterationParams,
        reference_load: Option<Vec<f64>>,
        factor_series: Option<TimeSeries>,
    ) -> Result<Self> {
        iteration.validate()?;
        let oscillator = Oscillator::from_spec(oscillator_spec)?;
        let n = oscillator.num_dofs();
        kind.validate(n).map_err(SolveError::Config)?;
        if matches!(kind, AnalysisKind::Transient { .. }) {
            return Err(SolveError::Config(ConfigError::UnsupportedAnalysisKind));
        }

        let reference_load = match reference_load {
            Some(values) => {
                let mut p = DVector::zeros(n);
                for (i, &x) in values.iter().take(n).enumerate() {
                    p[i] = x;
                }
                p
            }
            None => {
                let dof = match kind {
                    AnalysisKind::DisplacementControl { dof, .. } => dof,
                    _ => 0,
                };
                let mut p = DVector::zeros(n);
                p[dof] = 1.0;
                p
            }
        };

        Ok(Self {
            oscillator,
            kind,
            iteration,
            reference_load,
            factor_series,
        })
    }

    /// Run every step to completion or failure.
    pub fn solve(mut self) -> Result<RunResult> {
        let n = self.oscillator.num_dofs();
        let mut u = DVector::zeros(n);
        let mut lambda = 0.0;

        // commit the undeformed state so the first step's reverts are clean
        self.oscillator
            .restoring_force(&u)
            .map_err(|source| SolveError::MaterialNonconvergence { step: 0, source })?;
        self.oscillator.commit();

        let num_steps = self.kind.num_steps();
        let mut recorder = ResponseRecorder::with_capacity(num_steps);

        for step in 1..=num_steps {
            let (phase, u_next, lambda_next, forces) = match self.kind {
                AnalysisKind::LoadControl { increment, .. } => {
                    let tau = step as f64 * increment;
                    let target = match &self.factor_series {
                        Some(series) => series.value_at(tau),
                        None => tau,
                    };
                    self.load_controlled_step(&u, target)
                }
                AnalysisKind::DisplacementControl { dof, increment, .. } => {
                    self.displacement_controlled_step(&u, lambda, dof, increment)
                }
                AnalysisKind::Transient { .. } => unreachable!("rejected at construction"),
            };

            match phase {
                StepPhase::Converged => {
                    self.oscillator.commit();
                    u = u_next;
                    lambda = lambda_next;
                    let reaction = self.oscillator.support_reaction(&forces);
                    let pseudo_time = match self.kind {
                        AnalysisKind::LoadControl { increment, .. } => step as f64 * increment,
                        AnalysisKind::DisplacementControl { increment, .. } => {
                            step as f64 * increment
                        }
                        AnalysisKind::Transient { .. } => unreachable!(),
                    };
                    recorder.record(StepState {
                        time: pseudo_time,
                        displacement: u.clone(),
                        velocity: DVector::zeros(n),
                        acceleration: DVector::zeros(n),
                        restoring_force: forces,
                        support_reaction: reaction,
                        load_factor: lambda,
                    });
                }
                StepPhase::Failed(reason) => {
                    self.oscillator.revert_to_last_commit();
                    return Ok(RunResult {
                        recorder,
                        outcome: RunOutcome::Failed { step, reason },
                    });
                }
                _ => {
                    self.oscillator.revert_to_last_commit();
                    return Ok(RunResult {
                        recorder,
                        outcome: RunOutcome::Failed {
                            step,
                            reason: FailureReason::IterationLimit {
                                iterations: self.iteration.max_iterations,
                                residual_norm: f64::NAN,
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

    /// Newton iteration toward r(u) = λ_target·p_ref with λ fixed.
    fn load_controlled_step(
        &mut self,
        u: &DVector<f64>,
        lambda_target: f64,
    ) -> (StepPhase, DVector<f64>, f64, DVector<f64>) {
        let p = lambda_target * &self.reference_load;
        let mut u_trial = u.clone();

        let mut resp = match self.oscillator.restoring_force(&u_trial) {
            Ok(r) => r,
            Err(e) => return (StepPhase::Failed(FailureReason::Material(e)), u_trial, 0.0, DVector::zeros(u.len())),
        };
        let mut residual = &p - &resp.forces;
        let mut residual_norm = residual.norm();

        let mut phase = StepPhase::Iterating;
        for _ in 0..self.iteration.max_iterations {
            let delta_u = match resp.tangent.clone().lu().solve(&residual) {
                Some(x) => x,
                None => {
                    phase = StepPhase::Failed(FailureReason::SingularSystem);
                    break;
                }
            };
            u_trial += &delta_u;
            resp = match self.oscillator.restoring_force(&u_trial) {
                Ok(r) => r,
                Err(e) => {
                    phase = StepPhase::Failed(FailureReason::Material(e));
                    break;
                }
            };
            residual = &p - &resp.forces;
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
        if matches!(phase, StepPhase::Iterating) {
            phase = StepPhase::Failed(FailureReason::IterationLimit {
                iterations: self.iteration.max_iterations,
                residual_norm,
            });
        }
        let forces = resp.forces.clone();
        (phase, u_trial, lambda_target, forces)
    }

    /// Two-solve displacement-control update: the controlled DOF moves by
    /// `increment` on the first iteration and holds afterwards.
    fn displacement_controlled_step(
        &mut self,
        u: &DVector<f64>,
        lambda: f64,
        dof: usize,
        increment: f64,
    ) -> (StepPhase, DVector<f64>, f64, DVector<f64>) {
        let mut u_trial = u.clone();
        let mut lambda_trial = lambda;

        let mut resp = match self.oscillator.restoring_force(&u_trial) {
            Ok(r) => r,
            Err(e) => return (StepPhase::Failed(FailureReason::Material(e)), u_trial, lambda, DVector::zeros(u.len())),
        };

        let mut phase = StepPhase::Iterating;
        let mut residual_norm = f64::NAN;
        for iter in 0..self.iteration.max_iterations {
            let residual = lambda_trial * &self.reference_load - &resp.forces;
            residual_norm = residual.norm();

            let lu = resp.tangent.clone().lu();
            let delta_u_r = match lu.solve(&residual) {
                Some(x) => x,
                None => {
                    phase = StepPhase::Failed(FailureReason::SingularSystem);
                    break;
                }
            };
            let delta_u_p = match lu.solve(&self.reference_load) {
                Some(x) => x,
                None => {
                    phase = StepPhase::Failed(FailureReason::SingularSystem);
                    break;
                }
            };
            if delta_u_p[dof].abs() < 1e-300 {
                phase = StepPhase::Failed(FailureReason::SingularSystem);
                break;
            }

            let prescribed = if iter == 0 { increment } else { 0.0 };
            let delta_lambda = (prescribed - delta_u_r[dof]) / delta_u_p[dof];
            let delta_u = &delta_u_r + delta_lambda * &delta_u_p;

            u_trial += &delta_u;
            lambda_trial += delta_lambda;

            resp = match self.oscillator.restoring_force(&u_trial) {
                Ok(r) => r,
                Err(e) => {
                    phase = StepPhase::Failed(FailureReason::Material(e));
                    break;
                }
            };

            let unbalance = (lambda_trial * &self.reference_load - &resp.forces).norm();
            let measure = match self.iteration.criterion {
                ConvergenceCriterion::DisplacementIncrement => {
                    if iter == 0 {
                        // the first update carries the prescribed increment;
                        // judge it by the unbalance instead
                        unbalance
                    } else {
                        delta_u.norm()
                    }
                }
                ConvergenceCriterion::ResidualNorm => unbalance,
            };
            if measure < self.iteration.tolerance {
                phase = StepPhase::Converged;
                break;
            }
        }
        if matches!(phase, StepPhase::Iterating) {
            phase = StepPhase::Failed(FailureReason::IterationLimit {
                iterations: self.iteration.max_iterations,
                residual_norm,
            });
        }
        let forces = resp.forces.clone();
        (phase, u_trial, lambda_trial, forces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdof_model::{BackbonePoint, MaterialSpec};

    fn elastic_spec(k: f64) -> OscillatorSpec {
        OscillatorSpec::single(1.0, MaterialSpec::Elastic { stiffness: k })
    }

    fn hysteretic_spec() -> OscillatorSpec {
        // Fy = 300, dy = 0.15 (K = 2000), flat backbone
        OscillatorSpec::single(
            1.0,
            MaterialSpec::hysteretic_symmetric(
                [
                    BackbonePoint::new(300.0, 0.15),
                    BackbonePoint::new(300.0, 0.30),
                    BackbonePoint::new(300.0, 0.45),
                ],
                0.8,
                0.2,
            ),
        )
    }

    #[test]
    fn load_control_traces_the_elastic_line() {
        let solver = StaticSolver::new(
            &elastic_spec(2000.0),
            AnalysisKind::LoadControl {
                increment: 10.0,
                num_steps: 20,
            },
            IterationParams::default(),
            None,
            None,
        )
        .unwrap();
        let result = solver.solve().unwrap();
        assert!(result.outcome.is_completed());
        assert_eq!(result.recorder.len(), 20);
        for (i, s) in result.recorder.steps().iter().enumerate() {
            let lambda = 10.0 * (i + 1) as f64;
            assert!((s.load_factor - lambda).abs() < 1e-9);
            assert!((s.displacement[0] - lambda / 2000.0).abs() < 1e-9);
        }
    }

    #[test]
    fn load_control_follows_a_factor_series() {
        let series = TimeSeries::explicit(vec![0.0, 1.0, 2.0], vec![0.0, 100.0, 0.0]).unwrap();
        let solver = StaticSolver::new(
            &elastic_spec(2000.0),
            AnalysisKind::LoadControl {
                increment: 0.5,
                num_steps: 4,
            },
            IterationParams::default(),
            None,
            Some(series),
        )
        .unwrap();
        let result = solver.solve().unwrap();
        let factors: Vec<f64> = result
            .recorder
            .steps()
            .iter()
            .map(|s| s.load_factor)
            .collect();
        assert!((factors[0] - 50.0).abs() < 1e-9);
        assert!((factors[1] - 100.0).abs() < 1e-9);
        assert!((factors[3] - 0.0).abs() < 1e-9);
    }

    #[test]
    fn displacement_control_finds_the_plateau_load() {
        let solver = StaticSolver::new(
            &hysteretic_spec(),
            AnalysisKind::DisplacementControl {
                dof: 0,
                increment: 0.03,
                num_steps: 12, // final u = 0.36, well past dy = 0.15
            },
            IterationParams::default(),
            None,
            None,
        )
        .unwrap();
        let result = solver.solve().unwrap();
        assert!(result.outcome.is_completed());
        let last = result.recorder.last().unwrap();
        assert!((last.displacement[0] - 0.36).abs() < 1e-6);
        // load factor must sit at the plateau strength
        assert!(
            (last.load_factor - 300.0).abs() < 1e-4,
            "plateau load factor = {}",
            last.load_factor
        );
    }

    #[test]
    fn load_control_beyond_the_plateau_fails_not_panics() {
        let solver = StaticSolver::new(
            &hysteretic_spec(),
            AnalysisKind::LoadControl {
                increment: 100.0,
                num_steps: 5, // λ = 500 exceeds the 300 plateau
            },
            IterationParams::default(),
            None,
            None,
        )
        .unwrap();
        let result = solver.solve().unwrap();
        match result.outcome {
            RunOutcome::Failed { step, .. } => {
                // λ = 100, 200, 300 converge; 400 cannot
                assert_eq!(step, 4);
                assert_eq!(result.recorder.len(), 3);
            }
            RunOutcome::Completed => panic!("plateau overload should not converge"),
        }
    }

    #[test]
    fn displacement_control_negative_push() {
        let push = StaticSolver::new(
            &hysteretic_spec(),
            AnalysisKind::DisplacementControl {
                dof: 0,
                increment: -0.03,
                num_steps: 10,
            },
            IterationParams::default(),
            None,
            None,
        )
        .unwrap();
        let result = push.solve().unwrap();
        assert!(result.outcome.is_completed());
        let last = result.recorder.last().unwrap();
        assert!((last.displacement[0] + 0.30).abs() < 1e-6);
        assert!((last.load_factor + 300.0).abs() < 1e-4);
    }
}
