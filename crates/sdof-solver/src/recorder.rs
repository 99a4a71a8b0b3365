//! Per-step response capture.
//!
//! The recorder stores one `StepState` per *committed* step: time (or
//! pseudo-time for static runs), displacement/velocity/acceleration vectors,
//! element restoring forces, support reactions, and the load factor. Failed
//! steps are never recorded, so a non-convergent run yields a shorter
//! trajectory, not a fabricated one.
//!
//! Peak queries and the input-energy integral used by spectrum extraction
//! live here as well.

use nalgebra::DVector;
use sdof_model::Excitation;

/// Committed state after one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepState {
    pub time: f64,
    pub displacement: DVector<f64>,
    pub velocity: DVector<f64>,
    pub acceleration: DVector<f64>,
    pub restoring_force: DVector<f64>,
    pub support_reaction: DVector<f64>,
    pub load_factor: f64,
}

/// Ordered trajectory of committed steps for one run.
#[derive(Debug, Clone, Default)]
pub struct ResponseRecorder {
    steps: Vec<StepState>,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
        }
    }

    /// Append one committed step.
    pub fn record(&mut self, state: StepState) {
        self.steps.push(state);
    }

    pub fn steps(&self) -> &[StepState] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&StepState> {
        self.steps.last()
    }

    /// Largest |u| over all steps and DOFs.
    pub fn peak_displacement(&self) -> f64 {
        self.peak_of(|s| &s.displacement)
    }

    /// Largest |v| over all steps and DOFs.
    pub fn peak_velocity(&self) -> f64 {
        self.peak_of(|s| &s.velocity)
    }

    /// Largest |a| over all steps and DOFs. Accelerations are stored
    /// relative to the support.
    pub fn peak_acceleration(&self) -> f64 {
        self.peak_of(|s| &s.acceleration)
    }

    /// Largest |a + a_g(t)| over all steps and DOFs — the peak *total*
    /// acceleration under base excitation (this is the quantity whose T→0
    /// limit is the peak ground acceleration).
    pub fn peak_total_acceleration(&self, excitation: &Excitation) -> f64 {
        self.steps
            .iter()
            .map(|s| {
                let ag = excitation.acceleration_at(s.time);
                s.acceleration
                    .iter()
                    .map(|a| (a + ag).abs())
                    .fold(0.0, f64::max)
            })
            .fold(0.0, f64::max)
    }

    /// Largest |restoring force| over all steps and DOFs.
    pub fn peak_force(&self) -> f64 {
        self.peak_of(|s| &s.restoring_force)
    }

    fn peak_of<'a, F>(&'a self, field: F) -> f64
    where
        F: Fn(&'a StepState) -> &'a DVector<f64>,
    {
        self.steps
            .iter()
            .map(|s| field(s).amax())
            .fold(0.0, f64::max)
    }

    /// Cumulative input energy E(t) = ∫ −a_g(τ)·Σⱼ mⱼ·vⱼ(τ) dτ by the
    /// trapezoidal rule over the recorded steps. One entry per step.
    pub fn input_energy_history(
        &self,
        masses: &DVector<f64>,
        excitation: &Excitation,
    ) -> Vec<f64> {
        let power = |s: &StepState| -> f64 {
            let mv: f64 = masses
                .iter()
                .zip(s.velocity.iter())
                .map(|(m, v)| m * v)
                .sum();
            -excitation.acceleration_at(s.time) * mv
        };

        let mut energies = Vec::with_capacity(self.steps.len());
        let mut total = 0.0;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                let prev = &self.steps[i - 1];
                let dt = step.time - prev.time;
                total += 0.5 * (power(prev) + power(step)) * dt;
            }
            energies.push(total);
        }
        energies
    }

    /// Largest cumulative input energy over the run.
    pub fn peak_input_energy(&self, masses: &DVector<f64>, excitation: &Excitation) -> f64 {
        self.input_energy_history(masses, excitation)
            .into_iter()
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdof_model::{ExcitationComponent, GroundMotion, TimeSeries};

    fn state(time: f64, u: f64, v: f64, a: f64, f: f64) -> StepState {
        StepState {
            time,
            displacement: DVector::from_vec(vec![u]),
            velocity: DVector::from_vec(vec![v]),
            acceleration: DVector::from_vec(vec![a]),
            restoring_force: DVector::from_vec(vec![f]),
            support_reaction: DVector::from_vec(vec![-f]),
            load_factor: 0.0,
        }
    }

    #[test]
    fn peaks_take_absolute_maxima() {
        let mut rec = ResponseRecorder::new();
        rec.record(state(0.01, 0.1, -3.0, 2.0, 5.0));
        rec.record(state(0.02, -0.4, 1.0, -9.0, -7.0));
        assert_eq!(rec.len(), 2);
        assert!((rec.peak_displacement() - 0.4).abs() < 1e-12);
        assert!((rec.peak_velocity() - 3.0).abs() < 1e-12);
        assert!((rec.peak_acceleration() - 9.0).abs() < 1e-12);
        assert!((rec.peak_force() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn empty_recorder_reports_zero_peaks() {
        let rec = ResponseRecorder::new();
        assert!(rec.is_empty());
        assert_eq!(rec.peak_displacement(), 0.0);
    }

    #[test]
    fn input_energy_integrates_trapezoidally() {
        // constant ground acceleration −1 and constant velocity 2 with mass 3
        // → power = −(−1)·3·2 = 6, so E(t) = 6·t
        let series = TimeSeries::uniform(1.0, vec![-1.0, -1.0, -1.0]).unwrap();
        let exc = Excitation::uniform(ExcitationComponent::new(
            GroundMotion::from_acceleration(series),
            1.0,
            0.0,
        ));
        let masses = DVector::from_vec(vec![3.0]);

        let mut rec = ResponseRecorder::new();
        for i in 1..=4 {
            rec.record(state(0.5 * i as f64, 0.0, 2.0, 0.0, 0.0));
        }
        let energy = rec.input_energy_history(&masses, &exc);
        assert_eq!(energy.len(), 4);
        assert_eq!(energy[0], 0.0);
        // steps at t = 1.0, 1.5, 2.0 each add 6·0.5 = 3
        assert!((energy[1] - 3.0).abs() < 1e-12);
        assert!((energy[3] - 9.0).abs() < 1e-12);
        assert!((rec.peak_input_energy(&masses, &exc) - 9.0).abs() < 1e-12);
    }
}
