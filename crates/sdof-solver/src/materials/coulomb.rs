//! Coulomb friction damper.
//!
//! Elastic "stick" branch at `k_stick` until the force magnitude reaches the
//! friction limit `f_fric = μ·N`, then "slip" at ±`f_fric` with a near-zero
//! tangent. The slip boundary is implicit: each trial starts from the last
//! decision and re-decides until stick/slip is self-consistent within the
//! configured tolerance. Decision flips are counted across all trials of the
//! current step; exhausting the flip budget is a material non-convergence,
//! reported, never silently accepted.
//!
//! The accumulated slip offset (the damper's permanent set) only advances on
//! `commit`.

use super::{MaterialError, MaterialResponse, UniaxialMaterial};

#[derive(Debug, Clone)]
pub struct CoulombDamper {
    k_stick: f64,
    f_fric: f64,
    tolerance: f64,
    max_flips: usize,
    k_slip: f64,

    // committed state
    c_def: f64,
    c_force: f64,
    c_slip_offset: f64,
    c_sticking: bool,

    // trial state
    t_def: f64,
    t_force: f64,
    t_slip_offset: f64,
    t_sticking: bool,
    flips: usize,
}

impl CoulombDamper {
    pub fn new(k_stick: f64, f_fric: f64, tolerance: f64, max_flips: usize, k_slip: f64) -> Self {
        Self {
            k_stick,
            f_fric,
            tolerance,
            max_flips,
            k_slip,
            c_def: 0.0,
            c_force: 0.0,
            c_slip_offset: 0.0,
            c_sticking: true,
            t_def: 0.0,
            t_force: 0.0,
            t_slip_offset: 0.0,
            t_sticking: true,
            flips: 0,
        }
    }

    /// Permanent set accumulated by past slip, as of the committed state.
    pub fn slip_offset(&self) -> f64 {
        self.c_slip_offset
    }
}

impl UniaxialMaterial for CoulombDamper {
    fn evaluate(&mut self, trial_deformation: f64) -> Result<MaterialResponse, MaterialError> {
        let d = trial_deformation;
        // elastic predictor from the committed slip offset
        let f_elastic = self.k_stick * (d - self.c_slip_offset);

        let mut sticking = self.t_sticking;
        // the decision alternates at most once per trial; flips accumulate
        // across the trials of the step to bound chatter near the boundary
        let (force, tangent, slip_offset) = loop {
            let consistent = if sticking {
                f_elastic.abs() <= self.f_fric + self.tolerance
            } else {
                f_elastic.abs() > self.f_fric - self.tolerance
            };
            if consistent {
                if sticking {
                    break (f_elastic, self.k_stick, self.c_slip_offset);
                }
                let sign = if f_elastic >= 0.0 { 1.0 } else { -1.0 };
                let force = sign * self.f_fric;
                // return mapping: the offset moves so the stick branch would
                // reproduce the friction force at this deformation
                let slip_offset = d - force / self.k_stick;
                break (force, self.k_slip, slip_offset);
            }
            sticking = !sticking;
            self.flips += 1;
            if self.flips > self.max_flips {
                return Err(MaterialError::FlipLimitExceeded {
                    flips: self.flips,
                    max_flips: self.max_flips,
                });
            }
        };

        self.t_def = d;
        self.t_force = force;
        self.t_slip_offset = slip_offset;
        self.t_sticking = sticking;
        Ok(MaterialResponse { force, tangent })
    }

    fn commit(&mut self) {
        self.c_def = self.t_def;
        self.c_force = self.t_force;
        self.c_slip_offset = self.t_slip_offset;
        self.c_sticking = self.t_sticking;
        self.flips = 0;
    }

    fn revert_to_last_commit(&mut self) {
        self.t_def = self.c_def;
        self.t_force = self.c_force;
        self.t_slip_offset = self.c_slip_offset;
        self.t_sticking = self.c_sticking;
        self.flips = 0;
    }

    fn initial_stiffness(&self) -> f64 {
        self.k_stick
    }
}
