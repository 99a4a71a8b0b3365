//! Uniaxial force-deformation laws.
//!
//! Every material implements the same three-call contract:
//!
//! 1. `evaluate(d)` — compute force and tangent for a *trial* deformation;
//!    may be called repeatedly within one equilibrium iteration
//! 2. `commit()` — freeze the last trial as the new reference state
//! 3. `revert_to_last_commit()` — discard an uncommitted trial
//!
//! History variables (reversal points, slip offsets, branch selection) only
//! move on `commit`, so the Newton loop can probe trial states freely.
//!
//! The concrete law is chosen once at construction from a `MaterialSpec`;
//! the step loop dispatches through the trait object with no tag matching.

mod coulomb;
mod elastic;
mod hysteretic;

pub use coulomb::CoulombDamper;
pub use elastic::ElasticMaterial;
pub use hysteretic::HystereticMaterial;

use sdof_model::MaterialSpec;
use serde::Serialize;
use thiserror::Error;

/// Force and consistent tangent for a trial deformation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialResponse {
    pub force: f64,
    pub tangent: f64,
}

/// Material-level state-determination failure.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum MaterialError {
    #[error("stick/slip decision flipped {flips} times within one step (budget {max_flips})")]
    FlipLimitExceeded { flips: usize, max_flips: usize },
}

/// Path-dependent uniaxial force-deformation law.
pub trait UniaxialMaterial: Send {
    /// Force and tangent at `trial_deformation`, measured from the committed
    /// state. Does not alter the committed state.
    fn evaluate(&mut self, trial_deformation: f64) -> Result<MaterialResponse, MaterialError>;

    /// Freeze the last trial state as the new committed state.
    fn commit(&mut self);

    /// Discard the trial state, returning to the last committed state.
    fn revert_to_last_commit(&mut self);

    /// Stiffness of the undeformed law (used for eigen-analysis and the
    /// initial damping matrix).
    fn initial_stiffness(&self) -> f64;
}

/// Instantiate the law a spec describes.
///
/// The spec is assumed validated; selection happens here, once, and never in
/// the step loop.
pub fn build_material(spec: &MaterialSpec) -> Box<dyn UniaxialMaterial> {
    match spec {
        MaterialSpec::Elastic { stiffness } => Box::new(ElasticMaterial::new(*stiffness)),
        MaterialSpec::Hysteretic {
            positive,
            negative,
            pinch_x,
            pinch_y,
            damage_ductility,
            damage_energy,
            unload_exponent,
        } => Box::new(HystereticMaterial::new(
            *positive,
            *negative,
            *pinch_x,
            *pinch_y,
            *damage_ductility,
            *damage_energy,
            *unload_exponent,
        )),
        MaterialSpec::CoulombDamper {
            stick_stiffness,
            friction_force,
            tolerance,
            max_flips,
            slip_tangent,
        } => Box::new(CoulombDamper::new(
            *stick_stiffness,
            *friction_force,
            *tolerance,
            *max_flips,
            *slip_tangent,
        )),
    }
}
