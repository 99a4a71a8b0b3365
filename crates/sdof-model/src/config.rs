//! Analysis configuration surface.
//!
//! Everything a run consumes is an immutable value built and validated here
//! before the first step: material parameters, oscillator layout, Newmark
//! and Newton settings, damping targets, the analysis kind, and the period
//! grid for spectrum sweeps. Each sweep period constructs its own fresh
//! solver state from these values — no solver state is ever reconfigured in
//! place between runs.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// A (force, deformation) control point on a hysteretic backbone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackbonePoint {
    pub force: f64,
    pub deformation: f64,
}

impl BackbonePoint {
    pub fn new(force: f64, deformation: f64) -> Self {
        Self { force, deformation }
    }
}

/// Parameters selecting and sizing one uniaxial force-deformation law.
///
/// The variant is fixed at construction; the solver instantiates one
/// implementation per variant with no runtime tag matching in the step loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialSpec {
    /// Linear spring: `f = k·d`
    Elastic { stiffness: f64 },
    /// Multi-point pinched hysteretic law: three backbone points per sign,
    /// pinching factors for deformation (`pinch_x`) and force (`pinch_y`),
    /// damage factors, and an unloading-stiffness degradation exponent.
    Hysteretic {
        positive: [BackbonePoint; 3],
        negative: [BackbonePoint; 3],
        pinch_x: f64,
        pinch_y: f64,
        damage_ductility: f64,
        damage_energy: f64,
        unload_exponent: f64,
    },
    /// Coulomb friction damper: stick stiffness until the friction limit,
    /// then slip at `friction_force` with a near-zero tangent.
    CoulombDamper {
        stick_stiffness: f64,
        friction_force: f64,
        tolerance: f64,
        max_flips: usize,
        slip_tangent: f64,
    },
}

impl MaterialSpec {
    /// Hysteretic spec with a mirrored backbone; damage factors and the
    /// unloading exponent default to zero (no degradation).
    pub fn hysteretic_symmetric(
        positive: [BackbonePoint; 3],
        pinch_x: f64,
        pinch_y: f64,
    ) -> Self {
        let negative = [
            BackbonePoint::new(-positive[0].force, -positive[0].deformation),
            BackbonePoint::new(-positive[1].force, -positive[1].deformation),
            BackbonePoint::new(-positive[2].force, -positive[2].deformation),
        ];
        MaterialSpec::Hysteretic {
            positive,
            negative,
            pinch_x,
            pinch_y,
            damage_ductility: 0.0,
            damage_energy: 0.0,
            unload_exponent: 0.0,
        }
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        match self {
            MaterialSpec::Elastic { stiffness } => {
                if *stiffness <= 0.0 {
                    return Err(ConfigError::BadMaterialParameter(format!(
                        "elastic stiffness must be positive, got {stiffness}"
                    )));
                }
            }
            MaterialSpec::Hysteretic {
                positive,
                negative,
                pinch_x,
                pinch_y,
                damage_ductility,
                damage_energy,
                unload_exponent,
            } => {
                validate_backbone_side(positive, 1.0)?;
                validate_backbone_side(negative, -1.0)?;
                for (name, v) in [("pinch_x", *pinch_x), ("pinch_y", *pinch_y)] {
                    if !(0.0..=1.0).contains(&v) {
                        return Err(ConfigError::BadMaterialParameter(format!(
                            "{name} must be in [0, 1], got {v}"
                        )));
                    }
                }
                for (name, v) in [
                    ("damage_ductility", *damage_ductility),
                    ("damage_energy", *damage_energy),
                    ("unload_exponent", *unload_exponent),
                ] {
                    if v < 0.0 {
                        return Err(ConfigError::BadMaterialParameter(format!(
                            "{name} must be non-negative, got {v}"
                        )));
                    }
                }
            }
            MaterialSpec::CoulombDamper {
                stick_stiffness,
                friction_force,
                tolerance,
                max_flips,
                slip_tangent,
            } => {
                if *stick_stiffness <= 0.0 {
                    return Err(ConfigError::BadMaterialParameter(format!(
                        "stick stiffness must be positive, got {stick_stiffness}"
                    )));
                }
                if *friction_force <= 0.0 {
                    return Err(ConfigError::BadMaterialParameter(format!(
                        "friction force must be positive, got {friction_force}"
                    )));
                }
                if *tolerance <= 0.0 {
                    return Err(ConfigError::BadMaterialParameter(format!(
                        "stick/slip tolerance must be positive, got {tolerance}"
                    )));
                }
                if *max_flips == 0 {
                    return Err(ConfigError::BadMaterialParameter(
                        "max_flips must be at least 1".to_string(),
                    ));
                }
                if *slip_tangent < 0.0 {
                    return Err(ConfigError::BadMaterialParameter(format!(
                        "slip tangent must be non-negative, got {slip_tangent}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Initial (small-deformation) stiffness of the law.
    pub fn initial_stiffness(&self) -> f64 {
        match self {
            MaterialSpec::Elastic { stiffness } => *stiffness,
            MaterialSpec::Hysteretic { positive, .. } => {
                positive[0].force / positive[0].deformation
            }
            MaterialSpec::CoulombDamper {
                stick_stiffness, ..
            } => *stick_stiffness,
        }
    }
}

fn validate_backbone_side(points: &[BackbonePoint; 3], sign: f64) -> Result<()> {
    let side = if sign > 0.0 { "positive" } else { "negative" };
    let mut prev_d = 0.0;
    for (i, p) in points.iter().enumerate() {
        if sign * p.deformation <= sign * prev_d {
            return Err(ConfigError::BadMaterialParameter(format!(
                "{side} backbone deformations must move monotonically away from zero \
                 (point {i}: {})",
                p.deformation
            )));
        }
        if sign * p.force <= 0.0 {
            return Err(ConfigError::BadMaterialParameter(format!(
                "{side} backbone force {} has the wrong sign (point {i})",
                p.force
            )));
        }
        prev_d = p.deformation;
    }
    // the second point must not soften below the first; only the ultimate
    // segment may carry a non-positive slope
    if sign * points[1].force < sign * points[0].force {
        return Err(ConfigError::BadMaterialParameter(format!(
            "{side} backbone softens before the ultimate segment"
        )));
    }
    Ok(())
}

/// One active direction of the oscillator: a lumped mass and its material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionSpec {
    pub mass: f64,
    pub material: MaterialSpec,
}

/// Support-plus-mass oscillator layout. Directions are numbered in
/// construction order and that order fixes the DOF numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatorSpec {
    pub directions: Vec<DirectionSpec>,
}

impl OscillatorSpec {
    /// Single-direction oscillator.
    pub fn single(mass: f64, material: MaterialSpec) -> Self {
        Self {
            directions: vec![DirectionSpec { mass, material }],
        }
    }

    pub fn num_directions(&self) -> usize {
        self.directions.len()
    }

    /// Total translational mass across directions.
    pub fn total_mass(&self) -> f64 {
        self.directions.iter().map(|d| d.mass).sum()
    }

    pub fn validate(&self) -> Result<()> {
        if self.directions.is_empty() {
            return Err(ConfigError::NoDirections);
        }
        for (i, dir) in self.directions.iter().enumerate() {
            if dir.mass <= 0.0 {
                return Err(ConfigError::NonPositiveMass {
                    dof: i,
                    mass: dir.mass,
                });
            }
            dir.material.validate()?;
        }
        Ok(())
    }
}

/// Newmark time-integration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewmarkParams {
    pub beta: f64,
    pub gamma: f64,
}

impl NewmarkParams {
    /// Average acceleration method (unconditionally stable, 2nd order)
    ///
    /// γ = 1/2, β = 1/4
    pub fn average_acceleration() -> Self {
        Self {
            beta: 0.25,
            gamma: 0.5,
        }
    }

    /// Linear acceleration method (conditionally stable)
    ///
    /// γ = 1/2, β = 1/6
    pub fn linear_acceleration() -> Self {
        Self {
            beta: 1.0 / 6.0,
            gamma: 0.5,
        }
    }
}

impl Default for NewmarkParams {
    fn default() -> Self {
        Self::average_acceleration()
    }
}

/// Which norm the equilibrium iteration tests against its tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceCriterion {
    /// Norm of the displacement increment of the last Newton update
    DisplacementIncrement,
    /// Norm of the residual (unbalanced force)
    ResidualNorm,
}

/// Newton equilibrium-iteration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationParams {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub criterion: ConvergenceCriterion,
}

impl Default for IterationParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 50,
            criterion: ConvergenceCriterion::DisplacementIncrement,
        }
    }
}

impl IterationParams {
    pub fn validate(&self) -> Result<()> {
        if self.tolerance <= 0.0 {
            return Err(ConfigError::BadIterationParameter(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        // max_iterations = 0 is allowed: it forces immediate non-convergence,
        // which sweep callers use to probe partial-failure handling
        Ok(())
    }
}

/// Which Rayleigh terms the damping coefficients include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RayleighVariant {
    /// αM = 2ξω₁, βK = 0
    MassProportional,
    /// αM = 0, βK = 2ξ/ω₁
    StiffnessProportional,
    /// αM = 2ξω₁ω₂/(ω₁+ω₂), βK = 2ξ/(ω₁+ω₂)
    TwoFrequency,
}

/// Target modal damping for a run. `None` damping is expressed by ratio 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DampingSpec {
    pub ratio: f64,
    pub variant: RayleighVariant,
}

impl DampingSpec {
    pub fn mass_proportional(ratio: f64) -> Self {
        Self {
            ratio,
            variant: RayleighVariant::MassProportional,
        }
    }

    pub fn stiffness_proportional(ratio: f64) -> Self {
        Self {
            ratio,
            variant: RayleighVariant::StiffnessProportional,
        }
    }

    pub fn two_frequency(ratio: f64) -> Self {
        Self {
            ratio,
            variant: RayleighVariant::TwoFrequency,
        }
    }

    /// Zero damping (coefficients both zero regardless of variant).
    pub fn none() -> Self {
        Self {
            ratio: 0.0,
            variant: RayleighVariant::MassProportional,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ratio < 0.0 {
            return Err(ConfigError::NegativeDampingRatio(self.ratio));
        }
        Ok(())
    }
}

/// The kind of stepping a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnalysisKind {
    /// Newmark transient integration under base excitation
    Transient { time_step: f64, num_steps: usize },
    /// Static Newton stepping with a load-factor increment per step
    LoadControl { increment: f64, num_steps: usize },
    /// Static Newton stepping driving one DOF by a fixed increment per step
    DisplacementControl {
        dof: usize,
        increment: f64,
        num_steps: usize,
    },
}

impl AnalysisKind {
    pub fn num_steps(&self) -> usize {
        match self {
            AnalysisKind::Transient { num_steps, .. }
            | AnalysisKind::LoadControl { num_steps, .. }
            | AnalysisKind::DisplacementControl { num_steps, .. } => *num_steps,
        }
    }

    pub fn validate(&self, num_dofs: usize) -> Result<()> {
        match self {
            AnalysisKind::Transient { time_step, .. } => {
                if *time_step <= 0.0 {
                    return Err(ConfigError::NonPositiveTimeStep(*time_step));
                }
            }
            AnalysisKind::LoadControl { .. } => {}
            AnalysisKind::DisplacementControl { dof, .. } => {
                if *dof >= num_dofs {
                    return Err(ConfigError::ControlDofOutOfRange {
                        dof: *dof,
                        num_dofs,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Period grid for a spectrum sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl SweepGrid {
    pub fn new(start: f64, stop: f64, step: f64) -> Result<Self> {
        let grid = Self { start, stop, step };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start <= 0.0 || self.stop < self.start || self.step <= 0.0 {
            return Err(ConfigError::BadSweepGrid {
                start: self.start,
                stop: self.stop,
                step: self.step,
            });
        }
        Ok(())
    }

    /// Ordered periods `start, start+step, …` up to and including `stop`
    /// (within floating-point slack).
    pub fn periods(&self) -> Vec<f64> {
        let n = ((self.stop - self.start) / self.step + 1e-9).floor() as usize + 1;
        (0..n).map(|i| self.start + i as f64 * self.step).collect()
    }
}
