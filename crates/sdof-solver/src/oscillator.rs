//! Oscillator assembly: DOFs, masses, and the restoring-force relationship.
//!
//! The assembled system is the support-plus-mass chain the analyses share:
//! one fixed support node and one mass node carrying 1..N active directions,
//! each direction connected through its own uniaxial material. Free DOFs are
//! numbered in construction order (direction 0, 1, …), so the assembled
//! vectors and matrices are deterministic for a given spec.
//!
//! Each direction is independent, so the tangent assembles diagonally; the
//! shape stays a general matrix because the integrator treats it as one.

use crate::error::Result;
use crate::materials::{MaterialError, UniaxialMaterial, build_material};
use nalgebra::{DMatrix, DVector};
use sdof_model::OscillatorSpec;

/// One displacement component of the assembly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreeOfFreedom {
    /// Position in construction order
    pub index: usize,
    /// Fixed at the support
    pub fixed: bool,
    /// Lumped translational mass (zero at the support)
    pub mass: f64,
}

/// Restoring force and tangent for a trial displacement.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoringForce {
    pub forces: DVector<f64>,
    pub tangent: DMatrix<f64>,
}

/// Assembled oscillator for one analysis run.
///
/// Constructed fresh per run; never shared across concurrent runs.
pub struct Oscillator {
    dofs: Vec<DegreeOfFreedom>,
    materials: Vec<Box<dyn UniaxialMaterial>>,
    num_free: usize,
}

impl Oscillator {
    /// Build the assembly a spec describes.
    ///
    /// # Errors
    /// `SolveError::Config` when the spec fails validation (empty direction
    /// list, non-positive mass, bad material parameters).
    pub fn from_spec(spec: &OscillatorSpec) -> Result<Self> {
        spec.validate()?;

        let mut dofs = Vec::with_capacity(spec.directions.len() + 1);
        // the support DOF comes first and is fixed
        dofs.push(DegreeOfFreedom {
            index: 0,
            fixed: true,
            mass: 0.0,
        });
        let mut materials = Vec::with_capacity(spec.directions.len());
        for (i, dir) in spec.directions.iter().enumerate() {
            dofs.push(DegreeOfFreedom {
                index: i + 1,
                fixed: false,
                mass: dir.mass,
            });
            materials.push(build_material(&dir.material));
        }

        Ok(Self {
            num_free: spec.directions.len(),
            dofs,
            materials,
        })
    }

    /// Number of free DOFs (one per direction).
    pub fn num_dofs(&self) -> usize {
        self.num_free
    }

    /// All DOFs in construction order, support first.
    pub fn dofs(&self) -> &[DegreeOfFreedom] {
        &self.dofs
    }

    /// Diagonal lumped-mass matrix over the free DOFs.
    pub fn mass_matrix(&self) -> DMatrix<f64> {
        let masses: Vec<f64> = self
            .dofs
            .iter()
            .filter(|d| !d.fixed)
            .map(|d| d.mass)
            .collect();
        DMatrix::from_diagonal(&DVector::from_vec(masses))
    }

    /// Lumped masses as a vector, in free-DOF order.
    pub fn mass_vector(&self) -> DVector<f64> {
        self.mass_matrix().diagonal()
    }

    /// Initial tangent over the free DOFs (used for eigen-analysis and the
    /// damping matrix).
    pub fn initial_stiffness_matrix(&self) -> DMatrix<f64> {
        let k: Vec<f64> = self.materials.iter().map(|m| m.initial_stiffness()).collect();
        DMatrix::from_diagonal(&DVector::from_vec(k))
    }

    /// Evaluate every direction's material at the trial displacement and
    /// assemble force vector and tangent matrix. Trial only — nothing is
    /// committed.
    pub fn restoring_force(
        &mut self,
        trial: &DVector<f64>,
    ) -> std::result::Result<RestoringForce, MaterialError> {
        let n = self.num_free;
        let mut forces = DVector::zeros(n);
        let mut tangent = DMatrix::zeros(n, n);
        for (i, mat) in self.materials.iter_mut().enumerate() {
            let resp = mat.evaluate(trial[i])?;
            forces[i] = resp.force;
            tangent[(i, i)] = resp.tangent;
        }
        Ok(RestoringForce { forces, tangent })
    }

    /// Freeze every material's trial state.
    pub fn commit(&mut self) {
        for mat in &mut self.materials {
            mat.commit();
        }
    }

    /// Discard every material's trial state.
    pub fn revert_to_last_commit(&mut self) {
        for mat in &mut self.materials {
            mat.revert_to_last_commit();
        }
    }

    /// Support reaction for a given restoring-force vector: the support
    /// carries the negative of every direction's element force.
    pub fn support_reaction(&self, forces: &DVector<f64>) -> DVector<f64> {
        -forces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdof_model::{DirectionSpec, MaterialSpec};

    fn two_direction_spec() -> OscillatorSpec {
        OscillatorSpec {
            directions: vec![
                DirectionSpec {
                    mass: 2.0,
                    material: MaterialSpec::Elastic { stiffness: 200.0 },
                },
                DirectionSpec {
                    mass: 3.0,
                    material: MaterialSpec::Elastic { stiffness: 800.0 },
                },
            ],
        }
    }

    #[test]
    fn numbering_follows_construction_order() {
        let osc = Oscillator::from_spec(&two_direction_spec()).unwrap();
        assert_eq!(osc.num_dofs(), 2);
        let dofs = osc.dofs();
        assert!(dofs[0].fixed);
        assert_eq!(dofs[0].mass, 0.0);
        assert_eq!(dofs[1].index, 1);
        assert_eq!(dofs[1].mass, 2.0);
        assert_eq!(dofs[2].mass, 3.0);
    }

    #[test]
    fn matrices_are_diagonal_lumped() {
        let osc = Oscillator::from_spec(&two_direction_spec()).unwrap();
        let m = osc.mass_matrix();
        assert_eq!(m[(0, 0)], 2.0);
        assert_eq!(m[(1, 1)], 3.0);
        assert_eq!(m[(0, 1)], 0.0);
        let k = osc.initial_stiffness_matrix();
        assert_eq!(k[(0, 0)], 200.0);
        assert_eq!(k[(1, 1)], 800.0);
    }

    #[test]
    fn restoring_force_assembles_per_direction() {
        let mut osc = Oscillator::from_spec(&two_direction_spec()).unwrap();
        let u = DVector::from_vec(vec![0.1, -0.05]);
        let r = osc.restoring_force(&u).unwrap();
        assert!((r.forces[0] - 20.0).abs() < 1e-12);
        assert!((r.forces[1] + 40.0).abs() < 1e-12);
        assert_eq!(r.tangent[(0, 0)], 200.0);
        assert_eq!(r.tangent[(1, 1)], 800.0);
        assert_eq!(r.tangent[(0, 1)], 0.0);
    }

    #[test]
    fn support_reaction_balances_element_forces() {
        let mut osc = Oscillator::from_spec(&two_direction_spec()).unwrap();
        let u = DVector::from_vec(vec![0.1, 0.1]);
        let r = osc.restoring_force(&u).unwrap();
        let reaction = osc.support_reaction(&r.forces);
        assert!((reaction[0] + r.forces[0]).abs() < 1e-12);
    }

    #[test]
    fn rejects_invalid_spec() {
        let spec = OscillatorSpec { directions: vec![] };
        assert!(Oscillator::from_spec(&spec).is_err());
    }
}
