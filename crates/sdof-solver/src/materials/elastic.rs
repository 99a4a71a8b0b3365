//! Linear elastic law: `f = k·d`, no history.

use super::{MaterialError, MaterialResponse, UniaxialMaterial};

#[derive(Debug, Clone)]
pub struct ElasticMaterial {
    stiffness: f64,
}

impl ElasticMaterial {
    pub fn new(stiffness: f64) -> Self {
        Self { stiffness }
    }
}

impl UniaxialMaterial for ElasticMaterial {
    fn evaluate(&mut self, trial_deformation: f64) -> Result<MaterialResponse, MaterialError> {
        Ok(MaterialResponse {
            force: self.stiffness * trial_deformation,
            tangent: self.stiffness,
        })
    }

    fn commit(&mut self) {}

    fn revert_to_last_commit(&mut self) {}

    fn initial_stiffness(&self) -> f64 {
        self.stiffness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_is_proportional() {
        let mut mat = ElasticMaterial::new(200.0);
        let r = mat.evaluate(0.05).unwrap();
        assert!((r.force - 10.0).abs() < 1e-12);
        assert_eq!(r.tangent, 200.0);
        // commit/revert are no-ops; response is path independent
        mat.commit();
        let r = mat.evaluate(-0.05).unwrap();
        assert!((r.force + 10.0).abs() < 1e-12);
    }
}
