//! Multi-point pinched hysteretic law.
//!
//! The backbone is piecewise linear through the origin and three control
//! points per sign. Response:
//!
//! - virgin loading traces the backbone directly;
//! - after the first yield excursion, reversals unload at the (possibly
//!   degraded) elastic stiffness until the force crosses zero, then reload
//!   along a two-segment path through the pinch point
//!   `(pinch_x·d_target, pinch_y·f_target)` toward the largest prior
//!   excursion on the destination sign;
//! - at the target the path rejoins the backbone and traces it monotonically;
//! - past the outermost control point the force plateaus at that point's
//!   force with a vanishing tangent.
//!
//! Reload targets shrink with the damage factors (ductility demand and
//! dissipated energy); the unloading stiffness degrades as `k₀·μ^(−β)`.
//! History only advances on `commit`.
//!
//! Invariant: |force| never exceeds the backbone at the trial deformation,
//! hence never the outermost control-point force of the active sign.

use super::{MaterialError, MaterialResponse, UniaxialMaterial};
use sdof_model::BackbonePoint;

/// Floor for near-zero backbone tangents, as a fraction of the elastic
/// stiffness. Keeps static continuation solvable without adding strength;
/// the interpolated force is unaffected.
const TANGENT_FLOOR_RATIO: f64 = 1e-8;

#[derive(Debug, Clone)]
pub struct HystereticMaterial {
    pos: [BackbonePoint; 3],
    neg: [BackbonePoint; 3],
    pinch_x: f64,
    pinch_y: f64,
    damage_ductility: f64,
    damage_energy: f64,
    unload_exponent: f64,
    k0_pos: f64,
    k0_neg: f64,
    energy_ult: f64,

    // committed state
    c_def: f64,
    c_force: f64,
    c_tangent: f64,
    c_max_def: f64,
    c_min_def: f64,
    c_energy: f64,
    c_yielded: bool,

    // trial state
    t_def: f64,
    t_force: f64,
    t_tangent: f64,
}

impl HystereticMaterial {
    pub fn new(
        pos: [BackbonePoint; 3],
        neg: [BackbonePoint; 3],
        pinch_x: f64,
        pinch_y: f64,
        damage_ductility: f64,
        damage_energy: f64,
        unload_exponent: f64,
    ) -> Self {
        let k0_pos = pos[0].force / pos[0].deformation;
        let k0_neg = neg[0].force / neg[0].deformation;
        let energy_ult = (pos[2].force * pos[2].deformation).abs();
        Self {
            pos,
            neg,
            pinch_x,
            pinch_y,
            damage_ductility,
            damage_energy,
            unload_exponent,
            k0_pos,
            k0_neg,
            energy_ult,
            c_def: 0.0,
            c_force: 0.0,
            c_tangent: k0_pos,
            c_max_def: pos[0].deformation,
            c_min_def: neg[0].deformation,
            c_energy: 0.0,
            c_yielded: false,
            t_def: 0.0,
            t_force: 0.0,
            t_tangent: k0_pos,
        }
    }

    /// Backbone force/tangent at `d` (sign-appropriate side), plateaued past
    /// the outermost point and scaled by the damage factor.
    fn backbone(&self, d: f64) -> (f64, f64) {
        let scale = self.damage_factor();
        let (f, k) = if d >= 0.0 {
            piecewise(d, self.k0_pos, &self.pos)
        } else {
            piecewise(d, self.k0_neg, &self.neg)
        };
        (scale * f, scale * k)
    }

    /// Peak ductility demand seen so far (≥ 1).
    fn ductility(&self) -> f64 {
        let mu_pos = self.c_max_def / self.pos[0].deformation;
        let mu_neg = self.c_min_def / self.neg[0].deformation;
        mu_pos.max(mu_neg).max(1.0)
    }

    /// Strength scale from the damage factors; 1 when both are zero.
    fn damage_factor(&self) -> f64 {
        let mu = self.ductility();
        let e_ratio = (self.c_energy / self.energy_ult).max(0.0);
        1.0 / (1.0 + self.damage_ductility * (mu - 1.0) + self.damage_energy * e_ratio)
    }

    /// Unloading stiffness `k₀·μ^(−β)`.
    fn unload_stiffness(&self, k0: f64) -> f64 {
        k0 * self.ductility().powf(-self.unload_exponent)
    }

    fn path_toward_positive(&self, d: f64) -> (f64, f64) {
        if !self.c_yielded {
            return self.backbone(d);
        }

        let k_unl = self.unload_stiffness(self.k0_pos);
        let (start_d, start_f) = if self.c_force < 0.0 {
            // unload branch: climb at k_unl until the force crosses zero
            let d_zero = self.c_def - self.c_force / k_unl;
            if d <= d_zero {
                return (self.c_force + k_unl * (d - self.c_def), k_unl);
            }
            (d_zero, 0.0)
        } else {
            (self.c_def, self.c_force)
        };

        let target_d = self.c_max_def;
        let (target_f, _) = self.backbone(target_d);
        if d >= target_d || target_d - start_d < 1e-14 {
            return self.backbone(d);
        }

        // reload polyline: start → pinch → target, capped by the backbone
        let pinch_d = self.pinch_x * target_d;
        let pinch_f = self.pinch_y * target_f;
        let (f, k) = if pinch_d > start_d && pinch_d < target_d && pinch_f >= start_f {
            if d <= pinch_d {
                segment(d, start_d, start_f, pinch_d, pinch_f)
            } else {
                segment(d, pinch_d, pinch_f, target_d, target_f)
            }
        } else {
            segment(d, start_d, start_f, target_d, target_f)
        };

        if d > 0.0 {
            let (f_env, k_env) = self.backbone(d);
            if f > f_env {
                return (f_env, k_env);
            }
        }
        (f, k)
    }

    fn path_toward_negative(&self, d: f64) -> (f64, f64) {
        if !self.c_yielded {
            return self.backbone(d);
        }

        let k_unl = self.unload_stiffness(self.k0_neg);
        let (start_d, start_f) = if self.c_force > 0.0 {
            let d_zero = self.c_def - self.c_force / k_unl;
            if d >= d_zero {
                return (self.c_force + k_unl * (d - self.c_def), k_unl);
            }
            (d_zero, 0.0)
        } else {
            (self.c_def, self.c_force)
        };

        let target_d = self.c_min_def;
        let (target_f, _) = self.backbone(target_d);
        if d <= target_d || start_d - target_d < 1e-14 {
            return self.backbone(d);
        }

        let pinch_d = self.pinch_x * target_d;
        let pinch_f = self.pinch_y * target_f;
        let (f, k) = if pinch_d < start_d && pinch_d > target_d && pinch_f <= start_f {
            if d >= pinch_d {
                segment(d, start_d, start_f, pinch_d, pinch_f)
            } else {
                segment(d, pinch_d, pinch_f, target_d, target_f)
            }
        } else {
            segment(d, start_d, start_f, target_d, target_f)
        };

        if d < 0.0 {
            let (f_env, k_env) = self.backbone(d);
            if f < f_env {
                return (f_env, k_env);
            }
        }
        (f, k)
    }
}

/// Linear interpolation along one segment; tangent is the segment slope.
fn segment(d: f64, d_a: f64, f_a: f64, d_b: f64, f_b: f64) -> (f64, f64) {
    let k = (f_b - f_a) / (d_b - d_a);
    (f_a + k * (d - d_a), k)
}

/// Piecewise backbone on one sign: origin through the three points, then a
/// plateau at the outermost force. Flat segments report the floored tangent
/// so the tangent stays nonzero everywhere; softening slopes pass through.
fn piecewise(d: f64, k0: f64, points: &[BackbonePoint; 3]) -> (f64, f64) {
    let floor = k0 * TANGENT_FLOOR_RATIO;
    let floored = |(f, k): (f64, f64)| if k.abs() < floor { (f, floor) } else { (f, k) };
    let s = if points[0].deformation > 0.0 { 1.0 } else { -1.0 };
    let x = s * d;
    if x <= s * points[0].deformation {
        return (k0 * d, k0);
    }
    if x <= s * points[1].deformation {
        return floored(segment(
            d,
            points[0].deformation,
            points[0].force,
            points[1].deformation,
            points[1].force,
        ));
    }
    if x <= s * points[2].deformation {
        return floored(segment(
            d,
            points[1].deformation,
            points[1].force,
            points[2].deformation,
            points[2].force,
        ));
    }
    (points[2].force, floor)
}

impl UniaxialMaterial for HystereticMaterial {
    fn evaluate(&mut self, trial_deformation: f64) -> Result<MaterialResponse, MaterialError> {
        let d = trial_deformation;
        let (force, tangent) = if (d - self.c_def).abs() < 1e-15 {
            (self.c_force, self.c_tangent)
        } else if d > self.c_def {
            self.path_toward_positive(d)
        } else {
            self.path_toward_negative(d)
        };
        self.t_def = d;
        self.t_force = force;
        self.t_tangent = tangent;
        Ok(MaterialResponse { force, tangent })
    }

    fn commit(&mut self) {
        self.c_energy += 0.5 * (self.c_force + self.t_force) * (self.t_def - self.c_def);
        self.c_def = self.t_def;
        self.c_force = self.t_force;
        self.c_tangent = self.t_tangent;
        if self.c_def > self.c_max_def {
            self.c_max_def = self.c_def;
        }
        if self.c_def < self.c_min_def {
            self.c_min_def = self.c_def;
        }
        if self.c_def > self.pos[0].deformation || self.c_def < self.neg[0].deformation {
            self.c_yielded = true;
        }
    }

    fn revert_to_last_commit(&mut self) {
        self.t_def = self.c_def;
        self.t_force = self.c_force;
        self.t_tangent = self.c_tangent;
    }

    fn initial_stiffness(&self) -> f64 {
        self.k0_pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_backbone(fy: f64, dy: f64) -> HystereticMaterial {
        let pos = [
            BackbonePoint::new(fy, dy),
            BackbonePoint::new(fy, 2.0 * dy),
            BackbonePoint::new(fy, 3.0 * dy),
        ];
        let neg = [
            BackbonePoint::new(-fy, -dy),
            BackbonePoint::new(-fy, -2.0 * dy),
            BackbonePoint::new(-fy, -3.0 * dy),
        ];
        HystereticMaterial::new(pos, neg, 0.8, 0.2, 0.0, 0.0, 0.0)
    }

    /// Drive through a deformation path, committing every point.
    fn drive(mat: &mut HystereticMaterial, path: &[f64]) -> Vec<f64> {
        path.iter()
            .map(|&d| {
                let f = mat.evaluate(d).unwrap().force;
                mat.commit();
                f
            })
            .collect()
    }

    #[test]
    fn virgin_response_is_elastic() {
        let mut mat = flat_backbone(300.0, 0.15);
        let r = mat.evaluate(0.05).unwrap();
        assert!((r.force - 0.05 * 2000.0).abs() < 1e-9);
        assert!((r.tangent - 2000.0).abs() < 1e-9);
        let r = mat.evaluate(-0.05).unwrap();
        assert!((r.force + 0.05 * 2000.0).abs() < 1e-9);
    }

    #[test]
    fn yields_onto_plateau() {
        let mut mat = flat_backbone(300.0, 0.15);
        let forces = drive(&mut mat, &[0.1, 0.2, 0.3, 0.4]);
        assert!((forces[0] - 200.0).abs() < 1e-9);
        for &f in &forces[1..] {
            assert!((f - 300.0).abs() < 1e-9);
        }
    }

    #[test]
    fn unloads_at_elastic_stiffness() {
        let mut mat = flat_backbone(300.0, 0.15);
        drive(&mut mat, &[0.3]); // on the plateau
        let r = mat.evaluate(0.29).unwrap();
        let expected = 300.0 - 2000.0 * 0.01;
        assert!((r.force - expected).abs() < 1e-9);
        assert!((r.tangent - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn pinched_reload_runs_below_the_elastic_line() {
        let mut mat = flat_backbone(300.0, 0.15);
        // yield positive, unload through zero, yield negative, reload positive
        drive(&mut mat, &[0.3, 0.0, -0.3, 0.0]);
        // halfway back toward the old positive target the pinched path holds
        // the force near pinch_y * Fy, far below the elastic line
        let r = mat.evaluate(0.15).unwrap();
        assert!(r.force > 0.0);
        assert!(
            r.force < 0.5 * 300.0,
            "reload force {} should be pinched well below the backbone",
            r.force
        );
    }

    #[test]
    fn reload_rejoins_the_backbone_at_the_old_peak() {
        let mut mat = flat_backbone(300.0, 0.15);
        drive(&mut mat, &[0.3, 0.0, -0.3, 0.0]);
        let r = mat.evaluate(0.3).unwrap();
        assert!((r.force - 300.0).abs() < 1e-9);
    }

    #[test]
    fn force_never_exceeds_outermost_point() {
        let mut mat = flat_backbone(300.0, 0.15);
        // irregular excursion sequence crossing both signs repeatedly
        let path = [
            0.05, 0.2, -0.1, 0.35, -0.4, 0.1, 0.44, -0.2, -0.44, 0.3, -0.05, 0.42,
        ];
        for f in drive(&mut mat, &path) {
            assert!(
                f.abs() <= 300.0 + 1e-9,
                "force {f} escaped the backbone bound"
            );
        }
    }

    #[test]
    fn revert_discards_trial() {
        let mut mat = flat_backbone(300.0, 0.15);
        drive(&mut mat, &[0.1]);
        let committed = mat.evaluate(0.1).unwrap().force;
        mat.revert_to_last_commit();
        mat.evaluate(0.25).unwrap();
        mat.revert_to_last_commit();
        assert!((mat.evaluate(0.1).unwrap().force - committed).abs() < 1e-12);
    }

    #[test]
    fn damage_shrinks_the_reload_target() {
        let pos = [
            BackbonePoint::new(300.0, 0.15),
            BackbonePoint::new(300.0, 0.30),
            BackbonePoint::new(300.0, 0.45),
        ];
        let neg = [
            BackbonePoint::new(-300.0, -0.15),
            BackbonePoint::new(-300.0, -0.30),
            BackbonePoint::new(-300.0, -0.45),
        ];
        let mut mat = HystereticMaterial::new(pos, neg, 0.8, 0.2, 0.5, 0.0, 0.0);
        drive(&mut mat, &[0.45, 0.0]);
        // ductility 3 → scale 1/(1 + 0.5·2) = 0.5
        let r = mat.evaluate(0.45).unwrap();
        assert!((r.force - 150.0).abs() < 1e-6);
    }

    #[test]
    fn unload_exponent_softens_unloading() {
        let pos = [
            BackbonePoint::new(300.0, 0.15),
            BackbonePoint::new(300.0, 0.30),
            BackbonePoint::new(300.0, 0.45),
        ];
        let neg = [
            BackbonePoint::new(-300.0, -0.15),
            BackbonePoint::new(-300.0, -0.30),
            BackbonePoint::new(-300.0, -0.45),
        ];
        let mut mat = HystereticMaterial::new(pos, neg, 0.8, 0.2, 0.0, 0.0, 0.5);
        drive(&mut mat, &[0.45]); // ductility 3
        let r = mat.evaluate(0.44).unwrap();
        let k_expected = 2000.0 * 3.0_f64.powf(-0.5);
        assert!((r.tangent - k_expected).abs() < 1e-6);
    }
}
