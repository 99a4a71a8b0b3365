//! Rayleigh damping from modal properties.
//!
//! Coefficients come from an eigen-solve of the assembled *initial* tangent
//! against the mass matrix:
//!
//! (K₀ - λM)φ = 0,  λ = ω²
//!
//! The generalized problem is reduced to a standard symmetric one through
//! the Cholesky factor of M (M = L·Lᵀ, K* = L⁻¹·K₀·L⁻ᵀ) and solved with
//! LAPACK. Given a target ratio ξ:
//!
//! - mass-proportional:      αM = 2ξω₁,            βK = 0
//! - stiffness-proportional: αM = 0,               βK = 2ξ/ω₁
//! - two-frequency:          αM = 2ξω₁ω₂/(ω₁+ω₂), βK = 2ξ/(ω₁+ω₂)
//!
//! The coefficients are fixed for the whole run: the damping matrix is built
//! once from the initial stiffness and is *not* recomputed as the tangent
//! changes during nonlinear response.

use crate::error::{Result, SolveError};
use crate::oscillator::Oscillator;
use nalgebra::linalg::Cholesky;
use nalgebra::DMatrix;
use nalgebra_lapack::SymmetricEigen;
use sdof_model::{DampingSpec, RayleighVariant};

/// Natural frequencies extracted during damping construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalInfo {
    /// Angular frequencies ω in rad/s, ascending
    pub frequencies: Vec<f64>,
}

impl ModalInfo {
    /// Natural periods T = 2π/ω, ascending frequency order.
    pub fn periods(&self) -> Vec<f64> {
        self.frequencies
            .iter()
            .map(|w| 2.0 * std::f64::consts::PI / w)
            .collect()
    }

    /// Frequencies in Hz.
    pub fn frequencies_hz(&self) -> Vec<f64> {
        self.frequencies
            .iter()
            .map(|w| w / (2.0 * std::f64::consts::PI))
            .collect()
    }
}

/// Immutable Rayleigh coefficients for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RayleighDamping {
    pub alpha_m: f64,
    pub beta_k: f64,
    pub modal: ModalInfo,
}

impl RayleighDamping {
    /// Eigen-solve the oscillator's initial system and derive coefficients
    /// for the requested variant.
    ///
    /// # Errors
    /// `SolveError::Config` for a negative target ratio, `SolveError::Eigen`
    /// when the mass matrix is not positive definite or no positive
    /// eigenvalue exists.
    pub fn from_model(oscillator: &Oscillator, spec: &DampingSpec) -> Result<Self> {
        spec.validate()?;
        let k0 = oscillator.initial_stiffness_matrix();
        let m = oscillator.mass_matrix();
        let frequencies = natural_frequencies(&k0, &m)?;

        let omega1 = frequencies[0];
        let xi = spec.ratio;
        let (alpha_m, beta_k) = match spec.variant {
            RayleighVariant::MassProportional => (2.0 * xi * omega1, 0.0),
            RayleighVariant::StiffnessProportional => (0.0, 2.0 * xi / omega1),
            RayleighVariant::TwoFrequency => {
                // single-mode systems collapse to ω₂ = ω₁
                let omega2 = frequencies.get(1).copied().unwrap_or(omega1);
                (
                    2.0 * xi * omega1 * omega2 / (omega1 + omega2),
                    2.0 * xi / (omega1 + omega2),
                )
            }
        };

        Ok(Self {
            alpha_m,
            beta_k,
            modal: ModalInfo { frequencies },
        })
    }

    /// Damping matrix C = αM·M + βK·K₀ over the given (initial) matrices.
    pub fn matrix(&self, mass: &DMatrix<f64>, initial_stiffness: &DMatrix<f64>) -> DMatrix<f64> {
        self.alpha_m * mass + self.beta_k * initial_stiffness
    }
}

/// Angular frequencies of (K - λM)φ = 0, ascending.
///
/// Reduces to a standard symmetric problem via the Cholesky factor of M,
/// then keeps the positive eigenvalues.
fn natural_frequencies(k: &DMatrix<f64>, m: &DMatrix<f64>) -> Result<Vec<f64>> {
    let n = k.nrows();
    if n == 0 {
        return Err(SolveError::Eigen("empty system".to_string()));
    }

    // M = L·Lᵀ
    let chol_m = Cholesky::new(m.clone())
        .ok_or_else(|| SolveError::Eigen("mass matrix is not positive definite".to_string()))?;
    let l = chol_m.l();
    let l_inv = l
        .clone()
        .try_inverse()
        .ok_or_else(|| SolveError::Eigen("failed to invert mass Cholesky factor".to_string()))?;

    // K* = L⁻¹ · K · L⁻ᵀ
    let k_star = &l_inv * k * l_inv.transpose();

    let eigen = SymmetricEigen::new(k_star);
    let mut lambdas: Vec<f64> = eigen
        .eigenvalues
        .as_slice()
        .iter()
        .copied()
        .filter(|&lambda| lambda > 1e-12)
        .collect();
    lambdas.sort_by(f64::total_cmp);

    if lambdas.is_empty() {
        return Err(SolveError::Eigen(
            "no positive eigenvalues (system has no stiffness?)".to_string(),
        ));
    }
    Ok(lambdas.into_iter().map(f64::sqrt).collect())
}
