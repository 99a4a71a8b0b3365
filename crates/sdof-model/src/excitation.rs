//! Support excitation patterns.
//!
//! An excitation turns one or more ground-motion records into a single
//! effective base acceleration `a_g(t)`:
//!
//! - **Uniform**: one scaled record drives the support
//! - **Interpolated**: the weighted sum of several components, each with its
//!   own scale and start-time offset — records can be blended (orthogonal
//!   components) or spliced end to end (sequential events)
//!
//! A component contributes zero before its offset and after its record ends,
//! so splicing needs no padding of the shorter record.

use crate::error::{ConfigError, Result};
use crate::time_series::TimeSeries;
use serde::{Deserialize, Serialize};

/// One ground-motion record with displacement/velocity channels riding along
/// where the source provides them. The integrator consumes the acceleration
/// channel; the others are available to recorders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundMotion {
    pub displacement: Option<TimeSeries>,
    pub velocity: Option<TimeSeries>,
    pub acceleration: TimeSeries,
}

impl GroundMotion {
    /// Motion with only an acceleration channel.
    pub fn from_acceleration(acceleration: TimeSeries) -> Self {
        Self {
            displacement: None,
            velocity: None,
            acceleration,
        }
    }
}

/// A record scheduled into the analysis: scaled and offset in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcitationComponent {
    pub motion: GroundMotion,
    /// Amplitude scale applied to the record (e.g. g to convert from units of g)
    pub scale: f64,
    /// Analysis time at which this record begins
    pub offset: f64,
}

impl ExcitationComponent {
    pub fn new(motion: GroundMotion, scale: f64, offset: f64) -> Self {
        Self {
            motion,
            scale,
            offset,
        }
    }

    /// Scaled acceleration at analysis time `t`; zero before `offset`.
    pub fn acceleration_at(&self, t: f64) -> f64 {
        self.scale * self.motion.acceleration.value_at(t - self.offset)
    }

    /// Analysis time at which this component's record ends.
    pub fn end_time(&self) -> f64 {
        self.offset + self.motion.acceleration.end_time()
    }
}

/// Effective base excitation for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Excitation {
    /// Single record imposed identically at the support
    Uniform(ExcitationComponent),
    /// Weighted combination of 2+ components
    Interpolated {
        components: Vec<ExcitationComponent>,
        weights: Vec<f64>,
    },
}

impl Excitation {
    /// Uniform excitation from a single component.
    pub fn uniform(component: ExcitationComponent) -> Self {
        Excitation::Uniform(component)
    }

    /// Interpolated excitation: `Σᵢ wᵢ · componentᵢ(t)`.
    ///
    /// # Errors
    /// `ConfigError` if fewer than two components are given, the weight count
    /// differs from the component count, or any weight is negative.
    pub fn interpolated(components: Vec<ExcitationComponent>, weights: Vec<f64>) -> Result<Self> {
        if components.len() < 2 {
            return Err(ConfigError::TooFewComponents {
                required: 2,
                given: components.len(),
            });
        }
        if components.len() != weights.len() {
            return Err(ConfigError::WeightCountMismatch {
                count: components.len(),
                weights: weights.len(),
            });
        }
        if let Some(&w) = weights.iter().find(|&&w| w < 0.0) {
            return Err(ConfigError::NegativeWeight(w));
        }
        Ok(Excitation::Interpolated {
            components,
            weights,
        })
    }

    /// Effective base acceleration at analysis time `t`.
    pub fn acceleration_at(&self, t: f64) -> f64 {
        match self {
            Excitation::Uniform(c) => c.acceleration_at(t),
            Excitation::Interpolated {
                components,
                weights,
            } => components
                .iter()
                .zip(weights)
                .map(|(c, w)| w * c.acceleration_at(t))
                .sum(),
        }
    }

    /// Analysis time at which the last component's record ends.
    pub fn end_time(&self) -> f64 {
        match self {
            Excitation::Uniform(c) => c.end_time(),
            Excitation::Interpolated { components, .. } => components
                .iter()
                .map(ExcitationComponent::end_time)
                .fold(0.0, f64::max),
        }
    }
}
