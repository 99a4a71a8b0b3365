//! Data model for the oscillator dynamics engine.
//!
//! This crate holds the immutable inputs of an analysis run:
//! - **time series** (uniform, explicit, windowed sine) with zero padding
//! - **excitation patterns** (uniform or interpolated multi-record)
//! - the **configuration surface** (materials, oscillator layout, Newmark and
//!   Newton parameters, damping targets, sweep grids)
//!
//! Everything here is a plain value: constructed once, validated up front,
//! and shared read-only by the solver. Solver state lives in `sdof-solver`.

pub mod config;
pub mod error;
pub mod excitation;
pub mod time_series;

pub use config::{
    AnalysisKind, BackbonePoint, ConvergenceCriterion, DampingSpec, DirectionSpec,
    IterationParams, MaterialSpec, NewmarkParams, OscillatorSpec, RayleighVariant, SweepGrid,
};
pub use error::{ConfigError, Result};
pub use excitation::{Excitation, ExcitationComponent, GroundMotion};
pub use time_series::TimeSeries;
