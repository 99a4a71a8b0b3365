//! Load and ground-motion time series.
//!
//! A series maps analysis time to a sample value. Three shapes cover the
//! record kinds used by the analyses:
//!
//! - **Uniform**: `count` samples at fixed spacing `dt` (digitized records)
//! - **Explicit**: (time, value) pairs with strictly increasing times
//! - **Windowed sine**: `factor * sin(2π(t - start)/period + shift)` inside
//!   `[start, end]`, zero outside (swept-amplitude support motions)
//!
//! Evaluation linearly interpolates between samples. Outside the sampled
//! range every series evaluates to zero — zero padding, never an error —
//! so records of different lengths can be combined freely.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// A scaled, time-shifted sample sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    kind: SeriesKind,
    /// Multiplier applied to every evaluated value
    factor: f64,
    /// Time at which the first sample is placed
    start_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum SeriesKind {
    Uniform { dt: f64, values: Vec<f64> },
    Explicit { times: Vec<f64>, values: Vec<f64> },
    WindowedSine { start: f64, end: f64, period: f64, shift: f64 },
}

impl TimeSeries {
    /// Uniformly sampled series: `values[i]` at `start_time + i*dt`.
    ///
    /// # Errors
    /// `ConfigError` if `dt <= 0` or `values` is empty.
    pub fn uniform(dt: f64, values: Vec<f64>) -> Result<Self> {
        if dt <= 0.0 {
            return Err(ConfigError::NonPositiveTimeStep(dt));
        }
        if values.is_empty() {
            return Err(ConfigError::EmptySeries);
        }
        Ok(Self {
            kind: SeriesKind::Uniform { dt, values },
            factor: 1.0,
            start_time: 0.0,
        })
    }

    /// Explicit series from (time, value) pairs.
    ///
    /// # Errors
    /// `ConfigError` if the slices are empty, of different length, or the
    /// times are not strictly increasing.
    pub fn explicit(times: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if times.is_empty() || values.is_empty() {
            return Err(ConfigError::EmptySeries);
        }
        if times.len() != values.len() {
            return Err(ConfigError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        for i in 1..times.len() {
            if times[i] <= times[i - 1] {
                return Err(ConfigError::NonIncreasingTimes {
                    index: i,
                    time: times[i],
                });
            }
        }
        Ok(Self {
            kind: SeriesKind::Explicit { times, values },
            factor: 1.0,
            start_time: 0.0,
        })
    }

    /// Sinusoid windowed to `[start, end]`: `sin(2π(t-start)/period + shift)`.
    ///
    /// # Errors
    /// `ConfigError` if `end <= start` or `period <= 0`.
    pub fn windowed_sine(start: f64, end: f64, period: f64, shift: f64) -> Result<Self> {
        if end <= start {
            return Err(ConfigError::EmptyWindow { start, end });
        }
        if period <= 0.0 {
            return Err(ConfigError::NonPositivePeriod(period));
        }
        Ok(Self {
            kind: SeriesKind::WindowedSine {
                start,
                end,
                period,
                shift,
            },
            factor: 1.0,
            start_time: 0.0,
        })
    }

    /// Scale every evaluated value by `factor`.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Delay the series so its first sample lands at `start_time`.
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Value at analysis time `t`, linearly interpolated, zero outside the
    /// sampled range.
    pub fn value_at(&self, t: f64) -> f64 {
        let t = t - self.start_time;
        let raw = match &self.kind {
            SeriesKind::Uniform { dt, values } => {
                let t_end = (values.len() - 1) as f64 * dt;
                if t < 0.0 || t > t_end {
                    0.0
                } else {
                    let i = ((t / dt).floor() as usize).min(values.len() - 1);
                    if i + 1 >= values.len() {
                        values[i]
                    } else {
                        let frac = (t - i as f64 * dt) / dt;
                        values[i] + frac * (values[i + 1] - values[i])
                    }
                }
            }
            SeriesKind::Explicit { times, values } => {
                if t < times[0] || t > *times.last().unwrap_or(&times[0]) {
                    0.0
                } else {
                    // partition_point finds the first sample past t
                    let hi = times.partition_point(|&x| x <= t);
                    if hi == 0 {
                        values[0]
                    } else if hi >= times.len() {
                        values[times.len() - 1]
                    } else {
                        let lo = hi - 1;
                        let frac = (t - times[lo]) / (times[hi] - times[lo]);
                        values[lo] + frac * (values[hi] - values[lo])
                    }
                }
            }
            SeriesKind::WindowedSine {
                start,
                end,
                period,
                shift,
            } => {
                if t < *start || t > *end {
                    0.0
                } else {
                    (2.0 * std::f64::consts::PI * (t - start) / period + shift).sin()
                }
            }
        };
        self.factor * raw
    }

    /// Time of the last sample (relative to analysis time zero).
    pub fn end_time(&self) -> f64 {
        let span = match &self.kind {
            SeriesKind::Uniform { dt, values } => (values.len() - 1) as f64 * dt,
            SeriesKind::Explicit { times, .. } => *times.last().unwrap_or(&0.0),
            SeriesKind::WindowedSine { end, .. } => *end,
        };
        self.start_time + span
    }

    /// Sample spacing for uniform series, `None` otherwise.
    pub fn dt(&self) -> Option<f64> {
        match &self.kind {
            SeriesKind::Uniform { dt, .. } => Some(*dt),
            _ => None,
        }
    }

    /// Number of stored samples (`None` for analytic series).
    pub fn num_samples(&self) -> Option<usize> {
        match &self.kind {
            SeriesKind::Uniform { values, .. } => Some(values.len()),
            SeriesKind::Explicit { values, .. } => Some(values.len()),
            SeriesKind::WindowedSine { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_interpolates_between_samples() {
        let ts = TimeSeries::uniform(0.1, vec![0.0, 1.0, 0.0]).unwrap();
        assert_eq!(ts.value_at(0.0), 0.0);
        assert_eq!(ts.value_at(0.1), 1.0);
        assert!((ts.value_at(0.05) - 0.5).abs() < 1e-12);
        assert!((ts.value_at(0.15) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn uniform_zero_padded_outside_range() {
        let ts = TimeSeries::uniform(0.01, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ts.value_at(-0.5), 0.0);
        assert_eq!(ts.value_at(1.0), 0.0);
    }

    #[test]
    fn factor_and_start_time_apply() {
        let ts = TimeSeries::uniform(0.1, vec![2.0, 2.0])
            .unwrap()
            .with_factor(3.0)
            .with_start_time(1.0);
        assert_eq!(ts.value_at(0.5), 0.0);
        assert!((ts.value_at(1.05) - 6.0).abs() < 1e-12);
        assert!((ts.end_time() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn explicit_requires_increasing_times() {
        let err = TimeSeries::explicit(vec![0.0, 0.5, 0.5], vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, ConfigError::NonIncreasingTimes { index: 2, .. }));
    }

    #[test]
    fn explicit_interpolates() {
        let ts = TimeSeries::explicit(vec![0.0, 2.0], vec![0.0, 4.0]).unwrap();
        assert!((ts.value_at(0.5) - 1.0).abs() < 1e-12);
        assert_eq!(ts.value_at(3.0), 0.0);
    }

    #[test]
    fn windowed_sine_zero_outside_window() {
        let ts = TimeSeries::windowed_sine(0.5, 1.5, 0.2, 0.0)
            .unwrap()
            .with_factor(2.0);
        assert_eq!(ts.value_at(0.0), 0.0);
        assert_eq!(ts.value_at(2.0), 0.0);
        // quarter period past the window start
        assert!((ts.value_at(0.55) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_construction() {
        assert!(TimeSeries::uniform(0.0, vec![1.0]).is_err());
        assert!(TimeSeries::uniform(0.01, vec![]).is_err());
        assert!(TimeSeries::explicit(vec![0.0], vec![1.0, 2.0]).is_err());
        assert!(TimeSeries::windowed_sine(1.0, 0.5, 0.2, 0.0).is_err());
        assert!(TimeSeries::windowed_sine(0.0, 1.0, -0.2, 0.0).is_err());
    }
}
