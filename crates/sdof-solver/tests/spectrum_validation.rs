//! Validation tests for the response-spectrum sweeper
//!
//! Test cases:
//! 1. Rigid-oscillator limit - Sa approaches the peak ground acceleration
//! 2. Flexible-oscillator limit - Sd approaches the peak ground displacement
//! 3. Partial failure - failed periods are flagged, never omitted
//! 4. Energy velocity is finite and non-negative across the grid

use sdof_model::{
    DampingSpec, Excitation, ExcitationComponent, GroundMotion, IterationParams, NewmarkParams,
    SweepGrid, TimeSeries,
};
use sdof_solver::{RunOutcome, SweepConfig, SweepMaterial, sweep};

const DT: f64 = 0.002;
const PULSE_PERIOD: f64 = 0.5;
const PULSE_AMPLITUDE: f64 = 2.0;

/// One full sine cycle of ground acceleration, then quiet.
fn pulse_values(num_samples: usize) -> Vec<f64> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 * DT;
            if t <= PULSE_PERIOD {
                PULSE_AMPLITUDE * (2.0 * std::f64::consts::PI * t / PULSE_PERIOD).sin()
            } else {
                0.0
            }
        })
        .collect()
}

fn pulse_excitation(num_samples: usize) -> Excitation {
    Excitation::uniform(ExcitationComponent::new(
        GroundMotion::from_acceleration(TimeSeries::uniform(DT, pulse_values(num_samples)).unwrap()),
        1.0,
        0.0,
    ))
}

/// Peak ground displacement by double trapezoidal integration of the pulse.
fn peak_ground_displacement(num_samples: usize) -> f64 {
    let values = pulse_values(num_samples);
    let mut vel = 0.0;
    let mut disp = 0.0;
    let mut prev_a = values[0];
    let mut prev_v = 0.0;
    let mut peak = 0.0_f64;
    for &a in &values[1..] {
        vel += 0.5 * (prev_a + a) * DT;
        disp += 0.5 * (prev_v + vel) * DT;
        prev_a = a;
        prev_v = vel;
        peak = peak.max(disp.abs());
    }
    peak
}

fn config(grid: SweepGrid, num_samples: usize) -> SweepConfig {
    SweepConfig {
        mass: 1.0,
        grid,
        material: SweepMaterial::Elastic,
        damping: DampingSpec::mass_proportional(0.02),
        excitation: pulse_excitation(num_samples),
        time_step: DT,
        num_steps: Some(num_samples - 1),
        newmark: NewmarkParams::default(),
        iteration: IterationParams::default(),
    }
}

/// Test 1: Sa → PGA as T → 0
///
/// A very stiff oscillator rides the ground: its peak total acceleration
/// must land near the peak ground acceleration. Verified within a generous
/// band rather than exact equality.
#[test]
fn test_rigid_limit_recovers_pga() {
    let grid = SweepGrid::new(0.05, 0.05, 1.0).unwrap();
    let points = sweep(&config(grid, 1000)).unwrap();
    assert_eq!(points.len(), 1);
    let sa = points[0].peak_acceleration;
    println!("=== Rigid limit ===");
    println!("Sa(0.05) = {sa:.4}, PGA = {PULSE_AMPLITUDE}");
    assert!(
        (sa - PULSE_AMPLITUDE).abs() / PULSE_AMPLITUDE < 0.25,
        "Sa {sa} should approach PGA {PULSE_AMPLITUDE}"
    );
}

/// Test 2: Sd → PGD as T → ∞
///
/// A very flexible oscillator leaves its mass behind: the peak relative
/// displacement must land near the peak ground displacement.
#[test]
fn test_flexible_limit_recovers_pgd() {
    let num_samples = 3000; // 6 s: room for the long-period response to peak
    let grid = SweepGrid::new(5.0, 5.0, 1.0).unwrap();
    let points = sweep(&config(grid, num_samples)).unwrap();
    assert_eq!(points.len(), 1);

    let sd = points[0].peak_displacement;
    let pgd = peak_ground_displacement(num_samples);
    println!("=== Flexible limit ===");
    println!("Sd(5.0) = {sd:.5}, PGD = {pgd:.5}");
    assert!(pgd > 0.0);
    assert!(
        (sd - pgd).abs() / pgd < 0.35,
        "Sd {sd} should approach PGD {pgd}"
    );
}

/// Test 3: A forced failure never drops spectrum entries.
#[test]
fn test_partial_failure_keeps_every_period() {
    let grid = SweepGrid::new(0.2, 1.0, 0.2).unwrap();
    let mut cfg = config(grid, 500);
    cfg.iteration.max_iterations = 0; // every Newton solve fails immediately
    let points = sweep(&cfg).unwrap();

    assert_eq!(points.len(), 5, "one entry per requested period");
    for p in &points {
        assert!(
            matches!(p.outcome, RunOutcome::Failed { .. }),
            "period {} must be flagged as failed",
            p.period
        );
    }
    // the same grid with a sane budget completes everywhere
    let points = sweep(&config(grid, 500)).unwrap();
    assert!(points.iter().all(|p| p.outcome.is_completed()));
}

/// Test 4: Energy metrics are well-formed across a grid.
#[test]
fn test_energy_velocity_is_finite_and_ordered() {
    let grid = SweepGrid::new(0.2, 1.4, 0.3).unwrap();
    let points = sweep(&config(grid, 1500)).unwrap();
    assert_eq!(points.len(), 5);
    for p in &points {
        assert!(p.outcome.is_completed());
        assert!(p.peak_input_energy.is_finite());
        assert!(p.peak_input_energy >= 0.0);
        assert!(p.energy_velocity.is_finite());
        // Ve = √(2E/M) must be consistent with the reported energy
        let expected = (2.0 * p.peak_input_energy / 1.0).sqrt();
        assert!((p.energy_velocity - expected).abs() < 1e-9);
    }
    // periods come back ordered regardless of worker completion order
    assert!(points.windows(2).all(|w| w[0].period < w[1].period));
}
