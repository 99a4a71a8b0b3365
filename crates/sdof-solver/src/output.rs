//! Text writers for run and sweep results.
//!
//! History files carry one line per committed step (time, displacement,
//! velocity, acceleration, element force, support reaction, load factor);
//! spectrum files carry one line per period. Concurrent sweep runs must not
//! share one output path — callers derive a distinct path per run, e.g. with
//! `period_suffixed_path`.

use crate::recorder::ResponseRecorder;
use crate::spectrum::SpectrumPoint;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write the committed trajectory of one run.
///
/// Vector quantities are written DOF by DOF in numbering order.
pub fn write_history(path: &Path, recorder: &ResponseRecorder) -> io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(
        file,
        "# time  disp..  vel..  accel..  force..  reaction..  load_factor"
    )?;
    for step in recorder.steps() {
        write!(file, "{:13.6E}", step.time)?;
        for block in [
            &step.displacement,
            &step.velocity,
            &step.acceleration,
            &step.restoring_force,
            &step.support_reaction,
        ] {
            for value in block.iter() {
                write!(file, " {:13.6E}", value)?;
            }
        }
        writeln!(file, " {:13.6E}", step.load_factor)?;
    }
    Ok(())
}

/// Write one line per period of a completed sweep.
///
/// Failed periods are kept, marked by status, with peaks over their
/// committed prefix.
pub fn write_spectrum(path: &Path, points: &[SpectrumPoint]) -> io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(
        file,
        "# period  Sd  Sv  Sa  Fmax  Emax  Ve  status"
    )?;
    for p in points {
        let status = if p.outcome.is_completed() {
            "complete"
        } else {
            "failed"
        };
        writeln!(
            file,
            "{:13.6E} {:13.6E} {:13.6E} {:13.6E} {:13.6E} {:13.6E} {:13.6E} {}",
            p.period,
            p.peak_displacement,
            p.peak_velocity,
            p.peak_acceleration,
            p.peak_force,
            p.peak_input_energy,
            p.energy_velocity,
            status
        )?;
    }
    Ok(())
}

/// Distinct per-run path for sweep artifacts: `dir/stem_T<period>.dat`.
pub fn period_suffixed_path(dir: &Path, stem: &str, period: f64) -> PathBuf {
    dir.join(format!("{stem}_T{period:.4}.dat"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RunOutcome;
    use crate::recorder::StepState;
    use nalgebra::DVector;

    #[test]
    fn history_has_one_line_per_step_plus_header() {
        let mut recorder = ResponseRecorder::new();
        for i in 1..=3 {
            let v = DVector::from_vec(vec![i as f64]);
            recorder.record(StepState {
                time: 0.01 * i as f64,
                displacement: v.clone(),
                velocity: v.clone(),
                acceleration: v.clone(),
                restoring_force: v.clone(),
                support_reaction: -v.clone(),
                load_factor: 0.0,
            });
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.dat");
        write_history(&path, &recorder).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.lines().nth(1).unwrap().contains("1.000000E-2"));
    }

    #[test]
    fn spectrum_marks_failed_periods() {
        let point = |period: f64, outcome: RunOutcome| SpectrumPoint {
            period,
            peak_displacement: 0.1,
            peak_velocity: 1.0,
            peak_acceleration: 10.0,
            peak_force: 20.0,
            peak_input_energy: 0.5,
            energy_velocity: 1.0,
            outcome,
        };
        let points = vec![
            point(0.1, RunOutcome::Completed),
            point(
                0.2,
                RunOutcome::Failed {
                    step: 7,
                    reason: crate::analysis::FailureReason::IterationLimit {
                        iterations: 50,
                        residual_norm: 1.0,
                    },
                },
            ),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectrum.dat");
        write_spectrum(&path, &points).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().nth(1).unwrap().ends_with("complete"));
        assert!(text.lines().nth(2).unwrap().ends_with("failed"));
    }

    #[test]
    fn per_period_paths_are_distinct() {
        let dir = Path::new("/tmp/out");
        let a = period_suffixed_path(dir, "history", 0.1);
        let b = period_suffixed_path(dir, "history", 0.2);
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with("history_T0.1000.dat"));
    }
}
