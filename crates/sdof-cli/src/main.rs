use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use sdof_io::PeerRecord;
use sdof_model::{
    DampingSpec, Excitation, ExcitationComponent, GroundMotion, IterationParams, NewmarkParams,
    OscillatorSpec, MaterialSpec, SweepGrid,
};
use sdof_solver::{
    AnalysisConfig, SweepConfig, SweepMaterial, sweep, write_history, write_spectrum,
};

/// Acceleration records in g are scaled by gravity in mm/s².
const GRAVITY_MM_S2: f64 = 9810.0;

fn usage() {
    eprintln!("usage: sdof-cli transient <record.AT2> <mass> <stiffness> <damping_ratio>");
    eprintln!("       sdof-cli spectrum <record.AT2> <mass> <t_start> <t_stop> <t_step> <damping_ratio> [out_dir]");
}

fn parse_f64(name: &str, text: &str) -> Result<f64, String> {
    text.parse::<f64>()
        .map_err(|_| format!("invalid {name}: {text}"))
}

fn read_excitation(path: &str) -> Result<(Excitation, f64, usize), String> {
    let record = PeerRecord::from_file(path).map_err(|e| format!("record error: {e}"))?;
    let dt = record.dt;
    let npts = record.npts;
    let series = record.into_series(GRAVITY_MM_S2);
    let excitation = Excitation::uniform(ExcitationComponent::new(
        GroundMotion::from_acceleration(series),
        1.0,
        0.0,
    ));
    Ok((excitation, dt, npts))
}

fn run_transient(args: &[String]) -> Result<(), String> {
    let [record_path, mass, stiffness, ratio] = args else {
        return Err("transient expects 4 arguments".to_string());
    };
    let mass = parse_f64("mass", mass)?;
    let stiffness = parse_f64("stiffness", stiffness)?;
    let ratio = parse_f64("damping ratio", ratio)?;

    let (excitation, dt, npts) = read_excitation(record_path)?;
    println!("record: {record_path} ({npts} samples, dt = {dt})");

    let config = AnalysisConfig::transient(
        OscillatorSpec::single(mass, MaterialSpec::Elastic { stiffness }),
        DampingSpec::mass_proportional(ratio),
        excitation,
        dt,
        npts,
    );
    let result = config.run().map_err(|e| format!("solve error: {e}"))?;

    println!("steps committed: {}", result.recorder.len());
    if let Some(err) = result.as_error() {
        println!("terminated early: {err}");
    }
    println!("peak |u| = {:.6E}", result.recorder.peak_displacement());
    println!("peak |v| = {:.6E}", result.recorder.peak_velocity());
    println!("peak |a| = {:.6E}", result.recorder.peak_acceleration());
    println!("peak |F| = {:.6E}", result.recorder.peak_force());

    let out = history_path(record_path);
    write_history(&out, &result.recorder).map_err(|e| format!("write error: {e}"))?;
    println!("history written to {}", out.display());
    Ok(())
}

fn run_spectrum(args: &[String]) -> Result<(), String> {
    let out_dir = match args.len() {
        6 => PathBuf::from("."),
        7 => PathBuf::from(&args[6]),
        _ => return Err("spectrum expects 6 or 7 arguments".to_string()),
    };
    let required = &args[..6];
    let record_path = &required[0];
    let mass = parse_f64("mass", &required[1])?;
    let t_start = parse_f64("t_start", &required[2])?;
    let t_stop = parse_f64("t_stop", &required[3])?;
    let t_step = parse_f64("t_step", &required[4])?;
    let ratio = parse_f64("damping ratio", &required[5])?;

    let (excitation, dt, npts) = read_excitation(record_path)?;
    println!("record: {record_path} ({npts} samples, dt = {dt})");

    let grid = SweepGrid::new(t_start, t_stop, t_step).map_err(|e| format!("grid error: {e}"))?;
    let config = SweepConfig {
        mass,
        grid,
        material: SweepMaterial::Elastic,
        damping: DampingSpec::mass_proportional(ratio),
        excitation,
        time_step: dt,
        num_steps: Some(npts),
        newmark: NewmarkParams::default(),
        iteration: IterationParams::default(),
    };

    let points = sweep(&config).map_err(|e| format!("sweep error: {e}"))?;
    let failed = points.iter().filter(|p| !p.outcome.is_completed()).count();
    println!(
        "swept {} periods ({} complete, {} failed)",
        points.len(),
        points.len() - failed,
        failed
    );
    println!("{:>8}  {:>12}  {:>12}  {:>12}", "T", "Sd", "Sv", "Sa");
    for p in &points {
        println!(
            "{:8.3}  {:12.5E}  {:12.5E}  {:12.5E}",
            p.period, p.peak_displacement, p.peak_velocity, p.peak_acceleration
        );
    }

    std::fs::create_dir_all(&out_dir).map_err(|e| format!("output dir error: {e}"))?;
    let stem = record_stem(record_path);
    let dat_path = out_dir.join(format!("{stem}_spectrum.dat"));
    write_spectrum(&dat_path, &points).map_err(|e| format!("write error: {e}"))?;

    let json_path = out_dir.join(format!("{stem}_spectrum.json"));
    let report = serde_json::json!({
        "record": record_path,
        "generated": Local::now().to_rfc3339(),
        "mass": mass,
        "damping_ratio": ratio,
        "points": points,
    });
    std::fs::write(
        &json_path,
        serde_json::to_string_pretty(&report).map_err(|e| format!("json error: {e}"))?,
    )
    .map_err(|e| format!("write error: {e}"))?;

    println!("spectrum written to {} and {}", dat_path.display(), json_path.display());
    Ok(())
}

fn record_stem(record_path: &str) -> String {
    Path::new(record_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "record".to_string())
}

fn history_path(record_path: &str) -> PathBuf {
    PathBuf::from(format!("{}_history.dat", record_stem(record_path)))
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        usage();
        return ExitCode::from(2);
    };

    let outcome = match command.as_str() {
        "transient" => run_transient(&args[1..]),
        "spectrum" => run_spectrum(&args[1..]),
        _ => {
            usage();
            return ExitCode::from(2);
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::from(1)
        }
    }
}
