//! PEER NGA strong-motion record reader.
//!
//! PEER NGA text records carry a fixed four-line header followed by
//! whitespace-separated samples:
//!
//! ```text
//! PEER NGA STRONG MOTION DATABASE RECORD
//! <event information>
//! ACCELERATION TIME SERIES IN UNITS OF G
//! NPTS=  14000, DT=   .0100 SEC
//! <samples, row-major, left to right then top to bottom>
//! ```
//!
//! The first three lines are ignored; the fourth is scanned for the
//! comma-separated `NPTS=<int>` and `DT=<float>` fields (a unit token may
//! trail the DT value). The declared NPTS must match the number of parsed
//! samples exactly.

use crate::error::{RecordFormatError, Result};
use sdof_model::TimeSeries;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A parsed ground-motion record: sample count, spacing, and values in the
/// units the file was written in (typically g for acceleration records).
#[derive(Debug, Clone, PartialEq)]
pub struct PeerRecord {
    pub npts: usize,
    pub dt: f64,
    pub values: Vec<f64>,
}

impl PeerRecord {
    /// Read a record from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a record from any buffered reader.
    ///
    /// # Errors
    /// `RecordFormatError` if the header is truncated, NPTS/DT cannot be
    /// located, a sample fails to parse, or the declared NPTS disagrees with
    /// the parsed sample count.
    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<Self> {
        let mut line = String::new();

        // three ignored header lines
        for _ in 0..3 {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(RecordFormatError::TruncatedHeader);
            }
        }

        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(RecordFormatError::TruncatedHeader);
        }
        let (npts, dt) = parse_header_line(&line)?;

        let mut values = Vec::with_capacity(npts);
        let mut body = String::new();
        reader.read_to_string(&mut body)?;
        for (index, token) in body.split_whitespace().enumerate() {
            let v = token.parse::<f64>().map_err(|_| RecordFormatError::BadSample {
                index,
                value: token.to_string(),
            })?;
            values.push(v);
        }

        if values.len() != npts {
            return Err(RecordFormatError::SampleCountMismatch {
                declared: npts,
                parsed: values.len(),
            });
        }

        Ok(Self { npts, dt, values })
    }

    /// Convert into a uniform time series scaled by `factor` (e.g. the
    /// gravity constant to turn a record in g into acceleration units).
    pub fn into_series(self, factor: f64) -> TimeSeries {
        // dt > 0 and npts >= 1 were established by the parser
        TimeSeries::uniform(self.dt, self.values)
            .expect("parsed record satisfies series invariants")
            .with_factor(factor)
    }

    /// Duration covered by the samples.
    pub fn duration(&self) -> f64 {
        (self.npts.saturating_sub(1)) as f64 * self.dt
    }
}

/// Locate `NPTS=<int>` and `DT=<float>` among the comma-separated fields.
fn parse_header_line(line: &str) -> Result<(usize, f64)> {
    let mut npts: Option<usize> = None;
    let mut dt: Option<f64> = None;

    for part in line.split(',') {
        let text = part.trim();
        if let Some(rest) = field_value(text, "NPTS") {
            let parsed =
                rest.parse::<usize>()
                    .map_err(|_| RecordFormatError::BadHeaderValue {
                        field: "NPTS",
                        value: rest.to_string(),
                    })?;
            npts = Some(parsed);
        } else if let Some(rest) = field_value(text, "DT") {
            // a unit token may follow the number ("DT= .0100 SEC")
            let number = rest.split_whitespace().next().unwrap_or(rest);
            let parsed = number
                .parse::<f64>()
                .map_err(|_| RecordFormatError::BadHeaderValue {
                    field: "DT",
                    value: number.to_string(),
                })?;
            dt = Some(parsed);
        }
    }

    match (npts, dt) {
        (Some(n), Some(d)) if n >= 1 && d > 0.0 => Ok((n, d)),
        (Some(_), Some(d)) => Err(RecordFormatError::BadHeaderValue {
            field: "NPTS/DT",
            value: format!("npts must be >= 1 and dt > 0 (dt = {d})"),
        }),
        (None, _) => Err(RecordFormatError::MissingHeaderField {
            field: "NPTS",
            line: line.trim().to_string(),
        }),
        (_, None) => Err(RecordFormatError::MissingHeaderField {
            field: "DT",
            line: line.trim().to_string(),
        }),
    }
}

fn field_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let (name, value) = text.split_once('=')?;
    if name.trim().eq_ignore_ascii_case(key) {
        Some(value.trim())
    } else {
        None
    }
}
