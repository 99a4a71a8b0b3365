//! I/O support for the oscillator dynamics engine.
//!
//! This crate provides:
//! - **PEER NGA** strong-motion record reader (`PeerRecord`)
//! - the record error taxonomy (`RecordFormatError`)
//!
//! Result writers live next to the result types in `sdof-solver`.

pub mod error;
pub mod peer;

pub use error::{RecordFormatError, Result};
pub use peer::PeerRecord;
