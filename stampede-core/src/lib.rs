//! Shared data types for the stampede load-generation harness.
//!
//! This crate holds the run configuration, per-request outcome records, the
//! final run summary, and the error taxonomy. The engine itself lives in the
//! `stampede` crate.

mod config;
mod constants;
mod data;
mod error;
mod stats;

pub use config::*;
pub use constants::*;
pub use data::*;
pub use error::*;
pub use stats::*;
