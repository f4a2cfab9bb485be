//! Process wiring for the `epochid` binary.
//!
//! - [`config`] - CLI/environment arguments and their conversion into a
//!   validated generator configuration.
//! - [`telemetry`] - `tracing` subscriber setup.

pub mod config;
pub mod telemetry;
