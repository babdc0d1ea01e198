//! Typed argument structs for every external program jarvis-setup runs.
//!
//! - `python`: interpreter version query, `venv`, `pip`, import checks
//! - `system`: PATH lookups for toolchain and runtime probes

pub mod python;
pub mod system;
