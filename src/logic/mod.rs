//! Logic modules: translate the operator's choices into concrete actions.
//!
//! # Modules
//!
//! - `planner`: dependency-tier installation planning

pub mod planner;
