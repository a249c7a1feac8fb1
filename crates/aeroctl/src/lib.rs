//! aeroctl - disruption resolution orchestrator for airline operations
//!
//! Polls the optimisation backend, detects crises, requests heals and walks
//! the operator through the resulting resolution options.

pub mod backend;
pub mod console;
pub mod errors;
pub mod logging;
pub mod orchestrator;
pub mod output;
