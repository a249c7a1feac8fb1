//! Aero Common - shared types for the disruption resolution orchestrator
//!
//! Data model, backend wire protocol, error taxonomy and configuration.
//! Nothing in here performs network I/O.

pub mod config;
pub mod error;
pub mod model;
pub mod protocol;
pub mod workflow;

pub use config::{
    AeroConfig, AuditConfig, BackendConfig, HealTriggerPolicy, OrchestratorConfig, PollingConfig,
    SnapshotPolicy,
};
pub use error::AeroError;
pub use model::*;
pub use protocol::*;

/// Backend location when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Separator used by console output
pub const THIN_SEPARATOR: &str = "------------------------------------------------------------";
