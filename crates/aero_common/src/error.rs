//! Error types for the orchestrator.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AeroError {
    #[error("Backend unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Backend returned HTTP {status} for {endpoint}: {body}")]
    Backend {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Invalid delay value '{0}': expected a whole number of minutes")]
    InvalidDelay(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No pending option with id {0}")]
    UnknownOption(String),

    #[error("Cannot {action} while {phase}")]
    InvalidTransition { action: &'static str, phase: String },

    #[error("{0} request already in flight")]
    Busy(&'static str),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AeroError {
    pub fn code(&self) -> i32 {
        match self {
            AeroError::Unreachable { .. } => -32000,
            AeroError::Backend { .. } => -32001,
            AeroError::Decode { .. } => -32002,
            AeroError::InvalidDelay(_) => -32602,
            AeroError::InvalidInput(_) => -32600,
            AeroError::UnknownOption(_) => -32003,
            AeroError::InvalidTransition { .. } => -32004,
            AeroError::Busy(_) => -32005,
            AeroError::Config(_) => -32006,
            AeroError::Io(_) => -32007,
            AeroError::Json(_) => -32700,
        }
    }

    /// Transport-level failures that the next poll or an explicit retry may clear
    pub fn is_transient(&self) -> bool {
        match self {
            AeroError::Unreachable { .. } => true,
            AeroError::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Errors caused by operator input rather than the backend
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AeroError::InvalidDelay(_)
                | AeroError::InvalidInput(_)
                | AeroError::UnknownOption(_)
                | AeroError::InvalidTransition { .. }
        )
    }
}
