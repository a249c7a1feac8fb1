//! Logging for aeroctl
//!
//! Diagnostics go through `tracing` to stderr. Heal outcomes and resolve
//! attempts are also appended to a JSONL decision log.

use aero_common::{AuditConfig, OrchestratorMode, ResolutionOption};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter
pub const LOG_FILTER_ENV: &str = "AERO_LOG";

/// Install the stderr subscriber; `verbose` lowers the default level to debug
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// One decision log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEntry {
    /// RFC 3339 timestamp
    pub ts: String,

    /// Request ID (UUID)
    pub req_id: String,

    /// heal, resolve or auto_resolve
    pub event: String,

    pub mode: OrchestratorMode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,

    /// Heal status or resolve acknowledgement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,

    pub ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DecisionEntry {
    pub fn new(event: &str, mode: OrchestratorMode) -> Self {
        Self {
            ts: Self::now(),
            req_id: Self::generate_req_id(),
            event: event.to_string(),
            mode,
            option_id: None,
            action_type: None,
            outcome: None,
            ok: true,
            error: None,
        }
    }

    pub fn option(mut self, option: &ResolutionOption) -> Self {
        self.option_id = Some(option.id.to_string());
        self.action_type = Some(option.action_type.to_string());
        self
    }

    pub fn outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    pub fn failed(mut self, error: impl ToString) -> Self {
        self.ok = false;
        self.error = Some(error.to_string());
        self
    }

    pub fn generate_req_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

/// Append-only JSONL sink for decisions
#[derive(Debug, Clone)]
pub struct DecisionLog {
    path: Option<PathBuf>,
    enabled: bool,
}

impl DecisionLog {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            path: config.path.clone().or_else(Self::discover_path),
            enabled: config.enabled,
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            enabled: false,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Discover log file path with fallback chain
    ///
    /// Priority:
    /// 1. $AEROCTL_AUDIT_FILE (explicit override)
    /// 2. $XDG_STATE_HOME/aero/decisions.jsonl
    /// 3. ~/.local/state/aero/decisions.jsonl
    fn discover_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("AEROCTL_AUDIT_FILE") {
            return Some(PathBuf::from(path));
        }

        if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
            return Some(Path::new(&xdg_state).join("aero").join("decisions.jsonl"));
        }

        if let Ok(home) = std::env::var("HOME") {
            return Some(
                Path::new(&home)
                    .join(".local")
                    .join("state")
                    .join("aero")
                    .join("decisions.jsonl"),
            );
        }

        None
    }

    /// Append an entry; falls back to the tracing log when the file is not writable
    pub fn record(&self, entry: &DecisionEntry) {
        if !self.enabled {
            return;
        }

        let json = match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "cannot serialize decision entry");
                return;
            }
        };

        match &self.path {
            Some(path) => {
                if let Err(e) = Self::append(path, &json) {
                    warn!(path = %path.display(), error = %e, "decision log not writable");
                    info!(target: "decision", "{}", json);
                }
            }
            None => info!(target: "decision", "{}", json),
        }
    }

    fn append(path: &Path, json: &str) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// Read back every entry (used by `aeroctl history`)
    pub fn read_all(&self) -> Result<Vec<DecisionEntry>, std::io::Error> {
        let path = match &self.path {
            Some(path) if path.exists() => path,
            _ => return Ok(Vec::new()),
        };
        let contents = std::fs::read_to_string(path)?;
        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aero_common::ActionType;
    use tempfile::TempDir;

    #[test]
    fn test_entries_append_as_lines() {
        let dir = TempDir::new().unwrap();
        let log = DecisionLog::at(dir.path().join("state").join("decisions.jsonl"));

        let option = ResolutionOption::new(1, ActionType::DelayApply);
        log.record(&DecisionEntry::new("resolve", OrchestratorMode::Manual).option(&option));
        log.record(
            &DecisionEntry::new("heal", OrchestratorMode::Auto).failed("backend unreachable"),
        );

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action_type.as_deref(), Some("DELAY_APPLY"));
        assert!(entries[0].ok);
        assert!(!entries[1].ok);
        assert_ne!(entries[0].req_id, entries[1].req_id);
    }

    #[test]
    fn test_disabled_log_writes_nothing() {
        let log = DecisionLog::disabled();
        log.record(&DecisionEntry::new("heal", OrchestratorMode::Auto));
        assert!(log.read_all().unwrap().is_empty());
    }
}
