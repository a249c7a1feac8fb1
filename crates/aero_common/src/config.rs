//! Aero Configuration
//!
//! Config file: --config PATH, $AERO_CONFIG, ~/.config/aero/config.toml
//! or /etc/aero/config.toml, first existing wins.

use crate::error::AeroError;
use crate::DEFAULT_BACKEND_URL;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "AERO_CONFIG";

/// Environment variable overriding the backend URL
pub const BACKEND_URL_ENV: &str = "AERO_BACKEND_URL";

/// How a poll tick with one failed call is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Data and status are applied independently as each succeeds
    #[default]
    PerField,
    /// A tick is applied only when both calls succeeded
    AllOrNothing,
}

/// Whether a crisis edge requests a heal regardless of mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealTriggerPolicy {
    /// Every crisis edge requests a heal
    #[default]
    Always,
    /// Only AUTO mode heals on its own; MANUAL waits for an explicit heal
    AutoOnly,
}

/// Backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the disruption service
    #[serde(default = "default_url")]
    pub url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Telemetry polling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Flights per page for `GET /data`
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default)]
    pub snapshot_policy: SnapshotPolicy,
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_page_size() -> u32 {
    20
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            page_size: default_page_size(),
            snapshot_policy: SnapshotPolicy::default(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Crisis handling and resolution behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub heal_trigger: HealTriggerPolicy,

    /// Keep pending options when an "applied" heal arrives in MANUAL mode
    #[serde(default)]
    pub preserve_options_in_manual: bool,

    #[serde(default = "default_delay_minutes")]
    pub default_delay_minutes: u32,

    #[serde(default = "default_max_delay_minutes")]
    pub max_delay_minutes: u32,
}

fn default_delay_minutes() -> u32 {
    60
}

fn default_max_delay_minutes() -> u32 {
    1440
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            heal_trigger: HealTriggerPolicy::default(),
            preserve_options_in_manual: false,
            default_delay_minutes: default_delay_minutes(),
            max_delay_minutes: default_max_delay_minutes(),
        }
    }
}

/// Decision audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Explicit path; discovered when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AeroConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

impl AeroConfig {
    /// ~/.config/aero/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aero").join("config.toml"))
    }

    /// /etc/aero/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/aero/config.toml")
    }

    /// Load configuration, then apply environment overrides.
    ///
    /// Priority:
    /// 1. Explicit path (must exist)
    /// 2. $AERO_CONFIG
    /// 3. User config
    /// 4. System config
    /// 5. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => match Self::discover() {
                Some(path) => Self::load_from(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    fn discover() -> Option<PathBuf> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        env_path
            .into_iter()
            .chain(Self::user_config_path())
            .chain(std::iter::once(Self::system_config_path()))
            .find(|path| path.exists())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: AeroConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.backend.url = url;
            }
        }
    }

    /// Write pretty TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, toml_string).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AeroError> {
        if self.backend.url.trim().is_empty() {
            return Err(AeroError::Config("backend.url is empty".into()));
        }
        if self.polling.interval_ms == 0 {
            return Err(AeroError::Config("polling.interval_ms must be > 0".into()));
        }
        if self.polling.page_size == 0 {
            return Err(AeroError::Config("polling.page_size must be > 0".into()));
        }
        let orch = &self.orchestrator;
        if orch.default_delay_minutes == 0 || orch.default_delay_minutes > orch.max_delay_minutes {
            return Err(AeroError::Config(format!(
                "orchestrator.default_delay_minutes must be within 1..={}",
                orch.max_delay_minutes
            )));
        }
        Ok(())
    }
}
