//! Portal configuration - service settings as operator-tunable TOML values
//!
//! Each struct implements `Default` with values matching the documented
//! constants, ensuring unchanged behavior when no config file is present.
//! Risk-engine weights are deliberately NOT configurable: scoring must be
//! identical across deployments for the audit trail to mean anything.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::collaborators::RetryPolicy;
use crate::memory::DEFAULT_RADIUS_M;
use crate::pipeline::IntakeSettings;

/// Environment variable naming a config file path
pub const CONFIG_ENV_VAR: &str = "JANSAHAYAK_CONFIG";
/// Default config file searched in the working directory
pub const CONFIG_FILE: &str = "jansahayak.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a portal deployment.
///
/// Load with `PortalConfig::load()` which searches:
/// 1. `$JANSAHAYAK_CONFIG` env var
/// 2. `./jansahayak.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PortalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub recurrence: RecurrenceConfig,

    #[serde(default)]
    pub collaborators: CollaboratorsConfig,

    #[serde(default)]
    pub backfill: BackfillConfig,
}

impl PortalConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!(path = %path, "loaded config from {}", CONFIG_ENV_VAR);
                    return config;
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "failed to load config from env var, falling back");
                }
            }
        }

        if Path::new(CONFIG_FILE).exists() {
            match Self::load_from_file(CONFIG_FILE) {
                Ok(config) => {
                    info!("loaded config from ./{}", CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "failed to parse ./{}, using defaults", CONFIG_FILE);
                }
            }
        }

        info!("no config file found, using built-in defaults");
        Self::default()
    }

    /// Parse a specific TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&text)?)
    }

    /// Collapse the collaborator timing fields into a retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.collaborators.retry_attempts.max(1),
            timeout: Duration::from_secs(self.collaborators.timeout_secs),
            backoff: Duration::from_millis(self.collaborators.backoff_ms),
        }
    }

    /// Everything the orchestrator needs from this config.
    pub fn intake_settings(&self) -> IntakeSettings {
        IntakeSettings {
            retry: self.retry_policy(),
            recurrence_radius_m: self.recurrence.radius_m,
            recurrence_lookback: self
                .recurrence
                .lookback_days
                .map(|days| chrono::Duration::days(days as i64)),
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the API server
    #[serde(default = "default_addr")]
    pub addr: String,
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

/// Persistent storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sled database
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Recurrence matching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    /// Spatial match radius in metres
    #[serde(default = "default_radius_m")]
    pub radius_m: f64,
    /// Lookback window in days; absent means unlimited
    #[serde(default)]
    pub lookback_days: Option<u32>,
}

fn default_radius_m() -> f64 {
    DEFAULT_RADIUS_M
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            radius_m: default_radius_m(),
            lookback_days: None,
        }
    }
}

/// External collaborator endpoints and timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorsConfig {
    /// Vision service endpoint
    #[serde(default = "default_vision_url")]
    pub vision_url: String,
    /// Planning service endpoint
    #[serde(default = "default_planning_url")]
    pub planning_url: String,
    /// Optional notification webhook; absent means log-only notifications
    #[serde(default)]
    pub notification_url: Option<String>,
    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per collaborator call (first call + retries)
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Base backoff between attempts in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_vision_url() -> String {
    "http://localhost:9081/analyze".to_string()
}

fn default_planning_url() -> String {
    "http://localhost:9082/plan".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    500
}

impl Default for CollaboratorsConfig {
    fn default() -> Self {
        Self {
            vision_url: default_vision_url(),
            planning_url: default_planning_url(),
            notification_url: None,
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Plan backfill loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillConfig {
    #[serde(default = "default_backfill_enabled")]
    pub enabled: bool,
    /// Seconds between backfill sweeps
    #[serde(default = "default_backfill_interval_secs")]
    pub interval_secs: u64,
}

fn default_backfill_enabled() -> bool {
    true
}

fn default_backfill_interval_secs() -> u64 {
    300
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            enabled: default_backfill_enabled(),
            interval_secs: default_backfill_interval_secs(),
        }
    }
}
