//! Portal Configuration Module
//!
//! Runtime configuration loaded from TOML, replacing hardcoded service
//! settings with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `JANSAHAYAK_CONFIG` environment variable (path to TOML file)
//! 2. `jansahayak.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(PortalConfig::load());
//!
//! // Anywhere in the codebase:
//! let radius = config::get().recurrence.radius_m;
//! ```

mod portal_config;

pub use portal_config::*;

use std::sync::OnceLock;

/// Global portal configuration, initialized once at startup.
static PORTAL_CONFIG: OnceLock<PortalConfig> = OnceLock::new();

/// Initialize the global portal configuration.
///
/// Must be called exactly once before any calls to `get()`.
pub fn init(config: PortalConfig) {
    if PORTAL_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global portal configuration.
///
/// Panics if `init()` has not been called. A missing config is a fatal
/// startup error, not a recoverable condition.
pub fn get() -> &'static PortalConfig {
    PORTAL_CONFIG
        .get()
        .expect("config::get() called before config::init() — this is a startup bug")
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    PORTAL_CONFIG.get().is_some()
}
