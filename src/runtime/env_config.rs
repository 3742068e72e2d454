//! Environment variable and config file support for [`RuntimeConfig`].
//!
//! # Configuration Precedence
//!
//! 1. **Programmatic**: setters called after loading
//! 2. **Environment variables**: `PLEDGE_*`
//! 3. **Config file**: TOML (requires `config-file` feature)
//! 4. **Defaults**: [`RuntimeConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `PLEDGE_MAX_STEPS` | `u64` or `unlimited` | `max_steps` |
//! | `PLEDGE_REPORT_CANCELLATIONS` | `bool` | `report_cancellations` |
//! | `PLEDGE_TRACE_SETTLEMENTS` | `bool` | `trace_settlements` |

use crate::runtime::config::RuntimeConfig;

/// Environment variable name for the per-drain microtask ceiling.
pub const ENV_MAX_STEPS: &str = "PLEDGE_MAX_STEPS";
/// Environment variable name for reporting unobserved cancellations.
pub const ENV_REPORT_CANCELLATIONS: &str = "PLEDGE_REPORT_CANCELLATIONS";
/// Environment variable name for settlement tracing.
pub const ENV_TRACE_SETTLEMENTS: &str = "PLEDGE_TRACE_SETTLEMENTS";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to an unparseable value.
    #[error("invalid value for {var}: expected {expected}, got {value:?}")]
    InvalidValue {
        /// Variable or key name.
        var: &'static str,
        /// What was expected.
        expected: &'static str,
        /// The raw value.
        value: String,
    },
    /// The TOML document could not be parsed.
    #[error("failed to parse TOML config: {0}")]
    Toml(String),
}

/// Apply environment variable overrides to a [`RuntimeConfig`].
///
/// Only variables that are set in the environment are applied.
pub fn apply_env_overrides(config: &mut RuntimeConfig) -> Result<(), ConfigError> {
    if let Some(val) = read_env(ENV_MAX_STEPS) {
        config.max_steps = parse_steps(ENV_MAX_STEPS, &val)?;
    }
    if let Some(val) = read_env(ENV_REPORT_CANCELLATIONS) {
        config.report_cancellations = parse_bool(ENV_REPORT_CANCELLATIONS, &val)?;
    }
    if let Some(val) = read_env(ENV_TRACE_SETTLEMENTS) {
        config.trace_settlements = parse_bool(ENV_TRACE_SETTLEMENTS, &val)?;
    }
    config.normalize();
    Ok(())
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_steps(var: &'static str, val: &str) -> Result<Option<u64>, ConfigError> {
    let trimmed = val.trim();
    if trimmed.eq_ignore_ascii_case("unlimited") || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue {
            var,
            expected: "unsigned integer or \"unlimited\"",
            value: val.to_string(),
        })
}

fn parse_bool(var: &'static str, val: &str) -> Result<bool, ConfigError> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            expected: "bool (true/false/1/0/yes/no)",
            value: val.to_string(),
        }),
    }
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable runtime configuration.
///
/// ```toml
/// [runtime]
/// max_steps = 50000
/// report_cancellations = true
/// trace_settlements = false
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct RuntimeTomlConfig {
    /// Runtime settings.
    #[serde(default)]
    pub runtime: RuntimeToml,
}

/// `[runtime]` section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct RuntimeToml {
    /// Per-drain microtask ceiling; `0` means unlimited.
    pub max_steps: Option<u64>,
    /// Report unobserved cancellations.
    pub report_cancellations: Option<bool>,
    /// Trace settlement transitions.
    pub trace_settlements: Option<bool>,
}

/// Apply a parsed TOML config to a [`RuntimeConfig`].
#[cfg(feature = "config-file")]
pub fn apply_toml_config(config: &mut RuntimeConfig, toml: &RuntimeTomlConfig) {
    if let Some(v) = toml.runtime.max_steps {
        config.max_steps = (v != 0).then_some(v);
    }
    if let Some(v) = toml.runtime.report_cancellations {
        config.report_cancellations = v;
    }
    if let Some(v) = toml.runtime.trace_settlements {
        config.trace_settlements = v;
    }
}

/// Parse a TOML string into a [`RuntimeTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_str(toml_str: &str) -> Result<RuntimeTomlConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::Toml(e.to_string()))
}
