//! Runtime configuration types.
//!
//! A [`RuntimeConfig`] is installed per event-loop thread with
//! [`configure`](super::configure). Values can come from code, from
//! `PLEDGE_*` environment variables ([`RuntimeConfig::from_env`]) or, with the
//! `config-file` feature, from a TOML document.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `max_steps` | `Some(1_000_000)` |
//! | `report_cancellations` | `false` |
//! | `trace_settlements` | `false` |

use super::env_config::{apply_env_overrides, ConfigError};

/// Default microtask ceiling for a single drain.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

/// Event-loop configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum microtasks run by one drain before it bails out (`None` = unlimited).
    pub max_steps: Option<u64>,
    /// Report cancelled futures that are dropped without a rejection handler.
    pub report_cancellations: bool,
    /// Emit a trace event for every settlement transition.
    pub trace_settlements: bool,
}

impl RuntimeConfig {
    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Parses a TOML document and applies it over the defaults.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let parsed = super::env_config::parse_toml_str(toml_str)?;
        let mut config = Self::default();
        super::env_config::apply_toml_config(&mut config, &parsed);
        Ok(config)
    }

    /// Sets the microtask ceiling per drain.
    #[must_use]
    pub const fn max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets whether dropped, unobserved cancellations are reported.
    #[must_use]
    pub const fn report_cancellations(mut self, value: bool) -> Self {
        self.report_cancellations = value;
        self
    }

    /// Sets whether settlement transitions are traced.
    #[must_use]
    pub const fn trace_settlements(mut self, value: bool) -> Self {
        self.trace_settlements = value;
        self
    }

    /// Normalize configuration values to safe defaults.
    pub fn normalize(&mut self) {
        if self.max_steps == Some(0) {
            self.max_steps = Some(1);
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(DEFAULT_MAX_STEPS),
            report_cancellations: false,
            trace_settlements: false,
        }
    }
}
