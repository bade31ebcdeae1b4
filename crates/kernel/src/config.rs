//! Configuration for the event kernel.
//!
//! This module defines the knobs a session can be constructed with. It
//! provides:
//! 1. **Defaults:** Baseline constants used when a field is not overridden.
//! 2. **Structure:** A serde-deserializable config so embedding frameworks
//!    can supply settings as JSON.
//!
//! Use `KernelConfig::default()` for a plain session, or deserialize with
//! [`KernelConfig::from_json`].

use serde::Deserialize;

/// Default configuration constants for the kernel.
mod defaults {
    /// Base string for generated event names (`event_0`, `event_1`, ...).
    ///
    /// Used for internal events and for events declared without a basename.
    pub const AUTO_NAME_BASE: &str = "event";

    /// Delta rounds allowed at one instant before the run is aborted.
    ///
    /// A model with a zero-delay notification feedback loop re-triggers
    /// itself forever without simulated time advancing; this bound turns
    /// that hang into a reportable error. `None` disables the check.
    pub const DELTA_LIMIT: Option<u64> = Some(100_000);

    pub const fn auto_name_base() -> String {
        String::new()
    }

    pub const fn delta_limit() -> Option<u64> {
        DELTA_LIMIT
    }
}

/// Kernel session configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct KernelConfig {
    /// Base string for generated event names. An empty string falls back to
    /// the built-in default.
    #[serde(default = "defaults::auto_name_base")]
    pub auto_name_base: String,

    /// Delta rounds allowed at a single instant before `run`/`step` fail
    /// with `DeltaLimitExceeded`; `None` disables the check.
    #[serde(default = "defaults::delta_limit")]
    pub delta_limit: Option<u64>,

    /// Emit a `debug!` line per dispatched delta round.
    #[serde(default)]
    pub trace_dispatch: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            auto_name_base: String::new(),
            delta_limit: defaults::DELTA_LIMIT,
            trace_dispatch: false,
        }
    }
}

impl KernelConfig {
    /// Deserializes a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error when the JSON is malformed or a
    /// field has the wrong type.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The effective base string for generated names.
    pub fn name_base(&self) -> &str {
        if self.auto_name_base.is_empty() {
            defaults::AUTO_NAME_BASE
        } else {
            &self.auto_name_base
        }
    }
}
