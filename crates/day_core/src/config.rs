//! Runtime configuration read from the environment.
//!
//! Every gameplay threshold is a compiled-in constant; the only switch is
//! whether the resource trace records anything.

use std::env;

/// Environment variable enabling the resource trace.
pub const TRACE_ENV_VAR: &str = "DAY_CORE_TRACE";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceConfig {
    pub enabled: bool,
}

impl TraceConfig {
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    /// Read [`TRACE_ENV_VAR`]. Unset or unrecognized values leave tracing off.
    pub fn from_env() -> Self {
        Self {
            enabled: env::var(TRACE_ENV_VAR)
                .map(|value| parse_flag(&value))
                .unwrap_or(false),
        }
    }
}

/// Boolean-like parsing: `1`, `true`, `yes`, `on` (any case, surrounding
/// whitespace ignored) are true; anything else is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
