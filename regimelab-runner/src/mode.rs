//! Runtime modes controlling how much authority the guard has.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How guard decisions are applied.
///
/// OFF bypasses the engine entirely. SHADOW computes and records every
/// decision but never withholds permission. ENFORCED applies decisions
/// as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeMode {
    Off,
    Shadow,
    Enforced,
}

impl RuntimeMode {
    pub const ENV_VAR: &'static str = "REGIME_MODE";

    /// Read the mode from `REGIME_MODE`. Unset or unrecognized values fall
    /// back to SHADOW, the safe-to-deploy default.
    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(raw) => raw.parse().unwrap_or(RuntimeMode::Shadow),
            Err(_) => RuntimeMode::Shadow,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeMode::Off => "OFF",
            RuntimeMode::Shadow => "SHADOW",
            RuntimeMode::Enforced => "ENFORCED",
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFF" => Ok(RuntimeMode::Off),
            "SHADOW" => Ok(RuntimeMode::Shadow),
            "ENFORCED" => Ok(RuntimeMode::Enforced),
            _ => Err(UnknownModeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown runtime mode: {0:?}")]
pub struct UnknownModeError(pub String);
