use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use dicehall_ai::BOT_KINDS;
use dicehall_engine::hand::GameVariant;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a client decides whether a replicated snapshot may overwrite its own seat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Wait until the host acknowledges the client's latest edit token
    #[default]
    EditToken,
    /// Ignore snapshots for a fixed window after each local edit
    Window,
}

impl FromStr for ReconcileMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edit_token" | "edit-token" | "token" => Ok(ReconcileMode::EditToken),
            "window" => Ok(ReconcileMode::Window),
            other => Err(SettingsError::InvalidValue(format!(
                "unknown reconcile mode: {}",
                other
            ))),
        }
    }
}

/// What happens when several seats finish with the same best hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// Every tied seat is reported as a winner
    #[default]
    Split,
    /// Tied seats roll one die each until a single winner remains
    RollOff,
}

impl FromStr for TiePolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "split" => Ok(TiePolicy::Split),
            "roll_off" | "roll-off" | "rolloff" => Ok(TiePolicy::RollOff),
            other => Err(SettingsError::InvalidValue(format!(
                "unknown tie policy: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for TiePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiePolicy::Split => f.write_str("split"),
            TiePolicy::RollOff => f.write_str("roll_off"),
        }
    }
}

/// Per-table settings shared by the host and every client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableSettings {
    pub variant: GameVariant,
    /// Protection window after a local edit, in milliseconds
    pub protection_window_ms: u64,
    pub reconcile_mode: ReconcileMode,
    /// Pause before a bot seat starts rolling, in milliseconds
    pub bot_think_ms: u64,
    pub bot_policy: String,
    pub tie_policy: TiePolicy,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            variant: GameVariant::Wild,
            protection_window_ms: 1500,
            reconcile_mode: ReconcileMode::EditToken,
            bot_think_ms: 0,
            bot_policy: "baseline".to_string(),
            tie_policy: TiePolicy::Split,
        }
    }
}

impl TableSettings {
    /// Validate settings values
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.protection_window_ms == 0 || self.protection_window_ms > 60_000 {
            return Err(SettingsError::InvalidValue(
                "protection_window_ms must be between 1 and 60000".to_string(),
            ));
        }

        if self.bot_think_ms > 60_000 {
            return Err(SettingsError::InvalidValue(
                "bot_think_ms must not exceed 60000".to_string(),
            ));
        }

        if !BOT_KINDS.contains(&self.bot_policy.as_str()) {
            return Err(SettingsError::InvalidValue(format!(
                "bot_policy must be one of {:?}",
                BOT_KINDS
            )));
        }

        Ok(())
    }

    pub fn protection_window(&self) -> Duration {
        Duration::from_millis(self.protection_window_ms)
    }

    pub fn bot_think(&self) -> Duration {
        Duration::from_millis(self.bot_think_ms)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
