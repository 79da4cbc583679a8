//! Monitor configuration and state types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// How ledgers are discovered. Selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorMode {
    /// Subscribe to newly closed ledgers (optionally resuming at a start ledger).
    #[default]
    Streaming,
    /// Walk ledger sequence numbers one by one from the start ledger.
    Historical,
}

impl FromStr for MonitorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stream" | "streaming" | "live" => Ok(Self::Streaming),
            "historical" | "history" | "poll" => Ok(Self::Historical),
            other => Err(ConfigError::Invalid {
                field: "mode",
                reason: format!("unknown mode {other:?} (expected stream or historical)"),
            }),
        }
    }
}

impl fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming => write!(f, "streaming"),
            Self::Historical => write!(f, "historical"),
        }
    }
}

/// Configuration for a monitor run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub mode: MonitorMode,
    /// First ledger to process. `None` = latest.
    pub start_ledger: Option<u64>,
    /// Last ledger to process in historical mode. `None` = follow the tip.
    pub end_ledger: Option<u64>,
    /// Pause after each successfully processed ledger (milliseconds).
    pub ledger_delay_ms: u64,
    /// Pause after a failed attempt before retrying (milliseconds).
    pub error_delay_ms: u64,
    /// Capacity of the subscription → worker channel.
    pub stream_buffer: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            mode: MonitorMode::Streaming,
            start_ledger: None,
            end_ledger: None,
            ledger_delay_ms: 200,
            error_delay_ms: 1000,
            stream_buffer: 256,
        }
    }
}

impl MonitorConfig {
    pub fn ledger_delay(&self) -> Duration {
        Duration::from_millis(self.ledger_delay_ms)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }

    /// Reject combinations that cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let (Some(start), Some(end)) = (self.start_ledger, self.end_ledger) {
            if end < start {
                return Err(ConfigError::Invalid {
                    field: "end_ledger",
                    reason: format!("end ledger {end} is before start ledger {start}"),
                });
            }
        }
        if self.end_ledger.is_some() && self.mode == MonitorMode::Streaming {
            return Err(ConfigError::Invalid {
                field: "end_ledger",
                reason: "an end ledger is only supported in historical mode".into(),
            });
        }
        if self.stream_buffer == 0 {
            return Err(ConfigError::Invalid {
                field: "stream_buffer",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Runtime state of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorState {
    /// Not yet started.
    Idle,
    /// Resolving the start position (paging token or latest ledger).
    Resolving,
    /// Processing ledgers.
    Running,
    /// Subscription ended; waiting for shutdown.
    Draining,
    /// Terminated.
    Stopped,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Resolving => write!(f, "resolving"),
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_rate_limit_friendly_pacing() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.ledger_delay(), Duration::from_millis(200));
        assert_eq!(cfg.error_delay(), Duration::from_millis(1000));
        assert_eq!(cfg.mode, MonitorMode::Streaming);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("STREAM".parse::<MonitorMode>().unwrap(), MonitorMode::Streaming);
        assert_eq!("poll".parse::<MonitorMode>().unwrap(), MonitorMode::Historical);
        assert!("sideways".parse::<MonitorMode>().is_err());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let cfg = MonitorConfig {
            mode: MonitorMode::Historical,
            start_ledger: Some(10),
            end_ledger: Some(9),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn end_ledger_requires_historical_mode() {
        let cfg = MonitorConfig {
            end_ledger: Some(9),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
