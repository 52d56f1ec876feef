use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tunables for locking and the wait/retry protocol.
///
/// Constructed once and passed into the lock manager and the session
/// orchestrator; there are no process-wide defaults hiding behind statics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AutomationConfig {
    /// Age after which a lock file is presumed abandoned and reclaimable.
    pub lock_timeout_ms: u64,
    /// Delay between readiness probes while waiting for a response.
    pub poll_interval_ms: u64,
    /// Total budget for a single call, launch to response.
    pub overall_deadline_ms: u64,
    /// Settle delay after launch and after UI mutations.
    pub settle_delay_ms: u64,
    /// Directory holding the per-target lock files.
    pub lock_dir: PathBuf,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 120_000,
            poll_interval_ms: 1_000,
            overall_deadline_ms: 120_000,
            settle_delay_ms: 500,
            lock_dir: std::env::temp_dir(),
        }
    }
}

impl AutomationConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn overall_deadline(&self) -> Duration {
        Duration::from_millis(self.overall_deadline_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_recognized_options() {
        let config: AutomationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.lock_timeout_ms, 120_000);
        assert_eq!(config.poll_interval_ms, 1_000);
        assert_eq!(config.overall_deadline_ms, 120_000);
    }

    #[test]
    fn partial_overrides_keep_remaining_defaults() {
        let config: AutomationConfig =
            serde_json::from_str(r#"{"pollIntervalMs": 250, "overallDeadlineMs": 2000}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.overall_deadline(), Duration::from_millis(2000));
        assert_eq!(config.lock_timeout_ms, 120_000);
    }
}
