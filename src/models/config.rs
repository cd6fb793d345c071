use crate::constants::{DEFAULT_COUNTDOWN_SECS, DEFAULT_MESSAGE, DEFAULT_REPEAT_DELAY_MINUTES};
use crate::error::AppError;
use crate::models::{AppId, PolicyParameters};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Read-only view of the user configuration the monitor runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub blocked: BTreeSet<AppId>,
    pub countdown_seconds: u32,
    pub repeat_delay_minutes: u32,
    pub message: String,
}

impl ConfigSnapshot {
    pub fn policy(&self) -> PolicyParameters {
        PolicyParameters::new(self.countdown_seconds, self.repeat_delay_minutes)
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            blocked: BTreeSet::new(),
            countdown_seconds: DEFAULT_COUNTDOWN_SECS,
            repeat_delay_minutes: DEFAULT_REPEAT_DELAY_MINUTES,
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

/// Supplies configuration snapshots. The monitor reads, never writes, through this.
pub trait ConfigSource: Send + Sync {
    fn snapshot(&self) -> Result<ConfigSnapshot, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_snapshot_is_clamped() {
        let snapshot = ConfigSnapshot {
            countdown_seconds: 1000,
            repeat_delay_minutes: 90,
            ..ConfigSnapshot::default()
        };
        let policy = snapshot.policy();
        assert_eq!(policy.countdown_seconds, 120);
        assert_eq!(policy.repeat_delay_minutes(), 60);
    }
}
