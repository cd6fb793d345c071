use crate::constants::{
    COOLDOWN_AFTER_CONTINUE, DEBOUNCE_WINDOW, DEFAULT_COUNTDOWN_SECS, DEFAULT_REPEAT_DELAY_MINUTES,
};
use crate::validation::{clamp_countdown_seconds, clamp_repeat_delay_minutes};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing knobs consulted by the decider and the controller.
///
/// Constructors clamp user-supplied values, so a `PolicyParameters` is always
/// within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyParameters {
    pub countdown_seconds: u32,
    pub repeat_delay: Duration,
    pub cooldown_after_continue: Duration,
    pub debounce_window: Duration,
}

impl PolicyParameters {
    pub fn new(countdown_seconds: u32, repeat_delay_minutes: u32) -> Self {
        Self {
            countdown_seconds: clamp_countdown_seconds(countdown_seconds),
            repeat_delay: minutes(clamp_repeat_delay_minutes(repeat_delay_minutes)),
            cooldown_after_continue: COOLDOWN_AFTER_CONTINUE,
            debounce_window: DEBOUNCE_WINDOW,
        }
    }

    #[must_use]
    pub fn with_countdown_seconds(self, seconds: u32) -> Self {
        Self {
            countdown_seconds: clamp_countdown_seconds(seconds),
            ..self
        }
    }

    #[must_use]
    pub fn with_repeat_delay_minutes(self, repeat_minutes: u32) -> Self {
        Self {
            repeat_delay: minutes(clamp_repeat_delay_minutes(repeat_minutes)),
            ..self
        }
    }

    pub fn repeat_delay_minutes(&self) -> u32 {
        u32::try_from(self.repeat_delay.as_secs() / 60).unwrap_or(u32::MAX)
    }
}

impl Default for PolicyParameters {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECS, DEFAULT_REPEAT_DELAY_MINUTES)
    }
}

fn minutes(m: u32) -> Duration {
    Duration::from_secs(u64::from(m) * 60)
}

/// Which tier of intervention a gate represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionKind {
    /// Shown as soon as a blocked app is opened.
    First,
    /// Shown again once the repeat delay has passed since the first gate.
    Second,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = PolicyParameters::default();
        assert_eq!(policy.countdown_seconds, 15);
        assert_eq!(policy.repeat_delay, Duration::from_secs(60));
        assert_eq!(policy.cooldown_after_continue, Duration::from_secs(1));
        assert_eq!(policy.debounce_window, Duration::from_millis(500));
    }

    #[test]
    fn test_new_clamps_out_of_range_values() {
        let policy = PolicyParameters::new(1, 500);
        assert_eq!(policy.countdown_seconds, 5);
        assert_eq!(policy.repeat_delay_minutes(), 60);
    }

    #[test]
    fn test_with_setters_keep_other_fields() {
        let policy = PolicyParameters::default()
            .with_countdown_seconds(30)
            .with_repeat_delay_minutes(0);
        assert_eq!(policy.countdown_seconds, 30);
        assert_eq!(policy.repeat_delay, Duration::ZERO);
        assert_eq!(policy.cooldown_after_continue, COOLDOWN_AFTER_CONTINUE);
    }
}
