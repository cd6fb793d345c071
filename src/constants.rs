// src/constants.rs

use std::time::Duration;

/// Countdown length used until the user picks one.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 15;

/// Shortest countdown a gate may run.
pub const MIN_COUNTDOWN_SECS: u32 = 5;

/// Longest countdown a gate may run.
pub const MAX_COUNTDOWN_SECS: u32 = 120;

/// Delay between the first gate of a session and the repeat gate.
pub const DEFAULT_REPEAT_DELAY_MINUTES: u32 = 1;

/// Upper bound for the repeat delay (one hour).
pub const MAX_REPEAT_DELAY_MINUTES: u32 = 60;

/// Suppression period after the user chooses Continue.
pub const COOLDOWN_AFTER_CONTINUE: Duration = Duration::from_secs(1);

/// Guard against two overlapping ticks presenting the same gate.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Period of the foreground poll loop.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long a host-reported foreground app is trusted without a refresh.
pub const REPORTED_FOREGROUND_TTL: Duration = Duration::from_secs(5);

pub const DEFAULT_MESSAGE: &str = "Take a moment to consider if you really need this app right now";

/// Maximum intervention message length
pub const MAX_MESSAGE_LEN: usize = 500;

/// Maximum app identifier length
pub const MAX_APP_ID_LEN: usize = 255;

/// Native messaging frames are capped at 1MB (1024 * 1024 bytes)
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Our own app identifier; the monitor never gates itself.
pub const SELF_APP_ID: &str = "scrollgate";

/// Wall time between countdown frames sent to the host UI.
pub const COUNTDOWN_STEP: Duration = Duration::from_secs(1);
