pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS blocked_apps (
    app_id TEXT PRIMARY KEY,
    added_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

pub const KEY_COUNTDOWN_SECONDS: &str = "countdown_seconds";
pub const KEY_REPEAT_DELAY_MINUTES: &str = "repeat_delay_minutes";
pub const KEY_MESSAGE: &str = "message";
pub const KEY_MONITORING_ENABLED: &str = "monitoring_enabled";
