//! Persisted user configuration.

use crate::constants::{DEFAULT_COUNTDOWN_SECS, DEFAULT_MESSAGE, DEFAULT_REPEAT_DELAY_MINUTES};
use crate::db::schema::{KEY_COUNTDOWN_SECONDS, KEY_MESSAGE, KEY_MONITORING_ENABLED, KEY_REPEAT_DELAY_MINUTES};
use crate::db::{with_connection, Database};
use crate::error::AppError;
use crate::models::{AppId, BlockedApp, ConfigSnapshot, ConfigSource, Setting};
use crate::validation::{clamp_countdown_seconds, clamp_repeat_delay_minutes, validate_app_id, validate_message};
use log::{info, warn};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub struct SettingsStore {
    db: Arc<Mutex<Database>>,
}

impl SettingsStore {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    /// Validate and persist a new blocked set. Returns the normalized set.
    pub fn set_blocked_apps<I, S>(&self, apps: I) -> Result<BTreeSet<AppId>, AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let apps = apps
            .into_iter()
            .map(|app| validate_app_id(app.as_ref()).map(AppId::from))
            .collect::<Result<BTreeSet<_>, _>>()?;

        with_connection(&self.db, "save blocked apps", |conn| BlockedApp::replace_all(conn, &apps))?;
        info!("Saved {} blocked apps", apps.len());
        Ok(apps)
    }

    /// Persist a countdown length. Returns the clamped value.
    pub fn set_countdown_seconds(&self, seconds: u32) -> Result<u32, AppError> {
        let seconds = clamp_countdown_seconds(seconds);
        self.put(KEY_COUNTDOWN_SECONDS, &seconds.to_string())?;
        Ok(seconds)
    }

    /// Persist a repeat delay. Returns the clamped value.
    pub fn set_repeat_delay_minutes(&self, minutes: u32) -> Result<u32, AppError> {
        let minutes = clamp_repeat_delay_minutes(minutes);
        self.put(KEY_REPEAT_DELAY_MINUTES, &minutes.to_string())?;
        Ok(minutes)
    }

    /// Persist the intervention message. Returns the trimmed text.
    pub fn set_message(&self, message: &str) -> Result<String, AppError> {
        let message = validate_message(message)?;
        self.put(KEY_MESSAGE, message)?;
        Ok(message.to_string())
    }

    pub fn monitoring_enabled(&self) -> Result<bool, AppError> {
        let raw = with_connection(&self.db, "load monitoring flag", |conn| {
            Setting::get(conn, KEY_MONITORING_ENABLED)
        })?;
        Ok(raw.as_deref() != Some("0"))
    }

    pub fn set_monitoring_enabled(&self, enabled: bool) -> Result<(), AppError> {
        self.put(KEY_MONITORING_ENABLED, if enabled { "1" } else { "0" })
    }

    fn put(&self, key: &str, value: &str) -> Result<(), AppError> {
        with_connection(&self.db, "save setting", |conn| Setting::set(conn, key, value))
    }
}

impl ConfigSource for SettingsStore {
    fn snapshot(&self) -> Result<ConfigSnapshot, AppError> {
        with_connection(&self.db, "load settings", |conn| {
            Ok(ConfigSnapshot {
                blocked: BlockedApp::find_all(conn)?,
                countdown_seconds: load_number(conn, KEY_COUNTDOWN_SECONDS, DEFAULT_COUNTDOWN_SECS)?,
                repeat_delay_minutes: load_number(conn, KEY_REPEAT_DELAY_MINUTES, DEFAULT_REPEAT_DELAY_MINUTES)?,
                message: Setting::get(conn, KEY_MESSAGE)?
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            })
        })
    }
}

fn load_number<T>(conn: &Connection, key: &str, default: T) -> rusqlite::Result<T>
where
    T: FromStr + Copy,
{
    let Some(raw) = Setting::get(conn, key)? else {
        return Ok(default);
    };
    Ok(raw.trim().parse().unwrap_or_else(|_| {
        warn!("Stored {key} = {raw:?} is not a number, using default");
        default
    }))
}
