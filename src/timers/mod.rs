use crate::models::AppId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Temporal bookkeeping for one application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppTimerRecord {
    /// When the app became foreground for the current session.
    pub opened_at: Option<Instant>,
    /// When the first gate of the current session was presented. Write-once per session.
    pub first_shown_at: Option<Instant>,
    /// No new gate may be shown before this instant. Survives session resets.
    pub cooldown_until: Option<Instant>,
}

impl AppTimerRecord {
    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    fn is_empty(&self) -> bool {
        self.opened_at.is_none() && self.first_shown_at.is_none() && self.cooldown_until.is_none()
    }
}

/// Per-app timer records. Pure data; scheduling lives in the controller.
#[derive(Debug, Default)]
pub struct AppTimerStore {
    records: HashMap<AppId, AppTimerRecord>,
}

impl AppTimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, app: &AppId) -> Option<AppTimerRecord> {
        self.records.get(app).copied()
    }

    pub fn record_open(&mut self, app: &AppId, now: Instant) {
        self.entry(app).opened_at = Some(now);
    }

    /// Stamp the first gate of the session. Returns `false` if it was already stamped,
    /// in which case the existing timestamp is kept.
    pub fn record_first_shown(&mut self, app: &AppId, now: Instant) -> bool {
        let record = self.entry(app);
        if record.first_shown_at.is_some() {
            return false;
        }
        record.first_shown_at = Some(now);
        true
    }

    /// Undo a `record_first_shown` made at `at`, used when that gate never made it on screen.
    pub fn revert_first_shown(&mut self, app: &AppId, at: Instant) {
        if let Some(record) = self.records.get_mut(app) {
            if record.first_shown_at == Some(at) {
                record.first_shown_at = None;
            }
        }
    }

    /// Treat the app as freshly opened at `now` without leaving the foreground.
    pub fn restart_session(&mut self, app: &AppId, now: Instant) {
        let record = self.entry(app);
        record.opened_at = Some(now);
        record.first_shown_at = None;
    }

    pub fn record_cooldown(&mut self, app: &AppId, now: Instant, duration: Duration) {
        self.entry(app).cooldown_until = Some(now + duration);
    }

    /// Drop the session timestamps, keeping any cooldown.
    pub fn clear_session(&mut self, app: &AppId) {
        if let Some(record) = self.records.get_mut(app) {
            record.opened_at = None;
            record.first_shown_at = None;
            if record.is_empty() {
                self.records.remove(app);
            }
        }
    }

    pub fn clear_all(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AppId, &AppTimerRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn entry(&mut self, app: &AppId) -> &mut AppTimerRecord {
        self.records.entry(app.clone()).or_default()
    }
}
