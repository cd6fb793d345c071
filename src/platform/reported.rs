use super::ForegroundSource;
use crate::constants::REPORTED_FOREGROUND_TTL;
use crate::models::AppId;
use crate::safe_lock;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Foreground app as last reported by the host process.
///
/// Reports older than the TTL resolve to unknown.
#[derive(Debug)]
pub struct ReportedForeground {
    latest: Mutex<Option<(AppId, Instant)>>,
    ttl: Duration,
}

impl ReportedForeground {
    pub fn new() -> Self {
        Self::with_ttl(REPORTED_FOREGROUND_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            latest: Mutex::new(None),
            ttl,
        }
    }

    pub fn report(&self, app: AppId, at: Instant) {
        *safe_lock(&self.latest, "Reported foreground") = Some((app, at));
    }

    pub fn clear(&self) {
        *safe_lock(&self.latest, "Reported foreground") = None;
    }
}

impl Default for ReportedForeground {
    fn default() -> Self {
        Self::new()
    }
}

impl ForegroundSource for ReportedForeground {
    fn resolve(&self, now: Instant) -> Option<AppId> {
        let latest = safe_lock(&self.latest, "Reported foreground");
        let (app, at) = latest.as_ref()?;
        if now.saturating_duration_since(*at) > self.ttl {
            return None;
        }
        Some(app.clone())
    }
}
