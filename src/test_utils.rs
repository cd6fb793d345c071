//! Shared test utilities: a throw-away database and fakes for the
//! controller's collaborators.

#![cfg(test)]

use crate::db::{migrations, Database};
use crate::error::GateError;
use crate::gate::{Gate, GateHandle, GateId, GateOutcome, GateRequest};
use crate::models::AppId;
use crate::platform::ForegroundSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::{tempdir, TempDir};

/// Create a temporary test database with migrations applied.
///
/// Returns a tuple of (Database, TempDir). The TempDir must be kept alive
/// for the duration of the test to prevent the database file from being deleted.
pub fn setup_test_db() -> (Database, TempDir) {
    let dir = tempdir().expect("Failed to create temp directory for test DB");
    let db_path = dir.path().join("test.db");
    let db = Database::open(&db_path).expect("Failed to open test database");
    migrations::run(db.connection()).expect("Failed to run migrations on test DB");
    (db, dir)
}

/// Gate that records every call and keeps the handles for the test to resolve.
#[derive(Default)]
pub struct RecordingGate {
    presented: Mutex<Vec<GateRequest>>,
    handles: Mutex<Vec<GateHandle>>,
    dismissed: Mutex<Vec<(GateId, AppId)>>,
    left: Mutex<Vec<AppId>>,
    failing: AtomicBool,
    resolve_with: Mutex<Option<GateOutcome>>,
    present_delay: Mutex<Duration>,
}

impl RecordingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Resolve every presented gate from inside `present`.
    pub fn resolve_immediately(&self, outcome: Option<GateOutcome>) {
        *self.resolve_with.lock().unwrap() = outcome;
    }

    pub fn set_present_delay(&self, delay: Duration) {
        *self.present_delay.lock().unwrap() = delay;
    }

    pub fn presented(&self) -> Vec<GateRequest> {
        self.presented.lock().unwrap().clone()
    }

    /// The most recent unresolved handle.
    pub fn take_handle(&self) -> Option<GateHandle> {
        self.handles.lock().unwrap().pop()
    }

    pub fn dismissed(&self) -> Vec<(GateId, AppId)> {
        self.dismissed.lock().unwrap().clone()
    }

    pub fn left(&self) -> Vec<AppId> {
        self.left.lock().unwrap().clone()
    }
}

impl Gate for RecordingGate {
    fn present(&self, request: GateRequest, handle: GateHandle) -> Result<(), GateError> {
        let delay = *self.present_delay.lock().unwrap();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(GateError::Unavailable("overlay permission missing".into()));
        }

        self.presented.lock().unwrap().push(request);
        let resolve_with = *self.resolve_with.lock().unwrap();
        match resolve_with {
            Some(outcome) => {
                handle.resolve(outcome);
            }
            None => self.handles.lock().unwrap().push(handle),
        }
        Ok(())
    }

    fn dismiss(&self, id: GateId, app: &AppId) {
        self.dismissed.lock().unwrap().push((id, app.clone()));
    }

    fn leave_app(&self, app: &AppId) {
        self.left.lock().unwrap().push(app.clone());
    }
}

/// Foreground source whose answer the test sets directly.
#[derive(Default)]
pub struct ScriptedSource {
    current: Mutex<Option<AppId>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, app: Option<&str>) {
        *self.current.lock().unwrap() = app.map(AppId::from);
    }
}

impl ForegroundSource for ScriptedSource {
    fn resolve(&self, _now: Instant) -> Option<AppId> {
        self.current.lock().unwrap().clone()
    }
}
