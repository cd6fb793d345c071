//! The command surface a host process drives: start/stop monitoring, update
//! configuration, read session state.

use crate::clock::Clock;
use crate::controller::{InterventionController, SessionSnapshot};
use crate::db::Database;
use crate::error::AppError;
use crate::gate::Gate;
use crate::models::{AppId, ConfigSource};
use crate::platform::ForegroundSource;
use crate::poll::{PollConfig, PollLoop};
use crate::settings::SettingsStore;
use log::{info, warn};
use std::sync::{Arc, Mutex};

pub struct Monitor {
    settings: SettingsStore,
    controller: InterventionController,
    poll: PollLoop,
}

impl Monitor {
    pub fn new(
        db: Arc<Mutex<Database>>,
        gate: Arc<dyn Gate>,
        source: Arc<dyn ForegroundSource>,
        clock: Arc<dyn Clock>,
        config: PollConfig,
    ) -> Result<Self, AppError> {
        let settings = SettingsStore::new(db);
        let snapshot = settings.snapshot()?;
        let controller = InterventionController::new(gate, clock, &snapshot);
        let poll = PollLoop::new(controller.clone(), source, config);

        Ok(Self {
            settings,
            controller,
            poll,
        })
    }

    /// Start polling with freshly loaded configuration. Returns `false` if
    /// monitoring was already running.
    pub fn start_monitoring(&self) -> Result<bool, AppError> {
        if self.poll.is_running() {
            return Ok(false);
        }
        let snapshot = self.settings.snapshot()?;
        self.controller.apply_config(&snapshot);
        self.settings.set_monitoring_enabled(true)?;

        let started = self.poll.start();
        if started {
            info!("Monitoring {} blocked apps", snapshot.blocked.len());
        }
        Ok(started)
    }

    /// Stop polling and forget all session state. Returns `false` if
    /// monitoring was not running.
    pub fn stop_monitoring(&self) -> Result<bool, AppError> {
        let stopped = self.poll.stop();
        self.settings.set_monitoring_enabled(false)?;
        Ok(stopped)
    }

    /// Start monitoring if it was left on last time.
    pub fn resume_if_enabled(&self) -> Result<bool, AppError> {
        if !self.settings.monitoring_enabled()? {
            info!("Monitoring disabled in settings, not resuming");
            return Ok(false);
        }
        self.start_monitoring()
    }

    pub fn set_blocked_apps<I, S>(&self, apps: I) -> Result<Vec<AppId>, AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let apps = self.settings.set_blocked_apps(apps)?;
        let saved = apps.iter().cloned().collect();
        self.controller.set_blocked_apps(apps);
        Ok(saved)
    }

    pub fn set_countdown_seconds(&self, seconds: u32) -> Result<u32, AppError> {
        let seconds = self.settings.set_countdown_seconds(seconds)?;
        Ok(self.controller.set_countdown_seconds(seconds))
    }

    pub fn set_repeat_delay_minutes(&self, minutes: u32) -> Result<u32, AppError> {
        let minutes = self.settings.set_repeat_delay_minutes(minutes)?;
        Ok(self.controller.set_repeat_delay_minutes(minutes))
    }

    pub fn set_message(&self, message: &str) -> Result<String, AppError> {
        let message = self.settings.set_message(message)?;
        self.controller.set_message(&message);
        Ok(message)
    }

    pub fn get_session_state(&self) -> SessionSnapshot {
        self.controller.snapshot()
    }

    pub fn is_monitoring(&self) -> bool {
        self.poll.is_running()
    }

    pub fn controller(&self) -> &InterventionController {
        &self.controller
    }

    /// Stop the loop for process exit, keeping the persisted flag as it is.
    pub fn shutdown(&self) {
        if self.poll.stop() {
            info!("Monitor shutting down");
        }
        self.poll.join();
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if self.poll.is_running() {
            warn!("Monitor dropped while running");
            self.shutdown();
        }
    }
}
