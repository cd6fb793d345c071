//! Background thread that samples the foreground app and drives the controller.

use crate::constants::POLL_INTERVAL;
use crate::controller::{InterventionController, TickOutcome};
use crate::models::AppId;
use crate::platform::ForegroundSource;
use crate::safe_lock;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    /// Our own app; never gated and never counted as a switch.
    pub self_app: Option<AppId>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            self_app: None,
        }
    }
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

pub struct PollLoop {
    config: PollConfig,
    /// Epoch of the live run, or 0 when stopped.
    running: Arc<AtomicU64>,
    controller: InterventionController,
    source: Arc<dyn ForegroundSource>,
    worker: Mutex<Option<Worker>>,
}

impl PollLoop {
    pub fn new(controller: InterventionController, source: Arc<dyn ForegroundSource>, config: PollConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicU64::new(0)),
            controller,
            source,
            worker: Mutex::new(None),
        }
    }

    /// Start polling. Returns `false` if the loop was already running.
    pub fn start(&self) -> bool {
        let mut worker = safe_lock(&self.worker, "Poll worker");
        if self.is_running() {
            debug!("Poll loop already running, ignoring start");
            return false;
        }

        // A previous worker may still be finishing its last tick; it sees a
        // stale epoch and exits on its own.
        drop(worker.take());

        let epoch = self.controller.begin_monitoring();
        self.running.store(epoch, Ordering::SeqCst);

        let (stop_tx, stop_rx) = mpsc::channel();
        let running = Arc::clone(&self.running);
        let controller = self.controller.clone();
        let source = Arc::clone(&self.source);
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            info!("Poll loop started (every {:?})", config.interval);
            loop {
                if running.load(Ordering::SeqCst) != epoch {
                    break;
                }
                if run_tick(&controller, source.as_ref(), &config, epoch) == Some(TickOutcome::Inactive) {
                    // The run ended without `stop`; release the flag so a later start works.
                    if running.compare_exchange(epoch, 0, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
                        info!("Monitoring run {epoch} ended, poll loop going idle");
                    }
                    break;
                }
                match stop_rx.recv_timeout(config.interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("Poll loop for run {epoch} exited");
        });

        *worker = Some(Worker { stop_tx, handle });
        true
    }

    /// Stop polling. Returns `false` if the loop was not running.
    ///
    /// Session state is reset before this returns; a tick still in flight
    /// cannot change it afterwards. Does not wait for the thread; see [`PollLoop::join`].
    pub fn stop(&self) -> bool {
        let worker = safe_lock(&self.worker, "Poll worker");
        if self.running.swap(0, Ordering::SeqCst) == 0 {
            debug!("Poll loop not running, ignoring stop");
            return false;
        }

        self.controller.end_monitoring();
        if let Some(worker) = worker.as_ref() {
            // The thread may already have exited; a closed channel is fine.
            let _ = worker.stop_tx.send(());
        }
        info!("Poll loop stopped");
        true
    }

    /// Wait for the last worker thread to exit.
    pub fn join(&self) {
        let worker = safe_lock(&self.worker, "Poll worker").take();
        if let Some(worker) = worker {
            if worker.handle.join().is_err() {
                warn!("Poll thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) != 0
    }

    pub fn controller(&self) -> &InterventionController {
        &self.controller
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One iteration. `None` when the tick was skipped before reaching the controller.
fn run_tick(
    controller: &InterventionController,
    source: &dyn ForegroundSource,
    config: &PollConfig,
    epoch: u64,
) -> Option<TickOutcome> {
    if !controller.is_current(epoch) {
        return Some(TickOutcome::Inactive);
    }

    let Some(app) = source.resolve(controller.clock().now()) else {
        debug!("Foreground app unknown, skipping tick");
        return None;
    };
    if config.self_app.as_ref() == Some(&app) {
        debug!("Own app in foreground, skipping tick");
        return None;
    }

    Some(controller.tick(epoch, &app))
}
