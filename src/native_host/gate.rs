//! Gate implementation that drives a UI on the other end of the native
//! messaging pipe.

use super::codec::write_message;
use super::messages::OutgoingMessage;
use crate::error::{AppError, GateError};
use crate::gate::{Countdown, Gate, GateHandle, GateId, GateOutcome, GateRequest, ResolveResult};
use crate::models::AppId;
use crate::safe_lock;
use log::{debug, warn};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Frame writer shared by command replies, the gate and countdown threads.
#[derive(Clone)]
pub struct FrameWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl FrameWriter {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn send(&self, message: &OutgoingMessage) -> io::Result<()> {
        let mut writer = safe_lock(&self.inner, "Frame writer");
        write_message(&mut *writer, message)
    }
}

struct PendingGate {
    handle: GateHandle,
    countdown_done: Arc<AtomicBool>,
    cancel: Sender<()>,
}

pub struct HostGate {
    writer: FrameWriter,
    step: Duration,
    pending: Mutex<HashMap<GateId, PendingGate>>,
}

impl HostGate {
    /// `step` is the wall time between countdown frames; one second in production.
    pub fn new(writer: FrameWriter, step: Duration) -> Self {
        Self {
            writer,
            step,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Apply the user's answer for `id`.
    ///
    /// `Continue` is refused while the countdown is still running; the gate
    /// stays up. Unknown ids resolve as [`ResolveResult::Stale`].
    pub fn resolve(&self, id: GateId, outcome: GateOutcome) -> Result<ResolveResult, AppError> {
        let pending = {
            let mut pending = safe_lock(&self.pending, "Pending gates");
            let Some(gate) = pending.get(&id) else {
                debug!("Outcome for unknown gate {id}");
                return Ok(ResolveResult::Stale);
            };
            if outcome == GateOutcome::Continue && !gate.countdown_done.load(Ordering::SeqCst) {
                return Err(AppError::InvalidInput {
                    field: "outcome",
                    reason: "countdown still running".into(),
                });
            }
            pending.remove(&id)
        };

        let Some(gate) = pending else {
            return Ok(ResolveResult::Stale);
        };
        // The countdown thread may already be gone.
        let _ = gate.cancel.send(());
        Ok(gate.handle.resolve(outcome))
    }

    pub fn pending_count(&self) -> usize {
        safe_lock(&self.pending, "Pending gates").len()
    }

    fn spawn_countdown(&self, id: GateId, seconds: u32, done: Arc<AtomicBool>, cancel: Receiver<()>) {
        let writer = self.writer.clone();
        let step = self.step;

        thread::spawn(move || {
            for tick in Countdown::new(seconds) {
                if tick.is_complete() {
                    done.store(true, Ordering::SeqCst);
                }
                if let Err(e) = writer.send(&OutgoingMessage::countdown(id, tick)) {
                    warn!("Failed to send countdown for gate {id}: {e}");
                }
                if tick.is_complete() {
                    break;
                }
                match cancel.recv_timeout(step) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        debug!("Countdown for gate {id} cancelled");
                        return;
                    }
                }
            }
        });
    }

    fn forget(&self, id: GateId) {
        let removed = safe_lock(&self.pending, "Pending gates").remove(&id);
        if let Some(gate) = removed {
            let _ = gate.cancel.send(());
        }
    }
}

impl Gate for HostGate {
    fn present(&self, request: GateRequest, handle: GateHandle) -> Result<(), GateError> {
        let id = request.id;
        let done = Arc::new(AtomicBool::new(false));
        let (cancel_tx, cancel_rx) = mpsc::channel();

        // Registered before the UI hears about it, so an instant reply finds it.
        safe_lock(&self.pending, "Pending gates").insert(
            id,
            PendingGate {
                handle,
                countdown_done: Arc::clone(&done),
                cancel: cancel_tx,
            },
        );

        if let Err(e) = self.writer.send(&OutgoingMessage::present(&request)) {
            safe_lock(&self.pending, "Pending gates").remove(&id);
            return Err(GateError::Unavailable(e.to_string()));
        }

        self.spawn_countdown(id, request.countdown_seconds, done, cancel_rx);
        Ok(())
    }

    fn dismiss(&self, id: GateId, app: &AppId) {
        self.forget(id);
        if let Err(e) = self.writer.send(&OutgoingMessage::DismissGate {
            gate_id: id,
            app: app.clone(),
        }) {
            warn!("Failed to dismiss gate {id}: {e}");
        }
    }

    fn leave_app(&self, app: &AppId) {
        if let Err(e) = self.writer.send(&OutgoingMessage::LeaveApp { app: app.clone() }) {
            warn!("Failed to ask host to leave {app}: {e}");
        }
    }
}
