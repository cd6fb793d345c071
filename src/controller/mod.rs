//! The intervention state machine.
//!
//! All mutable session state (gate slot, allow-list, timers, blocked set,
//! policy) lives in one [`ControllerState`] behind a single mutex. Ticks from
//! the poll loop and outcomes from the gate both go through that mutex; gate
//! presentation itself runs outside it, with the slot held in `Pending`.

use crate::clock::Clock;
use crate::decider::{decide, Decision, DecisionInput};
use crate::gate::{Gate, GateHandle, GateId, GateOutcome, GateRequest, GateState, OutcomeSink, ResolveResult};
use crate::models::{AppId, ConfigSnapshot, InterventionKind, PolicyParameters};
use crate::safe_lock;
use crate::timers::AppTimerStore;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belonged to a stopped or replaced monitoring run.
    Inactive,
    /// Bookkeeping only; no gate was needed.
    Idle,
    Presented { id: GateId, kind: InterventionKind },
    /// The gate surface failed; the slot was released for a later retry.
    PresentationFailed,
    /// The gate went up after monitoring stopped and was torn down again.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirmation {
    Opened,
    AlreadyResolved,
    Superseded,
}

/// The whole mutable state of the controller.
#[derive(Debug)]
pub struct ControllerState {
    epoch: Option<u64>,
    last_epoch: u64,
    gate: GateState,
    debounce_until: Option<Instant>,
    next_gate_id: u64,
    last_resolved: Option<GateId>,
    previous_app: Option<AppId>,
    allowed: HashSet<AppId>,
    timers: AppTimerStore,
    blocked: BTreeSet<AppId>,
    policy: PolicyParameters,
    message: String,
}

impl ControllerState {
    pub fn new(config: &ConfigSnapshot) -> Self {
        Self {
            epoch: None,
            last_epoch: 0,
            gate: GateState::Closed,
            debounce_until: None,
            next_gate_id: 0,
            last_resolved: None,
            previous_app: None,
            allowed: HashSet::new(),
            timers: AppTimerStore::new(),
            blocked: config.blocked.clone(),
            policy: config.policy(),
            message: config.message.clone(),
        }
    }

    pub fn gate(&self) -> &GateState {
        &self.gate
    }

    pub fn timers(&self) -> &AppTimerStore {
        &self.timers
    }

    pub fn is_allowed(&self, app: &AppId) -> bool {
        self.allowed.contains(app)
    }

    fn begin(&mut self) -> u64 {
        self.last_epoch += 1;
        self.epoch = Some(self.last_epoch);
        self.previous_app = None;
        self.last_epoch
    }

    /// Abrupt stop: forget every session and free the gate slot without an outcome.
    fn reset(&mut self) -> Option<(GateId, AppId)> {
        self.epoch = None;
        self.timers.clear_all();
        self.allowed.clear();
        self.previous_app = None;
        self.close_gate()
    }

    /// Returns `true` when the foreground app differs from the previous tick.
    fn observe_foreground(&mut self, app: &AppId) -> bool {
        if self.previous_app.as_ref() == Some(app) {
            return false;
        }
        if let Some(previous) = self.previous_app.take() {
            self.allowed.remove(&previous);
            self.timers.clear_session(&previous);
            debug!("Left {previous}, session cleared");
        }
        self.previous_app = Some(app.clone());
        true
    }

    fn decide(&self, app: &AppId, now: Instant) -> Decision {
        decide(&DecisionInput {
            foreground: app,
            blocked: &self.blocked,
            allowed: &self.allowed,
            timer: self.timers.get(app),
            now,
            policy: &self.policy,
            gate: &self.gate,
        })
    }

    fn debounce_active(&self, now: Instant) -> bool {
        self.debounce_until.is_some_and(|until| now < until)
    }

    /// Move the slot to `Pending` and build the request. Also returns the
    /// first-shown stamp if this call wrote it.
    fn claim_gate(&mut self, app: &AppId, kind: InterventionKind, now: Instant) -> (GateRequest, Option<Instant>) {
        self.next_gate_id += 1;
        let id = GateId(self.next_gate_id);
        self.gate = GateState::Pending {
            id,
            app: app.clone(),
            requested_at: now,
        };
        self.debounce_until = Some(now + self.policy.debounce_window);
        let first_recorded = self.timers.record_first_shown(app, now).then_some(now);

        let request = GateRequest {
            id,
            app: app.clone(),
            kind,
            countdown_seconds: self.policy.countdown_seconds,
            message: self.message.clone(),
        };
        (request, first_recorded)
    }

    fn confirm_open(&mut self, id: GateId, now: Instant) -> Confirmation {
        match &self.gate {
            GateState::Pending { id: pending, app, .. } if *pending == id => {
                self.gate = GateState::Open {
                    id,
                    app: app.clone(),
                    opened_at: now,
                };
                Confirmation::Opened
            }
            GateState::Closed | GateState::Pending { .. } | GateState::Open { .. } => {
                if self.last_resolved == Some(id) {
                    Confirmation::AlreadyResolved
                } else {
                    Confirmation::Superseded
                }
            }
        }
    }

    /// Release a `Pending` slot whose presentation failed.
    fn abandon_claim(&mut self, id: GateId, first_recorded: Option<Instant>) {
        let GateState::Pending { id: pending, app, .. } = &self.gate else {
            return;
        };
        if *pending != id {
            return;
        }
        let app = app.clone();
        if let Some(at) = first_recorded {
            self.timers.revert_first_shown(&app, at);
        }
        self.close_gate();
    }

    /// Apply a user outcome. Returns `None` if the outcome is stale.
    fn apply_outcome(&mut self, id: GateId, app: &AppId, outcome: GateOutcome, now: Instant) -> Option<GateOutcome> {
        if self.gate.id() != Some(id) || self.gate.app() != Some(app) {
            return None;
        }
        let still_foreground = self.previous_app.as_ref() == Some(app);

        match outcome {
            GateOutcome::Continue => {
                if still_foreground {
                    self.allowed.insert(app.clone());
                }
                let cooldown = self.policy.cooldown_after_continue;
                self.timers.record_cooldown(app, now, cooldown);
            }
            GateOutcome::Reject => {
                self.allowed.remove(app);
                // No cooldown: the next tick on this app gates again.
                if still_foreground {
                    self.timers.restart_session(app, now);
                }
            }
        }

        self.close_gate();
        self.last_resolved = Some(id);
        Some(outcome)
    }

    fn close_gate(&mut self) -> Option<(GateId, AppId)> {
        self.debounce_until = None;
        match std::mem::take(&mut self.gate) {
            GateState::Closed => None,
            GateState::Pending { id, app, .. } | GateState::Open { id, app, .. } => Some((id, app)),
        }
    }

    fn snapshot(&self, now: Instant) -> SessionSnapshot {
        let mut allowed: Vec<AppId> = self.allowed.iter().cloned().collect();
        allowed.sort();

        let mut timers: Vec<TimerSnapshot> = self
            .timers
            .iter()
            .map(|(app, record)| TimerSnapshot {
                app: app.clone(),
                opened_ms_ago: record.opened_at.map(|at| millis(now.saturating_duration_since(at))),
                first_shown_ms_ago: record.first_shown_at.map(|at| millis(now.saturating_duration_since(at))),
                cooldown_remaining_ms: record
                    .cooldown_until
                    .filter(|until| now < *until)
                    .map(|until| millis(until - now)),
            })
            .collect();
        timers.sort_by(|a, b| a.app.cmp(&b.app));

        let gate = match &self.gate {
            GateState::Closed => GateSnapshot::Closed,
            GateState::Pending { id, app, requested_at } => GateSnapshot::Pending {
                id: *id,
                app: app.clone(),
                age_ms: millis(now.saturating_duration_since(*requested_at)),
            },
            GateState::Open { id, app, opened_at } => GateSnapshot::Open {
                id: *id,
                app: app.clone(),
                age_ms: millis(now.saturating_duration_since(*opened_at)),
            },
        };

        SessionSnapshot {
            monitoring: self.epoch.is_some(),
            foreground_app: self.previous_app.clone(),
            gate,
            debounce_active: self.debounce_active(now),
            allowed,
            timers,
            blocked: self.blocked.iter().cloned().collect(),
            countdown_seconds: self.policy.countdown_seconds,
            repeat_delay_minutes: self.policy.repeat_delay_minutes(),
            message: self.message.clone(),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Debug view of the controller, safe to serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub monitoring: bool,
    pub foreground_app: Option<AppId>,
    pub gate: GateSnapshot,
    pub debounce_active: bool,
    pub allowed: Vec<AppId>,
    pub timers: Vec<TimerSnapshot>,
    pub blocked: Vec<AppId>,
    pub countdown_seconds: u32,
    pub repeat_delay_minutes: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateSnapshot {
    Closed,
    Pending { id: GateId, app: AppId, age_ms: u64 },
    Open { id: GateId, app: AppId, age_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub app: AppId,
    pub opened_ms_ago: Option<u64>,
    pub first_shown_ms_ago: Option<u64>,
    pub cooldown_remaining_ms: Option<u64>,
}

struct Shared {
    state: Mutex<ControllerState>,
    gate: Arc<dyn Gate>,
    clock: Arc<dyn Clock>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        safe_lock(&self.state, "Controller state")
    }
}

impl OutcomeSink for Shared {
    fn deliver(&self, id: GateId, app: &AppId, outcome: GateOutcome) -> ResolveResult {
        let now = self.clock.now();
        let applied = self.lock_state().apply_outcome(id, app, outcome, now);

        match applied {
            None => {
                debug!("Ignoring stale {outcome:?} for gate {id} ({app})");
                ResolveResult::Stale
            }
            Some(GateOutcome::Continue) => {
                info!("Gate {id}: user continued into {app}");
                ResolveResult::Applied
            }
            Some(GateOutcome::Reject) => {
                info!("Gate {id}: user backed out of {app}");
                self.gate.leave_app(app);
                ResolveResult::Applied
            }
        }
    }
}

/// Cheap to clone; all clones drive the same state.
#[derive(Clone)]
pub struct InterventionController {
    shared: Arc<Shared>,
}

impl InterventionController {
    pub fn new(gate: Arc<dyn Gate>, clock: Arc<dyn Clock>, config: &ConfigSnapshot) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ControllerState::new(config)),
                gate,
                clock,
            }),
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.shared.clock)
    }

    /// Open a new monitoring run. Ticks must carry the returned epoch.
    pub(crate) fn begin_monitoring(&self) -> u64 {
        let epoch = self.shared.lock_state().begin();
        info!("Monitoring run {epoch} started");
        epoch
    }

    /// Close the current run: timers and allow-list are dropped and any gate is
    /// torn down without applying an outcome. Ticks still in flight become no-ops.
    pub(crate) fn end_monitoring(&self) {
        let dismissed = self.shared.lock_state().reset();
        if let Some((id, app)) = dismissed {
            info!("Force-closing gate {id} for {app}");
            self.shared.gate.dismiss(id, &app);
        }
        info!("Monitoring stopped, session timers cleared");
    }

    pub fn is_monitoring(&self) -> bool {
        self.shared.lock_state().epoch.is_some()
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.shared.lock_state().epoch == Some(epoch)
    }

    /// Run one tick for the resolved foreground app.
    pub fn tick(&self, epoch: u64, foreground: &AppId) -> TickOutcome {
        let now = self.shared.clock.now();

        let (request, first_recorded) = {
            let mut state = self.shared.lock_state();
            if state.epoch != Some(epoch) {
                return TickOutcome::Inactive;
            }

            let new_session = state.observe_foreground(foreground);
            if new_session && state.blocked.contains(foreground) && !state.allowed.contains(foreground) {
                state.timers.record_open(foreground, now);
                debug!("Blocked app {foreground} opened");
            }

            let decision = state.decide(foreground, now);
            debug!(
                "Tick fg={foreground} blocked={} allowed={} gate={:?} decision={decision:?}",
                state.blocked.contains(foreground),
                state.allowed.contains(foreground),
                state.gate.id(),
            );

            // A Pending or Open slot already makes `decide` return None, so
            // overlapping ticks inside the debounce window cannot claim again.
            let Some(kind) = decision.kind() else {
                return TickOutcome::Idle;
            };
            state.claim_gate(foreground, kind, now)
        };

        let id = request.id;
        let kind = request.kind;
        info!("Presenting {kind:?} gate {id} for {foreground}");

        let handle = GateHandle::new(id, foreground.clone(), self.sink());
        match self.shared.gate.present(request, handle) {
            Ok(()) => {
                let confirmation = self.shared.lock_state().confirm_open(id, self.shared.clock.now());
                match confirmation {
                    Confirmation::Opened | Confirmation::AlreadyResolved => TickOutcome::Presented { id, kind },
                    Confirmation::Superseded => {
                        info!("Gate {id} outlived its monitoring run, dismissing");
                        self.shared.gate.dismiss(id, foreground);
                        TickOutcome::Superseded
                    }
                }
            }
            Err(e) => {
                warn!("Failed to present gate {id} for {foreground}: {e}");
                self.shared.lock_state().abandon_claim(id, first_recorded);
                TickOutcome::PresentationFailed
            }
        }
    }

    /// Deliver an outcome for gate `id`. Equivalent to resolving its handle.
    pub fn resolve(&self, id: GateId, app: &AppId, outcome: GateOutcome) -> ResolveResult {
        self.shared.deliver(id, app, outcome)
    }

    /// Replace the blocked set. Any gate already pending or open is left alone.
    pub fn set_blocked_apps(&self, blocked: BTreeSet<AppId>) {
        let count = blocked.len();
        self.shared.lock_state().blocked = blocked;
        info!("Blocked apps updated. Total: {count}");
    }

    /// Returns the countdown actually applied after clamping.
    pub fn set_countdown_seconds(&self, seconds: u32) -> u32 {
        let mut state = self.shared.lock_state();
        state.policy = state.policy.with_countdown_seconds(seconds);
        state.policy.countdown_seconds
    }

    /// Returns the repeat delay actually applied after clamping. Session timers keep running.
    pub fn set_repeat_delay_minutes(&self, minutes: u32) -> u32 {
        let mut state = self.shared.lock_state();
        state.policy = state.policy.with_repeat_delay_minutes(minutes);
        state.policy.repeat_delay_minutes()
    }

    pub fn set_message(&self, message: &str) {
        self.shared.lock_state().message = message.to_string();
    }

    /// Load a fresh configuration snapshot without touching session state.
    pub fn apply_config(&self, config: &ConfigSnapshot) {
        let mut state = self.shared.lock_state();
        state.blocked = config.blocked.clone();
        state.policy = config.policy();
        state.message = config.message.clone();
    }

    pub fn policy(&self) -> PolicyParameters {
        self.shared.lock_state().policy
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let now = self.shared.clock.now();
        self.shared.lock_state().snapshot(now)
    }

    #[cfg(test)]
    pub(crate) fn inspect<T>(&self, f: impl FnOnce(&ControllerState) -> T) -> T {
        f(&self.shared.lock_state())
    }

    fn sink(&self) -> Weak<dyn OutcomeSink> {
        let sink: Weak<Shared> = Arc::downgrade(&self.shared);
        sink
    }
}
