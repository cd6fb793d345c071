//! The countdown gate: the contract between the controller and whatever puts
//! the intervention on screen.

use crate::error::GateError;
use crate::models::{AppId, InterventionKind};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Weak;
use std::time::Instant;

/// Identifies one presentation of a gate. Monotonic per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateId(pub u64);

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The single process-wide gate slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Closed,
    /// A trigger claimed the slot and presentation is in flight.
    Pending {
        id: GateId,
        app: AppId,
        requested_at: Instant,
    },
    Open {
        id: GateId,
        app: AppId,
        opened_at: Instant,
    },
}

impl GateState {
    pub fn is_closed(&self) -> bool {
        matches!(self, GateState::Closed)
    }

    pub fn id(&self) -> Option<GateId> {
        match self {
            GateState::Closed => None,
            GateState::Pending { id, .. } | GateState::Open { id, .. } => Some(*id),
        }
    }

    pub fn app(&self) -> Option<&AppId> {
        match self {
            GateState::Closed => None,
            GateState::Pending { app, .. } | GateState::Open { app, .. } => Some(app),
        }
    }
}

/// The user's answer to a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    /// Let me in.
    Continue,
    /// Take me back.
    Reject,
}

/// What to put on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateRequest {
    pub id: GateId,
    pub app: AppId,
    pub kind: InterventionKind,
    pub countdown_seconds: u32,
    pub message: String,
}

/// Whether an outcome was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveResult {
    Applied,
    /// The gate was already closed or replaced; nothing changed.
    Stale,
}

pub(crate) trait OutcomeSink: Send + Sync {
    fn deliver(&self, id: GateId, app: &AppId, outcome: GateOutcome) -> ResolveResult;
}

/// Reply channel for one presented gate.
///
/// Consumed by [`GateHandle::resolve`], so each gate yields at most one outcome.
/// A handle outliving its gate (stop, restart, controller dropped) resolves as
/// [`ResolveResult::Stale`].
pub struct GateHandle {
    id: GateId,
    app: AppId,
    sink: Weak<dyn OutcomeSink>,
}

impl GateHandle {
    pub(crate) fn new(id: GateId, app: AppId, sink: Weak<dyn OutcomeSink>) -> Self {
        Self { id, app, sink }
    }

    pub fn id(&self) -> GateId {
        self.id
    }

    pub fn app(&self) -> &AppId {
        &self.app
    }

    pub fn resolve(self, outcome: GateOutcome) -> ResolveResult {
        match self.sink.upgrade() {
            Some(sink) => sink.deliver(self.id, &self.app, outcome),
            None => {
                debug!("Gate {} for {} resolved after controller was dropped", self.id, self.app);
                ResolveResult::Stale
            }
        }
    }
}

impl fmt::Debug for GateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateHandle")
            .field("id", &self.id)
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}

/// Presents and tears down the intervention surface.
///
/// Implementations must not call back into the controller synchronously from
/// `dismiss` or `leave_app`; `present` may resolve the handle immediately.
pub trait Gate: Send + Sync {
    /// Put the gate on screen and start its countdown. The outcome is reported
    /// later through `handle`.
    fn present(&self, request: GateRequest, handle: GateHandle) -> Result<(), GateError>;

    /// Tear the gate down without an outcome (monitoring stopped, stale presentation).
    fn dismiss(&self, id: GateId, app: &AppId);

    /// Navigate away from `app` after the user rejected it.
    fn leave_app(&self, app: &AppId);
}

/// One second of a gate countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountdownStep {
    pub remaining_secs: u32,
    pub progress_percent: u8,
}

impl CountdownStep {
    pub fn is_complete(&self) -> bool {
        self.remaining_secs == 0
    }

    pub fn label(&self) -> String {
        if self.is_complete() {
            "You can continue now".to_string()
        } else {
            format!("Wait {} seconds", self.remaining_secs)
        }
    }
}

/// Yields `total + 1` steps, from `total` seconds remaining down to zero.
#[derive(Debug, Clone)]
pub struct Countdown {
    total: u32,
    next: Option<u32>,
}

impl Countdown {
    pub fn new(total_secs: u32) -> Self {
        Self {
            total: total_secs,
            next: Some(total_secs),
        }
    }
}

impl Iterator for Countdown {
    type Item = CountdownStep;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.next?;
        self.next = remaining.checked_sub(1);

        let progress = if self.total == 0 {
            100
        } else {
            u64::from(self.total - remaining) * 100 / u64::from(self.total)
        };

        Some(CountdownStep {
            remaining_secs: remaining,
            progress_percent: u8::try_from(progress).unwrap_or(100),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct CapturingSink(Mutex<Vec<(GateId, GateOutcome)>>);

    impl OutcomeSink for CapturingSink {
        fn deliver(&self, id: GateId, _app: &AppId, outcome: GateOutcome) -> ResolveResult {
            self.0.lock().unwrap().push((id, outcome));
            ResolveResult::Applied
        }
    }

    #[test]
    fn test_countdown_steps() {
        let steps: Vec<_> = Countdown::new(5).collect();
        assert_eq!(steps.len(), 6);
        assert_eq!(steps[0], CountdownStep { remaining_secs: 5, progress_percent: 0 });
        assert_eq!(steps[1].progress_percent, 20);
        assert_eq!(steps[5], CountdownStep { remaining_secs: 0, progress_percent: 100 });
        assert!(steps[5].is_complete());
    }

    #[test]
    fn test_countdown_labels() {
        let mut countdown = Countdown::new(15);
        assert_eq!(countdown.next().unwrap().label(), "Wait 15 seconds");
        assert_eq!(countdown.last().unwrap().label(), "You can continue now");
    }

    #[test]
    fn test_zero_countdown_completes_immediately() {
        let steps: Vec<_> = Countdown::new(0).collect();
        assert_eq!(steps, vec![CountdownStep { remaining_secs: 0, progress_percent: 100 }]);
    }

    #[test]
    fn test_handle_delivers_to_sink() {
        let sink = Arc::new(CapturingSink(Mutex::new(Vec::new())));
        let weak: Weak<CapturingSink> = Arc::downgrade(&sink);
        let handle = GateHandle::new(GateId(7), AppId::from("feed"), weak);

        assert_eq!(handle.resolve(GateOutcome::Continue), ResolveResult::Applied);
        assert_eq!(*sink.0.lock().unwrap(), vec![(GateId(7), GateOutcome::Continue)]);
    }

    #[test]
    fn test_handle_after_sink_dropped_is_stale() {
        let sink = Arc::new(CapturingSink(Mutex::new(Vec::new())));
        let weak: Weak<CapturingSink> = Arc::downgrade(&sink);
        let handle = GateHandle::new(GateId(1), AppId::from("feed"), weak);
        drop(sink);

        assert_eq!(handle.resolve(GateOutcome::Reject), ResolveResult::Stale);
    }

    #[test]
    fn test_gate_state_accessors() {
        let now = Instant::now();
        let state = GateState::Open {
            id: GateId(3),
            app: AppId::from("feed"),
            opened_at: now,
        };
        assert!(!state.is_closed());
        assert_eq!(state.id(), Some(GateId(3)));
        assert_eq!(state.app(), Some(&AppId::from("feed")));
        assert!(GateState::default().is_closed());
    }

    #[test]
    fn test_outcome_wire_names() {
        assert_eq!(serde_json::to_string(&GateOutcome::Continue).unwrap(), "\"continue\"");
        let o: GateOutcome = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(o, GateOutcome::Reject);
    }
}
