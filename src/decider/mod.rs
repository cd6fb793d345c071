//! Pure intervention decision.
//!
//! `decide` inspects a snapshot of the controller's state and says whether a
//! gate must be shown for the foreground app right now. It has no side effects
//! and is evaluated on every tick.

use crate::gate::GateState;
use crate::models::{AppId, InterventionKind, PolicyParameters};
use crate::timers::AppTimerRecord;
use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    None,
    ShowFirst,
    ShowSecond,
}

impl Decision {
    pub fn kind(self) -> Option<InterventionKind> {
        match self {
            Decision::None => None,
            Decision::ShowFirst => Some(InterventionKind::First),
            Decision::ShowSecond => Some(InterventionKind::Second),
        }
    }
}

/// Everything the decision looks at, borrowed from the controller state.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    pub foreground: &'a AppId,
    pub blocked: &'a BTreeSet<AppId>,
    pub allowed: &'a HashSet<AppId>,
    pub timer: Option<AppTimerRecord>,
    pub now: Instant,
    pub policy: &'a PolicyParameters,
    pub gate: &'a GateState,
}

pub fn decide(input: &DecisionInput<'_>) -> Decision {
    if !input.blocked.contains(input.foreground) {
        return Decision::None;
    }

    // Never stack a second gate on a pending or open one.
    if !input.gate.is_closed() {
        return Decision::None;
    }

    let Some(timer) = input.timer else {
        return Decision::None;
    };

    if timer.in_cooldown(input.now) {
        return Decision::None;
    }

    let show_first = timer.opened_at.is_some()
        && timer.first_shown_at.is_none()
        && !input.allowed.contains(input.foreground);

    // The session allow-list only waives the first gate.
    let show_second = timer
        .first_shown_at
        .is_some_and(|first| input.now.saturating_duration_since(first) >= input.policy.repeat_delay);

    if show_first {
        Decision::ShowFirst
    } else if show_second {
        Decision::ShowSecond
    } else {
        Decision::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateId;
    use std::time::Duration;

    struct Fixture {
        app: AppId,
        blocked: BTreeSet<AppId>,
        allowed: HashSet<AppId>,
        policy: PolicyParameters,
        gate: GateState,
        t0: Instant,
    }

    impl Fixture {
        fn new() -> Self {
            let app = AppId::from("com.example.feed");
            Self {
                blocked: BTreeSet::from([app.clone()]),
                app,
                allowed: HashSet::new(),
                policy: PolicyParameters::new(15, 1),
                gate: GateState::Closed,
                t0: Instant::now(),
            }
        }

        fn at(&self, secs: u64) -> Instant {
            self.t0 + Duration::from_secs(secs)
        }

        fn decide(&self, timer: Option<AppTimerRecord>, now: Instant) -> Decision {
            decide(&DecisionInput {
                foreground: &self.app,
                blocked: &self.blocked,
                allowed: &self.allowed,
                timer,
                now,
                policy: &self.policy,
                gate: &self.gate,
            })
        }

        fn opened(&self) -> AppTimerRecord {
            AppTimerRecord {
                opened_at: Some(self.t0),
                ..AppTimerRecord::default()
            }
        }
    }

    #[test]
    fn test_unblocked_app_never_triggers() {
        let mut f = Fixture::new();
        f.blocked.clear();
        assert_eq!(f.decide(Some(f.opened()), f.t0), Decision::None);
    }

    #[test]
    fn test_freshly_opened_blocked_app_shows_first() {
        let f = Fixture::new();
        assert_eq!(f.decide(Some(f.opened()), f.t0), Decision::ShowFirst);
    }

    #[test]
    fn test_no_timer_record_means_no_gate() {
        let f = Fixture::new();
        assert_eq!(f.decide(None, f.t0), Decision::None);
    }

    #[test]
    fn test_pending_or_open_gate_suppresses() {
        let mut f = Fixture::new();
        f.gate = GateState::Pending {
            id: GateId(1),
            app: f.app.clone(),
            requested_at: f.t0,
        };
        assert_eq!(f.decide(Some(f.opened()), f.t0), Decision::None);

        f.gate = GateState::Open {
            id: GateId(1),
            app: AppId::from("somewhere.else"),
            opened_at: f.t0,
        };
        assert_eq!(f.decide(Some(f.opened()), f.t0), Decision::None);
    }

    #[test]
    fn test_cooldown_suppresses_even_when_due() {
        let f = Fixture::new();
        let timer = AppTimerRecord {
            opened_at: Some(f.t0),
            first_shown_at: Some(f.t0),
            cooldown_until: Some(f.at(61)),
        };
        assert_eq!(f.decide(Some(timer), f.at(60)), Decision::None);
        assert_eq!(f.decide(Some(timer), f.at(61)), Decision::ShowSecond);
    }

    #[test]
    fn test_allow_list_waives_first_gate() {
        let mut f = Fixture::new();
        f.allowed.insert(f.app.clone());
        assert_eq!(f.decide(Some(f.opened()), f.t0), Decision::None);
    }

    #[test]
    fn test_second_gate_ignores_allow_list() {
        let mut f = Fixture::new();
        f.allowed.insert(f.app.clone());
        let timer = AppTimerRecord {
            opened_at: Some(f.t0),
            first_shown_at: Some(f.t0),
            cooldown_until: Some(f.at(6)),
        };
        assert_eq!(f.decide(Some(timer), f.at(59)), Decision::None);
        assert_eq!(f.decide(Some(timer), f.at(60)), Decision::ShowSecond);
    }

    #[test]
    fn test_zero_repeat_delay_shows_second_immediately() {
        let mut f = Fixture::new();
        f.policy = f.policy.with_repeat_delay_minutes(0);
        let timer = AppTimerRecord {
            opened_at: Some(f.t0),
            first_shown_at: Some(f.t0),
            cooldown_until: None,
        };
        assert_eq!(f.decide(Some(timer), f.t0), Decision::ShowSecond);
    }

    #[test]
    fn test_first_takes_precedence_over_second() {
        let f = Fixture::new();
        assert_eq!(f.decide(Some(f.opened()), f.at(3600)), Decision::ShowFirst);
    }

    #[test]
    fn test_decision_kind() {
        assert_eq!(Decision::None.kind(), None);
        assert_eq!(Decision::ShowFirst.kind(), Some(InterventionKind::First));
        assert_eq!(Decision::ShowSecond.kind(), Some(InterventionKind::Second));
    }
}
