use crate::controller::SessionSnapshot;
use crate::gate::{CountdownStep, GateId, GateOutcome, GateRequest};
use crate::models::{AppId, InterventionKind};
use serde::{Deserialize, Serialize};

/// Commands from the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingMessage {
    StartMonitoring,
    StopMonitoring,
    SetBlockedApps { apps: Vec<String> },
    SetCountdownSeconds { seconds: u32 },
    SetRepeatDelayMinutes { minutes: u32 },
    SetMessage { message: String },
    GetSessionState,
    /// The UI's own view of the foreground app, for platforms without a native source.
    ReportForeground { app: String },
    GateOutcome { gate_id: GateId, outcome: GateOutcome },
}

impl IncomingMessage {
    pub fn name(&self) -> &'static str {
        match self {
            IncomingMessage::StartMonitoring => "start_monitoring",
            IncomingMessage::StopMonitoring => "stop_monitoring",
            IncomingMessage::SetBlockedApps { .. } => "set_blocked_apps",
            IncomingMessage::SetCountdownSeconds { .. } => "set_countdown_seconds",
            IncomingMessage::SetRepeatDelayMinutes { .. } => "set_repeat_delay_minutes",
            IncomingMessage::SetMessage { .. } => "set_message",
            IncomingMessage::GetSessionState => "get_session_state",
            IncomingMessage::ReportForeground { .. } => "report_foreground",
            IncomingMessage::GateOutcome { .. } => "gate_outcome",
        }
    }
}

/// Value echoed back with an `ack`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AckValue {
    Changed(bool),
    Number(u32),
    Text(String),
    Apps(Vec<AppId>),
}

/// Replies and notifications to the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    Ack {
        command: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<AckValue>,
    },
    Error {
        message: String,
    },
    SessionState {
        state: SessionSnapshot,
    },
    PresentGate {
        gate_id: GateId,
        app: AppId,
        kind: InterventionKind,
        countdown_seconds: u32,
        message: String,
    },
    Countdown {
        gate_id: GateId,
        remaining_secs: u32,
        progress_percent: u8,
        label: String,
    },
    DismissGate {
        gate_id: GateId,
        app: AppId,
    },
    LeaveApp {
        app: AppId,
    },
}

impl OutgoingMessage {
    pub fn ack(command: &'static str, value: Option<AckValue>) -> Self {
        OutgoingMessage::Ack { command, value }
    }

    pub fn present(request: &GateRequest) -> Self {
        OutgoingMessage::PresentGate {
            gate_id: request.id,
            app: request.app.clone(),
            kind: request.kind,
            countdown_seconds: request.countdown_seconds,
            message: request.message.clone(),
        }
    }

    pub fn countdown(gate_id: GateId, step: CountdownStep) -> Self {
        OutgoingMessage::Countdown {
            gate_id,
            remaining_secs: step.remaining_secs,
            progress_percent: step.progress_percent,
            label: step.label(),
        }
    }
}
