//! Native messaging host: reads commands from the UI process on stdin and
//! answers on stdout, pushing gate frames on the same channel.

pub mod codec;
pub mod gate;
pub mod messages;

pub use gate::{FrameWriter, HostGate};
pub use messages::{AckValue, IncomingMessage, OutgoingMessage};

use crate::clock::{Clock, SystemClock};
use crate::constants::{COUNTDOWN_STEP, SELF_APP_ID};
use crate::db::Database;
use crate::error::AppError;
use crate::gate::{Gate, ResolveResult};
use crate::models::AppId;
use crate::monitor::Monitor;
use crate::platform::{self, FallbackForeground, ForegroundSource, ReportedForeground};
use crate::poll::PollConfig;
use crate::validation::validate_app_id;
use log::{debug, warn};
use std::io::{self, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct HostConfig {
    pub poll: PollConfig,
    pub countdown_step: Duration,
    /// Also ask the platform (X11) for the foreground app, not only the UI's reports.
    pub use_native_source: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            poll: PollConfig {
                self_app: Some(AppId::from(SELF_APP_ID)),
                ..PollConfig::default()
            },
            countdown_step: COUNTDOWN_STEP,
            use_native_source: true,
        }
    }
}

pub struct NativeHost {
    monitor: Monitor,
    gate: Arc<HostGate>,
    reported: Arc<ReportedForeground>,
    clock: Arc<dyn Clock>,
    writer: FrameWriter,
}

impl NativeHost {
    pub fn new(db: Arc<Mutex<Database>>, writer: FrameWriter, config: HostConfig) -> Result<Self, AppError> {
        Self::with_clock(db, writer, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        db: Arc<Mutex<Database>>,
        writer: FrameWriter,
        config: HostConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let gate = Arc::new(HostGate::new(writer.clone(), config.countdown_step));
        let reported = Arc::new(ReportedForeground::new());

        let reported_handle = Arc::clone(&reported);
        let reported_source: Arc<dyn ForegroundSource> = reported_handle;
        let source: Arc<dyn ForegroundSource> = if config.use_native_source {
            Arc::new(FallbackForeground::new(vec![reported_source, platform::native_source()]))
        } else {
            reported_source
        };

        let host_gate = Arc::clone(&gate);
        let dyn_gate: Arc<dyn Gate> = host_gate;
        let monitor = Monitor::new(db, dyn_gate, source, Arc::clone(&clock), config.poll)?;

        Ok(Self {
            monitor,
            gate,
            reported,
            clock,
            writer,
        })
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    /// Serve commands until the reader is exhausted or a frame cannot be read.
    ///
    /// A payload that is not a known command gets an `error` reply and the
    /// loop continues. End of input surfaces as [`io::ErrorKind::UnexpectedEof`].
    pub fn run<R: Read>(&self, reader: &mut R) -> io::Result<()> {
        loop {
            let payload = codec::read_frame(reader)?;
            let reply = match serde_json::from_slice::<IncomingMessage>(&payload) {
                Ok(message) => self.handle_message(message),
                Err(e) => {
                    warn!("Ignoring malformed message: {e}");
                    OutgoingMessage::Error {
                        message: AppError::from(e).to_string(),
                    }
                }
            };
            self.writer.send(&reply)?;
        }
    }

    pub fn handle_message(&self, message: IncomingMessage) -> OutgoingMessage {
        let command = message.name();
        debug!("Received {command}");

        match self.dispatch(message) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{command} failed: {e}");
                OutgoingMessage::Error { message: e.to_string() }
            }
        }
    }

    fn dispatch(&self, message: IncomingMessage) -> Result<OutgoingMessage, AppError> {
        let command = message.name();
        let value = match message {
            IncomingMessage::StartMonitoring => AckValue::Changed(self.monitor.start_monitoring()?),
            IncomingMessage::StopMonitoring => AckValue::Changed(self.monitor.stop_monitoring()?),
            IncomingMessage::SetBlockedApps { apps } => AckValue::Apps(self.monitor.set_blocked_apps(&apps)?),
            IncomingMessage::SetCountdownSeconds { seconds } => {
                AckValue::Number(self.monitor.set_countdown_seconds(seconds)?)
            }
            IncomingMessage::SetRepeatDelayMinutes { minutes } => {
                AckValue::Number(self.monitor.set_repeat_delay_minutes(minutes)?)
            }
            IncomingMessage::SetMessage { message } => AckValue::Text(self.monitor.set_message(&message)?),
            IncomingMessage::GetSessionState => {
                return Ok(OutgoingMessage::SessionState {
                    state: self.monitor.get_session_state(),
                });
            }
            IncomingMessage::ReportForeground { app } => {
                let app = AppId::from(validate_app_id(&app)?);
                self.reported.report(app, self.clock.now());
                return Ok(OutgoingMessage::ack(command, None));
            }
            IncomingMessage::GateOutcome { gate_id, outcome } => match self.gate.resolve(gate_id, outcome)? {
                ResolveResult::Applied => AckValue::Text("applied".into()),
                ResolveResult::Stale => AckValue::Text("stale".into()),
            },
        };
        Ok(OutgoingMessage::ack(command, Some(value)))
    }

    pub fn shutdown(&self) {
        self.monitor.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::gate::tests::SharedBuf;
    use super::*;
    use crate::clock::ManualClock;
    use crate::test_utils::setup_test_db;
    use serde_json::{json, Value};
    use std::io::Cursor;
    use std::thread;
    use tempfile::TempDir;

    fn host() -> (NativeHost, SharedBuf, TempDir) {
        let (db, dir) = setup_test_db();
        let buf = SharedBuf::default();
        let config = HostConfig {
            poll: PollConfig {
                interval: Duration::from_millis(10),
                self_app: Some(AppId::from(SELF_APP_ID)),
            },
            countdown_step: Duration::from_millis(1),
            use_native_source: false,
        };
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
        let host = NativeHost::with_clock(Arc::new(Mutex::new(db)), FrameWriter::new(buf.clone()), config, clock)
            .unwrap();
        (host, buf, dir)
    }

    fn input(messages: &[Value]) -> Cursor<Vec<u8>> {
        let mut bytes = Vec::new();
        for message in messages {
            codec::write_message(&mut bytes, message).unwrap();
        }
        Cursor::new(bytes)
    }

    fn run(host: &NativeHost, messages: &[Value]) {
        let err = host.run(&mut input(messages)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    fn wait_for_frame(buf: &SharedBuf, kind: &str) -> Value {
        for _ in 0..400 {
            if let Some(frame) = buf.frames_of(kind).pop() {
                return frame;
            }
            thread::sleep(Duration::from_millis(5));
        }
        buf.frames_of(kind).pop().unwrap()
    }

    #[test]
    fn test_setters_reply_with_applied_values() {
        let (host, buf, _dir) = host();
        run(
            &host,
            &[
                json!({"type": "set_blocked_apps", "apps": ["com.b", "com.a"]}),
                json!({"type": "set_countdown_seconds", "seconds": 1}),
                json!({"type": "set_repeat_delay_minutes", "minutes": 2}),
                json!({"type": "set_message", "message": " Sure? "}),
            ],
        );

        let acks = buf.frames_of("ack");
        assert_eq!(acks[0]["value"], json!(["com.a", "com.b"]));
        assert_eq!(acks[1]["value"], 5);
        assert_eq!(acks[2]["value"], 2);
        assert_eq!(acks[3]["value"], "Sure?");
    }

    #[test]
    fn test_bad_input_gets_error_reply_and_loop_continues() {
        let (host, buf, _dir) = host();
        run(
            &host,
            &[
                json!({"type": "no_such_command"}),
                json!({"type": "set_message", "message": "   "}),
                json!({"type": "report_foreground", "app": ""}),
                json!({"type": "get_session_state"}),
            ],
        );

        let frames = buf.frames();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0]["type"], "error");
        assert_eq!(frames[1]["type"], "error");
        assert_eq!(frames[2]["type"], "error");
        assert_eq!(frames[3]["type"], "session_state");
        assert_eq!(frames[3]["state"]["monitoring"], false);
    }

    #[test]
    fn test_gate_flow_over_the_wire() {
        let (host, buf, _dir) = host();
        run(
            &host,
            &[
                json!({"type": "set_blocked_apps", "apps": ["com.feed"]}),
                json!({"type": "report_foreground", "app": "com.feed"}),
                json!({"type": "start_monitoring"}),
            ],
        );

        let present = wait_for_frame(&buf, "present_gate");
        assert_eq!(present["app"], "com.feed");
        assert_eq!(present["kind"], "first");
        let gate_id = present["gate_id"].clone();

        run(&host, &[json!({"type": "gate_outcome", "gate_id": gate_id, "outcome": "reject"})]);

        let leave = wait_for_frame(&buf, "leave_app");
        assert_eq!(leave["app"], "com.feed");
        let ack = buf.frames_of("ack").pop().unwrap();
        assert_eq!(ack["command"], "gate_outcome");
        assert_eq!(ack["value"], "applied");

        host.shutdown();
    }

    #[test]
    fn test_own_app_is_never_gated() {
        let (host, buf, _dir) = host();
        run(
            &host,
            &[
                json!({"type": "set_blocked_apps", "apps": [SELF_APP_ID]}),
                json!({"type": "report_foreground", "app": SELF_APP_ID}),
                json!({"type": "start_monitoring"}),
            ],
        );
        thread::sleep(Duration::from_millis(50));
        host.shutdown();

        assert!(buf.frames_of("present_gate").is_empty());
    }

    #[test]
    fn test_stop_dismisses_open_gate() {
        let (host, buf, _dir) = host();
        run(
            &host,
            &[
                json!({"type": "set_blocked_apps", "apps": ["com.feed"]}),
                json!({"type": "report_foreground", "app": "com.feed"}),
                json!({"type": "start_monitoring"}),
            ],
        );
        let present = wait_for_frame(&buf, "present_gate");

        run(&host, &[json!({"type": "stop_monitoring"})]);
        let dismiss = wait_for_frame(&buf, "dismiss_gate");
        assert_eq!(dismiss["gate_id"], present["gate_id"]);

        run(
            &host,
            &[json!({"type": "gate_outcome", "gate_id": present["gate_id"], "outcome": "continue"})],
        );
        let ack = buf.frames_of("ack").pop().unwrap();
        assert_eq!(ack["value"], "stale");
        host.shutdown();
    }
}
