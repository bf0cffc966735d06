//! Command serializer — the single owner of LED state.
//!
//! The [`Serializer`] receives raw command tokens over one channel and applies
//! them strictly in arrival order, one at a time. It owns both the backend and
//! the tracked mask; producers only ever see the resulting [`SessionReport`].

use std::sync::mpsc::{self, Receiver};

use serde::Serialize;

use crate::backend::{BackendError, LedBackend, Transition};
use crate::command::{LedCommand, ParseError, parse_command};
use crate::state::{LedMask, StateTracker};
use crate::source::CommandSource;

/// Inbound message for the serializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Raw command token, validated by the serializer.
    Command(String),
    /// No more commands: finish the current one and stop.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializerState {
    Idle,
    Applying,
    Draining,
    Stopped,
}

/// Result of handling one command token.
#[derive(Debug)]
pub enum CommandOutcome {
    Applied {
        command: LedCommand,
        from: LedMask,
        to: LedMask,
    },
    /// Token did not parse; the backend was not touched.
    Rejected { token: String, error: ParseError },
    /// Backend refused the change; tracked state is unchanged.
    Failed {
        command: LedCommand,
        error: BackendError,
    },
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied { .. })
    }
}

/// Summary of a serializer run.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub backend: &'static str,
    /// Whether `initial_state` was read from the device rather than assumed.
    pub authoritative: bool,
    pub initial_state: LedMask,
    pub final_state: LedMask,
    /// Tracked state after each handled command, in order.
    pub states: Vec<LedMask>,
    pub applied: usize,
    pub rejected: usize,
    pub failed: usize,
    /// One message per rejected or failed command.
    pub diagnostics: Vec<String>,
}

impl SessionReport {
    fn new(backend: &'static str, tracker: &StateTracker) -> Self {
        let initial = tracker.current();
        Self {
            backend,
            authoritative: tracker.is_authoritative(),
            initial_state: initial,
            final_state: initial,
            states: Vec::new(),
            applied: 0,
            rejected: 0,
            failed: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Total number of commands handled.
    pub fn handled(&self) -> usize {
        self.states.len()
    }
}

/// Applies LED commands one at a time against a backend.
pub struct Serializer<B: LedBackend> {
    backend: B,
    tracker: StateTracker,
    state: SerializerState,
    report: SessionReport,
}

impl<B: LedBackend> Serializer<B> {
    /// Take ownership of `backend` and seed the tracked state from it.
    ///
    /// Fails if the backend can be queried and the query fails.
    pub fn new(backend: B) -> Result<Self, BackendError> {
        let tracker = StateTracker::initialize(&backend)?;
        Ok(Self::with_tracker(backend, tracker))
    }

    pub fn with_tracker(backend: B, tracker: StateTracker) -> Self {
        let report = SessionReport::new(backend.name(), &tracker);
        Self {
            backend,
            tracker,
            state: SerializerState::Idle,
            report,
        }
    }

    pub fn current_state(&self) -> LedMask {
        self.tracker.current()
    }

    pub fn state(&self) -> SerializerState {
        self.state
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    /// Handle one token: parse, apply, commit.
    ///
    /// Errors are contained to the command: they are logged, recorded in the
    /// report, and leave the tracked state untouched.
    pub fn handle(&mut self, token: &str) -> CommandOutcome {
        debug_assert_eq!(self.state, SerializerState::Idle);
        self.state = SerializerState::Applying;
        let outcome = self.apply_token(token);
        match &outcome {
            CommandOutcome::Applied { command, from, to } => {
                log::debug!("{command}: {from} -> {to}");
                self.report.applied += 1;
            }
            CommandOutcome::Rejected { error, .. } => {
                log::warn!("{error}");
                self.report.rejected += 1;
                self.report.diagnostics.push(error.to_string());
            }
            CommandOutcome::Failed { command, error } => {
                log::error!("{command}: {error}");
                self.report.failed += 1;
                self.report.diagnostics.push(format!("{command}: {error}"));
            }
        }
        let current = self.tracker.current();
        self.report.states.push(current);
        self.report.final_state = current;
        self.state = SerializerState::Idle;
        outcome
    }

    fn apply_token(&mut self, token: &str) -> CommandOutcome {
        let command = match parse_command(token) {
            Ok(command) => command,
            Err(error) => {
                return CommandOutcome::Rejected {
                    token: token.to_string(),
                    error,
                };
            }
        };
        let from = self.tracker.current();
        let transition = Transition {
            command,
            from,
            to: command.apply_to(from),
        };
        match self.backend.apply(&transition) {
            Ok(()) => {
                self.tracker.commit(transition.to);
                CommandOutcome::Applied {
                    command,
                    from,
                    to: transition.to,
                }
            }
            Err(error) => CommandOutcome::Failed { command, error },
        }
    }

    /// Drain `rx` until a stop signal, then return the session report.
    ///
    /// Commands queued behind the stop signal are never applied; the
    /// receiver is dropped on return so later sends fail.
    pub fn run(mut self, rx: Receiver<Message>) -> SessionReport {
        loop {
            match rx.recv() {
                Ok(Message::Command(token)) => {
                    self.handle(&token);
                }
                Ok(Message::Stop) => break,
                Err(_) => {
                    log::warn!("command source went away without a stop signal");
                    break;
                }
            }
        }
        self.stop();
        self.report
    }

    fn stop(&mut self) {
        self.state = SerializerState::Draining;
        log::debug!(
            "serializer stopping after {} command(s), final state {}",
            self.report.handled(),
            self.tracker.current()
        );
        self.state = SerializerState::Stopped;
    }
}

/// Run one session: `source` on a producer thread, `serializer` on the
/// calling thread, joined by a zero-capacity channel.
pub fn run_session<B: LedBackend>(serializer: Serializer<B>, source: CommandSource) -> SessionReport {
    let (tx, rx) = mpsc::sync_channel(0);
    let producer = std::thread::spawn(move || source.produce(&tx));
    let report = serializer.run(rx);
    match producer.join() {
        Ok(sent) => log::debug!("producer finished after {sent} command(s)"),
        Err(_) => log::error!("command producer panicked"),
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::KeyboardRequest;
    use crate::backend::mock::{MockConsole, MockKeyboard};

    fn masks(bits: &[u8]) -> Vec<LedMask> {
        bits.iter().copied().map(LedMask::new).collect()
    }

    #[test]
    fn new_fails_when_initial_query_fails() {
        let dev = MockConsole::new(0);
        dev.fail_query.set(true);
        assert!(matches!(
            Serializer::new(&dev),
            Err(BackendError::QueryFailed(_))
        ));
    }

    #[test]
    fn starts_from_queried_state() {
        let dev = MockConsole::new(0x04);
        let ser = Serializer::new(&dev).unwrap();
        assert_eq!(ser.current_state(), LedMask::new(0x04));
        assert_eq!(ser.state(), SerializerState::Idle);
        assert!(ser.report().authoritative);
    }

    #[test]
    fn handle_applies_and_commits() {
        let dev = MockConsole::new(0);
        let mut ser = Serializer::new(&dev).unwrap();
        let outcome = ser.handle("+caps");
        assert!(outcome.is_applied());
        assert_eq!(ser.current_state(), LedMask::new(0x04));
        assert_eq!(dev.device.get(), LedMask::new(0x04));
        assert_eq!(ser.state(), SerializerState::Idle);
    }

    #[test]
    fn rejected_token_never_reaches_backend() {
        let dev = MockConsole::new(0x01);
        let mut ser = Serializer::new(&dev).unwrap();
        let outcome = ser.handle("bogus");
        assert!(matches!(
            outcome,
            CommandOutcome::Rejected {
                error: ParseError::BadPolarity(_),
                ..
            }
        ));
        assert_eq!(dev.apply_calls(), 0);
        assert_eq!(ser.current_state(), LedMask::new(0x01));
        assert_eq!(ser.report().rejected, 1);
        assert_eq!(ser.report().diagnostics.len(), 1);
    }

    #[test]
    fn failed_apply_keeps_state() {
        let dev = MockConsole::new(0x01);
        dev.fail_apply(1);
        let mut ser = Serializer::new(&dev).unwrap();
        let outcome = ser.handle("+num");
        assert!(matches!(
            outcome,
            CommandOutcome::Failed {
                error: BackendError::ApplyFailed(_),
                ..
            }
        ));
        assert_eq!(ser.current_state(), LedMask::new(0x01));
        assert_eq!(ser.report().failed, 1);
        assert!(ser.report().diagnostics[0].starts_with("+num: "));
    }

    #[test]
    fn caps_on_is_idempotent() {
        let dev = MockConsole::new(0x01);
        let mut ser = Serializer::new(&dev).unwrap();
        ser.handle("+caps");
        let once = ser.current_state();
        ser.handle("+caps");
        assert_eq!(ser.current_state(), once);
    }

    #[test]
    fn scroll_on_off_restores_state() {
        for initial in [0x00, 0x02, 0x06] {
            let dev = MockConsole::new(initial);
            let mut ser = Serializer::new(&dev).unwrap();
            ser.handle("+scroll");
            ser.handle("-scroll");
            assert_eq!(ser.current_state(), LedMask::new(initial));
        }
    }

    #[test]
    fn run_stops_on_stop_and_drops_later_commands() {
        let dev = MockConsole::new(0);
        let ser = Serializer::new(&dev).unwrap();
        let (tx, rx) = mpsc::sync_channel(4);
        tx.send(Message::Command("+caps".into())).unwrap();
        tx.send(Message::Stop).unwrap();
        tx.send(Message::Command("+num".into())).unwrap();
        let report = ser.run(rx);
        assert_eq!(report.applied, 1);
        assert_eq!(report.final_state, LedMask::new(0x04));
        assert_eq!(dev.apply_calls(), 1);
        assert!(tx.send(Message::Command("+scroll".into())).is_err());
    }

    #[test]
    fn run_treats_disconnect_as_stop() {
        let dev = MockConsole::new(0);
        let ser = Serializer::new(&dev).unwrap();
        let (tx, rx) = mpsc::sync_channel(2);
        tx.send(Message::Command("+num".into())).unwrap();
        drop(tx);
        let report = ser.run(rx);
        assert_eq!(report.final_state, LedMask::new(0x02));
    }

    #[test]
    fn session_applies_in_order() {
        let dev = MockConsole::new(0);
        let ser = Serializer::new(&dev).unwrap();
        let report = run_session(ser, CommandSource::batch(["+caps", "-caps", "+caps"]));
        assert_eq!(*dev.writes.borrow(), masks(&[0x04, 0x00, 0x04]));
        assert_eq!(report.final_state, LedMask::new(0x04));
        assert_eq!(report.applied, 3);
    }

    #[test]
    fn session_end_to_end_scenario() {
        let dev = MockConsole::new(0);
        let ser = Serializer::new(&dev).unwrap();
        let report = run_session(
            ser,
            CommandSource::batch(["+scroll", "+num", "-scroll", "bogus", "+all"]),
        );
        assert_eq!(report.states, masks(&[0x01, 0x03, 0x02, 0x02, 0xFF]));
        assert_eq!(report.final_state, LedMask::ALL);
        assert_eq!(report.applied, 4);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].contains("bogus"));
    }

    #[test]
    fn failure_isolation_middle_command() {
        let dev = MockConsole::new(0);
        dev.fail_apply(2);
        let ser = Serializer::new(&dev).unwrap();
        let report = run_session(ser, CommandSource::batch(["+scroll", "+num", "+caps"]));
        // Same as running only "+scroll", "+caps".
        assert_eq!(report.final_state, LedMask::new(0x05));
        assert_eq!(report.states, masks(&[0x01, 0x01, 0x05]));
        assert_eq!(report.failed, 1);
        assert_eq!(dev.apply_calls(), 3);
    }

    #[test]
    fn write_only_backend_tracks_state_in_memory() {
        let kbd = MockKeyboard::new();
        let ser = Serializer::new(&kbd).unwrap();
        let report = run_session(ser, CommandSource::batch(["+num", "+all", "-caps"]));
        assert!(!report.authoritative);
        assert_eq!(report.initial_state, LedMask::EMPTY);
        assert_eq!(report.final_state, LedMask::new(0xFB));
        let requests = kbd.requests.borrow();
        assert_eq!(requests.len(), 3);
        assert!(matches!(
            requests[1],
            KeyboardRequest::AllIndicators { .. }
        ));
    }

    #[test]
    fn write_only_failure_is_reported() {
        let kbd = MockKeyboard::new();
        kbd.fail_apply.set(true);
        let ser = Serializer::new(&kbd).unwrap();
        let report = run_session(ser, CommandSource::batch(["+caps"]));
        assert_eq!(report.failed, 1);
        assert_eq!(report.final_state, LedMask::EMPTY);
    }

    #[test]
    fn report_serializes_states_as_integers() {
        let dev = MockConsole::new(0);
        let ser = Serializer::new(&dev).unwrap();
        let report = run_session(ser, CommandSource::batch(["+num"]));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["backend"], "mock-console");
        assert_eq!(json["authoritative"], true);
        assert_eq!(json["final_state"], 2);
        assert_eq!(json["states"], serde_json::json!([2]));
    }
}
