use std::mem;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::capture::command_utils::Helpers;
use crate::capture::compositor::{OutputSource, list_outputs};
use crate::capture::destination::{resolve_destination, timestamp_id};
use crate::capture::recorder::{CaptureProcess, build_capture_args};
use crate::capture::selector::SelectorProcess;
use crate::capture::session::{Phase, Session, SessionEvent, SessionState};
use crate::capture::{RegionRequest, RegionSelection, Selection};
use crate::error::{RecorderError, Result};

/// How long a stopped capture helper may take to finalize its file before it is killed.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Everything a new session needs, snapshotted when the user presses start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Destination path template; `{id}` is replaced once per session.
    pub destination_template: String,
    pub include_audio: bool,
    pub start_delay: Duration,
    /// Appended verbatim after the built-in capture flags.
    pub extra_flags: Vec<String>,
    pub region: RegionRequest,
}

/// Drives one recording session at a time through its lifecycle.
///
/// The controller never blocks on a helper. Presenters call [`Controller::poll`]
/// from their main loop and read transitions from [`Controller::subscribe`].
pub struct Controller {
    helpers: Helpers,
    output_source: OutputSource,
    session: Option<Session>,
    subscribers: Vec<Sender<SessionEvent>>,
    id_source: Box<dyn Fn() -> String>,
    stop_timeout: Duration,
}

impl Controller {
    pub fn new(helpers: Helpers) -> Self {
        let output_source = OutputSource::detect(helpers.outputs.as_ref());
        Self {
            helpers,
            output_source,
            session: None,
            subscribers: Vec::new(),
            id_source: Box::new(timestamp_id),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    pub fn with_id_source(mut self, id_source: impl Fn() -> String + 'static) -> Self {
        self.id_source = Box::new(id_source);
        self
    }

    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    pub fn with_output_source(mut self, output_source: OutputSource) -> Self {
        self.output_source = output_source;
        self
    }

    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn helpers(&self) -> &Helpers {
        &self.helpers
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Idle, Session::state)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn list_outputs(&self) -> Vec<String> {
        list_outputs(&self.output_source)
    }

    /// Begins a new session. Only valid while idle.
    ///
    /// Returns the state the session settled in: selecting, starting,
    /// recording (no delay) or failed.
    pub fn start(&mut self, config: SessionConfig) -> Result<SessionState> {
        if let Some(session) = &self.session {
            return Err(self.invalid("start", session.state()));
        }

        let SessionConfig {
            destination_template,
            include_audio,
            start_delay,
            extra_flags,
            region,
        } = config;

        info!(
            region = region.slug(),
            template = %destination_template,
            include_audio,
            delay_secs = start_delay.as_secs(),
            "starting session"
        );

        self.session = Some(Session {
            phase: Phase::Starting {
                launch_at: Instant::now(),
            },
            destination_template,
            destination_path: None,
            include_audio,
            start_delay,
            extra_flags,
            selected_region: None,
            error: None,
        });

        match region {
            RegionRequest::Interactive | RegionRequest::PickOutput => {
                match SelectorProcess::spawn(&self.helpers.selector, &region) {
                    Ok(selector) => {
                        self.set_phase(Phase::Selecting(selector));
                        self.emit(SessionEvent::SelectingRegion {
                            outputs: Vec::new(),
                        });
                    }
                    Err(err) => self.fail(err),
                }
            }
            RegionRequest::WholeOutput => {
                let mut outputs = self.list_outputs();
                match outputs.len() {
                    0 => {
                        warn!("no outputs reported, letting the capture helper pick one");
                        self.enter_starting(None);
                    }
                    1 => {
                        let output = outputs.remove(0);
                        self.enter_starting(Some(Selection::Output(output)));
                    }
                    _ => {
                        self.set_phase(Phase::ChoosingOutput(outputs.clone()));
                        self.emit(SessionEvent::SelectingRegion { outputs });
                    }
                }
            }
            RegionRequest::Preselected(selection) => self.enter_starting(Some(selection)),
        }

        Ok(self.state())
    }

    /// Picks one of the outputs offered in a `SelectingRegion` event.
    ///
    /// A name that was not offered is rejected and the session keeps waiting.
    pub fn choose_output(&mut self, name: &str) -> Result<SessionState> {
        let offered = match self.session.as_ref().map(|session| &session.phase) {
            Some(Phase::ChoosingOutput(outputs)) => outputs,
            _ => return Err(self.invalid("choose an output", self.state())),
        };

        if !offered.iter().any(|output| output == name) {
            warn!(output = name, ?offered, "rejected an output that was not offered");
            return Err(RecorderError::UnknownOutput {
                name: name.to_string(),
                offered: offered.clone(),
            });
        }

        self.enter_starting(Some(Selection::Output(name.to_string())));
        Ok(self.state())
    }

    /// Asks the capture helper to finish. Completion is reported by [`Controller::poll`].
    pub fn stop(&mut self) -> Result<()> {
        let state = self.state();
        if state != SessionState::Recording {
            return Err(self.invalid("stop", state));
        }

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        if let Phase::Recording(process) = mem::replace(&mut session.phase, Phase::Failed) {
            let mut deadline = Instant::now() + self.stop_timeout;
            if let Err(err) = process.interrupt() {
                warn!(error = %err, "graceful stop failed, escalating");
                deadline = Instant::now();
            }
            info!(pid = process.id(), "stop requested");
            session.phase = Phase::Stopping { process, deadline };
            self.emit(SessionEvent::Stopping);
        }

        Ok(())
    }

    /// Abandons a session that has not started recording yet.
    pub fn cancel(&mut self) -> Result<()> {
        let state = self.state();
        if !matches!(state, SessionState::SelectingRegion | SessionState::Starting) {
            return Err(self.invalid("cancel", state));
        }

        if let Some(session) = self.session.take()
            && let Phase::Selecting(selector) = session.phase
        {
            selector.kill();
        }

        info!("session cancelled");
        self.emit(SessionEvent::Idle { cancelled: true });
        Ok(())
    }

    /// Discards a finished or failed session.
    pub fn acknowledge(&mut self) -> Result<()> {
        let state = self.state();
        if !state.is_terminal() {
            return Err(self.invalid("acknowledge", state));
        }

        self.session = None;
        self.emit(SessionEvent::Idle { cancelled: false });
        Ok(())
    }

    /// Advances timer and process driven transitions. Returns the current state.
    pub fn poll(&mut self) -> SessionState {
        let Some(session) = self.session.as_mut() else {
            return SessionState::Idle;
        };

        let phase = mem::replace(&mut session.phase, Phase::Failed);
        match phase {
            Phase::Selecting(mut selector) => match selector.try_finish() {
                None => self.set_phase(Phase::Selecting(selector)),
                Some(Ok(RegionSelection::Cancelled)) => {
                    self.session = None;
                    info!("region selection cancelled");
                    self.emit(SessionEvent::Idle { cancelled: true });
                }
                Some(Ok(RegionSelection::Area(geometry))) => {
                    self.enter_starting(Some(Selection::Area(geometry)));
                }
                Some(Ok(RegionSelection::Output(name))) => {
                    self.enter_starting(Some(Selection::Output(name)));
                }
                Some(Err(err)) => self.fail(err),
            },
            Phase::Starting { launch_at } => {
                self.set_phase(Phase::Starting { launch_at });
                if Instant::now() >= launch_at {
                    self.launch();
                }
            }
            Phase::Recording(mut process) => match process.try_wait() {
                Ok(None) => self.set_phase(Phase::Recording(process)),
                Ok(Some(status)) => {
                    warn!(%status, "capture helper exited without being asked to");
                    let error = RecorderError::HelperExit {
                        program: process.program().to_string(),
                        code: status.code(),
                        stderr: process.stderr_tail(),
                    };
                    self.fail(error);
                }
                Err(err) => {
                    process.kill();
                    self.fail(err);
                }
            },
            Phase::Stopping {
                mut process,
                deadline,
            } => match process.try_wait() {
                Ok(Some(status)) => match process.exit_error(status) {
                    None => self.finish(),
                    Some(err) => self.fail(err),
                },
                Ok(None) if Instant::now() >= deadline => {
                    warn!(pid = process.id(), "capture helper ignored the stop request");
                    process.kill();
                    let error = RecorderError::Unresponsive {
                        program: process.program().to_string(),
                        waited: self.stop_timeout,
                    };
                    self.fail(error);
                }
                Ok(None) => self.set_phase(Phase::Stopping { process, deadline }),
                Err(err) => {
                    process.kill();
                    self.fail(err);
                }
            },
            settled => self.set_phase(settled),
        }

        self.state()
    }

    /// Polls until `done` accepts the state or `timeout` passes. Blocks the caller.
    pub fn poll_until(
        &mut self,
        timeout: Duration,
        done: impl Fn(SessionState) -> bool,
    ) -> SessionState {
        let deadline = Instant::now() + timeout;
        loop {
            let state = self.poll();
            if done(state) || Instant::now() >= deadline {
                return state;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Winds down whatever is in flight before the application exits.
    pub fn shutdown(&mut self, timeout: Duration) {
        match self.state() {
            SessionState::Recording => {
                if self.stop().is_ok() {
                    self.poll_until(timeout, |state| state != SessionState::Stopping);
                }
            }
            SessionState::SelectingRegion | SessionState::Starting => {
                let _ = self.cancel();
            }
            _ => {}
        }

        // dropping the session kills and reaps anything still running
        if self.state() == SessionState::Stopping {
            warn!("capture helper still running at shutdown");
            self.session = None;
        }
    }

    fn enter_starting(&mut self, selection: Option<Selection>) {
        let id = (self.id_source)();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.selected_region = selection.clone();

        match resolve_destination(&session.destination_template, &id) {
            Ok(destination) => {
                let delay = session.start_delay;
                session.destination_path = Some(destination.clone());
                session.phase = Phase::Starting {
                    launch_at: Instant::now() + delay,
                };

                info!(
                    destination = %destination.display(),
                    selection = ?selection,
                    delay_secs = delay.as_secs(),
                    "destination resolved"
                );
                self.emit(SessionEvent::Starting {
                    selection,
                    destination,
                    delay,
                });

                if delay.is_zero() {
                    self.launch();
                }
            }
            Err(err) => self.fail(err),
        }
    }

    fn launch(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(destination) = session.destination_path.clone() else {
            return;
        };

        let args = build_capture_args(
            session.selected_region.as_ref(),
            &destination,
            session.include_audio,
            &session.extra_flags,
        );

        match CaptureProcess::spawn(&self.helpers.capture, &args) {
            Ok(process) => {
                let pid = process.id();
                session.phase = Phase::Recording(process);
                info!(pid, destination = %destination.display(), "recording");
                self.emit(SessionEvent::Recording { destination, pid });
            }
            Err(err) => self.fail(err),
        }
    }

    fn finish(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.phase = Phase::Finished;
        let Some(destination) = session.destination_path.clone() else {
            return;
        };

        info!(destination = %destination.display(), "recording saved");
        self.emit(SessionEvent::Finished { destination });
    }

    fn fail(&mut self, error: RecorderError) {
        if let Some(session) = self.session.as_mut() {
            session.phase = Phase::Failed;
            session.error = Some(error.clone());
        }

        warn!(%error, "session failed");
        self.emit(SessionEvent::Failed { error });
    }

    fn set_phase(&mut self, phase: Phase) {
        if let Some(session) = self.session.as_mut() {
            session.phase = phase;
        }
    }

    fn invalid(&self, operation: &'static str, state: SessionState) -> RecorderError {
        warn!(operation, %state, "operation rejected");
        RecorderError::InvalidState { operation, state }
    }

    fn emit(&mut self, event: SessionEvent) {
        debug!(state = %event.state(), "session event");
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
