use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::capture::Selection;
use crate::capture::recorder::CaptureProcess;
use crate::capture::selector::SelectorProcess;
use crate::error::RecorderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    SelectingRegion,
    Starting,
    Recording,
    Stopping,
    Finished,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Finished | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::SelectingRegion => "selecting a region",
            SessionState::Starting => "starting",
            SessionState::Recording => "recording",
            SessionState::Stopping => "stopping",
            SessionState::Finished => "finished",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One notification per state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Back to idle. `cancelled` is false when a finished or failed session was acknowledged.
    Idle { cancelled: bool },
    /// Waiting for a region. `outputs` is non-empty when the presenter has to pick one.
    SelectingRegion { outputs: Vec<String> },
    Starting {
        selection: Option<Selection>,
        destination: PathBuf,
        delay: Duration,
    },
    Recording { destination: PathBuf, pid: u32 },
    Stopping,
    Finished { destination: PathBuf },
    Failed { error: RecorderError },
}

impl SessionEvent {
    pub fn state(&self) -> SessionState {
        match self {
            SessionEvent::Idle { .. } => SessionState::Idle,
            SessionEvent::SelectingRegion { .. } => SessionState::SelectingRegion,
            SessionEvent::Starting { .. } => SessionState::Starting,
            SessionEvent::Recording { .. } => SessionState::Recording,
            SessionEvent::Stopping => SessionState::Stopping,
            SessionEvent::Finished { .. } => SessionState::Finished,
            SessionEvent::Failed { .. } => SessionState::Failed,
        }
    }
}

pub(crate) enum Phase {
    Selecting(SelectorProcess),
    ChoosingOutput(Vec<String>),
    Starting { launch_at: Instant },
    Recording(CaptureProcess),
    Stopping {
        process: CaptureProcess,
        deadline: Instant,
    },
    Finished,
    Failed,
}

/// The single recording attempt owned by the controller.
pub struct Session {
    pub(crate) phase: Phase,
    pub(crate) destination_template: String,
    pub(crate) destination_path: Option<PathBuf>,
    pub(crate) include_audio: bool,
    pub(crate) start_delay: Duration,
    pub(crate) extra_flags: Vec<String>,
    pub(crate) selected_region: Option<Selection>,
    pub(crate) error: Option<RecorderError>,
}

impl Session {
    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Selecting(_) | Phase::ChoosingOutput(_) => SessionState::SelectingRegion,
            Phase::Starting { .. } => SessionState::Starting,
            Phase::Recording(_) => SessionState::Recording,
            Phase::Stopping { .. } => SessionState::Stopping,
            Phase::Finished => SessionState::Finished,
            Phase::Failed => SessionState::Failed,
        }
    }

    pub fn destination_path(&self) -> Option<&Path> {
        self.destination_path.as_deref()
    }

    pub fn selected_region(&self) -> Option<&Selection> {
        self.selected_region.as_ref()
    }

    pub fn include_audio(&self) -> bool {
        self.include_audio
    }

    pub fn extra_flags(&self) -> &[String] {
        &self.extra_flags
    }

    pub fn error(&self) -> Option<&RecorderError> {
        self.error.as_ref()
    }

    /// Pid of the capture helper. Only present while recording.
    pub fn process_id(&self) -> Option<u32> {
        match &self.phase {
            Phase::Recording(process) => Some(process.id()),
            _ => None,
        }
    }

    /// Outputs offered to the user while waiting for [`Controller::choose_output`](crate::capture::Controller::choose_output).
    pub fn output_choices(&self) -> &[String] {
        match &self.phase {
            Phase::ChoosingOutput(outputs) => outputs,
            _ => &[],
        }
    }
}
