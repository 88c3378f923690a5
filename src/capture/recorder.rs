use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, ChildStderr, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use crate::capture::Selection;
use crate::capture::command_utils::HelperCommand;
use crate::error::{RecorderError, Result};

const STDERR_TAIL_LINES: usize = 20;
const STDERR_DRAIN_WAIT: Duration = Duration::from_millis(250);

/// Argument list for the capture helper.
///
/// Built-in flags come first so the user's extra flags, appended verbatim at
/// the end, can override them.
pub fn build_capture_args(
    selection: Option<&Selection>,
    destination: &Path,
    include_audio: bool,
    extra_flags: &[String],
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();

    match selection {
        Some(Selection::Output(name)) => {
            args.push("-o".into());
            args.push(name.into());
        }
        Some(Selection::Area(geometry)) => {
            args.push("-g".into());
            args.push(geometry.to_string().into());
        }
        None => {}
    }

    args.push("-f".into());
    args.push(destination.into());

    if include_audio {
        args.push("--audio".into());
    }

    args.extend(extra_flags.iter().map(OsString::from));
    args
}

/// A running capture helper in its own process group.
pub(crate) struct CaptureProcess {
    child: Child,
    program: String,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
    stderr_reader: Option<JoinHandle<()>>,
    reaped: bool,
}

impl CaptureProcess {
    pub(crate) fn spawn(helper: &HelperCommand, args: &[OsString]) -> Result<Self> {
        let mut command = helper.command();
        command
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .process_group(0);

        debug!(program = helper.program(), ?args, "spawning capture helper");
        let mut child = command.spawn().map_err(|err| helper.spawn_error(err))?;
        info!(program = helper.program(), pid = child.id(), "capture helper started");

        let stderr_tail = Arc::new(Mutex::new(VecDeque::new()));
        let stderr_reader = child
            .stderr
            .take()
            .map(|stderr| spawn_stderr_reader(stderr, stderr_tail.clone()));

        Ok(Self {
            child,
            program: helper.program().to_string(),
            stderr_tail,
            stderr_reader,
            reaped: false,
        })
    }

    pub(crate) fn id(&self) -> u32 {
        self.child.id()
    }

    pub(crate) fn program(&self) -> &str {
        &self.program
    }

    /// Sends SIGINT to the whole group so the helper can finalize its container.
    pub(crate) fn interrupt(&self) -> Result<()> {
        self.signal_group(Signal::SIGINT)
    }

    /// SIGKILL to the group, then reap.
    pub(crate) fn kill(&mut self) -> Option<ExitStatus> {
        if let Err(err) = self.signal_group(Signal::SIGKILL) {
            warn!(program = %self.program, error = %err, "failed to kill capture helper group");
            let _ = self.child.kill();
        }

        match self.child.wait() {
            Ok(status) => {
                self.reaped = true;
                Some(status)
            }
            Err(err) => {
                warn!(program = %self.program, error = %err, "failed to reap capture helper");
                None
            }
        }
    }

    /// Non-blocking check for exit; reaps the helper when it has exited.
    pub(crate) fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.reaped = true;
                Ok(Some(status))
            }
            Ok(None) => Ok(None),
            Err(err) => Err(RecorderError::Spawn {
                program: self.program.clone(),
                reason: format!("lost track of the capture helper: {err}"),
            }),
        }
    }

    /// Last lines the helper wrote to stderr, waiting briefly for the reader to drain.
    pub(crate) fn stderr_tail(&mut self) -> String {
        if let Some(reader) = self.stderr_reader.take() {
            let deadline = Instant::now() + STDERR_DRAIN_WAIT;
            while !reader.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if reader.is_finished() {
                let _ = reader.join();
            }
        }

        match self.stderr_tail.lock() {
            Ok(lines) => lines.iter().cloned().collect::<Vec<_>>().join("\n"),
            Err(_) => String::new(),
        }
    }

    /// Converts an exit status into the outcome of a requested stop.
    pub(crate) fn exit_error(&mut self, status: ExitStatus) -> Option<RecorderError> {
        if status.success() {
            return None;
        }

        Some(RecorderError::HelperExit {
            program: self.program.clone(),
            code: status.code(),
            stderr: self.stderr_tail(),
        })
    }

    fn signal_group(&self, signal: Signal) -> Result<()> {
        let group = Pid::from_raw(self.child.id() as i32);
        match killpg(group, signal) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Ok(()),
            Err(err) => Err(RecorderError::Signal {
                program: self.program.clone(),
                reason: format!("{signal}: {err}"),
            }),
        }
    }
}

impl Drop for CaptureProcess {
    fn drop(&mut self) {
        if !self.reaped {
            warn!(program = %self.program, pid = self.child.id(), "capture helper dropped while running");
            self.kill();
        }
    }
}

fn spawn_stderr_reader(
    stderr: ChildStderr,
    tail: Arc<Mutex<VecDeque<String>>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(stderr);
        for line in reader.lines() {
            let Ok(line) = line else {
                break;
            };
            // wf-recorder redraws its progress line with carriage returns
            let line = line.rsplit('\r').next().unwrap_or_default().trim().to_string();
            if line.is_empty() {
                continue;
            }
            debug!(target: "cute_recorder::helper", "{line}");

            let Ok(mut lines) = tail.lock() else {
                break;
            };
            if lines.len() == STDERR_TAIL_LINES {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    })
}
