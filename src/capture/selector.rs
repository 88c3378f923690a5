use std::io::Read;
use std::process::{Child, Stdio};

use tracing::{debug, warn};

use crate::capture::command_utils::HelperCommand;
use crate::capture::{Geometry, RegionRequest, RegionSelection};
use crate::error::{RecorderError, Result};

/// A running region-selection helper.
pub(crate) struct SelectorProcess {
    child: Child,
    program: String,
    reaped: bool,
}

impl SelectorProcess {
    pub(crate) fn spawn(helper: &HelperCommand, request: &RegionRequest) -> Result<Self> {
        let mut command = helper.command();
        if *request == RegionRequest::PickOutput {
            command.args(["-o", "-f", "%o"]);
        }
        command.stdout(Stdio::piped()).stderr(Stdio::piped());

        let child = command.spawn().map_err(|err| helper.spawn_error(err))?;
        debug!(program = helper.program(), pid = child.id(), "selector started");

        Ok(Self {
            child,
            program: helper.program().to_string(),
            reaped: false,
        })
    }

    /// Non-blocking: `None` while the user is still selecting.
    pub(crate) fn try_finish(&mut self) -> Option<Result<RegionSelection>> {
        let status = match self.child.try_wait() {
            Ok(Some(status)) => {
                self.reaped = true;
                status
            }
            Ok(None) => return None,
            Err(err) => {
                return Some(Err(RecorderError::Spawn {
                    program: self.program.clone(),
                    reason: format!("lost track of the selector: {err}"),
                }));
            }
        };

        let stdout = read_all(self.child.stdout.take());
        let stderr = read_all(self.child.stderr.take());

        if status.success() {
            return Some(Ok(parse_selection(&stdout)));
        }

        // slurp exits non-zero with "selection cancelled" when the user presses Escape
        if stdout.trim().is_empty() && stderr.to_lowercase().contains("cancel") {
            return Some(Ok(RegionSelection::Cancelled));
        }

        Some(Err(RecorderError::HelperExit {
            program: self.program.clone(),
            code: status.code(),
            stderr: stderr.trim().to_string(),
        }))
    }

    /// Forcibly ends the helper and reaps it.
    pub(crate) fn kill(mut self) {
        self.terminate();
    }

    fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(err) = self.child.kill() {
            debug!(program = %self.program, error = %err, "selector already gone");
        }
        match self.child.wait() {
            Ok(status) => debug!(program = %self.program, %status, "selector reaped"),
            Err(err) => warn!(program = %self.program, error = %err, "failed to reap selector"),
        }
        self.reaped = true;
    }
}

impl Drop for SelectorProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn read_all(stream: Option<impl Read>) -> String {
    let mut text = String::new();
    if let Some(mut stream) = stream {
        let mut bytes = Vec::new();
        if stream.read_to_end(&mut bytes).is_ok() {
            text = String::from_utf8_lossy(&bytes).into_owned();
        }
    }
    text
}

/// Interprets selector output: nothing, an `x,y WxH` rectangle or an output name.
pub(crate) fn parse_selection(stdout: &str) -> RegionSelection {
    let line = stdout.lines().map(str::trim).find(|line| !line.is_empty());
    let Some(line) = line else {
        return RegionSelection::Cancelled;
    };

    match line.parse::<Geometry>() {
        Ok(geometry) => RegionSelection::Area(geometry),
        Err(_) => RegionSelection::Output(line.to_string()),
    }
}
