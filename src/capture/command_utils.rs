use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

use crate::error::RecorderError;

/// An external program plus the arguments that always precede the ones we add.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelperCommand {
    program: String,
    args: Vec<String>,
}

impl HelperCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Splits a configured command line on whitespace. Returns `None` for blank input.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).with_args(parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// A fresh `Command` with stdin detached, ready for more arguments.
    pub(crate) fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command.stdin(Stdio::null());
        command
    }

    pub(crate) fn spawn_error(&self, err: io::Error) -> RecorderError {
        if err.kind() == io::ErrorKind::NotFound {
            return RecorderError::HelperNotFound {
                program: self.program.clone(),
            };
        }

        RecorderError::Spawn {
            program: self.program.clone(),
            reason: err.to_string(),
        }
    }
}

/// The external programs a recording session drives.
#[derive(Clone, Debug)]
pub struct Helpers {
    pub capture: HelperCommand,
    pub selector: HelperCommand,
    /// Custom output lister printing one name per line; compositor IPC otherwise.
    pub outputs: Option<HelperCommand>,
}

impl Default for Helpers {
    fn default() -> Self {
        Self {
            capture: HelperCommand::new("wf-recorder"),
            selector: HelperCommand::new("slurp"),
            outputs: None,
        }
    }
}

impl Helpers {
    /// Names of required helpers that cannot be found on the search path.
    pub fn missing(&self) -> Vec<String> {
        [&self.capture, &self.selector]
            .into_iter()
            .filter(|helper| find_in_path(helper.program()).is_none())
            .map(|helper| helper.program().to_string())
            .collect()
    }
}

fn find_in_path(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let path = Path::new(program);
        return path.is_file().then(|| path.to_path_buf());
    }

    let search_path = env::var_os("PATH")?;
    env::split_paths(&search_path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

pub(crate) fn run_command(mut command: Command, context_message: &str) -> Result<()> {
    let output = command
        .output()
        .with_context(|| format!("{context_message}: could not start command"))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        bail!("{context_message}: exit status {}", output.status);
    }

    bail!("{context_message}: {stderr}");
}
