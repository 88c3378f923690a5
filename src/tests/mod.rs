mod capture_args;
mod cli;
mod config;
mod destination;
mod outputs;
mod selection;

use std::fs;
use std::path::PathBuf;

use crate::capture::HelperCommand;

/// A helper substitute running `script` under `sh -c`; extra arguments become `$@`.
pub(crate) fn sh(script: &str) -> HelperCommand {
    HelperCommand::new("sh").with_args(["-c", script, "sh"])
}

/// A fresh, writable directory private to one test.
#[allow(clippy::unwrap_used)]
pub(crate) fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cute-recorder-test-{}-{name}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}
