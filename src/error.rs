use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::capture::SessionState;

/// Failures surfaced by the recording controller.
///
/// Every variant owns plain data so the error can travel inside a
/// [`SessionEvent`](crate::capture::SessionEvent) to any number of subscribers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecorderError {
    /// A required helper executable is not on the search path.
    #[error("`{program}` not found in PATH, please install it")]
    HelperNotFound { program: String },

    /// An operation was requested in a state that forbids it.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// An output was chosen that the enumeration never offered.
    #[error("output `{name}` was not offered, choose one of: {}", .offered.join(", "))]
    UnknownOutput { name: String, offered: Vec<String> },

    /// The recording destination cannot be written.
    #[error("cannot write to {}: {reason}", .path.display())]
    DestinationUnavailable { path: PathBuf, reason: String },

    /// A helper exited with a non-zero status or was killed by a signal.
    #[error("`{program}` exited {}{}", describe_code(.code), describe_stderr(.stderr))]
    HelperExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The capture helper ignored the graceful stop request.
    #[error("`{program}` did not stop within {}s and was killed", .waited.as_secs())]
    Unresponsive { program: String, waited: Duration },

    /// Spawning a helper failed for a reason other than a missing executable.
    #[error("failed to start `{program}`: {reason}")]
    Spawn { program: String, reason: String },

    /// Delivering a signal to a helper failed.
    #[error("failed to signal `{program}`: {reason}")]
    Signal { program: String, reason: String },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("with code {code}"),
        None => "after being terminated by a signal".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

pub type Result<T> = std::result::Result<T, RecorderError>;
