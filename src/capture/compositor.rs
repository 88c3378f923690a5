use std::env;
use std::io;
use std::process::Command;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::capture::command_utils::{HelperCommand, run_command};

/// Wayland compositors we know how to query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compositor {
    Sway,
    Hyprland,
    Niri,
    /// Any wlroots compositor reachable through `wlr-randr`.
    WlrRandr,
}

impl Compositor {
    pub fn detect() -> Self {
        if env::var_os("SWAYSOCK").is_some() {
            Compositor::Sway
        } else if env::var_os("HYPRLAND_INSTANCE_SIGNATURE").is_some() {
            Compositor::Hyprland
        } else if env::var_os("NIRI_SOCKET").is_some() {
            Compositor::Niri
        } else {
            Compositor::WlrRandr
        }
    }

    fn outputs_command(self) -> HelperCommand {
        match self {
            Compositor::Sway => HelperCommand::new("swaymsg").with_args(["-t", "get_outputs"]),
            Compositor::Hyprland => HelperCommand::new("hyprctl").with_args(["-j", "monitors"]),
            Compositor::Niri => HelperCommand::new("niri").with_args(["msg", "--json", "outputs"]),
            Compositor::WlrRandr => HelperCommand::new("wlr-randr").with_args(["--json"]),
        }
    }
}

/// Where the list of outputs comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputSource {
    Compositor(Compositor),
    /// A command printing one output name per line.
    Lines(HelperCommand),
}

impl OutputSource {
    pub fn detect(custom: Option<&HelperCommand>) -> Self {
        match custom {
            Some(command) => OutputSource::Lines(command.clone()),
            None => OutputSource::Compositor(Compositor::detect()),
        }
    }

    fn command(&self) -> HelperCommand {
        match self {
            OutputSource::Compositor(compositor) => compositor.outputs_command(),
            OutputSource::Lines(command) => command.clone(),
        }
    }
}

/// Runs the enumeration helper and returns output names in the order reported.
///
/// A missing or failing helper yields an empty list rather than an error.
pub fn list_outputs(source: &OutputSource) -> Vec<String> {
    let helper = source.command();
    let output = match helper.command().output() {
        Ok(output) => output,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(program = helper.program(), "output helper not installed");
            return Vec::new();
        }
        Err(err) => {
            warn!(program = helper.program(), error = %err, "failed to run output helper");
            return Vec::new();
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(
            program = helper.program(),
            status = %output.status,
            stderr = %stderr.trim(),
            "output helper failed"
        );
        return Vec::new();
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let names = parse_output_names(source, &stdout);
    debug!(program = helper.program(), ?names, "enumerated outputs");
    names
}

pub(crate) fn parse_output_names(source: &OutputSource, stdout: &str) -> Vec<String> {
    match source {
        OutputSource::Lines(_) => parse_lines(stdout),
        OutputSource::Compositor(_) => match serde_json::from_str::<Value>(stdout.trim()) {
            Ok(value) => parse_json_names(&value),
            Err(err) => {
                debug!(error = %err, "output list is not JSON, reading it line by line");
                parse_lines(stdout)
            }
        },
    }
}

fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_json_names(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        // niri reports an object keyed by output name
        Value::Object(map) => map
            .iter()
            .map(|(key, item)| {
                item.get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(key.as_str())
                    .to_string()
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Asks the compositor to float our window, as a small utility window should.
pub fn apply_window_rules(compositor: Compositor, app_id: &str) -> Result<()> {
    match compositor {
        Compositor::Sway => {
            let mut command = Command::new("swaymsg");
            command.arg(format!("for_window [app_id=\"{app_id}\"] floating enable"));
            run_command(command, "failed to apply sway window rule")?;
        }
        Compositor::Hyprland => {
            let mut command = Command::new("hyprctl");
            command.args([
                "keyword",
                "windowrulev2",
                &format!("float,class:^({app_id})$"),
            ]);
            run_command(command, "failed to apply Hyprland window rule")?;
        }
        Compositor::Niri | Compositor::WlrRandr => return Ok(()),
    }

    info!(?compositor, app_id, "applied floating window rule");
    Ok(())
}
