use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::warn;

use crate::capture::{
    Controller, Geometry, RegionRequest, Selection, Session, SessionEvent, SessionState,
    existing_destination, shrink_home,
};
use crate::config::RecorderConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn handle_cli_if_requested() -> Result<(), i32> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        return Ok(());
    }

    let result = match parse_cli_command(&args) {
        Ok(command) => run_cli_command(command),
        Err(message) => {
            eprintln!("{message}\n\n{}", cli_usage());
            Err(2)
        }
    };

    match result {
        Ok(()) => Err(0),
        Err(code) => Err(code),
    }
}

fn run_cli_command(command: CliCommand) -> Result<(), i32> {
    match command {
        CliCommand::Outputs => {
            let config = RecorderConfig::load();
            let outputs = Controller::new(config.helpers()).list_outputs();
            if outputs.is_empty() {
                eprintln!("no outputs found");
                return Err(1);
            }
            for output in outputs {
                println!("{output}");
            }
            Ok(())
        }
        CliCommand::Record(options) => run_record(options).map_err(|err| {
            eprintln!("recording failed: {err:#}");
            1
        }),
        CliCommand::Help => {
            println!("{}", cli_usage());
            Ok(())
        }
    }
}

fn run_record(options: RecordOptions) -> Result<()> {
    let config = options.apply(RecorderConfig::load());

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
            .context("failed to install the Ctrl-C handler")?;
    }

    if let Some(existing) = existing_destination(&config.file_dest) {
        warn!(path = %existing.display(), "the recording will replace an existing file");
    }

    let mut controller = Controller::new(config.helpers());
    let events = controller.subscribe();
    controller.start(config.session_config(options.region))?;

    loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            let request = match controller.state() {
                SessionState::Recording => controller.stop(),
                SessionState::SelectingRegion | SessionState::Starting => controller.cancel(),
                _ => Ok(()),
            };
            if let Err(err) = request {
                warn!(error = %err, "interrupt ignored");
            }
        }

        let state = controller.poll();

        while let Ok(event) = events.try_recv() {
            if let SessionEvent::SelectingRegion { outputs } = &event
                && !outputs.is_empty()
            {
                controller.cancel()?;
                bail!(
                    "several outputs are connected, pick one with --output:\n  {}",
                    outputs.join("\n  ")
                );
            }
            report_event(&event, controller.session());
        }

        match state {
            SessionState::Idle | SessionState::Finished => return Ok(()),
            SessionState::Failed => {
                let error = controller
                    .session()
                    .and_then(|session| session.error())
                    .cloned()
                    .ok_or_else(|| anyhow!("session failed"))?;
                return Err(error.into());
            }
            _ => thread::sleep(POLL_INTERVAL),
        }
    }
}

fn report_event(event: &SessionEvent, session: Option<&Session>) {
    match event {
        SessionEvent::Idle { cancelled: true } => println!("Recording cancelled"),
        SessionEvent::SelectingRegion { .. } => println!("Select a region…"),
        SessionEvent::Starting {
            destination, delay, ..
        } if !delay.is_zero() => {
            println!(
                "Recording {} in {}s",
                shrink_home(destination),
                delay.as_secs()
            );
        }
        SessionEvent::Recording { destination, pid } => {
            println!(
                "Recording to {}{} (pid {pid}), press Ctrl-C to stop",
                shrink_home(destination),
                session.map(capture_options).unwrap_or_default()
            );
        }
        SessionEvent::Stopping => println!("Finishing the file…"),
        SessionEvent::Finished { destination } => {
            println!("Saved to {}", shrink_home(destination));
        }
        _ => {}
    }
}

/// ` with audio, flags: -c gif` style suffix describing what is being captured.
pub(crate) fn capture_options(session: &Session) -> String {
    let mut parts = Vec::new();
    if session.include_audio() {
        parts.push("audio".to_string());
    }
    if !session.extra_flags().is_empty() {
        parts.push(format!("flags: {}", session.extra_flags().join(" ")));
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!(" with {}", parts.join(", "))
    }
}

pub(crate) fn parse_cli_command(args: &[String]) -> Result<CliCommand, String> {
    if args[0] == "help" || args[0] == "--help" || args[0] == "-h" {
        return Ok(CliCommand::Help);
    }

    if args[0] == "outputs" {
        if args.len() != 1 {
            return Err("outputs takes no arguments".to_string());
        }
        return Ok(CliCommand::Outputs);
    }

    if args[0] == "record" {
        return parse_record_options(&args[1..]).map(CliCommand::Record);
    }

    Err(format!("unknown command: {}", args[0]))
}

fn parse_record_options(args: &[String]) -> Result<RecordOptions, String> {
    let mut options = RecordOptions::default();
    let mut region_given = false;
    let mut set_region = |options: &mut RecordOptions, region: RegionRequest| {
        if region_given {
            return Err("only one of --area, --pick-output, --screen, --output and --geometry may be given".to_string());
        }
        region_given = true;
        options.region = region;
        Ok(())
    };

    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--area" => set_region(&mut options, RegionRequest::Interactive)?,
            "--pick-output" => set_region(&mut options, RegionRequest::PickOutput)?,
            "--screen" => set_region(&mut options, RegionRequest::WholeOutput)?,
            "--output" => {
                let name = value_of(&mut args, "--output")?;
                let region = RegionRequest::Preselected(Selection::Output(name.to_string()));
                set_region(&mut options, region)?;
            }
            "--geometry" => {
                let geometry = value_of(&mut args, "--geometry")?.parse::<Geometry>()?;
                let region = RegionRequest::Preselected(Selection::Area(geometry));
                set_region(&mut options, region)?;
            }
            "--audio" => options.include_audio = Some(true),
            "--delay" => {
                let delay = value_of(&mut args, "--delay")?;
                let delay = delay
                    .parse::<u32>()
                    .map_err(|_| format!("--delay expects whole seconds, got '{delay}'"))?;
                options.delay = Some(delay);
            }
            "--dest" => options.destination = Some(value_of(&mut args, "--dest")?.to_string()),
            "--" => {
                options.flags = Some(args.by_ref().cloned().collect::<Vec<_>>().join(" "));
                break;
            }
            other => return Err(format!("unknown record option: {other}")),
        }
    }

    Ok(options)
}

fn value_of<'a>(
    args: &mut impl Iterator<Item = &'a String>,
    option: &str,
) -> Result<&'a str, String> {
    args.next()
        .map(String::as_str)
        .ok_or_else(|| format!("{option} needs a value"))
}

fn cli_usage() -> &'static str {
    "Cute Recorder

Usage:
  cute-recorder                     open the recorder window
  cute-recorder outputs             list connected outputs
  cute-recorder record [REGION] [--audio] [--delay SECONDS] [--dest TEMPLATE] [-- FLAGS...]
  cute-recorder help

Regions:
  --area              drag a rectangle (default)
  --pick-output       click the output to record
  --screen            record the only connected output
  --output NAME       record the named output
  --geometry 'X,Y WxH'

TEMPLATE may contain {id}, replaced by the session timestamp.
FLAGS are passed to wf-recorder after the built-in ones.
Press Ctrl-C to stop a recording.

sway binding example:
  bindsym $mod+Shift+r exec cute-recorder record --area --audio"
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CliCommand {
    Outputs,
    Record(RecordOptions),
    Help,
}

/// Command-line overrides applied on top of the configured defaults.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RecordOptions {
    pub(crate) region: RegionRequest,
    pub(crate) include_audio: Option<bool>,
    pub(crate) delay: Option<u32>,
    pub(crate) destination: Option<String>,
    pub(crate) flags: Option<String>,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            region: RegionRequest::Interactive,
            include_audio: None,
            delay: None,
            destination: None,
            flags: None,
        }
    }
}

impl RecordOptions {
    pub(crate) fn apply(&self, mut config: RecorderConfig) -> RecorderConfig {
        if let Some(include_audio) = self.include_audio {
            config.include_audio = include_audio;
        }
        if let Some(delay) = self.delay {
            config.delay = delay;
        }
        if let Some(destination) = &self.destination {
            config.file_dest = destination.clone();
        }
        if let Some(flags) = &self.flags {
            config.flags = flags.clone();
        }
        config
    }
}
