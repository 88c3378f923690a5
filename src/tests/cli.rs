use std::time::Duration;

use crate::capture::{
    Controller, Geometry, HelperCommand, Helpers, RegionRequest, Selection, SessionConfig,
};
use crate::cli::{CliCommand, RecordOptions, capture_options, parse_cli_command};
use crate::config::RecorderConfig;
use crate::tests::{scratch_dir, sh};

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// WHAT: A bare `record` drags an area with configured defaults
/// WHY: The shortest keybinding should do the common thing
#[test]
fn given_bare_record_when_parsing_then_interactive_without_overrides() {
    let command = parse_cli_command(&args(&["record"]));

    assert_eq!(command, Ok(CliCommand::Record(RecordOptions::default())));
}

/// WHAT: Every record option is parsed, flags after `--` are kept verbatim
/// WHY: Scripts drive the recorder entirely from the command line
#[test]
#[allow(clippy::unwrap_used)]
fn given_full_record_line_when_parsing_then_options_set() {
    let command = parse_cli_command(&args(&[
        "record",
        "--geometry",
        "0,0 640x480",
        "--audio",
        "--delay",
        "3",
        "--dest",
        "/tmp/x-{id}.mkv",
        "--",
        "-c",
        "gif",
    ]))
    .unwrap();

    let CliCommand::Record(options) = command else {
        panic!("expected a record command");
    };
    assert_eq!(
        options.region,
        RegionRequest::Preselected(Selection::Area(Geometry {
            x: 0,
            y: 0,
            width: 640,
            height: 480
        }))
    );

    let config = options.apply(RecorderConfig::default());
    assert!(config.include_audio);
    assert_eq!(config.delay, 3);
    assert_eq!(config.file_dest, "/tmp/x-{id}.mkv");
    assert_eq!(config.flags, "-c gif");
}

/// WHAT: Conflicting, unknown or incomplete options are usage errors
/// WHY: A mistyped binding should explain itself instead of recording
#[test]
fn given_bad_record_lines_when_parsing_then_errors() {
    for line in [
        &["record", "--area", "--screen"][..],
        &["record", "--output"],
        &["record", "--delay", "soon"],
        &["record", "--geometry", "wide"],
        &["record", "--loud"],
        &["outputs", "extra"],
        &["screenshot"],
    ] {
        assert!(parse_cli_command(&args(line)).is_err(), "{line:?}");
    }
}

/// WHAT: `help` and `outputs` map to their commands
/// WHY: Both are advertised in the usage text
#[test]
fn given_simple_commands_when_parsing_then_recognized() {
    assert_eq!(parse_cli_command(&args(&["--help"])), Ok(CliCommand::Help));
    assert_eq!(parse_cli_command(&args(&["outputs"])), Ok(CliCommand::Outputs));
    assert_eq!(
        parse_cli_command(&args(&["record", "--output", "DP-1"])),
        Ok(CliCommand::Record(RecordOptions {
            region: RegionRequest::Preselected(Selection::Output("DP-1".to_string())),
            ..RecordOptions::default()
        }))
    );
}

/// WHAT: The recording banner names audio and pass-through flags
/// WHY: The user should see what the capture helper was asked to record
#[test]
#[allow(clippy::unwrap_used)]
fn given_audio_and_flags_when_describing_session_then_both_listed() {
    // Given: A session waiting on the selector with audio and `-c gif`
    let dir = scratch_dir("capture-options");
    let mut controller = Controller::new(Helpers {
        capture: HelperCommand::new("true"),
        selector: sh("sleep 5"),
        outputs: None,
    });
    controller
        .start(SessionConfig {
            destination_template: dir.join("out-{id}.gif").to_string_lossy().into_owned(),
            include_audio: true,
            start_delay: Duration::ZERO,
            extra_flags: vec!["-c".to_string(), "gif".to_string()],
            region: RegionRequest::Interactive,
        })
        .unwrap();

    // When: Describing it
    let described = capture_options(controller.session().unwrap());
    controller.cancel().unwrap();

    // Then: Audio first, flags verbatim
    assert_eq!(described, " with audio, flags: -c gif");
}
