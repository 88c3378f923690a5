use std::time::Duration;

use crate::capture::{HelperCommand, RegionRequest};
use crate::config::{DEFAULT_FILE_DEST, RecorderConfig, split_flags, validate_file_dest};
use crate::tests::scratch_dir;

/// WHAT: An empty file yields the built-in defaults
/// WHY: A fresh install has nothing configured
#[test]
#[allow(clippy::unwrap_used)]
fn given_empty_file_when_parsing_then_defaults() {
    let config = RecorderConfig::parse("").unwrap();

    assert_eq!(config, RecorderConfig::default());
    assert_eq!(config.file_dest, DEFAULT_FILE_DEST);
}

/// WHAT: Valid fields override the defaults
/// WHY: Users keep their preferred destination, audio and flags
#[test]
#[allow(clippy::unwrap_used)]
fn given_valid_fields_when_parsing_then_overrides_applied() {
    // Given: A config naming a writable directory
    let dir = scratch_dir("config-valid");
    let contents = format!(
        "file_dest = \"{}/rec-{{id}}.mkv\"\ninclude_audio = true\ndelay = 3\nflags = \"-c gif -r 10\"\n",
        dir.display()
    );

    // When: Parsing
    let config = RecorderConfig::parse(&contents).unwrap();

    // Then: Every field taken from the file
    assert_eq!(config.file_dest, format!("{}/rec-{{id}}.mkv", dir.display()));
    assert!(config.include_audio);
    assert_eq!(config.delay, 3);
    assert_eq!(config.flags, "-c gif -r 10");
}

/// WHAT: An invalid field keeps its default while valid ones apply
/// WHY: One typo must not discard the whole configuration
#[test]
#[allow(clippy::unwrap_used)]
fn given_invalid_fields_when_parsing_then_only_those_fall_back() {
    let config = RecorderConfig::parse(
        "delay = -1\ninclude_audio = \"yes\"\nfile_dest = \"/\"\nflags = \"--no-damage\"\n",
    )
    .unwrap();

    assert_eq!(config.delay, 0);
    assert!(!config.include_audio);
    assert_eq!(config.file_dest, DEFAULT_FILE_DEST);
    assert_eq!(config.flags, "--no-damage");
}

/// WHAT: A file that is not TOML is an error for the caller to report
/// WHY: `load` turns it into a warning and defaults
#[test]
fn given_garbage_when_parsing_then_error() {
    assert!(RecorderConfig::parse("file_dest = [unterminated").is_err());
}

/// WHAT: A destination must name a file in an existing directory
/// WHY: Mirrors what is checked again when a session starts
#[test]
fn given_destinations_when_validating_then_bad_ones_rejected() {
    let dir = scratch_dir("config-validate");

    assert!(validate_file_dest(&format!("{}/a-{{id}}.mp4", dir.display())).is_ok());
    assert!(validate_file_dest(&format!("{}/", dir.display())).is_err());
    assert!(validate_file_dest(&dir.to_string_lossy()).is_err());
    assert!(validate_file_dest(&format!("{}/missing/a.mp4", dir.display())).is_err());
}

/// WHAT: Configured helper command lines replace the default helpers
/// WHY: Users may wrap or relocate wf-recorder and slurp
#[test]
#[allow(clippy::unwrap_used)]
fn given_helpers_table_when_building_helpers_then_commands_parsed() {
    let config = RecorderConfig::parse(
        "[helpers]\ncapture = \"/opt/wf-recorder --log\"\noutputs = \"list-outputs --names\"\n",
    )
    .unwrap();

    let helpers = config.helpers();

    assert_eq!(
        helpers.capture,
        HelperCommand::new("/opt/wf-recorder").with_args(["--log"])
    );
    assert_eq!(helpers.selector, HelperCommand::new("slurp"));
    assert_eq!(
        helpers.outputs,
        Some(HelperCommand::new("list-outputs").with_args(["--names"]))
    );
}

/// WHAT: The session snapshot converts delay and splits flags
/// WHY: The controller works with durations and argument vectors
#[test]
fn given_config_when_building_session_config_then_values_converted() {
    let config = RecorderConfig {
        delay: 2,
        flags: "  -c gif   -r 10 ".to_string(),
        ..RecorderConfig::default()
    };

    let session = config.session_config(RegionRequest::PickOutput);

    assert_eq!(session.start_delay, Duration::from_secs(2));
    assert_eq!(session.extra_flags, vec!["-c", "gif", "-r", "10"]);
    assert_eq!(session.region, RegionRequest::PickOutput);
    assert!(split_flags("   ").is_empty());
}
