use crate::capture::{
    Compositor, HelperCommand, Helpers, OutputSource, list_outputs, parse_output_names,
};
use crate::tests::sh;

/// WHAT: Array-shaped compositor JSON yields names in order
/// WHY: sway, Hyprland and wlr-randr all report `[{"name": ...}]`
#[test]
fn given_json_array_when_parsing_outputs_then_names_in_order() {
    let stdout = r#"[{"name":"eDP-1","active":true},{"name":"DP-2"},{"id":3}]"#;

    let names = parse_output_names(&OutputSource::Compositor(Compositor::Sway), stdout);

    assert_eq!(names, vec!["eDP-1", "DP-2"]);
}

/// WHAT: niri's object keyed by output name yields those names
/// WHY: niri does not report an array
#[test]
fn given_json_object_when_parsing_outputs_then_keys_used() {
    let stdout = r#"{"HDMI-A-1":{"name":"HDMI-A-1","make":"Dell"}}"#;

    let names = parse_output_names(&OutputSource::Compositor(Compositor::Niri), stdout);

    assert_eq!(names, vec!["HDMI-A-1"]);
}

/// WHAT: Custom listers and non-JSON output are read line by line
/// WHY: A user-supplied command prints one name per line
#[test]
fn given_plain_lines_when_parsing_outputs_then_blank_lines_skipped() {
    let lines = OutputSource::Lines(HelperCommand::new("list"));

    assert_eq!(
        parse_output_names(&lines, "DP-1\n\n  HDMI-A-1  \n"),
        vec!["DP-1", "HDMI-A-1"]
    );
    assert_eq!(
        parse_output_names(&OutputSource::Compositor(Compositor::WlrRandr), "eDP-1\n"),
        vec!["eDP-1"]
    );
}

/// WHAT: A missing or failing enumeration helper yields no outputs
/// WHY: Whole-output recording then lets the capture helper pick
#[test]
fn given_broken_helper_when_listing_outputs_then_empty() {
    let missing = OutputSource::Lines(HelperCommand::new("cute-recorder-no-such-lister"));
    let failing = OutputSource::Lines(sh("echo DP-1; exit 1"));

    assert!(list_outputs(&missing).is_empty());
    assert!(list_outputs(&failing).is_empty());
}

/// WHAT: Helper command lines split on whitespace
/// WHY: Config values name a program plus fixed arguments
#[test]
fn given_command_line_when_parsing_helper_then_program_and_args() {
    assert_eq!(
        HelperCommand::parse("  slurp -d  "),
        Some(HelperCommand::new("slurp").with_args(["-d"]))
    );
    assert_eq!(HelperCommand::parse("   "), None);
}

/// WHAT: Only helpers absent from the search path are reported missing
/// WHY: The window names exactly what the user has to install
#[test]
fn given_one_absent_helper_when_checking_then_only_it_is_missing() {
    let helpers = Helpers {
        capture: HelperCommand::new("sh"),
        selector: HelperCommand::new("cute-recorder-no-such-selector"),
        outputs: None,
    };

    assert_eq!(helpers.missing(), vec!["cute-recorder-no-such-selector"]);
}
