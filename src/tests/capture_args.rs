use std::ffi::OsString;
use std::path::Path;

use crate::capture::{Geometry, Selection, build_capture_args};

fn strings(args: Vec<OsString>) -> Vec<String> {
    args.into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// WHAT: An output selection without audio or flags produces the minimal argv
/// WHY: wf-recorder must receive exactly the output and the destination
#[test]
fn given_output_without_extras_when_building_args_then_minimal_argv() {
    // Given: Output eDP-1 and a resolved destination
    let selection = Selection::Output("eDP-1".to_string());

    // When: Building the argument list
    let args = build_capture_args(
        Some(&selection),
        Path::new("/tmp/out-abc.mp4"),
        false,
        &[],
    );

    // Then: Only the output and file flags
    assert_eq!(
        strings(args),
        vec!["-o", "eDP-1", "-f", "/tmp/out-abc.mp4"]
    );
}

/// WHAT: Audio and extra flags are appended after the built-in flags
/// WHY: User flags come last so they can override built-in ones
#[test]
fn given_audio_and_flags_when_building_args_then_flags_come_last() {
    // Given: An area, audio on and user flags
    let selection = Selection::Area(Geometry {
        x: 10,
        y: 20,
        width: 300,
        height: 200,
    });
    let flags: Vec<String> = ["-c", "gif", "-r", "10"].map(String::from).to_vec();

    // When: Building the argument list
    let args = strings(build_capture_args(
        Some(&selection),
        Path::new("/tmp/clip.gif"),
        true,
        &flags,
    ));

    // Then: Geometry in slurp format, audio present, flags at the end
    assert_eq!(&args[..2], ["-g", "10,20 300x200"]);
    assert!(args.contains(&"--audio".to_string()));
    assert_eq!(&args[args.len() - 4..], ["-c", "gif", "-r", "10"]);
}

/// WHAT: Without a selection no region flag is passed
/// WHY: wf-recorder then records its default output
#[test]
fn given_no_selection_when_building_args_then_no_region_flag() {
    let args = strings(build_capture_args(
        None,
        Path::new("/tmp/out.mp4"),
        false,
        &[],
    ));

    assert_eq!(args, vec!["-f", "/tmp/out.mp4"]);
}
