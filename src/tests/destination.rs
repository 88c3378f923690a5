use std::fs;
use std::path::PathBuf;

use crate::capture::{
    existing_destination, expand_home, generated_name_template, resolve_destination,
    shrink_home, timestamp_id,
};
use crate::error::RecorderError;
use crate::tests::scratch_dir;

/// WHAT: `{id}` is substituted in the resolved destination
/// WHY: Each session writes a distinct file
#[test]
#[allow(clippy::unwrap_used)]
fn given_template_with_id_when_resolving_then_id_substituted() {
    // Given: A writable directory
    let dir = scratch_dir("resolve-id");
    let template = format!("{}/clip-{{id}}.mkv", dir.display());

    // When: Resolving
    let path = resolve_destination(&template, "20240102-030405").unwrap();

    // Then: Placeholder replaced, nothing created
    assert_eq!(path, dir.join("clip-20240102-030405.mkv"));
    assert!(!path.exists());
}

/// WHAT: A template whose directory is missing is rejected
/// WHY: The capture helper would fail only after the user recorded
#[test]
fn given_missing_directory_when_resolving_then_destination_unavailable() {
    let dir = scratch_dir("resolve-missing").join("nope");
    let template = format!("{}/clip-{{id}}.mp4", dir.display());

    let result = resolve_destination(&template, "x");

    assert!(matches!(
        result,
        Err(RecorderError::DestinationUnavailable { reason, .. })
            if reason == "the target directory does not exist"
    ));
}

/// WHAT: A template naming an existing directory is rejected
/// WHY: The destination must be a file
#[test]
fn given_directory_template_when_resolving_then_destination_unavailable() {
    let dir = scratch_dir("resolve-dir");

    let result = resolve_destination(&dir.to_string_lossy(), "x");

    assert!(matches!(
        result,
        Err(RecorderError::DestinationUnavailable { .. })
    ));
}

/// WHAT: A leading tilde expands to the home directory and back
/// WHY: Templates are written and shown relative to home
#[test]
#[allow(clippy::unwrap_used)]
fn given_home_relative_path_when_expanding_then_home_is_joined() {
    let home = dirs::home_dir().unwrap();

    assert_eq!(expand_home("~/Videos/a.mp4"), home.join("Videos/a.mp4"));
    assert_eq!(expand_home("/tmp/a.mp4"), PathBuf::from("/tmp/a.mp4"));
    assert_eq!(expand_home("~other/a.mp4"), PathBuf::from("~other/a.mp4"));
    assert_eq!(shrink_home(&home.join("Videos/a.mp4")), "~/Videos/a.mp4");
}

/// WHAT: A generated name keeps the directory and extension of the template
/// WHY: "Random name" must not move recordings or change their container
#[test]
fn given_template_when_generating_name_then_directory_and_extension_kept() {
    assert_eq!(
        generated_name_template("~/Videos/talk.mkv"),
        "~/Videos/cute-{id}.mkv"
    );
    assert_eq!(generated_name_template("/tmp/raw"), "/tmp/cute-{id}.mp4");
    assert_eq!(generated_name_template("clip.webm"), "cute-{id}.webm");
}

/// WHAT: Ids issued within the same second still differ
/// WHY: The id is what keeps one session's file from replacing another's
#[test]
fn given_rapid_calls_when_generating_ids_then_all_distinct() {
    let ids: Vec<String> = (0..5).map(|_| timestamp_id()).collect();

    for (index, id) in ids.iter().enumerate() {
        assert!(!ids[index + 1..].contains(id), "{id} issued twice");
    }
}

/// WHAT: Only a fixed template naming an existing file needs confirmation
/// WHY: Templates with `{id}` never collide, missing files are not at risk
#[test]
#[allow(clippy::unwrap_used)]
fn given_templates_when_checking_for_existing_file_then_only_fixed_existing_reported() {
    // Given: A directory holding one earlier recording
    let dir = scratch_dir("existing");
    let earlier = dir.join("take.mp4");
    fs::write(&earlier, b"old").unwrap();

    // When / Then
    assert_eq!(
        existing_destination(&earlier.to_string_lossy()),
        Some(earlier.clone())
    );
    assert_eq!(
        existing_destination(&format!("{}/take-{{id}}.mp4", dir.display())),
        None
    );
    assert_eq!(
        existing_destination(&dir.join("fresh.mp4").to_string_lossy()),
        None
    );
    assert_eq!(existing_destination(&dir.to_string_lossy()), None);
}
