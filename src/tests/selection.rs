use crate::capture::{Geometry, RegionSelection, parse_selection};

/// WHAT: slurp's `x,y WxH` format parses into a geometry
/// WHY: This is the only format the area selector prints
#[test]
#[allow(clippy::unwrap_used)]
fn given_slurp_geometry_when_parsing_then_fields_match() {
    let geometry: Geometry = "-1920,0 1920x1080".parse().unwrap();

    assert_eq!(
        geometry,
        Geometry {
            x: -1920,
            y: 0,
            width: 1920,
            height: 1080
        }
    );
    assert_eq!(geometry.to_string(), "-1920,0 1920x1080");
}

/// WHAT: Malformed or empty rectangles are rejected
/// WHY: A zero-sized capture is never what the user wanted
#[test]
fn given_bad_geometry_when_parsing_then_error() {
    for input in ["", "10,20", "10,20 0x100", "a,b 1x1", "10 20 30 40"] {
        assert!(input.parse::<Geometry>().is_err(), "{input:?} should not parse");
    }
}

/// WHAT: Empty selector output means the user cancelled
/// WHY: Cancellation must never surface as a failure
#[test]
fn given_empty_output_when_parsing_selection_then_cancelled() {
    assert_eq!(parse_selection(""), RegionSelection::Cancelled);
    assert_eq!(parse_selection("  \n\n"), RegionSelection::Cancelled);
}

/// WHAT: A geometry line is an area, any other token an output name
/// WHY: The same selector reports both areas and outputs
#[test]
fn given_selector_line_when_parsing_selection_then_area_or_output() {
    assert_eq!(
        parse_selection("0,0 800x600\n"),
        RegionSelection::Area(Geometry {
            x: 0,
            y: 0,
            width: 800,
            height: 600
        })
    );
    assert_eq!(
        parse_selection("\nHDMI-A-1\n"),
        RegionSelection::Output("HDMI-A-1".to_string())
    );
}
