mod command_utils;
mod compositor;
mod controller;
mod destination;
mod recorder;
mod selector;
mod session;

use std::fmt;
use std::str::FromStr;

pub use command_utils::{HelperCommand, Helpers};
pub use compositor::{Compositor, OutputSource, apply_window_rules};
pub use controller::{Controller, SessionConfig};
pub use destination::{
    ID_TOKEN, existing_destination, expand_home, generated_name_template, shrink_home,
};
pub use session::{Session, SessionEvent, SessionState};

#[cfg(test)]
pub(crate) use compositor::{list_outputs, parse_output_names};
#[cfg(test)]
pub(crate) use destination::{resolve_destination, timestamp_id};
#[cfg(test)]
pub(crate) use recorder::build_capture_args;
#[cfg(test)]
pub(crate) use selector::parse_selection;

/// A screen rectangle in compositor layout coordinates, written `x,y WxH`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for Geometry {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("area '{input}' isn't of format 'x,y WxH'");

        let (position, size) = input.trim().split_once(' ').ok_or_else(invalid)?;
        let (x, y) = position.split_once(',').ok_or_else(invalid)?;
        let (width, height) = size.trim().split_once('x').ok_or_else(invalid)?;

        let geometry = Geometry {
            x: x.parse().map_err(|_| invalid())?,
            y: y.parse().map_err(|_| invalid())?,
            width: width.parse().map_err(|_| invalid())?,
            height: height.parse().map_err(|_| invalid())?,
        };

        if geometry.width == 0 || geometry.height == 0 {
            return Err(invalid());
        }

        Ok(geometry)
    }
}

/// What the capture helper is pointed at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Area(Geometry),
    Output(String),
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Area(geometry) => write!(f, "area {geometry}"),
            Selection::Output(name) => write!(f, "output {name}"),
        }
    }
}

/// Result of one run of the region-selection helper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionSelection {
    Area(Geometry),
    Output(String),
    Cancelled,
}

/// How the presenter wants the recorded region to be chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionRequest {
    /// Drag a rectangle with the selection helper.
    Interactive,
    /// Click an output with the selection helper.
    PickOutput,
    /// Enumerate outputs; a sole output is used directly, several are offered.
    WholeOutput,
    /// Already decided by the caller.
    Preselected(Selection),
}

impl RegionRequest {
    pub(crate) fn slug(&self) -> &'static str {
        match self {
            RegionRequest::Interactive => "area",
            RegionRequest::PickOutput => "pick-output",
            RegionRequest::WholeOutput => "whole-output",
            RegionRequest::Preselected(_) => "preselected",
        }
    }
}
