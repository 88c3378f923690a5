//! User defaults read from `~/.config/cute-recorder/defaults.toml`.
//!
//! Every field is validated on its own: a bad value logs a warning and keeps
//! its default so one typo never prevents the recorder from opening.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::capture::{
    HelperCommand, Helpers, ID_TOKEN, RegionRequest, SessionConfig, expand_home,
};

pub const DEFAULT_FILE_DEST: &str = "~/Videos/cute-{id}.mp4";
const CONFIG_DIR: &str = "cute-recorder";
const CONFIG_FILE: &str = "defaults.toml";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Destination template containing the `{id}` placeholder.
    pub file_dest: String,
    pub include_audio: bool,
    /// Seconds to wait before the capture helper is launched.
    pub delay: u32,
    /// Extra capture flags, split on whitespace when a session starts.
    pub flags: String,
    pub helpers: HelpersConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HelpersConfig {
    pub capture: Option<String>,
    pub selector: Option<String>,
    pub outputs: Option<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            file_dest: DEFAULT_FILE_DEST.to_string(),
            include_audio: false,
            delay: 0,
            flags: String::new(),
            helpers: HelpersConfig::default(),
        }
    }
}

impl RecorderConfig {
    /// Loads the user's defaults, falling back to built-in ones on any problem.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            warn!("no configuration directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                info!(path = %path.display(), "configuration loaded");
                config
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "ignoring configuration file");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(contents)?;
        let mut config = Self::default();

        if let Some(file_dest) = field::<String>(&table, "file_dest") {
            match validate_file_dest(&file_dest) {
                Ok(()) => config.file_dest = file_dest,
                Err(reason) => warn!(field = "file_dest", value = %file_dest, "{reason}"),
            }
        }
        if let Some(include_audio) = field::<bool>(&table, "include_audio") {
            config.include_audio = include_audio;
        }
        if let Some(delay) = field::<u32>(&table, "delay") {
            config.delay = delay;
        }
        if let Some(flags) = field::<String>(&table, "flags") {
            config.flags = flags;
        }
        if let Some(helpers) = field::<HelpersConfig>(&table, "helpers") {
            config.helpers = helpers;
        }

        Ok(config)
    }

    pub fn helpers(&self) -> Helpers {
        let defaults = Helpers::default();
        let parse = |configured: &Option<String>| {
            configured.as_deref().and_then(HelperCommand::parse)
        };

        Helpers {
            capture: parse(&self.helpers.capture).unwrap_or(defaults.capture),
            selector: parse(&self.helpers.selector).unwrap_or(defaults.selector),
            outputs: parse(&self.helpers.outputs),
        }
    }

    pub fn session_config(&self, region: RegionRequest) -> SessionConfig {
        SessionConfig {
            destination_template: self.file_dest.clone(),
            include_audio: self.include_audio,
            start_delay: Duration::from_secs(u64::from(self.delay)),
            extra_flags: split_flags(&self.flags),
            region,
        }
    }
}

/// Splits the free-text flags field into the tokens passed to the capture helper.
///
/// Whitespace separates tokens; nothing is interpreted by a shell.
pub fn split_flags(flags: &str) -> Vec<String> {
    flags.split_whitespace().map(str::to_string).collect()
}

/// A destination needs a file name that is not a directory and an existing parent.
pub fn validate_file_dest(file_dest: &str) -> std::result::Result<(), String> {
    let path = expand_home(&file_dest.replace(ID_TOKEN, "id"));

    if path.file_name().is_none() || file_dest.ends_with('/') {
        return Err(format!("\"{file_dest}\" does not have a file name"));
    }

    if path.is_dir() {
        return Err(format!("\"{file_dest}\" is a directory"));
    }

    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if !parent.is_dir() {
        return Err(format!("\"{file_dest}\"'s parent directory does not exist"));
    }

    Ok(())
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

fn field<T: DeserializeOwned>(table: &toml::Table, key: &str) -> Option<T> {
    let value = table.get(key)?;
    match T::deserialize(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(field = key, error = %err, "invalid value in configuration, keeping default");
            None
        }
    }
}
