use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use nix::unistd::{AccessFlags, access};

use crate::error::{RecorderError, Result};

/// Placeholder in a destination template replaced by the session identifier.
pub const ID_TOKEN: &str = "{id}";

/// Session identifier derived from the local wall clock.
///
/// Unique within the process: a second session started in the same second
/// gets a `-2`, `-3`, … suffix.
pub fn timestamp_id() -> String {
    static LAST: Mutex<Option<(String, u32)>> = Mutex::new(None);

    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let Ok(mut last) = LAST.lock() else {
        return stamp;
    };

    let repeat = match last.as_mut() {
        Some((previous, count)) if *previous == stamp => {
            *count += 1;
            *count
        }
        _ => 1,
    };

    if repeat == 1 {
        *last = Some((stamp.clone(), 1));
        return stamp;
    }
    format!("{stamp}-{repeat}")
}

/// The existing file a template would overwrite.
///
/// Only templates without `{id}` are checked; the placeholder makes every
/// session's path distinct.
pub fn existing_destination(template: &str) -> Option<PathBuf> {
    if template.contains(ID_TOKEN) {
        return None;
    }

    let path = expand_home(template);
    path.is_file().then_some(path)
}

/// Turns a destination template into a concrete path for one session.
///
/// Every `{id}` is replaced by `id` and a leading `~` expands to the home
/// directory. The parent directory has to exist and be writable already;
/// nothing is created here.
pub fn resolve_destination(template: &str, id: &str) -> Result<PathBuf> {
    let path = expand_home(&template.replace(ID_TOKEN, id));
    let unavailable = |reason: &str| RecorderError::DestinationUnavailable {
        path: path.clone(),
        reason: reason.to_string(),
    };

    if path.file_name().is_none() {
        return Err(unavailable("the destination has no file name"));
    }

    if path.is_dir() {
        return Err(unavailable("the destination is a directory"));
    }

    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    if !parent.is_dir() {
        return Err(unavailable("the target directory does not exist"));
    }

    if access(parent, AccessFlags::W_OK).is_err() {
        return Err(unavailable("the target directory is not writable"));
    }

    Ok(path)
}

pub fn expand_home(path: &str) -> PathBuf {
    let home = dirs::home_dir();

    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => PathBuf::from(path),
    }
}

/// Inverse of [`expand_home`] for display: `/home/user/x` becomes `~/x`.
pub fn shrink_home(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(rest) = path.strip_prefix(&home)
    {
        if rest.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~/{}", rest.display());
    }

    path.display().to_string()
}

/// Keeps the directory and extension of `template` but gives it a fresh
/// `cute-{id}` file name.
pub fn generated_name_template(template: &str) -> String {
    let path = Path::new(template);
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or("mp4");
    let file_name = format!("cute-{ID_TOKEN}.{extension}");

    match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => parent.join(file_name).to_string_lossy().into_owned(),
        None => file_name,
    }
}
