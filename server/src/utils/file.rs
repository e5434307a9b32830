//! File utility functions

use std::path::PathBuf;

/// Expand a leading tilde in a path string to the home directory.
///
/// Relative paths are kept relative (they resolve against the working
/// directory when opened); absolute paths pass through unchanged.
///
/// ```text
/// expand_path("~/.restquery/restquery.json") // -> /home/user/.restquery/restquery.json
/// expand_path("data/app.db")                 // -> data/app.db
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }

    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
