use std::{
    env,
    path::{Path, PathBuf},
};

/// Errors resolving host directories
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("HOME environment variable is not set")]
    HomeMissing,
    #[error("failed to resolve path: {0}")]
    Resolve(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[must_use]
pub fn default_home_dir() -> PathBuf {
    env::home_dir()
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(env::temp_dir)
}

/// Expand `~` prefix to the user home directory.
///
/// Returns the path unchanged if no tilde prefix is present.
///
/// # Errors
/// Returns `PathError::HomeMissing` if the home directory cannot be
/// determined.
pub fn expand_tilde(raw: &str) -> Result<PathBuf, PathError> {
    #[cfg(target_os = "windows")]
    {
        if raw.starts_with('~') {
            let user_home = env::home_dir().ok_or(PathError::HomeMissing)?;
            if raw == "~" {
                Ok(user_home)
            } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
                Ok(Path::new(&user_home).join(rest))
            } else {
                // Patterns like "~username" are not supported; treat as user home + rest
                let rest = raw.trim_start_matches('~');
                let rest = rest.trim_start_matches(['/', '\\']);
                Ok(Path::new(&user_home).join(rest))
            }
        } else {
            Ok(PathBuf::from(raw))
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Some(stripped) = raw.strip_prefix("~/") {
            let home = env::home_dir().ok_or(PathError::HomeMissing)?;
            Ok(Path::new(&home).join(stripped))
        } else if raw == "~" {
            let home = env::home_dir().ok_or(PathError::HomeMissing)?;
            Ok(home)
        } else {
            Ok(PathBuf::from(raw))
        }
    }
}

/// Normalize a path.
///
/// Rules:
/// - `~` prefix: expand to user home directory
/// - Absolute path: use as-is
/// - Other: prepend CWD
///
/// # Errors
/// Returns `PathError` if path normalization fails.
pub fn normalize_path(raw: &str) -> Result<PathBuf, PathError> {
    let expanded = expand_tilde(raw)?;

    if expanded.is_absolute() {
        return Ok(expanded);
    }

    std::path::absolute(&expanded)
        .map_err(|err| PathError::Resolve(format!("path '{raw}' is invalid due to: {err}")))
}
