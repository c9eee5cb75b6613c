//! Home directory resolution for the server's data, logs and SQLite files.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeDirError {
    #[error("cannot determine the user's home directory")]
    NoHome,

    #[error("failed to create home directory {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve the server home directory.
///
/// `configured` wins when given; a leading `~` expands to the user's home and
/// relative paths are made absolute against the current directory. Without a
/// configured value the platform default is used: `$HOME/<default_subdir>` on
/// Unix/macOS, `%APPDATA%/<default_subdir>` on Windows.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let path = match configured {
        Some(raw) => expand_tilde(raw.trim())?,
        None => platform_base()?.join(default_subdir),
    };

    let path = if path.is_relative() {
        std::env::current_dir()
            .map_err(|source| HomeDirError::Create {
                path: path.clone(),
                source,
            })?
            .join(path)
    } else {
        path
    };

    if create {
        std::fs::create_dir_all(&path).map_err(|source| HomeDirError::Create {
            path: path.clone(),
            source,
        })?;
    }
    Ok(path)
}

fn expand_tilde(raw: &str) -> Result<PathBuf, HomeDirError> {
    if raw == "~" {
        return dirs::home_dir().ok_or(HomeDirError::NoHome);
    }
    match raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        Some(rest) => Ok(dirs::home_dir().ok_or(HomeDirError::NoHome)?.join(rest)),
        None => Ok(Path::new(raw).to_path_buf()),
    }
}

#[cfg(target_os = "windows")]
fn platform_base() -> Result<PathBuf, HomeDirError> {
    dirs::config_dir().ok_or(HomeDirError::NoHome)
}

#[cfg(not(target_os = "windows"))]
fn platform_base() -> Result<PathBuf, HomeDirError> {
    dirs::home_dir().ok_or(HomeDirError::NoHome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn explicit_absolute_dir_is_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("a/b");
        let resolved =
            resolve_home_dir(Some(target.to_string_lossy().to_string()), ".x", true).unwrap();
        assert_eq!(resolved, target);
        assert!(target.is_dir());
    }

    #[test]
    fn tilde_is_expanded() {
        let resolved = resolve_home_dir(Some("~/.catalog_home_test".into()), ".x", false).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with(".catalog_home_test"));
        assert!(!resolved.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn default_uses_subdir() {
        let resolved = resolve_home_dir(None, ".catalog_default_home_test", false).unwrap();
        assert!(resolved.ends_with(".catalog_default_home_test"));
    }
}
