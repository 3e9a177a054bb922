use directories::ProjectDirs;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Relocates all persisted state into a single directory when set.
pub const HOME_ENV_VAR: &str = "KODEKA_HOME";

const CONFIG_FILE_NAME: &str = "config.json";
const HISTORY_DIR_NAME: &str = "history";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_file: PathBuf,
    pub history_dir: PathBuf,
}

#[derive(Debug)]
pub struct PathsError;

impl fmt::Display for PathsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to determine a per-user directory for kodeka data. Set {HOME_ENV_VAR} to choose one."
        )
    }
}

impl std::error::Error for PathsError {}

impl AppPaths {
    /// `<home>/config.json` and `<home>/history/`.
    pub fn under(home: impl AsRef<Path>) -> Self {
        let home = home.as_ref();
        Self {
            config_file: home.join(CONFIG_FILE_NAME),
            history_dir: home.join(HISTORY_DIR_NAME),
        }
    }

    pub fn resolve() -> Result<Self, PathsError> {
        if let Some(home) = env::var_os(HOME_ENV_VAR).filter(|value| !value.is_empty()) {
            return Ok(Self::under(PathBuf::from(home)));
        }

        let dirs = ProjectDirs::from("dev", "kodeka", "kodeka").ok_or(PathsError)?;
        Ok(Self {
            config_file: dirs.config_dir().join(CONFIG_FILE_NAME),
            history_dir: dirs.data_dir().join(HISTORY_DIR_NAME),
        })
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths under `$HOME` to `~/…` on Unix-like systems
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_layout_keeps_config_and_history_side_by_side() {
        let paths = AppPaths::under("/tmp/kodeka-home");
        assert_eq!(
            paths.config_file,
            PathBuf::from("/tmp/kodeka-home/config.json")
        );
        assert_eq!(paths.history_dir, PathBuf::from("/tmp/kodeka-home/history"));
    }

    #[test]
    fn paths_outside_home_display_unchanged() {
        assert_eq!(
            path_display("/definitely/not/home/file.json"),
            "/definitely/not/home/file.json"
        );
    }
}
