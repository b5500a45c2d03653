//! Path utilities for finding data directories

use std::env;
use std::path::PathBuf;

/// Environment variable that overrides the data directory
pub const HOME_ENV: &str = "GPO_AUTOFISH_HOME";

/// Returns the folder where config and logs live.
///
/// A bundled executable keeps its data next to itself (detected by a sibling
/// `config` folder). Otherwise `GPO_AUTOFISH_HOME` wins, then the working
/// directory.
pub fn get_data_dir() -> PathBuf {
    if let Ok(exe_path) = env::current_exe() {
        if let Some(parent) = exe_path.parent() {
            if parent.join("config").is_dir() {
                return parent.to_path_buf();
            }
        }
    }

    if let Some(home) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// `<data dir>/config/settings.json`
pub fn settings_path() -> PathBuf {
    get_data_dir().join("config").join("settings.json")
}

/// `<data dir>/logs/sessions.json`
pub fn sessions_path() -> PathBuf {
    get_data_dir().join("logs").join("sessions.json")
}

/// `<data dir>/debug/log`
pub fn debug_log_dir() -> PathBuf {
    get_data_dir().join("debug").join("log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_data_dir() {
        let dir = get_data_dir();
        assert!(dir.exists() || dir == PathBuf::from("."));
    }

    #[test]
    fn test_derived_paths_share_data_dir() {
        let base = get_data_dir();
        assert!(settings_path().starts_with(&base));
        assert!(sessions_path().ends_with("logs/sessions.json"));
        assert!(debug_log_dir().ends_with("debug/log"));
    }
}
