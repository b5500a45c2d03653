//! Session logging functionality

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Session entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub start: String,
    pub stop: Option<String>,
    #[serde(default)]
    pub fish_caught: u32,
    #[serde(default)]
    pub purchases: u32,
}

/// Load sessions from file
pub fn load_sessions(path: &Path) -> Vec<SessionRecord> {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

/// Save sessions to file
pub fn save_sessions(path: &Path, sessions: &[SessionRecord]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log folder {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(sessions)?;
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

/// Append one finished session, keeping earlier entries
pub fn append_session(path: &Path, record: &SessionRecord) -> anyhow::Result<()> {
    let mut sessions = load_sessions(path);
    sessions.push(record.clone());
    save_sessions(path, &sessions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fish: u32) -> SessionRecord {
        SessionRecord {
            start: "2024-05-01T10:00:00+00:00".to_string(),
            stop: Some("2024-05-01T11:00:00+00:00".to_string()),
            fish_caught: fish,
            purchases: 1,
        }
    }

    #[test]
    fn test_load_sessions_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_sessions(&dir.path().join("nope.json")).is_empty());
    }

    #[test]
    fn test_append_creates_and_extends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("sessions.json");

        append_session(&path, &record(3)).unwrap();
        append_session(&path, &record(7)).unwrap();

        let sessions = load_sessions(&path);
        assert_eq!(sessions, vec![record(3), record(7)]);
    }

    #[test]
    fn test_reads_entries_without_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        fs::write(&path, r#"[{"start": "a", "stop": null}]"#).unwrap();

        let sessions = load_sessions(&path);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].fish_caught, 0);
        assert!(sessions[0].stop.is_none());
    }
}
