use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use console_gateway::{AtomicFileWriter, PersistError, SelectionStore};
use console_logging::{console_info, console_warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    #[serde(default)]
    selections: BTreeMap<String, String>,
}

/// Remembered selections kept in a RON file, rewritten atomically on save.
pub(crate) struct RonSelectionStore {
    writer: AtomicFileWriter,
    state: Mutex<PersistedState>,
}

impl RonSelectionStore {
    /// Opens the store; a missing or unreadable file starts out empty.
    pub(crate) fn open(path: PathBuf) -> Self {
        let state = read_state(&path);
        Self {
            writer: AtomicFileWriter::new(path),
            state: Mutex::new(state),
        }
    }
}

fn read_state(path: &PathBuf) -> PersistedState {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return PersistedState::default();
        }
        Err(err) => {
            console_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return PersistedState::default();
        }
    };

    match ron::from_str(&content) {
        Ok(state) => {
            console_info!("Loaded persisted selections from {:?}", path);
            state
        }
        Err(err) => {
            console_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            PersistedState::default()
        }
    }
}

impl SelectionStore for RonSelectionStore {
    fn load(&self, key: &str) -> Option<String> {
        let state = self.state.lock().ok()?;
        state.selections.get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let mut state = self
            .state
            .lock()
            .map_err(|err| PersistError::Encode(err.to_string()))?;
        if state.selections.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        let mut next = state.clone();
        next.selections.insert(key.to_string(), value.to_string());

        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&next, pretty)
            .map_err(|err| PersistError::Encode(err.to_string()))?;
        self.writer.write(&content)?;
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY: &str = "last_selected_result_file";

    #[test]
    fn saved_selection_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".console_state.ron");

        let store = RonSelectionStore::open(path.clone());
        assert_eq!(store.load(KEY), None);
        store.save(KEY, "b.jsonl").unwrap();
        assert_eq!(store.load(KEY).as_deref(), Some("b.jsonl"));

        let reopened = RonSelectionStore::open(path);
        assert_eq!(reopened.load(KEY).as_deref(), Some("b.jsonl"));
    }

    #[test]
    fn corrupt_file_means_nothing_remembered() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".console_state.ron");
        fs::write(&path, "this is not ron (").unwrap();

        let store = RonSelectionStore::open(path.clone());
        assert_eq!(store.load(KEY), None);
        store.save(KEY, "a.jsonl").unwrap();
        assert_eq!(
            RonSelectionStore::open(path).load(KEY).as_deref(),
            Some("a.jsonl")
        );
    }

    #[test]
    fn failed_write_is_not_remembered() {
        let temp = TempDir::new().unwrap();
        // The state file's parent is a regular file, so writing must fail.
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = RonSelectionStore::open(blocker.join(".console_state.ron"));

        assert!(store.save(KEY, "b.jsonl").is_err());
        assert_eq!(store.load(KEY), None);
        assert!(store.save(KEY, "b.jsonl").is_err(), "retry must write again");
    }
}
