//! Local key-value cache for notes
//!
//! Every note is mirrored into a single cache entry so the app can start
//! without a workspace folder. Backends implement [`KeyValueStore`].

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use super::error::NoteError;
use super::file_ops;
use crate::models::Note;

/// Cache key holding the JSON array of all notes
pub const LOCAL_KEY: &str = "notes:local-db:v1";

/// String key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, NoteError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), NoteError>;
}

/// In-process store, lost on exit
#[derive(Default)]
pub struct MemoryKvStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, NoteError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), NoteError> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as one JSON object in a file, rewritten on every set
pub struct FileKvStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileKvStore {
    /// Open the store at `path`. A missing file is an empty store; a corrupt
    /// one is logged and treated as empty (it is replaced on the next write).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, NoteError> {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    log::warn!("[NOTES] Ignoring corrupt local cache {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl KeyValueStore for FileKvStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, NoteError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), NoteError> {
        let mut items = self.items.lock();
        items.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(&*items)?;
        file_ops::write_note(&self.path, &raw)?;
        Ok(())
    }
}

/// Read all cached notes. Any failure yields an empty list; records that do
/// not parse as notes are skipped. Loaded notes are clean.
pub fn load_local(store: &dyn KeyValueStore) -> Vec<Note> {
    let raw = match store.get_item(LOCAL_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("[NOTES] Failed to read local cache: {}", e);
            return Vec::new();
        }
    };

    let records = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(records)) => records,
        Ok(_) => return Vec::new(),
        Err(e) => {
            log::warn!("[NOTES] Local cache is not valid JSON: {}", e);
            return Vec::new();
        }
    };

    records
        .into_iter()
        .filter_map(|record| serde_json::from_value::<Note>(record).ok())
        .map(|mut note| {
            note.dirty = false;
            note
        })
        .collect()
}

/// Replace the cached note list
pub fn save_local<'a>(
    store: &dyn KeyValueStore,
    notes: impl IntoIterator<Item = &'a Note>,
) -> Result<(), NoteError> {
    let notes: Vec<&Note> = notes.into_iter().collect();
    let raw = serde_json::to_string(&notes)?;
    store.set_item(LOCAL_KEY, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn test_load_local_empty_and_garbage() {
        let store = MemoryKvStore::new();
        assert!(load_local(&store).is_empty());

        store.set_item(LOCAL_KEY, "{not json").unwrap();
        assert!(load_local(&store).is_empty());

        store.set_item(LOCAL_KEY, "{\"id\": \"x\"}").unwrap();
        assert!(load_local(&store).is_empty());
    }

    #[test]
    fn test_save_then_load_local() {
        let store = MemoryKvStore::new();
        let mut a = Note::new(Utc::now());
        a.title = "A".to_string();
        a.file_name = Some("a-1.json".to_string());
        let b = Note::new(Utc::now());

        save_local(&store, [&a, &b]).unwrap();
        let loaded = load_local(&store);
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|n| !n.dirty));
        assert_eq!(loaded[0].title, "A");
        assert_eq!(loaded[0].file_name.as_deref(), Some("a-1.json"));
    }

    #[test]
    fn test_load_local_skips_bad_records() {
        let store = MemoryKvStore::new();
        let raw = r#"[
            {"id": "ok", "title": "Fine", "content": "", "createdAt": "2024-01-01T00:00:00.000Z", "updatedAt": "2024-01-01T00:00:00.000Z"},
            {"title": "no id"},
            42
        ]"#;
        store.set_item(LOCAL_KEY, raw).unwrap();
        let loaded = load_local(&store);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "ok");
        assert!(loaded[0].file_name.is_none());
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache/local-db.json");

        let store = FileKvStore::open(&path).unwrap();
        assert!(store.get_item("k").unwrap().is_none());
        store.set_item("k", "v").unwrap();

        let reopened = FileKvStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_tolerates_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local-db.json");
        fs::write(&path, "garbage").unwrap();

        let store = FileKvStore::open(&path).unwrap();
        assert!(store.get_item(LOCAL_KEY).unwrap().is_none());
        store.set_item("k", "v").unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("\"k\""));
    }
}
