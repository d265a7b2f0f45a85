use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNTITLED: &str = "Untitled";

/// Generate a note id: 8 random hex chars followed by the epoch millis in hex.
pub fn new_note_id() -> String {
    let mut rng = rand::thread_rng();
    let prefix: String = (0..8)
        .map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect();
    format!("{}{:x}", prefix, Utc::now().timestamp_millis())
}

/// A single note as held in memory and in the local cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
    /// Name of the backing file inside the workspace, once one was written
    #[serde(default)]
    pub file_name: Option<String>,
    /// Unsaved changes exist. Never persisted.
    #[serde(skip)]
    pub dirty: bool,
}

impl Note {
    /// A fresh, empty, dirty note
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: new_note_id(),
            title: UNTITLED.to_string(),
            content: String::new(),
            created_at: now,
            updated_at: now,
            file_name: None,
            dirty: true,
        }
    }

    /// Title for display, falling back to "Untitled" when empty
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() { UNTITLED } else { &self.title }
    }

    /// Payload written to the note's JSON file
    pub fn to_file(&self) -> NoteFile<'_> {
        NoteFile {
            id: &self.id,
            title: &self.title,
            content: &self.content,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Build a note from a parsed workspace file. Anything missing, empty or of
    /// the wrong type falls back to a default; the result is clean.
    pub fn from_file_value(data: &Value, file_name: &str, now: DateTime<Utc>) -> Self {
        let text = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let timestamp = |key: &str| {
            text(key)
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(now)
        };

        Self {
            id: text("id").unwrap_or_else(new_note_id),
            title: text("title").unwrap_or_else(|| UNTITLED.to_string()),
            content: text("content").unwrap_or_default(),
            created_at: timestamp("createdAt"),
            updated_at: timestamp("updatedAt"),
            file_name: Some(file_name.to_string()),
            dirty: false,
        }
    }
}

/// On-disk JSON shape of a note file
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFile<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub updated_at: DateTime<Utc>,
}

impl NoteFile<'_> {
    /// Pretty-printed (2-space) JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Status line shown for the note being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    NoSelection,
    Unsaved,
    Saving,
    SavedToDisk,
    LocalOnly,
    SavedLocally,
    SaveFailed,
    SavedAs,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::NoSelection => "No note selected",
            SaveStatus::Unsaved => "Unsaved changes",
            SaveStatus::Saving => "Saving…",
            SaveStatus::SavedToDisk => "Saved to disk",
            SaveStatus::LocalOnly => "Local (not saved to folder)",
            SaveStatus::SavedLocally => "Saved locally (no folder)",
            SaveStatus::SaveFailed => "Save failed (check permissions)",
            SaveStatus::SavedAs => "Saved (Save As)",
        }
    }

    /// Status shown when a note is opened
    pub fn for_note(note: &Note) -> Self {
        if note.dirty {
            SaveStatus::Unsaved
        } else if note.file_name.is_some() {
            SaveStatus::SavedToDisk
        } else {
            SaveStatus::LocalOnly
        }
    }
}

/// RFC 3339 timestamps with millisecond precision and a `Z` suffix.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_note_id_shape() {
        let id = new_note_id();
        assert!(id.len() > 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(new_note_id(), new_note_id());
    }

    #[test]
    fn test_new_note_is_untitled_and_dirty() {
        let note = Note::new(fixed_now());
        assert_eq!(note.title, "Untitled");
        assert!(note.content.is_empty());
        assert!(note.dirty);
        assert!(note.file_name.is_none());
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_file_payload_has_exact_keys() {
        let mut note = Note::new(fixed_now());
        note.file_name = Some("untitled-x.json".to_string());
        let json = note.to_file().to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(value["createdAt"], "2024-05-01T12:00:00.000Z");
        assert!(value.get("fileName").is_none());
        assert!(json.contains("\n  \"id\""));
    }

    #[test]
    fn test_from_file_value_defaults() {
        let note = Note::from_file_value(&json!({ "title": "", "content": 5 }), "a.json", fixed_now());
        assert_eq!(note.title, "Untitled");
        assert_eq!(note.content, "");
        assert_eq!(note.created_at, fixed_now());
        assert_eq!(note.file_name.as_deref(), Some("a.json"));
        assert!(!note.dirty);
        assert!(!note.id.is_empty());

        // Non-object JSON still yields a default note
        let note = Note::from_file_value(&json!([1, 2]), "b.json", fixed_now());
        assert_eq!(note.title, "Untitled");
    }

    #[test]
    fn test_from_file_value_keeps_fields() {
        let data = json!({
            "id": "abc",
            "title": "Groceries",
            "content": "milk",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "not a date"
        });
        let note = Note::from_file_value(&data, "groceries-abc.json", fixed_now());
        assert_eq!(note.id, "abc");
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "milk");
        assert_eq!(note.created_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(note.updated_at, fixed_now());
    }

    #[test]
    fn test_cache_record_skips_dirty() {
        let note = Note::new(fixed_now());
        let value = serde_json::to_value(&note).unwrap();
        assert!(value.get("dirty").is_none());
        assert!(value.get("fileName").is_some());

        let back: Note = serde_json::from_value(value).unwrap();
        assert!(!back.dirty);
        assert_eq!(back.id, note.id);
    }

    #[test]
    fn test_status_for_note() {
        let mut note = Note::new(fixed_now());
        assert_eq!(SaveStatus::for_note(&note), SaveStatus::Unsaved);
        note.dirty = false;
        assert_eq!(SaveStatus::for_note(&note), SaveStatus::LocalOnly);
        note.file_name = Some("x.json".to_string());
        assert_eq!(SaveStatus::for_note(&note).as_str(), "Saved to disk");
    }

    #[test]
    fn test_default_status_is_no_selection() {
        assert_eq!(SaveStatus::default(), SaveStatus::NoSelection);
        assert_eq!(SaveStatus::default().as_str(), "No note selected");
    }
}
