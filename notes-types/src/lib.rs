//! Shared types for the notes backend HTTP API and its clients.

use serde::{Deserialize, Serialize};

// =====================================================
// Request Types
// =====================================================

/// Edit the title and/or content of a note. Omitted fields are left alone.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Write a standalone copy of a note to an arbitrary file path
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveAsRequest {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetSelectedRequest {
    pub selected: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectAllRequest {
    pub selected: bool,
}

/// Switch persistence to a directory of per-note JSON files
#[derive(Debug, Serialize, Deserialize)]
pub struct PickWorkspaceRequest {
    pub path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListNotesQuery {
    #[serde(default)]
    pub q: Option<String>,
}

// =====================================================
// Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// =====================================================
// Domain Types
// =====================================================

/// One row of the note list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub dirty: bool,
    /// Relative age of the last edit, e.g. "5m ago"
    pub updated_ago: String,
    #[serde(default)]
    pub file_name: Option<String>,
    pub selected: bool,
    pub current: bool,
}

/// State of the bulk-selection controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkState {
    pub selected_count: usize,
    pub all_selected: bool,
    pub can_delete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteList {
    pub notes: Vec<NoteSummary>,
    pub bulk: BulkState,
}

/// Full view of the note open in the editor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteDetail {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub file_name: Option<String>,
    pub dirty: bool,
    /// Status line shown under the editor ("Saved to disk", "Unsaved changes", ...)
    pub status: String,
    /// Created/updated/file summary line
    pub meta: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceStatus {
    /// Absolute path of the active folder, if one is picked
    #[serde(default)]
    pub path: Option<String>,
    pub note_count: usize,
    pub pending_saves: usize,
    pub status: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeleteResult {
    pub deleted: usize,
}
