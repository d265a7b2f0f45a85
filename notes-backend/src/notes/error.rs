use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the note store and its persistence backends
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Note not found: {id}")]
    NotFound { id: String },

    #[error("Write permission denied for {}", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Invalid entry name: {name}")]
    InvalidEntryName { name: String },

    #[error("No workspace folder selected")]
    NoWorkspace,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NoteError {
    pub fn not_found(id: &str) -> Self {
        NoteError::NotFound { id: id.to_string() }
    }
}
