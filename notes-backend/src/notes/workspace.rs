//! Directory-backed workspace
//!
//! A `Workspace` is a handle scoped to one folder: every read, write and
//! delete goes through it and is limited to direct children of the root.
//! Write access is negotiated with a query/request pair before use.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::error::NoteError;
use super::file_ops;

/// Outcome of a permission query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    /// Access can be obtained by asking (the folder does not exist yet)
    Prompt,
    Denied,
}

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current read-write permission without side effects
    pub fn query_permission(&self) -> PermissionState {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => PermissionState::Granted,
            Ok(_) => PermissionState::Denied,
            Err(e) if e.kind() == io::ErrorKind::NotFound => PermissionState::Prompt,
            Err(e) => {
                log::warn!("[WORKSPACE] Cannot stat {}: {}", self.root.display(), e);
                PermissionState::Denied
            }
        }
    }

    /// Ask for read-write access. A missing folder is created.
    pub fn request_permission(&self) -> PermissionState {
        match self.query_permission() {
            PermissionState::Prompt => {
                if let Err(e) = fs::create_dir_all(&self.root) {
                    log::warn!("[WORKSPACE] Failed to create {}: {}", self.root.display(), e);
                    return PermissionState::Denied;
                }
                log::info!("[WORKSPACE] Created folder {}", self.root.display());
                self.query_permission()
            }
            state => state,
        }
    }

    pub fn ensure_write_access(&self) -> bool {
        self.query_permission() == PermissionState::Granted
            || self.request_permission() == PermissionState::Granted
    }

    /// Resolve a direct child of the root, rejecting anything that is not a
    /// single plain file name.
    fn entry_path(&self, name: &str) -> Result<PathBuf, NoteError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(name)),
            _ => Err(NoteError::InvalidEntryName {
                name: name.to_string(),
            }),
        }
    }

    pub fn write_entry(&self, name: &str, content: &str) -> Result<(), NoteError> {
        let path = self.entry_path(name)?;
        file_ops::write_note(&path, content)?;
        Ok(())
    }

    pub fn remove_entry(&self, name: &str) -> Result<(), NoteError> {
        self.entry_path(name)?;
        file_ops::delete_note_file(&self.root, name)?;
        Ok(())
    }

    /// `(file name, contents)` for every note file in the folder. Entries
    /// that cannot be read are logged and skipped.
    pub fn read_note_files(&self) -> Result<Vec<(String, String)>, NoteError> {
        let mut entries = Vec::new();
        for path in file_ops::list_note_files(&self.root)? {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
                continue;
            };
            match file_ops::read_note(&path) {
                Ok(text) => entries.push((name, text)),
                Err(e) => log::warn!("[WORKSPACE] Skipping unreadable {}: {}", name, e),
            }
        }
        Ok(entries)
    }
}
