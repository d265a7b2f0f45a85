//! NoteStore: in-memory notes reconciled with the local cache and an
//! optional workspace folder.
//!
//! The in-memory map is the source of truth. Every save mirrors the whole map
//! into the local cache; when a workspace is active the saved note is also
//! written to its own JSON file. Edits are coalesced per note by the
//! debouncer before they reach either backend.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use notes_types::{BulkState, NoteDetail, NoteList, NoteSummary, WorkspaceStatus};
use parking_lot::Mutex;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::debounce::SaveDebouncer;
use super::error::NoteError;
use super::local_cache::{self, KeyValueStore};
use super::workspace::Workspace;
use super::{file_ops, format};
use crate::models::note::iso_millis;
use crate::models::{Note, SaveStatus};

#[derive(Default)]
struct StoreState {
    /// Kept in insertion order, which is also the order of the cached array
    notes: IndexMap<String, Note>,
    current_id: Option<String>,
    /// Notes ticked for bulk deletion
    selection: HashSet<String>,
    workspace: Option<Workspace>,
    status: SaveStatus,
}

pub struct NoteStore {
    cache: Arc<dyn KeyValueStore>,
    debouncer: SaveDebouncer,
    state: Mutex<StoreState>,
}

/// Most recently updated first; ties broken by id so listings are stable
fn newest_first(a: &Note, b: &Note) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| a.id.cmp(&b.id))
}

fn latest_id(notes: &IndexMap<String, Note>) -> Option<String> {
    notes
        .values()
        .min_by(|a, b| newest_first(a, b))
        .map(|n| n.id.clone())
}

impl NoteStore {
    pub fn new(cache: Arc<dyn KeyValueStore>, save_delay: Duration) -> Self {
        Self {
            cache,
            debouncer: SaveDebouncer::new(save_delay),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Populate from the local cache and open the first cached note.
    /// Returns the number of notes loaded.
    pub fn load_local(&self) -> usize {
        let loaded = local_cache::load_local(self.cache.as_ref());
        let count = loaded.len();

        let mut state = self.state.lock();
        for note in loaded {
            state.notes.insert(note.id.clone(), note);
        }
        let first = state.notes.keys().next().cloned();
        Self::select_locked(&mut state, first.as_deref());

        log::info!("[NOTES] Loaded {} notes from local cache", count);
        count
    }

    fn persist_local(&self, state: &StoreState) {
        if let Err(e) = local_cache::save_local(self.cache.as_ref(), state.notes.values()) {
            log::error!("[NOTES] Failed to write local cache: {}", e);
        }
    }

    fn select_locked(state: &mut StoreState, id: Option<&str>) -> Option<Note> {
        match id.and_then(|id| state.notes.get(id)) {
            Some(note) => {
                state.status = SaveStatus::for_note(note);
                state.current_id = Some(note.id.clone());
                Some(note.clone())
            }
            None => {
                state.current_id = None;
                state.status = SaveStatus::NoSelection;
                None
            }
        }
    }

    /// Create an empty note, mirror it into the local cache and open it
    pub fn new_note(&self) -> Note {
        let note = Note::new(Utc::now());
        let mut state = self.state.lock();
        state.notes.insert(note.id.clone(), note.clone());
        self.persist_local(&state);
        Self::select_locked(&mut state, Some(&note.id));
        log::debug!("[NOTES] Created note {}", note.id);
        note
    }

    /// Open a note in the editor. Unknown or absent ids clear the selection.
    pub fn select_note(&self, id: Option<&str>) -> Option<Note> {
        Self::select_locked(&mut self.state.lock(), id)
    }

    pub fn get(&self, id: &str) -> Option<Note> {
        self.state.lock().notes.get(id).cloned()
    }

    pub fn current(&self) -> Option<Note> {
        let state = self.state.lock();
        state
            .current_id
            .as_ref()
            .and_then(|id| state.notes.get(id))
            .cloned()
    }

    pub fn status(&self) -> SaveStatus {
        self.state.lock().status
    }

    pub fn len(&self) -> usize {
        self.state.lock().notes.len()
    }

    pub fn pending_saves(&self) -> usize {
        self.debouncer.pending_count()
    }

    /// Apply an edit and arm a debounced save
    pub fn update_note(
        self: &Arc<Self>,
        id: &str,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<Note, NoteError> {
        {
            let mut state = self.state.lock();
            let note = state
                .notes
                .get_mut(id)
                .ok_or_else(|| NoteError::not_found(id))?;
            if let Some(title) = title {
                note.title = title;
            }
            if let Some(content) = content {
                note.content = content;
            }
            note.updated_at = Utc::now();
        }
        self.schedule_save(id, false)?;
        self.get(id).ok_or_else(|| NoteError::not_found(id))
    }

    /// Mark a note dirty and save it, either right away or once edits settle.
    /// Any save already armed for the note is cancelled.
    pub fn schedule_save(self: &Arc<Self>, id: &str, immediate: bool) -> Result<SaveStatus, NoteError> {
        {
            let mut state = self.state.lock();
            let note = state
                .notes
                .get_mut(id)
                .ok_or_else(|| NoteError::not_found(id))?;
            note.dirty = true;
            state.status = SaveStatus::Saving;
        }

        if immediate {
            self.debouncer.cancel(id);
            return self.do_save(id).ok_or_else(|| NoteError::not_found(id));
        }

        let store = Arc::clone(self);
        let owned_id = id.to_string();
        self.debouncer.schedule(id, move || {
            store.do_save(&owned_id);
        });
        Ok(SaveStatus::Saving)
    }

    /// Write one note through every active backend. Returns `None` when the
    /// note no longer exists (e.g. deleted while its timer was armed).
    pub fn do_save(&self, id: &str) -> Option<SaveStatus> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let note = state.notes.get_mut(id)?;
        note.updated_at = Utc::now();

        let status = match &state.workspace {
            Some(workspace) => match Self::write_to_workspace(workspace, note) {
                Ok(()) => {
                    note.dirty = false;
                    SaveStatus::SavedToDisk
                }
                Err(e) => {
                    log::error!("[NOTES] Failed to save {} to workspace: {}", id, e);
                    SaveStatus::SaveFailed
                }
            },
            None => {
                note.dirty = false;
                SaveStatus::SavedLocally
            }
        };

        self.persist_local(state);
        state.status = status;
        log::debug!("[NOTES] Saved {}: {}", id, status.as_str());
        Some(status)
    }

    fn write_to_workspace(workspace: &Workspace, note: &mut Note) -> Result<(), NoteError> {
        if !workspace.ensure_write_access() {
            return Err(NoteError::PermissionDenied {
                path: workspace.root().to_path_buf(),
            });
        }
        // Named once, on the first save; later title edits keep the file
        let file_name = note
            .file_name
            .get_or_insert_with(|| file_ops::note_file_name(&note.title, &note.id))
            .clone();
        let payload = note.to_file().to_json()?;
        workspace.write_entry(&file_name, &payload)
    }

    /// Switch persistence to `root`. Pending saves are flushed to the old
    /// backend first, then the folder's notes replace the in-memory set.
    /// Returns the number of notes loaded from the folder.
    pub fn pick_workspace(&self, root: impl Into<PathBuf>) -> Result<usize, NoteError> {
        let workspace = Workspace::new(root);
        if !workspace.ensure_write_access() {
            log::warn!(
                "[WORKSPACE] Write access refused for {}",
                workspace.root().display()
            );
            return Err(NoteError::PermissionDenied {
                path: workspace.root().to_path_buf(),
            });
        }

        self.flush_pending();

        let mut state = self.state.lock();
        log::info!("[WORKSPACE] Folder selected: {}", workspace.root().display());
        state.workspace = Some(workspace);
        Ok(Self::load_workspace_locked(&mut state))
    }

    /// Re-read the active folder, discarding in-memory state
    pub fn reload_workspace(&self) -> Result<usize, NoteError> {
        self.debouncer.cancel_all();
        let mut state = self.state.lock();
        if state.workspace.is_none() {
            return Err(NoteError::NoWorkspace);
        }
        Ok(Self::load_workspace_locked(&mut state))
    }

    fn load_workspace_locked(state: &mut StoreState) -> usize {
        state.notes.clear();
        state.selection.clear();
        state.current_id = None;

        let Some(workspace) = state.workspace.as_ref() else {
            return 0;
        };

        let now = Utc::now();
        let mut loaded = Vec::new();
        match workspace.read_note_files() {
            Ok(entries) => {
                for (name, text) in entries {
                    let data: Value = match serde_json::from_str(&text) {
                        Ok(data) => data,
                        Err(e) => {
                            log::debug!("[WORKSPACE] Skipping {}: {}", name, e);
                            continue;
                        }
                    };
                    loaded.push(Note::from_file_value(&data, &name, now));
                }
            }
            Err(e) => log::error!(
                "[WORKSPACE] Failed reading {}: {}",
                workspace.root().display(),
                e
            ),
        }

        for note in loaded {
            state.notes.insert(note.id.clone(), note);
        }
        // Files sharing an id collapse into one note
        let count = state.notes.len();
        let latest = latest_id(&state.notes);
        Self::select_locked(state, latest.as_deref());

        log::info!("[WORKSPACE] Loaded {} notes", count);
        count
    }

    pub fn workspace_root(&self) -> Option<PathBuf> {
        self.state
            .lock()
            .workspace
            .as_ref()
            .map(|ws| ws.root().to_path_buf())
    }

    /// Remove a note from memory (and its file, if any). File removal
    /// errors are logged and ignored.
    fn remove_locked(&self, state: &mut StoreState, id: &str) -> bool {
        let Some(note) = state.notes.shift_remove(id) else {
            return false;
        };
        if let (Some(workspace), Some(file_name)) = (&state.workspace, &note.file_name) {
            if let Err(e) = workspace.remove_entry(file_name) {
                log::warn!("[WORKSPACE] Failed to delete {}: {}", file_name, e);
            }
        }
        self.debouncer.cancel(id);
        state.selection.remove(id);
        true
    }

    fn reselect_if_current_gone(state: &mut StoreState) {
        let current_gone = state
            .current_id
            .as_ref()
            .is_some_and(|id| !state.notes.contains_key(id));
        if current_gone {
            let next = latest_id(&state.notes);
            Self::select_locked(state, next.as_deref());
        }
    }

    pub fn delete_note(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        if !self.remove_locked(&mut state, id) {
            return false;
        }
        self.persist_local(&state);
        Self::reselect_if_current_gone(&mut state);
        log::debug!("[NOTES] Deleted {}", id);
        true
    }

    /// Delete every ticked note. Returns how many were removed.
    pub fn delete_selected(&self) -> usize {
        let mut state = self.state.lock();
        if state.selection.is_empty() {
            return 0;
        }
        let ids: Vec<String> = state.selection.iter().cloned().collect();
        let deleted = ids
            .iter()
            .filter(|id| self.remove_locked(&mut state, id))
            .count();
        state.selection.clear();
        self.persist_local(&state);
        Self::reselect_if_current_gone(&mut state);
        log::info!("[NOTES] Deleted {} selected notes", deleted);
        deleted
    }

    /// File name offered when exporting a note
    pub fn suggested_file_name(&self, id: &str) -> Option<String> {
        self.get(id)
            .map(|n| file_ops::note_file_name(&n.title, &n.id))
    }

    /// Export a standalone copy of a note. The copy is stamped with the
    /// current time; the note itself is left untouched.
    pub fn save_as(&self, id: &str, target: &Path) -> Result<(), NoteError> {
        let mut state = self.state.lock();
        let note = state.notes.get(id).ok_or_else(|| NoteError::not_found(id))?;
        let mut payload = note.to_file();
        payload.updated_at = Utc::now();
        file_ops::write_note(target, &payload.to_json()?)?;
        state.status = SaveStatus::SavedAs;
        log::info!("[NOTES] Exported {} to {}", id, target.display());
        Ok(())
    }

    /// Notes matching `filter` (case-insensitive, title or content), newest first
    pub fn list(&self, filter: &str) -> Vec<Note> {
        let query = filter.trim().to_lowercase();
        let state = self.state.lock();
        let mut items: Vec<Note> = state
            .notes
            .values()
            .filter(|n| {
                n.title.to_lowercase().contains(&query) || n.content.to_lowercase().contains(&query)
            })
            .cloned()
            .collect();
        items.sort_by(newest_first);
        items
    }

    pub fn set_selected(&self, id: &str, selected: bool) -> Result<(), NoteError> {
        let mut state = self.state.lock();
        if !state.notes.contains_key(id) {
            return Err(NoteError::not_found(id));
        }
        if selected {
            state.selection.insert(id.to_string());
        } else {
            state.selection.remove(id);
        }
        Ok(())
    }

    pub fn select_all(&self, selected: bool) {
        let mut state = self.state.lock();
        state.selection = if selected {
            state.notes.keys().cloned().collect()
        } else {
            HashSet::new()
        };
    }

    fn bulk_locked(state: &StoreState) -> BulkState {
        let selected_count = state.selection.len();
        BulkState {
            selected_count,
            all_selected: selected_count > 0 && selected_count == state.notes.len(),
            can_delete: selected_count > 0,
        }
    }

    pub fn bulk_state(&self) -> BulkState {
        Self::bulk_locked(&self.state.lock())
    }

    /// Run every armed save now. Returns how many notes were saved.
    pub fn flush_pending(&self) -> usize {
        let ids = self.debouncer.take_pending();
        let saved = ids.iter().filter(|id| self.do_save(id).is_some()).count();
        if saved > 0 {
            log::info!("[NOTES] Flushed {} pending saves", saved);
        }
        saved
    }

    // --- views for the HTTP layer ---

    pub fn list_view(&self, filter: &str, now: DateTime<Utc>) -> NoteList {
        let notes = self.list(filter);
        let state = self.state.lock();
        let summaries = notes
            .iter()
            .map(|n| NoteSummary {
                id: n.id.clone(),
                title: n.display_title().to_string(),
                dirty: n.dirty,
                updated_ago: format::time_ago(n.updated_at, now),
                file_name: n.file_name.clone(),
                selected: state.selection.contains(&n.id),
                current: state.current_id.as_deref() == Some(n.id.as_str()),
            })
            .collect();
        NoteList {
            notes: summaries,
            bulk: Self::bulk_locked(&state),
        }
    }

    pub fn detail(&self, id: &str, now: DateTime<Utc>) -> Option<NoteDetail> {
        let state = self.state.lock();
        let note = state.notes.get(id)?;
        Some(NoteDetail {
            id: note.id.clone(),
            title: note.title.clone(),
            content: note.content.clone(),
            created_at: iso_millis::format(&note.created_at),
            updated_at: iso_millis::format(&note.updated_at),
            file_name: note.file_name.clone(),
            dirty: note.dirty,
            status: state.status.as_str().to_string(),
            meta: format::meta_line(Some(note), now),
        })
    }

    pub fn workspace_status(&self) -> WorkspaceStatus {
        let state = self.state.lock();
        WorkspaceStatus {
            path: state
                .workspace
                .as_ref()
                .map(|ws| ws.root().to_string_lossy().to_string()),
            note_count: state.notes.len(),
            pending_saves: self.debouncer.pending_count(),
            status: state.status.as_str().to_string(),
        }
    }
}
