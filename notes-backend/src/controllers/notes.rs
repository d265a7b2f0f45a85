//! Notes REST API: the seam between the editor UI and the note store.
//!
//! Listing, editing, saving, exporting and deleting notes, bulk selection,
//! and picking the workspace folder.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use notes_types::{
    BulkState, DeleteResult, ListNotesQuery, NoteDetail, NoteList, PickWorkspaceRequest,
    RpcResponse, SaveAsRequest, SelectAllRequest, SetSelectedRequest, UpdateNoteRequest,
    WorkspaceStatus,
};
use serde::Serialize;
use std::path::PathBuf;

use crate::AppState;
use crate::notes::NoteError;

pub fn config(cfg: &mut web::ServiceConfig) {
    // Fixed paths go before `/api/notes/{id}` so they are not taken as ids
    cfg.service(
        web::resource("/api/notes")
            .route(web::get().to(list_notes))
            .route(web::post().to(create_note)),
    )
    .service(web::resource("/api/notes/current").route(web::get().to(get_current_note)))
    .service(web::resource("/api/notes/select-all").route(web::post().to(select_all)))
    .service(web::resource("/api/notes/delete-selected").route(web::post().to(delete_selected)))
    .service(
        web::resource("/api/notes/{id}")
            .route(web::get().to(get_note))
            .route(web::patch().to(update_note))
            .route(web::delete().to(delete_note)),
    )
    .service(web::resource("/api/notes/{id}/save").route(web::post().to(save_note)))
    .service(web::resource("/api/notes/{id}/save-as").route(web::post().to(save_note_as)))
    .service(web::resource("/api/notes/{id}/selected").route(web::put().to(set_selected)))
    .service(
        web::resource("/api/workspace")
            .route(web::get().to(get_workspace))
            .route(web::post().to(pick_workspace)),
    )
    .service(web::resource("/api/workspace/reload").route(web::post().to(reload_workspace)));
}

fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(RpcResponse::ok(data))
}

/// Map a store error to a status code and `{ success: false, error }` body
fn error_response(e: NoteError) -> HttpResponse {
    let body = RpcResponse::<()>::err(e.to_string());
    match e {
        NoteError::NotFound { .. } => HttpResponse::NotFound().json(body),
        NoteError::PermissionDenied { .. } => HttpResponse::Forbidden().json(body),
        NoteError::InvalidEntryName { .. } => HttpResponse::BadRequest().json(body),
        NoteError::NoWorkspace => HttpResponse::Conflict().json(body),
        NoteError::Io(_) | NoteError::Json(_) => {
            log::error!("[NOTES] Request failed: {}", body.error.as_deref().unwrap_or_default());
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn detail_response(state: &AppState, id: &str) -> HttpResponse {
    match state.store.detail(id, Utc::now()) {
        Some(detail) => ok::<NoteDetail>(detail),
        None => error_response(NoteError::not_found(id)),
    }
}

// --- Notes ---

async fn list_notes(data: web::Data<AppState>, query: web::Query<ListNotesQuery>) -> HttpResponse {
    let filter = query.q.as_deref().unwrap_or("");
    ok::<NoteList>(data.store.list_view(filter, Utc::now()))
}

async fn create_note(data: web::Data<AppState>) -> HttpResponse {
    let note = data.store.new_note();
    detail_response(&data, &note.id)
}

/// The note open in the editor, or `null` when none is
async fn get_current_note(data: web::Data<AppState>) -> HttpResponse {
    let detail = data
        .store
        .current()
        .and_then(|note| data.store.detail(&note.id, Utc::now()));
    ok::<Option<NoteDetail>>(detail)
}

/// Open a note in the editor
async fn get_note(data: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match data.store.select_note(Some(&id)) {
        Some(_) => detail_response(&data, &id),
        None => error_response(NoteError::not_found(&id)),
    }
}

async fn update_note(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateNoteRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    let UpdateNoteRequest { title, content } = body.into_inner();
    match data.store.update_note(&id, title, content) {
        Ok(_) => detail_response(&data, &id),
        Err(e) => error_response(e),
    }
}

/// Save right away, skipping the debounce
async fn save_note(data: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match data.store.schedule_save(&id, true) {
        Ok(_) => detail_response(&data, &id),
        Err(e) => error_response(e),
    }
}

/// Export a copy of a note. A directory target receives the suggested file name.
async fn save_note_as(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SaveAsRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    if body.path.trim().is_empty() {
        return HttpResponse::BadRequest().json(RpcResponse::<()>::err("path is empty"));
    }

    let mut target = PathBuf::from(body.path.trim());
    if target.is_dir() {
        match data.store.suggested_file_name(&id) {
            Some(name) => target.push(name),
            None => return error_response(NoteError::not_found(&id)),
        }
    }

    match data.store.save_as(&id, &target) {
        Ok(()) => ok(serde_json::json!({ "path": target.to_string_lossy() })),
        Err(e) => error_response(e),
    }
}

async fn delete_note(data: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    if data.store.delete_note(&id) {
        ok(DeleteResult { deleted: 1 })
    } else {
        error_response(NoteError::not_found(&id))
    }
}

// --- Bulk selection ---

async fn set_selected(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SetSelectedRequest>,
) -> HttpResponse {
    match data.store.set_selected(&path.into_inner(), body.selected) {
        Ok(()) => ok::<BulkState>(data.store.bulk_state()),
        Err(e) => error_response(e),
    }
}

async fn select_all(data: web::Data<AppState>, body: web::Json<SelectAllRequest>) -> HttpResponse {
    data.store.select_all(body.selected);
    ok::<BulkState>(data.store.bulk_state())
}

async fn delete_selected(data: web::Data<AppState>) -> HttpResponse {
    let deleted = data.store.delete_selected();
    ok(DeleteResult { deleted })
}

// --- Workspace ---

async fn get_workspace(data: web::Data<AppState>) -> HttpResponse {
    ok::<WorkspaceStatus>(data.store.workspace_status())
}

async fn pick_workspace(
    data: web::Data<AppState>,
    body: web::Json<PickWorkspaceRequest>,
) -> HttpResponse {
    if body.path.trim().is_empty() {
        return HttpResponse::BadRequest().json(RpcResponse::<()>::err("path is empty"));
    }
    match data.store.pick_workspace(body.path.trim()) {
        Ok(_) => ok::<WorkspaceStatus>(data.store.workspace_status()),
        Err(e) => error_response(e),
    }
}

async fn reload_workspace(data: web::Data<AppState>) -> HttpResponse {
    match data.store.reload_workspace() {
        Ok(_) => ok::<WorkspaceStatus>(data.store.workspace_status()),
        Err(e) => error_response(e),
    }
}
