use actix_web::{HttpResponse, Responder, web};
use notes_types::RpcResponse;

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(RpcResponse::ok(serde_json::json!({
        "status": "ok",
        "version": VERSION,
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "workspace_configured": state.store.workspace_root().is_some(),
        "pending_saves": state.store.pending_saves(),
        "save_debounce_ms": state.config.save_debounce_ms,
    })))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(RpcResponse::ok(serde_json::json!({
        "version": VERSION
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::notes::{MemoryKvStore, NoteStore};
    use actix_web::{App, test};
    use serde_json::Value;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[actix_web::test]
    async fn test_health_and_version_use_envelope() {
        let state = web::Data::new(AppState {
            store: Arc::new(NoteStore::new(
                Arc::new(MemoryKvStore::new()),
                Duration::from_millis(600),
            )),
            config: Config {
                port: 0,
                cache_path: PathBuf::new(),
                workspace_dir: None,
                save_debounce_ms: 600,
                frontend_dir: None,
            },
            started_at: Instant::now(),
        });
        let app = test::init_service(App::new().app_data(state).configure(config_routes)).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["workspace_configured"], false);
        assert_eq!(body["data"]["save_debounce_ms"], 600);

        let req = test::TestRequest::get().uri("/api/version").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["version"], VERSION);
    }
}
