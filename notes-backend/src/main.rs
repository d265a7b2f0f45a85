use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use std::sync::Arc;

mod config;
mod controllers;
mod models;
mod notes;

use config::Config;
use notes::{FileKvStore, KeyValueStore, MemoryKvStore, NoteStore};

pub struct AppState {
    pub store: Arc<NoteStore>,
    pub config: Config,
    /// Server start time for uptime calculation
    pub started_at: std::time::Instant,
}

/// Open the file-backed cache, or fall back to an in-memory one so the
/// server still starts (notes then live only as long as the process).
fn open_cache(config: &Config) -> Arc<dyn KeyValueStore> {
    match FileKvStore::open(&config.cache_path) {
        Ok(store) => {
            log::info!("Local cache: {}", store.path().display());
            Arc::new(store)
        }
        Err(e) => {
            log::error!(
                "Failed to open local cache {}: {} (falling back to memory)",
                config.cache_path.display(),
                e
            );
            Arc::new(MemoryKvStore::new())
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("Notes backend v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    let port = config.port;
    log::info!("Save debounce: {}ms", config.save_debounce_ms);

    let store = Arc::new(NoteStore::new(open_cache(&config), config.save_delay()));
    store.load_local();

    if let Some(dir) = &config.workspace_dir {
        match store.pick_workspace(dir) {
            Ok(count) => log::info!("Workspace {} opened with {} notes", dir.display(), count),
            Err(e) => log::error!("Failed to open workspace {}: {}", dir.display(), e),
        }
    }

    let frontend_dir = config.frontend_dir.clone().filter(|dir| {
        let exists = dir.join("index.html").exists();
        if !exists {
            log::warn!("Frontend not found at {}, serving API only", dir.display());
        }
        exists
    });
    if let Some(dir) = &frontend_dir {
        log::info!("Serving frontend from: {}", dir.display());
    }

    let shutdown_store = Arc::clone(&store);
    let app_config = config.clone();

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let mut app = App::new()
            .app_data(web::Data::new(AppState {
                store: Arc::clone(&store),
                config: app_config.clone(),
                started_at: std::time::Instant::now(),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .configure(controllers::notes::config);

        // Serve static files only if the frontend exists
        if let Some(dir) = &frontend_dir {
            app = app.service(Files::new("/", dir).index_file("index.html"));
        }

        app
    })
    .bind(("0.0.0.0", port))?
    .run();

    log::info!("Listening on http://0.0.0.0:{}", port);

    // Get server handle for graceful shutdown
    let server_handle = server.handle();

    // Spawn Ctrl+C handler
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        log::info!("Received Ctrl+C, shutting down...");

        // Debounced edits would otherwise be lost
        log::info!("Flushing pending saves...");
        shutdown_store.flush_pending();

        log::info!("Stopping HTTP server...");
        let server_stop = server_handle.stop(true);
        if tokio::time::timeout(std::time::Duration::from_secs(5), server_stop).await.is_err() {
            log::warn!("Timeout waiting for HTTP server to stop, forcing exit...");
        }

        log::info!("Shutdown complete");
    });

    server.await
}
