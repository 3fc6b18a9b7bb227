pub mod config;
pub mod error;
pub mod websocket;

use std::sync::Arc;
use actix_cors::Cors;
use actix_files::Files;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::{CorsConfig, ServerConfig, Settings};

pub use websocket::{Broadcaster, ConnectionRegistry, QueueSender, RelayMessage};

/// Health check endpoint handler
/// Returns server status, timestamp and the number of live connections
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "connections": state.registry.len().await,
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub registry: Arc<ConnectionRegistry>,
    pub queue: QueueSender,
}

impl AppState {
    /// Builds the registry and broadcast queue. The returned broadcaster
    /// must be spawned for anything to be relayed.
    pub fn new(config: Settings) -> (Self, Broadcaster) {
        let registry = Arc::new(ConnectionRegistry::new());
        let (queue, rx) = websocket::broadcast_queue(config.broadcast.queue_capacity);
        let broadcaster = Broadcaster::new(registry.clone(), rx);

        let state = Self {
            config: Arc::new(config),
            registry,
            queue,
        };
        (state, broadcaster)
    }
}

/// Health, the upgrade path, and the static file server for everything else.
pub fn configure_routes(cfg: &mut web::ServiceConfig, server: &ServerConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route(&server.ws_path, web::get().to(websocket::websocket_route))
        .service(Files::new("/", &server.static_dir).index_file(server.index_file.clone()));
}

pub fn cors(config: &CorsConfig) -> Cors {
    let cors = if config.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
    } else {
        config
            .allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "OPTIONS"])
            .allow_any_header()
    };

    cors.max_age(config.max_age as usize)
}
