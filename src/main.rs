use actix_web::{middleware::Condition, web, App, HttpServer};
use dotenv::dotenv;
use signaling_relay::{configure_routes, cors, AppError, AppState, Settings};
use std::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> signaling_relay::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    let (state, broadcaster) = AppState::new(config.clone());
    let state = web::Data::new(state);

    tokio::spawn(broadcaster.run());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).map_err(|e| {
        error!("Error starting server on {}: {}", addr, e);
        AppError::BindError(e.to_string())
    })?;

    info!("Server started on {}", addr);
    info!("Relay accepting connections at ws://{}{}", addr, config.server.ws_path);
    info!("Serving static files from {}", config.server.static_dir);

    let workers = config.server.workers as usize;

    HttpServer::new(move || {
        App::new()
            .wrap(Condition::new(config.cors.enabled, cors(&config.cors)))
            .app_data(state.clone())
            .configure(|cfg| configure_routes(cfg, &config.server))
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
