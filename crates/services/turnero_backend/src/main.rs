// File: services/turnero_backend/src/main.rs
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use turnero_backend::AppState;
use turnero_config::load_config;

#[tokio::main]
async fn main() -> ExitCode {
    // Optional file logging; the guard must outlive the server.
    let _log_guard = match std::env::var("TURNERO_LOG_DIR") {
        Ok(dir) => Some(turnero_common::init_with_file(&PathBuf::from(dir), Level::INFO)),
        Err(_) => {
            turnero_common::init();
            None
        }
    };

    let config = match load_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(config.clone()) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let app = state.router();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };
    info!("Starting server at http://{}", addr);
    info!("Public origin: {}", config.server.origin());

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
