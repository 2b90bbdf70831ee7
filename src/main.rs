use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

mod config;
mod error;
mod logging;
mod routes;
mod services;

use services::session::ImportSession;
use services::submitter::BusinessApiClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::Config::new()?;

    // Build our application state
    let state = Arc::new(AppState::new(config));

    // Build our application with a route
    let app = Router::new()
        .merge(routes::routes())
        .merge(routes::imports::routes())
        .with_state(state);

    // Run it
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Application state
pub struct AppState {
    pub config: config::Config,
    pub api: BusinessApiClient,
    pub session: RwLock<ImportSession>,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        let api = BusinessApiClient::new(&config.business_api_url);
        Self {
            config,
            api,
            session: RwLock::new(ImportSession::default()),
        }
    }
}
