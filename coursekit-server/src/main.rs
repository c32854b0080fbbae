//! CourseKit platform server
//!
//! Identity resolution, OTP login, stateless sessions, and
//! enrollment-gated lesson progress for the online-course platform.

use std::sync::Arc;

use anyhow::Result;
use coursekit_core::SessionIssuer;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursekit_server::{
    routes, AppState, Config, ConsoleNotificationSender, MemoryStore, SqliteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursekit_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(
        port = config.port,
        database = ?config.database_path,
        "Loaded configuration"
    );

    let sessions = SessionIssuer::new(&config.token_secret);
    let sender = Arc::new(ConsoleNotificationSender::new());

    // Pick the storage backend
    let app = match &config.database_path {
        Some(path) => {
            let store = Arc::new(SqliteStore::open(path)?);
            tracing::info!(path = %path, "Using SQLite store");
            routes::create_router(Arc::new(AppState::new(store, sender, sessions)))
        }
        None => {
            tracing::warn!("DATABASE_PATH not set; state will not survive a restart");
            let store = Arc::new(MemoryStore::new());
            routes::create_router(Arc::new(AppState::new(store, sender, sessions)))
        }
    };

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("CourseKit listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
