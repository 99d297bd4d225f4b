use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use board_server::session::SessionConfig;
use board_server::store::{InMemoryStore, Seed};
use board_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load the timetable seed; an empty store still serves (blank
    // boards) so a missing file is a warning, not a crash.
    let store = match std::env::var("BOARDS_SEED") {
        Ok(path) => match std::fs::read_to_string(&path) {
            Ok(json) => match Seed::from_json(&json) {
                Ok(seed) => {
                    info!(path = %path, "loaded timetable seed");
                    InMemoryStore::from_seed(seed)
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "seed file rejected, starting empty");
                    InMemoryStore::new()
                }
            },
            Err(e) => {
                warn!(path = %path, error = %e, "seed file unreadable, starting empty");
                InMemoryStore::new()
            }
        },
        Err(_) => {
            warn!("BOARDS_SEED not set, starting with an empty timetable");
            InMemoryStore::new()
        }
    };

    let state = AppState::new(Arc::new(store), SessionConfig::default());
    let app = create_router(state);

    let addr = std::env::var("BOARDS_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listen address");
    info!(%addr, "departure board server listening");

    axum::serve(listener, app).await.expect("server error");
}
