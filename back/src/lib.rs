pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod store;
pub mod v1;

use std::sync::Arc;

use axum::Router;
use rusqlite::Connection;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// Shared request state. Every request holds the connection lock for the
/// duration of its statements, so each one sees and leaves a consistent store.
#[derive(Debug)]
pub struct AppState {
    pub db: Mutex<Connection>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // v1 is the only API version and is served at the bare `/api` prefix
        .nest("/api", v1::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
