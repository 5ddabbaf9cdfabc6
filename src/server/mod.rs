//! HTTP surface: the JSON API under `/api`, login-gated pages and static
//! assets, all over the same SQLite file.

pub mod api;
pub mod auth;
pub mod error;
pub mod pages;

use crate::storage::SqliteStore;
use crate::Config;
use axum::{middleware, Router};
use error::{ApiError, ApiResult};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub type SharedState = Arc<AppState>;

/// Server state
pub struct AppState {
    pub config: Config,
    /// Tokens of logged-in browser sessions
    pub sessions: RwLock<HashSet<String>>,
    pub templates: minijinja::Environment<'static>,
}

impl AppState {
    pub fn new(config: Config) -> crate::Result<Self> {
        let templates = pages::templates()
            .map_err(|e| crate::Error::Config(format!("page templates: {e}")))?;
        Ok(Self { config, sessions: RwLock::new(HashSet::new()), templates })
    }

    /// Run `f` against a fresh connection on a blocking thread.
    pub async fn with_store<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&SqliteStore) -> crate::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.config.database.clone();
        let prefix = self.config.db_prefix.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let store = SqliteStore::open_with_prefix(&path, &prefix)?;
            f(&store)
        })
        .await
        .map_err(|e| ApiError::internal(format!("database task failed: {e}")))?;
        Ok(joined?)
    }
}

/// Build the full application router.
pub fn build_router(state: SharedState) -> Router {
    let gated = pages::router().route_layer(middleware::from_fn_with_state(state.clone(), auth::require_login));

    Router::new()
        .merge(gated)
        .merge(auth::router())
        .merge(api::router())
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting server on {}", addr);
    crate::ui::status(crate::ui::Icons::GLOBE, "Server running at", &format!("http://{addr}"));

    axum::serve(listener, app).await?;
    Ok(())
}
