mod error;
mod extractors;
mod handlers;
mod routes;
pub mod security;
mod state;

pub use error::{AppError, AppResult, HttpError};
pub use extractors::{AdminContext, SESSION_COOKIE};
pub use state::AppState;

use crate::services::thumbnails::PUBLIC_PREFIX;
use crate::{Config, Database};
use anyhow::Result;
use axum::middleware;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// The full application: public site, admin backend and uploaded files.
pub fn build_router(state: Arc<AppState>) -> Router {
    let storage = ServeDir::new(&state.config.media.upload_dir);
    let max_thumbnail_bytes = state.config.media.max_thumbnail_bytes();

    Router::new()
        .merge(routes::public_routes())
        .merge(routes::auth_routes())
        .merge(routes::admin_routes(max_thumbnail_bytes))
        .nest_service(&format!("/{}", PUBLIC_PREFIX), storage)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(middleware::from_fn(security::apply_security_headers)),
        )
        .with_state(state)
}

pub async fn serve(config: Config, db: Database, addr: &str) -> Result<()> {
    let state = Arc::new(AppState::new(config, db));
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
