//! Main entry point for the organizer API backend.
//!
//! Axum provides the HTTP transport; every request funnels through a single
//! fallback handler into the application's own router, which owns path
//! normalization, middleware, and route matching.

mod api;
mod config;
mod database;
mod errors;
mod middleware;
mod repositories;
mod router;
mod utils;

use crate::router::Router as ApiRouter;
use crate::router::context::AppState;
use crate::utils::crypto::Codec;
use axum::extract::{Request, State};
use axum::response::IntoResponse;
use config::Config;
use database::Database;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::fmt::init;

/// Upper bound on buffered request bodies.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
struct ServerState {
    app: Arc<AppState>,
    router: Arc<ApiRouter>,
}

#[tokio::main]
async fn main() {
    init();

    let config = Config::from_env().unwrap();
    let db = Database::new(&config).await.unwrap();
    let pool = db.pool().clone();

    let codec = match Codec::new(&config) {
        Ok(codec) => Some(codec),
        Err(e) => {
            warn!(error = %e, "encryption disabled; responses will use the failure envelope");
            None
        }
    };

    // Lapsed token pairs accumulate between restarts; sweep them on boot.
    if let Err(e) = repositories::token_repository::TokenRepository::new(&pool)
        .cleanup_expired_tokens()
        .await
    {
        warn!(error = %e, "expired token cleanup failed");
    }

    let router = Arc::new(api::build_router(&config).unwrap());
    let app_state = Arc::new(AppState {
        pool,
        config: config.clone(),
        codec,
    });

    let app = axum::Router::new()
        .fallback(dispatch)
        .with_state(ServerState {
            app: app_state,
            router,
        });

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();

    info!("Starting organizer API server on port {}", config.server_port);
    axum::serve(listener, app).await.unwrap();
}

/// Bridges one HTTP request into the application router.
async fn dispatch(State(server): State<ServerState>, request: Request) -> impl IntoResponse {
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or("").to_string();

    let mut headers = HashMap::new();
    for (name, value) in request.headers() {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str().to_string(), value.to_string());
        }
    }

    let body = match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes.to_vec(),
        Err(_) => Vec::new(),
    };

    server
        .router
        .dispatch(server.app.clone(), &method, &path, &query, headers, body)
        .await
}
