//! API token authentication.
//!
//! Every request outside the bypass list must carry a token in one of the
//! accepted header aliases. The static configured token is checked first,
//! then issued tokens in the `api_tokens` table. An empty configured token
//! disables authentication entirely.

use super::{Middleware, MiddlewareDecision};
use crate::config::Config;
use crate::repositories::token_repository::TokenRepository;
use crate::router::context::{RequestContext, Response};
use crate::utils::crypto::{Codec, encrypt_response};
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;
use std::collections::HashMap;
use tracing::error;

/// Header aliases checked for the API token, in priority order. The
/// `authorization` value may carry a `Bearer ` prefix.
pub const TOKEN_HEADER_ALIASES: [&str; 5] =
    ["x-api-token", "x-api-key", "authorization", "api-token", "api-key"];

/// Extracts the API token from the request headers, stripping a `Bearer `
/// prefix when present.
pub fn token_from_headers(headers: &HashMap<String, String>) -> Option<String> {
    for alias in TOKEN_HEADER_ALIASES {
        if let Some(value) = headers.get(alias) {
            let token = match value.get(..7) {
                Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => &value[7..],
                _ => value.as_str(),
            };
            return Some(token.to_string());
        }
    }
    None
}

pub struct AuthMiddleware {
    api_token: String,
    bypass_routes: Vec<String>,
}

impl AuthMiddleware {
    pub fn new(config: &Config) -> Self {
        let prefix = format!("/api/{}", config.api_version);

        let mut bypass_routes = vec![
            "/health".to_string(),
            format!("{prefix}/health"),
            format!("{prefix}/auth/token"),
            format!("{prefix}/auth/refresh"),
            format!("{prefix}/auth/organizer-id"),
            format!("{prefix}/auth/decrypt"),
            format!("{prefix}/organizers/login"),
        ];
        bypass_routes.extend(config.auth_bypass_routes.iter().cloned());

        AuthMiddleware {
            api_token: config.api_token.clone(),
            bypass_routes,
        }
    }

    /// Bypass entries match exactly or as a path prefix.
    fn should_bypass(&self, path: &str) -> bool {
        self.bypass_routes
            .iter()
            .any(|bypass| path == bypass || path.starts_with(bypass.as_str()))
    }

    fn unauthorized(codec: Option<&Codec>) -> Response {
        let error_data = json!({
            "error": "Unauthorized",
            "message": "Invalid or missing API token",
            "code": "UNAUTHORIZED",
            "status_code": 401,
        });

        let body = match codec {
            Some(codec) => encrypt_response(Some(codec), &error_data),
            // No codec available: plaintext fallback.
            None => json!({
                "success": false,
                "error": "Unauthorized",
                "message": "Invalid or missing API token",
                "code": "UNAUTHORIZED",
                "status_code": 401,
            }),
        };

        Response::json(StatusCode::UNAUTHORIZED, body)
    }
}

#[async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(&self, ctx: &RequestContext) -> MiddlewareDecision {
        if self.api_token.is_empty() {
            return MiddlewareDecision::Continue(Vec::new());
        }

        if self.should_bypass(&ctx.path) {
            return MiddlewareDecision::Continue(Vec::new());
        }

        let Some(token) = token_from_headers(ctx.headers()) else {
            return MiddlewareDecision::Halt(Self::unauthorized(ctx.codec()));
        };

        if token == self.api_token {
            return MiddlewareDecision::Continue(Vec::new());
        }

        let repository = TokenRepository::new(ctx.pool());
        match repository.find_by_access_token(&token).await {
            Ok(Some(_)) => MiddlewareDecision::Continue(Vec::new()),
            Ok(None) => MiddlewareDecision::Halt(Self::unauthorized(ctx.codec())),
            Err(e) => {
                error!(error = %e, "token validation failed");
                MiddlewareDecision::Halt(Self::unauthorized(ctx.codec()))
            }
        }
    }
}
