//! HTTP API surface: route registration and shared response envelopes.

pub mod auth;
pub mod common;
pub mod event;
pub mod health;
pub mod organizer;

use crate::config::Config;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::cors::CorsMiddleware;
use crate::router::Router;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Builds the full route table and middleware chain. Registration happens
/// once at startup; a malformed pattern is a boot failure, not a request
/// failure.
pub fn build_router(config: &Config) -> Result<Router> {
    let mut router = Router::new();

    router.middleware(Arc::new(CorsMiddleware::new(config)));
    router.middleware(Arc::new(AuthMiddleware::new(config)));

    let prefix = format!("/api/{}", config.api_version);

    health::routes::register(&mut router).context("failed to register health routes")?;
    auth::routes::register(&mut router, &prefix).context("failed to register auth routes")?;
    event::routes::register(&mut router, &prefix).context("failed to register event routes")?;
    organizer::routes::register(&mut router, &prefix)
        .context("failed to register organizer routes")?;

    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_router_registers_full_surface() {
        let router = build_router(&Config::default()).unwrap();

        for (method, path) in [
            ("GET", "/health"),
            ("POST", "/api/v1/auth/token"),
            ("POST", "/api/v1/auth/refresh"),
            ("POST", "/api/v1/auth/organizer-id"),
            ("POST", "/api/v1/auth/decrypt"),
            ("GET", "/api/v1/organizers/tok/events"),
            ("GET", "/api/v1/organizers/tok/events/5"),
            ("POST", "/api/v1/organizers/tok/events"),
            ("PUT", "/api/v1/organizers/tok/events/5"),
            ("DELETE", "/api/v1/organizers/tok/events/5"),
            ("GET", "/api/v1/organizers/tok/events/status/active"),
            ("GET", "/api/v1/organizers"),
            ("GET", "/api/v1/organizers/5"),
            ("POST", "/api/v1/organizers"),
            ("PUT", "/api/v1/organizers/5"),
            ("DELETE", "/api/v1/organizers/5"),
            ("POST", "/api/v1/organizers/login"),
        ] {
            assert!(
                router.find_route(method, path).is_some(),
                "missing route {method} {path}"
            );
        }
    }

    #[test]
    fn test_status_route_not_shadowed_by_show() {
        let router = build_router(&Config::default()).unwrap();

        let (_, params) = router
            .find_route("GET", "/api/v1/organizers/enc-token/events/status/draft")
            .unwrap();
        assert_eq!(params.get("status").map(String::as_str), Some("draft"));
        assert!(params.get("id").is_none());
    }
}
