//! CORS headers and preflight handling.

use super::{Middleware, MiddlewareDecision};
use crate::config::Config;
use crate::router::context::{RequestContext, Response};
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;

pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
}

impl CorsMiddleware {
    pub fn new(config: &Config) -> Self {
        CorsMiddleware {
            allowed_origins: config.cors_allowed_origins.clone(),
        }
    }
}

#[async_trait]
impl Middleware for CorsMiddleware {
    async fn handle(&self, ctx: &RequestContext) -> MiddlewareDecision {
        let mut headers = Vec::new();

        let origin = ctx.header("origin").unwrap_or("");
        if self.allowed_origins.iter().any(|allowed| allowed == origin) {
            headers.push(("Access-Control-Allow-Origin".to_string(), origin.to_string()));
        } else if let Some(first) = self.allowed_origins.first() {
            headers.push(("Access-Control-Allow-Origin".to_string(), first.clone()));
        }

        headers.push((
            "Access-Control-Allow-Methods".to_string(),
            "GET, POST, PUT, DELETE, OPTIONS, PATCH".to_string(),
        ));
        headers.push((
            "Access-Control-Allow-Headers".to_string(),
            "Content-Type, Authorization, X-Requested-With, X-API-TOKEN, X-API-KEY, API-TOKEN, API-KEY"
                .to_string(),
        ));
        headers.push((
            "Access-Control-Allow-Credentials".to_string(),
            "true".to_string(),
        ));
        headers.push(("Access-Control-Max-Age".to_string(), "86400".to_string()));

        if ctx.method == "OPTIONS" {
            let mut response = Response::json(StatusCode::OK, Value::Null);
            response.headers = headers;
            return MiddlewareDecision::Halt(response);
        }

        MiddlewareDecision::Continue(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::context::test_state;
    use std::collections::HashMap;

    fn ctx(method: &str, origin: Option<&str>) -> RequestContext {
        let mut headers = HashMap::new();
        if let Some(origin) = origin {
            headers.insert("origin".to_string(), origin.to_string());
        }
        RequestContext::new(
            test_state(Config::default()),
            method.to_string(),
            "/".to_string(),
            "",
            headers,
            Vec::new(),
        )
    }

    fn cors(origins: &[&str]) -> CorsMiddleware {
        let config = Config {
            cors_allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
            ..Config::default()
        };
        CorsMiddleware::new(&config)
    }

    fn header_value(headers: &[(String, String)], name: &str) -> Option<String> {
        headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    #[tokio::test]
    async fn test_known_origin_echoed() {
        let middleware = cors(&["https://a.example", "https://b.example"]);
        let decision = middleware.handle(&ctx("GET", Some("https://b.example"))).await;

        let MiddlewareDecision::Continue(headers) = decision else {
            panic!("expected Continue");
        };
        assert_eq!(
            header_value(&headers, "Access-Control-Allow-Origin").as_deref(),
            Some("https://b.example")
        );
    }

    #[tokio::test]
    async fn test_unknown_origin_falls_back_to_first() {
        let middleware = cors(&["https://a.example"]);
        let decision = middleware.handle(&ctx("GET", Some("https://evil.example"))).await;

        let MiddlewareDecision::Continue(headers) = decision else {
            panic!("expected Continue");
        };
        assert_eq!(
            header_value(&headers, "Access-Control-Allow-Origin").as_deref(),
            Some("https://a.example")
        );
    }

    #[tokio::test]
    async fn test_preflight_halts_with_ok() {
        let middleware = cors(&["https://a.example"]);
        let decision = middleware.handle(&ctx("OPTIONS", None)).await;

        let MiddlewareDecision::Halt(response) = decision else {
            panic!("expected Halt");
        };
        assert_eq!(response.status, StatusCode::OK);
        assert!(
            header_value(&response.headers, "Access-Control-Allow-Methods")
                .is_some_and(|v| v.contains("PATCH"))
        );
    }
}
