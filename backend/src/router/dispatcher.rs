//! Request dispatch: path normalization, the middleware chain and the
//! structured 404 body.

use super::Router;
use crate::api::common::service_error_to_response;
use crate::middleware::MiddlewareDecision;
use crate::router::context::{AppState, RequestContext, Response};
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

impl Router {
    /// Derives the deployment base path from the configured script path.
    ///
    /// The script path is the server-relative path of the front controller,
    /// e.g. `/app/public/index.php`. Its directory is the base; a directory
    /// named `public` is a document root, so its parent is used instead.
    /// Root-level deployments yield an empty base.
    pub fn base_path(script_path: &str) -> String {
        if script_path.is_empty() {
            return String::new();
        }

        let script_dir = dirname(script_path);
        if script_dir == "/" || script_dir == "\\" || script_dir == "." {
            return String::new();
        }

        if basename(&script_dir) == "public" {
            return dirname(&script_dir);
        }

        script_dir.trim_end_matches('/').to_string()
    }

    /// Normalizes a raw request path into the canonical route form: the base
    /// path and any leading `/public` segment are stripped, a leading slash
    /// is guaranteed and trailing slashes are dropped (except for the root).
    pub fn normalize_path(raw_path: &str, script_path: &str) -> String {
        let mut path = raw_path;

        let base = Self::base_path(script_path);
        if !base.is_empty() && base != "/" && path.starts_with(base.as_str()) {
            path = &path[base.len()..];
        }

        if path.starts_with("/public") {
            path = &path["/public".len()..];
        }

        let with_slash = format!("/{}", path.trim_start_matches('/'));
        let trimmed = with_slash.trim_end_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Runs one request through the middleware chain and route table.
    ///
    /// Middleware run in order; each contributes response headers or halts
    /// with its own response. Headers gathered before a halt are still
    /// attached. A matched handler's error is converted to the standard
    /// error envelope; no match produces the structured 404.
    pub async fn dispatch(
        &self,
        state: Arc<AppState>,
        method: &str,
        raw_path: &str,
        query: &str,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Response {
        let method = method.to_uppercase();
        let path = Self::normalize_path(raw_path, &state.config.script_path);
        debug!(%method, %path, "dispatching request");

        let mut ctx = RequestContext::new(
            state.clone(),
            method.clone(),
            path.clone(),
            query,
            headers,
            body,
        );

        let mut collected_headers: Vec<(String, String)> = Vec::new();
        for middleware in &self.middleware {
            match middleware.handle(&ctx).await {
                MiddlewareDecision::Continue(headers) => collected_headers.extend(headers),
                MiddlewareDecision::Halt(mut response) => {
                    response.prepend_headers(collected_headers);
                    return response;
                }
            }
        }

        if let Some((index, params)) = self.find_route(&method, &path) {
            ctx.merge_params(params);
            let handler = self.routes[index].handler.clone();

            let mut response = match handler(ctx).await {
                Ok(response) => response,
                Err(err) => service_error_to_response(state.codec.as_ref(), err),
            };
            response.prepend_headers(collected_headers);
            return response;
        }

        let mut response = self.not_found(&method, &path);
        response.prepend_headers(collected_headers);
        response
    }

    fn not_found(&self, method: &str, path: &str) -> Response {
        let available = self.patterns_for_method(method);

        let (available_routes, suggestion) = if available.is_empty() {
            (Value::Null, "Visit / for API endpoint information")
        } else {
            (
                json!(available),
                "Check available routes above or visit / for API information",
            )
        };

        Response::pretty_json(
            StatusCode::NOT_FOUND,
            json!({
                "success": false,
                "error": "Route not found",
                "message": format!(
                    "The requested route '{} {}' was not found on this server.",
                    method, path
                ),
                "request": {
                    "method": method,
                    "path": path,
                },
                "status_code": 404,
                "code": "ROUTE_NOT_FOUND",
                "available_routes": available_routes,
                "suggestion": suggestion,
                "timestamp": Utc::now().timestamp(),
            }),
        )
    }
}

fn dirname(path: &str) -> String {
    match path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(index) => path[..index].to_string(),
        None => ".".to_string(),
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::errors::ServiceResult;
    use crate::router::context::test_state;

    async fn ok(_ctx: RequestContext) -> ServiceResult<Response> {
        Ok(Response::json(StatusCode::OK, json!({"ok": true})))
    }

    #[test]
    fn test_base_path_cases() {
        assert_eq!(Router::base_path(""), "");
        assert_eq!(Router::base_path("/index.php"), "");
        assert_eq!(Router::base_path("/app/index.php"), "/app");
        // A `public` document root maps back to its parent.
        assert_eq!(Router::base_path("/app/public/index.php"), "/app");
        assert_eq!(Router::base_path("/public/index.php"), "/");
    }

    #[test]
    fn test_normalize_path_strips_base_and_public() {
        assert_eq!(
            Router::normalize_path("/app/public/api/v1/events", "/app/public/index.php"),
            "/api/v1/events"
        );
        assert_eq!(
            Router::normalize_path("/public/api/v1/events", ""),
            "/api/v1/events"
        );
        assert_eq!(Router::normalize_path("/api/v1/events/", ""), "/api/v1/events");
        assert_eq!(Router::normalize_path("", ""), "/");
        assert_eq!(Router::normalize_path("/", ""), "/");
    }

    #[test]
    fn test_normalize_path_without_base_prefix() {
        // Requests that do not carry the base prefix pass through untouched.
        assert_eq!(
            Router::normalize_path("/api/v1/events", "/app/index.php"),
            "/api/v1/events"
        );
    }

    #[tokio::test]
    async fn test_dispatch_matches_route() {
        let mut router = Router::new();
        router.get("/api/v1/events", ok).unwrap();

        let response = router
            .dispatch(
                test_state(Config::default()),
                "get",
                "/api/v1/events",
                "",
                HashMap::new(),
                Vec::new(),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["ok"], true);
    }

    #[tokio::test]
    async fn test_dispatch_not_found_shape() {
        let mut router = Router::new();
        router.delete("/api/v1/things/{id}", ok).unwrap();

        let response = router
            .dispatch(
                test_state(Config::default()),
                "DELETE",
                "/unknown",
                "",
                HashMap::new(),
                Vec::new(),
            )
            .await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.pretty);

        let body = &response.body;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Route not found");
        assert_eq!(
            body["message"],
            "The requested route 'DELETE /unknown' was not found on this server."
        );
        assert_eq!(body["request"]["method"], "DELETE");
        assert_eq!(body["request"]["path"], "/unknown");
        assert_eq!(body["status_code"], 404);
        assert_eq!(body["code"], "ROUTE_NOT_FOUND");
        assert_eq!(body["available_routes"], json!(["DELETE /api/v1/things/{id}"]));
        assert_eq!(
            body["suggestion"],
            "Check available routes above or visit / for API information"
        );
        assert!(body["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn test_dispatch_not_found_without_method_routes() {
        let mut router = Router::new();
        router.get("/only-get", ok).unwrap();

        let response = router
            .dispatch(
                test_state(Config::default()),
                "PATCH",
                "/only-get",
                "",
                HashMap::new(),
                Vec::new(),
            )
            .await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["available_routes"], Value::Null);
        assert_eq!(
            response.body["suggestion"],
            "Visit / for API endpoint information"
        );
    }

    #[tokio::test]
    async fn test_dispatch_normalizes_deployment_prefix() {
        let mut router = Router::new();
        router.get("/api/v1/events", ok).unwrap();

        let config = Config {
            script_path: "/app/public/index.php".to_string(),
            ..Config::default()
        };

        let response = router
            .dispatch(
                test_state(config),
                "GET",
                "/app/public/api/v1/events",
                "",
                HashMap::new(),
                Vec::new(),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
    }
}
