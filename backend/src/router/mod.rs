//! Hand-rolled route table and path matcher.
//!
//! Routes are `(method, pattern, handler)` triples registered at startup and
//! immutable afterwards. Patterns are path templates with `{name}`
//! placeholders; matching walks the table in registration order and the first
//! method+pattern hit wins, so duplicate registrations are legal and the
//! earliest one shadows the rest.
//!
//! Placeholders normally match one path segment (`[^/?#]+`). The
//! `{organizer_id}` placeholder is special: its value is URL-safe-encoded
//! ciphertext that may percent-encode to something containing `/`, so it
//! matches `[^?]+` and relies on the anchored literal suffix plus regex
//! backtracking to find its end. Only one such relaxed placeholder is
//! allowed per pattern; that and duplicate names are rejected at
//! registration time.

pub mod context;
pub mod dispatcher;

use crate::errors::ServiceResult;
use crate::middleware::Middleware;
use crate::utils::url_decode;
use context::{RequestContext, Response};
use futures::future::BoxFuture;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// The placeholder whose capture is relaxed to allow `/` inside the value.
const RELAXED_PARAM: &str = "organizer_id";

pub type HandlerFuture = BoxFuture<'static, ServiceResult<Response>>;

/// A route handler: a typed closure captured at registration time. There is
/// no string-based indirection, so a dangling handler reference cannot exist.
pub type Handler = Arc<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route pattern '{pattern}' declares parameter '{name}' more than once")]
    DuplicateParam { pattern: String, name: String },
    #[error("route pattern '{pattern}' failed to compile: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    kind: PatternKind,
}

#[derive(Debug, Clone)]
enum PatternKind {
    /// No placeholders; requires exact string equality.
    Literal(String),
    Dynamic {
        regex: Regex,
        param_names: Vec<String>,
    },
}

impl PathPattern {
    /// Compiles a path template. Trailing slashes are insignificant (the
    /// root pattern normalizes to `/`).
    pub fn compile(pattern: &str) -> Result<Self, RouteError> {
        let trimmed = trim_trailing_slash(pattern);

        if !trimmed.contains('{') {
            return Ok(PathPattern {
                raw: pattern.to_string(),
                kind: PatternKind::Literal(trimmed),
            });
        }

        let placeholder = Regex::new(r"\{([a-zA-Z0-9_]+)\}").map_err(|e| {
            RouteError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            }
        })?;

        let mut param_names = Vec::new();
        let mut regex_source = String::from("^");
        let mut last_end = 0;

        for capture in placeholder.captures_iter(&trimmed) {
            let whole = capture.get(0).ok_or_else(|| RouteError::InvalidPattern {
                pattern: pattern.to_string(),
                message: "empty placeholder capture".to_string(),
            })?;
            let name = capture[1].to_string();

            if param_names.contains(&name) {
                return Err(RouteError::DuplicateParam {
                    pattern: pattern.to_string(),
                    name,
                });
            }

            regex_source.push_str(&regex::escape(&trimmed[last_end..whole.start()]));
            if name == RELAXED_PARAM {
                regex_source.push_str("([^?]+)");
            } else {
                regex_source.push_str("([^/?#]+)");
            }
            last_end = whole.end();
            param_names.push(name);
        }

        regex_source.push_str(&regex::escape(&trimmed[last_end..]));
        regex_source.push('$');

        let regex = Regex::new(&regex_source).map_err(|e| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        Ok(PathPattern {
            raw: pattern.to_string(),
            kind: PatternKind::Dynamic { regex, param_names },
        })
    }

    /// Matches a normalized path and extracts percent-decoded parameter
    /// values, assigned in the order the names appear in the template.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let path = trim_trailing_slash(path);

        match &self.kind {
            PatternKind::Literal(literal) => (*literal == path).then(HashMap::new),
            PatternKind::Dynamic { regex, param_names } => {
                let captures = regex.captures(&path)?;
                let mut params = HashMap::new();
                for (index, name) in param_names.iter().enumerate() {
                    if let Some(value) = captures.get(index + 1) {
                        params.insert(name.clone(), url_decode(value.as_str()));
                    }
                }
                Some(params)
            }
        }
    }

    /// The original template string this pattern was compiled from.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

fn trim_trailing_slash(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

pub struct Route {
    pub(crate) method: String,
    pub(crate) pattern: PathPattern,
    pub(crate) handler: Handler,
}

/// The application route table plus its linear middleware chain.
#[derive(Default)]
pub struct Router {
    pub(crate) routes: Vec<Route>,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
}

impl Router {
    pub fn new() -> Self {
        Router {
            routes: Vec::new(),
            middleware: Vec::new(),
        }
    }

    /// Registers a route. The method is normalized to uppercase; duplicate
    /// method+pattern pairs are stored as-is and the earliest wins.
    pub fn add_route(
        &mut self,
        method: &str,
        pattern: &str,
        handler: Handler,
    ) -> Result<(), RouteError> {
        let compiled = PathPattern::compile(pattern)?;
        self.routes.push(Route {
            method: method.to_uppercase(),
            pattern: compiled,
            handler,
        });
        Ok(())
    }

    pub fn get<H, Fut>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ServiceResult<Response>> + Send + 'static,
    {
        self.add_route("GET", pattern, wrap(handler))
    }

    pub fn post<H, Fut>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ServiceResult<Response>> + Send + 'static,
    {
        self.add_route("POST", pattern, wrap(handler))
    }

    pub fn put<H, Fut>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ServiceResult<Response>> + Send + 'static,
    {
        self.add_route("PUT", pattern, wrap(handler))
    }

    pub fn delete<H, Fut>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ServiceResult<Response>> + Send + 'static,
    {
        self.add_route("DELETE", pattern, wrap(handler))
    }

    pub fn patch<H, Fut>(&mut self, pattern: &str, handler: H) -> Result<(), RouteError>
    where
        H: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ServiceResult<Response>> + Send + 'static,
    {
        self.add_route("PATCH", pattern, wrap(handler))
    }

    /// Appends a middleware to the chain. Middleware run in registration
    /// order and may terminate the request.
    pub fn middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    /// Finds the first route matching the method and normalized path,
    /// returning its index and extracted parameters.
    pub fn find_route(&self, method: &str, path: &str) -> Option<(usize, HashMap<String, String>)> {
        for (index, route) in self.routes.iter().enumerate() {
            if route.method != method {
                continue;
            }
            if let Some(params) = route.pattern.matches(path) {
                return Some((index, params));
            }
        }
        None
    }

    /// Lists `"METHOD pattern"` strings for all routes registered under the
    /// given method. Used by the structured 404 body.
    pub fn patterns_for_method(&self, method: &str) -> Vec<String> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .map(|route| format!("{} {}", route.method, route.pattern.raw()))
            .collect()
    }
}

fn wrap<H, Fut>(handler: H) -> Handler
where
    H: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ServiceResult<Response>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(handler(ctx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::Value;

    async fn noop(_ctx: RequestContext) -> ServiceResult<Response> {
        Ok(Response::json(StatusCode::OK, Value::Null))
    }

    #[test]
    fn test_literal_pattern_exact_match() {
        let pattern = PathPattern::compile("/health").unwrap();
        assert!(pattern.matches("/health").is_some());
        assert!(pattern.matches("/health/").is_some());
        assert!(pattern.matches("/healthz").is_none());
        assert!(pattern.matches("/health/extra").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::compile("/").unwrap();
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/x").is_none());
    }

    #[test]
    fn test_single_param_extraction() {
        let pattern = PathPattern::compile("/example/{id}").unwrap();

        let params = pattern.matches("/example/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));

        assert!(pattern.matches("/example/42/extra").is_none());
        assert!(pattern.matches("/example").is_none());
    }

    #[test]
    fn test_standard_param_rejects_slash() {
        let pattern = PathPattern::compile("/example/{id}").unwrap();
        assert!(pattern.matches("/example/a/b").is_none());
    }

    #[test]
    fn test_relaxed_organizer_param_allows_encoded_slash() {
        let pattern = PathPattern::compile("/organizers/{organizer_id}/events").unwrap();

        let params = pattern.matches("/organizers/abcXYZ_123-%2F/events").unwrap();
        assert_eq!(
            params.get("organizer_id").map(String::as_str),
            Some("abcXYZ_123-/")
        );
    }

    #[test]
    fn test_relaxed_param_bounded_by_literal_suffix() {
        // The relaxed capture is greedy across '/'; anchoring plus the
        // literal suffix must still bound it correctly.
        let pattern = PathPattern::compile("/organizers/{organizer_id}/events/{id}").unwrap();

        let params = pattern.matches("/organizers/tok-en_1/events/9").unwrap();
        assert_eq!(params.get("organizer_id").map(String::as_str), Some("tok-en_1"));
        assert_eq!(params.get("id").map(String::as_str), Some("9"));
    }

    #[test]
    fn test_events_id_route_does_not_swallow_status_route() {
        // `{id}` cannot span '/' and backtracking cannot stretch the relaxed
        // capture over the '/events/' literal, so a status path falls through.
        let pattern = PathPattern::compile("/organizers/{organizer_id}/events/{id}").unwrap();
        assert!(pattern.matches("/organizers/tok/events/status/active").is_none());

        let status = PathPattern::compile("/organizers/{organizer_id}/events/status/{status}")
            .unwrap();
        let params = status
            .matches("/organizers/tok/events/status/active")
            .unwrap();
        assert_eq!(params.get("status").map(String::as_str), Some("active"));
    }

    #[test]
    fn test_param_order_follows_template() {
        let pattern = PathPattern::compile("/a/{first}/b/{second}").unwrap();
        let params = pattern.matches("/a/one/b/two").unwrap();
        assert_eq!(params.get("first").map(String::as_str), Some("one"));
        assert_eq!(params.get("second").map(String::as_str), Some("two"));
    }

    #[test]
    fn test_duplicate_param_rejected() {
        let result = PathPattern::compile("/organizers/{organizer_id}/x/{organizer_id}");
        assert!(matches!(result, Err(RouteError::DuplicateParam { .. })));

        let result = PathPattern::compile("/a/{id}/b/{id}");
        assert!(matches!(result, Err(RouteError::DuplicateParam { .. })));
    }

    #[test]
    fn test_first_registration_wins_over_later_pattern() {
        let mut router = Router::new();
        router.get("/test", noop).unwrap();
        router.get("/{anything}", noop).unwrap();

        // Both structurally match; the earlier literal registration wins.
        let (index, params) = router.find_route("GET", "/test").unwrap();
        assert_eq!(index, 0);
        assert!(params.is_empty());

        let (index, params) = router.find_route("GET", "/other").unwrap();
        assert_eq!(index, 1);
        assert_eq!(params.get("anything").map(String::as_str), Some("other"));
    }

    #[test]
    fn test_method_mismatch_skips_route() {
        let mut router = Router::new();
        router.get("/thing", noop).unwrap();

        assert!(router.find_route("DELETE", "/thing").is_none());
    }

    #[test]
    fn test_patterns_for_method_filters() {
        let mut router = Router::new();
        router.get("/a", noop).unwrap();
        router.delete("/b", noop).unwrap();
        router.delete("/c/{id}", noop).unwrap();
        router.patch("/d", noop).unwrap();

        let patterns = router.patterns_for_method("DELETE");
        assert_eq!(patterns, vec!["DELETE /b", "DELETE /c/{id}"]);
        assert_eq!(router.patterns_for_method("PATCH"), vec!["PATCH /d"]);
    }
}
