//! Request-scoped state handed to route handlers.

use crate::config::Config;
use crate::utils::crypto::Codec;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared application state: connection pool, configuration and the
/// optional codec. The codec is `None` when no encryption key is configured;
/// endpoints then fall back to the unencrypted failure envelope.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub codec: Option<Codec>,
}

/// Everything a handler needs about one request. Headers are stored with
/// lowercased names; query and path parameters share one map, with path
/// parameters merged in after routing so they win on collision.
pub struct RequestContext {
    state: Arc<AppState>,
    pub method: String,
    pub path: String,
    params: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl RequestContext {
    pub fn new(
        state: Arc<AppState>,
        method: String,
        path: String,
        query: &str,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Self {
        let mut params = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.insert(key.into_owned(), value.into_owned());
        }

        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_lowercase(), value))
            .collect();

        RequestContext {
            state,
            method,
            path,
            params,
            headers,
            body,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn pool(&self) -> &PgPool {
        &self.state.pool
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    pub fn codec(&self) -> Option<&Codec> {
        self.state.codec.as_ref()
    }

    /// A query or path parameter. Path parameters shadow query parameters of
    /// the same name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// A request header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Merges extracted path parameters over the query parameters.
    pub fn merge_params(&mut self, params: HashMap<String, String>) {
        self.params.extend(params);
    }

    /// The request body parsed as JSON. An empty or malformed body yields an
    /// empty object so handlers can probe fields uniformly.
    pub fn body_json(&self) -> Value {
        if self.body.is_empty() {
            return Value::Object(serde_json::Map::new());
        }
        serde_json::from_slice(&self.body).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
    }

}

/// A handler's reply: status, JSON body and extra headers. `pretty` selects
/// indented serialization, used by the structured 404 body.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub body: Value,
    pub headers: Vec<(String, String)>,
    pub pretty: bool,
}

impl Response {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Response {
            status,
            body,
            headers: Vec::new(),
            pretty: false,
        }
    }

    pub fn pretty_json(status: StatusCode, body: Value) -> Self {
        Response {
            status,
            body,
            headers: Vec::new(),
            pretty: true,
        }
    }

    /// Inserts headers collected earlier in the middleware chain ahead of
    /// the handler's own.
    pub fn prepend_headers(&mut self, mut headers: Vec<(String, String)>) {
        headers.append(&mut self.headers);
        self.headers = headers;
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let mut header_map = HeaderMap::new();
        header_map.insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                header_map.insert(name, value);
            }
        }

        let serialized = if self.body.is_null() {
            String::new()
        } else if self.pretty {
            serde_json::to_string_pretty(&self.body).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string(&self.body).unwrap_or_else(|_| "{}".to_string())
        };

        (self.status, header_map, serialized).into_response()
    }
}

#[cfg(test)]
pub fn test_state(config: Config) -> Arc<AppState> {
    use sqlx::postgres::PgPoolOptions;

    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    let codec = Codec::new(&config).ok();

    Arc::new(AppState {
        pool,
        config,
        codec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(query: &str, headers: Vec<(&str, &str)>, body: &[u8]) -> RequestContext {
        let header_map = headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RequestContext::new(
            test_state(Config::default()),
            "GET".to_string(),
            "/".to_string(),
            query,
            header_map,
            body.to_vec(),
        )
    }

    #[tokio::test]
    async fn test_query_params_parsed() {
        let ctx = context("page=2&status=active", vec![], b"");
        assert_eq!(ctx.param("page"), Some("2"));
        assert_eq!(ctx.param("status"), Some("active"));
        assert_eq!(ctx.param("missing"), None);
    }

    #[tokio::test]
    async fn test_path_params_shadow_query_params() {
        let mut ctx = context("id=query", vec![], b"");
        let mut path_params = HashMap::new();
        path_params.insert("id".to_string(), "path".to_string());
        ctx.merge_params(path_params);

        assert_eq!(ctx.param("id"), Some("path"));
    }

    #[tokio::test]
    async fn test_header_lookup_case_insensitive() {
        let ctx = context("", vec![("X-API-TOKEN", "secret")], b"");
        assert_eq!(ctx.header("x-api-token"), Some("secret"));
        assert_eq!(ctx.header("X-Api-Token"), Some("secret"));
    }

    #[tokio::test]
    async fn test_body_json_tolerates_garbage() {
        let ctx = context("", vec![], b"not json");
        assert_eq!(ctx.body_json(), Value::Object(serde_json::Map::new()));

        let ctx = context("", vec![], b"");
        assert_eq!(ctx.body_json(), Value::Object(serde_json::Map::new()));

        let ctx = context("", vec![], b"{\"name\":\"x\"}");
        assert_eq!(ctx.body_json()["name"], "x");
    }
}
