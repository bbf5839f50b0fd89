//! Middleware chain for the request dispatcher.

pub mod auth;
pub mod cors;

use crate::router::context::{RequestContext, Response};
use async_trait::async_trait;

/// Outcome of one middleware: either keep going, optionally contributing
/// response headers, or stop the request with a response of its own.
pub enum MiddlewareDecision {
    Continue(Vec<(String, String)>),
    Halt(Response),
}

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, ctx: &RequestContext) -> MiddlewareDecision;
}
