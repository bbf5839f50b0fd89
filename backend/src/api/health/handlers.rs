//! Health check handler.

use crate::api::common::{send_error, send_success};
use crate::database;
use crate::errors::ServiceResult;
use crate::router::context::{RequestContext, Response};
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;
use tracing::error;

/// GET /health
///
/// Probes the database with `SELECT 1` and reports pool statistics. A failed
/// probe replies 503 rather than an error envelope status of its own.
pub async fn check(ctx: RequestContext) -> ServiceResult<Response> {
    let probe = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(ctx.pool())
        .await;

    match probe {
        Ok(_) => {
            let stats = database::pool_stats(ctx.pool(), ctx.config());
            Ok(send_success(
                ctx.codec(),
                json!({
                    "status": "healthy",
                    "database": "connected",
                    "pool_stats": stats,
                    "timestamp": Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                }),
                None,
                StatusCode::OK,
            ))
        }
        Err(e) => {
            error!(error = %e, "health check failed");
            Ok(send_error(
                ctx.codec(),
                &format!("Service unhealthy: {}", e),
                StatusCode::SERVICE_UNAVAILABLE,
                None,
                "SERVICE_UNAVAILABLE",
            ))
        }
    }
}
