//! Response envelopes shared by every endpoint.
//!
//! Success and error bodies both pass through the encrypted envelope; only
//! the decrypt endpoint replies in the clear. An encryption failure is
//! non-fatal: the HTTP status stands and the body degrades to the
//! `{success: false, error: "Encryption failed"}` form.

use crate::errors::ServiceError;
use crate::router::context::{RequestContext, Response};
use crate::utils::crypto::{Codec, encrypt_response};
use crate::utils::organizer::resolve_organizer_id;
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::error;

/// Sends data through the encrypted envelope with the given status.
pub fn send_response(codec: Option<&Codec>, data: &Value, status: StatusCode) -> Response {
    Response::json(status, encrypt_response(codec, data))
}

/// Success reply: `{data, message?}` inside the encrypted envelope.
pub fn send_success(
    codec: Option<&Codec>,
    data: Value,
    message: Option<&str>,
    status: StatusCode,
) -> Response {
    let mut payload = Map::new();
    payload.insert("data".to_string(), data);
    if let Some(message) = message {
        payload.insert("message".to_string(), Value::String(message.to_string()));
    }
    send_response(codec, &Value::Object(payload), status)
}

/// Cleartext success reply. Only the decrypt endpoint uses this.
pub fn send_unencrypted(data: Value, status: StatusCode) -> Response {
    Response::json(
        status,
        json!({
            "success": true,
            "data": data,
            "timestamp": Utc::now().timestamp(),
        }),
    )
}

/// Error reply: `{error, code, status_code, errors?}` inside the encrypted
/// envelope.
pub fn send_error(
    codec: Option<&Codec>,
    message: &str,
    status: StatusCode,
    errors: Option<Value>,
    code: &str,
) -> Response {
    let mut payload = Map::new();
    payload.insert("error".to_string(), Value::String(message.to_string()));
    payload.insert("code".to_string(), Value::String(code.to_string()));
    payload.insert(
        "status_code".to_string(),
        Value::Number(status.as_u16().into()),
    );
    if let Some(errors) = errors {
        payload.insert("errors".to_string(), errors);
    }
    send_response(codec, &Value::Object(payload), status)
}

pub fn validation_error(codec: Option<&Codec>, message: &str, errors: Option<Value>) -> Response {
    send_error(
        codec,
        message,
        StatusCode::UNPROCESSABLE_ENTITY,
        errors,
        "VALIDATION_ERROR",
    )
}

/// 404 with a per-resource code, e.g. `EVENT_NOT_FOUND`.
pub fn not_found(codec: Option<&Codec>, message: &str, resource: Option<&str>) -> Response {
    let code = match resource {
        Some(resource) => format!("{}_NOT_FOUND", resource.to_uppercase()),
        None => "NOT_FOUND".to_string(),
    };
    send_error(codec, message, StatusCode::NOT_FOUND, None, &code)
}

pub fn unauthorized(codec: Option<&Codec>, message: &str) -> Response {
    send_error(codec, message, StatusCode::UNAUTHORIZED, None, "UNAUTHORIZED")
}

pub fn forbidden(codec: Option<&Codec>, message: &str) -> Response {
    send_error(codec, message, StatusCode::FORBIDDEN, None, "FORBIDDEN")
}

pub fn conflict(codec: Option<&Codec>, message: &str) -> Response {
    send_error(codec, message, StatusCode::CONFLICT, None, "CONFLICT")
}

pub fn server_error(codec: Option<&Codec>, message: &str) -> Response {
    send_error(
        codec,
        message,
        StatusCode::INTERNAL_SERVER_ERROR,
        None,
        "INTERNAL_SERVER_ERROR",
    )
}

/// Upper bound on `per_page`; larger requests are clamped down to it.
pub const MAX_PER_PAGE: i64 = 100;

/// Parses `page`/`per_page` query values into a safe window. Both values are
/// clamped (page >= 1, 1 <= per_page <= MAX_PER_PAGE) and the offset is
/// computed with saturating arithmetic so hostile query strings cannot
/// overflow it.
pub fn page_window(page: Option<&str>, per_page: Option<&str>) -> (i64, i64, i64) {
    let page = page
        .and_then(|p| p.parse::<i64>().ok())
        .unwrap_or(1)
        .max(1);
    let per_page = per_page
        .and_then(|p| p.parse::<i64>().ok())
        .unwrap_or(20)
        .clamp(1, MAX_PER_PAGE);
    let offset = (page - 1).saturating_mul(per_page);
    (page, per_page, offset)
}

/// Wraps a result list with pagination metadata.
pub fn paginate(data: Value, page: i64, per_page: i64, total: i64) -> Value {
    let total_pages = if per_page > 0 {
        (total + per_page - 1) / per_page
    } else {
        0
    };

    json!({
        "data": data,
        "pagination": {
            "current_page": page,
            "per_page": per_page,
            "total": total,
            "total_pages": total_pages,
            "has_next": page * per_page < total,
            "has_prev": page > 1,
        }
    })
}

/// Resolves the organizer id from the request or replies with the standard
/// 400. The error arm carries the full response so handlers can just
/// `return Ok(response)`.
pub fn require_organizer_id(ctx: &RequestContext) -> Result<i64, Response> {
    let resolved = resolve_organizer_id(
        ctx.codec(),
        ctx.param("organizer_id"),
        ctx.headers(),
        ctx.config().allow_plain_organizer_id,
    );

    match resolved {
        Some(organizer_id) if organizer_id > 0 => Ok(organizer_id),
        _ => Err(send_error(
            ctx.codec(),
            "Organizer ID is required. Please provide encrypted organizer ID in URL parameter \
             (organizer_id) or X-ORGANIZER-ID header",
            StatusCode::BAD_REQUEST,
            None,
            "ORGANIZER_ID_REQUIRED",
        )),
    }
}

/// Maps a service error onto the wire taxonomy.
pub fn service_error_to_response(codec: Option<&Codec>, err: ServiceError) -> Response {
    match err {
        ServiceError::Validation { message } => validation_error(codec, &message, None),
        ServiceError::NotFound { entity, identifier } => {
            let message = format!("{} not found: {}", entity, identifier);
            not_found(codec, &message, Some(&entity))
        }
        ServiceError::AlreadyExists { entity, identifier } => {
            conflict(codec, &format!("{} already exists: {}", entity, identifier))
        }
        ServiceError::Unauthorized { message } => unauthorized(codec, &message),
        ServiceError::PermissionDenied { message } => forbidden(codec, &message),
        ServiceError::Database { source } => {
            error!(error = %source, "database error");
            server_error(codec, &format!("Database error: {}", source))
        }
        ServiceError::Internal { message } => {
            error!(error = %message, "internal error");
            server_error(codec, &message)
        }
    }
}

/// Checks that the listed fields are present and non-empty in a JSON body,
/// returning a `field -> message` map of violations.
pub fn validate_required(body: &Value, required: &[&str]) -> Map<String, Value> {
    let mut errors = Map::new();
    for field in required {
        let missing = match body.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            errors.insert(
                field.to_string(),
                Value::String(format!("Field '{}' is required", field)),
            );
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::errors::ServiceError;

    fn codec() -> Codec {
        Codec::new(&Config::default()).unwrap()
    }

    fn decrypt_body(codec: &Codec, response: &Response) -> Value {
        assert_eq!(response.body["success"], true);
        let ciphertext = response.body["data"].as_str().unwrap();
        serde_json::from_slice(&codec.decrypt(ciphertext).unwrap()).unwrap()
    }

    #[test]
    fn test_send_success_envelope() {
        let codec = codec();
        let response = send_success(
            Some(&codec),
            json!({"id": 1}),
            Some("Created"),
            StatusCode::CREATED,
        );

        assert_eq!(response.status, StatusCode::CREATED);
        let payload = decrypt_body(&codec, &response);
        assert_eq!(payload["data"]["id"], 1);
        assert_eq!(payload["message"], "Created");
    }

    #[test]
    fn test_send_error_envelope_and_omitted_errors() {
        let codec = codec();
        let response = send_error(
            Some(&codec),
            "Validation failed",
            StatusCode::UNPROCESSABLE_ENTITY,
            Some(json!({"name": "Field 'name' is required"})),
            "VALIDATION_ERROR",
        );

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        let payload = decrypt_body(&codec, &response);
        assert_eq!(payload["error"], "Validation failed");
        assert_eq!(payload["code"], "VALIDATION_ERROR");
        assert_eq!(payload["status_code"], 422);
        assert_eq!(payload["errors"]["name"], "Field 'name' is required");

        let plain = send_error(Some(&codec), "x", StatusCode::BAD_REQUEST, None, "X");
        let payload = decrypt_body(&codec, &plain);
        assert!(payload.get("errors").is_none());
    }

    #[test]
    fn test_error_status_survives_missing_codec() {
        let response = send_error(None, "boom", StatusCode::CONFLICT, None, "CONFLICT");

        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.body["success"], false);
        assert_eq!(response.body["error"], "Encryption failed");
    }

    #[test]
    fn test_page_window_defaults_and_clamps() {
        assert_eq!(page_window(None, None), (1, 20, 0));
        assert_eq!(page_window(Some("3"), Some("10")), (3, 10, 20));
        assert_eq!(page_window(Some("0"), Some("-5")), (1, 1, 0));
        assert_eq!(page_window(Some("junk"), Some("junk")), (1, 20, 0));
    }

    #[test]
    fn test_page_window_survives_hostile_values() {
        // An i64::MAX per_page must clamp rather than overflow the offset.
        let (page, per_page, offset) = page_window(Some("3"), Some("9223372036854775807"));
        assert_eq!(page, 3);
        assert_eq!(per_page, MAX_PER_PAGE);
        assert_eq!(offset, 2 * MAX_PER_PAGE);

        // An i64::MAX page saturates instead of wrapping.
        let (_, _, offset) = page_window(Some("9223372036854775807"), Some("100"));
        assert_eq!(offset, i64::MAX);
    }

    #[test]
    fn test_paginate_math() {
        let body = paginate(json!([1, 2, 3]), 2, 3, 7);
        let pagination = &body["pagination"];

        assert_eq!(pagination["current_page"], 2);
        assert_eq!(pagination["per_page"], 3);
        assert_eq!(pagination["total"], 7);
        assert_eq!(pagination["total_pages"], 3);
        assert_eq!(pagination["has_next"], true);
        assert_eq!(pagination["has_prev"], true);

        let last = paginate(json!([7]), 3, 3, 7);
        assert_eq!(last["pagination"]["has_next"], false);
    }

    #[test]
    fn test_service_error_mapping() {
        let codec = codec();

        let response = service_error_to_response(
            Some(&codec),
            ServiceError::not_found("Event", "42"),
        );
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        let payload = decrypt_body(&codec, &response);
        assert_eq!(payload["code"], "EVENT_NOT_FOUND");

        let response = service_error_to_response(
            Some(&codec),
            ServiceError::validation("Validation failed"),
        );
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

        let response = service_error_to_response(
            Some(&codec),
            ServiceError::already_exists("Organizer", "a@b.c"),
        );
        assert_eq!(response.status, StatusCode::CONFLICT);

        let response = service_error_to_response(
            Some(&codec),
            ServiceError::unauthorized("Invalid email or password"),
        );
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);

        let response = service_error_to_response(
            Some(&codec),
            ServiceError::permission_denied("not yours"),
        );
        assert_eq!(response.status, StatusCode::FORBIDDEN);

        let response =
            service_error_to_response(Some(&codec), ServiceError::internal("boom"));
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validate_required() {
        let body = json!({"name": "x", "start_date": "", "extra": 1});
        let errors = validate_required(&body, &["name", "start_date", "end_date"]);

        assert!(errors.get("name").is_none());
        assert_eq!(errors["start_date"], "Field 'start_date' is required");
        assert_eq!(errors["end_date"], "Field 'end_date' is required");
    }
}
