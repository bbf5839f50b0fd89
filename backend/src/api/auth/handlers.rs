//! Handlers for token issuance, refresh and organizer-id encryption.

use crate::api::common::{
    send_response, send_unencrypted, server_error, unauthorized, validation_error,
};
use crate::errors::{ServiceError, ServiceResult};
use crate::middleware::auth::token_from_headers;
use crate::repositories::token_repository::{
    ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TokenRepository,
};
use crate::router::context::{RequestContext, Response};
use crate::utils::crypto::Codec;
use crate::utils::organizer::encrypt_organizer_id;
use crate::utils::url_safe;
use crate::utils::{generate_token, url_decode};
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::error;

/// Pulls a positive organizer_id out of a JSON body, tolerating both number
/// and numeric-string forms.
fn organizer_id_from_body(body: &Value) -> Option<i64> {
    match body.get("organizer_id") {
        Some(Value::Number(number)) => number.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|id| *id > 0)
}

fn encrypted_id_pair(codec: &Codec, organizer_id: i64) -> Result<(String, String), ServiceError> {
    let encrypted = encrypt_organizer_id(codec, organizer_id)
        .map_err(|e| ServiceError::internal(format!("Failed to encrypt organizer ID: {}", e)))?;
    let url_safe = url_safe::encode_token(&encrypted);
    Ok((encrypted, url_safe))
}

/// POST /api/v1/auth/token
///
/// Issues a fresh access/refresh token pair for an organizer and returns the
/// encrypted organizer-id forms clients embed in later requests.
pub async fn generate_token_pair(ctx: RequestContext) -> ServiceResult<Response> {
    let body = ctx.body_json();

    let Some(organizer_id) = organizer_id_from_body(&body) else {
        if body.get("organizer_id").is_none() {
            return Ok(validation_error(
                ctx.codec(),
                "Field 'organizer_id' is required",
                None,
            ));
        }
        return Ok(validation_error(ctx.codec(), "Invalid organizer_id", None));
    };

    let Some(codec) = ctx.codec() else {
        return Ok(server_error(None, "Encryption is not configured"));
    };

    let access_token = generate_token(32);
    let refresh_token = generate_token(32);

    let repository = TokenRepository::new(ctx.pool());
    let record = repository
        .create_token(organizer_id, &access_token, &refresh_token)
        .await?;

    let (encrypted_organizer_id, url_safe_organizer_id) =
        encrypted_id_pair(codec, organizer_id)?;

    Ok(send_response(
        ctx.codec(),
        &json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "token_type": "Bearer",
            "expires_in": ACCESS_TOKEN_TTL_SECS,
            "refresh_expires_in": REFRESH_TOKEN_TTL_SECS,
            "organizer_id": organizer_id,
            "encrypted_organizer_id": encrypted_organizer_id,
            "url_safe_organizer_id": url_safe_organizer_id,
            "expires_at": record.expires_at,
            "refresh_expires_at": record.refresh_expires_at,
        }),
        StatusCode::CREATED,
    ))
}

/// POST /api/v1/auth/refresh
///
/// Rotates a token pair. The presented refresh token must still be active
/// and unexpired; the old pair is deactivated before the new one is issued.
pub async fn refresh_token(ctx: RequestContext) -> ServiceResult<Response> {
    let body = ctx.body_json();

    let Some(refresh_token) = body.get("refresh_token").and_then(Value::as_str) else {
        return Ok(validation_error(
            ctx.codec(),
            "Field 'refresh_token' is required",
            None,
        ));
    };

    let repository = TokenRepository::new(ctx.pool());
    let Some(record) = repository.find_by_refresh_token(refresh_token).await? else {
        return Ok(unauthorized(ctx.codec(), "Invalid or expired refresh token"));
    };

    let Some(codec) = ctx.codec() else {
        return Ok(server_error(None, "Encryption is not configured"));
    };

    let new_access_token = generate_token(32);
    let new_refresh_token = generate_token(32);

    repository.deactivate_token(&record.access_token).await?;
    let new_record = repository
        .create_token(record.organizer_id, &new_access_token, &new_refresh_token)
        .await?;

    let (encrypted_organizer_id, url_safe_organizer_id) =
        encrypted_id_pair(codec, record.organizer_id)?;

    Ok(send_response(
        ctx.codec(),
        &json!({
            "access_token": new_access_token,
            "refresh_token": new_refresh_token,
            "token_type": "Bearer",
            "expires_in": ACCESS_TOKEN_TTL_SECS,
            "refresh_expires_in": REFRESH_TOKEN_TTL_SECS,
            "organizer_id": record.organizer_id,
            "encrypted_organizer_id": encrypted_organizer_id,
            "url_safe_organizer_id": url_safe_organizer_id,
            "expires_at": new_record.expires_at,
            "refresh_expires_at": new_record.refresh_expires_at,
        }),
        StatusCode::OK,
    ))
}

/// POST /api/v1/auth/organizer-id
///
/// Encrypts an organizer id for client use. The id comes from the body, or
/// from a valid access token when the body omits it.
pub async fn get_encrypted_organizer_id(ctx: RequestContext) -> ServiceResult<Response> {
    let body = ctx.body_json();

    let mut organizer_id = organizer_id_from_body(&body);

    if organizer_id.is_none() {
        if let Some(token) = token_from_headers(ctx.headers()) {
            let repository = TokenRepository::new(ctx.pool());
            if let Some(record) = repository.find_by_access_token(&token).await? {
                organizer_id = Some(record.organizer_id);
            }
        }
    }

    let Some(organizer_id) = organizer_id.filter(|id| *id > 0) else {
        return Ok(validation_error(
            ctx.codec(),
            "organizer_id is required or provide valid access_token",
            None,
        ));
    };

    let Some(codec) = ctx.codec() else {
        return Ok(server_error(None, "Encryption is not configured"));
    };

    let (encrypted_organizer_id, url_safe_organizer_id) =
        encrypted_id_pair(codec, organizer_id)?;

    let prefix = format!("/api/{}", ctx.config().api_version);

    Ok(send_response(
        ctx.codec(),
        &json!({
            "organizer_id": organizer_id,
            "encrypted_organizer_id": encrypted_organizer_id,
            "url_safe_organizer_id": url_safe_organizer_id,
            "usage": {
                "header": format!("X-ORGANIZER-ID: {}", encrypted_organizer_id),
                "url": format!("{}/organizers/{}/events", prefix, url_safe_organizer_id),
            }
        }),
        StatusCode::OK,
    ))
}

/// POST /api/v1/auth/decrypt
///
/// Decrypts a client-held ciphertext and replies in the clear. The value may
/// be raw base64 or the URL-safe form.
pub async fn decrypt(ctx: RequestContext) -> ServiceResult<Response> {
    let body = ctx.body_json();

    let Some(encrypted_data) = body.get("encrypted_data").and_then(Value::as_str) else {
        return Ok(validation_error(
            ctx.codec(),
            "Field 'encrypted_data' is required",
            None,
        ));
    };

    let Some(codec) = ctx.codec() else {
        return Ok(server_error(None, "Encryption is not configured"));
    };

    let plaintext = codec
        .decrypt(encrypted_data)
        .or_else(|_| codec.decrypt(&url_safe::decode_token(&url_decode(encrypted_data))));

    match plaintext {
        Ok(plaintext) => {
            let text = String::from_utf8_lossy(&plaintext).into_owned();
            // JSON plaintexts come back decoded; anything else stays a string.
            let data = match serde_json::from_str::<Value>(&text) {
                Ok(value) => value,
                Err(_) => Value::String(text),
            };
            Ok(send_unencrypted(data, StatusCode::OK))
        }
        Err(e) => {
            error!(error = %e, "decrypt endpoint failed");
            Ok(server_error(
                ctx.codec(),
                &format!("Failed to decrypt data: {}", e),
            ))
        }
    }
}
