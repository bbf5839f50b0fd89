//! Handlers for event management.
//!
//! Every handler first resolves the organizer from the encrypted URL token
//! or header; event rows are only ever read or written within that
//! organizer's scope.

use crate::api::common::{
    not_found, page_window, paginate, require_organizer_id, send_error, send_success,
    validate_required, validation_error,
};
use crate::database::models::{CreateEvent, UpdateEvent};
use crate::errors::ServiceResult;
use crate::repositories::event_repository::EventRepository;
use crate::router::context::{RequestContext, Response};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Value, json};

/// Accepts RFC 3339 timestamps, `YYYY-MM-DD HH:MM:SS`, or a bare date.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

fn opt_string(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
}

fn opt_bool(body: &Value, field: &str) -> Option<bool> {
    match body.get(field) {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Number(n)) => Some(n.as_i64() != Some(0)),
        Some(Value::String(s)) => Some(s == "true" || s == "1"),
        _ => None,
    }
}

fn flag_set(ctx: &RequestContext, name: &str) -> bool {
    matches!(ctx.param(name), Some("true") | Some("1"))
}

fn event_id(ctx: &RequestContext) -> Option<i64> {
    ctx.param("id").and_then(|id| id.parse::<i64>().ok())
}

fn invalid_id(ctx: &RequestContext) -> Response {
    send_error(
        ctx.codec(),
        "Valid event ID is required",
        StatusCode::BAD_REQUEST,
        None,
        "INVALID_ID",
    )
}

/// GET /api/v1/organizers/{organizer_id}/events
///
/// Lists events with pagination. The `upcoming`, `past`, `featured`,
/// `search` and `category` filters are mutually exclusive and checked in
/// that order; otherwise the full list is returned, optionally filtered by
/// `status`.
pub async fn index(ctx: RequestContext) -> ServiceResult<Response> {
    let organizer_id = match require_organizer_id(&ctx) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let (page, per_page, offset) = page_window(ctx.param("page"), ctx.param("per_page"));

    let repository = EventRepository::new(ctx.pool());

    let events = if flag_set(&ctx, "upcoming") {
        repository.get_upcoming_events(organizer_id).await?
    } else if flag_set(&ctx, "past") {
        repository.get_past_events(organizer_id).await?
    } else if flag_set(&ctx, "featured") {
        repository.get_featured_events(organizer_id).await?
    } else if let Some(search) = ctx.param("search").filter(|s| !s.is_empty()) {
        repository.search_events(search, organizer_id).await?
    } else if let Some(category) = ctx.param("category").filter(|c| !c.is_empty()) {
        repository.get_events_by_category(category, organizer_id).await?
    } else {
        repository
            .get_all_events(organizer_id, ctx.param("status").filter(|s| !s.is_empty()))
            .await?
    };

    let total = events.len() as i64;
    let window: Vec<_> = events
        .into_iter()
        .skip(offset as usize)
        .take(per_page as usize)
        .collect();

    let body = paginate(json!(window), page, per_page, total);
    Ok(send_success(ctx.codec(), body, None, StatusCode::OK))
}

/// GET /api/v1/organizers/{organizer_id}/events/{id}
pub async fn show(ctx: RequestContext) -> ServiceResult<Response> {
    let organizer_id = match require_organizer_id(&ctx) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let Some(id) = event_id(&ctx) else {
        return Ok(invalid_id(&ctx));
    };

    let repository = EventRepository::new(ctx.pool());
    let Some(event) = repository.get_event_by_id(id, organizer_id).await? else {
        return Ok(not_found(ctx.codec(), "Event not found", Some("EVENT")));
    };

    Ok(send_success(ctx.codec(), json!(event), None, StatusCode::OK))
}

/// POST /api/v1/organizers/{organizer_id}/events
///
/// `organizer_id` comes from the encrypted token, never the body.
pub async fn create(ctx: RequestContext) -> ServiceResult<Response> {
    let organizer_id = match require_organizer_id(&ctx) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let body = ctx.body_json();

    let errors = validate_required(&body, &["name", "start_date", "end_date"]);
    if !errors.is_empty() {
        return Ok(validation_error(
            ctx.codec(),
            "Validation failed",
            Some(Value::Object(errors)),
        ));
    }

    let (Some(start_date), Some(end_date)) = (
        opt_string(&body, "start_date").as_deref().and_then(parse_date),
        opt_string(&body, "end_date").as_deref().and_then(parse_date),
    ) else {
        return Ok(validation_error(
            ctx.codec(),
            "Invalid date format for 'start_date' or 'end_date'",
            None,
        ));
    };

    let event = CreateEvent {
        organizer_id,
        name: opt_string(&body, "name").unwrap_or_default(),
        description: opt_string(&body, "description"),
        short_description: opt_string(&body, "short_description"),
        event_type: opt_string(&body, "event_type"),
        category: opt_string(&body, "category"),
        genre: opt_string(&body, "genre"),
        status: opt_string(&body, "status").unwrap_or_else(|| "active".to_string()),
        start_date,
        end_date,
        timezone: opt_string(&body, "timezone"),
        city: opt_string(&body, "city"),
        state: opt_string(&body, "state"),
        country: opt_string(&body, "country"),
        address: opt_string(&body, "address"),
        banner_image: opt_string(&body, "banner_image"),
        video_url: opt_string(&body, "video_url"),
        website_url: opt_string(&body, "website_url"),
        is_featured: opt_bool(&body, "is_featured").unwrap_or(false),
        ticket_available: opt_bool(&body, "ticket_available").unwrap_or(false),
    };

    let repository = EventRepository::new(ctx.pool());
    let created = repository.create_event(event).await?;

    Ok(send_success(
        ctx.codec(),
        json!(created),
        Some("Event created successfully"),
        StatusCode::CREATED,
    ))
}

/// PUT /api/v1/organizers/{organizer_id}/events/{id}
pub async fn update(ctx: RequestContext) -> ServiceResult<Response> {
    let organizer_id = match require_organizer_id(&ctx) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let Some(id) = event_id(&ctx) else {
        return Ok(invalid_id(&ctx));
    };

    let body = ctx.body_json();

    let repository = EventRepository::new(ctx.pool());
    if repository.get_event_by_id(id, organizer_id).await?.is_none() {
        return Ok(not_found(ctx.codec(), "Event not found", Some("EVENT")));
    }

    let start_date = match opt_string(&body, "start_date") {
        Some(raw) => match parse_date(&raw) {
            Some(parsed) => Some(parsed),
            None => {
                return Ok(validation_error(
                    ctx.codec(),
                    "Invalid date format for 'start_date'",
                    None,
                ));
            }
        },
        None => None,
    };
    let end_date = match opt_string(&body, "end_date") {
        Some(raw) => match parse_date(&raw) {
            Some(parsed) => Some(parsed),
            None => {
                return Ok(validation_error(
                    ctx.codec(),
                    "Invalid date format for 'end_date'",
                    None,
                ));
            }
        },
        None => None,
    };

    let changes = UpdateEvent {
        name: opt_string(&body, "name"),
        description: opt_string(&body, "description"),
        short_description: opt_string(&body, "short_description"),
        event_type: opt_string(&body, "event_type"),
        category: opt_string(&body, "category"),
        genre: opt_string(&body, "genre"),
        status: opt_string(&body, "status"),
        start_date,
        end_date,
        timezone: opt_string(&body, "timezone"),
        city: opt_string(&body, "city"),
        state: opt_string(&body, "state"),
        country: opt_string(&body, "country"),
        address: opt_string(&body, "address"),
        banner_image: opt_string(&body, "banner_image"),
        video_url: opt_string(&body, "video_url"),
        website_url: opt_string(&body, "website_url"),
        is_featured: opt_bool(&body, "is_featured"),
        ticket_available: opt_bool(&body, "ticket_available"),
    };

    if changes.is_empty() {
        return Ok(send_error(
            ctx.codec(),
            "No fields to update",
            StatusCode::BAD_REQUEST,
            None,
            "NO_FIELDS_TO_UPDATE",
        ));
    }

    repository.update_event(id, organizer_id, &changes).await?;
    let updated = repository.get_event_by_id(id, organizer_id).await?;

    Ok(send_success(
        ctx.codec(),
        json!(updated),
        Some("Event updated successfully"),
        StatusCode::OK,
    ))
}

/// DELETE /api/v1/organizers/{organizer_id}/events/{id}
pub async fn delete(ctx: RequestContext) -> ServiceResult<Response> {
    let organizer_id = match require_organizer_id(&ctx) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let Some(id) = event_id(&ctx) else {
        return Ok(invalid_id(&ctx));
    };

    let repository = EventRepository::new(ctx.pool());
    if repository.get_event_by_id(id, organizer_id).await?.is_none() {
        return Ok(not_found(ctx.codec(), "Event not found", Some("EVENT")));
    }

    repository.delete_event(id, organizer_id).await?;

    Ok(send_success(
        ctx.codec(),
        Value::Null,
        Some("Event deleted successfully"),
        StatusCode::OK,
    ))
}

/// GET /api/v1/organizers/{organizer_id}/events/status/{status}
pub async fn get_by_status(ctx: RequestContext) -> ServiceResult<Response> {
    let organizer_id = match require_organizer_id(&ctx) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let Some(status) = ctx.param("status").filter(|s| !s.is_empty()) else {
        return Ok(send_error(
            ctx.codec(),
            "Status is required",
            StatusCode::BAD_REQUEST,
            None,
            "STATUS_REQUIRED",
        ));
    };

    let repository = EventRepository::new(ctx.pool());
    let events = repository.get_events_by_status(status, organizer_id).await?;

    Ok(send_success(ctx.codec(), json!(events), None, StatusCode::OK))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("2026-03-01T18:30:00Z").is_some());
        assert!(parse_date("2026-03-01T18:30:00+01:00").is_some());
        assert!(parse_date("2026-03-01 18:30:00").is_some());
        assert!(parse_date("2026-03-01").is_some());
        assert!(parse_date("March 1st").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_opt_bool_forms() {
        let body = json!({
            "a": true,
            "b": 1,
            "c": 0,
            "d": "true",
            "e": "no",
        });
        assert_eq!(opt_bool(&body, "a"), Some(true));
        assert_eq!(opt_bool(&body, "b"), Some(true));
        assert_eq!(opt_bool(&body, "c"), Some(false));
        assert_eq!(opt_bool(&body, "d"), Some(true));
        assert_eq!(opt_bool(&body, "e"), Some(false));
        assert_eq!(opt_bool(&body, "missing"), None);
    }

    #[test]
    fn test_update_event_empty_detection() {
        assert!(UpdateEvent::default().is_empty());
        let changes = UpdateEvent {
            name: Some("x".to_string()),
            ..UpdateEvent::default()
        };
        assert!(!changes.is_empty());
    }
}
