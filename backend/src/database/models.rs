//! Data models for database entities and request payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// An event owned by an organizer.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub organizer_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub event_type: Option<String>,
    pub category: Option<String>,
    pub genre: Option<String>,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub timezone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub banner_image: Option<String>,
    pub video_url: Option<String>,
    pub website_url: Option<String>,
    pub is_featured: bool,
    pub ticket_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for creating an event. `organizer_id` never comes from the body;
/// it is resolved from the encrypted URL token or header.
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub organizer_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub event_type: Option<String>,
    pub category: Option<String>,
    pub genre: Option<String>,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub timezone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub banner_image: Option<String>,
    pub video_url: Option<String>,
    pub website_url: Option<String>,
    pub is_featured: bool,
    pub ticket_available: bool,
}

/// Partial update for an event. `None` fields are left untouched;
/// `organizer_id` is never updatable.
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub event_type: Option<String>,
    pub category: Option<String>,
    pub genre: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub banner_image: Option<String>,
    pub video_url: Option<String>,
    pub website_url: Option<String>,
    pub is_featured: Option<bool>,
    pub ticket_available: Option<bool>,
}

impl UpdateEvent {
    /// True when no field is set, which the update endpoint rejects.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.short_description.is_none()
            && self.event_type.is_none()
            && self.category.is_none()
            && self.genre.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.timezone.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.country.is_none()
            && self.address.is_none()
            && self.banner_image.is_none()
            && self.video_url.is_none()
            && self.website_url.is_none()
            && self.is_featured.is_none()
            && self.ticket_available.is_none()
    }
}

/// Partial update for an organizer.
#[derive(Debug, Clone, Default)]
pub struct UpdateOrganizer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateOrganizer {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.is_active.is_none()
    }
}

/// A tenant account that owns events. The password hash never leaves the
/// server; it is skipped during serialization.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Organizer {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizerRequest {
    #[validate(length(min = 1, message = "Field 'name' is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub is_active: Option<bool>,
}

/// An access/refresh token pair issued to an organizer.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApiToken {
    pub id: i64,
    pub organizer_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query filters accepted by the organizer list endpoint.
#[derive(Debug, Default)]
pub struct OrganizerFilters {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}
