//! Database repository for event management operations.
//!
//! Every query is scoped to an organizer and excludes soft-deleted rows
//! (`deleted_at` unset or still in the future).

use crate::database::models::{CreateEvent, Event, UpdateEvent};
use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};

/// WHERE fragment shared by every read: row not soft-deleted.
const NOT_DELETED: &str = "(deleted_at IS NULL OR deleted_at > NOW())";

/// Repository for event database operations.
pub struct EventRepository<'a> {
    /// Shared Postgres connection pool
    pool: &'a PgPool,
}

impl<'a> EventRepository<'a> {
    /// Creates a new EventRepository instance.
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new event and returns the stored row.
    pub async fn create_event(&self, event: CreateEvent) -> Result<Event> {
        let created = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (
                organizer_id, name, description, short_description, event_type,
                category, genre, status, start_date, end_date, timezone, city,
                state, country, address, banner_image, video_url, website_url,
                is_featured, ticket_available, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, NOW(), NOW()
            )
            RETURNING *
            "#,
        )
        .bind(event.organizer_id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.short_description)
        .bind(&event.event_type)
        .bind(&event.category)
        .bind(&event.genre)
        .bind(&event.status)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.timezone)
        .bind(&event.city)
        .bind(&event.state)
        .bind(&event.country)
        .bind(&event.address)
        .bind(&event.banner_image)
        .bind(&event.video_url)
        .bind(&event.website_url)
        .bind(event.is_featured)
        .bind(event.ticket_available)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Retrieves a single event by ID, scoped to an organizer.
    pub async fn get_event_by_id(&self, id: i64, organizer_id: i64) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT * FROM events WHERE id = $1 AND organizer_id = $2 AND {NOT_DELETED}"
        ))
        .bind(id)
        .bind(organizer_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(event)
    }

    /// Retrieves all events for an organizer, newest first, optionally
    /// filtered by status.
    pub async fn get_all_events(
        &self,
        organizer_id: i64,
        status: Option<&str>,
    ) -> Result<Vec<Event>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT * FROM events WHERE {NOT_DELETED} AND organizer_id = "
        ));
        builder.push_bind(organizer_id);

        if let Some(status) = status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }

        builder.push(" ORDER BY created_at DESC");

        let events = builder.build_query_as::<Event>().fetch_all(self.pool).await?;
        Ok(events)
    }

    /// Retrieves events with a given status, newest first.
    pub async fn get_events_by_status(
        &self,
        status: &str,
        organizer_id: i64,
    ) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT * FROM events WHERE status = $1 AND organizer_id = $2 \
             AND {NOT_DELETED} ORDER BY created_at DESC"
        ))
        .bind(status)
        .bind(organizer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    /// Retrieves events that have not started yet, soonest first.
    pub async fn get_upcoming_events(&self, organizer_id: i64) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT * FROM events WHERE start_date >= NOW() AND organizer_id = $1 \
             AND {NOT_DELETED} ORDER BY start_date ASC"
        ))
        .bind(organizer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    /// Retrieves events that have already ended, most recently ended first.
    pub async fn get_past_events(&self, organizer_id: i64) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT * FROM events WHERE end_date < NOW() AND organizer_id = $1 \
             AND {NOT_DELETED} ORDER BY end_date DESC"
        ))
        .bind(organizer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    /// Case-insensitive search over event name and description.
    pub async fn search_events(&self, term: &str, organizer_id: i64) -> Result<Vec<Event>> {
        let pattern = format!("%{}%", term);
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT * FROM events WHERE (name ILIKE $1 OR description ILIKE $1) \
             AND organizer_id = $2 AND {NOT_DELETED} ORDER BY created_at DESC"
        ))
        .bind(pattern)
        .bind(organizer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    /// Retrieves featured events, newest first.
    pub async fn get_featured_events(&self, organizer_id: i64) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT * FROM events WHERE is_featured = true AND organizer_id = $1 \
             AND {NOT_DELETED} ORDER BY created_at DESC"
        ))
        .bind(organizer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    /// Retrieves events in a category, soonest first.
    pub async fn get_events_by_category(
        &self,
        category: &str,
        organizer_id: i64,
    ) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT * FROM events WHERE category = $1 AND organizer_id = $2 \
             AND {NOT_DELETED} ORDER BY start_date ASC"
        ))
        .bind(category)
        .bind(organizer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    /// Applies a partial update, scoped to an organizer. The caller must
    /// ensure at least one field is set.
    pub async fn update_event(
        &self,
        id: i64,
        organizer_id: i64,
        changes: &UpdateEvent,
    ) -> Result<()> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE events SET ");
        let mut fields = builder.separated(", ");

        if let Some(name) = &changes.name {
            fields.push("name = ").push_bind_unseparated(name);
        }
        if let Some(description) = &changes.description {
            fields.push("description = ").push_bind_unseparated(description);
        }
        if let Some(short_description) = &changes.short_description {
            fields
                .push("short_description = ")
                .push_bind_unseparated(short_description);
        }
        if let Some(event_type) = &changes.event_type {
            fields.push("event_type = ").push_bind_unseparated(event_type);
        }
        if let Some(category) = &changes.category {
            fields.push("category = ").push_bind_unseparated(category);
        }
        if let Some(genre) = &changes.genre {
            fields.push("genre = ").push_bind_unseparated(genre);
        }
        if let Some(status) = &changes.status {
            fields.push("status = ").push_bind_unseparated(status);
        }
        if let Some(start_date) = changes.start_date {
            fields.push("start_date = ").push_bind_unseparated(start_date);
        }
        if let Some(end_date) = changes.end_date {
            fields.push("end_date = ").push_bind_unseparated(end_date);
        }
        if let Some(timezone) = &changes.timezone {
            fields.push("timezone = ").push_bind_unseparated(timezone);
        }
        if let Some(city) = &changes.city {
            fields.push("city = ").push_bind_unseparated(city);
        }
        if let Some(state) = &changes.state {
            fields.push("state = ").push_bind_unseparated(state);
        }
        if let Some(country) = &changes.country {
            fields.push("country = ").push_bind_unseparated(country);
        }
        if let Some(address) = &changes.address {
            fields.push("address = ").push_bind_unseparated(address);
        }
        if let Some(banner_image) = &changes.banner_image {
            fields.push("banner_image = ").push_bind_unseparated(banner_image);
        }
        if let Some(video_url) = &changes.video_url {
            fields.push("video_url = ").push_bind_unseparated(video_url);
        }
        if let Some(website_url) = &changes.website_url {
            fields.push("website_url = ").push_bind_unseparated(website_url);
        }
        if let Some(is_featured) = changes.is_featured {
            fields.push("is_featured = ").push_bind_unseparated(is_featured);
        }
        if let Some(ticket_available) = changes.ticket_available {
            fields
                .push("ticket_available = ")
                .push_bind_unseparated(ticket_available);
        }
        fields.push("updated_at = NOW()");

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" AND organizer_id = ");
        builder.push_bind(organizer_id);

        builder.build().execute(self.pool).await?;
        Ok(())
    }

    /// Deletes an event, scoped to an organizer.
    pub async fn delete_event(&self, id: i64, organizer_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM events WHERE id = $1 AND organizer_id = $2")
            .bind(id)
            .bind(organizer_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
