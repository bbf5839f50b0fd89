//! Database repository for organizer accounts.

use crate::database::models::{Organizer, OrganizerFilters, UpdateOrganizer};
use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Repository for organizer database operations.
pub struct OrganizerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrganizerRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves an organizer by ID, active or not.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Organizer>> {
        let organizer = sqlx::query_as::<_, Organizer>("SELECT * FROM organizers WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(organizer)
    }

    /// Retrieves an active organizer by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Organizer>> {
        let organizer = sqlx::query_as::<_, Organizer>(
            "SELECT * FROM organizers WHERE LOWER(email) = LOWER($1) AND is_active = true",
        )
        .bind(email.trim())
        .fetch_optional(self.pool)
        .await?;

        Ok(organizer)
    }

    /// Like `find_by_email` but includes deactivated accounts. Used for
    /// email uniqueness checks so a soft-deleted account still reserves its
    /// address.
    pub async fn find_by_email_including_inactive(
        &self,
        email: &str,
    ) -> Result<Option<Organizer>> {
        let organizer = sqlx::query_as::<_, Organizer>(
            "SELECT * FROM organizers WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email.trim())
        .fetch_optional(self.pool)
        .await?;

        Ok(organizer)
    }

    /// Retrieves organizers matching the filters, newest first.
    pub async fn get_all_organizers(
        &self,
        filters: &OrganizerFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Organizer>> {
        let mut builder = self.filtered("SELECT * FROM organizers WHERE 1=1", filters);

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let organizers = builder
            .build_query_as::<Organizer>()
            .fetch_all(self.pool)
            .await?;
        Ok(organizers)
    }

    /// Counts organizers matching the filters.
    pub async fn count_organizers(&self, filters: &OrganizerFilters) -> Result<i64> {
        let mut builder = self.filtered("SELECT COUNT(*) FROM organizers WHERE 1=1", filters);

        let total: i64 = builder.build_query_scalar().fetch_one(self.pool).await?;
        Ok(total)
    }

    /// Creates an organizer from an already-hashed password.
    pub async fn create_organizer(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        is_active: bool,
    ) -> Result<Organizer> {
        let organizer = sqlx::query_as::<_, Organizer>(
            r#"
            INSERT INTO organizers (name, email, password_hash, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(is_active)
        .fetch_one(self.pool)
        .await?;

        Ok(organizer)
    }

    /// Applies a partial update. The caller must ensure at least one field
    /// is set.
    pub async fn update_organizer(&self, id: i64, changes: &UpdateOrganizer) -> Result<()> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE organizers SET ");
        let mut fields = builder.separated(", ");

        if let Some(name) = &changes.name {
            fields.push("name = ").push_bind_unseparated(name);
        }
        if let Some(email) = &changes.email {
            fields.push("email = ").push_bind_unseparated(email);
        }
        if let Some(password_hash) = &changes.password_hash {
            fields
                .push("password_hash = ")
                .push_bind_unseparated(password_hash);
        }
        if let Some(is_active) = changes.is_active {
            fields.push("is_active = ").push_bind_unseparated(is_active);
        }
        fields.push("updated_at = NOW()");

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        builder.build().execute(self.pool).await?;
        Ok(())
    }

    fn filtered(
        &self,
        base: &str,
        filters: &OrganizerFilters,
    ) -> QueryBuilder<'static, Postgres> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(base.to_string());

        if let Some(is_active) = filters.is_active {
            builder.push(" AND is_active = ");
            builder.push_bind(is_active);
        }
        if let Some(search) = &filters.search {
            let pattern = format!("%{}%", search);
            builder.push(" AND (name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR email ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder
    }
}
