//! Module for database connection setup and common utilities.
//!
//! This module is responsible for initializing the Postgres connection pool
//! and providing a central point for database-related configuration. The pool
//! is constructed once at startup and passed by reference everywhere else;
//! there is no global singleton.

use crate::config::Config;
use anyhow::Result;
use serde::Serialize;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub mod models;

pub struct Database {
    pub pool: PgPool,
}

/// Snapshot of pool usage, reported by the health endpoint.
#[derive(Debug, Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
    pub max_connections: u32,
}

impl Database {
    /// Initializes the database connection pool.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.database_url)
            .await?;

        Ok(Database { pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Reports current pool usage for a pool handle.
pub fn pool_stats(pool: &PgPool, config: &Config) -> PoolStats {
    PoolStats {
        size: pool.size(),
        idle: pool.num_idle(),
        max_connections: config.max_connections,
    }
}
