//! Event CRUD endpoints, scoped to an organizer.

pub mod handlers;
pub mod routes;
