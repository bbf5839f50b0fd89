//! Token issuance and organizer-id encryption endpoints.

pub mod handlers;
pub mod routes;
