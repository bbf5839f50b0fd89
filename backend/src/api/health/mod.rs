//! Health check endpoint.

pub mod handlers;
pub mod routes;
