//! Health route registration.

use super::handlers;
use crate::router::{RouteError, Router};

pub fn register(router: &mut Router) -> Result<(), RouteError> {
    router.get("/health", handlers::check)
}
