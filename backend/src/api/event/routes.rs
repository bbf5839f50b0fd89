//! Event route registration. The `{organizer_id}` segment carries the
//! URL-safe encrypted organizer token.

use super::handlers;
use crate::router::{RouteError, Router};

pub fn register(router: &mut Router, prefix: &str) -> Result<(), RouteError> {
    let base = format!("{prefix}/organizers/{{organizer_id}}/events");

    router.get(&base, handlers::index)?;
    router.get(&format!("{base}/{{id}}"), handlers::show)?;
    router.post(&base, handlers::create)?;
    router.put(&format!("{base}/{{id}}"), handlers::update)?;
    router.delete(&format!("{base}/{{id}}"), handlers::delete)?;
    router.get(&format!("{base}/status/{{status}}"), handlers::get_by_status)?;
    Ok(())
}
