//! Organizer route registration. `login` shares its prefix with the `{id}`
//! routes but never collides: those are GET/PUT/DELETE, login is POST.

use super::handlers;
use crate::router::{RouteError, Router};

pub fn register(router: &mut Router, prefix: &str) -> Result<(), RouteError> {
    let base = format!("{prefix}/organizers");

    router.get(&base, handlers::index)?;
    router.get(&format!("{base}/{{id}}"), handlers::show)?;
    router.post(&base, handlers::create)?;
    router.put(&format!("{base}/{{id}}"), handlers::update)?;
    router.delete(&format!("{base}/{{id}}"), handlers::delete)?;
    router.post(&format!("{base}/login"), handlers::login)?;
    Ok(())
}
