//! Auth route registration. These routes are on the auth bypass list; they
//! bootstrap credentials for everything else.

use super::handlers;
use crate::router::{RouteError, Router};

pub fn register(router: &mut Router, prefix: &str) -> Result<(), RouteError> {
    router.post(&format!("{prefix}/auth/token"), handlers::generate_token_pair)?;
    router.post(&format!("{prefix}/auth/refresh"), handlers::refresh_token)?;
    router.post(
        &format!("{prefix}/auth/organizer-id"),
        handlers::get_encrypted_organizer_id,
    )?;
    router.post(&format!("{prefix}/auth/decrypt"), handlers::decrypt)?;
    Ok(())
}
