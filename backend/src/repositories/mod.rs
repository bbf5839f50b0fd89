//! Database repositories for API entities.

pub mod event_repository;
pub mod organizer_repository;
pub mod token_repository;
