//! Service layer: business logic orchestration.
//!
//! [`LeagueService`] authorizes each request through the
//! [`crate::domain::AccessGuard`] and turns it into conditional writes on
//! the [`crate::persistence::EntityStore`].

pub mod league_service;

pub use league_service::{LeagueService, MatchEntry};
