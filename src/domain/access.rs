//! Read/write authorization derived from league visibility and ownership.
//!
//! Callers that cannot see a league get [`GatewayError::NotFound`], so a
//! private league's existence is never confirmed to outsiders. Callers that
//! can see a league but do not own it get [`GatewayError::Forbidden`] on
//! mutation.

use super::{League, UserId, Visibility};
use crate::error::GatewayError;

/// Stateless authorization checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGuard;

impl AccessGuard {
    /// Public leagues are visible to everyone; private ones to the owner.
    #[must_use]
    pub fn can_view(league: &League, viewer: Option<&UserId>) -> bool {
        league.visibility == Visibility::Public || viewer.is_some_and(|v| league.is_owned_by(v))
    }

    /// Only the owner may mutate a league.
    #[must_use]
    pub fn can_mutate(league: &League, requester: Option<&UserId>) -> bool {
        requester.is_some_and(|r| league.is_owned_by(r))
    }

    /// Fails unless `viewer` may read the league.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the league is hidden from
    /// the viewer.
    pub fn authorize_view(league: &League, viewer: Option<&UserId>) -> Result<(), GatewayError> {
        if Self::can_view(league, viewer) {
            Ok(())
        } else {
            Err(GatewayError::NotFound("league"))
        }
    }

    /// Fails unless `requester` may mutate the league.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Unauthorized`] for anonymous requesters.
    /// - [`GatewayError::NotFound`] when the league is hidden from them.
    /// - [`GatewayError::Forbidden`] when they can see it but do not own it.
    pub fn authorize_mutation(
        league: &League,
        requester: Option<&UserId>,
    ) -> Result<(), GatewayError> {
        let Some(requester) = requester else {
            return Err(GatewayError::Unauthorized);
        };
        if Self::can_mutate(league, Some(requester)) {
            return Ok(());
        }
        Self::authorize_view(league, Some(requester))?;
        Err(GatewayError::Forbidden(
            "only the league owner can do that".to_string(),
        ))
    }
}
