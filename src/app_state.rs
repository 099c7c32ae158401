//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{JwtVerifier, TokenVerifier};
use crate::config::GatewayConfig;
use crate::domain::{EntropyRng, InviteCodeGenerator};
use crate::persistence::EntityStore;
use crate::service::LeagueService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// League service for all business logic.
    pub league_service: Arc<LeagueService>,
    /// Bearer-token verifier; `None` when no signing secret is configured.
    pub verifier: Option<Arc<dyn TokenVerifier>>,
    /// Honour identity fields in request bodies.
    pub trust_body_identity: bool,
}

impl AppState {
    /// Wires the service and identity layer over `store` as configured.
    #[must_use]
    pub fn from_config(config: &GatewayConfig, store: Arc<dyn EntityStore>) -> Self {
        let invites = InviteCodeGenerator::new(Arc::new(EntropyRng), config.invite_collision_policy);
        let league_service = Arc::new(LeagueService::new(
            store,
            invites,
            config.standings_match_window,
        ));
        let verifier = config.auth_jwt_secret.as_deref().map(|secret| {
            Arc::new(JwtVerifier::hs256(
                secret,
                Duration::from_secs(config.auth_key_ttl_secs),
            )) as Arc<dyn TokenVerifier>
        });
        Self {
            league_service,
            verifier,
            trust_body_identity: config.trust_body_identity,
        }
    }
}
