//! Shared DTO types used across multiple endpoints.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Page size query parameter for list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct LimitParams {
    /// Maximum number of items (1–200). Defaults to 50.
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Body of owner-only actions that carry no other payload.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequesterBody {
    /// Acting user; only honoured when body identity is trusted.
    #[serde(default)]
    pub requester_id: Option<String>,
}
