//! Data Transfer Objects for REST request/response serialization.
//!
//! All JSON field names are camelCase.

pub mod common_dto;
pub mod league_dto;
pub mod match_dto;
pub mod standings_dto;

pub use common_dto::*;
pub use league_dto::*;
pub use match_dto::*;
pub use standings_dto::*;
