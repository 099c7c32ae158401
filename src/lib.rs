//! # ladder-gateway
//!
//! REST API for recreational leagues: invite-code membership, match logging
//! and standings derived from the match log on every read.
//!
//! All entities live in one logical table with three secondary indexes.
//! Every write is a conditional put/update/delete or an all-or-nothing
//! transaction of them, so concurrent requests coordinate through the store
//! alone.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── Caller identity (auth/)
//!     │
//!     ├── LeagueService (service/)
//!     │
//!     ├── AccessGuard, InviteCodeGenerator,
//!     │   StandingsAggregator (domain/)
//!     │
//!     ├── IndexMaintainer (persistence/)
//!     └── EntityStore: memory | PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
