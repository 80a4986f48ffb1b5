//! # Ballot Server
//!
//! REST front end for a [`ballot_core::VotingCore`].
//!
//! Admin-gated operations take a list of admin signatures over the action
//! digest returned by `GET /api/v1/action-digest`; votes carry the voter's
//! own signature. The `ballot-sign` binary produces both.

pub mod api;
pub mod config;

pub use api::{router, ApiError, AppState};
pub use config::{ElectionSettings, ServerConfig};
