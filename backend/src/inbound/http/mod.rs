//! HTTP inbound adapter.
//!
//! Handlers validate and deserialise requests at the edge, call the domain
//! services through [`state::HttpState`], and map failures through the
//! shared [`error`] mapping.

pub mod admin;
pub mod auth;
pub mod error;
pub mod families;
pub mod health;
pub mod items;
pub mod state;

pub use error::ApiResult;
pub use health::HealthState;
