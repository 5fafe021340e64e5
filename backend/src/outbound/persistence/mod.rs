//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repository implementations only translate between Diesel row models and
//! domain types; membership and list rules live in the domain services. Row
//! structs and schema definitions stay internal to this module, and
//! connections come from a `bb8` pool with native async support through
//! `diesel-async`.

mod diesel_item_repository;
mod diesel_membership_repository;
mod models;
mod pool;
mod schema;

pub use diesel_item_repository::DieselItemRepository;
pub use diesel_membership_repository::DieselMembershipRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
