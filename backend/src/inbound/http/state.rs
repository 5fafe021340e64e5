//! Shared HTTP adapter state.
//!
//! Handlers depend on the domain services through this bundle instead of
//! constructing them, which keeps the adapter testable with in-memory
//! storage.

use std::sync::Arc;

use crate::domain::list::ListService;
use crate::domain::membership::MembershipService;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Authentication, family moves, and the admin report.
    pub membership: Arc<MembershipService>,
    /// The authorised item mutation path.
    pub list: Arc<ListService>,
}

impl HttpState {
    /// Construct state from the shared services.
    #[must_use]
    pub fn new(membership: Arc<MembershipService>, list: Arc<ListService>) -> Self {
        Self { membership, list }
    }
}
