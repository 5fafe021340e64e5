//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::domain::membership::MembershipService;
use crate::realtime::ConnectionRegistry;

/// Dependency bundle for the WebSocket entry point and session loop.
#[derive(Clone)]
pub struct WsState {
    /// Resolves users to their current family at upgrade time.
    pub membership: Arc<MembershipService>,
    /// Fan-out registry connections register with.
    pub registry: Arc<ConnectionRegistry>,
}

impl WsState {
    /// Construct state from the shared service and registry.
    #[must_use]
    pub fn new(membership: Arc<MembershipService>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            membership,
            registry,
        }
    }
}
