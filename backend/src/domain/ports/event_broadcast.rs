//! Port abstraction for fanning committed list mutations out to live
//! connections.

use async_trait::async_trait;

use crate::domain::events::ListEvent;
use crate::domain::family::FamilyId;
use crate::domain::user::UserId;

/// Best-effort fan-out of committed list mutations.
///
/// Delivery is fire-and-forget: implementations must not surface per-peer
/// failures to the caller, and a mutation must already be persisted before
/// it is broadcast.
#[async_trait]
pub trait EventBroadcast: Send + Sync {
    /// Deliver `event` to every live connection of `family`, excluding
    /// connections authenticated as `exclude`.
    async fn broadcast(&self, family: FamilyId, event: &ListEvent, exclude: UserId);
}

/// Broadcast sink that drops every event, for databaseless tooling and
/// service tests that do not observe fan-out.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEventBroadcast;

#[async_trait]
impl EventBroadcast for NoOpEventBroadcast {
    async fn broadcast(&self, _family: FamilyId, _event: &ListEvent, _exclude: UserId) {}
}
