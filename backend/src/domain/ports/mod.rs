//! Ports connecting domain services to their adapters.

pub mod event_broadcast;
pub mod item_repository;
pub mod membership_repository;

pub use event_broadcast::{EventBroadcast, NoOpEventBroadcast};
pub use item_repository::{InMemoryItemRepository, ItemRepository, ItemStoreError};
pub use membership_repository::{
    InMemoryMembershipRepository, MembershipRepository, MembershipStoreError,
};
