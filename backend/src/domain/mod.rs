//! Domain model and application services.
//!
//! Entities and services here are transport-agnostic: the HTTP and
//! WebSocket layers adapt onto them, and storage hangs off the traits in
//! [`ports`].

pub mod error;
pub mod events;
pub mod family;
pub mod item;
pub mod list;
pub mod membership;
pub mod ports;
pub mod user;

pub use error::{Error, ErrorCode};
pub use events::ListEvent;
pub use family::{Family, FamilyId, FamilySnapshot, InviteCode};
pub use item::{Item, ItemDraft, ItemId, DEFAULT_CATEGORY};
pub use list::{DeleteOutcome, ListService};
pub use membership::{AccountSnapshot, AdminPolicy, AuthProfile, MembershipService, UserActivity};
pub use user::{User, UserId};
