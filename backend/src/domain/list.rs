//! List service: the single authorised write path for shopping-list items.
//!
//! Every mutation resolves the acting user's family first, authorises the
//! change against it, persists it, and only then hands the event to the
//! broadcast port. Fan-out failures never affect the HTTP outcome.

use std::sync::Arc;

use super::error::Error;
use super::events::ListEvent;
use super::item::{Item, ItemDraft, ItemId};
use super::ports::event_broadcast::EventBroadcast;
use super::ports::item_repository::{ItemRepository, ItemStoreError};
use super::ports::membership_repository::{MembershipRepository, MembershipStoreError};
use super::user::{User, UserId};

/// Outcome of a delete request.
///
/// Deleting an item that is already gone is reported distinctly so the
/// HTTP layer can answer idempotent repeats without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The item existed and was removed.
    Deleted,
    /// No item with that identifier existed.
    NotFound,
}

/// Application service over the item store, scoped per acting user.
pub struct ListService {
    items: Arc<dyn ItemRepository>,
    members: Arc<dyn MembershipRepository>,
    events: Arc<dyn EventBroadcast>,
}

fn map_item_error(err: ItemStoreError) -> Error {
    match err {
        ItemStoreError::Connection { message } => {
            tracing::error!(error = %message, "item store unavailable");
            Error::service_unavailable("item store is unavailable")
        }
        ItemStoreError::Query { message } => {
            tracing::error!(error = %message, "item store query failed");
            Error::internal(message)
        }
    }
}

fn map_member_error(err: MembershipStoreError) -> Error {
    match err {
        MembershipStoreError::Connection { message } => {
            tracing::error!(error = %message, "membership store unavailable");
            Error::service_unavailable("membership store is unavailable")
        }
        MembershipStoreError::Query { message } => {
            tracing::error!(error = %message, "membership store query failed");
            Error::internal(message)
        }
    }
}

impl ListService {
    /// Build the service over its storage and broadcast ports.
    #[must_use]
    pub fn new(
        items: Arc<dyn ItemRepository>,
        members: Arc<dyn MembershipRepository>,
        events: Arc<dyn EventBroadcast>,
    ) -> Self {
        Self {
            items,
            members,
            events,
        }
    }

    /// The acting user's current family list.
    pub async fn list_items(&self, actor: UserId) -> Result<Vec<Item>, Error> {
        let actor = self.require_user(actor).await?;
        self.items
            .list_by_family(actor.family_id)
            .await
            .map_err(map_item_error)
    }

    /// Create or update an item in the acting user's family list.
    ///
    /// An existing item keeps its original owning family; only `text`,
    /// `is_bought` and `category` change. The committed event is broadcast
    /// to the item's family, excluding the actor's own connections.
    pub async fn upsert_item(&self, actor: UserId, draft: ItemDraft) -> Result<Item, Error> {
        let actor = self.require_user(actor).await?;
        let existing = self.items.find(&draft.id).await.map_err(map_item_error)?;
        let owning_family = existing.map_or(actor.family_id, |stored| stored.family_id);
        let item = draft.into_item(owning_family);
        self.items.upsert(&item).await.map_err(map_item_error)?;
        self.events
            .broadcast(item.family_id, &ListEvent::upserted(&item), actor.id)
            .await;
        Ok(item)
    }

    /// Delete an item from the acting user's family list.
    ///
    /// Deleting an absent item succeeds with [`DeleteOutcome::NotFound`]
    /// and broadcasts nothing. Deleting an item owned by another family is
    /// forbidden.
    pub async fn delete_item(&self, actor: UserId, id: &ItemId) -> Result<DeleteOutcome, Error> {
        let Some(item) = self.items.find(id).await.map_err(map_item_error)? else {
            return Ok(DeleteOutcome::NotFound);
        };
        let actor = self.require_user(actor).await?;
        if item.family_id != actor.family_id {
            return Err(Error::forbidden("that item belongs to another family"));
        }
        let removed = self.items.delete(id).await.map_err(map_item_error)?;
        if !removed {
            // Lost a race with a concurrent delete.
            return Ok(DeleteOutcome::NotFound);
        }
        self.events
            .broadcast(
                item.family_id,
                &ListEvent::deleted(item.id.clone()),
                actor.id,
            )
            .await;
        Ok(DeleteOutcome::Deleted)
    }

    async fn require_user(&self, id: UserId) -> Result<User, Error> {
        self.members
            .find_user(id)
            .await
            .map_err(map_member_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::family::{FamilyId, InviteCode};
    use crate::domain::item::DEFAULT_CATEGORY;
    use crate::domain::ports::item_repository::InMemoryItemRepository;
    use crate::domain::ports::membership_repository::InMemoryMembershipRepository;
    use async_trait::async_trait;
    use chrono::Utc;
    use rstest::rstest;
    use std::sync::Mutex;

    /// Broadcast double that records every event it is handed.
    #[derive(Default)]
    struct RecordingBroadcast {
        sent: Mutex<Vec<(FamilyId, ListEvent, UserId)>>,
    }

    impl RecordingBroadcast {
        fn sent(&self) -> Vec<(FamilyId, ListEvent, UserId)> {
            match self.sent.lock() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            }
        }
    }

    #[async_trait]
    impl EventBroadcast for RecordingBroadcast {
        async fn broadcast(&self, family: FamilyId, event: &ListEvent, exclude: UserId) {
            match self.sent.lock() {
                Ok(mut guard) => guard.push((family, event.clone(), exclude)),
                Err(poisoned) => poisoned.into_inner().push((family, event.clone(), exclude)),
            }
        }
    }

    /// Item store double whose writes always fail.
    struct FailingItemRepository;

    #[async_trait]
    impl ItemRepository for FailingItemRepository {
        async fn find(&self, _id: &ItemId) -> Result<Option<Item>, ItemStoreError> {
            Ok(None)
        }

        async fn list_by_family(&self, _family: FamilyId) -> Result<Vec<Item>, ItemStoreError> {
            Ok(Vec::new())
        }

        async fn upsert(&self, _item: &Item) -> Result<(), ItemStoreError> {
            Err(ItemStoreError::connection("store offline"))
        }

        async fn delete(&self, _id: &ItemId) -> Result<bool, ItemStoreError> {
            Err(ItemStoreError::connection("store offline"))
        }
    }

    struct Harness {
        service: ListService,
        members: Arc<InMemoryMembershipRepository>,
        broadcast: Arc<RecordingBroadcast>,
    }

    async fn harness() -> Harness {
        let members = Arc::new(InMemoryMembershipRepository::new());
        let broadcast = Arc::new(RecordingBroadcast::default());
        let service = ListService::new(
            Arc::new(InMemoryItemRepository::new()),
            Arc::clone(&members) as Arc<dyn MembershipRepository>,
            Arc::clone(&broadcast) as Arc<dyn EventBroadcast>,
        );
        Harness {
            service,
            members,
            broadcast,
        }
    }

    async fn seed_user(members: &InMemoryMembershipRepository, id: i64) -> FamilyId {
        let family = members
            .create_family(&InviteCode::generate(), Some(UserId::new(id)))
            .await
            .expect("create family");
        let user = User::registered(UserId::new(id), None, None, family.id, Utc::now());
        members.create_user(&user).await.expect("create user");
        family.id
    }

    fn draft(id: &str, text: &str) -> ItemDraft {
        ItemDraft {
            id: ItemId::new(id).expect("valid id"),
            text: text.into(),
            is_bought: false,
            category: DEFAULT_CATEGORY.into(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn upsert_persists_then_broadcasts_excluding_the_actor() {
        let h = harness().await;
        let family = seed_user(&h.members, 1).await;

        let item = h
            .service
            .upsert_item(UserId::new(1), draft("milk", "Milk"))
            .await
            .expect("upsert");
        assert_eq!(item.family_id, family);

        let sent = h.broadcast.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, family);
        assert_eq!(sent[0].1, ListEvent::upserted(&item));
        assert_eq!(sent[0].2, UserId::new(1));
    }

    #[rstest]
    #[tokio::test]
    async fn update_keeps_the_original_owning_family() {
        let h = harness().await;
        let first_family = seed_user(&h.members, 1).await;
        seed_user(&h.members, 2).await;

        h.service
            .upsert_item(UserId::new(1), draft("milk", "Milk"))
            .await
            .expect("insert");
        let updated = h
            .service
            .upsert_item(UserId::new(2), draft("milk", "Oat milk"))
            .await
            .expect("update");

        assert_eq!(updated.family_id, first_family);
        assert_eq!(updated.text, "Oat milk");
        // The event targets the item's family, not the editor's.
        let sent = h.broadcast.sent();
        assert_eq!(sent[1].0, first_family);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_actor_cannot_mutate() {
        let h = harness().await;
        let err = h
            .service
            .upsert_item(UserId::new(42), draft("milk", "Milk"))
            .await
            .expect_err("unknown actor");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(h.broadcast.sent().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_an_absent_item_is_neutral() {
        let h = harness().await;
        seed_user(&h.members, 1).await;
        let outcome = h
            .service
            .delete_item(UserId::new(1), &ItemId::new("ghost").expect("valid id"))
            .await
            .expect("delete");
        assert_eq!(outcome, DeleteOutcome::NotFound);
        assert!(h.broadcast.sent().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_another_familys_item_is_forbidden() {
        let h = harness().await;
        seed_user(&h.members, 1).await;
        seed_user(&h.members, 2).await;
        h.service
            .upsert_item(UserId::new(1), draft("milk", "Milk"))
            .await
            .expect("insert");

        let err = h
            .service
            .delete_item(UserId::new(2), &ItemId::new("milk").expect("valid id"))
            .await
            .expect_err("cross-family delete");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_broadcasts_after_removal() {
        let h = harness().await;
        let family = seed_user(&h.members, 1).await;
        h.service
            .upsert_item(UserId::new(1), draft("milk", "Milk"))
            .await
            .expect("insert");

        let outcome = h
            .service
            .delete_item(UserId::new(1), &ItemId::new("milk").expect("valid id"))
            .await
            .expect("delete");
        assert_eq!(outcome, DeleteOutcome::Deleted);

        let sent = h.broadcast.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[1].1,
            ListEvent::deleted(ItemId::new("milk").expect("valid id"))
        );
        assert_eq!(sent[1].0, family);
    }

    #[rstest]
    #[tokio::test]
    async fn storage_failure_prevents_any_broadcast() {
        let members = Arc::new(InMemoryMembershipRepository::new());
        seed_user(&members, 1).await;
        let broadcast = Arc::new(RecordingBroadcast::default());
        let service = ListService::new(
            Arc::new(FailingItemRepository),
            Arc::clone(&members) as Arc<dyn MembershipRepository>,
            Arc::clone(&broadcast) as Arc<dyn EventBroadcast>,
        );

        let err = service
            .upsert_item(UserId::new(1), draft("milk", "Milk"))
            .await
            .expect_err("store offline");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
        assert!(broadcast.sent().is_empty());
    }
}
