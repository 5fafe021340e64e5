//! Port abstraction for the shared shopping-list store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::family::FamilyId;
use crate::domain::item::{Item, ItemId};

/// Persistence errors raised by item store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemStoreError {
    /// Storage connection could not be established.
    #[error("item store connection failed: {message}")]
    Connection {
        /// Adapter-provided failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("item store query failed: {message}")]
    Query {
        /// Adapter-provided failure description.
        message: String,
    },
}

impl ItemStoreError {
    /// Construct an [`ItemStoreError::Connection`].
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Construct an [`ItemStoreError::Query`].
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Authoritative persisted store of shopping-list items.
///
/// Item identifiers form a single global namespace; an item carries its
/// owning family and updates never move it between families.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Fetch an item by identifier, regardless of owning family.
    async fn find(&self, id: &ItemId) -> Result<Option<Item>, ItemStoreError>;

    /// All items owned by the given family.
    async fn list_by_family(&self, family: FamilyId) -> Result<Vec<Item>, ItemStoreError>;

    /// Insert the item, or update `text`, `is_bought` and `category` when an
    /// item with the same identifier already exists. The stored owning
    /// family is preserved on update.
    async fn upsert(&self, item: &Item) -> Result<(), ItemStoreError>;

    /// Delete the item. Returns `false` when no such item existed.
    async fn delete(&self, id: &ItemId) -> Result<bool, ItemStoreError>;
}

/// In-memory item store used by tests and databaseless runs.
#[derive(Default)]
pub struct InMemoryItemRepository {
    items: Mutex<HashMap<ItemId, Item>>,
}

impl InMemoryItemRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ItemId, Item>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn find(&self, id: &ItemId) -> Result<Option<Item>, ItemStoreError> {
        Ok(self.lock().get(id).cloned())
    }

    async fn list_by_family(&self, family: FamilyId) -> Result<Vec<Item>, ItemStoreError> {
        let mut items: Vec<Item> = self
            .lock()
            .values()
            .filter(|item| item.family_id == family)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.as_ref().cmp(b.id.as_ref()));
        Ok(items)
    }

    async fn upsert(&self, item: &Item) -> Result<(), ItemStoreError> {
        let mut items = self.lock();
        match items.get_mut(&item.id) {
            Some(existing) => {
                existing.text = item.text.clone();
                existing.is_bought = item.is_bought;
                existing.category = item.category.clone();
            }
            None => {
                items.insert(item.id.clone(), item.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &ItemId) -> Result<bool, ItemStoreError> {
        Ok(self.lock().remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn milk() -> Item {
        Item {
            id: ItemId::new("milk").expect("valid id"),
            text: "Milk".into(),
            is_bought: false,
            category: "dairy".into(),
            family_id: FamilyId::new(1),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn upsert_preserves_owning_family(milk: Item) {
        let repo = InMemoryItemRepository::new();
        repo.upsert(&milk).await.expect("insert");

        let mut edited = milk.clone();
        edited.text = "Oat milk".into();
        edited.is_bought = true;
        edited.family_id = FamilyId::new(99);
        repo.upsert(&edited).await.expect("update");

        let stored = repo.find(&milk.id).await.expect("find").expect("present");
        assert_eq!(stored.text, "Oat milk");
        assert!(stored.is_bought);
        assert_eq!(stored.family_id, FamilyId::new(1));
    }

    #[rstest]
    #[tokio::test]
    async fn delete_reports_whether_the_item_existed(milk: Item) {
        let repo = InMemoryItemRepository::new();
        repo.upsert(&milk).await.expect("insert");
        assert!(repo.delete(&milk.id).await.expect("delete"));
        assert!(!repo.delete(&milk.id).await.expect("repeat delete"));
    }

    #[rstest]
    #[tokio::test]
    async fn listing_scopes_to_one_family(milk: Item) {
        let repo = InMemoryItemRepository::new();
        repo.upsert(&milk).await.expect("insert");
        let mut other = milk.clone();
        other.id = ItemId::new("bread").expect("valid id");
        other.family_id = FamilyId::new(2);
        repo.upsert(&other).await.expect("insert");

        let items = repo.list_by_family(FamilyId::new(1)).await.expect("list");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, milk.id);
    }
}
