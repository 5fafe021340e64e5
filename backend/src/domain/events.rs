//! List mutation events pushed to live connections.
//!
//! Events are serialised as `{"type": "item_upserted" | "item_deleted", ...}`
//! envelopes. A reconnecting client does not replay missed events; it
//! reconciles by re-fetching the full item list.

use serde::{Deserialize, Serialize};

use super::item::{Item, ItemId};

/// A committed list mutation, fanned out to the owning family's other live
/// connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ListEvent {
    /// An item was created or updated.
    ItemUpserted {
        /// Client-supplied identifier.
        id: ItemId,
        /// Free-text label.
        text: String,
        /// Whether the item has been purchased.
        is_bought: bool,
        /// Category label.
        category: String,
    },
    /// An item was deleted.
    ItemDeleted {
        /// Client-supplied identifier.
        id: ItemId,
    },
}

impl ListEvent {
    /// Event describing the given upserted item.
    #[must_use]
    pub fn upserted(item: &Item) -> Self {
        Self::ItemUpserted {
            id: item.id.clone(),
            text: item.text.clone(),
            is_bought: item.is_bought,
            category: item.category.clone(),
        }
    }

    /// Event describing the deletion of the given item.
    #[must_use]
    pub fn deleted(id: ItemId) -> Self {
        Self::ItemDeleted { id }
    }
}
