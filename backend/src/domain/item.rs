//! Shopping-list item model.
//!
//! Item identifiers are supplied by clients (UUIDs in practice) so that
//! concurrent edits from different devices target the same record. The
//! owning family is fixed at creation and never reassigned by updates.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::family::FamilyId;

/// Sentinel category for items filed under no category.
pub const DEFAULT_CATEGORY: &str = "dept_none";

/// Maximum accepted length of a client-supplied item identifier.
pub const ITEM_ID_MAX: usize = 64;

/// Validation errors for [`ItemId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemIdValidationError {
    /// The identifier is empty or only whitespace.
    #[error("item id must not be empty")]
    Empty,
    /// The identifier has surrounding whitespace.
    #[error("item id must not have surrounding whitespace")]
    Untrimmed,
    /// The identifier exceeds [`ITEM_ID_MAX`] characters.
    #[error("item id must be at most {ITEM_ID_MAX} characters")]
    TooLong,
}

/// Opaque client-supplied item identifier, stable across edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Validate and wrap a client-supplied identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, ItemIdValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ItemIdValidationError::Empty);
        }
        if id.trim() != id {
            return Err(ItemIdValidationError::Untrimmed);
        }
        if id.chars().count() > ITEM_ID_MAX {
            return Err(ItemIdValidationError::TooLong);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<ItemId> for String {
    fn from(value: ItemId) -> Self {
        value.0
    }
}

impl TryFrom<String> for ItemId {
    type Error = ItemIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// One shopping-list entry owned by a family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Client-supplied identifier.
    pub id: ItemId,
    /// Free-text label.
    pub text: String,
    /// Whether the item has been purchased.
    pub is_bought: bool,
    /// Category label; [`DEFAULT_CATEGORY`] when unset.
    pub category: String,
    /// Owning family, fixed at creation.
    pub family_id: FamilyId,
}

/// Client-supplied fields of an item upsert, before the owning family is
/// resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    /// Client-supplied identifier.
    pub id: ItemId,
    /// Free-text label.
    pub text: String,
    /// Whether the item has been purchased.
    pub is_bought: bool,
    /// Category label.
    pub category: String,
}

impl ItemDraft {
    /// Bind the draft to an owning family, producing a persistable item.
    #[must_use]
    pub fn into_item(self, family_id: FamilyId) -> Item {
        Item {
            id: self.id,
            text: self.text,
            is_bought: self.is_bought,
            category: self.category,
            family_id,
        }
    }
}
