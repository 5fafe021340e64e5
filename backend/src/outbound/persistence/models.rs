//! Diesel row models for the persistence adapters.
//!
//! Row structs are internal to the persistence layer; adapters convert them
//! to domain types at the boundary and surface invalid stored data as query
//! errors rather than panicking.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{families, items, users};
use crate::domain::family::{Family, FamilyId, InviteCode};
use crate::domain::item::{Item, ItemId};
use crate::domain::user::{User, UserId};

/// Row of the `families` table.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = families)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FamilyRow {
    /// Primary key.
    pub id: i32,
    /// Join token.
    pub invite_code: String,
    /// Current owner, when set.
    pub owner_id: Option<i64>,
}

/// Insertable form of a new family.
#[derive(Debug, Insertable)]
#[diesel(table_name = families)]
pub struct NewFamilyRow<'a> {
    /// Join token.
    pub invite_code: &'a str,
    /// Current owner, when set.
    pub owner_id: Option<i64>,
}

impl FamilyRow {
    /// Convert to the domain family, validating the stored invite code.
    pub fn into_family(self) -> Result<Family, String> {
        let invite_code = InviteCode::new(self.invite_code)
            .map_err(|err| format!("family {} has an invalid invite code: {err}", self.id))?;
        Ok(Family {
            id: FamilyId::new(self.id),
            invite_code,
            owner_id: self.owner_id.map(UserId::new),
        })
    }
}

/// Row of the `users` table.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// Externally issued identifier.
    pub id: i64,
    /// Display name.
    pub username: Option<String>,
    /// Avatar reference.
    pub photo_url: Option<String>,
    /// Current family.
    pub family_id: i32,
    /// Most recent authentication.
    pub last_seen: Option<DateTime<Utc>>,
    /// Cumulative authentications.
    pub visit_count: i64,
}

/// Insertable form of a new user.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    /// Externally issued identifier.
    pub id: i64,
    /// Display name.
    pub username: Option<&'a str>,
    /// Avatar reference.
    pub photo_url: Option<&'a str>,
    /// Current family.
    pub family_id: i32,
    /// Most recent authentication.
    pub last_seen: Option<DateTime<Utc>>,
    /// Cumulative authentications.
    pub visit_count: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            username: row.username,
            photo_url: row.photo_url,
            family_id: FamilyId::new(row.family_id),
            last_seen: row.last_seen,
            visit_count: row.visit_count,
        }
    }
}

/// Row of the `items` table.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ItemRow {
    /// Client-supplied identifier.
    pub id: String,
    /// Free-text label.
    pub text: String,
    /// Whether the item has been purchased.
    pub is_bought: bool,
    /// Category label.
    pub category: String,
    /// Owning family.
    pub family_id: i32,
}

/// Insertable form of an item.
#[derive(Debug, Insertable)]
#[diesel(table_name = items)]
pub struct NewItemRow<'a> {
    /// Client-supplied identifier.
    pub id: &'a str,
    /// Free-text label.
    pub text: &'a str,
    /// Whether the item has been purchased.
    pub is_bought: bool,
    /// Category label.
    pub category: &'a str,
    /// Owning family.
    pub family_id: i32,
}

impl ItemRow {
    /// Convert to the domain item, validating the stored identifier.
    pub fn into_item(self) -> Result<Item, String> {
        let id = ItemId::new(self.id).map_err(|err| format!("stored item id invalid: {err}"))?;
        Ok(Item {
            id,
            text: self.text,
            is_bought: self.is_bought,
            category: self.category,
            family_id: FamilyId::new(self.family_id),
        })
    }
}
