//! PostgreSQL-backed `ItemRepository` implementation using Diesel.
//!
//! Upserts use `ON CONFLICT` on the item's primary key so concurrent edits
//! from different devices converge on one row, and the conflict update
//! deliberately leaves `family_id` untouched.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::family::FamilyId;
use crate::domain::item::{Item, ItemId};
use crate::domain::ports::item_repository::{ItemRepository, ItemStoreError};

use super::models::{ItemRow, NewItemRow};
use super::pool::{DbPool, PoolError};
use super::schema::items;

/// Diesel-backed implementation of the item store port.
#[derive(Clone)]
pub struct DieselItemRepository {
    pool: DbPool,
}

impl DieselItemRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ItemStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            ItemStoreError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> ItemStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            ItemStoreError::connection("database connection error")
        }
        _ => ItemStoreError::query("database error"),
    }
}

fn row_to_item(row: ItemRow) -> Result<Item, ItemStoreError> {
    row.into_item().map_err(ItemStoreError::query)
}

#[async_trait]
impl ItemRepository for DieselItemRepository {
    async fn find(&self, id: &ItemId) -> Result<Option<Item>, ItemStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ItemRow> = items::table
            .find(id.as_ref())
            .select(ItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_item).transpose()
    }

    async fn list_by_family(&self, family: FamilyId) -> Result<Vec<Item>, ItemStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ItemRow> = items::table
            .filter(items::family_id.eq(family.get()))
            .select(ItemRow::as_select())
            .order(items::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_item).collect()
    }

    async fn upsert(&self, item: &Item) -> Result<(), ItemStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewItemRow {
            id: item.id.as_ref(),
            text: &item.text,
            is_bought: item.is_bought,
            category: &item.category,
            family_id: item.family_id.get(),
        };
        diesel::insert_into(items::table)
            .values(&row)
            .on_conflict(items::id)
            .do_update()
            .set((
                items::text.eq(&item.text),
                items::is_bought.eq(item.is_bought),
                items::category.eq(&item.category),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn delete(&self, id: &ItemId) -> Result<bool, ItemStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(items::table.find(id.as_ref()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping and row conversion edge cases.

    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    #[test]
    fn closed_connections_map_to_connection_errors() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("gone".to_owned()),
        );
        assert!(matches!(
            map_diesel_error(error),
            ItemStoreError::Connection { .. }
        ));
    }

    #[test]
    fn corrupt_stored_ids_surface_as_query_errors() {
        let row = ItemRow {
            id: "  ".into(),
            text: "Milk".into(),
            is_bought: false,
            category: "dairy".into(),
            family_id: 1,
        };
        assert!(matches!(
            row_to_item(row),
            Err(ItemStoreError::Query { .. })
        ));
    }
}
