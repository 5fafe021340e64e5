//! PostgreSQL-backed `MembershipRepository` implementation using Diesel.
//!
//! A thin adapter: translates between Diesel row models and domain types
//! and maps database failures onto the port's error taxonomy. No
//! membership rules live here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::family::{Family, FamilyId, InviteCode};
use crate::domain::ports::membership_repository::{MembershipRepository, MembershipStoreError};
use crate::domain::user::{User, UserId};

use super::models::{FamilyRow, NewFamilyRow, NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{families, users};

/// Diesel-backed implementation of the membership directory port.
#[derive(Clone)]
pub struct DieselMembershipRepository {
    pool: DbPool,
}

impl DieselMembershipRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MembershipStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            MembershipStoreError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> MembershipStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            MembershipStoreError::connection("database connection error")
        }
        DieselError::NotFound => MembershipStoreError::query("record not found"),
        _ => MembershipStoreError::query("database error"),
    }
}

fn row_to_family(row: FamilyRow) -> Result<Family, MembershipStoreError> {
    row.into_family().map_err(MembershipStoreError::query)
}

#[async_trait]
impl MembershipRepository for DieselMembershipRepository {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(User::from))
    }

    async fn create_user(&self, user: &User) -> Result<(), MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            id: user.id.get(),
            username: user.username.as_deref(),
            photo_url: user.photo_url.as_deref(),
            family_id: user.family_id.get(),
            last_seen: user.last_seen,
            visit_count: user.visit_count,
        };
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn record_visit(
        &self,
        id: UserId,
        username: Option<&str>,
        photo_url: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<(), MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(id.get()))
            .set((
                users::username.eq(username),
                users::photo_url.eq(photo_url),
                users::last_seen.eq(Some(seen_at)),
                users::visit_count.eq(users::visit_count + 1),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(MembershipStoreError::query("user not found"));
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .select(UserRow::as_select())
            .order(users::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn members_of(&self, family: FamilyId) -> Result<Vec<User>, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::family_id.eq(family.get()))
            .select(UserRow::as_select())
            .order(users::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create_family(
        &self,
        invite_code: &InviteCode,
        owner: Option<UserId>,
    ) -> Result<Family, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: FamilyRow = diesel::insert_into(families::table)
            .values(&NewFamilyRow {
                invite_code: invite_code.as_ref(),
                owner_id: owner.map(UserId::get),
            })
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_family(row)
    }

    async fn find_family(&self, id: FamilyId) -> Result<Option<Family>, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<FamilyRow> = families::table
            .find(id.get())
            .select(FamilyRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_family).transpose()
    }

    async fn find_family_by_invite(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Family>, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<FamilyRow> = families::table
            .filter(families::invite_code.eq(code.as_ref()))
            .select(FamilyRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_family).transpose()
    }

    async fn assign_family(
        &self,
        user: UserId,
        family: FamilyId,
    ) -> Result<(), MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(user.get()))
            .set(users::family_id.eq(family.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(MembershipStoreError::query("user not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping; queries need a live database
    //! and are exercised through the in-memory adapter instead.

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
            MembershipStoreError::Connection { .. }
        ));
    }

    #[test]
    fn other_database_errors_map_to_query_errors() {
        assert!(matches!(
            map_diesel_error(DieselError::NotFound),
            MembershipStoreError::Query { .. }
        ));
    }

    #[test]
    fn pool_errors_map_to_connection_errors() {
        assert!(matches!(
            map_pool_error(PoolError::checkout("timed out")),
            MembershipStoreError::Connection { .. }
        ));
    }
}
