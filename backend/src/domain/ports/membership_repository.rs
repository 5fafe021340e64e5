//! Port abstraction for the membership directory (users and families).
//!
//! The directory is the authoritative user → family mapping. Production
//! backs this port with a Diesel adapter; tests and databaseless runs use
//! the in-memory implementation below.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::family::{Family, FamilyId, InviteCode};
use crate::domain::user::{User, UserId};

/// Persistence errors raised by membership directory adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipStoreError {
    /// Storage connection could not be established.
    #[error("membership store connection failed: {message}")]
    Connection {
        /// Adapter-provided failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("membership store query failed: {message}")]
    Query {
        /// Adapter-provided failure description.
        message: String,
    },
}

impl MembershipStoreError {
    /// Construct a [`MembershipStoreError::Connection`].
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Construct a [`MembershipStoreError::Query`].
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Authoritative persisted mapping of users to families.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, MembershipStoreError>;

    /// Insert a newly registered user.
    async fn create_user(&self, user: &User) -> Result<(), MembershipStoreError>;

    /// Refresh profile and presence fields and bump the visit counter.
    async fn record_visit(
        &self,
        id: UserId,
        username: Option<&str>,
        photo_url: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<(), MembershipStoreError>;

    /// All registered users, for the admin activity report.
    async fn list_users(&self) -> Result<Vec<User>, MembershipStoreError>;

    /// Current members of the given family.
    async fn members_of(&self, family: FamilyId) -> Result<Vec<User>, MembershipStoreError>;

    /// Allocate a new family with the given invite code and optional owner.
    async fn create_family(
        &self,
        invite_code: &InviteCode,
        owner: Option<UserId>,
    ) -> Result<Family, MembershipStoreError>;

    /// Fetch a family by identifier.
    async fn find_family(&self, id: FamilyId) -> Result<Option<Family>, MembershipStoreError>;

    /// Fetch a family by invite code.
    async fn find_family_by_invite(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Family>, MembershipStoreError>;

    /// Reassign a user into the given family.
    async fn assign_family(
        &self,
        user: UserId,
        family: FamilyId,
    ) -> Result<(), MembershipStoreError>;
}

#[derive(Default)]
struct DirectoryState {
    users: HashMap<i64, User>,
    families: HashMap<i32, Family>,
    next_family_id: i32,
}

/// In-memory membership directory used by tests and databaseless runs.
#[derive(Default)]
pub struct InMemoryMembershipRepository {
    state: Mutex<DirectoryState>,
}

impl InMemoryMembershipRepository {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DirectoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, MembershipStoreError> {
        Ok(self.lock().users.get(&id.get()).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<(), MembershipStoreError> {
        let mut state = self.lock();
        if state.users.contains_key(&user.id.get()) {
            return Err(MembershipStoreError::query("user already exists"));
        }
        state.users.insert(user.id.get(), user.clone());
        Ok(())
    }

    async fn record_visit(
        &self,
        id: UserId,
        username: Option<&str>,
        photo_url: Option<&str>,
        seen_at: DateTime<Utc>,
    ) -> Result<(), MembershipStoreError> {
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&id.get())
            .ok_or_else(|| MembershipStoreError::query("user not found"))?;
        user.username = username.map(ToOwned::to_owned);
        user.photo_url = photo_url.map(ToOwned::to_owned);
        user.last_seen = Some(seen_at);
        user.visit_count += 1;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, MembershipStoreError> {
        let mut users: Vec<User> = self.lock().users.values().cloned().collect();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    async fn members_of(&self, family: FamilyId) -> Result<Vec<User>, MembershipStoreError> {
        let mut members: Vec<User> = self
            .lock()
            .users
            .values()
            .filter(|user| user.family_id == family)
            .cloned()
            .collect();
        members.sort_by_key(|user| user.id);
        Ok(members)
    }

    async fn create_family(
        &self,
        invite_code: &InviteCode,
        owner: Option<UserId>,
    ) -> Result<Family, MembershipStoreError> {
        let mut state = self.lock();
        state.next_family_id += 1;
        let family = Family {
            id: FamilyId::new(state.next_family_id),
            invite_code: invite_code.clone(),
            owner_id: owner,
        };
        state.families.insert(family.id.get(), family.clone());
        Ok(family)
    }

    async fn find_family(&self, id: FamilyId) -> Result<Option<Family>, MembershipStoreError> {
        Ok(self.lock().families.get(&id.get()).cloned())
    }

    async fn find_family_by_invite(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Family>, MembershipStoreError> {
        Ok(self
            .lock()
            .families
            .values()
            .find(|family| &family.invite_code == code)
            .cloned())
    }

    async fn assign_family(
        &self,
        user: UserId,
        family: FamilyId,
    ) -> Result<(), MembershipStoreError> {
        let mut state = self.lock();
        if !state.families.contains_key(&family.get()) {
            return Err(MembershipStoreError::query("family not found"));
        }
        let user = state
            .users
            .get_mut(&user.get())
            .ok_or_else(|| MembershipStoreError::query("user not found"))?;
        user.family_id = family;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn seeded_user(id: i64, family: FamilyId) -> User {
        User::registered(UserId::new(id), None, None, family, Utc::now())
    }

    #[rstest]
    #[tokio::test]
    async fn record_visit_bumps_counter_and_presence() {
        let repo = InMemoryMembershipRepository::new();
        let family = repo
            .create_family(&InviteCode::generate(), None)
            .await
            .expect("create family");
        repo.create_user(&seeded_user(1, family.id))
            .await
            .expect("create user");

        let seen = Utc::now();
        repo.record_visit(UserId::new(1), Some("alice"), None, seen)
            .await
            .expect("record visit");

        let user = repo
            .find_user(UserId::new(1))
            .await
            .expect("find user")
            .expect("user present");
        assert_eq!(user.visit_count, 2);
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(user.last_seen, Some(seen));
    }

    #[rstest]
    #[tokio::test]
    async fn members_of_scopes_to_one_family() {
        let repo = InMemoryMembershipRepository::new();
        let f1 = repo
            .create_family(&InviteCode::generate(), None)
            .await
            .expect("create family");
        let f2 = repo
            .create_family(&InviteCode::generate(), None)
            .await
            .expect("create family");
        repo.create_user(&seeded_user(1, f1.id)).await.expect("user 1");
        repo.create_user(&seeded_user(2, f1.id)).await.expect("user 2");
        repo.create_user(&seeded_user(3, f2.id)).await.expect("user 3");

        let members = repo.members_of(f1.id).await.expect("members");
        let ids: Vec<i64> = members.iter().map(|user| user.id.get()).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
