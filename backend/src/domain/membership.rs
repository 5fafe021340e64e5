//! Membership service: authentication, family moves, and the admin
//! activity report.
//!
//! All family transitions preserve one invariant: every user belongs to
//! exactly one family at all times. Whenever a user must end up without a
//! household (first sign-in, leaving, being removed), the service allocates
//! a fresh solo family and makes them its owner before letting go of the
//! old binding.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::error::Error;
use super::family::{Family, FamilyId, FamilySnapshot, InviteCode};
use super::ports::membership_repository::{MembershipRepository, MembershipStoreError};
use super::user::{User, UserId};

/// How recently a user must have authenticated to count as online in the
/// admin report, in seconds.
pub const ONLINE_WINDOW_SECS: i64 = 300;

/// Identity attributes asserted by the external provider on sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthProfile {
    /// Externally issued user identifier.
    pub id: UserId,
    /// Display name, when supplied.
    pub username: Option<String>,
    /// Avatar reference, when supplied.
    pub photo_url: Option<String>,
}

/// Result of an authentication or family transition, sufficient for the
/// client to render the account screen.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    /// The user after the operation.
    pub user: User,
    /// The user's family after the operation.
    pub family: FamilySnapshot,
}

/// One row of the admin activity report.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    /// Externally issued user identifier.
    pub id: UserId,
    /// Display name, when supplied.
    pub username: Option<String>,
    /// Avatar reference, when supplied.
    pub photo_url: Option<String>,
    /// Timestamp of the most recent authentication.
    pub last_seen: Option<chrono::DateTime<chrono::Utc>>,
    /// Whether the user authenticated within the online window.
    pub is_online: bool,
    /// The family the user currently belongs to.
    pub family_id: FamilyId,
    /// Cumulative number of authentications.
    pub visit_count: i64,
}

/// Configured allow-list of users permitted to read the admin report.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    admins: HashSet<UserId>,
}

impl AdminPolicy {
    /// Build a policy from the configured admin user ids.
    #[must_use]
    pub fn new(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    /// Whether the given user may read the admin report.
    #[must_use]
    pub fn allows(&self, user: UserId) -> bool {
        self.admins.contains(&user)
    }
}

/// Application service over the membership directory.
pub struct MembershipService {
    store: Arc<dyn MembershipRepository>,
    admin: AdminPolicy,
}

fn map_store_error(err: MembershipStoreError) -> Error {
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

impl MembershipService {
    /// Build the service over a membership directory adapter.
    #[must_use]
    pub fn new(store: Arc<dyn MembershipRepository>, admin: AdminPolicy) -> Self {
        Self { store, admin }
    }

    /// Register or refresh a user and return their account snapshot.
    ///
    /// First sign-in allocates a fresh solo family owned by the user.
    /// Subsequent sign-ins refresh profile and presence fields and bump the
    /// visit counter.
    pub async fn authenticate(&self, profile: AuthProfile) -> Result<AccountSnapshot, Error> {
        let now = Utc::now();
        let user = match self
            .store
            .find_user(profile.id)
            .await
            .map_err(map_store_error)?
        {
            Some(_) => {
                self.store
                    .record_visit(
                        profile.id,
                        profile.username.as_deref(),
                        profile.photo_url.as_deref(),
                        now,
                    )
                    .await
                    .map_err(map_store_error)?;
                self.require_user(profile.id).await?
            }
            None => {
                let family = self.create_solo_family(profile.id).await?;
                let user = User::registered(
                    profile.id,
                    profile.username,
                    profile.photo_url,
                    family.id,
                    now,
                );
                self.store
                    .create_user(&user)
                    .await
                    .map_err(map_store_error)?;
                user
            }
        };
        self.snapshot_for(&user).await
    }

    /// Move a user into the family identified by `invite_code`.
    pub async fn join_family(
        &self,
        user_id: UserId,
        invite_code: &InviteCode,
    ) -> Result<AccountSnapshot, Error> {
        let user = self.require_user(user_id).await?;
        let family = self
            .store
            .find_family_by_invite(invite_code)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found("no family with that invite code"))?;
        if user.family_id == family.id {
            return self.snapshot_for(&user).await;
        }
        self.store
            .assign_family(user_id, family.id)
            .await
            .map_err(map_store_error)?;
        let user = self.require_user(user_id).await?;
        self.snapshot_for(&user).await
    }

    /// Move a user out of their current family into a fresh solo family
    /// they own.
    pub async fn leave_family(&self, user_id: UserId) -> Result<AccountSnapshot, Error> {
        let user = self.require_user(user_id).await?;
        let solo = self.create_solo_family(user.id).await?;
        self.store
            .assign_family(user.id, solo.id)
            .await
            .map_err(map_store_error)?;
        let user = self.require_user(user_id).await?;
        self.snapshot_for(&user).await
    }

    /// Eject `target` from the owner's family into a fresh solo family.
    ///
    /// Only the family owner may remove members, owners cannot remove
    /// themselves, and the target must currently belong to the owner's
    /// family. Returns the owner's post-removal snapshot.
    pub async fn remove_member(
        &self,
        owner_id: UserId,
        target_id: UserId,
    ) -> Result<AccountSnapshot, Error> {
        if owner_id == target_id {
            return Err(Error::invalid_request(
                "owners cannot remove themselves; leave the family instead",
            ));
        }
        let owner = self.require_user(owner_id).await?;
        let family = self.require_family(owner.family_id).await?;
        if family.owner_id != Some(owner_id) {
            return Err(Error::forbidden("only the family owner may remove members"));
        }
        let target = self.require_user(target_id).await?;
        if target.family_id != family.id {
            return Err(Error::invalid_request(
                "that user is not a member of your family",
            ));
        }
        let solo = self.create_solo_family(target.id).await?;
        self.store
            .assign_family(target.id, solo.id)
            .await
            .map_err(map_store_error)?;
        let owner = self.require_user(owner_id).await?;
        self.snapshot_for(&owner).await
    }

    /// The activity report across all registered users, gated on the admin
    /// allow-list.
    pub async fn admin_stats(&self, requester: UserId) -> Result<Vec<UserActivity>, Error> {
        if !self.admin.allows(requester) {
            return Err(Error::forbidden("admin access required"));
        }
        let cutoff = Utc::now() - Duration::seconds(ONLINE_WINDOW_SECS);
        let users = self.store.list_users().await.map_err(map_store_error)?;
        Ok(users
            .into_iter()
            .map(|user| UserActivity {
                id: user.id,
                username: user.username,
                photo_url: user.photo_url,
                is_online: user.last_seen.is_some_and(|seen| seen > cutoff),
                last_seen: user.last_seen,
                family_id: user.family_id,
                visit_count: user.visit_count,
            })
            .collect())
    }

    /// Resolve the family a user currently belongs to, for scoping a live
    /// connection at registration time.
    pub async fn resolve_family(&self, user_id: UserId) -> Result<FamilyId, Error> {
        let user = self.require_user(user_id).await?;
        Ok(user.family_id)
    }

    async fn require_user(&self, id: UserId) -> Result<User, Error> {
        self.store
            .find_user(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn require_family(&self, id: FamilyId) -> Result<Family, Error> {
        self.store
            .find_family(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::internal(format!("family {id} missing from directory")))
    }

    async fn create_solo_family(&self, owner: UserId) -> Result<Family, Error> {
        self.store
            .create_family(&InviteCode::generate(), Some(owner))
            .await
            .map_err(map_store_error)
    }

    async fn snapshot_for(&self, user: &User) -> Result<AccountSnapshot, Error> {
        let family = self.require_family(user.family_id).await?;
        let members = self
            .store
            .members_of(family.id)
            .await
            .map_err(map_store_error)?;
        Ok(AccountSnapshot {
            user: user.clone(),
            family: FamilySnapshot::for_viewer(&family, members, user.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::membership_repository::InMemoryMembershipRepository;
    use rstest::{fixture, rstest};

    #[fixture]
    fn service() -> MembershipService {
        MembershipService::new(
            Arc::new(InMemoryMembershipRepository::new()),
            AdminPolicy::new([UserId::new(999)]),
        )
    }

    fn profile(id: i64) -> AuthProfile {
        AuthProfile {
            id: UserId::new(id),
            username: Some(format!("user{id}")),
            photo_url: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn first_sign_in_allocates_an_owned_solo_family(service: MembershipService) {
        let snapshot = service.authenticate(profile(1)).await.expect("auth");
        assert_eq!(snapshot.user.visit_count, 1);
        assert!(snapshot.family.is_owner);
        assert_eq!(snapshot.family.members.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn repeat_sign_in_bumps_the_visit_counter(service: MembershipService) {
        service.authenticate(profile(1)).await.expect("first auth");
        let snapshot = service.authenticate(profile(1)).await.expect("second auth");
        assert_eq!(snapshot.user.visit_count, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn joining_moves_the_user_into_the_invited_family(service: MembershipService) {
        let host = service.authenticate(profile(1)).await.expect("host auth");
        let guest = service.authenticate(profile(2)).await.expect("guest auth");

        let joined = service
            .join_family(guest.user.id, &host.family.invite_code)
            .await
            .expect("join");
        assert_eq!(joined.family.id, host.family.id);
        assert!(!joined.family.is_owner);
        assert_eq!(joined.family.members.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn joining_with_an_unknown_code_is_not_found(service: MembershipService) {
        let guest = service.authenticate(profile(2)).await.expect("auth");
        let err = service
            .join_family(guest.user.id, &InviteCode::generate())
            .await
            .expect_err("unknown code");
        assert_eq!(err.code(), ErrorCode::NotFound);

        // The failed join must not have moved the user.
        let after = service.authenticate(profile(2)).await.expect("re-auth");
        assert_eq!(after.family.id, guest.family.id);
    }

    #[rstest]
    #[tokio::test]
    async fn leaving_lands_the_user_in_a_fresh_owned_family(service: MembershipService) {
        let host = service.authenticate(profile(1)).await.expect("host auth");
        let guest = service.authenticate(profile(2)).await.expect("guest auth");
        service
            .join_family(guest.user.id, &host.family.invite_code)
            .await
            .expect("join");

        let left = service.leave_family(guest.user.id).await.expect("leave");
        assert_ne!(left.family.id, host.family.id);
        assert!(left.family.is_owner);
        assert_eq!(left.family.members.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn only_the_owner_may_remove_members(service: MembershipService) {
        let host = service.authenticate(profile(1)).await.expect("host auth");
        let guest = service.authenticate(profile(2)).await.expect("guest auth");
        service
            .join_family(guest.user.id, &host.family.invite_code)
            .await
            .expect("join");

        let err = service
            .remove_member(guest.user.id, host.user.id)
            .await
            .expect_err("non-owner removal");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn owners_cannot_remove_themselves(service: MembershipService) {
        let host = service.authenticate(profile(1)).await.expect("auth");
        let err = service
            .remove_member(host.user.id, host.user.id)
            .await
            .expect_err("self removal");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn removal_ejects_the_target_into_a_solo_family(service: MembershipService) {
        let host = service.authenticate(profile(1)).await.expect("host auth");
        let guest = service.authenticate(profile(2)).await.expect("guest auth");
        service
            .join_family(guest.user.id, &host.family.invite_code)
            .await
            .expect("join");

        let after = service
            .remove_member(host.user.id, guest.user.id)
            .await
            .expect("remove");
        assert_eq!(after.family.members.len(), 1);

        let guest_after = service.authenticate(profile(2)).await.expect("guest re-auth");
        assert_ne!(guest_after.family.id, host.family.id);
        assert!(guest_after.family.is_owner);
    }

    #[rstest]
    #[tokio::test]
    async fn removing_a_non_member_is_rejected(service: MembershipService) {
        let host = service.authenticate(profile(1)).await.expect("host auth");
        let stranger = service.authenticate(profile(2)).await.expect("stranger auth");

        let err = service
            .remove_member(host.user.id, stranger.user.id)
            .await
            .expect_err("stranger removal");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn admin_stats_is_gated_on_the_allow_list(service: MembershipService) {
        service.authenticate(profile(1)).await.expect("auth");
        let err = service
            .admin_stats(UserId::new(1))
            .await
            .expect_err("non-admin");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn admin_stats_reports_recent_users_as_online(service: MembershipService) {
        service.authenticate(profile(1)).await.expect("auth");
        let stats = service
            .admin_stats(UserId::new(999))
            .await
            .expect("admin stats");
        assert_eq!(stats.len(), 1);
        assert!(stats[0].is_online);
        assert_eq!(stats[0].visit_count, 1);
    }
}
