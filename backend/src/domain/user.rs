//! User identity and presence model.
//!
//! Users are created on first authentication with an externally issued
//! numeric identifier; the service never mints its own user ids. Every user
//! belongs to exactly one family at all times.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::family::FamilyId;

/// Externally issued, stable numeric user identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw identifier issued by the external identity provider.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user with presence bookkeeping.
///
/// `family_id` is never null: first authentication allocates a fresh solo
/// family, and join/leave/remove only ever reassign it. `visit_count`
/// increments on every authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// External identity provider id.
    pub id: UserId,
    /// Display name, when the provider supplied one.
    pub username: Option<String>,
    /// Avatar reference, when the provider supplied one.
    pub photo_url: Option<String>,
    /// The family this user currently belongs to.
    pub family_id: FamilyId,
    /// Timestamp of the most recent authentication.
    pub last_seen: Option<DateTime<Utc>>,
    /// Cumulative number of authentications.
    pub visit_count: i64,
}

impl User {
    /// Construct a freshly registered user bound to `family_id`.
    #[must_use]
    pub fn registered(
        id: UserId,
        username: Option<String>,
        photo_url: Option<String>,
        family_id: FamilyId,
        seen_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            photo_url,
            family_id,
            last_seen: Some(seen_at),
            visit_count: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_serialises_as_bare_number() {
        let id = UserId::new(42);
        assert_eq!(serde_json::to_string(&id).expect("serialise"), "42");
    }

    #[test]
    fn registered_user_starts_with_one_visit() {
        let user = User::registered(
            UserId::new(7),
            Some("alice".into()),
            None,
            FamilyId::new(1),
            Utc::now(),
        );
        assert_eq!(user.visit_count, 1);
        assert!(user.last_seen.is_some());
    }
}
