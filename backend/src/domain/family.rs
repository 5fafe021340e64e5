//! Family group model and invite codes.
//!
//! A family is the sharing and authorisation boundary: its members edit one
//! shared item list. Families are created whenever a user needs a fresh one
//! (first authentication, leaving, or being removed) and are never deleted;
//! an orphaned zero-member family is acceptable.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::{User, UserId};

/// Numeric family identifier allocated by storage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct FamilyId(i32);

impl FamilyId {
    /// Wrap a storage-allocated identifier.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of characters in an invite code.
pub const INVITE_CODE_LEN: usize = 8;

/// Validation errors for [`InviteCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InviteCodeValidationError {
    /// The code is not exactly [`INVITE_CODE_LEN`] characters long.
    #[error("invite code must be exactly {INVITE_CODE_LEN} characters")]
    WrongLength,
    /// The code contains characters outside the lowercase hex alphabet.
    #[error("invite code may only contain lowercase hexadecimal characters")]
    InvalidCharacters,
}

/// Opaque, fixed-width, human-shareable token granting join access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct InviteCode(String);

impl InviteCode {
    /// Generate a fresh collision-resistant code from a random UUID.
    #[must_use]
    pub fn generate() -> Self {
        let code: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(INVITE_CODE_LEN)
            .collect();
        Self(code)
    }

    /// Validate and wrap a caller-supplied code.
    pub fn new(code: impl Into<String>) -> Result<Self, InviteCodeValidationError> {
        let code = code.into();
        if code.chars().count() != INVITE_CODE_LEN {
            return Err(InviteCodeValidationError::WrongLength);
        }
        if !code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()) {
            return Err(InviteCodeValidationError::InvalidCharacters);
        }
        Ok(Self(code))
    }
}

impl AsRef<str> for InviteCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for InviteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<InviteCode> for String {
    fn from(value: InviteCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for InviteCode {
    type Error = InviteCodeValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A family group record.
///
/// `owner_id`, when set, must reference a user whose current family is this
/// one — except transiently while ownership moves during leave/remove.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    /// Storage-allocated identifier.
    pub id: FamilyId,
    /// Join token shared out-of-band between members.
    pub invite_code: InviteCode,
    /// Current owner, when one is set.
    pub owner_id: Option<UserId>,
}

/// A family together with its member list, relative to one user.
///
/// Returned by authenticate/join/leave/remove so clients can render the
/// household screen without a second round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilySnapshot {
    /// Storage-allocated identifier.
    pub id: FamilyId,
    /// Join token shared out-of-band between members.
    pub invite_code: InviteCode,
    /// Current members of the family.
    pub members: Vec<User>,
    /// Whether the requesting/affected user owns this family.
    pub is_owner: bool,
}

impl FamilySnapshot {
    /// Assemble a snapshot for `viewer` from a family and its members.
    #[must_use]
    pub fn for_viewer(family: &Family, members: Vec<User>, viewer: UserId) -> Self {
        Self {
            id: family.id,
            invite_code: family.invite_code.clone(),
            members,
            is_owner: family.owner_id == Some(viewer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn generated_codes_are_fixed_width() {
        for _ in 0..32 {
            let code = InviteCode::generate();
            assert_eq!(code.as_ref().chars().count(), INVITE_CODE_LEN);
        }
    }

    #[test]
    fn generated_codes_are_collision_resistant_in_practice() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..256 {
            assert!(seen.insert(InviteCode::generate()));
        }
    }

    #[rstest]
    #[case("abcd1234", true)]
    #[case("ABCD1234", false)]
    #[case("abcd123", false)]
    #[case("abcd12345", false)]
    #[case("abcd123!", false)]
    fn validates_caller_supplied_codes(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(InviteCode::new(raw).is_ok(), ok);
    }

    #[test]
    fn snapshot_marks_owner_relative_to_viewer() {
        let family = Family {
            id: FamilyId::new(1),
            invite_code: InviteCode::generate(),
            owner_id: Some(UserId::new(7)),
        };
        let snapshot = FamilySnapshot::for_viewer(&family, Vec::new(), UserId::new(7));
        assert!(snapshot.is_owner);
        let snapshot = FamilySnapshot::for_viewer(&family, Vec::new(), UserId::new(8));
        assert!(!snapshot.is_owner);
    }
}
