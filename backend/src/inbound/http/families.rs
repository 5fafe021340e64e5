//! Family membership handlers: join, leave, and member removal.
//!
//! ```text
//! POST /api/join   {"userId":2,"inviteCode":"abcd1234"}
//! POST /api/leave  {"userId":2}
//! POST /api/remove {"ownerId":1,"targetId":2}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::family::{FamilySnapshot, InviteCode};
use crate::domain::user::{User, UserId};
use crate::domain::Error;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Request body for `POST /api/join`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// The joining user.
    pub user_id: i64,
    /// Invite code of the target family.
    pub invite_code: String,
}

/// Request body for `POST /api/leave`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    /// The leaving user.
    pub user_id: i64,
}

/// Request body for `POST /api/remove`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    /// The family owner issuing the removal.
    pub owner_id: i64,
    /// The member being removed.
    pub target_id: i64,
}

/// Response for all family transition handlers.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilyResponse {
    /// Always `"ok"` on success.
    pub status: &'static str,
    /// The affected user after the transition.
    pub user: User,
    /// The user's family after the transition.
    pub family: FamilySnapshot,
}

fn map_invite_code(raw: String) -> Result<InviteCode, Error> {
    InviteCode::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "inviteCode" }))
    })
}

/// Join the family identified by an invite code.
#[utoipa::path(
    post,
    path = "/api/join",
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Joined", body = FamilyResponse),
        (status = 400, description = "Invalid invite code", body = Error),
        (status = 404, description = "Unknown user or invite code", body = Error)
    ),
    tags = ["families"],
    operation_id = "joinFamily"
)]
#[post("/join")]
pub async fn join(
    state: web::Data<HttpState>,
    payload: web::Json<JoinRequest>,
) -> ApiResult<web::Json<FamilyResponse>> {
    let payload = payload.into_inner();
    let code = map_invite_code(payload.invite_code)?;
    let snapshot = state
        .membership
        .join_family(UserId::new(payload.user_id), &code)
        .await?;
    Ok(web::Json(FamilyResponse {
        status: "ok",
        user: snapshot.user,
        family: snapshot.family,
    }))
}

/// Leave the current family for a fresh solo one.
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = LeaveRequest,
    responses(
        (status = 200, description = "Left", body = FamilyResponse),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["families"],
    operation_id = "leaveFamily"
)]
#[post("/leave")]
pub async fn leave(
    state: web::Data<HttpState>,
    payload: web::Json<LeaveRequest>,
) -> ApiResult<web::Json<FamilyResponse>> {
    let snapshot = state
        .membership
        .leave_family(UserId::new(payload.user_id))
        .await?;
    Ok(web::Json(FamilyResponse {
        status: "ok",
        user: snapshot.user,
        family: snapshot.family,
    }))
}

/// Remove a member from the owner's family.
#[utoipa::path(
    post,
    path = "/api/remove",
    request_body = RemoveRequest,
    responses(
        (status = 200, description = "Removed", body = FamilyResponse),
        (status = 400, description = "Self-removal or non-member target", body = Error),
        (status = 403, description = "Requester does not own the family", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["families"],
    operation_id = "removeMember"
)]
#[post("/remove")]
pub async fn remove(
    state: web::Data<HttpState>,
    payload: web::Json<RemoveRequest>,
) -> ApiResult<web::Json<FamilyResponse>> {
    let snapshot = state
        .membership
        .remove_member(UserId::new(payload.owner_id), UserId::new(payload.target_id))
        .await?;
    Ok(web::Json(FamilyResponse {
        status: "ok",
        user: snapshot.user,
        family: snapshot.family,
    }))
}
