//! Authentication handler.
//!
//! ```text
//! POST /api/auth {"id":123,"username":"alice","photoUrl":null}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::family::FamilySnapshot;
use crate::domain::membership::AuthProfile;
use crate::domain::user::{User, UserId};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Authentication request body for `POST /api/auth`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    /// Externally issued user identifier.
    pub id: i64,
    /// Display name, when the provider supplied one.
    #[serde(default)]
    pub username: Option<String>,
    /// Avatar reference, when the provider supplied one.
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Authentication response: the user and their family after sign-in.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Always `"ok"` on success.
    pub status: &'static str,
    /// The authenticated user.
    pub user: User,
    /// The user's family with its member list.
    pub family: FamilySnapshot,
}

/// Register or refresh a user.
///
/// First sign-in allocates a fresh solo family owned by the user;
/// subsequent sign-ins refresh profile fields and bump the visit counter.
#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 503, description = "Storage unavailable", body = crate::domain::Error)
    ),
    tags = ["auth"],
    operation_id = "authenticate"
)]
#[post("/auth")]
pub async fn authenticate(
    state: web::Data<HttpState>,
    payload: web::Json<AuthRequest>,
) -> ApiResult<web::Json<AuthResponse>> {
    let payload = payload.into_inner();
    let snapshot = state
        .membership
        .authenticate(AuthProfile {
            id: UserId::new(payload.id),
            username: payload.username,
            photo_url: payload.photo_url,
        })
        .await?;
    Ok(web::Json(AuthResponse {
        status: "ok",
        user: snapshot.user,
        family: snapshot.family,
    }))
}
