//! Admin activity report handler.
//!
//! ```text
//! GET /api/admin/stats?adminUserId=999
//! ```

use actix_web::{get, web};
use serde::Deserialize;

use crate::domain::membership::UserActivity;
use crate::domain::user::UserId;
use crate::domain::Error;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Query identifying the requesting admin.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuery {
    /// The requesting user; must be on the configured admin allow-list.
    pub admin_user_id: i64,
}

/// Activity report across all registered users.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    params(("adminUserId" = i64, Query, description = "Requesting admin user id")),
    responses(
        (status = 200, description = "Per-user activity", body = [UserActivity]),
        (status = 403, description = "Requester is not an admin", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminStats"
)]
#[get("/admin/stats")]
pub async fn stats(
    state: web::Data<HttpState>,
    query: web::Query<AdminQuery>,
) -> ApiResult<web::Json<Vec<UserActivity>>> {
    let report = state
        .membership
        .admin_stats(UserId::new(query.admin_user_id))
        .await?;
    Ok(web::Json(report))
}
