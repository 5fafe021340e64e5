//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct which generates the OpenAPI specification
//! for the REST API. The generated document is served by Swagger UI in
//! debug builds.

use utoipa::OpenApi;

use crate::domain::family::{Family, FamilyId, FamilySnapshot, InviteCode};
use crate::domain::item::{Item, ItemId};
use crate::domain::membership::{AccountSnapshot, UserActivity};
use crate::domain::user::{User, UserId};
use crate::domain::{Error, ErrorCode};
use crate::inbound::http::auth::{AuthRequest, AuthResponse};
use crate::inbound::http::families::{
    FamilyResponse, JoinRequest, LeaveRequest, RemoveRequest,
};
use crate::inbound::http::items::{DeleteItemResponse, UpsertItemRequest};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Family list backend API",
        description = "Shared shopping lists with family-scoped live updates."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::auth::authenticate,
        crate::inbound::http::families::join,
        crate::inbound::http::families::leave,
        crate::inbound::http::families::remove,
        crate::inbound::http::items::list_items,
        crate::inbound::http::items::upsert_item,
        crate::inbound::http::items::delete_item,
        crate::inbound::http::admin::stats,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        UserId,
        Family,
        FamilyId,
        FamilySnapshot,
        InviteCode,
        Item,
        ItemId,
        AccountSnapshot,
        UserActivity,
        AuthRequest,
        AuthResponse,
        JoinRequest,
        LeaveRequest,
        RemoveRequest,
        FamilyResponse,
        UpsertItemRequest,
        DeleteItemResponse,
    )),
    tags(
        (name = "auth", description = "User registration and sign-in"),
        (name = "families", description = "Family membership transitions"),
        (name = "items", description = "Shared shopping-list items"),
        (name = "admin", description = "Operator reporting"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
