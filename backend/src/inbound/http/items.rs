//! Shopping-list item handlers.
//!
//! ```text
//! GET    /api/items?userId=1
//! POST   /api/items {"userId":1,"id":"...","text":"Milk","isBought":false}
//! DELETE /api/items/{item_id}?userId=1
//! ```

use actix_web::{delete, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::item::{Item, ItemDraft, ItemId, DEFAULT_CATEGORY};
use crate::domain::list::DeleteOutcome;
use crate::domain::user::UserId;
use crate::domain::Error;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Query identifying the acting user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorQuery {
    /// The acting user.
    pub user_id: i64,
}

/// Request body for `POST /api/items`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertItemRequest {
    /// The acting user.
    pub user_id: i64,
    /// Client-supplied item identifier.
    pub id: String,
    /// Free-text label.
    pub text: String,
    /// Whether the item has been purchased.
    #[serde(default)]
    pub is_bought: bool,
    /// Category label; defaults to the uncategorised sentinel.
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_owned()
}

/// Response for `DELETE /api/items/{item_id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteItemResponse {
    /// `"deleted"` when the item existed, `"not found"` otherwise.
    pub status: &'static str,
}

fn map_item_id(raw: &str) -> Result<ItemId, Error> {
    ItemId::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "id" }))
    })
}

/// The acting user's current family list.
#[utoipa::path(
    get,
    path = "/api/items",
    params(("userId" = i64, Query, description = "Acting user id")),
    responses(
        (status = 200, description = "Items", body = [Item]),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["items"],
    operation_id = "listItems"
)]
#[get("/items")]
pub async fn list_items(
    state: web::Data<HttpState>,
    query: web::Query<ActorQuery>,
) -> ApiResult<web::Json<Vec<Item>>> {
    let items = state.list.list_items(UserId::new(query.user_id)).await?;
    Ok(web::Json(items))
}

/// Create or update an item in the acting user's family list.
#[utoipa::path(
    post,
    path = "/api/items",
    request_body = UpsertItemRequest,
    responses(
        (status = 200, description = "Upserted item", body = Item),
        (status = 400, description = "Invalid item id", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["items"],
    operation_id = "upsertItem"
)]
#[post("/items")]
pub async fn upsert_item(
    state: web::Data<HttpState>,
    payload: web::Json<UpsertItemRequest>,
) -> ApiResult<web::Json<Item>> {
    let payload = payload.into_inner();
    let draft = ItemDraft {
        id: map_item_id(&payload.id)?,
        text: payload.text,
        is_bought: payload.is_bought,
        category: payload.category,
    };
    let item = state
        .list
        .upsert_item(UserId::new(payload.user_id), draft)
        .await?;
    Ok(web::Json(item))
}

/// Delete an item from the acting user's family list.
///
/// Deleting an item that is already gone succeeds with `"not found"` so
/// repeated deletes from racing devices stay idempotent.
#[utoipa::path(
    delete,
    path = "/api/items/{item_id}",
    params(
        ("item_id" = String, Path, description = "Item identifier"),
        ("userId" = i64, Query, description = "Acting user id")
    ),
    responses(
        (status = 200, description = "Delete outcome", body = DeleteItemResponse),
        (status = 403, description = "Item belongs to another family", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["items"],
    operation_id = "deleteItem"
)]
#[delete("/items/{item_id}")]
pub async fn delete_item(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<ActorQuery>,
) -> ApiResult<web::Json<DeleteItemResponse>> {
    let id = map_item_id(&path.into_inner())?;
    let outcome = state
        .list
        .delete_item(UserId::new(query.user_id), &id)
        .await?;
    let status = match outcome {
        DeleteOutcome::Deleted => "deleted",
        DeleteOutcome::NotFound => "not found",
    };
    Ok(web::Json(DeleteItemResponse { status }))
}
