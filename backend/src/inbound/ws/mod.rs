//! WebSocket inbound adapter: upgrade handling and connection registration.
//!
//! Responsibilities:
//! - authenticate the upgrade request and resolve the user's family
//! - register the connection's write half with the fan-out registry
//! - run the per-connection session loop until teardown

use std::sync::Arc;

use actix_web::web::{self, Payload};
use actix_web::{get, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::domain::user::UserId;

mod session;

pub mod state;

pub use session::WsSessionSink;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WsQuery {
    user_id: i64,
}

/// Handle WebSocket upgrade for the `/ws` endpoint.
///
/// The family binding is resolved once here; a user who joins or leaves a
/// family mid-connection keeps receiving the old family's events until they
/// reconnect. Unknown users are rejected before the upgrade completes.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    query: web::Query<WsQuery>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let user = UserId::new(query.user_id);
    let family = state.membership.resolve_family(user).await?;

    let (response, session, message_stream) = actix_ws::handle(&req, stream)?;

    let sink = Arc::new(WsSessionSink::new(session.clone()));
    let connection = state.registry.register(family, user, sink);

    let registry = Arc::clone(&state.registry);
    actix_web::rt::spawn(session::run_session(
        registry,
        family,
        connection,
        session,
        message_stream,
    ));

    Ok(response)
}
