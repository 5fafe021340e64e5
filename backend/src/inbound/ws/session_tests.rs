//! WebSocket session handler tests.

use super::*;
use crate::domain::membership::{AdminPolicy, AuthProfile, MembershipService};
use crate::domain::ports::membership_repository::InMemoryMembershipRepository;
use crate::domain::user::UserId;
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;
use crate::realtime::ConnectionRegistry;
use actix_web::{dev::Server, dev::ServerHandle, App, HttpServer};
use awc::{ws::Codec, ws::Frame, BoxedSocket};
use futures_util::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use std::sync::Arc;

struct WsWorld {
    url: String,
    registry: Arc<ConnectionRegistry>,
    server: Server,
}

#[fixture]
async fn start_ws_server() -> WsWorld {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let membership = Arc::new(MembershipService::new(
        Arc::new(InMemoryMembershipRepository::new()),
        AdminPolicy::default(),
    ));
    membership
        .authenticate(AuthProfile {
            id: UserId::new(1),
            username: Some("alice".into()),
            photo_url: None,
        })
        .await
        .expect("seed user");
    let registry = Arc::new(ConnectionRegistry::new());
    let ws_state = WsState::new(membership, Arc::clone(&registry));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(actix_web::web::Data::new(ws_state.clone()))
            .service(ws::ws_entry)
    })
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    WsWorld {
        url: format!("http://{addr}"),
        registry,
        server,
    }
}

async fn connect(
    world: WsWorld,
    user_id: i64,
) -> (
    actix_codec::Framed<BoxedSocket, Codec>,
    Arc<ConnectionRegistry>,
    ServerHandle,
) {
    let handle = world.server.handle();
    actix_web::rt::spawn(world.server);

    let (_resp, socket) = awc::Client::default()
        .ws(format!("{}/ws?userId={user_id}", world.url))
        .connect()
        .await
        .expect("websocket connect");

    (socket, world.registry, handle)
}

#[rstest]
#[actix_web::test]
async fn answers_text_ping_with_pong(#[future] start_ws_server: WsWorld) {
    let (mut socket, _registry, _handle) = connect(start_ws_server.await, 1).await;
    socket
        .send(awc::ws::Message::Text("ping".into()))
        .await
        .expect("send text");

    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => {
                assert_eq!(bytes.as_ref(), b"pong");
                break;
            }
            Frame::Ping(_) | Frame::Pong(_) => {}
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

#[rstest]
#[actix_web::test]
async fn rejects_unknown_users_before_upgrade(#[future] start_ws_server: WsWorld) {
    let world = start_ws_server.await;
    let handle = world.server.handle();
    actix_web::rt::spawn(world.server);

    let result = awc::Client::default()
        .ws(format!("{}/ws?userId=42", world.url))
        .connect()
        .await;
    assert!(result.is_err(), "unknown user must not upgrade");
    drop(handle);
}

#[rstest]
#[actix_web::test]
async fn closes_after_timeout_without_client_messages(#[future] start_ws_server: WsWorld) {
    let (mut socket, _registry, _handle) = connect(start_ws_server.await, 1).await;
    tokio::time::sleep(CLIENT_TIMEOUT + HEARTBEAT_INTERVAL * 3).await;

    let observed_close = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match socket.next().await {
                Some(Ok(Frame::Close(reason))) => break reason,
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => break None,
            }
        }
    })
    .await
    .expect("close frame before deadline");

    if let Some(reason) = observed_close {
        assert_eq!(reason.code, CloseCode::Normal);
    }
}

#[rstest]
#[actix_web::test]
async fn deregisters_the_connection_on_client_close(#[future] start_ws_server: WsWorld) {
    let (mut socket, registry, _handle) = connect(start_ws_server.await, 1).await;
    let family = crate::domain::family::FamilyId::new(1);
    assert_eq!(registry.connection_count(family), 1);

    socket
        .send(awc::ws::Message::Close(None))
        .await
        .expect("send close");
    drop(socket);

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while registry.connection_count(family) != 0 {
        assert!(
            std::time::Instant::now() < deadline,
            "connection never deregistered"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
