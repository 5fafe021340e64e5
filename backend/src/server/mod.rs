//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::list::ListService;
use crate::domain::membership::{AdminPolicy, MembershipService};
use crate::domain::ports::event_broadcast::EventBroadcast;
use crate::domain::ports::item_repository::{InMemoryItemRepository, ItemRepository};
use crate::domain::ports::membership_repository::{
    InMemoryMembershipRepository, MembershipRepository,
};
use crate::inbound::http::admin::stats;
use crate::inbound::http::auth::authenticate;
use crate::inbound::http::families::{join, leave, remove};
use crate::inbound::http::health::{live, ready, HealthState};
use crate::inbound::http::items::{delete_item, list_items, upsert_item};
use crate::inbound::http::state::HttpState;
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;
use crate::middleware::Trace;
use crate::outbound::persistence::{DieselItemRepository, DieselMembershipRepository};
use crate::realtime::ConnectionRegistry;

fn build_repositories(
    config: &ServerConfig,
) -> (Arc<dyn MembershipRepository>, Arc<dyn ItemRepository>) {
    config.db_pool.as_ref().map_or_else(
        || {
            tracing::warn!("no database pool configured; using in-memory storage");
            (
                Arc::new(InMemoryMembershipRepository::new()) as Arc<dyn MembershipRepository>,
                Arc::new(InMemoryItemRepository::new()) as Arc<dyn ItemRepository>,
            )
        },
        |pool| {
            (
                Arc::new(DieselMembershipRepository::new(pool.clone()))
                    as Arc<dyn MembershipRepository>,
                Arc::new(DieselItemRepository::new(pool.clone())) as Arc<dyn ItemRepository>,
            )
        },
    )
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
    } = deps;

    let api = web::scope("/api")
        .service(authenticate)
        .service(join)
        .service(leave)
        .service(remove)
        .service(list_items)
        .service(upsert_item)
        .service(delete_item)
        .service(stats);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(Trace)
        .service(api)
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();

    let (members, items) = build_repositories(&config);
    let registry = Arc::new(ConnectionRegistry::new());
    let membership = Arc::new(MembershipService::new(
        Arc::clone(&members),
        AdminPolicy::new(config.admins.iter().copied()),
    ));
    let list = Arc::new(ListService::new(
        items,
        members,
        Arc::clone(&registry) as Arc<dyn EventBroadcast>,
    ));

    let http_state = web::Data::new(HttpState::new(Arc::clone(&membership), list));
    let ws_state = web::Data::new(WsState::new(membership, registry));

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
        })
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
