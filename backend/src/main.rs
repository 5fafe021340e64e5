//! Backend entry-point: wires storage, REST endpoints, and the WebSocket
//! fan-out.

use std::env;
use std::net::SocketAddr;

use actix_web::web;
use diesel::{Connection, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use backend::domain::user::UserId;
use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{DbPool, PoolConfig};
use backend::server::{create_server, ServerConfig};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

fn parse_admins(raw: &str) -> Vec<UserId> {
    raw.split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            match part.parse::<i64>() {
                Ok(id) => Some(UserId::new(id)),
                Err(error) => {
                    warn!(value = part, %error, "ignoring malformed admin user id");
                    None
                }
            }
        })
        .collect()
}

async fn run_migrations(database_url: String) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .map_err(|e| std::io::Error::other(format!("database connection failed: {e}")))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| std::io::Error::other(format!("migrations failed: {e}")))?;
        Ok::<_, std::io::Error>(())
    })
    .await
    .map_err(|e| std::io::Error::other(format!("migration task panicked: {e}")))?
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()
        .map_err(|e| std::io::Error::other(format!("invalid BIND_ADDR: {e}")))?;

    let admins = env::var("ADMIN_USER_IDS")
        .map(|raw| parse_admins(&raw))
        .unwrap_or_default();

    let mut config = ServerConfig::new(bind_addr).with_admins(admins);

    match env::var("DATABASE_URL") {
        Ok(database_url) => {
            run_migrations(database_url.clone()).await?;
            let pool = DbPool::new(PoolConfig::new(database_url))
                .await
                .map_err(|e| std::io::Error::other(format!("pool construction failed: {e}")))?;
            config = config.with_db_pool(pool);
        }
        Err(_) => {
            warn!("DATABASE_URL not set; state will not survive restarts");
        }
    }

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting server");
    create_server(health_state, config)?.await
}
