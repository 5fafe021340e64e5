//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use crate::domain::user::UserId;
use crate::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) admins: Vec<UserId>,
}

impl ServerConfig {
    /// Construct a server configuration binding to the given address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            admins: Vec::new(),
        }
    }

    /// Attach a database connection pool for the persistence adapters.
    ///
    /// Without a pool the server falls back to in-memory storage, which is
    /// suitable for tests and local development only.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Set the allow-list of users permitted to read the admin report.
    #[must_use]
    pub fn with_admins(mut self, admins: Vec<UserId>) -> Self {
        self.admins = admins;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
