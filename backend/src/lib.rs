//! Shared family shopping-list backend.
//!
//! The crate follows a ports-and-adapters layout: [`domain`] holds the
//! entities and application services, [`inbound`] the HTTP and WebSocket
//! adapters, [`outbound`] the Diesel persistence adapters, and [`realtime`]
//! the in-process fan-out registry that pushes committed list mutations to
//! every other live connection in a family.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod realtime;
pub mod server;

pub use doc::ApiDoc;
pub use middleware::Trace;
