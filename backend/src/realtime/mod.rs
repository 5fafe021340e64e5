//! Real-time fan-out infrastructure shared by the WebSocket layer and the
//! mutation path.

pub mod registry;

pub use registry::{ConnectionId, ConnectionRegistry, ConnectionSink, SinkClosed};
