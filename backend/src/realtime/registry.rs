//! In-process registry of live connections, grouped by family.
//!
//! The registry is the fan-out hub: sessions register a sink on upgrade and
//! deregister it on teardown, and committed list mutations are delivered to
//! every other sink in the mutating user's family. State is process-local;
//! a restart empties it and clients reconnect.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::events::ListEvent;
use crate::domain::family::FamilyId;
use crate::domain::ports::event_broadcast::EventBroadcast;
use crate::domain::user::UserId;

/// Registry-issued handle identifying one live connection.
///
/// Handles are unique for the lifetime of the process, so deregistration
/// targets exactly the connection that is tearing down even when the same
/// user holds several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The peer is gone and the sink will never accept another payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("connection sink is closed")]
pub struct SinkClosed;

/// Write half of a live connection, as seen by the fan-out path.
#[async_trait]
pub trait ConnectionSink: Send + Sync {
    /// Deliver one serialised event payload to the peer.
    async fn deliver(&self, payload: &str) -> Result<(), SinkClosed>;
}

struct Registration {
    id: ConnectionId,
    user: UserId,
    sink: Arc<dyn ConnectionSink>,
}

/// Live connections grouped by family.
#[derive(Default)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    families: Mutex<HashMap<FamilyId, Vec<Registration>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<FamilyId, Vec<Registration>>> {
        match self.families.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add a connection's sink under its family and return its handle.
    pub fn register(
        &self,
        family: FamilyId,
        user: UserId,
        sink: Arc<dyn ConnectionSink>,
    ) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock()
            .entry(family)
            .or_default()
            .push(Registration { id, user, sink });
        debug!(%family, %user, connection = %id, "connection registered");
        id
    }

    /// Remove the connection identified by `id` from `family`.
    ///
    /// Removal is keyed by the handle, never by user, so closing one device
    /// leaves the same user's other devices registered. Deregistering a
    /// handle that is already gone is a no-op.
    pub fn deregister(&self, family: FamilyId, id: ConnectionId) {
        let mut families = self.lock();
        if let Some(registrations) = families.get_mut(&family) {
            registrations.retain(|registration| registration.id != id);
            if registrations.is_empty() {
                families.remove(&family);
            }
        }
        debug!(%family, connection = %id, "connection deregistered");
    }

    /// Number of live connections currently registered for `family`.
    #[must_use]
    pub fn connection_count(&self, family: FamilyId) -> usize {
        self.lock().get(&family).map_or(0, Vec::len)
    }
}

#[async_trait]
impl EventBroadcast for ConnectionRegistry {
    async fn broadcast(&self, family: FamilyId, event: &ListEvent, exclude: UserId) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(error) => {
                debug!(%family, %error, "event serialisation failed, dropping broadcast");
                return;
            }
        };
        // Snapshot the recipients under the lock, deliver outside it so a
        // slow peer never blocks registration or other broadcasts.
        let recipients: Vec<(ConnectionId, Arc<dyn ConnectionSink>)> = {
            let families = self.lock();
            families.get(&family).map_or_else(Vec::new, |registrations| {
                registrations
                    .iter()
                    .filter(|registration| registration.user != exclude)
                    .map(|registration| (registration.id, Arc::clone(&registration.sink)))
                    .collect()
            })
        };
        for (id, sink) in recipients {
            if sink.deliver(&payload).await.is_err() {
                // The session's own teardown deregisters it; skip and move on.
                debug!(%family, connection = %id, "delivery failed, peer gone");
            }
        }
    }
}
