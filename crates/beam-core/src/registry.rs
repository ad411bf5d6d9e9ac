//! Connection registry for Beam.
//!
//! The registry is the one shared mutable structure in the core: a mapping
//! from session id to the set of live connections joined to it. Connection
//! metadata (session, role, outbox) lives here as an explicit association
//! owned by the registry, never as mutable fields on the transport object.

use beam_protocol::{Role, ServerFrame};
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// A session identifier.
pub type SessionId = String;

/// Unique identifier for a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Create a new connection ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random connection ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("conn_{}", Uuid::new_v4().simple()))
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Role filter for registry snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleFilter {
    /// Match every connection regardless of role.
    Any,
    /// Match only connections registered with the given role.
    Only(Role),
}

impl RoleFilter {
    fn matches(&self, role: Role) -> bool {
        match self {
            RoleFilter::Any => true,
            RoleFilter::Only(wanted) => *wanted == role,
        }
    }
}

impl From<Role> for RoleFilter {
    fn from(role: Role) -> Self {
        RoleFilter::Only(role)
    }
}

/// Handle to a registered connection: identity, declared role, and the
/// outbound channel drained by the connection's socket task.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ConnectionId,
    role: Role,
    outbox: mpsc::UnboundedSender<ServerFrame>,
}

impl ClientHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new(id: ConnectionId, role: Role, outbox: mpsc::UnboundedSender<ServerFrame>) -> Self {
        Self { id, role, outbox }
    }

    /// Get the connection id.
    #[must_use]
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Get the declared role. Immutable for the lifetime of the connection.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Queue a frame for delivery.
    ///
    /// Returns `false` if the connection's outbox is gone, i.e. the socket
    /// task has already exited.
    pub fn send(&self, frame: ServerFrame) -> bool {
        self.outbox.send(frame).is_ok()
    }
}

/// Thread-safe bookkeeping of which connections belong to which session.
///
/// All operations are safe under concurrent invocation from independent
/// connection tasks. `list` returns a snapshot copy, never a live view, so
/// fan-out sends happen without the map lock held.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Session id -> connections joined to it.
    sessions: DashMap<SessionId, HashMap<ConnectionId, ClientHandle>>,
    /// Reverse index: connection id -> the session it is registered in.
    memberships: DashMap<ConnectionId, SessionId>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under a session.
    ///
    /// Creates the session's set on first use. A connection lives in at most
    /// one session's set, so a handle already registered elsewhere is moved.
    /// Session existence is not validated here; that is the store's concern,
    /// checked by the hub.
    pub fn register(&self, session_id: &str, client: ClientHandle) {
        let connection_id = client.id().clone();

        if let Some(previous) = self
            .memberships
            .insert(connection_id.clone(), session_id.to_string())
        {
            if previous != session_id {
                self.remove_from_session(&previous, &connection_id);
            }
        }

        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .insert(connection_id.clone(), client);

        debug!(connection = %connection_id, session = %session_id, "Connection registered");
    }

    /// Remove a connection from whatever session set holds it.
    ///
    /// Removes the session's entry entirely if this empties it. A no-op, not
    /// an error, if the connection was never registered.
    pub fn unregister(&self, connection_id: &ConnectionId) {
        if let Some((_, session_id)) = self.memberships.remove(connection_id) {
            self.remove_from_session(&session_id, connection_id);
            debug!(connection = %connection_id, session = %session_id, "Connection unregistered");
        }
    }

    /// Snapshot the connections of a session matching the filter.
    #[must_use]
    pub fn list(&self, session_id: &str, filter: RoleFilter) -> Vec<ClientHandle> {
        self.sessions
            .get(session_id)
            .map(|clients| {
                clients
                    .values()
                    .filter(|client| filter.matches(client.role()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether a session has any registered connections.
    #[must_use]
    pub fn contains_session(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Get registry statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            session_count: self.sessions.len(),
            connection_count: self.memberships.len(),
        }
    }

    fn remove_from_session(&self, session_id: &str, connection_id: &ConnectionId) {
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            entry.remove(connection_id);
            let empty = entry.is_empty();
            drop(entry);
            if empty {
                // Re-checked under the entry lock so a racing register wins.
                self.sessions
                    .remove_if(session_id, |_, clients| clients.is_empty());
            }
        }
    }
}

/// Registry statistics.
#[derive(Debug, Clone)]
pub struct RegistryStats {
    /// Number of sessions with at least one live connection.
    pub session_count: usize,
    /// Number of registered connections.
    pub connection_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn handle(id: &str, role: Role) -> (ClientHandle, UnboundedReceiver<ServerFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ClientHandle::new(ConnectionId::new(id), role, tx), rx)
    }

    #[test]
    fn test_register_and_list() {
        let registry = ConnectionRegistry::new();
        let (presenter, _rx1) = handle("c1", Role::Presenter);
        let (participant, _rx2) = handle("c2", Role::Participant);

        registry.register("s1", presenter);
        registry.register("s1", participant);

        assert_eq!(registry.list("s1", RoleFilter::Any).len(), 2);
        assert_eq!(registry.list("s1", Role::Presenter.into()).len(), 1);
        assert_eq!(registry.list("s1", Role::Participant.into()).len(), 1);
        assert!(registry.list("s2", RoleFilter::Any).is_empty());
    }

    #[test]
    fn test_unregister_removes_empty_session() {
        let registry = ConnectionRegistry::new();
        let (c1, _rx1) = handle("c1", Role::Presenter);
        let (c2, _rx2) = handle("c2", Role::Participant);

        registry.register("s1", c1);
        registry.register("s1", c2);

        registry.unregister(&ConnectionId::new("c1"));
        assert!(registry.contains_session("s1"));

        registry.unregister(&ConnectionId::new("c2"));
        assert!(!registry.contains_session("s1"));
        assert!(registry.list("s1", RoleFilter::Any).is_empty());
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let registry = ConnectionRegistry::new();
        registry.unregister(&ConnectionId::new("ghost"));
        assert_eq!(registry.stats().connection_count, 0);
    }

    #[test]
    fn test_reregister_moves_connection() {
        let registry = ConnectionRegistry::new();
        let (c1, _rx) = handle("c1", Role::Participant);

        registry.register("s1", c1.clone());
        registry.register("s2", c1);

        // At most one session's set holds the connection; s1 emptied out.
        assert!(!registry.contains_session("s1"));
        assert_eq!(registry.list("s2", RoleFilter::Any).len(), 1);
        assert_eq!(registry.stats().connection_count, 1);
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let registry = ConnectionRegistry::new();
        let (c1, _rx) = handle("c1", Role::Participant);
        registry.register("s1", c1);

        let snapshot = registry.list("s1", RoleFilter::Any);
        registry.unregister(&ConnectionId::new("c1"));

        // The snapshot is unaffected by later mutation.
        assert_eq!(snapshot.len(), 1);
        assert!(registry.list("s1", RoleFilter::Any).is_empty());
    }

    #[test]
    fn test_stats() {
        let registry = ConnectionRegistry::new();
        let (c1, _rx1) = handle("c1", Role::Presenter);
        let (c2, _rx2) = handle("c2", Role::Participant);
        let (c3, _rx3) = handle("c3", Role::Participant);

        registry.register("s1", c1);
        registry.register("s1", c2);
        registry.register("s2", c3);

        let stats = registry.stats();
        assert_eq!(stats.session_count, 2);
        assert_eq!(stats.connection_count, 3);
    }

    #[test]
    fn test_connection_id_generate() {
        let id1 = ConnectionId::generate();
        let id2 = ConnectionId::generate();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("conn_"));
    }
}
