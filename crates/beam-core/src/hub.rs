//! The broadcast hub.
//!
//! The hub owns the connection registry, mediates join handshakes against
//! the session store, applies slide-change events, and fans frames out to
//! the correct subset of live connections. It is the only component with
//! cross-connection concerns; everything it delivers is best-effort,
//! at-most-once, with the join handshake as the resync path.

use crate::registry::{ClientHandle, ConnectionId, ConnectionRegistry, RoleFilter};
use crate::store::SessionStore;
use beam_protocol::{Role, RosterEntry, ServerFrame};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Orchestrates joins, slide changes, and fan-out for all live sessions.
pub struct BroadcastHub {
    registry: ConnectionRegistry,
    store: Arc<dyn SessionStore>,
}

impl BroadcastHub {
    /// Create a hub over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            store,
        }
    }

    /// Access the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Handle a join: register the connection and bring it, and for
    /// participant joins the session's presenters, up to date.
    ///
    /// An unknown session still registers the connection so teardown stays
    /// clean, but no slide snapshot is sent. The join endpoint over REST is
    /// the actual gatekeeper of session existence.
    pub async fn handle_join(&self, session_id: &str, client: ClientHandle) {
        let role = client.role();
        debug!(connection = %client.id(), session = %session_id, role = %role, "Join");

        self.registry.register(session_id, client.clone());

        match self.store.get_session(session_id).await {
            Some(session) => {
                self.deliver(&client, ServerFrame::slide_change(session.current_slide));
            }
            None => {
                warn!(session = %session_id, "Join for unknown session, no snapshot sent");
            }
        }

        match role {
            Role::Presenter => {
                let roster = self.roster(session_id).await;
                self.deliver(&client, ServerFrame::participants(roster));
            }
            Role::Participant => {
                let roster = self.roster(session_id).await;
                let delivered = self.fan_out(
                    session_id,
                    RoleFilter::Only(Role::Presenter),
                    None,
                    ServerFrame::participants(roster),
                );
                trace!(session = %session_id, presenters = delivered, "Roster pushed to presenters");
            }
        }
    }

    /// Handle a slide change: write-through to the store, then fan out to
    /// every other connection in the session regardless of role.
    ///
    /// Last writer wins; the index is not bounds-checked and an out-of-range
    /// value is forwarded as-is. No acknowledgment goes back to the sender.
    pub async fn handle_slide_change(
        &self,
        sender: &ConnectionId,
        session_id: &str,
        slide_index: u32,
    ) {
        self.store.update_current_slide(session_id, slide_index).await;

        let delivered = self.fan_out(
            session_id,
            RoleFilter::Any,
            Some(sender),
            ServerFrame::slide_change(slide_index),
        );
        trace!(
            connection = %sender,
            session = %session_id,
            slide = slide_index,
            recipients = delivered,
            "Slide change fanned out"
        );
    }

    /// Handle transport close.
    ///
    /// No departure broadcast exists: presenter rosters show the departed
    /// entry until the next roster push.
    pub fn handle_disconnect(&self, connection_id: &ConnectionId) {
        self.registry.unregister(connection_id);
        debug!(connection = %connection_id, "Disconnected");
    }

    async fn roster(&self, session_id: &str) -> Vec<RosterEntry> {
        self.store
            .list_participants(session_id)
            .await
            .into_iter()
            .map(|p| RosterEntry::new(p.id, p.name))
            .collect()
    }

    /// Fan a frame out to matching connections, excluding at most one sender.
    ///
    /// The registry snapshot is taken before any send, so the map lock is
    /// never held across a delivery; a connection joining or closing during
    /// the loop may or may not see this frame. Returns how many connections
    /// the frame was queued for.
    fn fan_out(
        &self,
        session_id: &str,
        filter: RoleFilter,
        exclude: Option<&ConnectionId>,
        frame: ServerFrame,
    ) -> usize {
        let targets = self.registry.list(session_id, filter);

        let mut delivered = 0;
        for client in targets {
            if exclude == Some(client.id()) {
                continue;
            }
            if self.deliver(&client, frame.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Queue a frame on one connection's outbox.
    ///
    /// A dead outbox means the socket task already exited; the connection is
    /// treated as closed and unregistered on the spot. Failure here never
    /// affects delivery to the rest of a fan-out set.
    fn deliver(&self, client: &ClientHandle, frame: ServerFrame) -> bool {
        if client.send(frame) {
            true
        } else {
            warn!(connection = %client.id(), "Outbox gone, unregistering connection");
            self.registry.unregister(client.id());
            false
        }
    }
}
