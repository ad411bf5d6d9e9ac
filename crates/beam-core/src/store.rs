//! Session state storage for Beam.
//!
//! The hub consumes this as an abstract store; only `get_session`,
//! `update_current_slide`, and `list_participants` are load-bearing for the
//! realtime path. The remaining operations serve the REST surface.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Current unix time in milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A shareable presentation instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque unique id.
    pub id: String,
    /// Short human-entered join code, unique among active sessions.
    pub code: String,
    /// Identity of the presenter that created the session.
    pub presenter_id: String,
    /// Current slide index. Updated exclusively through the hub's
    /// slide-change handler after creation.
    pub current_slide: u32,
    /// Creation time, unix millis.
    pub created_at: u64,
}

/// Fields required to create a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub code: String,
    pub presenter_id: String,
    pub current_slide: u32,
}

/// A single slide of a session. The image itself is an opaque URL; slide
/// content never flows through this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: String,
    pub session_id: String,
    pub image_url: String,
    /// Position within the deck.
    pub order: u32,
}

/// Fields required to create a slide.
#[derive(Debug, Clone)]
pub struct NewSlide {
    pub session_id: String,
    pub image_url: String,
    pub order: u32,
}

/// A participant record. Created when a client joins over REST and read by
/// the hub for roster snapshots; never deleted, so a record outlives its
/// live connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub session_id: String,
    pub name: String,
    /// Join time, unix millis.
    pub joined_at: u64,
}

/// Fields required to record a participant.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub session_id: String,
    pub name: String,
}

/// Read/write access to session state.
///
/// Consistency is the store's concern: `update_current_slide` is atomic
/// last-write-wins per session id, and the hub does not re-implement any of
/// it. The in-process [`MemoryStore`] is the only implementation today; the
/// trait is the seam for a durable backend.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session record.
    async fn create_session(&self, new_session: NewSession) -> Session;

    /// Fetch a session by id.
    async fn get_session(&self, id: &str) -> Option<Session>;

    /// Fetch a session by join code.
    async fn get_session_by_code(&self, code: &str) -> Option<Session>;

    /// Set the session's current slide index. Idempotent last-write-wins; a
    /// silent no-op for an unknown session id.
    async fn update_current_slide(&self, id: &str, slide_index: u32);

    /// Create a slide record.
    async fn create_slide(&self, new_slide: NewSlide) -> Slide;

    /// Fetch a session's slides, ordered by `order` ascending.
    async fn slides_by_session(&self, session_id: &str) -> Vec<Slide>;

    /// Record a participant.
    async fn add_participant(&self, new_participant: NewParticipant) -> Participant;

    /// Fetch a session's participants, ordered by join time ascending.
    async fn list_participants(&self, session_id: &str) -> Vec<Participant>;
}

/// In-process session store. Process lifetime only; nothing survives a
/// restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: DashMap<String, Session>,
    /// Slides keyed by owning session id.
    slides: DashMap<String, Vec<Slide>>,
    /// Participants keyed by owning session id, in join order.
    participants: DashMap<String, Vec<Participant>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, new_session: NewSession) -> Session {
        let session = Session {
            id: new_id(),
            code: new_session.code,
            presenter_id: new_session.presenter_id,
            current_slide: new_session.current_slide,
            created_at: now_millis(),
        };
        self.sessions.insert(session.id.clone(), session.clone());
        session
    }

    async fn get_session(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    async fn get_session_by_code(&self, code: &str) -> Option<Session> {
        self.sessions
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| entry.value().clone())
    }

    async fn update_current_slide(&self, id: &str, slide_index: u32) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.current_slide = slide_index;
        }
    }

    async fn create_slide(&self, new_slide: NewSlide) -> Slide {
        let slide = Slide {
            id: new_id(),
            session_id: new_slide.session_id,
            image_url: new_slide.image_url,
            order: new_slide.order,
        };
        self.slides
            .entry(slide.session_id.clone())
            .or_default()
            .push(slide.clone());
        slide
    }

    async fn slides_by_session(&self, session_id: &str) -> Vec<Slide> {
        let mut slides = self
            .slides
            .get(session_id)
            .map(|s| s.value().clone())
            .unwrap_or_default();
        slides.sort_by_key(|slide| slide.order);
        slides
    }

    async fn add_participant(&self, new_participant: NewParticipant) -> Participant {
        let participant = Participant {
            id: new_id(),
            session_id: new_participant.session_id,
            name: new_participant.name,
            joined_at: now_millis(),
        };
        self.participants
            .entry(participant.session_id.clone())
            .or_default()
            .push(participant.clone());
        participant
    }

    async fn list_participants(&self, session_id: &str) -> Vec<Participant> {
        // Insertion order is join order, so no sort is needed; millisecond
        // timestamp ties cannot reorder the roster.
        self.participants
            .get(session_id)
            .map(|p| p.value().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_session(code: &str) -> NewSession {
        NewSession {
            code: code.to_string(),
            presenter_id: "presenter-1".to_string(),
            current_slide: 0,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let store = MemoryStore::new();
        let session = store.create_session(new_session("ABC123")).await;

        let found = store.get_session(&session.id).await.unwrap();
        assert_eq!(found.code, "ABC123");
        assert_eq!(found.current_slide, 0);

        assert!(store.get_session("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_get_session_by_code() {
        let store = MemoryStore::new();
        let session = store.create_session(new_session("XY77QP")).await;

        let found = store.get_session_by_code("XY77QP").await.unwrap();
        assert_eq!(found.id, session.id);

        assert!(store.get_session_by_code("NOPE").await.is_none());
    }

    #[tokio::test]
    async fn test_update_current_slide() {
        let store = MemoryStore::new();
        let session = store.create_session(new_session("ABC123")).await;

        store.update_current_slide(&session.id, 5).await;
        assert_eq!(store.get_session(&session.id).await.unwrap().current_slide, 5);

        // Unknown id is a silent no-op.
        store.update_current_slide("missing", 9).await;
    }

    #[tokio::test]
    async fn test_slides_sorted_by_order() {
        let store = MemoryStore::new();
        let session = store.create_session(new_session("ABC123")).await;

        for order in [2u32, 0, 1] {
            store
                .create_slide(NewSlide {
                    session_id: session.id.clone(),
                    image_url: format!("https://cdn.example/slide-{order}.png"),
                    order,
                })
                .await;
        }

        let slides = store.slides_by_session(&session.id).await;
        let orders: Vec<u32> = slides.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);

        assert!(store.slides_by_session("missing").await.is_empty());
    }

    #[tokio::test]
    async fn test_participants_in_join_order() {
        let store = MemoryStore::new();
        let session = store.create_session(new_session("ABC123")).await;

        for name in ["Kim", "Lee", "Ada"] {
            store
                .add_participant(NewParticipant {
                    session_id: session.id.clone(),
                    name: name.to_string(),
                })
                .await;
        }

        let roster = store.list_participants(&session.id).await;
        let names: Vec<&str> = roster.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Kim", "Lee", "Ada"]);

        assert!(store.list_participants("missing").await.is_empty());
    }
}
