//! REST surface for session setup.
//!
//! These endpoints are the gatekeepers of session existence: sessions and
//! participant records are created here, before any realtime traffic exists
//! for them. Slide images are opaque URLs; no file content flows through
//! this server.

use crate::handlers::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use beam_core::{code, NewParticipant, NewSession, NewSlide, Session, Slide};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::info;

/// API error type with structured responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

/// Error body shape shared by every endpoint.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Build the REST router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/join", post(join_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/slides", get(get_slides))
}

/// A slide supplied at session creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideUpload {
    /// Opaque image reference.
    pub image_url: String,
    /// Deck position; defaults to the list position.
    pub order: Option<u32>,
}

/// Request body for `POST /api/sessions`.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub slides: Vec<SlideUpload>,
}

/// Response body for `POST /api/sessions`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub code: String,
}

/// Create a session with its slide list.
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    if body.slides.is_empty() {
        return Err(ApiError::BadRequest("No slides provided".to_string()));
    }

    let code = code::unique_code(state.store.as_ref()).await;
    let presenter_id = format!("presenter-{}", unix_millis());

    let session = state
        .store
        .create_session(NewSession {
            code,
            presenter_id,
            current_slide: 0,
        })
        .await;

    for (position, slide) in body.slides.into_iter().enumerate() {
        state
            .store
            .create_slide(NewSlide {
                session_id: session.id.clone(),
                image_url: slide.image_url,
                order: slide.order.unwrap_or(position as u32),
            })
            .await;
    }

    info!(session = %session.id, code = %session.code, "Session created");

    Ok(Json(CreateSessionResponse {
        session_id: session.id,
        code: session.code,
    }))
}

/// Request body for `POST /api/sessions/join`.
#[derive(Debug, Deserialize)]
pub struct JoinSessionRequest {
    pub code: String,
    pub name: String,
}

/// Response body for `POST /api/sessions/join`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionResponse {
    pub session_id: String,
}

/// Join a session by code, recording the participant.
async fn join_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<JoinSessionRequest>,
) -> Result<Json<JoinSessionResponse>, ApiError> {
    if body.code.trim().is_empty() || body.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Code and name are required".to_string(),
        ));
    }

    let session = state
        .store
        .get_session_by_code(&body.code)
        .await
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    let participant = state
        .store
        .add_participant(NewParticipant {
            session_id: session.id.clone(),
            name: body.name,
        })
        .await;

    info!(session = %session.id, participant = %participant.id, "Participant joined");

    Ok(Json(JoinSessionResponse {
        session_id: session.id,
    }))
}

/// Fetch a session record.
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    state
        .store
        .get_session(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}

/// Fetch a session's slides, ordered ascending. An unknown session yields an
/// empty list, not a 404.
async fn get_slides(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<Vec<Slide>> {
    Json(state.store.slides_by_session(&id).await)
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::default()))
    }

    fn deck(n: usize) -> CreateSessionRequest {
        CreateSessionRequest {
            slides: (0..n)
                .map(|i| SlideUpload {
                    image_url: format!("https://cdn.example/slide-{i}.png"),
                    order: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_create_session_requires_slides() {
        let state = state();
        let result = create_session(State(state), Json(deck(0))).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_then_join_flow() {
        let state = state();

        let created = create_session(State(state.clone()), Json(deck(3)))
            .await
            .unwrap();
        assert_eq!(created.code.len(), code::CODE_LENGTH);

        let joined = join_session(
            State(state.clone()),
            Json(JoinSessionRequest {
                code: created.code.clone(),
                name: "Kim".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(joined.session_id, created.session_id);

        let roster = state.store.list_participants(&created.session_id).await;
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Kim");

        let slides = get_slides(State(state), Path(created.session_id.clone())).await;
        assert_eq!(slides.len(), 3);
        assert_eq!(slides.0[0].order, 0);
    }

    #[tokio::test]
    async fn test_join_unknown_code_is_404_and_records_nothing() {
        let state = state();

        let result = join_session(
            State(state.clone()),
            Json(JoinSessionRequest {
                code: "NOSUCH".to_string(),
                name: "Kim".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_join_requires_code_and_name() {
        let state = state();

        let result = join_session(
            State(state),
            Json(JoinSessionRequest {
                code: "ABC123".to_string(),
                name: "   ".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_get_session_not_found() {
        let state = state();
        let result = get_session(State(state), Path("missing".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
