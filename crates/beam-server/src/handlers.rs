//! Connection handlers for the Beam server.
//!
//! This module handles the WebSocket connection lifecycle and frame
//! processing. Each connection is serviced by its own task; frames destined
//! for the socket arrive on an unbounded outbox channel so the hub never
//! blocks on a slow peer's transport write.

use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use crate::rest;
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use beam_core::{BroadcastHub, ClientHandle, ConnectionId, MemoryStore, SessionStore};
use beam_protocol::{codec, ClientFrame, ServerFrame};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Shared server state.
pub struct AppState {
    /// The broadcast hub.
    pub hub: BroadcastHub,
    /// Session state, shared with the hub.
    pub store: Arc<dyn SessionStore>,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());

        Self {
            hub: BroadcastHub::new(store.clone()),
            store,
            config,
        }
    }
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    // Build router
    let app = Router::new()
        .route(&config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .merge(rest::routes())
        .with_state(state);

    // Bind and serve
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;

    info!("Beam server listening on {}", addr);
    info!(
        "WebSocket endpoint: ws://{}{}",
        addr,
        config.transport.websocket_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let max_message_size = state.config.limits.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_websocket(socket: WebSocket, state: Arc<AppState>) {
    // Record connection metrics
    let _metrics_guard = ConnectionMetricsGuard::new();

    let connection_id = ConnectionId::generate();

    debug!(connection = %connection_id, "WebSocket connected");

    // Split the WebSocket
    let (mut sender, mut receiver) = socket.split();

    // Outbox drained by this task; the hub holds the sending half via the
    // registered ClientHandle once the connection joins.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerFrame>();

    // Set on the first successful join; the session/role binding is
    // immutable afterwards.
    let mut joined = false;

    // Frame processing loop
    loop {
        tokio::select! {
            biased;

            // Deliver frames queued by the hub
            Some(frame) = out_rx.recv() => {
                match codec::encode(&frame) {
                    Ok(text) => {
                        metrics::record_message(text.len(), "outbound");
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(connection = %connection_id, error = %e, "Failed to encode frame");
                        metrics::record_error("encode");
                    }
                }
            }

            // Receive from WebSocket
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let start = Instant::now();
                        metrics::record_message(text.len(), "inbound");

                        match codec::decode(&text) {
                            Ok(frame) => {
                                handle_frame(frame, &connection_id, &mut joined, &out_tx, &state)
                                    .await;
                            }
                            Err(e) => {
                                // Malformed input is dropped; the connection
                                // stays open and gets no error response.
                                warn!(connection = %connection_id, error = %e, "Dropping malformed frame");
                                metrics::record_error("protocol");
                            }
                        }

                        metrics::record_latency(start.elapsed().as_secs_f64());
                    }
                    Some(Ok(Message::Binary(_))) => {
                        // The protocol is text frames only
                        warn!(connection = %connection_id, "Dropping unexpected binary frame");
                        metrics::record_error("protocol");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // Ignore pongs
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!(connection = %connection_id, "Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(connection = %connection_id, error = %e, "WebSocket error");
                        metrics::record_error("websocket");
                        break;
                    }
                    None => {
                        debug!(connection = %connection_id, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Teardown: closing the transport is the only cancellation signal.
    state.hub.handle_disconnect(&connection_id);
    metrics::set_active_sessions(state.hub.registry().stats().session_count);

    debug!(connection = %connection_id, "WebSocket disconnected");
}

/// Handle a decoded frame.
async fn handle_frame(
    frame: ClientFrame,
    connection_id: &ConnectionId,
    joined: &mut bool,
    out_tx: &mpsc::UnboundedSender<ServerFrame>,
    state: &Arc<AppState>,
) {
    let kind = frame.kind();

    match frame {
        ClientFrame::Join { session_id, role } => {
            if *joined {
                debug!(connection = %connection_id, session = %session_id, "Duplicate join ignored");
                return;
            }
            *joined = true;

            let client = ClientHandle::new(connection_id.clone(), role, out_tx.clone());
            state.hub.handle_join(&session_id, client).await;

            metrics::record_join(role);
            metrics::set_active_sessions(state.hub.registry().stats().session_count);
        }

        ClientFrame::SlideChange {
            session_id,
            slide_index,
        } => {
            if !*joined {
                // Benign ordering race: frames before a successful join are
                // simply dropped.
                trace!(connection = %connection_id, kind, "Frame before join, dropped");
                return;
            }

            state
                .hub
                .handle_slide_change(connection_id, &session_id, slide_index)
                .await;
        }
    }
}
