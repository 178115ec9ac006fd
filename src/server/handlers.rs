//! Request handlers
//!
//! | Path | Description |
//! |------|-------------|
//! | `POST /stream/{kind}?clientId=` | Producer upload of length-prefixed frames |
//! | `GET /view` | Viewer WebSocket |
//! | `GET /health` | Liveness |
//! | `GET /stats` | Relay statistics (JSON) |

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, Path, Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::reject::RejectReason;
use super::routes::AppState;
use crate::broadcast::ViewerRequest;
use crate::registry::{ClientId, StreamKind};
use crate::relay::Relay;
use crate::session::{ProducerContext, ProducerSession};
use crate::stats::RelayStats;

/// Query parameters of a producer upload
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
}

/// `POST /stream/{kind}`
///
/// Holds the request open for the whole upload and answers only once the
/// body ends.
pub async fn upload(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<StreamParams>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    body: Body,
) -> Response {
    let peer_addr = connect_info.map(|ConnectInfo(addr)| addr);

    let client_id = match params.client_id {
        Some(id) => match ClientId::new(id) {
            Ok(id) => id,
            Err(e) => return RejectReason::from(e).into_response(),
        },
        None => return RejectReason::MissingClientId.into_response(),
    };
    let kind: StreamKind = match kind.parse() {
        Ok(kind) => kind,
        Err(e) => {
            tracing::debug!(kind = %kind, client_id = %client_id, "Rejected unknown stream type");
            return RejectReason::from(e).into_response();
        }
    };

    let _permit = match state.connection_limit.as_ref() {
        Some(limit) => match Arc::clone(limit).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(peer = ?peer_addr, client_id = %client_id, "Upload rejected: limit reached");
                return RejectReason::Busy.into_response();
            }
        },
        None => None,
    };

    let context = ProducerContext::new(state.relay.next_session_id(), client_id, kind)
        .with_peer(peer_addr);
    let session = ProducerSession::new(
        Arc::clone(&state.relay),
        context,
        state.config.max_frame_size,
    );

    let reason = session
        .run(body.into_data_stream(), state.config.idle_timeout)
        .await;

    match RejectReason::from_termination(reason) {
        Some(reject) => reject.into_response(),
        None => StatusCode::OK.into_response(),
    }
}

/// `GET /view`
pub async fn view(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| viewer_session(socket, state.relay))
}

/// Pump one viewer's queue into its socket until either side goes away
async fn viewer_session(mut socket: WebSocket, relay: Arc<Relay>) {
    let mut viewer = relay.subscribe();
    let viewer_id = viewer.id();
    tracing::info!(viewer = %viewer_id, "Viewer connected");

    loop {
        tokio::select! {
            outbound = viewer.recv() => match outbound {
                Some(text) => {
                    if socket.send(Message::Text(text.to_string())).await.is_err() {
                        break;
                    }
                }
                // Dropped by the broadcaster as a slow viewer
                None => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    // Answered through the queue so it stays ordered with
                    // presence already waiting there
                    if ViewerRequest::parse(&text) == Some(ViewerRequest::Refresh)
                        && !relay.refresh(viewer_id)
                    {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    relay.unsubscribe(viewer_id);
    tracing::info!(viewer = %viewer_id, "Viewer disconnected");
}

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}

/// `GET /stats`
pub async fn stats(State(state): State<AppState>) -> Json<RelayStats> {
    Json(state.relay.stats())
}
