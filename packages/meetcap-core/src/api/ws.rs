//! WebSocket acceptor for inbound meeting-recording connections (§4.8).
//!
//! One [`Session`] is created per upgraded connection and driven to
//! completion by a single task — mirrors the connection-manager /
//! `tokio::select!` shape used for the control-plane WebSocket
//! elsewhere in the corpus, with heartbeat-timeout swapped for
//! frame-inactivity-timeout and command dispatch swapped for
//! `Session::handle_message`.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::sink::SinkExt;
use futures::stream::StreamExt;
use std::time::Duration;
use uuid::Uuid;

use crate::api::AppState;
use crate::lifecycle::finalise_session;
use crate::pipeline::PipelineConfig;
use crate::protocol_constants::INACTIVITY_CHECK_INTERVAL_SECS;
use crate::session::Session;

/// WebSocket upgrade handler: no authentication is performed, matching
/// the trusted-local-origin assumption (§4.8).
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session(socket, state))
}

/// Drives one session from accept to finalisation.
async fn handle_session(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let session_id = Uuid::new_v4();
    let mut session = match Session::new(session_id, &state.recordings_root, state.session_flags()).await {
        Ok(session) => session,
        Err(e) => {
            log::error!("session {session_id}: failed to open live directory: {e}");
            let _ = sender.close().await;
            return;
        }
    };

    let guard = state.registry.register(session_id);
    let cancel_token = guard.cancel_token().clone();
    log::info!("session {session_id}: accepted");

    let inactivity_timeout = Duration::from_secs(state.config.inactivity_timeout_secs);
    let mut inactivity_check = tokio::time::interval(Duration::from_secs(INACTIVITY_CHECK_INTERVAL_SECS));
    inactivity_check.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut close_reason = "client_close".to_string();

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                close_reason = "server_shutdown".to_string();
                break;
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        if let Err(e) = session.handle_message(&data).await {
                            log::warn!("session {session_id}: frame handling error: {e}");
                        }
                        if let Some(reason) = session.take_requested_close() {
                            close_reason = reason;
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        log::warn!("session {session_id}: socket error: {e}");
                        close_reason = "socket_error".to_string();
                        break;
                    }
                    _ => {}
                }
            }
            _ = inactivity_check.tick() => {
                if session.last_frame_instant().elapsed() > inactivity_timeout {
                    log::info!("session {session_id}: inactivity timeout");
                    close_reason = "inactivity_timeout".to_string();
                    break;
                }
            }
        }
    }

    let _ = sender.close().await;
    drop(guard);

    let pipeline_config = PipelineConfig {
        language: state.config.summarisation_language.clone(),
    };

    if let Err(e) = finalise_session(
        &mut session,
        &close_reason,
        None,
        &state.recordings_root,
        state.spawner.clone(),
        state.providers.clone(),
        pipeline_config,
    )
    .await
    {
        log::error!("session {session_id}: finalisation failed: {e}");
    }
}
