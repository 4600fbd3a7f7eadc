//! WebSocket upgrade handler.
//!
//! Each socket gets two halves: this task reads frames and feeds the
//! connection's state machine in order, and a spawned writer task drains
//! the outbound queue and sends pings.

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use duet_realtime::connection::heartbeat::HeartbeatStatus;
use duet_realtime::message::encode_outbound;
use duet_realtime::{CloseReason, RealtimeEngine};

use crate::state::AppState;

/// GET /ws: WebSocket upgrade. Authentication happens in-band.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    // Frames up to 4x the event limit are read and dropped by the decoder;
    // anything larger fails the socket.
    let transport_limit = state
        .realtime
        .config()
        .max_inbound_frame_bytes
        .saturating_mul(4);

    ws.max_message_size(transport_limit)
        .on_upgrade(move |socket| handle_socket(state.realtime, socket))
}

async fn handle_socket(engine: RealtimeEngine, socket: WebSocket) {
    let (mut lifecycle, mut outbound_rx) = engine.open_connection();
    let handle = lifecycle.handle().clone();
    let heartbeat = engine.heartbeat_config();
    let (mut sink, mut stream) = socket.split();

    info!(connection_id = %handle.id, "WebSocket connection established");

    let writer_handle = handle.clone();
    let writer = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(heartbeat.ping_interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = writer_handle.closed() => break,
                event = outbound_rx.recv() => {
                    let Some(event) = event else { break };
                    let text = match encode_outbound(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(connection_id = %writer_handle.id, error = %e, "Failed to encode outbound event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        writer_handle.close(CloseReason::TransportError);
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let HeartbeatStatus::TimedOut { .. } = heartbeat.check(&writer_handle).await {
                        writer_handle.close(CloseReason::HeartbeatTimeout);
                        break;
                    }
                    if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                        writer_handle.close(CloseReason::TransportError);
                        break;
                    }
                }
            }
        }

        let _ = sink.send(Message::Close(None)).await;
        let _ = sink.close().await;
    });

    let reason = loop {
        tokio::select! {
            _ = handle.closed() => {
                break handle.close_reason().unwrap_or(CloseReason::ServerShutdown);
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => lifecycle.handle_text(text.as_str()).await,
                Some(Ok(Message::Pong(_))) => handle.record_pong().await,
                Some(Ok(Message::Ping(_))) => handle.touch().await,
                Some(Ok(Message::Binary(_))) => {
                    engine.metrics.record_rejected();
                    debug!(connection_id = %handle.id, "Dropped binary frame");
                }
                Some(Ok(Message::Close(_))) | None => break CloseReason::ClientClosed,
                Some(Err(e)) => {
                    debug!(connection_id = %handle.id, error = %e, "WebSocket read error");
                    break CloseReason::TransportError;
                }
            },
        }
    };

    lifecycle.close(reason).await;
    if let Err(e) = writer.await {
        warn!(connection_id = %handle.id, error = %e, "WebSocket writer task failed");
    }
}
