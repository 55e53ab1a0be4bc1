//! WebSocket handlers for the drawing channels.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::relay::Validation;
use crate::server::state::AppState;

/// GET /ws - validated drawing channel.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Validation::Strict))
}

/// GET /ws/draw - lenient channel that relays any JSON.
pub async fn ws_draw_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Validation::Lenient))
}

/// Handles an individual WebSocket connection.
///
/// A writer task drains the connection's outbound queue into the socket.
/// This task reads frames and runs each broadcast pass itself, so one
/// peer's frames are relayed in the order they arrive.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, validation: Validation) {
    let (mut sender, mut receiver) = socket.split();

    let (connection, mut outbound) = state.new_connection();
    let connection = Arc::new(connection);
    let conn_id = connection.id();
    state.relay.registry().register(Arc::clone(&connection));

    // Dropping `outbound` when this task ends makes further sends fail.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = sender.send(Message::Text(frame.to_string())).await {
                tracing::debug!(%conn_id, error = %e, "WebSocket write failed");
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut shutdown = state.shutdown_signal();
    let mut watch_shutdown = true;
    let mut writer_finished = false;

    loop {
        tokio::select! {
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    state.relay.handle_text(&connection, &text, validation).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Pings are answered by axum; binary frames are not part of the protocol.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(%conn_id, error = %e, "WebSocket read failed");
                    break;
                }
            },
            _ = &mut send_task => {
                writer_finished = true;
                break;
            }
            changed = shutdown.changed(), if watch_shutdown => match changed {
                Ok(()) if *shutdown.borrow_and_update() => break,
                Ok(()) => {}
                Err(_) => watch_shutdown = false,
            },
        }
    }

    connection.mark_closing();
    state.relay.registry().unregister(&connection);
    if !writer_finished {
        send_task.abort();
    }

    tracing::debug!(
        %conn_id,
        ?validation,
        connected_secs = connection.age_secs(),
        "WebSocket connection closed"
    );
}
