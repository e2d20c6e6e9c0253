use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use notify_application::commands::lifecycle_commands;
use notify_application::AppState;
use notify_domain::{ConnectionId, ServerMessage};

/// Native transport: upgrade is connect, each text frame is a message and
/// the end of the socket is disconnect.
pub async fn ws_connect(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let max_message_bytes = state.config.ws_max_message_bytes as usize;
    ws.max_message_size(max_message_bytes)
        .on_upgrade(move |socket| run_session(state, socket))
}

async fn run_session(state: AppState, socket: WebSocket) {
    let connection_id = ConnectionId::generate();
    let (replies, outbound) = state.local_hub.register(&connection_id).await;
    lifecycle_commands::on_connect(&state, &connection_id).await;

    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(write_outbound(sink, outbound));

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(_)) => {
                let reply = ServerMessage::error("UNSUPPORTED_FRAME", "binary frames are not accepted");
                if replies.send(reply.to_json()).await.is_err() {
                    break;
                }
                continue;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                debug!(connection_id = %connection_id, "socket read failed: {}", err);
                break;
            }
        };
        let reply = match lifecycle_commands::on_message(&state, &connection_id, &text).await {
            Ok(reply) => reply,
            Err(err) => ServerMessage::error(err.code(), err.to_string()),
        };
        if replies.send(reply.to_json()).await.is_err() {
            break;
        }
    }

    lifecycle_commands::on_disconnect(&state, &connection_id).await;
    state.local_hub.unregister(&connection_id).await;
    drop(replies);
    if let Err(err) = writer.await {
        warn!(connection_id = %connection_id, "socket writer ended abnormally: {}", err);
    }
}

async fn write_outbound(
    mut sink: futures_util::stream::SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<String>,
) {
    while let Some(payload) = outbound.recv().await {
        if sink.send(Message::Text(payload)).await.is_err() {
            break;
        }
    }
    let _ = sink.close().await;
}
