//! WebSocket upgrade handler: one dashboard frame per subscriber every
//! ~100ms, fed by the registry the broadcaster task writes into.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tracing::debug;

use super::routes::AppState;

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (id, mut rx) = state.subscribers.register().await;
    debug!(subscriber_id = id, "websocket subscriber connected");

    loop {
        tokio::select! {
            frame = rx.recv() => {
                match frame {
                    Some(payload) => {
                        if socket.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                // The client never sends anything meaningful on this channel;
                // a closed or errored read means the peer is gone.
                if incoming.is_none() {
                    break;
                }
            }
        }
    }

    state.subscribers.unregister(id).await;
    debug!(subscriber_id = id, "websocket subscriber disconnected");
}
