//! WebSocket endpoint
//!
//! One JSON reply frame per inbound text frame. Validation failures go
//! back as `error` replies on the same connection; only transport errors
//! or an explicit close end the loop.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::{debug, error};

use super::{dispatch, AppContext};

/// GET /ws - upgrade to the message protocol
pub async fn websocket(
    State(ctx): State<AppContext>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| client_loop(ctx, socket))
}

async fn client_loop(ctx: AppContext, mut socket: WebSocket) {
    debug!("WebSocket client connected");
    while let Some(frame) = socket.recv().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!("WebSocket receive error: {}", e);
                break;
            }
        };
        match frame {
            Message::Text(text) => {
                let reply = dispatch::dispatch_text(&ctx.engine, &text).await;
                let payload = match serde_json::to_string(&reply) {
                    Ok(payload) => payload,
                    Err(e) => {
                        error!("Failed to encode reply: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            // Ping/pong handled by axum; binary frames ignored
            _ => {}
        }
    }
    debug!("WebSocket client disconnected");
}
