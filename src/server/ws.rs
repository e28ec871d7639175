/**
 * Duplex Transport
 *
 * The WebSocket variant of the query endpoint. It frames the same
 * request/response pair as the plain HTTP endpoint and additionally
 * delivers asynchronous notification batches:
 *
 * - client:  `{"type": "REQUEST", "fid": <id>, "data": {query, ...}}`
 * - server:  `{"type": "RESPONSE", "fid": <id>, "data": {data | errors}}`
 * - server:  `{"type": "NOTIFY", "data": ["<sid>", ...]}`
 *
 * `fid` correlates a response to its request and is echoed verbatim.
 * Connecting opens the connection's scope (and publishes a client delta);
 * disconnecting destroys it and every subscription it carried.
 */

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::auth::Identity;
use crate::graph::pipeline;
use crate::middleware::auth::AuthIdentity;
use crate::server::state::AppState;

/// Upgrade handler (GET {graph})
pub async fn ws_upgrade(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| drive_connection(state, identity, socket))
}

async fn drive_connection(state: AppState, identity: Identity, socket: WebSocket) {
    let cid = Uuid::new_v4().to_string();
    let (notify_tx, notify_rx) = mpsc::unbounded_channel::<Vec<String>>();
    let mut notify_rx = UnboundedReceiverStream::new(notify_rx);
    let connection = state
        .subscriptions
        .connect(cid.clone(), move |sids| {
            let _ = notify_tx.send(sids);
        })
        .await;

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let Some(reply) = handle_frame(&state, &identity, &connection, text.as_str()).await else {
                        continue;
                    };
                    if sink.send(Message::Text(reply.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("[Subscribe] socket error: cid={cid}, {e}");
                    break;
                }
            },
            batch = notify_rx.next() => {
                let Some(sids) = batch else { break };
                tracing::debug!("[Subscribe] notifying stale sids: cid={cid}, count={}", sids.len());
                let frame = serde_json::json!({ "type": "NOTIFY", "data": sids });
                if sink.send(Message::Text(frame.to_string().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.subscriptions.disconnect(&cid).await;
}

/// Handle one inbound frame, returning the response frame if one is due
async fn handle_frame(
    state: &AppState,
    identity: &Identity,
    connection: &std::sync::Arc<crate::subscribe::ConnectionScope>,
    text: &str,
) -> Option<serde_json::Value> {
    let frame: serde_json::Value = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!("[Subscribe] unparseable frame dropped: {e}");
            return None;
        }
    };
    if frame["type"] != "REQUEST" {
        tracing::debug!("[Subscribe] unexpected frame type dropped: {}", frame["type"]);
        return None;
    }
    let fid = frame["fid"].clone();

    let envelope =
        match pipeline::run(state, frame["data"].clone(), identity.clone(), Some(connection)).await
        {
            Ok(envelope) => envelope,
            // Keep framing uniform: structural errors become an errors envelope
            Err(error) => serde_json::json!({ "errors": [{ "message": error.to_string() }] }),
        };

    Some(serde_json::json!({ "type": "RESPONSE", "fid": fid, "data": envelope }))
}
