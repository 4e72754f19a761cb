//! Live Stream Routes - WebSocket fan-out
//!
//! A connection receives the current snapshot, one text frame per record,
//! then live updates. The hub pings every heartbeat; a peer that has not
//! answered with a pong by the next beat is closed.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use herald::{Outbound, Topic};
use tracing::{debug, warn};

use crate::models::StreamQuery;
use crate::AppState;

/// Stream embeds (global recent feed, or one channel)
#[utoipa::path(
    get,
    path = "/ws/embeds",
    params(StreamQuery),
    responses((status = 101, description = "Switching to WebSocket")),
    tag = "Streams"
)]
pub async fn stream_embeds(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Response {
    upgrade(ws, state, Topic::Embeds, query.channel)
}

/// Stream chat messages (every channel, or one)
#[utoipa::path(
    get,
    path = "/ws/messages",
    params(StreamQuery),
    responses((status = 101, description = "Switching to WebSocket")),
    tag = "Streams"
)]
pub async fn stream_messages(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Response {
    upgrade(ws, state, Topic::Messages, query.channel)
}

fn upgrade(ws: WebSocketUpgrade, state: AppState, topic: Topic, channel: Option<String>) -> Response {
    let channel = channel.filter(|c| !c.is_empty());
    ws.on_upgrade(move |socket| serve(socket, state, topic, channel))
}

async fn serve(socket: WebSocket, state: AppState, topic: Topic, channel: Option<String>) {
    let hub = state.relay.hub().clone();
    let (mut sink, mut stream) = socket.split();

    let mut handle = match hub.subscribe(topic, channel) {
        Ok(handle) => handle,
        Err(e) => {
            warn!(topic = %topic, error = %e, "Refusing subscriber");
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
    };
    let id = handle.id();

    loop {
        tokio::select! {
            outbound = handle.recv() => {
                let frame = match outbound {
                    Some(Outbound::Text(json)) => Message::Text(json.to_string()),
                    Some(Outbound::Ping) => Message::Ping(Vec::new()),
                    Some(Outbound::Close) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                };
                if sink.send(frame).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Pong(_))) => handle.mark_alive(),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Client text is ignored
                Some(Ok(_)) => {}
            }
        }
    }

    hub.unsubscribe(topic, id);
    debug!(subscriber = %id, topic = %topic, "Connection closed");
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws/embeds", get(stream_embeds))
        .route("/ws/messages", get(stream_messages))
}
