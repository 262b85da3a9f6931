//! Session WebSocket Route
//!
//! `GET /ws` upgrades to a navigation session. Each text frame is one
//! action; its whole response is written before the next frame is read.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use tokio::task::JoinError;

use super::state::ServerState;
use crate::observability::{warn_event, Event};
use crate::session::{Response, ServerMessage, SessionDriver};

/// Create session routes
pub fn session_routes(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Encodes one outgoing message as a text frame
fn encode<T: Serialize>(message: &T) -> Result<Message, axum::Error> {
    serde_json::to_string(message)
        .map(Message::Text)
        .map_err(axum::Error::new)
}

/// Writes every message of `response`; returns the number of point chunks
/// sent, terminator included.
///
/// Stops at the first message that cannot be encoded or sent, so a client
/// never sees a response with a gap in it.
async fn send_response<S>(sender: &mut S, response: Response) -> Result<u64, axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let mut chunks = 0;
    for message in response {
        sender.send(encode(&message)?).await?;
        if matches!(message, ServerMessage::Chunk(_)) {
            chunks += 1;
        }
    }
    Ok(chunks)
}

/// Handles one frame on the blocking pool. The driver moves there and
/// comes back with the response.
async fn handle_frame(
    mut driver: SessionDriver,
    text: String,
) -> Result<(SessionDriver, Response), JoinError> {
    tokio::task::spawn_blocking(move || {
        let response = driver.handle_text(&text);
        (driver, response)
    })
    .await
}

async fn handle_websocket(socket: WebSocket, state: Arc<ServerState>) {
    let mut driver = SessionDriver::new(Arc::clone(&state.engine), state.chunk_size);
    let session_id = driver.id().to_string();
    let (mut sender, mut receiver) = socket.split();

    while let Some(result) = receiver.next().await {
        let text = match result {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            Ok(Message::Ping(data)) => {
                if sender.send(Message::Pong(data)).await.is_err() {
                    break;
                }
                continue;
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => continue,
            Err(e) => {
                warn_event(
                    Event::SessionTransportError,
                    &[("session_id", &session_id), ("reason", &e.to_string())],
                );
                break;
            }
        };

        let response = match handle_frame(driver, text).await {
            Ok((returned, response)) => {
                driver = returned;
                response
            }
            Err(e) => {
                warn_event(
                    Event::SessionTransportError,
                    &[("session_id", &session_id), ("reason", &e.to_string())],
                );
                break;
            }
        };

        match send_response(&mut sender, response).await {
            Ok(chunks) => state.engine.metrics().add_chunks_sent(chunks),
            Err(e) => {
                warn_event(
                    Event::SessionTransportError,
                    &[("session_id", &session_id), ("reason", &e.to_string())],
                );
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::{Error as _, Serializer};
    use std::convert::Infallible;

    use crate::engine::Engine;
    use crate::storage::Sample;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("value has no JSON form"))
        }
    }

    fn driver() -> SessionDriver {
        let engine = Engine::in_memory();
        engine
            .ingest((0..5).map(|i| Sample::new(i, i * 10)).collect())
            .unwrap();
        SessionDriver::new(Arc::new(engine), 2)
    }

    fn collecting_sink(
        frames: &mut Vec<Message>,
    ) -> impl Sink<Message, Error = axum::Error> + Unpin + '_ {
        frames.sink_map_err(|never: Infallible| -> axum::Error { match never {} })
    }

    #[test]
    fn test_encode_failure_is_an_error() {
        let err = encode(&Unencodable).unwrap_err();
        assert!(err.to_string().contains("no JSON form"));
    }

    #[tokio::test]
    async fn test_send_response_writes_whole_stream() {
        let mut driver = driver();
        let response = driver.handle_text(r#"{"action":"load","start_ns":0,"end_ns":4,"granularity":"1t"}"#);

        let mut frames = Vec::new();
        let chunks = send_response(&mut collecting_sink(&mut frames), response)
            .await
            .unwrap();

        // 5 points in chunks of 2, the terminator, then the status
        assert_eq!(chunks, 4);
        assert_eq!(frames.len(), 5);
        assert!(matches!(&frames[3], Message::Text(t) if t == "[]"));
        assert!(matches!(&frames[4], Message::Text(t) if t.contains("\"1t\"")));
    }

    #[tokio::test]
    async fn test_send_response_stops_at_failed_send() {
        let mut driver = driver();
        let response = driver.handle_text(r#"{"action":"load","start_ns":0,"end_ns":4,"granularity":"1t"}"#);

        let mut frames = Vec::new();
        let mut sent = 0;
        let mut failing = collecting_sink(&mut frames).with(|message: Message| {
            sent += 1;
            let result = if sent > 1 {
                Err(axum::Error::new("socket closed"))
            } else {
                Ok(message)
            };
            futures_util::future::ready(result)
        });

        assert!(send_response(&mut failing, response).await.is_err());
        drop(failing);
        assert_eq!(sent, 2);
        assert_eq!(frames.len(), 1);
    }

    #[tokio::test]
    async fn test_handle_frame_hands_driver_back() {
        let driver = driver();
        let id = driver.id();

        let (driver, response) = handle_frame(
            driver,
            r#"{"action":"load","start_ns":0,"end_ns":4,"granularity":"1t"}"#.to_string(),
        )
        .await
        .unwrap();
        assert!(!response.is_rejected());
        assert_eq!(driver.id(), id);
        assert!(driver.session().is_active());

        let (driver, response) = handle_frame(driver, r#"{"action":"move_up_gran"}"#.to_string())
            .await
            .unwrap();
        assert!(!response.is_rejected());
        assert_eq!(driver.session().granularity().map(|g| g.symbol), Some("1s"));
    }
}
