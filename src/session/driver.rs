//! Binds one `NavigationSession` to the engine for the life of a connection

use std::sync::Arc;

use uuid::Uuid;

use super::errors::SessionError;
use super::protocol::{Action, ClientMessage, ServerMessage};
use super::state::NavigationSession;
use super::stream::{ChunkedResponse, Response};
use crate::engine::Engine;
use crate::observability::{log_event_with_fields, warn_event, Event};

/// Turns client messages into responses, one at a time.
///
/// Owned by exactly one connection task. Dropping it closes the session.
pub struct SessionDriver {
    id: Uuid,
    engine: Arc<Engine>,
    session: NavigationSession,
    chunk_size: usize,
}

impl SessionDriver {
    pub fn new(engine: Arc<Engine>, chunk_size: usize) -> Self {
        let id = Uuid::new_v4();
        engine.metrics().increment_sessions_opened();
        log_event_with_fields(Event::SessionOpened, &[("session_id", &id.to_string())]);

        Self {
            id,
            engine,
            session: NavigationSession::new(),
            chunk_size,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn session(&self) -> &NavigationSession {
        &self.session
    }

    /// Handles one raw text frame
    pub fn handle_text(&mut self, text: &str) -> Response {
        match ClientMessage::parse(text).and_then(ClientMessage::into_action) {
            Ok(action) => self.handle_action(&action),
            Err(e) => {
                self.session.touch();
                self.reject(None, &e)
            }
        }
    }

    /// Applies `action` and, on success, runs the resulting query
    pub fn handle_action(&mut self, action: &Action) -> Response {
        match self.session.apply(action, self.engine.registry()) {
            Ok(plan) => {
                let points = self
                    .engine
                    .query(plan.start_ns, plan.end_ns, plan.granularity);
                Response::Stream(ChunkedResponse::new(
                    points,
                    self.chunk_size,
                    plan.granularity.symbol,
                ))
            }
            Err(e) => self.reject(Some(action.name()), &e),
        }
    }

    fn reject(&self, action: Option<&str>, err: &SessionError) -> Response {
        let id = self.id.to_string();
        let reason = err.to_string();
        warn_event(
            Event::SessionActionRejected,
            &[
                ("session_id", &id),
                ("action", action.unwrap_or("-")),
                ("code", err.code()),
                ("reason", &reason),
            ],
        );
        Response::Rejected(Some(ServerMessage::from(err)))
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        self.engine.metrics().increment_sessions_closed();
        log_event_with_fields(Event::SessionClosed, &[("session_id", &self.id.to_string())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::granularity::NS_PER_SECOND;
    use crate::storage::Sample;

    fn engine() -> Arc<Engine> {
        let engine = Engine::in_memory();
        engine
            .ingest(vec![
                Sample::new(0, 10),
                Sample::new(NS_PER_SECOND, 20),
                Sample::new(2 * NS_PER_SECOND, 30),
            ])
            .unwrap();
        engine.rebuild_aggregates();
        Arc::new(engine)
    }

    #[test]
    fn test_load_streams_points_then_status() {
        let mut driver = SessionDriver::new(engine(), 2);
        let messages: Vec<_> = driver
            .handle_text(r#"{"action":"load","start_ns":0,"end_ns":2000000000,"granularity":"1s"}"#)
            .collect();

        assert_eq!(messages.len(), 4);
        assert!(messages[2].is_terminator());
        assert_eq!(
            messages[3],
            ServerMessage::Status {
                granularity: "1s".into()
            }
        );
    }

    #[test]
    fn test_invalid_message_keeps_session() {
        let mut driver = SessionDriver::new(engine(), 10);
        let response = driver.handle_text("{{");
        assert!(response.is_rejected());
        assert!(!driver.session().is_active());

        let messages: Vec<_> = driver
            .handle_text(r#"{"action":"load","start_ns":0,"end_ns":10}"#)
            .collect();
        assert!(matches!(messages.last(), Some(ServerMessage::Status { .. })));
    }

    #[test]
    fn test_unknown_action_is_reported() {
        let mut driver = SessionDriver::new(engine(), 10);
        let messages: Vec<_> = driver.handle_text(r#"{"action":"zoom"}"#).collect();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            ServerMessage::Error { error, code } => {
                assert!(error.contains("zoom"));
                assert_eq!(code, "CHRONO_SESSION_UNKNOWN_ACTION");
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_drop_closes_session() {
        let engine = engine();
        let driver = SessionDriver::new(Arc::clone(&engine), 10);
        assert_eq!(engine.metrics().active_sessions(), 1);
        drop(driver);
        assert_eq!(engine.metrics().active_sessions(), 0);
    }
}
