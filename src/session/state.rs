//! Navigation state machine
//!
//! `Idle` until the first successful `load`, then `Active` for the rest of
//! the connection. A failed action leaves the state untouched.

use chrono::{DateTime, Utc};

use super::errors::{SessionError, SessionResult};
use super::protocol::Action;
use crate::granularity::{Granularity, GranularityRegistry};

/// Inclusive time window in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start_ns: i64,
    pub end_ns: i64,
}

impl Window {
    pub fn span_ns(&self) -> i64 {
        self.end_ns.saturating_sub(self.start_ns)
    }

    /// Window moved by `delta_ns`, or `None` if either bound overflows
    fn shifted(&self, delta_ns: i64) -> Option<Window> {
        Some(Window {
            start_ns: self.start_ns.checked_add(delta_ns)?,
            end_ns: self.end_ns.checked_add(delta_ns)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active {
        granularity: &'static Granularity,
        window: Window,
    },
}

/// Query the session wants answered after a successful action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPlan {
    pub start_ns: i64,
    pub end_ns: i64,
    pub granularity: &'static Granularity,
}

/// State of one connection
#[derive(Debug, Clone)]
pub struct NavigationSession {
    state: SessionState,
    last_activity: DateTime<Utc>,
}

impl Default for NavigationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            last_activity: Utc::now(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    pub fn window(&self) -> Option<Window> {
        match self.state {
            SessionState::Active { window, .. } => Some(window),
            SessionState::Idle => None,
        }
    }

    pub fn granularity(&self) -> Option<&'static Granularity> {
        match self.state {
            SessionState::Active { granularity, .. } => Some(granularity),
            SessionState::Idle => None,
        }
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Records client activity without changing state
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Applies `action` and returns the query to answer.
    ///
    /// Activity is recorded whether or not the action succeeds.
    pub fn apply(
        &mut self,
        action: &Action,
        registry: &'static GranularityRegistry,
    ) -> SessionResult<QueryPlan> {
        self.touch();

        let (granularity, window) = self.transition(action, registry)?;
        self.state = SessionState::Active {
            granularity,
            window,
        };

        Ok(QueryPlan {
            start_ns: window.start_ns,
            end_ns: window.end_ns,
            granularity,
        })
    }

    fn transition(
        &self,
        action: &Action,
        registry: &'static GranularityRegistry,
    ) -> SessionResult<(&'static Granularity, Window)> {
        match (action, self.state) {
            (
                Action::Load {
                    start_ns,
                    end_ns,
                    granularity,
                },
                _,
            ) => {
                if start_ns > end_ns {
                    return Err(SessionError::InvalidWindow {
                        start_ns: *start_ns,
                        end_ns: *end_ns,
                    });
                }
                let window = Window {
                    start_ns: *start_ns,
                    end_ns: *end_ns,
                };
                let granularity = match granularity {
                    Some(symbol) => registry.lookup(symbol)?,
                    None => registry.select_for_span(window.span_ns()),
                };
                Ok((granularity, window))
            }

            (_, SessionState::Idle) => Err(SessionError::NoWindow),

            (Action::SetGranularity(symbol), SessionState::Active { window, .. }) => {
                Ok((registry.lookup(symbol)?, window))
            }

            (
                Action::MoveUpGran,
                SessionState::Active {
                    granularity,
                    window,
                },
            ) => registry
                .coarser(granularity)
                .map(|g| (g, window))
                .ok_or(SessionError::AtCoarsest(granularity.symbol)),

            (
                Action::MoveDownGran,
                SessionState::Active {
                    granularity,
                    window,
                },
            ) => registry
                .finer(granularity)
                .map(|g| (g, window))
                .ok_or(SessionError::AtFinest(granularity.symbol)),

            (
                Action::PanLeft(amount_ns),
                SessionState::Active {
                    granularity,
                    window,
                },
            ) => pan(granularity, window, -1, *amount_ns),

            (
                Action::PanRight(amount_ns),
                SessionState::Active {
                    granularity,
                    window,
                },
            ) => pan(granularity, window, 1, *amount_ns),
        }
    }
}

fn pan(
    granularity: &'static Granularity,
    window: Window,
    direction: i64,
    amount_ns: i64,
) -> SessionResult<(&'static Granularity, Window)> {
    if amount_ns <= 0 {
        return Err(SessionError::NonPositivePan(amount_ns));
    }
    window
        .shifted(direction * amount_ns)
        .map(|w| (granularity, w))
        .ok_or(SessionError::WindowOverflow { amount_ns })
}
