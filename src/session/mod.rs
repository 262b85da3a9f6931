//! Navigation sessions
//!
//! One session per client connection. A session tracks a time window and a
//! granularity, turns pan/zoom actions into engine queries and streams each
//! result as ordered chunks followed by an empty terminator and a status.
//!
//! Sessions share nothing but the engine. The protocol is strictly
//! request/response: the next message is not read until the previous
//! response has been written in full.

mod driver;
mod errors;
mod protocol;
mod state;
mod stream;

pub use driver::SessionDriver;
pub use errors::{SessionError, SessionResult};
pub use protocol::{Action, ClientMessage, ServerMessage};
pub use state::{NavigationSession, QueryPlan, SessionState, Window};
pub use stream::{ChunkedResponse, Response, DEFAULT_CHUNK_SIZE};
