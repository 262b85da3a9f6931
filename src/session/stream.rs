//! Chunked delivery of one action's result set

use super::protocol::ServerMessage;
use crate::engine::Point;

pub const DEFAULT_CHUNK_SIZE: usize = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Chunks,
    Status,
    Done,
}

/// Yields `ceil(n / chunk_size)` point chunks in timestamp order, then an
/// empty terminator chunk, then the status message.
#[derive(Debug)]
pub struct ChunkedResponse {
    points: std::vec::IntoIter<Point>,
    chunk_size: usize,
    granularity: &'static str,
    stage: Stage,
}

impl ChunkedResponse {
    /// A `chunk_size` of zero is treated as one
    pub fn new(points: Vec<Point>, chunk_size: usize, granularity: &'static str) -> Self {
        Self {
            points: points.into_iter(),
            chunk_size: chunk_size.max(1),
            granularity,
            stage: Stage::Chunks,
        }
    }

    pub fn granularity(&self) -> &'static str {
        self.granularity
    }
}

impl Iterator for ChunkedResponse {
    type Item = ServerMessage;

    fn next(&mut self) -> Option<ServerMessage> {
        match self.stage {
            Stage::Chunks => {
                let chunk: Vec<Point> = self.points.by_ref().take(self.chunk_size).collect();
                if chunk.is_empty() {
                    self.stage = Stage::Status;
                }
                Some(ServerMessage::Chunk(chunk))
            }
            Stage::Status => {
                self.stage = Stage::Done;
                Some(ServerMessage::Status {
                    granularity: self.granularity.to_string(),
                })
            }
            Stage::Done => None,
        }
    }
}

/// Everything sent back for one client message
#[derive(Debug)]
pub enum Response {
    Stream(ChunkedResponse),
    Rejected(Option<ServerMessage>),
}

impl Response {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Response::Rejected(_))
    }
}

impl Iterator for Response {
    type Item = ServerMessage;

    fn next(&mut self) -> Option<ServerMessage> {
        match self {
            Response::Stream(stream) => stream.next(),
            Response::Rejected(message) => message.take(),
        }
    }
}
