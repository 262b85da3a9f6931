//! Sample record format
//!
//! Every record on disk has the same size:
//!
//! ```text
//! +------------------+
//! | timestamp_ns     | (i64 LE)
//! +------------------+
//! | value            | (i64 LE)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! The checksum covers the 16 payload bytes.

use serde::{Deserialize, Serialize};

use super::checksum::{compute_checksum, verify_checksum};

const PAYLOAD_SIZE: usize = 16;

/// Size in bytes of one encoded sample record
pub const RECORD_SIZE: usize = PAYLOAD_SIZE + 4;

/// A raw timestamped sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp_ns: i64,
    pub value: i64,
}

impl Sample {
    pub fn new(timestamp_ns: i64, value: i64) -> Self {
        Self {
            timestamp_ns,
            value,
        }
    }

    /// Encodes the sample with its trailing checksum
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[..8].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        buf[8..PAYLOAD_SIZE].copy_from_slice(&self.value.to_le_bytes());
        let checksum = compute_checksum(&buf[..PAYLOAD_SIZE]);
        buf[PAYLOAD_SIZE..].copy_from_slice(&checksum.to_le_bytes());
        buf
    }

    /// Decodes a record, returning `None` on checksum mismatch
    pub fn decode(buf: &[u8; RECORD_SIZE]) -> Option<Self> {
        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&buf[PAYLOAD_SIZE..]);
        if !verify_checksum(&buf[..PAYLOAD_SIZE], u32::from_le_bytes(checksum)) {
            return None;
        }

        let mut ts = [0u8; 8];
        let mut value = [0u8; 8];
        ts.copy_from_slice(&buf[..8]);
        value.copy_from_slice(&buf[8..PAYLOAD_SIZE]);

        Some(Self {
            timestamp_ns: i64::from_le_bytes(ts),
            value: i64::from_le_bytes(value),
        })
    }
}

impl From<(i64, i64)> for Sample {
    fn from((timestamp_ns, value): (i64, i64)) -> Self {
        Self::new(timestamp_ns, value)
    }
}
