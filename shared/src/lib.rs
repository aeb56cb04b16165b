//! Wire protocol shared between the session server and client.
//!
//! The session protocol is a TCP byte stream of newline-delimited UTF-8 JSON
//! records. Discovery uses single UDP datagrams on a separate port. This crate
//! owns everything both sides must agree on: the default ports, the discovery
//! probe token, the message shapes, and the codec that frames and parses
//! records.
//!
//! Three message shapes exist on the session stream:
//!
//! - `{"type":"welcome","id":<int>}` — server to client, exactly once, first
//!   record after the connection is accepted.
//! - `{"type":"state","players":[{"id":..,"x":..,"y":..},..]}` — server to
//!   client, repeatedly.
//! - `{"dx":<int>,"dy":<int>}` — client to server, untagged; the presence of
//!   `dx`/`dy` alone identifies it.
//!
//! A malformed record is a recoverable [`ProtocolError`]: the caller discards
//! that record and keeps reading.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Default TCP port a session listens on.
pub const SESSION_PORT: u16 = 50000;

/// Default UDP port for session discovery.
pub const DISCOVERY_PORT: u16 = 50001;

/// Literal probe a client broadcasts to find sessions on the subnet.
pub const DISCOVERY_PROBE: &[u8] = b"DISCOVER_ROOM";

/// One player's authoritative state.
///
/// `x`/`y` are authoritative only on the server; clients hold an
/// eventually-consistent mirror. `dx`/`dy` are the last input delta the
/// server received for this player and never appear on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerState {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    #[serde(skip)]
    pub dx: i32,
    #[serde(skip)]
    pub dy: i32,
}

impl PlayerState {
    /// Creates a zero-initialized player for a freshly accepted connection.
    pub fn new(id: u32) -> Self {
        Self {
            id,
            x: 0.0,
            y: 0.0,
            dx: 0,
            dy: 0,
        }
    }
}

/// The closed set of records the server writes to a session stream.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Identity assignment, sent exactly once per connection.
    Welcome { id: u32 },
    /// Complete snapshot of every registered player, ascending by id.
    /// Not a delta: each snapshot replaces the previous one wholesale.
    State { players: Vec<PlayerState> },
}

/// A client input delta. Untagged on the wire by protocol contract, so the
/// shape itself must be closed: any extra field makes the record malformed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InputCmd {
    pub dx: i32,
    pub dy: i32,
}

/// A discovery reply: the address a session can be reached at over TCP.
///
/// Responders may attach extra fields; probers ignore anything but `host`
/// (serde's default behavior for unknown fields).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DiscoveryAnnouncement {
    pub host: String,
}

/// Errors produced by the codec. All of them are recoverable at the record
/// boundary: discard the record, keep the connection.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("encoded record contains an embedded newline")]
    EmbeddedNewline,
}

/// Serializes a message into a single newline-terminated record.
///
/// The record body never contains a newline: compact JSON escapes control
/// characters inside strings, and the terminator added here is the only
/// raw `\n` in the output.
pub fn encode<T: Serialize>(msg: &T) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(msg)?;
    if line.contains('\n') {
        return Err(ProtocolError::EmbeddedNewline);
    }
    line.push('\n');
    Ok(line)
}

/// Parses one complete record (without its terminator) into a message.
pub fn decode<T: DeserializeOwned>(record: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(record)?)
}

/// Incremental frame splitter for the session byte stream.
///
/// TCP reads arrive at arbitrary boundaries; callers feed every chunk into
/// [`extend`](LineBuffer::extend) and drain complete records with
/// [`next_record`](LineBuffer::next_record). An incomplete trailing record
/// stays buffered until its terminator arrives.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes read from the stream.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pops the next complete record, without its `\n` terminator.
    pub fn next_record(&mut self) -> Option<Vec<u8>> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let rest = self.buf.split_off(pos + 1);
        let mut record = std::mem::replace(&mut self.buf, rest);
        record.pop();
        Some(record)
    }

    /// Number of buffered bytes not yet forming a complete record.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
