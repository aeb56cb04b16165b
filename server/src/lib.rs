//! # Session Server Library
//!
//! Authoritative server for a locally hosted multiplayer session. It answers
//! discovery probes on the LAN, accepts TCP connections, assigns each one a
//! player identity, integrates per-player input into the shared world state,
//! and streams complete state snapshots back to every connected client.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server owns the only writable copy of every player's position. Clients
//! send input deltas and mirror whatever the server broadcasts; nothing a
//! client sends can touch another player's state.
//!
//! ### Connection Lifecycle
//! Each connection moves through `Connecting → Active → Closed`. Activation
//! assigns the smallest free connection id, inserts a zero-initialized player
//! into the registry, and sends `welcome` as the first record on the stream.
//! A read error, an empty read, or a write failure closes the connection,
//! removes its player, and frees its id for reuse. The transition is
//! terminal; a closed connection is never reused.
//!
//! ### Snapshot Broadcasting
//! On a fixed tick the server encodes the full player list once and queues it
//! to every connection. There is no cross-client ordering guarantee: each
//! snapshot is independently consistent and clients treat it as the complete
//! current truth.
//!
//! ## Architecture
//!
//! One tokio task per accepted connection handles both directions of that
//! socket; one task runs the broadcast tick; one task answers discovery
//! probes. They share the registry through a read-write lock, so every
//! mutation goes through a single synchronized access point. A failure on one
//! connection never propagates to another or to the broadcast task.
//!
//! ## Module Organization
//!
//! - [`registry`] — player registry: id assignment and reuse, input
//!   integration, snapshot production.
//! - [`network`] — the session server itself: accept loop, per-connection
//!   tasks, broadcast tick, configuration.
//! - [`discovery`] — UDP responder answering `DISCOVER_ROOM` probes with the
//!   session's reachable address.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{ServerConfig, SessionServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = SessionServer::bind(ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod discovery;
pub mod network;
pub mod registry;
