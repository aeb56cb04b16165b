//! # Session Client Library
//!
//! Client side of the LAN session protocol: discover a host on the subnet,
//! connect, and mirror the server's authoritative state for a presentation
//! front end.
//!
//! ## Architecture Overview
//!
//! The client is deliberately thin. It performs no prediction and no
//! simulation: the server owns every position, and each `state` record
//! replaces the local mirror wholesale. What the crate guarantees is that the
//! mirror is always safe to read from the presentation loop while a
//! background task writes to it.
//!
//! One [`network::SessionClient`] serves any front end; rendering choices
//! (sprites, rectangles, a terminal printout) live entirely outside this
//! crate. The binary in this package is one such front end, headless.
//!
//! ## Module Organization
//!
//! - [`discovery`] — UDP broadcast prober; returns every session announced
//!   on the subnet within a deadline.
//! - [`network`] — TCP session client: connect, background read loop,
//!   best-effort input sends, and the polling API (`players`, `local_id`,
//!   `is_running`).
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::{discovery, network::SessionClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sessions = discovery::discover(Duration::from_millis(1500)).await?;
//!     let host = match sessions.first() {
//!         Some(s) => s.host.clone(),
//!         None => return Ok(()), // no sessions found is a normal outcome
//!     };
//!
//!     let session = SessionClient::connect(&host, shared::SESSION_PORT).await?;
//!     while session.is_running() {
//!         session.send_input(0, 0).await;
//!         let _players = session.players(); // hand to the renderer
//!         tokio::time::sleep(Duration::from_millis(16)).await;
//!     }
//!     Ok(())
//! }
//! ```

pub mod discovery;
pub mod network;
