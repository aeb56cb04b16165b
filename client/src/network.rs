//! Session client: connection, read loop, and the presentation-facing API
//!
//! The client connects over TCP, then a background task mirrors whatever the
//! server broadcasts. The presentation loop polls [`SessionClient::players`],
//! [`SessionClient::local_id`] and [`SessionClient::is_running`] each frame
//! and pushes input with [`SessionClient::send_input`]; it never blocks on
//! the network.

use log::{debug, error, info, warn};
use shared::{InputCmd, LineBuffer, PlayerState, ServerMessage};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// State shared between the read task and the presentation loop. Every field
/// is written by the read task and read from the main loop, so access goes
/// through a lock or an atomic.
#[derive(Default)]
struct SharedState {
    players: Mutex<Vec<PlayerState>>,
    local_id: Mutex<Option<u32>>,
    running: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct SessionClient {
    state: Arc<SharedState>,
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
}

impl SessionClient {
    /// Opens a TCP connection to the session at `host:port` and starts the
    /// read loop. Fails with the underlying I/O error if the host is
    /// unreachable or refuses.
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        info!("Connected to session at {}", stream.peer_addr()?);

        let (read_half, write_half) = stream.into_split();
        let state = Arc::new(SharedState {
            running: AtomicBool::new(true),
            ..SharedState::default()
        });

        tokio::spawn(read_loop(read_half, Arc::clone(&state)));

        Ok(Self {
            state,
            writer: tokio::sync::Mutex::new(write_half),
        })
    }

    /// Best-effort input send. A transient failure is swallowed: the next
    /// frame's input supersedes a lost one.
    pub async fn send_input(&self, dx: i32, dy: i32) {
        let line = match shared::encode(&InputCmd { dx, dy }) {
            Ok(line) => line,
            Err(e) => {
                debug!("Failed to encode input: {}", e);
                return;
            }
        };

        if let Err(e) = self.writer.lock().await.write_all(line.as_bytes()).await {
            debug!("Input send failed: {}", e);
        }
    }

    /// Last snapshot received from the server. Complete current truth, not a
    /// delta; empty until the first snapshot arrives.
    pub fn players(&self) -> Vec<PlayerState> {
        lock(&self.state.players).clone()
    }

    /// Identity assigned by the server's welcome, once it has arrived.
    pub fn local_id(&self) -> Option<u32> {
        *lock(&self.state.local_id)
    }

    /// Liveness flag for the presentation loop. Flips to false when the
    /// connection dies; the last-known snapshot stays readable.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }
}

/// Mirrors the server's stream into the shared state until the connection
/// dies. Malformed records are discarded; the loop itself only ends on EOF or
/// a read error, and that end is terminal (no automatic reconnect).
async fn read_loop(mut read_half: OwnedReadHalf, state: Arc<SharedState>) {
    let mut lines = LineBuffer::new();
    let mut buf = [0u8; 4096];

    loop {
        match read_half.read(&mut buf).await {
            Ok(0) => {
                info!("Disconnected from server");
                break;
            }
            Ok(n) => {
                lines.extend(&buf[..n]);
                while let Some(record) = lines.next_record() {
                    match shared::decode::<ServerMessage>(&record) {
                        Ok(msg) => handle_message(msg, &state),
                        Err(e) => warn!("Discarding malformed record: {}", e),
                    }
                }
            }
            Err(e) => {
                error!("Read error: {}", e);
                break;
            }
        }
    }

    state.running.store(false, Ordering::SeqCst);
}

fn handle_message(msg: ServerMessage, state: &SharedState) {
    match msg {
        ServerMessage::Welcome { id } => {
            let mut local_id = lock(&state.local_id);
            match *local_id {
                // A second welcome on the same connection is a protocol
                // anomaly; the first assignment stands.
                Some(existing) => warn!(
                    "Ignoring duplicate welcome (id {}, already {})",
                    id, existing
                ),
                None => {
                    info!("Joined session as player {}", id);
                    *local_id = Some(id);
                }
            }
        }
        ServerMessage::State { players } => {
            *lock(&state.players) = players;
        }
    }
}
