//! Session server: TCP accept loop, per-connection tasks, snapshot broadcast
//!
//! The server owns the authoritative [`Registry`] behind a read-write lock.
//! Each accepted connection gets one task that reads input records and drains
//! an outbound queue onto the socket; a separate task broadcasts the current
//! snapshot to every queue on a fixed tick. A connection's I/O failure tears
//! down only that connection.

use crate::discovery::Responder;
use crate::registry::{Registry, WorldBounds};
use log::{debug, error, info, warn};
use shared::{InputCmd, LineBuffer, ServerMessage};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Server configuration. Ports default to the protocol constants; tests bind
/// port 0 and read the real address back with [`SessionServer::local_addr`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the session TCP listener binds to.
    pub bind_addr: String,
    /// Address the discovery UDP responder binds to; `None` disables
    /// discovery entirely.
    pub discovery_addr: Option<String>,
    /// Host written into discovery announcements. Must be reachable by
    /// probers; when binding a wildcard address, set this to the LAN address.
    pub advertise_host: String,
    /// Snapshot broadcasts per second.
    pub tick_rate: u32,
    /// Optional playable-area clamp for integrated positions.
    pub bounds: Option<WorldBounds>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", shared::SESSION_PORT),
            discovery_addr: Some(format!("0.0.0.0:{}", shared::DISCOVERY_PORT)),
            advertise_host: "127.0.0.1".to_string(),
            tick_rate: 30,
            bounds: None,
        }
    }
}

/// Outbound queue handle for one connection. The broadcast task pushes
/// encoded records; the connection task writes them to the socket.
type Outbound = mpsc::UnboundedSender<String>;

pub struct SessionServer {
    listener: TcpListener,
    registry: Arc<RwLock<Registry>>,
    connections: Arc<RwLock<HashMap<u32, Outbound>>>,
    config: ServerConfig,
}

impl SessionServer {
    /// Binds the session listener. No global state: multiple servers can
    /// coexist in one process, which the tests rely on.
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!("Session server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            registry: Arc::new(RwLock::new(Registry::new(config.bounds))),
            connections: Arc::new(RwLock::new(HashMap::new())),
            config,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server: discovery responder, broadcast tick, accept loop.
    /// Returns only if binding the discovery port fails; everything else is
    /// handled at the connection boundary.
    pub async fn run(self) -> io::Result<()> {
        if let Some(discovery_addr) = &self.config.discovery_addr {
            let responder =
                Responder::bind(discovery_addr, self.config.advertise_host.clone()).await?;
            tokio::spawn(responder.run());
        }

        self.spawn_broadcaster();
        self.accept_loop().await
    }

    /// Blocks accepting connections. An accept error is logged and retried;
    /// no single client can take the server down.
    async fn accept_loop(&self) -> io::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.register(stream, addr).await,
                Err(e) => {
                    error!("Accept error: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    /// Brings a fresh connection to Active: id assignment and registry
    /// insertion happen under one write lock, the welcome is queued before
    /// the connection becomes visible to the broadcaster (so it is always the
    /// first record on the stream), then the connection task starts.
    async fn register(&self, stream: TcpStream, addr: SocketAddr) {
        let id = self.registry.write().await.add_player();
        info!("Client {} connected from {}", id, addr);

        let welcome = match shared::encode(&ServerMessage::Welcome { id }) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to encode welcome for client {}: {}", id, e);
                self.registry.write().await.remove_player(id);
                return;
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(welcome).is_err() {
            // Unreachable while we hold rx, but never leave a ghost player.
            self.registry.write().await.remove_player(id);
            return;
        }
        self.connections.write().await.insert(id, tx);

        spawn_connection(
            id,
            stream,
            rx,
            Arc::clone(&self.registry),
            Arc::clone(&self.connections),
        );
    }

    /// Periodically snapshots the registry and queues the encoded record for
    /// every connection. A dead queue belongs to a connection already tearing
    /// itself down and is skipped.
    fn spawn_broadcaster(&self) {
        let registry = Arc::clone(&self.registry);
        let connections = Arc::clone(&self.connections);
        let period = Duration::from_secs_f64(1.0 / self.config.tick_rate.max(1) as f64);

        tokio::spawn(async move {
            let mut ticker = interval(period);

            loop {
                ticker.tick().await;

                let players = registry.read().await.snapshot();
                let conns = connections.read().await;
                if conns.is_empty() {
                    continue;
                }

                let line = match shared::encode(&ServerMessage::State { players }) {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Failed to encode snapshot: {}", e);
                        continue;
                    }
                };

                for (id, tx) in conns.iter() {
                    if tx.send(line.clone()).is_err() {
                        debug!("Client {} outbound queue closed", id);
                    }
                }
            }
        });
    }
}

/// One task per connection: reads input records off the socket and drains the
/// outbound queue onto it. Any exit path removes the player and the queue, so
/// no snapshot ever names a dead connection.
fn spawn_connection(
    id: u32,
    stream: TcpStream,
    mut rx: mpsc::UnboundedReceiver<String>,
    registry: Arc<RwLock<Registry>>,
    connections: Arc<RwLock<HashMap<u32, Outbound>>>,
) {
    tokio::spawn(async move {
        let (mut read_half, mut write_half) = stream.into_split();
        let mut lines = LineBuffer::new();
        let mut buf = [0u8; 4096];

        loop {
            tokio::select! {
                outbound = rx.recv() => match outbound {
                    Some(line) => {
                        if let Err(e) = write_half.write_all(line.as_bytes()).await {
                            debug!("Write to client {} failed: {}", id, e);
                            break;
                        }
                    }
                    None => break,
                },
                result = read_half.read(&mut buf) => match result {
                    Ok(0) => {
                        info!("Client {} disconnected", id);
                        break;
                    }
                    Ok(n) => {
                        lines.extend(&buf[..n]);
                        while let Some(record) = lines.next_record() {
                            match shared::decode::<InputCmd>(&record) {
                                Ok(input) => {
                                    registry.write().await.apply_input(id, input.dx, input.dy);
                                }
                                Err(e) => {
                                    warn!("Discarding malformed record from client {}: {}", id, e);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        error!("Error reading from client {}: {}", id, e);
                        break;
                    }
                },
            }
        }

        registry.write().await.remove_player(id);
        connections.write().await.remove(&id);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_protocol_ports() {
        let config = ServerConfig::default();
        assert!(config.bind_addr.ends_with(&shared::SESSION_PORT.to_string()));
        assert!(config
            .discovery_addr
            .as_deref()
            .unwrap()
            .ends_with(&shared::DISCOVERY_PORT.to_string()));
        assert!(config.bounds.is_none());
    }

    #[tokio::test]
    async fn bind_reports_local_addr() {
        let server = SessionServer::bind(ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            discovery_addr: None,
            ..ServerConfig::default()
        })
        .await
        .unwrap();

        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn two_servers_coexist_in_one_process() {
        fn test_config() -> ServerConfig {
            ServerConfig {
                bind_addr: "127.0.0.1:0".to_string(),
                discovery_addr: None,
                ..ServerConfig::default()
            }
        }

        let a = SessionServer::bind(test_config()).await.unwrap();
        let b = SessionServer::bind(test_config()).await.unwrap();
        assert_ne!(a.local_addr().unwrap(), b.local_addr().unwrap());
    }
}
