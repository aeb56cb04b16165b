//! UDP discovery responder
//!
//! Answers `DISCOVER_ROOM` broadcast probes with a unicast JSON announcement
//! naming the address the session can be reached at. Runs as its own task and
//! never touches the TCP accept path.

use log::{debug, error, info, warn};
use shared::DiscoveryAnnouncement;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

pub struct Responder {
    socket: UdpSocket,
    reply: String,
}

impl Responder {
    /// Binds the discovery port and prepares the announcement naming
    /// `advertise_host` as the session's reachable address.
    pub async fn bind(addr: &str, advertise_host: String) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!("Discovery responder listening on {}", socket.local_addr()?);

        let announcement = DiscoveryAnnouncement {
            host: advertise_host,
        };
        let reply = serde_json::to_string(&announcement)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        Ok(Self { socket, reply })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Answers probes until the task is dropped. Datagrams that are not the
    /// probe token are ignored; the discovery port is a shared broadcast
    /// segment and sees arbitrary noise.
    pub async fn run(self) {
        let mut buf = [0u8; 256];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, addr)) => {
                    if &buf[..len] != shared::DISCOVERY_PROBE {
                        debug!("Ignoring {} stray bytes from {}", len, addr);
                        continue;
                    }

                    debug!("Discovery probe from {}", addr);
                    if let Err(e) = self.socket.send_to(self.reply.as_bytes(), addr).await {
                        warn!("Failed to answer probe from {}: {}", addr, e);
                    }
                }
                Err(e) => {
                    error!("Discovery receive error: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}
