//! UDP discovery prober
//!
//! Finds sessions on the local subnet without prior configuration: broadcast
//! the probe token, collect JSON announcements until the deadline. Silence is
//! a normal empty result, not an error.

use log::{debug, warn};
use shared::DiscoveryAnnouncement;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{timeout, Instant};

/// Receive window after each probe. Kept well under a second so the overall
/// deadline is never overshot by more than one attempt.
const RECV_WINDOW: Duration = Duration::from_millis(400);

/// Broadcasts probes on the default discovery port until `deadline` elapses
/// and returns every distinct session announced in that window.
pub async fn discover(deadline: Duration) -> io::Result<Vec<DiscoveryAnnouncement>> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.set_broadcast(true)?;

    let target = SocketAddr::from((Ipv4Addr::BROADCAST, shared::DISCOVERY_PORT));
    discover_with(&socket, target, deadline).await
}

/// Probes `target` from an already configured socket. Split out from
/// [`discover`] so tests can probe a loopback responder on an ephemeral port.
pub async fn discover_with(
    socket: &UdpSocket,
    target: SocketAddr,
    deadline: Duration,
) -> io::Result<Vec<DiscoveryAnnouncement>> {
    let until = Instant::now() + deadline;
    let mut found: Vec<DiscoveryAnnouncement> = Vec::new();
    let mut buf = [0u8; 1024];

    while Instant::now() < until {
        if let Err(e) = socket.send_to(shared::DISCOVERY_PROBE, target).await {
            warn!("Discovery probe send failed: {}", e);
        }

        match timeout(RECV_WINDOW, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, addr))) => match shared::decode::<DiscoveryAnnouncement>(&buf[..len]) {
                Ok(announcement) => {
                    if found.contains(&announcement) {
                        debug!("Duplicate announcement from {}", addr);
                    } else {
                        debug!("Session at {} (announced by {})", announcement.host, addr);
                        found.push(announcement);
                    }
                }
                Err(e) => debug!("Ignoring malformed reply from {}: {}", addr, e),
            },
            Ok(Err(e)) => warn!("Discovery receive error: {}", e),
            // Window elapsed with no reply; probe again until the deadline.
            Err(_) => {}
        }
    }

    Ok(found)
}
