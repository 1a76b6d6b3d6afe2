use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use tracing::debug;

const PROBE_TARGET: &str = "8.8.8.8:80";

/// Address of the interface the default route leaves through.
///
/// "Connecting" a UDP socket sends nothing; it only makes the OS pick a
/// source address. Falls back to loopback without a route.
pub fn lan_ip() -> IpAddr {
    probe().unwrap_or_else(|e| {
        debug!("LAN address discovery failed: {}", e);
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    })
}

fn probe() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(PROBE_TARGET)?;
    Ok(socket.local_addr()?.ip())
}
