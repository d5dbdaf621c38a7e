//! Data-connection mode and the passive-listener plumbing.

use super::host_port::HostAndPort;

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use thiserror::Error;
use tokio::net::TcpListener;

const BIND_RETRIES: u8 = 10;

/// How the next data connection will be established, as negotiated on the
/// control channel. Exactly one mode is in effect at a time; a new
/// PORT/EPRT/PASV/EPSV simply replaces it, since clients commonly
/// renegotiate per transfer.
#[derive(Debug)]
pub enum DataConnMode {
    /// The client advertised an address (PORT/EPRT); the server connects out.
    Active(HostAndPort),
    /// The server listens (PASV/EPSV); the client connects in.
    Passive(TcpListener),
}

/// Errors around establishing or using the data connection.
#[derive(Debug, Error)]
pub enum DataChanError {
    /// Neither active nor passive mode was negotiated before a transfer verb.
    #[error("no data connection mode configured; use PORT, PASV, EPRT or EPSV first")]
    NotConfigured,
    /// The peer did not show up within the configured bound.
    #[error("timed out waiting for the data connection")]
    Timeout,
    /// No port in the configured passive range could be bound.
    #[error("could not bind a passive data port")]
    NoPortAvailable,
    /// The data connection failed at the socket level.
    #[error("data connection IO failed: {0}")]
    Io(#[from] io::Error),
}

/// Binds a listener for passive mode on `ip`, picking random ports from
/// `ports` until one binds. A range starting at 0 short-circuits to an
/// OS-assigned ephemeral port.
pub(crate) async fn bind_passive(ip: IpAddr, ports: RangeInclusive<u16>) -> Result<TcpListener, DataChanError> {
    if *ports.start() == 0 {
        return Ok(TcpListener::bind(SocketAddr::new(ip, 0)).await?);
    }

    let range_length = u32::from(ports.end() - ports.start()) + 1;
    for _ in 0..BIND_RETRIES {
        let mut data = [0u8; 4];
        getrandom::fill(&mut data).map_err(io::Error::other)?;
        let port = (u32::from_ne_bytes(data) % range_length) as u16 + ports.start();
        if let Ok(listener) = TcpListener::bind(SocketAddr::new(ip, port)).await {
            return Ok(listener);
        }
    }

    Err(DataChanError::NoPortAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn bind_passive_ephemeral() {
        let listener = bind_passive(IpAddr::V4(Ipv4Addr::LOCALHOST), 0..=0).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_passive_within_range() {
        let listener = bind_passive(IpAddr::V4(Ipv4Addr::LOCALHOST), 40000..=49999).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!((40000..=49999).contains(&port));
    }
}
