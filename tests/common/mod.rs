//! Shared plumbing for the integration tests: ephemeral-port servers and a
//! tiny line-oriented FTP client.

// Not every test binary uses every helper.
#![allow(dead_code)]

use mockftp::fs::InMemoryFs;
use mockftp::{FakeFtpServer, StubFtpServer};

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

/// Starts a stub server on an ephemeral port.
pub async fn start_stub(server: StubFtpServer) -> (Arc<StubFtpServer>, SocketAddr) {
    let server = Arc::new(server.passive_ports(0..=0));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = server.clone();
    tokio::spawn(async move {
        let _ = serving.serve(listener).await;
    });
    (server, addr)
}

/// Starts a fake server on an ephemeral port.
pub async fn start_fake(server: FakeFtpServer) -> (Arc<FakeFtpServer>, SocketAddr) {
    let server = Arc::new(server.passive_ports(0..=0));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = server.clone();
    tokio::spawn(async move {
        let _ = serving.serve(listener).await;
    });
    (server, addr)
}

/// A fake server over a caller-seeded filesystem, with one known account.
pub async fn start_fake_with(fs: Arc<InMemoryFs>) -> (Arc<FakeFtpServer>, SocketAddr) {
    let server = FakeFtpServer::with_filesystem(fs);
    server.add_account("alice", "secret", "/home/alice");
    start_fake(server).await
}

/// Line-oriented control-connection client.
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Client {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        Client {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    /// Reads one reply line, CRLF stripped. An empty string means EOF.
    pub async fn line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.unwrap();
        line.trim_end_matches(['\r', '\n']).to_string()
    }

    pub async fn send(&mut self, line: &str) {
        self.writer.write_all(format!("{}\r\n", line).as_bytes()).await.unwrap();
    }

    /// Sends a command and returns the single reply line it provokes.
    pub async fn cmd(&mut self, line: &str) -> String {
        self.send(line).await;
        self.line().await
    }

    /// Runs the standard login sequence, panicking on unexpected codes.
    pub async fn login(&mut self, username: &str, password: &str) {
        let reply = self.cmd(&format!("USER {}", username)).await;
        assert!(reply.starts_with("331"), "unexpected USER reply: {}", reply);
        let reply = self.cmd(&format!("PASS {}", password)).await;
        assert!(reply.starts_with("230"), "unexpected PASS reply: {}", reply);
    }
}

/// Extracts the advertised address out of a `227 Entering Passive Mode
/// (h1,h2,h3,h4,p1,p2)` reply line.
pub fn parse_pasv(line: &str) -> SocketAddr {
    let body = line
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(body, _)| body)
        .unwrap_or_else(|| panic!("no host/port tuple in: {}", line));
    let values: Vec<u16> = body.split(',').map(|v| v.trim().parse().unwrap()).collect();
    assert_eq!(values.len(), 6, "bad tuple in: {}", line);
    let port = (values[4] << 8) + values[5];
    format!("{}.{}.{}.{}:{}", values[0], values[1], values[2], values[3], port).parse().unwrap()
}

/// Extracts the port out of a `229 Entering Extended Passive Mode (|||p|)`
/// reply line.
pub fn parse_epsv(line: &str) -> u16 {
    let body = line
        .split_once("(|||")
        .and_then(|(_, rest)| rest.split_once("|)"))
        .map(|(body, _)| body)
        .unwrap_or_else(|| panic!("no port in: {}", line));
    body.parse().unwrap()
}

/// Downloads everything a data connection at `addr` yields.
pub async fn read_data_connection(addr: SocketAddr) -> Vec<u8> {
    let mut conn = TcpStream::connect(addr).await.unwrap();
    let mut body = Vec::new();
    conn.read_to_end(&mut body).await.unwrap();
    body
}

/// Uploads `bytes` over a data connection to `addr` and closes it.
pub async fn write_data_connection(addr: SocketAddr, bytes: &[u8]) {
    let mut conn = TcpStream::connect(addr).await.unwrap();
    conn.write_all(bytes).await.unwrap();
    conn.shutdown().await.unwrap();
}
