//! mockftp: a simulated FTP server library for testing FTP clients and
//! FTP-dependent code.
//!
//! Two server variants share one engine:
//!
//! - [`StubFtpServer`] answers every command with a configurable canned
//!   reply and records a structured snapshot of each invocation, so tests
//!   can assert on what an FTP client actually sent. It still speaks the
//!   real wire protocol for connection negotiation (PORT, PASV, EPRT,
//!   EPSV) and moves real bytes over real data connections.
//! - [`FakeFtpServer`] enforces filesystem and permission semantics against
//!   a [`fs::VirtualFileSystem`] (an in-memory implementation is bundled)
//!   and produces protocol-correct numeric replies, simulating how a real
//!   server would behave.
//!
//! The engine underneath is a per-verb [`CommandHandler`] family routed by a
//! case-insensitive [`CommandDispatcher`], one mutable [`Session`] per
//! control connection, and a host/port codec covering the RFC 959 and
//! RFC 2428 data-connection encodings, IPv6 included.
//!
//! # Quick start
//!
//! ```no_run
//! use mockftp::StubFtpServer;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let server = StubFtpServer::new();
//! server.set_reply("CWD", 550, "No such directory.");
//! server.listen("127.0.0.1:2121").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod fs;
pub mod messages;
pub mod server;

pub use server::controlchan::{Command, CommandDispatcher, CommandHandler, ControlChanError, ParseError, Reply, ReplyChannel, ReplyCode};
pub use server::ftpserver::{FakeFtpServer, StubFtpServer};
pub use server::host_port::{AddressParseError, HostAndPort};
pub use server::session::Session;
