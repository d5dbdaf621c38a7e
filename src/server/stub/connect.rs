//! Stub handlers for the four data-connection negotiation verbs.
//!
//! Even in the stub family these do real session work: a client under test
//! needs PORT/EPRT to be understood and PASV/EPSV to advertise a listener it
//! can actually connect to. Only the filesystem side of the server is
//! simulated away, not the wire protocol.

use super::{HOST_PORT_KEY, InvocationRecord, LISTENER_PORT_KEY, RecordedValue, StubCommandHandler, StubCore};
use crate::messages::{DefaultMessages, MessageCatalog, keys};
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, Reply, ReplyCode};
use crate::server::host_port::{self, AddressParseError};
use crate::server::session::Session;

use async_trait::async_trait;
use std::net::IpAddr;

/// Stub for the RFC 959 Data Port (`PORT`) command: decodes the six-byte
/// tuple, stores the client address on the session and records it.
#[derive(Debug)]
pub struct Port {
    core: StubCore,
}

impl Port {
    pub fn new() -> Self {
        Port {
            core: StubCore::new(ReplyCode::CommandOkay, "PORT command successful."),
        }
    }
}

impl Default for Port {
    fn default() -> Self {
        Port::new()
    }
}

#[async_trait]
impl CommandHandler for Port {
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        match host_port::parse_legacy(command.parameters()) {
            Ok(host_port) => {
                session.set_active_mode(host_port);
                let record = InvocationRecord::new(command).with(HOST_PORT_KEY, RecordedValue::HostPort(host_port));
                self.core.finish(record, session).await
            }
            Err(e) => {
                self.core.record(InvocationRecord::new(command));
                session.send_reply(ReplyCode::ParameterSyntaxError, e.to_string()).await
            }
        }
    }
}

impl StubCommandHandler for Port {
    fn core(&self) -> &StubCore {
        &self.core
    }
}

/// Stub for the RFC 2428 Extended Port (`EPRT`) command; accepts IPv4 and
/// IPv6 addresses alike.
#[derive(Debug)]
pub struct Eprt {
    core: StubCore,
}

impl Eprt {
    pub fn new() -> Self {
        Eprt {
            core: StubCore::new(ReplyCode::CommandOkay, "EPRT command successful."),
        }
    }
}

impl Default for Eprt {
    fn default() -> Self {
        Eprt::new()
    }
}

#[async_trait]
impl CommandHandler for Eprt {
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let parsed = match command.parameter(0) {
            Some(parameter) => host_port::parse_extended(parameter),
            None => Err(AddressParseError::TooFewParameters { expected: 4, actual: 0 }),
        };
        match parsed {
            Ok(host_port) => {
                session.set_active_mode(host_port);
                let record = InvocationRecord::new(command).with(HOST_PORT_KEY, RecordedValue::HostPort(host_port));
                self.core.finish(record, session).await
            }
            Err(e) => {
                self.core.record(InvocationRecord::new(command));
                session.send_reply(ReplyCode::ParameterSyntaxError, e.to_string()).await
            }
        }
    }
}

impl StubCommandHandler for Eprt {
    fn core(&self) -> &StubCore {
        &self.core
    }
}

/// Stub for the RFC 959 Passive (`PASV`) command: switches the session to
/// passive mode and advertises the listener in the reply body. The reply
/// text is necessarily computed; only the code is configurable.
#[derive(Debug)]
pub struct Pasv {
    core: StubCore,
}

impl Pasv {
    pub fn new() -> Self {
        Pasv {
            core: StubCore::new(ReplyCode::EnteringPassiveMode, "Entering Passive Mode"),
        }
    }
}

impl Default for Pasv {
    fn default() -> Self {
        Pasv::new()
    }
}

#[async_trait]
impl CommandHandler for Pasv {
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let host = match session.server_host() {
            IpAddr::V4(host) => host,
            IpAddr::V6(_) => {
                self.core.record(InvocationRecord::new(command));
                let text = DefaultMessages.lookup(keys::PASV_ONLY_IPV4, &[]);
                return session.send_reply(ReplyCode::CantOpenDataConnection, text).await;
            }
        };
        match session.switch_to_passive().await {
            Ok(port) => {
                let record = InvocationRecord::new(command).with(LISTENER_PORT_KEY, RecordedValue::Number(u64::from(port)));
                self.core.record(record);
                let text = format!("Entering Passive Mode ({})", host_port::format_legacy(host, port));
                session.send(Reply::custom(self.core.reply().code(), text)).await
            }
            Err(e) => {
                self.core.record(InvocationRecord::new(command));
                session.send_reply(ReplyCode::CantOpenDataConnection, e.to_string()).await
            }
        }
    }
}

impl StubCommandHandler for Pasv {
    fn core(&self) -> &StubCore {
        &self.core
    }
}

/// Stub for the RFC 2428 Extended Passive (`EPSV`) command; the reply
/// carries only the listener port.
#[derive(Debug)]
pub struct Epsv {
    core: StubCore,
}

impl Epsv {
    pub fn new() -> Self {
        Epsv {
            core: StubCore::new(ReplyCode::EnteringExtendedPassiveMode, "Entering Extended Passive Mode"),
        }
    }
}

impl Default for Epsv {
    fn default() -> Self {
        Epsv::new()
    }
}

#[async_trait]
impl CommandHandler for Epsv {
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        match session.switch_to_passive().await {
            Ok(port) => {
                let record = InvocationRecord::new(command).with(LISTENER_PORT_KEY, RecordedValue::Number(u64::from(port)));
                self.core.record(record);
                let text = format!("Entering Extended Passive Mode (|||{}|)", host_port::format_extended_port(port));
                session.send(Reply::custom(self.core.reply().code(), text)).await
            }
            Err(e) => {
                self.core.record(InvocationRecord::new(command));
                session.send_reply(ReplyCode::CantOpenDataConnection, e.to_string()).await
            }
        }
    }
}

impl StubCommandHandler for Epsv {
    fn core(&self) -> &StubCore {
        &self.core
    }
}
