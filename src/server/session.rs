//! Per-connection state for a control connection.

use super::controlchan::{ControlChanError, Reply, ReplyChannel, ReplyCode};
use super::datachan::{self, DataChanError, DataConnMode};
use super::host_port::HostAndPort;

use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const DEFAULT_PASSIVE_PORTS: RangeInclusive<u16> = 49152..=65535;

// Bound on how long a data-connection open (passive accept or active
// connect) and a single transfer may take before the owning command fails
// with 425/426 instead of hanging the session.
const DEFAULT_DATA_TIMEOUT: Duration = Duration::from_secs(15);

/// This is where we keep the state of one FTP session: the working
/// directory, the pending rename source, login progress, and the data
/// connection in all its phases (unconfigured, negotiated, open).
///
/// One instance exists per control connection and lives exactly as long as
/// the connection does. Commands on a connection are handled strictly one at
/// a time, so handlers get `&mut Session` without further synchronization.
#[derive(Debug)]
pub struct Session {
    /// The current working directory; CWD and CDUP mutate it.
    pub cwd: PathBuf,
    /// The source recorded by RNFR, consumed and cleared by RNTO.
    pub rename_from: Option<PathBuf>,
    /// The username from USER; not yet proof of login.
    pub username: Option<String>,
    /// Set once PASS succeeded (fake variant) or is implied (stub variant).
    pub authenticated: bool,
    /// Connection-scoped logger, tagged with a trace id by the server.
    pub logger: slog::Logger,
    reply_channel: Box<dyn ReplyChannel>,
    local_addr: SocketAddr,
    passive_ports: RangeInclusive<u16>,
    data_timeout: Duration,
    data_mode: Option<DataConnMode>,
    data_conn: Option<TcpStream>,
    closed: bool,
}

impl Session {
    /// Creates a session for a control connection whose local (server-side)
    /// address is `local_addr`, sending replies through `reply_channel`.
    pub fn new(reply_channel: Box<dyn ReplyChannel>, local_addr: SocketAddr, logger: slog::Logger) -> Self {
        Session {
            cwd: PathBuf::from("/"),
            rename_from: None,
            username: None,
            authenticated: false,
            logger,
            reply_channel,
            local_addr,
            passive_ports: DEFAULT_PASSIVE_PORTS,
            data_timeout: DEFAULT_DATA_TIMEOUT,
            data_mode: None,
            data_conn: None,
            closed: false,
        }
    }

    /// Sets the port range passive listeners are allocated from.
    pub fn passive_ports(mut self, ports: RangeInclusive<u16>) -> Self {
        self.passive_ports = ports;
        self
    }

    /// Sets the bound on data-connection establishment and transfers.
    pub fn data_timeout(mut self, data_timeout: Duration) -> Self {
        self.data_timeout = data_timeout;
        self
    }

    /// Sends one numbered reply to the client.
    pub async fn send_reply<T: Into<String>>(&mut self, code: ReplyCode, text: T) -> Result<(), ControlChanError> {
        self.send(Reply::new(code, text)).await
    }

    /// Sends a pre-built reply, custom codes included.
    pub async fn send(&mut self, reply: Reply) -> Result<(), ControlChanError> {
        slog::debug!(self.logger, "Sending reply"; "code" => reply.code());
        self.reply_channel.send(reply).await
    }

    /// The principal permission checks run against: the username, once
    /// authenticated.
    pub fn principal(&self) -> Option<&str> {
        if self.authenticated { self.username.as_deref() } else { None }
    }

    /// The server's own address on this control connection; PASV/EPSV
    /// advertise it.
    pub fn server_host(&self) -> IpAddr {
        self.local_addr.ip()
    }

    /// The currently negotiated data-connection mode, if any.
    pub fn data_mode(&self) -> Option<&DataConnMode> {
        self.data_mode.as_ref()
    }

    /// Records the client's advertised address for active mode, replacing
    /// whatever mode was negotiated before.
    pub fn set_active_mode(&mut self, host_port: HostAndPort) {
        self.data_mode = Some(DataConnMode::Active(host_port));
    }

    /// Switches to passive mode: binds a listener on the server host and
    /// returns the port the client should connect to. Replaces whatever mode
    /// was negotiated before.
    pub async fn switch_to_passive(&mut self) -> Result<u16, DataChanError> {
        let listener = datachan::bind_passive(self.server_host(), self.passive_ports.clone()).await?;
        let port = listener.local_addr()?.port();
        self.data_mode = Some(DataConnMode::Passive(listener));
        Ok(port)
    }

    /// Opens the data connection using whichever mode is currently
    /// negotiated. Fails with [`DataChanError::NotConfigured`] when neither
    /// PORT/EPRT nor PASV/EPSV preceded the transfer verb.
    pub async fn open_data_connection(&mut self) -> Result<(), DataChanError> {
        self.close_data_connection().await;

        let conn = match &self.data_mode {
            None => return Err(DataChanError::NotConfigured),
            Some(DataConnMode::Active(host_port)) => {
                let addr = SocketAddr::new(host_port.host, host_port.port);
                timeout(self.data_timeout, TcpStream::connect(addr))
                    .await
                    .map_err(|_| DataChanError::Timeout)??
            }
            Some(DataConnMode::Passive(listener)) => {
                let (conn, _peer) = timeout(self.data_timeout, listener.accept())
                    .await
                    .map_err(|_| DataChanError::Timeout)??;
                conn
            }
        };

        self.data_conn = Some(conn);
        Ok(())
    }

    /// Writes `bytes` to the open data connection.
    pub async fn send_data(&mut self, bytes: &[u8]) -> Result<(), DataChanError> {
        let conn = self.data_conn.as_mut().ok_or(DataChanError::NotConfigured)?;
        timeout(self.data_timeout, conn.write_all(bytes))
            .await
            .map_err(|_| DataChanError::Timeout)??;
        Ok(())
    }

    /// Reads the open data connection to EOF (the peer closing its write
    /// side ends the transfer).
    pub async fn read_data(&mut self) -> Result<Vec<u8>, DataChanError> {
        let conn = self.data_conn.as_mut().ok_or(DataChanError::NotConfigured)?;
        let mut bytes = Vec::new();
        timeout(self.data_timeout, conn.read_to_end(&mut bytes))
            .await
            .map_err(|_| DataChanError::Timeout)??;
        Ok(bytes)
    }

    /// Closes the data connection if one is open. Idempotent; shutdown
    /// failures only mean the peer already went away.
    pub async fn close_data_connection(&mut self) {
        if let Some(mut conn) = self.data_conn.take() {
            if let Err(e) = conn.shutdown().await {
                slog::debug!(self.logger, "Data connection shutdown failed: {}", e);
            }
        }
    }

    /// Marks the session as finished; the control loop hangs up after the
    /// current command.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether QUIT (or a fatal condition) ended this session.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
