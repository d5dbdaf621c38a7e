//! The two server variants and the accept/control loop they share.
//!
//! Both servers follow the same builder-then-`listen` shape: construct,
//! adjust options, then hand over an address (or an already-bound listener,
//! which is what tests do to get an ephemeral port). Each accepted control
//! connection runs in its own task; commands on one connection are handled
//! strictly one at a time.

use super::controlchan::codecs::{FramedReplyChannel, FtpCodec};
use super::controlchan::{CommandDispatcher, CommandHandler, ControlChanError, ReplyCode};
use super::fake::{self, Account, FakeEnv};
use super::session::Session;
use super::stub::{self, InvocationRecord, StubCommandHandler};
use crate::fs::{InMemoryFs, VirtualFileSystem};
use crate::messages::{DefaultMessages, MessageCatalog, keys};

use futures_util::StreamExt;
use slog::Drain;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;
use uuid::Uuid;

const DEFAULT_GREETING: &str = "Service ready for new user.";
const DEFAULT_PASSIVE_PORTS: RangeInclusive<u16> = 49152..=65535;
const DEFAULT_DATA_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
struct ServerOptions {
    greeting: String,
    passive_ports: RangeInclusive<u16>,
    data_timeout: Duration,
    logger: slog::Logger,
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptions {
            greeting: DEFAULT_GREETING.to_string(),
            passive_ports: DEFAULT_PASSIVE_PORTS,
            data_timeout: DEFAULT_DATA_TIMEOUT,
            logger: slog::Logger::root(slog_stdlog::StdLog.fuse(), slog::o!()),
        }
    }
}

/// An FTP server returning canned replies and recording every invocation,
/// for testing FTP *clients*.
///
/// # Example
///
/// ```no_run
/// use mockftp::StubFtpServer;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let server = StubFtpServer::new().greeting("Welcome to the test double");
/// server.listen("127.0.0.1:2121").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StubFtpServer {
    dispatcher: Arc<RwLock<CommandDispatcher>>,
    stubs: HashMap<String, Arc<dyn StubCommandHandler>>,
    options: ServerOptions,
}

impl StubFtpServer {
    /// Creates a stub server with one stub per supported verb, each wired to
    /// its RFC-conventional default reply.
    pub fn new() -> Self {
        let (dispatcher, stubs) = stub::registry();
        StubFtpServer {
            dispatcher: Arc::new(RwLock::new(dispatcher)),
            stubs,
            options: ServerOptions::default(),
        }
    }

    /// Sets the 220 greeting text.
    pub fn greeting<G: Into<String>>(mut self, greeting: G) -> Self {
        self.options.greeting = greeting.into();
        self
    }

    /// Sets the port range passive listeners are allocated from. A range
    /// starting at 0 means OS-assigned ephemeral ports.
    pub fn passive_ports(mut self, ports: RangeInclusive<u16>) -> Self {
        self.options.passive_ports = ports;
        self
    }

    /// Sets the bound on data-connection establishment and transfers.
    pub fn data_connection_timeout(mut self, timeout: Duration) -> Self {
        self.options.data_timeout = timeout;
        self
    }

    /// Sets the structured logger. By default everything goes through the
    /// standard `log` facade.
    pub fn logger<L: Into<Option<slog::Logger>>>(mut self, logger: L) -> Self {
        self.options.logger = logger.into().unwrap_or_else(|| ServerOptions::default().logger);
        self
    }

    /// The stub registered for `verb`, with its reply knob and invocation
    /// log.
    pub fn handler<V: AsRef<str>>(&self, verb: V) -> Option<&Arc<dyn StubCommandHandler>> {
        self.stubs.get(&verb.as_ref().to_uppercase())
    }

    /// Reconfigures the reply of the stub registered for `verb`. Returns
    /// false when no such stub exists.
    pub fn set_reply<V: AsRef<str>, T: Into<String>>(&self, verb: V, code: u16, text: T) -> bool {
        match self.handler(verb) {
            Some(handler) => {
                handler.core().set_reply(code, text);
                true
            }
            None => false,
        }
    }

    /// The invocations recorded for `verb` so far; empty for unknown verbs.
    pub fn invocations<V: AsRef<str>>(&self, verb: V) -> Vec<InvocationRecord> {
        self.handler(verb).map(|handler| handler.core().invocations()).unwrap_or_default()
    }

    /// Replaces the handler bound to `verb`, e.g. with a custom stub.
    /// Intended for setup, not for use concurrent with request handling.
    pub fn replace_handler<V: AsRef<str>>(&self, verb: V, handler: Arc<dyn CommandHandler>) {
        self.dispatcher
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(verb, handler);
    }

    /// Replaces the stub bound to `verb` while keeping the by-verb view
    /// (reply knob, invocation log) in sync. Use this to preconfigure a
    /// transfer stub, e.g. RETR contents.
    pub fn replace_stub<V: AsRef<str>, H: StubCommandHandler + 'static>(&mut self, verb: V, handler: Arc<H>) {
        self.dispatcher
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(verb.as_ref(), handler.clone());
        self.stubs.insert(verb.as_ref().to_uppercase(), handler);
    }

    /// Serves control connections accepted from an already-bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ControlChanError> {
        serve(listener, self.dispatcher.clone(), self.options.clone()).await
    }

    /// Binds `addr` and serves until the task is dropped.
    pub async fn listen<A: ToSocketAddrs>(&self, addr: A) -> Result<(), ControlChanError> {
        self.serve(TcpListener::bind(addr).await?).await
    }
}

impl Default for StubFtpServer {
    fn default() -> Self {
        StubFtpServer::new()
    }
}

/// An FTP server enforcing real filesystem and permission semantics against
/// a virtual filesystem, for simulating a server's behavior.
///
/// # Example
///
/// ```no_run
/// use mockftp::FakeFtpServer;
/// use mockftp::fs::InMemoryFs;
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let fs = Arc::new(InMemoryFs::new());
/// fs.add_file("/home/alice/hello.txt", "hello")?;
/// let server = FakeFtpServer::with_filesystem(fs);
/// server.add_account("alice", "secret", "/home/alice");
/// server.listen("127.0.0.1:2121").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FakeFtpServer {
    dispatcher: Arc<RwLock<CommandDispatcher>>,
    env: Arc<FakeEnv>,
    options: ServerOptions,
}

impl FakeFtpServer {
    /// Creates a fake server over a fresh [`InMemoryFs`].
    pub fn new() -> Self {
        FakeFtpServer::with_filesystem(Arc::new(InMemoryFs::new()))
    }

    /// Creates a fake server over a caller-supplied filesystem. Keep a clone
    /// of the `Arc` to seed files and inspect results.
    pub fn with_filesystem(fs: Arc<dyn VirtualFileSystem>) -> Self {
        FakeFtpServer::with_collaborators(fs, Arc::new(DefaultMessages))
    }

    /// Creates a fake server with both collaborators supplied, for swapping
    /// in a localized or rebranded message catalog.
    pub fn with_collaborators(fs: Arc<dyn VirtualFileSystem>, messages: Arc<dyn MessageCatalog>) -> Self {
        let env = Arc::new(FakeEnv::new(fs, messages));
        let dispatcher = fake::registry(&env);
        FakeFtpServer {
            dispatcher: Arc::new(RwLock::new(dispatcher)),
            env,
            options: ServerOptions::default(),
        }
    }

    /// Sets the 220 greeting text.
    pub fn greeting<G: Into<String>>(mut self, greeting: G) -> Self {
        self.options.greeting = greeting.into();
        self
    }

    /// Sets the port range passive listeners are allocated from.
    pub fn passive_ports(mut self, ports: RangeInclusive<u16>) -> Self {
        self.options.passive_ports = ports;
        self
    }

    /// Sets the bound on data-connection establishment and transfers.
    pub fn data_connection_timeout(mut self, timeout: Duration) -> Self {
        self.options.data_timeout = timeout;
        self
    }

    /// Sets the structured logger. By default everything goes through the
    /// standard `log` facade.
    pub fn logger<L: Into<Option<slog::Logger>>>(mut self, logger: L) -> Self {
        self.options.logger = logger.into().unwrap_or_else(|| ServerOptions::default().logger);
        self
    }

    /// Registers a user; PASS checks against this table and a successful
    /// login lands in `home`.
    pub fn add_account<U: Into<String>, P: Into<String>, H: Into<PathBuf>>(&self, username: U, password: P, home: H) {
        self.env.accounts.insert(
            username.into(),
            Account {
                password: password.into(),
                home: home.into(),
            },
        );
    }

    /// Sets the system name SYST reports.
    pub fn set_system_name<N: Into<String>>(&self, name: N) {
        self.env.set_system_name(name);
    }

    /// The filesystem this server runs against.
    pub fn filesystem(&self) -> Arc<dyn VirtualFileSystem> {
        self.env.fs.clone()
    }

    /// Replaces the handler bound to `verb`. Intended for setup, not for use
    /// concurrent with request handling.
    pub fn replace_handler<V: AsRef<str>>(&self, verb: V, handler: Arc<dyn CommandHandler>) {
        self.dispatcher
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(verb, handler);
    }

    /// Serves control connections accepted from an already-bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ControlChanError> {
        serve(listener, self.dispatcher.clone(), self.options.clone()).await
    }

    /// Binds `addr` and serves until the task is dropped.
    pub async fn listen<A: ToSocketAddrs>(&self, addr: A) -> Result<(), ControlChanError> {
        self.serve(TcpListener::bind(addr).await?).await
    }
}

impl Default for FakeFtpServer {
    fn default() -> Self {
        FakeFtpServer::new()
    }
}

async fn serve(listener: TcpListener, dispatcher: Arc<RwLock<CommandDispatcher>>, options: ServerOptions) -> Result<(), ControlChanError> {
    slog::info!(options.logger, "Listening"; "addr" => %listener.local_addr()?);
    loop {
        let (stream, peer) = listener.accept().await?;
        let dispatcher = dispatcher.clone();
        let options = options.clone();
        let logger = options.logger.new(slog::o!("trace-id" => Uuid::new_v4().to_string()));
        slog::info!(logger, "Accepted control connection"; "peer" => %peer);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(dispatcher, stream, options, logger.clone()).await {
                slog::warn!(logger, "Control connection ended: {}", e);
            }
        });
    }
}

// The sequential per-connection command loop: greeting, then one command at
// a time until QUIT or the client hangs up. Parse failures answer 500 and
// keep the connection; only transport faults end it.
async fn handle_connection(
    dispatcher: Arc<RwLock<CommandDispatcher>>,
    stream: TcpStream,
    options: ServerOptions,
    logger: slog::Logger,
) -> Result<(), ControlChanError> {
    let local_addr = stream.local_addr()?;
    let (reply_sink, mut command_source) = Framed::new(stream, FtpCodec::new()).split();

    let mut session = Session::new(Box::new(FramedReplyChannel::new(reply_sink)), local_addr, logger.clone())
        .passive_ports(options.passive_ports.clone())
        .data_timeout(options.data_timeout);

    session.send_reply(ReplyCode::ServiceReady, options.greeting.clone()).await?;

    while let Some(incoming) = command_source.next().await {
        match incoming {
            Ok(command) => {
                slog::debug!(logger, "Received command"; "verb" => command.name());
                let handler = dispatcher
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .resolve(command.name());
                handler.handle(&command, &mut session).await?;
                if session.is_closed() {
                    break;
                }
            }
            Err(ControlChanError::Parse(e)) => {
                slog::debug!(logger, "Unparseable command line: {}", e);
                let text = DefaultMessages.lookup(keys::COMMAND_SYNTAX_ERROR, &[]);
                session.send_reply(ReplyCode::CommandSyntaxError, text).await?;
            }
            Err(e) => return Err(e),
        }
    }

    slog::info!(logger, "Control connection done");
    Ok(())
}
