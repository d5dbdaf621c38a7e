//! The *stub* handler family: canned replies plus invocation recording.
//!
//! A stub server answers the way a real server would, without doing any of
//! the work, so FTP *clients* can be tested against it. Every handler owns a
//! [`StubCore`]: the configurable reply it sends and the append-only log of
//! invocations a test inspects afterwards. Handlers are shared across
//! concurrent control connections, so both halves sit behind locks.

mod connect;
mod simple;
mod transfer;

pub use connect::{Eprt, Epsv, Pasv, Port};
pub use simple::{Cdup, Cwd, Dele, Mkd, Noop, Pass, Pwd, Quit, Rmd, Rnfr, Rnto, Syst, Type, User};
pub use transfer::{List, Nlst, Retr, Stor, Stou};

use super::controlchan::{Command, CommandDispatcher, CommandHandler, ControlChanError, Reply, ReplyCode};
use super::host_port::HostAndPort;
use super::session::Session;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Key under which USER's username parameter is recorded.
pub const USERNAME_KEY: &str = "username";
/// Key under which PASS's password parameter is recorded.
pub const PASSWORD_KEY: &str = "password";
/// Key under which path-taking verbs record their first parameter.
pub const PATHNAME_KEY: &str = "pathname";
/// Key under which PORT/EPRT record the decoded client address.
pub const HOST_PORT_KEY: &str = "hostPort";
/// Key under which PASV/EPSV record the allocated listener port.
pub const LISTENER_PORT_KEY: &str = "listenerPort";
/// Key under which STOR/STOU record the bytes read off the data connection.
pub const FILE_CONTENTS_KEY: &str = "fileContents";

/// One piece of data captured in an [`InvocationRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedValue {
    /// A string snapshot, e.g. a pathname or username.
    Text(String),
    /// Raw bytes, e.g. an uploaded file body.
    Bytes(Vec<u8>),
    /// A decoded data-connection address.
    HostPort(HostAndPort),
    /// A numeric snapshot, e.g. an allocated listener port.
    Number(u64),
}

/// A structured snapshot of one stub-handler invocation: the command as
/// received plus whatever the handler deemed worth keeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRecord {
    command: Command,
    data: HashMap<&'static str, RecordedValue>,
}

impl InvocationRecord {
    /// Snapshot of `command` with no extra data yet.
    pub fn new(command: &Command) -> Self {
        InvocationRecord {
            command: command.clone(),
            data: HashMap::new(),
        }
    }

    pub(crate) fn with(mut self, key: &'static str, value: RecordedValue) -> Self {
        self.data.insert(key, value);
        self
    }

    /// The command exactly as it was dispatched.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// The recorded value under `key`, if the handler captured one.
    pub fn get(&self, key: &str) -> Option<&RecordedValue> {
        self.data.get(key)
    }

    /// Convenience accessor for [`RecordedValue::Text`] entries.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.data.get(key) {
            Some(RecordedValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Convenience accessor for [`RecordedValue::Bytes`] entries.
    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.data.get(key) {
            Some(RecordedValue::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Convenience accessor for [`RecordedValue::HostPort`] entries.
    pub fn host_port(&self, key: &str) -> Option<HostAndPort> {
        match self.data.get(key) {
            Some(RecordedValue::HostPort(host_port)) => Some(*host_port),
            _ => None,
        }
    }
}

/// The shared half of every stub handler: its configurable reply and its
/// invocation log.
#[derive(Debug)]
pub struct StubCore {
    reply: Mutex<Reply>,
    invocations: Mutex<Vec<InvocationRecord>>,
}

impl StubCore {
    /// A core preconfigured with the given default reply; custom stubs embed
    /// one of these to get the reply knob and the invocation log.
    pub fn new(code: ReplyCode, text: &str) -> Self {
        StubCore {
            reply: Mutex::new(Reply::new(code, text)),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the configured reply. Any numeric code is allowed so tests
    /// can provoke client error paths.
    pub fn set_reply<T: Into<String>>(&self, code: u16, text: T) {
        *self.reply.lock().unwrap_or_else(PoisonError::into_inner) = Reply::custom(code, text);
    }

    /// The currently configured reply.
    pub fn reply(&self) -> Reply {
        self.reply.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Snapshot of all invocations recorded so far, oldest first.
    pub fn invocations(&self) -> Vec<InvocationRecord> {
        self.invocations.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// How many times the handler was invoked.
    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub(crate) fn record(&self, record: InvocationRecord) {
        self.invocations.lock().unwrap_or_else(PoisonError::into_inner).push(record);
    }

    pub(crate) async fn finish(&self, record: InvocationRecord, session: &mut Session) -> Result<(), ControlChanError> {
        self.record(record);
        session.send(self.reply()).await
    }
}

/// A [`CommandHandler`] that exposes its [`StubCore`] so a server can hand
/// test authors the reply knob and the invocation log.
pub trait StubCommandHandler: CommandHandler {
    /// This handler's reply configuration and invocation log.
    fn core(&self) -> &StubCore;
}

/// The stub registry: the dispatcher bindings plus a by-verb view onto the
/// stubs' cores.
pub(crate) fn registry() -> (CommandDispatcher, HashMap<String, Arc<dyn StubCommandHandler>>) {
    let mut dispatcher = CommandDispatcher::new();
    let mut stubs: HashMap<String, Arc<dyn StubCommandHandler>> = HashMap::new();

    fn add<H>(dispatcher: &mut CommandDispatcher, stubs: &mut HashMap<String, Arc<dyn StubCommandHandler>>, verb: &str, handler: H)
    where
        H: StubCommandHandler + 'static,
    {
        let handler = Arc::new(handler);
        dispatcher.register(verb, handler.clone());
        stubs.insert(verb.to_string(), handler);
    }

    add(&mut dispatcher, &mut stubs, "USER", User::new());
    add(&mut dispatcher, &mut stubs, "PASS", Pass::new());
    add(&mut dispatcher, &mut stubs, "QUIT", Quit::new());
    add(&mut dispatcher, &mut stubs, "NOOP", Noop::new());
    add(&mut dispatcher, &mut stubs, "TYPE", Type::new());
    add(&mut dispatcher, &mut stubs, "SYST", Syst::new());
    add(&mut dispatcher, &mut stubs, "PWD", Pwd::new());
    add(&mut dispatcher, &mut stubs, "CWD", Cwd::new());
    add(&mut dispatcher, &mut stubs, "CDUP", Cdup::new());
    add(&mut dispatcher, &mut stubs, "MKD", Mkd::new());
    add(&mut dispatcher, &mut stubs, "RMD", Rmd::new());
    add(&mut dispatcher, &mut stubs, "DELE", Dele::new());
    add(&mut dispatcher, &mut stubs, "RNFR", Rnfr::new());
    add(&mut dispatcher, &mut stubs, "RNTO", Rnto::new());
    add(&mut dispatcher, &mut stubs, "PORT", Port::new());
    add(&mut dispatcher, &mut stubs, "EPRT", Eprt::new());
    add(&mut dispatcher, &mut stubs, "PASV", Pasv::new());
    add(&mut dispatcher, &mut stubs, "EPSV", Epsv::new());
    add(&mut dispatcher, &mut stubs, "LIST", List::new());
    add(&mut dispatcher, &mut stubs, "NLST", Nlst::new());
    add(&mut dispatcher, &mut stubs, "RETR", Retr::new());
    add(&mut dispatcher, &mut stubs, "STOR", Stor::new());
    add(&mut dispatcher, &mut stubs, "STOU", Stou::new());

    (dispatcher, stubs)
}
