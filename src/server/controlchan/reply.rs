//! Replies flowing back to the FTP client over the control connection.

use super::error::ControlChanError;

use async_trait::async_trait;
use std::fmt;

/// The reply codes used by this crate, according to RFC 959 and RFC 2428.
//
// The three digits form a code. Codes between 100 and 199 indicate marks;
// codes between 200 and 399 indicate acceptance; codes between 400 and 599
// indicate rejection. Clients should avoid looking past the first digit of
// the code; the rest of the response is primarily for human consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReplyCode {
    /// 150: about to open the data connection.
    FileStatusOkay = 150,
    /// 200: the generic "fine" answer.
    CommandOkay = 200,
    /// 215: answer to SYST.
    SystemType = 215,
    /// 220: greeting sent when the control connection is established.
    ServiceReady = 220,
    /// 221: answer to QUIT.
    ClosingControlConnection = 221,
    /// 226: transfer done, data connection closed.
    ClosingDataConnection = 226,
    /// 227: answer to PASV, carries the host/port tuple.
    EnteringPassiveMode = 227,
    /// 229: answer to EPSV, carries only the port.
    EnteringExtendedPassiveMode = 229,
    /// 230: login accepted.
    UserLoggedIn = 230,
    /// 250: requested file action completed.
    FileActionOkay = 250,
    /// 257: answer to PWD and MKD, carries a quoted pathname.
    PathCreated = 257,
    /// 331: username okay, need password.
    NeedPassword = 331,
    /// 350: first half of a two-command sequence accepted (RNFR).
    FileActionPending = 350,
    /// 425: the data connection could not be established.
    CantOpenDataConnection = 425,
    /// 426: the data connection broke mid-transfer.
    ConnectionClosed = 426,
    /// 451: action aborted, local error in processing.
    LocalError = 451,
    /// 500: the command line could not be parsed at all.
    CommandSyntaxError = 500,
    /// 501: syntax error in parameters or arguments.
    ParameterSyntaxError = 501,
    /// 502: the verb is recognized as not implemented here.
    CommandNotImplemented = 502,
    /// 503: bad sequence of commands (e.g. RNTO without RNFR).
    BadCommandSequence = 503,
    /// 530: not logged in.
    NotLoggedIn = 530,
    /// 550: requested action not taken: file system condition.
    FileError = 550,
}

impl ReplyCode {
    /// The numeric wire value of this code.
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// A single numbered reply line for the FTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    text: String,
}

impl Reply {
    /// Creates a reply with one of the codes this crate uses itself.
    pub fn new<T: Into<String>>(code: ReplyCode, text: T) -> Self {
        Reply {
            code: code.code(),
            text: text.into(),
        }
    }

    /// Creates a reply with an arbitrary numeric code. Stub replies are
    /// configurable beyond the codes a well-behaved server would send, so
    /// test authors can exercise a client's error handling.
    pub fn custom<T: Into<String>>(code: u16, text: T) -> Self {
        Reply { code, text: text.into() }
    }

    /// The three-digit numeric code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The free-text explanation following the code.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether this reply indicates acceptance (1xx-3xx).
    pub fn is_positive(&self) -> bool {
        self.code < 400
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} {}", self.code, self.text)
        }
    }
}

/// Abstraction over the write side of the control connection.
///
/// The production implementation frames replies onto the TCP stream; tests
/// substitute a recording implementation so handler behavior can be asserted
/// without sockets.
#[async_trait]
pub trait ReplyChannel: Send + fmt::Debug {
    /// Sends one reply line to the client.
    async fn send(&mut self, reply: Reply) -> Result<(), ControlChanError>;
}
