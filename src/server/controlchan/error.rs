//! Error types for the FTP *control* channel.

use thiserror::Error;

/// The error type produced while servicing a control connection.
///
/// Protocol-level problems (bad parameters, missing files, permission
/// failures) are never represented here: handlers map those to numeric
/// replies and return `Ok`. A `ControlChanError` means the control
/// connection itself can no longer be serviced.
#[derive(Debug, Error)]
pub enum ControlChanError {
    /// We encountered a system IO error on the control connection.
    #[error("failed to perform IO on the control connection: {0}")]
    Io(#[from] std::io::Error),
    /// Something went wrong parsing the client's command line.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors produced while splitting a raw control-connection line into a
/// command. These are recoverable: the control loop answers with a 500
/// reply and keeps the connection open.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The line contained no command token at all.
    #[error("empty command line")]
    EmptyLine,
    /// We encountered a non-UTF8 character in the command line.
    #[error("non-UTF8 character in command line")]
    InvalidUtf8,
}
