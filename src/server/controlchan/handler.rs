//! The `CommandHandler` trait implemented by every FTP verb.

use super::command::Command;
use super::error::ControlChanError;
use crate::server::session::Session;

use async_trait::async_trait;
use std::fmt;

/// One FTP verb's behavior.
///
/// Handlers send zero or more replies through the session's reply channel
/// and may mutate session state. A handler instance is shared across all
/// control connections of a server, so it must either be stateless or
/// internally safe for concurrent invocation; per-connection state belongs
/// on the [`Session`].
///
/// `Err` is reserved for control-connection transport faults. Protocol
/// failures (bad parameters, missing files, denied permissions) terminate
/// only the current command: the handler sends the matching numeric reply
/// and returns `Ok`.
#[async_trait]
pub trait CommandHandler: Send + Sync + fmt::Debug {
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError>;
}
