//! Routes parsed commands to their registered handlers.

use super::command::Command;
use super::error::ControlChanError;
use super::handler::CommandHandler;
use super::reply::ReplyCode;
use crate::messages::{self, DefaultMessages, MessageCatalog};
use crate::server::session::Session;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Owns the verb-to-handler table of one server instance.
///
/// Lookup is case-insensitive: verbs are uppercased on registration and on
/// dispatch, so `cwd`, `Cwd` and `CWD` all reach the same handler.
/// Re-registering a verb replaces the existing binding. Verbs without a
/// binding are routed to a fallback handler that answers 502 instead of
/// failing the connection.
#[derive(Debug)]
pub struct CommandDispatcher {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    fallback: Arc<dyn CommandHandler>,
}

impl CommandDispatcher {
    /// Creates an empty dispatcher with the default 502 fallback.
    pub fn new() -> Self {
        CommandDispatcher::with_fallback(Arc::new(NotImplemented::new(Arc::new(DefaultMessages))))
    }

    /// Creates an empty dispatcher with a caller-supplied fallback handler.
    pub fn with_fallback(fallback: Arc<dyn CommandHandler>) -> Self {
        CommandDispatcher {
            handlers: HashMap::new(),
            fallback,
        }
    }

    /// Binds `verb` to `handler`, replacing any existing binding.
    pub fn register<V: AsRef<str>>(&mut self, verb: V, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(verb.as_ref().to_uppercase(), handler);
    }

    /// The handler registered for `verb`, if any.
    pub fn handler<V: AsRef<str>>(&self, verb: V) -> Option<&Arc<dyn CommandHandler>> {
        self.handlers.get(&verb.as_ref().to_uppercase())
    }

    /// The handler that will service `verb`: its registered handler, or the
    /// fallback when the verb is unknown.
    pub fn resolve<V: AsRef<str>>(&self, verb: V) -> Arc<dyn CommandHandler> {
        self.handler(verb).unwrap_or(&self.fallback).clone()
    }

    /// Routes `command` to its handler.
    pub async fn dispatch(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        self.resolve(command.name()).handle(command, session).await
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        CommandDispatcher::new()
    }
}

/// Fallback for verbs with no registered handler. Unknown verbs are an
/// everyday occurrence on a control connection, so the answer is a
/// well-formed 502 rather than an error.
#[derive(Debug)]
pub struct NotImplemented {
    messages: Arc<dyn MessageCatalog>,
}

impl NotImplemented {
    pub fn new(messages: Arc<dyn MessageCatalog>) -> Self {
        NotImplemented { messages }
    }
}

#[async_trait]
impl CommandHandler for NotImplemented {
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let text = self
            .messages
            .lookup(messages::keys::NOT_IMPLEMENTED, &[&command.name().to_uppercase()]);
        session.send_reply(ReplyCode::CommandNotImplemented, text).await
    }
}
