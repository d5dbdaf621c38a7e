//! The RFC 959 Change To Parent Directory (`CDUP`) command.
//
// A special case of CWD so that transferring directory trees between
// systems with different directory naming conventions stays possible.
// Going up from the root is a filesystem-condition failure, not a no-op.

use super::{FakeEnv, FakeError};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct Cdup {
    env: Arc<FakeEnv>,
}

impl Cdup {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Cdup { env }
    }

    fn check(&self, session: &Session) -> Result<PathBuf, FakeError> {
        self.env.require_login(session)?;
        let parent = self
            .env
            .fs
            .parent(&session.cwd)
            .ok_or_else(|| FakeError::DoesNotExist(session.cwd.join("..")))?;
        self.env.require_directory(&parent)?;
        self.env.require_execute(&parent, session.principal())?;
        Ok(parent)
    }
}

#[async_trait]
impl CommandHandler for Cdup {
    #[tracing_attributes::instrument]
    async fn handle(&self, _command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let parent = match self.check(session) {
            Ok(parent) => parent,
            Err(e) => return self.env.fail(session, e).await,
        };
        session.cwd = parent.clone();
        let text = self.env.text(keys::CDUP_OK, &[&parent.display().to_string()]);
        session.send_reply(ReplyCode::CommandOkay, text).await
    }
}
