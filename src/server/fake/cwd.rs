//! The RFC 959 Change Working Directory (`CWD`) command.
//
// This command allows the user to work with a different directory for file
// storage or retrieval without altering his login or accounting
// information. The argument is a pathname specifying a directory.

use super::{FakeEnv, FakeError, required_parameter};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct Cwd {
    env: Arc<FakeEnv>,
}

impl Cwd {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Cwd { env }
    }

    fn check(&self, command: &Command, session: &Session) -> Result<PathBuf, FakeError> {
        self.env.require_login(session)?;
        let argument = required_parameter(command, 0)?;
        let path = self.env.resolve(session, argument);
        self.env.require_directory(&path)?;
        self.env.require_execute(&path, session.principal())?;
        Ok(path)
    }
}

#[async_trait]
impl CommandHandler for Cwd {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let path = match self.check(command, session) {
            Ok(path) => path,
            Err(e) => return self.env.fail(session, e).await,
        };
        session.cwd = path.clone();
        let text = self.env.text(keys::CWD_OK, &[&path.display().to_string()]);
        session.send_reply(ReplyCode::FileActionOkay, text).await
    }
}
