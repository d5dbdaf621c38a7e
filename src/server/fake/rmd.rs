//! The RFC 959 Remove Directory (`RMD`) command.
//
// Only empty directories go away; FTP has no recursive delete.

use super::{FakeEnv, FakeError, required_parameter};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct Rmd {
    env: Arc<FakeEnv>,
}

impl Rmd {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Rmd { env }
    }

    fn check(&self, command: &Command, session: &Session) -> Result<PathBuf, FakeError> {
        self.env.require_login(session)?;
        let argument = required_parameter(command, 0)?;
        let path = self.env.resolve(session, argument);
        self.env.require_directory(&path)?;
        if !self.env.fs.list_names(&path).is_empty() {
            return Err(FakeError::NotEmpty(path));
        }
        self.env.require_writable_parent(&path, session.principal())?;
        Ok(path)
    }
}

#[async_trait]
impl CommandHandler for Rmd {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let outcome = self
            .check(command, session)
            .and_then(|path| self.env.fs.remove_directory(&path).map(|_| path).map_err(FakeError::from));
        match outcome {
            Ok(path) => {
                let text = self.env.text(keys::RMD_OK, &[&path.display().to_string()]);
                session.send_reply(ReplyCode::FileActionOkay, text).await
            }
            Err(e) => self.env.fail(session, e).await,
        }
    }
}
