//! The RFC 959 Rename From (`RNFR`) command.
//
// First half of the rename sequence: validate that the source exists and
// park it on the session for RNTO.

use super::{FakeEnv, FakeError, required_parameter};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct Rnfr {
    env: Arc<FakeEnv>,
}

impl Rnfr {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Rnfr { env }
    }

    fn check(&self, command: &Command, session: &Session) -> Result<PathBuf, FakeError> {
        self.env.require_login(session)?;
        let argument = required_parameter(command, 0)?;
        let path = self.env.resolve(session, argument);
        self.env.require_exists(&path)?;
        Ok(path)
    }
}

#[async_trait]
impl CommandHandler for Rnfr {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let path = match self.check(command, session) {
            Ok(path) => path,
            Err(e) => return self.env.fail(session, e).await,
        };
        session.rename_from = Some(path);
        session
            .send_reply(ReplyCode::FileActionPending, self.env.text(keys::RNFR_OK, &[]))
            .await
    }
}
