//! The RFC 959 Rename To (`RNTO`) command.
//
// Second half of the rename sequence. Without a preceding RNFR this is a
// bad command sequence; the parked source is only cleared once the rename
// actually happened.

use super::{FakeEnv, FakeError, required_parameter};
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct Rnto {
    env: Arc<FakeEnv>,
}

impl Rnto {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Rnto { env }
    }

    fn check(&self, command: &Command, session: &Session) -> Result<(PathBuf, PathBuf), FakeError> {
        self.env.require_login(session)?;
        let from = session
            .rename_from
            .clone()
            .ok_or(FakeError::BadSequence("send RNFR before RNTO"))?;
        let argument = required_parameter(command, 0)?;
        let to = self.env.resolve(session, argument);
        if self.env.fs.is_directory(&to) {
            return Err(FakeError::IsADirectory(to));
        }
        self.env.require_writable_parent(&to, session.principal())?;
        Ok((from, to))
    }
}

#[async_trait]
impl CommandHandler for Rnto {
    #[tracing_attributes::instrument]
    async fn handle(&self, command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        let outcome = self.check(command, session).and_then(|(from, to)| {
            self.env.fs.rename(&from, &to).map(|_| (from, to)).map_err(FakeError::from)
        });
        match outcome {
            Ok((from, to)) => {
                session.rename_from = None;
                let text = self
                    .env
                    .text(keys::RNTO_OK, &[&from.display().to_string(), &to.display().to_string()]);
                session.send_reply(ReplyCode::FileActionOkay, text).await
            }
            Err(e) => self.env.fail(session, e).await,
        }
    }
}
