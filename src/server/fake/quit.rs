//! The RFC 959 Logout (`QUIT`) command.
//
// Works without login; the session ends after the 221 reply.

use super::FakeEnv;
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Quit {
    env: Arc<FakeEnv>,
}

impl Quit {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Quit { env }
    }
}

#[async_trait]
impl CommandHandler for Quit {
    #[tracing_attributes::instrument]
    async fn handle(&self, _command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        session
            .send_reply(ReplyCode::ClosingControlConnection, self.env.text(keys::QUIT_OK, &[]))
            .await?;
        session.close();
        Ok(())
    }
}
