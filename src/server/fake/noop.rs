//! The RFC 959 No Operation (`NOOP`) command.

use super::FakeEnv;
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Noop {
    env: Arc<FakeEnv>,
}

impl Noop {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Noop { env }
    }
}

#[async_trait]
impl CommandHandler for Noop {
    #[tracing_attributes::instrument]
    async fn handle(&self, _command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        if let Err(e) = self.env.require_login(session) {
            return self.env.fail(session, e).await;
        }
        session.send_reply(ReplyCode::CommandOkay, self.env.text(keys::NOOP_OK, &[])).await
    }
}
