//! The RFC 959 Print Working Directory (`PWD`) command.

use super::FakeEnv;
use crate::messages::keys;
use crate::server::controlchan::{Command, CommandHandler, ControlChanError, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Pwd {
    env: Arc<FakeEnv>,
}

impl Pwd {
    pub(crate) fn new(env: Arc<FakeEnv>) -> Self {
        Pwd { env }
    }
}

#[async_trait]
impl CommandHandler for Pwd {
    #[tracing_attributes::instrument]
    async fn handle(&self, _command: &Command, session: &mut Session) -> Result<(), ControlChanError> {
        if let Err(e) = self.env.require_login(session) {
            return self.env.fail(session, e).await;
        }
        let cwd = session.cwd.display().to_string();
        let text = self.env.text(keys::PWD_OK, &[&cwd]);
        session.send_reply(ReplyCode::PathCreated, text).await
    }
}
